//! Per-card pin/filter state.

use crate::domain::RowKey;

/// Which row, if any, is marked or isolated.
///
/// At most one row is pinned at a time. Pinning the same row repeatedly
/// cycles `None -> Marked -> Filtered -> None`; pinning a different row
/// marks it instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PinState {
    #[default]
    None,
    /// Highlighted, other rows still visible.
    Marked(RowKey),
    /// Highlighted and every other row hidden.
    Filtered(RowKey),
}

impl PinState {
    /// Restore from saved `markedSeq`/`filteredSeq` fields.
    pub fn from_parts(marked: Option<RowKey>, filtered: Option<RowKey>) -> Self {
        match (marked, filtered) {
            (_, Some(filtered)) => PinState::Filtered(filtered),
            (Some(marked), None) => PinState::Marked(marked),
            (None, None) => PinState::None,
        }
    }

    /// Saved form: `(markedSeq, filteredSeq)`.
    pub fn to_parts(&self) -> (Option<RowKey>, Option<RowKey>) {
        match self {
            PinState::None => (None, None),
            PinState::Marked(key) => (Some(key.clone()), None),
            PinState::Filtered(key) => (Some(key.clone()), Some(key.clone())),
        }
    }

    /// Apply one pin action on `key`.
    pub fn toggle(&self, key: &RowKey) -> Self {
        match self {
            PinState::Filtered(current) if current == key => PinState::None,
            PinState::Marked(current) if current == key => PinState::Filtered(key.clone()),
            _ => PinState::Marked(key.clone()),
        }
    }

    /// The pinned row, marked or filtered.
    pub fn pinned(&self) -> Option<&RowKey> {
        match self {
            PinState::None => None,
            PinState::Marked(key) | PinState::Filtered(key) => Some(key),
        }
    }

    /// Whether `key` is highlighted.
    pub fn is_marked(&self, key: &RowKey) -> bool {
        self.pinned() == Some(key)
    }

    /// Whether `key` is hidden by a filter on another row.
    pub fn is_hidden(&self, key: &RowKey) -> bool {
        matches!(self, PinState::Filtered(current) if current != key)
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, PinState::Filtered(_))
    }
}
