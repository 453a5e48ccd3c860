//! Row identifiers within a card.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one row of a card.
///
/// Bus rows are keyed by stop sequence number; rail and light-rail rows by
/// station code. Saved configurations store the former as a JSON number and
/// the latter as a string, which is why the serde form is untagged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Seq(u32),
    Station(String),
}

impl RowKey {
    /// Key for a station row.
    pub fn station(code: impl Into<String>) -> Self {
        RowKey::Station(code.into())
    }

    /// The stop sequence, for bus rows.
    pub fn as_seq(&self) -> Option<u32> {
        match self {
            RowKey::Seq(seq) => Some(*seq),
            RowKey::Station(_) => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Seq(seq) => write!(f, "{seq}"),
            RowKey::Station(code) => f.write_str(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_serde() {
        assert_eq!(serde_json::to_string(&RowKey::Seq(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&RowKey::station("POA")).unwrap(),
            "\"POA\""
        );
        assert_eq!(serde_json::from_str::<RowKey>("12").unwrap(), RowKey::Seq(12));
        assert_eq!(
            serde_json::from_str::<RowKey>("\"430\"").unwrap(),
            RowKey::station("430")
        );
    }

    #[test]
    fn as_seq() {
        assert_eq!(RowKey::Seq(3).as_seq(), Some(3));
        assert_eq!(RowKey::station("TKO").as_seq(), None);
    }
}
