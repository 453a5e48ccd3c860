//! Stop records shared by all adapters.

use serde::{Deserialize, Serialize};

/// Placeholder name shown when a stop lookup fails.
pub const UNKNOWN_STOP_NAME: &str = "未知車站";

/// A stop along a route in one direction.
///
/// Identity is `(operator, stop_id)`; `sequence` orders stops along the
/// route. Records are immutable once fetched for a route/direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub stop_id: String,
    pub sequence: u32,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StopRecord {
    /// Create a stop record without coordinates.
    pub fn new(stop_id: impl Into<String>, sequence: u32, name: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            sequence,
            name: name.into(),
            latitude: None,
            longitude: None,
        }
    }

    /// Attach resolved metadata, cleaning the name.
    pub fn with_info(mut self, info: &StopInfo) -> Self {
        self.name = clean_name(&info.name);
        self.latitude = info.latitude;
        self.longitude = info.longitude;
        self
    }

    /// Coordinates, when both are known.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Resolved stop metadata from a stop lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopInfo {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StopInfo {
    /// The placeholder used when the lookup fails.
    pub fn unknown() -> Self {
        Self {
            name: UNKNOWN_STOP_NAME.to_string(),
            latitude: None,
            longitude: None,
        }
    }
}

/// Strip a trailing parenthesised stop code such as `" (MK123)"`.
///
/// Only codes made of uppercase letters, digits and spaces are removed;
/// ordinary parenthesised words are kept.
pub fn clean_name(name: &str) -> String {
    let trimmed = name.trim_end();
    if let Some(body) = trimmed.strip_suffix(')')
        && let Some(open) = body.rfind('(')
    {
        let code = &body[open + 1..];
        let is_code = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c.is_whitespace());
        if is_code {
            return body[..open].trim().to_string();
        }
    }
    name.trim().to_string()
}
