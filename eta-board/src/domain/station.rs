//! Heavy-rail station code type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A valid 3-letter MTR station code (e.g. `POA` for Po Lam).
///
/// Station codes are always 3 uppercase ASCII letters. This type guarantees
/// that any `StationCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use eta_board::domain::StationCode;
///
/// let poa = StationCode::parse("POA").unwrap();
/// assert_eq!(poa.as_str(), "POA");
///
/// assert!(StationCode::parse("poa").is_err());
/// assert!(StationCode::parse("PO").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationCode([u8; 3]);

impl StationCode {
    /// Parse a station code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters (A-Z).
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidStationCode {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(InvalidStationCode {
                    reason: "must be uppercase ASCII letters A-Z",
                });
            }
        }

        Ok(StationCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the station code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.as_str())
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StationCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StationCode::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert!(StationCode::parse("POA").is_ok());
        assert!(StationCode::parse("LHP").is_ok());
        assert!(StationCode::parse("ADM").is_ok());
    }

    #[test]
    fn reject_lowercase() {
        assert!(StationCode::parse("poa").is_err());
        assert!(StationCode::parse("Poa").is_err());
    }

    #[test]
    fn reject_wrong_length() {
        assert!(StationCode::parse("").is_err());
        assert!(StationCode::parse("PO").is_err());
        assert!(StationCode::parse("POAA").is_err());
    }

    #[test]
    fn reject_non_letters() {
        assert!(StationCode::parse("P0A").is_err());
        assert!(StationCode::parse("P-A").is_err());
    }

    #[test]
    fn serde_as_plain_string() {
        let code = StationCode::parse("TKO").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"TKO\"");
        let parsed: StationCode = serde_json::from_str("\"TKO\"").unwrap();
        assert_eq!(parsed, code);
        assert!(serde_json::from_str::<StationCode>("\"tko\"").is_err());
    }

    #[test]
    fn display_and_debug() {
        let code = StationCode::parse("HAH").unwrap();
        assert_eq!(format!("{code}"), "HAH");
        assert_eq!(format!("{code:?}"), "StationCode(HAH)");
    }
}
