//! Bus operator codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown operator code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown bus operator: {code}")]
pub struct InvalidOperator {
    code: String,
}

/// A franchised bus operator with its own upstream API.
///
/// Operators are identified by their uppercase code (`KMB`, `CTB`, `NLB`),
/// which is also how they appear in saved card configurations.
///
/// # Examples
///
/// ```
/// use eta_board::domain::BusOperator;
///
/// let kmb: BusOperator = "KMB".parse().unwrap();
/// assert_eq!(kmb.as_str(), "KMB");
///
/// // Codes are case-sensitive
/// assert!("kmb".parse::<BusOperator>().is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum BusOperator {
    #[default]
    #[serde(rename = "KMB")]
    Kmb,
    #[serde(rename = "CTB")]
    Ctb,
    #[serde(rename = "NLB")]
    Nlb,
}

impl BusOperator {
    /// All operators, in directory merge order.
    pub const ALL: [BusOperator; 3] = [BusOperator::Kmb, BusOperator::Ctb, BusOperator::Nlb];

    /// Returns the upstream operator code.
    pub fn as_str(&self) -> &'static str {
        match self {
            BusOperator::Kmb => "KMB",
            BusOperator::Ctb => "CTB",
            BusOperator::Nlb => "NLB",
        }
    }

    /// Short display name used in card titles.
    pub fn display_name(&self) -> &'static str {
        match self {
            BusOperator::Kmb => "九巴",
            BusOperator::Ctb => "城巴",
            BusOperator::Nlb => "嶼巴",
        }
    }

    /// Brand colour for cards and badges.
    pub fn color(&self) -> &'static str {
        match self {
            BusOperator::Kmb => "#E3001B",
            BusOperator::Ctb => "#D1B100",
            BusOperator::Nlb => "#007D8F",
        }
    }
}

impl FromStr for BusOperator {
    type Err = InvalidOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KMB" => Ok(BusOperator::Kmb),
            "CTB" => Ok(BusOperator::Ctb),
            "NLB" => Ok(BusOperator::Nlb),
            other => Err(InvalidOperator {
                code: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BusOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
