//! Direction encodings.
//!
//! Buses and rail lines describe direction differently and the two are
//! deliberately kept as separate types:
//! - buses travel `outbound`/`inbound` relative to the route definition,
//!   and ETA records tag them with a single letter (`O`/`I`)
//! - heavy and light rail use `UP`/`DOWN`, relative to the line's termini

use std::fmt;

use serde::{Deserialize, Serialize};

/// Travel direction of a bus route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusDirection {
    #[default]
    Outbound,
    Inbound,
}

impl BusDirection {
    /// Path segment used by route-stop endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            BusDirection::Outbound => "outbound",
            BusDirection::Inbound => "inbound",
        }
    }

    /// Single-letter code carried by ETA records.
    pub fn code(&self) -> &'static str {
        match self {
            BusDirection::Outbound => "O",
            BusDirection::Inbound => "I",
        }
    }

    /// Parse the single-letter code from an ETA record.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "O" => Some(BusDirection::Outbound),
            "I" => Some(BusDirection::Inbound),
            _ => None,
        }
    }

    /// Fallback terminus label when the upstream gives no name.
    pub fn fallback_label(&self) -> &'static str {
        match self {
            BusDirection::Outbound => "去程",
            BusDirection::Inbound => "回程",
        }
    }
}

impl fmt::Display for BusDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminus-relative direction on a rail line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RailDirection {
    #[default]
    Up,
    Down,
}

impl RailDirection {
    /// Key used by the upstream schedule objects.
    pub fn as_str(&self) -> &'static str {
        match self {
            RailDirection::Up => "UP",
            RailDirection::Down => "DOWN",
        }
    }

    /// Parse the upstream key.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UP" => Some(RailDirection::Up),
            "DOWN" => Some(RailDirection::Down),
            _ => None,
        }
    }
}

impl fmt::Display for RailDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direction request addressed to any card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Bus(BusDirection),
    Rail(RailDirection),
}

impl From<BusDirection> for Direction {
    fn from(dir: BusDirection) -> Self {
        Direction::Bus(dir)
    }
}

impl From<RailDirection> for Direction {
    fn from(dir: RailDirection) -> Self {
        Direction::Rail(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_codes_round_trip() {
        for dir in [BusDirection::Outbound, BusDirection::Inbound] {
            assert_eq!(BusDirection::from_code(dir.code()), Some(dir));
        }
        assert_eq!(BusDirection::from_code("X"), None);
    }

    #[test]
    fn serde_matches_saved_configs() {
        assert_eq!(
            serde_json::to_string(&BusDirection::Inbound).unwrap(),
            "\"inbound\""
        );
        assert_eq!(serde_json::to_string(&RailDirection::Down).unwrap(), "\"DOWN\"");
        let up: RailDirection = serde_json::from_str("\"UP\"").unwrap();
        assert_eq!(up, RailDirection::Up);
    }

    #[test]
    fn defaults() {
        assert_eq!(BusDirection::default(), BusDirection::Outbound);
        assert_eq!(RailDirection::default(), RailDirection::Up);
    }

    #[test]
    fn rail_parse() {
        assert_eq!(RailDirection::parse("DOWN"), Some(RailDirection::Down));
        assert_eq!(RailDirection::parse("down"), None);
    }
}
