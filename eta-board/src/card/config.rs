//! Persistable card configuration.

use serde::{Deserialize, Serialize};

use super::pin::PinState;
use crate::domain::{BusDirection, BusOperator, RailDirection, RowKey};

/// The serializable part of a card: identity, direction and pin state.
///
/// The JSON form matches saved groups written by earlier versions of the
/// dashboard, so field names are camelCase and the variant is tagged by
/// `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CardConfig {
    #[serde(rename = "BUS", rename_all = "camelCase")]
    Bus {
        route: String,
        #[serde(default)]
        dir: BusDirection,
        #[serde(default)]
        co: BusOperator,
        #[serde(default)]
        dest_name: String,
        #[serde(default)]
        marked_seq: Option<u32>,
        #[serde(default)]
        filtered_seq: Option<u32>,
    },
    #[serde(rename = "MTR", rename_all = "camelCase")]
    RailStation { line_code: String, sta_code: String },
    #[serde(rename = "MTR_LINE", rename_all = "camelCase")]
    RailLine {
        line_code: String,
        #[serde(default)]
        dir: RailDirection,
        #[serde(default)]
        marked_seq: Option<String>,
        #[serde(default)]
        filtered_seq: Option<String>,
    },
    #[serde(rename = "LRT_LINE", rename_all = "camelCase")]
    LightRailLine {
        route: String,
        #[serde(default)]
        dir: RailDirection,
        #[serde(default)]
        marked_seq: Option<String>,
        #[serde(default)]
        filtered_seq: Option<String>,
    },
}

impl CardConfig {
    /// A bus route card with no pin.
    pub fn bus(co: BusOperator, route: impl Into<String>, dir: BusDirection) -> Self {
        CardConfig::Bus {
            route: route.into(),
            dir,
            co,
            dest_name: String::new(),
            marked_seq: None,
            filtered_seq: None,
        }
    }

    /// A rail station card.
    pub fn rail_station(line: impl Into<String>, station: impl Into<String>) -> Self {
        CardConfig::RailStation {
            line_code: line.into(),
            sta_code: station.into(),
        }
    }

    /// A rail line card with no pin.
    pub fn rail_line(line: impl Into<String>, dir: RailDirection) -> Self {
        CardConfig::RailLine {
            line_code: line.into(),
            dir,
            marked_seq: None,
            filtered_seq: None,
        }
    }

    /// A light-rail line card with no pin.
    pub fn light_rail(route: impl Into<String>, dir: RailDirection) -> Self {
        CardConfig::LightRailLine {
            route: route.into(),
            dir,
            marked_seq: None,
            filtered_seq: None,
        }
    }

    /// Pin state recorded in the configuration.
    pub fn pin(&self) -> PinState {
        match self {
            CardConfig::Bus {
                marked_seq,
                filtered_seq,
                ..
            } => PinState::from_parts(marked_seq.map(RowKey::Seq), filtered_seq.map(RowKey::Seq)),
            CardConfig::RailStation { .. } => PinState::None,
            CardConfig::RailLine {
                marked_seq,
                filtered_seq,
                ..
            }
            | CardConfig::LightRailLine {
                marked_seq,
                filtered_seq,
                ..
            } => PinState::from_parts(
                marked_seq.clone().map(RowKey::Station),
                filtered_seq.clone().map(RowKey::Station),
            ),
        }
    }

    /// Replace the recorded pin state; ignored for station cards.
    pub fn with_pin(mut self, pin: &PinState) -> Self {
        let (marked, filtered) = pin.to_parts();
        match &mut self {
            CardConfig::Bus {
                marked_seq,
                filtered_seq,
                ..
            } => {
                *marked_seq = marked.and_then(|k| k.as_seq());
                *filtered_seq = filtered.and_then(|k| k.as_seq());
            }
            CardConfig::RailStation { .. } => {}
            CardConfig::RailLine {
                marked_seq,
                filtered_seq,
                ..
            }
            | CardConfig::LightRailLine {
                marked_seq,
                filtered_seq,
                ..
            } => {
                *marked_seq = marked.map(|k| k.to_string());
                *filtered_seq = filtered.map(|k| k.to_string());
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_saved_line_card() {
        let config: CardConfig =
            serde_json::from_str(r#"{"type":"MTR_LINE","lineCode":"TKL","dir":"UP"}"#).unwrap();
        assert_eq!(config, CardConfig::rail_line("TKL", RailDirection::Up));
        assert_eq!(config.pin(), PinState::None);
    }

    #[test]
    fn parses_saved_bus_card() {
        let json = r#"{"type":"BUS","route":"1A","dir":"inbound","co":"CTB",
                       "destName":"中環","filteredSeq":4,"markedSeq":4}"#;
        let config: CardConfig = serde_json::from_str(json).unwrap();
        match &config {
            CardConfig::Bus {
                co, dir, dest_name, ..
            } => {
                assert_eq!(*co, BusOperator::Ctb);
                assert_eq!(*dir, BusDirection::Inbound);
                assert_eq!(dest_name, "中環");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(config.pin(), PinState::Filtered(RowKey::Seq(4)));
    }

    #[test]
    fn bus_operator_defaults_to_kmb() {
        let config: CardConfig = serde_json::from_str(r#"{"type":"BUS","route":"1"}"#).unwrap();
        assert!(matches!(
            config,
            CardConfig::Bus {
                co: BusOperator::Kmb,
                dir: BusDirection::Outbound,
                ..
            }
        ));
    }

    #[test]
    fn writes_camel_case_with_tag() {
        let config = CardConfig::light_rail("705", RailDirection::Down)
            .with_pin(&PinState::Marked(RowKey::station("430")));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "LRT_LINE");
        assert_eq!(json["dir"], "DOWN");
        assert_eq!(json["markedSeq"], "430");
        assert!(json["filteredSeq"].is_null());

        let station = serde_json::to_value(CardConfig::rail_station("TKL", "TKO")).unwrap();
        assert_eq!(station["type"], "MTR");
        assert_eq!(station["staCode"], "TKO");
    }
}
