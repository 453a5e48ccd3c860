//! Single-stop focus view.
//!
//! A focus view is reached from a card row through URL query parameters
//! and polls one stop faster than the dashboard cards. Its parameters
//! are `type` (`bus`, `mtr` or `lrt`), `co`, `line`, `route`, `stop`,
//! `dir`, `dest` and `name`.

use chrono::{DateTime, Utc};
use reqwest::Url;

use crate::card::Board;
use crate::directory::station_name;
use crate::domain::{BusDirection, BusOperator, RailDirection, StationCode};
use crate::eta::EtaEntry;
use crate::upstream::{
    HttpFetch, Upstream, UpstreamError, accepts_destination, is_circular, route_arrivals,
};

/// Shown instead of arrivals for operators the focus view cannot poll.
pub const NLB_FOCUS_MESSAGE: &str = "嶼巴資料需回主頁查看";

/// Error returned when focus parameters are missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FocusQueryError {
    #[error("missing parameter `{0}`")]
    Missing(&'static str),

    #[error("invalid value {value:?} for `{param}`")]
    Invalid { param: &'static str, value: String },
}

/// What a focus view polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    Bus {
        operator: BusOperator,
        route: String,
        stop: String,
        dir: BusDirection,
    },
    /// Heavy-rail station; both directions merged when `dir` is `None`.
    Rail {
        line: String,
        station: StationCode,
        dir: Option<RailDirection>,
    },
    LightRail { route: String, station: u32 },
}

/// A parsed focus navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusQuery {
    pub target: FocusTarget,
    /// Destination label, without a leading `往`.
    pub dest: Option<String>,
    /// Stop or station display name.
    pub name: String,
}

impl FocusQuery {
    /// Parse a URL query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Result<Self, FocusQueryError> {
        let query = query.trim_start_matches('?');
        let url = Url::parse(&format!("http://focus/?{query}")).map_err(|_| {
            FocusQueryError::Invalid {
                param: "query",
                value: query.to_string(),
            }
        })?;
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(FocusQueryError::Missing(key));
        let invalid = |param: &'static str, value: String| FocusQueryError::Invalid { param, value };

        let kind = require("type")?;
        let target = match kind.as_str() {
            "bus" => {
                let co = require("co")?;
                let operator = co.parse().map_err(|_| invalid("co", co))?;
                let dir = match get("dir").as_deref() {
                    None | Some("outbound") | Some("O") => BusDirection::Outbound,
                    Some("inbound") | Some("I") => BusDirection::Inbound,
                    Some(other) => return Err(invalid("dir", other.to_string())),
                };
                FocusTarget::Bus {
                    operator,
                    route: require("route")?,
                    stop: require("stop")?,
                    dir,
                }
            }
            "mtr" => {
                let stop = require("stop")?;
                let station = StationCode::parse(&stop).map_err(|_| invalid("stop", stop))?;
                let dir = match get("dir") {
                    None => None,
                    Some(d) => Some(RailDirection::parse(&d).ok_or_else(|| invalid("dir", d))?),
                };
                FocusTarget::Rail {
                    line: require("line")?,
                    station,
                    dir,
                }
            }
            "lrt" => {
                let stop = require("stop")?;
                let station = stop.parse().map_err(|_| invalid("stop", stop))?;
                FocusTarget::LightRail {
                    route: require("route")?,
                    station,
                }
            }
            _ => return Err(invalid("type", kind)),
        };

        let dest = get("dest")
            .map(|d| d.trim_start_matches('往').trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Self {
            target,
            dest,
            name: get("name").unwrap_or_default(),
        })
    }

    /// Encode as a URL query string (without `?`).
    pub fn to_query_string(&self) -> String {
        let mut url = match Url::parse("http://focus/") {
            Ok(url) => url,
            Err(_) => return String::new(),
        };
        {
            let mut pairs = url.query_pairs_mut();
            match &self.target {
                FocusTarget::Bus {
                    operator,
                    route,
                    stop,
                    dir,
                } => {
                    pairs
                        .append_pair("type", "bus")
                        .append_pair("co", operator.as_str())
                        .append_pair("route", route)
                        .append_pair("stop", stop)
                        .append_pair("dir", dir.as_str());
                }
                FocusTarget::Rail { line, station, dir } => {
                    pairs
                        .append_pair("type", "mtr")
                        .append_pair("line", line)
                        .append_pair("stop", station.as_str());
                    if let Some(dir) = dir {
                        pairs.append_pair("dir", dir.as_str());
                    }
                }
                FocusTarget::LightRail { route, station } => {
                    pairs
                        .append_pair("type", "lrt")
                        .append_pair("route", route)
                        .append_pair("stop", &station.to_string());
                }
            }
            if let Some(dest) = &self.dest {
                pairs.append_pair("dest", dest);
            }
            pairs.append_pair("name", &self.name);
        }
        url.query().unwrap_or_default().to_string()
    }

    /// Icon shown in the focus header.
    pub fn icon(&self) -> &'static str {
        match self.target {
            FocusTarget::Bus { .. } => "🚌",
            FocusTarget::Rail { .. } => "🚇",
            FocusTarget::LightRail { .. } => "🚈",
        }
    }
}

/// Fetch the arrivals for a focus view.
pub async fn fetch_focus<F: HttpFetch>(
    upstream: &Upstream<F>,
    query: &FocusQuery,
    now: DateTime<Utc>,
) -> Result<Board, UpstreamError> {
    match &query.target {
        FocusTarget::Bus {
            operator: BusOperator::Nlb,
            ..
        } => Ok(Board::Message(NLB_FOCUS_MESSAGE.to_string())),
        FocusTarget::Bus {
            operator,
            route,
            stop,
            dir,
        } => {
            let etas = upstream.bus.stop_etas(*operator, stop, route, *dir).await?;
            Ok(Board::Focus(etas))
        }
        FocusTarget::Rail { line, station, dir } => {
            let schedule = upstream.mtr.station_schedule(line, *station).await?;
            let dirs = match dir {
                Some(dir) => vec![*dir],
                None => vec![RailDirection::Up, RailDirection::Down],
            };
            let mut etas: Vec<EtaEntry> = dirs
                .into_iter()
                .flat_map(|dir| {
                    schedule
                        .trains(dir)
                        .iter()
                        .filter(move |t| accepts_destination(line, dir, &t.dest))
                })
                .map(|t| {
                    let dest = station_name(&t.dest).unwrap_or(t.dest.as_str());
                    EtaEntry::with_note(t.time, format!("往 {dest} ({}號月台)", t.platform))
                })
                .collect();
            etas.sort_by_key(|e| e.time);
            Ok(Board::Focus(etas))
        }
        FocusTarget::LightRail { route, station } => {
            let departures = upstream.lrt.stop_schedule(*station).await?;
            let dest = query.dest.as_deref().filter(|_| !is_circular(route));
            Ok(Board::Focus(route_arrivals(
                &departures,
                route,
                dest,
                now,
                true,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::DashboardConfig;
    use crate::upstream::mock::MockFetch;

    #[test]
    fn parses_bus_query() {
        let query =
            FocusQuery::parse("?type=bus&co=CTB&route=1&stop=001234&dir=inbound&dest=%E4%B8%AD%E7%92%B0&name=X")
                .unwrap();
        assert_eq!(
            query.target,
            FocusTarget::Bus {
                operator: BusOperator::Ctb,
                route: "1".into(),
                stop: "001234".into(),
                dir: BusDirection::Inbound,
            }
        );
        assert_eq!(query.dest.as_deref(), Some("中環"));
        assert_eq!(query.name, "X");
    }

    #[test]
    fn strips_leading_direction_word_from_dest() {
        let query = FocusQuery {
            target: FocusTarget::LightRail {
                route: "505".into(),
                station: 100,
            },
            dest: Some("往 三聖".into()),
            name: "兆康".into(),
        };
        let parsed = FocusQuery::parse(&query.to_query_string()).unwrap();
        assert_eq!(parsed.dest.as_deref(), Some("三聖"));
        assert_eq!(parsed.target, query.target);
    }

    #[test]
    fn rail_query_without_direction_merges() {
        let query = FocusQuery::parse("type=mtr&line=TKL&stop=TKO&name=將軍澳").unwrap();
        assert!(matches!(query.target, FocusTarget::Rail { dir: None, .. }));
        let encoded = query.to_query_string();
        assert!(!encoded.contains("dir="));
        assert_eq!(FocusQuery::parse(&encoded).unwrap(), query);
    }

    #[test]
    fn rejects_bad_queries() {
        assert_eq!(
            FocusQuery::parse("co=KMB"),
            Err(FocusQueryError::Missing("type"))
        );
        assert!(matches!(
            FocusQuery::parse("type=tram&stop=1"),
            Err(FocusQueryError::Invalid { param: "type", .. })
        ));
        assert!(matches!(
            FocusQuery::parse("type=mtr&line=TKL&stop=tko"),
            Err(FocusQueryError::Invalid { param: "stop", .. })
        ));
        assert!(matches!(
            FocusQuery::parse("type=lrt&route=505&stop=abc"),
            Err(FocusQueryError::Invalid { param: "stop", .. })
        ));
    }

    fn upstream(fetch: MockFetch) -> Upstream<MockFetch> {
        let config = DashboardConfig::default().with_base_url("http://mock");
        Upstream::new(Arc::new(fetch), &config)
    }

    #[tokio::test]
    async fn nlb_focus_shows_message() {
        let up = upstream(MockFetch::new());
        let query = FocusQuery {
            target: FocusTarget::Bus {
                operator: BusOperator::Nlb,
                route: "3M".into(),
                stop: "1".into(),
                dir: BusDirection::Outbound,
            },
            dest: None,
            name: String::new(),
        };
        let board = fetch_focus(&up, &query, Utc::now()).await.unwrap();
        assert_eq!(board, Board::Message(NLB_FOCUS_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn rail_focus_filters_and_annotates() {
        let body = r#"{"status":1,"data":{"TKL-TKO":{
            "UP":[{"time":"2099-01-01 10:05:00","dest":"POA","plat":"1"},
                  {"time":"2099-01-01 10:02:00","dest":"TKO","plat":"1"}],
            "DOWN":[{"time":"2099-01-01 10:03:00","dest":"NOP","plat":"2"}]}}}"#;
        let fetch = MockFetch::new().with_body("http://mock/mtr?line=TKL&sta=TKO&lang=TC", body);
        let up = upstream(fetch);
        let query = FocusQuery::parse("type=mtr&line=TKL&stop=TKO").unwrap();

        let Board::Focus(etas) = fetch_focus(&up, &query, Utc::now()).await.unwrap() else {
            panic!("expected focus board");
        };
        let notes: Vec<_> = etas.iter().filter_map(|e| e.note.as_deref()).collect();
        assert_eq!(notes, ["往 北角 (2號月台)", "往 寶琳 (1號月台)"]);
    }

    #[tokio::test]
    async fn light_rail_focus_filters_by_destination() {
        let body = r#"{"status":1,"platform_list":[{"platform_id":"1","route_list":[
            {"route_no":"505","dest_ch":"三聖","time_en":"3 min"},
            {"route_no":"505","dest_ch":"兆康","time_en":"1 min"},
            {"route_no":"751","dest_ch":"天逸","time_en":"Arriving"}]}]}"#;
        let fetch = MockFetch::new().with_body("http://mock/lrt?station_id=100", body);
        let up = upstream(fetch);
        let query = FocusQuery::parse("type=lrt&route=505&stop=100&dest=往三聖").unwrap();

        let Board::Focus(etas) = fetch_focus(&up, &query, Utc::now()).await.unwrap() else {
            panic!("expected focus board");
        };
        assert_eq!(etas.len(), 1);
        assert_eq!(etas[0].note.as_deref(), Some("往 三聖 (1號月台)"));
    }
}
