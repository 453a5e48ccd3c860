//! Card variants and their fetch strategies.
//!
//! Every variant shares the lifecycle in [`super::lifecycle`]; what
//! differs is how a poll is turned into upstream requests and rows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::warn;

use super::config::CardConfig;
use super::pin::PinState;
use super::view::{CardBody, CardHeader, DirectionTab, MapOverlay, MapStop, RowData};
use crate::directory::{
    Directory, LIGHT_RAIL_COLOR, LightRailRoute, RailLine, light_rail_station_name, station_name,
};
use crate::domain::{BusDirection, BusOperator, Direction, RailDirection, RowKey, StationCode};
use crate::eta::EtaEntry;
use crate::focus::{FocusQuery, FocusTarget, fetch_focus};
use crate::upstream::{
    BusBoundaries, ErrorKind, HttpFetch, Upstream, UpstreamError, accepts_destination,
    is_circular, platform_mark, route_arrivals,
};

/// Placeholder while the first fetch runs.
pub const LOADING_MESSAGE: &str = "載入中...";
/// Placeholder for a valid response without departures.
pub const NO_SCHEDULE_MESSAGE: &str = "暫無班次資料";
/// Placeholder for a bus direction without stops.
pub const NO_STOPS_MESSAGE: &str = "此方向無車站資料";

/// Which transit view a card shows.
#[derive(Debug, Clone)]
pub enum CardKind {
    Bus {
        operator: BusOperator,
        route: String,
        dir: BusDirection,
        /// Terminus of the current direction.
        dest_name: String,
    },
    RailStation {
        line: &'static RailLine,
        station: StationCode,
    },
    RailLine {
        line: &'static RailLine,
        dir: RailDirection,
    },
    LightRail {
        route: &'static LightRailRoute,
        dir: RailDirection,
    },
    Focus(FocusQuery),
}

/// Data produced by one successful poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Board {
    Rows(Vec<RowData>),
    /// Nothing to list, with the reason.
    Empty(String),
    /// Focus-view arrivals, soonest first.
    Focus(Vec<EtaEntry>),
    /// The view cannot show arrivals; explains why.
    Message(String),
}

/// Everything one poll needs, captured while the card is locked.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    kind: CardKind,
    boundaries: Option<Arc<BusBoundaries>>,
}

/// Result of one poll.
#[derive(Debug)]
pub struct FetchOutcome {
    pub result: Result<Board, UpstreamError>,
    /// Bus stop lists, loaded on the first poll and reused afterwards.
    pub boundaries: Option<Arc<BusBoundaries>>,
    /// Instant the poll started. Relative upstream times are anchored to
    /// it, so arrivals must be normalized against it too.
    pub fetched_at: DateTime<Utc>,
}

impl CardKind {
    /// Header for the current state.
    pub fn header(&self) -> CardHeader {
        match self {
            CardKind::Bus {
                operator,
                route,
                dest_name,
                ..
            } => CardHeader {
                icon: "🚌",
                title: format!("{} {route}", operator.display_name()),
                subtitle: (!dest_name.is_empty()).then(|| format!("往 {dest_name}")),
                color: operator.color().to_string(),
            },
            CardKind::RailStation { line, station } => CardHeader {
                icon: "🚇",
                title: format!(
                    "{} {}",
                    line.name,
                    line.station_name(station.as_str()).unwrap_or(station.as_str())
                ),
                subtitle: None,
                color: line.color.to_string(),
            },
            CardKind::RailLine { line, dir } => CardHeader {
                icon: "🚇",
                title: line.name.to_string(),
                subtitle: Some(format!("往 {}", line.terminal(*dir))),
                color: line.color.to_string(),
            },
            CardKind::LightRail { route, dir } => CardHeader {
                icon: "🚈",
                title: format!("輕鐵 {}", route.route),
                subtitle: Some(format!("往 {}", route.dest(route.shown_dir(*dir)))),
                color: LIGHT_RAIL_COLOR.to_string(),
            },
            CardKind::Focus(query) => CardHeader {
                icon: query.icon(),
                title: query.name.clone(),
                subtitle: query.dest.as_ref().map(|d| format!("往 {d}")),
                color: match &query.target {
                    FocusTarget::Bus { operator, .. } => operator.color().to_string(),
                    FocusTarget::Rail { line, .. } => crate::directory::rail_line(line)
                        .map(|l| l.color)
                        .unwrap_or("#666666")
                        .to_string(),
                    FocusTarget::LightRail { .. } => LIGHT_RAIL_COLOR.to_string(),
                },
            },
        }
    }

    /// Direction switch entries; empty for views without directions.
    pub fn directions(&self, boundaries: Option<&BusBoundaries>) -> Vec<DirectionTab> {
        match self {
            CardKind::Bus { dir, .. } => [BusDirection::Outbound, BusDirection::Inbound]
                .into_iter()
                .map(|d| {
                    let (label, enabled) = match boundaries {
                        Some(b) => (b.get(d).dest_name.clone(), b.get(d).is_available()),
                        None => (d.fallback_label().to_string(), true),
                    };
                    DirectionTab {
                        label: format!("往 {label}"),
                        active: d == *dir,
                        enabled,
                    }
                })
                .collect(),
            CardKind::RailLine { line, dir } => rail_tabs(*dir, |d| line.terminal(d)),
            CardKind::LightRail { route, .. } if route.is_circular() => vec![DirectionTab {
                label: format!("↺ {}", route.dest(RailDirection::Up)),
                active: true,
                enabled: false,
            }],
            CardKind::LightRail { route, dir } => rail_tabs(*dir, |d| route.dest(d)),
            CardKind::RailStation { .. } | CardKind::Focus(_) => Vec::new(),
        }
    }

    /// Apply a direction change; returns whether anything changed.
    ///
    /// Requests of the wrong direction type, bus directions known to have
    /// no stops and circular light-rail routes are ignored.
    pub fn switch_dir(&mut self, to: Direction, boundaries: Option<&BusBoundaries>) -> bool {
        match (self, to) {
            (
                CardKind::Bus {
                    dir, dest_name, ..
                },
                Direction::Bus(new),
            ) if *dir != new => {
                if let Some(b) = boundaries {
                    if !b.get(new).is_available() {
                        return false;
                    }
                    *dest_name = b.get(new).dest_name.clone();
                } else {
                    dest_name.clear();
                }
                *dir = new;
                true
            }
            (CardKind::RailLine { dir, .. }, Direction::Rail(new)) if *dir != new => {
                *dir = new;
                true
            }
            (CardKind::LightRail { route, dir }, Direction::Rail(new))
                if *dir != new && !route.is_circular() =>
            {
                *dir = new;
                true
            }
            _ => false,
        }
    }

    /// Record the terminus once bus stop lists are known.
    pub fn learn_boundaries(&mut self, boundaries: &BusBoundaries) {
        if let CardKind::Bus { dir, dest_name, .. } = self {
            *dest_name = boundaries.get(*dir).dest_name.clone();
        }
    }

    /// Whether the card polls at the focus-view interval.
    pub fn is_focus(&self) -> bool {
        matches!(self, CardKind::Focus(_))
    }

    /// Saved form, or `None` for focus views.
    pub fn config(&self, pin: &PinState) -> Option<CardConfig> {
        Some(match self {
            CardKind::Bus {
                operator,
                route,
                dir,
                dest_name,
            } => {
                let mut config = CardConfig::bus(*operator, route.clone(), *dir).with_pin(pin);
                if let CardConfig::Bus { dest_name: d, .. } = &mut config {
                    *d = dest_name.clone();
                }
                config
            }
            CardKind::RailStation { line, station } => {
                CardConfig::rail_station(line.code, station.as_str())
            }
            CardKind::RailLine { line, dir } => CardConfig::rail_line(line.code, *dir).with_pin(pin),
            CardKind::LightRail { route, dir } => {
                CardConfig::light_rail(route.route, *dir).with_pin(pin)
            }
            CardKind::Focus(_) => return None,
        })
    }

    /// Placeholder text for a failed poll.
    pub fn error_body(&self, error: &UpstreamError) -> CardBody {
        if let UpstreamError::Suspended(message) = error {
            return CardBody::Error(message.clone());
        }
        if error.kind() == ErrorKind::NoData {
            return CardBody::Empty(NO_SCHEDULE_MESSAGE.to_string());
        }
        let message = match self {
            CardKind::RailLine { .. } => "全綫資料載入失敗",
            CardKind::LightRail { .. } => "輕鐵資料載入失敗",
            _ => "資料載入失敗",
        };
        CardBody::Error(message.to_string())
    }

    /// Chips shown per row; only bus rows are capped.
    pub fn chip_limit(&self, bus_limit: usize) -> Option<usize> {
        matches!(self, CardKind::Bus { .. }).then_some(bus_limit)
    }

    /// Route map for a bus card, unless a row is filtered.
    pub fn map_overlay(
        &self,
        boundaries: Option<&BusBoundaries>,
        pin: &PinState,
    ) -> Option<MapOverlay> {
        let CardKind::Bus { operator, dir, .. } = self else {
            return None;
        };
        if pin.is_filtered() {
            return None;
        }
        let stops: Vec<MapStop> = boundaries?
            .get(*dir)
            .stops
            .iter()
            .filter_map(|s| {
                let (latitude, longitude) = s.coordinates()?;
                Some(MapStop {
                    seq: s.sequence,
                    name: s.name.clone(),
                    latitude,
                    longitude,
                })
            })
            .collect();
        if stops.is_empty() {
            return None;
        }
        Some(MapOverlay {
            color: operator.color().to_string(),
            stops,
            highlighted: pin.pinned().and_then(RowKey::as_seq),
        })
    }

    /// Focus navigation for one row.
    pub fn focus_query(&self, key: &RowKey, boundaries: Option<&BusBoundaries>) -> Option<FocusQuery> {
        match self {
            CardKind::Bus {
                operator,
                route,
                dir,
                dest_name,
            } => {
                let seq = key.as_seq()?;
                let stop = boundaries?
                    .get(*dir)
                    .stops
                    .iter()
                    .find(|s| s.sequence == seq)?;
                Some(FocusQuery {
                    target: FocusTarget::Bus {
                        operator: *operator,
                        route: route.clone(),
                        stop: stop.stop_id.clone(),
                        dir: *dir,
                    },
                    dest: (!dest_name.is_empty()).then(|| dest_name.clone()),
                    name: stop.name.clone(),
                })
            }
            CardKind::RailStation { line, station } => {
                let RowKey::Station(dir) = key else {
                    return None;
                };
                let dir = RailDirection::parse(dir)?;
                Some(FocusQuery {
                    target: FocusTarget::Rail {
                        line: line.code.to_string(),
                        station: *station,
                        dir: Some(dir),
                    },
                    dest: Some(line.terminal(dir).to_string()),
                    name: line.station_name(station.as_str())?.to_string(),
                })
            }
            CardKind::RailLine { line, dir } => {
                let RowKey::Station(code) = key else {
                    return None;
                };
                Some(FocusQuery {
                    target: FocusTarget::Rail {
                        line: line.code.to_string(),
                        station: StationCode::parse(code).ok()?,
                        dir: Some(*dir),
                    },
                    dest: Some(line.terminal(*dir).to_string()),
                    name: line.station_name(code)?.to_string(),
                })
            }
            CardKind::LightRail { route, dir } => {
                let RowKey::Station(id) = key else {
                    return None;
                };
                let station: u32 = id.parse().ok()?;
                Some(FocusQuery {
                    target: FocusTarget::LightRail {
                        route: route.route.to_string(),
                        station,
                    },
                    dest: Some(route.dest(route.shown_dir(*dir)).to_string()),
                    name: light_rail_station_name(station)
                        .unwrap_or(id.as_str())
                        .to_string(),
                })
            }
            CardKind::Focus(_) => None,
        }
    }
}

fn rail_tabs(active: RailDirection, label: impl Fn(RailDirection) -> &'static str) -> Vec<DirectionTab> {
    [RailDirection::Up, RailDirection::Down]
        .into_iter()
        .map(|d| DirectionTab {
            label: format!("往 {}", label(d)),
            active: d == active,
            enabled: true,
        })
        .collect()
}

impl FetchRequest {
    /// Capture a poll of `kind`.
    pub fn new(kind: CardKind, boundaries: Option<Arc<BusBoundaries>>) -> Self {
        Self { kind, boundaries }
    }

    /// Run the poll against the upstream feeds.
    pub async fn execute<F: HttpFetch>(
        self,
        upstream: &Upstream<F>,
        directory: &Directory,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        let FetchRequest { kind, boundaries } = self;
        match kind {
            CardKind::Bus {
                operator,
                route,
                dir,
                ..
            } => {
                let boundaries = match boundaries {
                    Some(b) if b.get(dir).is_available() => b,
                    _ => Arc::new(
                        upstream
                            .bus
                            .load_boundaries(operator, &route, directory.nlb_variants(&route))
                            .await,
                    ),
                };
                let direction = boundaries.get(dir);
                let result = if direction.is_available() {
                    upstream
                        .bus
                        .route_schedule(operator, &route, dir, direction)
                        .await
                        .map(|schedules| {
                            Board::Rows(
                                schedules
                                    .into_iter()
                                    .map(|s| RowData {
                                        key: RowKey::Seq(s.stop.sequence),
                                        label: s.stop.sequence.to_string(),
                                        name: s.stop.name,
                                        etas: s.etas,
                                    })
                                    .collect(),
                            )
                        })
                } else {
                    Ok(Board::Empty(NO_STOPS_MESSAGE.to_string()))
                };
                FetchOutcome {
                    result,
                    boundaries: Some(boundaries),
                    fetched_at: now,
                }
            }
            CardKind::RailStation { line, station } => FetchOutcome {
                result: rail_station_board(upstream, line, station).await,
                boundaries: None,
                fetched_at: now,
            },
            CardKind::RailLine { line, dir } => FetchOutcome {
                result: rail_line_board(upstream, line, dir).await,
                boundaries: None,
                fetched_at: now,
            },
            CardKind::LightRail { route, dir } => FetchOutcome {
                result: light_rail_board(upstream, route, dir, now).await,
                boundaries: None,
                fetched_at: now,
            },
            CardKind::Focus(query) => FetchOutcome {
                result: fetch_focus(upstream, &query, now).await,
                boundaries: None,
                fetched_at: now,
            },
        }
    }
}

async fn rail_station_board<F: HttpFetch>(
    upstream: &Upstream<F>,
    line: &'static RailLine,
    station: StationCode,
) -> Result<Board, UpstreamError> {
    let schedule = upstream.mtr.station_schedule(line.code, station).await?;
    let rows: Vec<RowData> = [RailDirection::Up, RailDirection::Down]
        .into_iter()
        .map(|dir| RowData {
            key: RowKey::station(dir.as_str()),
            label: String::new(),
            name: format!("往 {}", line.terminal(dir)),
            etas: Some(
                schedule
                    .trains(dir)
                    .iter()
                    .map(|t| {
                        let dest = station_name(&t.dest).unwrap_or(t.dest.as_str());
                        EtaEntry::with_note(t.time, format!("{dest} {}", platform_mark(&t.platform)))
                    })
                    .collect(),
            ),
        })
        .collect();

    if rows.iter().all(|r| r.etas.as_ref().is_some_and(Vec::is_empty)) {
        return Ok(Board::Empty(NO_SCHEDULE_MESSAGE.to_string()));
    }
    Ok(Board::Rows(rows))
}

/// One row per station; a station whose request failed shows no service.
async fn rail_line_board<F: HttpFetch>(
    upstream: &Upstream<F>,
    line: &'static RailLine,
    dir: RailDirection,
) -> Result<Board, UpstreamError> {
    let codes = line.station_codes();
    let results = join_all(
        codes
            .iter()
            .map(|code| upstream.mtr.station_schedule(line.code, *code)),
    )
    .await;

    let mut first_error = None;
    let mut any_ok = false;
    let mut rows: Vec<(StationCode, Option<Vec<EtaEntry>>)> = Vec::with_capacity(codes.len());
    for (code, result) in codes.into_iter().zip(results) {
        let etas = match result {
            Ok(schedule) => {
                any_ok = true;
                Some(
                    schedule
                        .trains(dir)
                        .iter()
                        .filter(|t| accepts_destination(line.code, dir, &t.dest))
                        .map(|t| {
                            let dest = station_name(&t.dest).unwrap_or(t.dest.as_str());
                            EtaEntry::with_note(t.time, dest)
                        })
                        .collect(),
                )
            }
            Err(UpstreamError::NoData) => {
                any_ok = true;
                Some(Vec::new())
            }
            Err(e) => {
                warn!(line = line.code, station = %code, error = %e, "Station schedule failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
                None
            }
        };
        rows.push((code, etas));
    }

    if let Some(e) = first_error
        && !any_ok
    {
        return Err(e);
    }
    if dir == RailDirection::Down {
        rows.reverse();
    }

    Ok(Board::Rows(
        rows.into_iter()
            .enumerate()
            .map(|(i, (code, etas))| RowData {
                key: RowKey::station(code.as_str()),
                label: (i + 1).to_string(),
                name: line
                    .station_name(code.as_str())
                    .unwrap_or(code.as_str())
                    .to_string(),
                etas,
            })
            .collect(),
    ))
}

async fn light_rail_board<F: HttpFetch>(
    upstream: &Upstream<F>,
    route: &'static LightRailRoute,
    dir: RailDirection,
    now: DateTime<Utc>,
) -> Result<Board, UpstreamError> {
    let mut stations: Vec<u32> = route.stations.to_vec();
    if dir == RailDirection::Up && !is_circular(route.route) {
        stations.reverse();
    }
    let results = join_all(stations.iter().map(|id| upstream.lrt.stop_schedule(*id))).await;

    let mut first_error = None;
    let mut any_ok = false;
    let mut rows = Vec::with_capacity(stations.len());
    for (i, (id, result)) in stations.iter().zip(results).enumerate() {
        let etas = match result {
            Ok(departures) => {
                any_ok = true;
                Some(route_arrivals(
                    &departures,
                    route.route,
                    Some(route.dest(dir)),
                    now,
                    false,
                ))
            }
            Err(e) => {
                warn!(route = route.route, station = id, error = %e, "Light rail stop failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
                None
            }
        };
        rows.push(RowData {
            key: RowKey::station(id.to_string()),
            label: (i + 1).to_string(),
            name: light_rail_station_name(*id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string()),
            etas,
        });
    }

    match first_error {
        Some(e) if !any_ok => Err(e),
        _ => Ok(Board::Rows(rows)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::directory::{light_rail_route, rail_line};
    use crate::upstream::mock::MockFetch;

    fn upstream(fetch: MockFetch) -> Upstream<MockFetch> {
        let config = DashboardConfig::default().with_base_url("http://mock");
        Upstream::new(Arc::new(fetch), &config)
    }

    fn mtr_url(line: &str, sta: &str) -> String {
        format!("http://mock/mtr?line={line}&sta={sta}&lang=TC")
    }

    fn mtr_body(line: &str, sta: &str, up: &[(&str, &str)], down: &[(&str, &str)]) -> String {
        let trains = |list: &[(&str, &str)]| {
            list.iter()
                .map(|(time, dest)| format!(r#"{{"time":"{time}","dest":"{dest}","plat":"1"}}"#))
                .collect::<Vec<_>>()
                .join(",")
        };
        format!(
            r#"{{"status":1,"data":{{"{line}-{sta}":{{"UP":[{}],"DOWN":[{}]}}}}}}"#,
            trains(up),
            trains(down)
        )
    }

    #[tokio::test]
    async fn rail_line_reverses_down_and_marks_failed_stations() {
        let line = rail_line("TKL").unwrap();
        let fetch = MockFetch::new();
        for (code, _) in line.stations {
            fetch.set_body(
                &mtr_url("TKL", code),
                mtr_body("TKL", code, &[], &[("2099-01-01 10:00:00", "NOP")]),
            );
        }
        fetch.set_network_error(&mtr_url("TKL", "YAT"));

        let outcome = FetchRequest::new(
            CardKind::RailLine {
                line,
                dir: RailDirection::Down,
            },
            None,
        )
        .execute(&upstream(fetch), &Directory::empty(), Utc::now())
        .await;

        let Ok(Board::Rows(rows)) = outcome.result else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), line.stations.len());
        assert_eq!(rows[0].key, RowKey::station("POA"));
        assert_eq!(rows[0].label, "1");
        assert_eq!(rows.last().unwrap().name, "北角");
        let yat = rows.iter().find(|r| r.key == RowKey::station("YAT")).unwrap();
        assert!(yat.etas.is_none());
        assert_eq!(rows[0].etas.as_ref().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rail_line_fails_when_every_station_fails() {
        let line = rail_line("DRL").unwrap();
        let fetch = MockFetch::new();
        let outcome = FetchRequest::new(
            CardKind::RailLine {
                line,
                dir: RailDirection::Up,
            },
            None,
        )
        .execute(&upstream(fetch), &Directory::empty(), Utc::now())
        .await;
        assert!(matches!(outcome.result, Err(UpstreamError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn rail_station_has_both_directions() {
        let line = rail_line("TKL").unwrap();
        let fetch = MockFetch::new().with_body(
            &mtr_url("TKL", "TKO"),
            mtr_body(
                "TKL",
                "TKO",
                &[("2099-01-01 10:00:00", "POA")],
                &[("2099-01-01 10:01:00", "NOP")],
            ),
        );
        let station = StationCode::parse("TKO").unwrap();
        let outcome = FetchRequest::new(CardKind::RailStation { line, station }, None)
            .execute(&upstream(fetch), &Directory::empty(), Utc::now())
            .await;

        let Ok(Board::Rows(rows)) = outcome.result else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].name, "往 寶琳/康城");
        assert_eq!(rows[1].name, "往 北角");
        let note = rows[0].etas.as_ref().unwrap()[0].note.clone().unwrap();
        assert_eq!(note, "寶琳 ①");
    }

    #[tokio::test]
    async fn rail_station_without_trains_is_empty() {
        let line = rail_line("TKL").unwrap();
        let fetch = MockFetch::new().with_body(&mtr_url("TKL", "TKO"), mtr_body("TKL", "TKO", &[], &[]));
        let station = StationCode::parse("TKO").unwrap();
        let outcome = FetchRequest::new(CardKind::RailStation { line, station }, None)
            .execute(&upstream(fetch), &Directory::empty(), Utc::now())
            .await;
        assert_eq!(
            outcome.result.unwrap(),
            Board::Empty(NO_SCHEDULE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn light_rail_up_is_reversed_and_filtered_by_destination() {
        let route = light_rail_route("505").unwrap();
        let fetch = MockFetch::new();
        for id in route.stations {
            fetch.set_body(
                &format!("http://mock/lrt?station_id={id}"),
                r#"{"status":1,"platform_list":[{"platform_id":"1","route_list":[
                    {"route_no":"505","dest_ch":"三聖","time_en":"4 min"},
                    {"route_no":"505","dest_ch":"兆康","time_en":"2 min"}]}]}"#,
            );
        }
        let outcome = FetchRequest::new(
            CardKind::LightRail {
                route,
                dir: RailDirection::Up,
            },
            None,
        )
        .execute(&upstream(fetch), &Directory::empty(), Utc::now())
        .await;

        let Ok(Board::Rows(rows)) = outcome.result else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].name, "兆康");
        assert_eq!(rows.last().unwrap().name, "屯門碼頭");
        assert!(rows.iter().all(|r| r.etas.as_ref().unwrap().len() == 1));
    }

    #[test]
    fn error_bodies() {
        let line = CardKind::RailLine {
            line: rail_line("TKL").unwrap(),
            dir: RailDirection::Up,
        };
        assert_eq!(
            line.error_body(&UpstreamError::Network("x".into())),
            CardBody::Error("全綫資料載入失敗".into())
        );
        assert_eq!(
            line.error_body(&UpstreamError::Suspended("颱風".into())),
            CardBody::Error("颱風".into())
        );
        assert_eq!(
            line.error_body(&UpstreamError::NoData),
            CardBody::Empty(NO_SCHEDULE_MESSAGE.into())
        );
    }

    #[test]
    fn switch_dir_rejects_mismatched_and_unchanged() {
        let mut kind = CardKind::LightRail {
            route: light_rail_route("751").unwrap(),
            dir: RailDirection::Up,
        };
        assert!(!kind.switch_dir(Direction::Rail(RailDirection::Up), None));
        assert!(!kind.switch_dir(Direction::Bus(BusDirection::Inbound), None));
        assert!(kind.switch_dir(Direction::Rail(RailDirection::Down), None));
        assert_eq!(kind.header().subtitle.as_deref(), Some("往 天逸"));
    }

    #[test]
    fn circular_light_rail_has_one_fixed_direction() {
        let mut kind = CardKind::LightRail {
            route: light_rail_route("705").unwrap(),
            dir: RailDirection::Down,
        };
        let tabs = kind.directions(None);
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].label, "↺ 天水圍循環綫");
        assert!(tabs[0].active && !tabs[0].enabled);

        assert!(!kind.switch_dir(Direction::Rail(RailDirection::Up), None));
        let query = kind.focus_query(&RowKey::station("430"), None).unwrap();
        assert_eq!(query.dest.as_deref(), Some("天水圍循環綫"));
    }

    #[test]
    fn station_card_config_has_no_pin() {
        let kind = CardKind::RailStation {
            line: rail_line("TKL").unwrap(),
            station: StationCode::parse("TKO").unwrap(),
        };
        assert_eq!(
            kind.config(&PinState::Marked(RowKey::station("UP"))),
            Some(CardConfig::rail_station("TKL", "TKO"))
        );
        assert!(
            CardKind::Focus(FocusQuery::parse("type=mtr&line=TKL&stop=TKO").unwrap())
                .config(&PinState::None)
                .is_none()
        );
    }
}
