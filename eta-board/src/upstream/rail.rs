//! Heavy-rail schedule adapter.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::UpstreamError;
use super::fetch::{HttpFetch, get_json};
use super::types::{MtrScheduleResponse, MtrTrainDto};
use crate::config::DashboardConfig;
use crate::domain::{RailDirection, StationCode};
use crate::eta::parse_upstream_time;

/// Message shown when a suspended line gives no reason.
pub const SUSPENDED_MESSAGE: &str = "服務現正暫停";

/// East Rail up-direction termini that belong on the line view.
const EAL_UP_DESTINATIONS: [&str; 6] = ["LOW", "LMC", "SHT", "TAP", "FAN", "SHS"];

/// Tseung Kwan O line up-direction termini.
const TKL_UP_DESTINATIONS: [&str; 2] = ["POA", "LHP"];

/// One predicted train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MtrTrain {
    pub time: DateTime<Utc>,
    /// Destination station code.
    pub dest: String,
    pub platform: String,
}

/// Both directions' trains at one station, soonest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationSchedule {
    pub up: Vec<MtrTrain>,
    pub down: Vec<MtrTrain>,
}

impl StationSchedule {
    /// Trains in one direction.
    pub fn trains(&self, dir: RailDirection) -> &[MtrTrain] {
        match dir {
            RailDirection::Up => &self.up,
            RailDirection::Down => &self.down,
        }
    }
}

/// Whether a train to `dest` belongs on the `line` view in direction `dir`.
///
/// Two lines branch in the up direction; only the listed termini are kept.
/// Every other line and direction accepts all destinations.
///
/// # Examples
///
/// ```
/// use eta_board::domain::RailDirection;
/// use eta_board::upstream::accepts_destination;
///
/// assert!(accepts_destination("TKL", RailDirection::Up, "POA"));
/// assert!(!accepts_destination("TKL", RailDirection::Up, "TKO"));
/// assert!(accepts_destination("TKL", RailDirection::Down, "NOP"));
/// ```
pub fn accepts_destination(line: &str, dir: RailDirection, dest: &str) -> bool {
    match (line, dir) {
        ("EAL", RailDirection::Up) => EAL_UP_DESTINATIONS.contains(&dest),
        ("TKL", RailDirection::Up) => TKL_UP_DESTINATIONS.contains(&dest),
        _ => true,
    }
}

/// Platform number as a circled digit (⓪ to ⑩), or `(n)` otherwise.
pub fn platform_mark(platform: &str) -> String {
    const CIRCLED: [char; 11] = ['⓪', '①', '②', '③', '④', '⑤', '⑥', '⑦', '⑧', '⑨', '⑩'];
    match platform.trim().parse::<usize>() {
        Ok(n) if n < CIRCLED.len() => CIRCLED[n].to_string(),
        _ => format!("({})", platform.trim()),
    }
}

/// Client for the heavy-rail schedule endpoint.
pub struct MtrClient<F> {
    fetch: Arc<F>,
    url: String,
}

impl<F: HttpFetch> MtrClient<F> {
    /// Create a client using the configured endpoint.
    pub fn new(fetch: Arc<F>, config: &DashboardConfig) -> Self {
        Self {
            fetch,
            url: config.mtr_url.clone(),
        }
    }

    /// Fetch the schedule for one station on one line.
    ///
    /// `status == 0` means the line is suspended; the upstream message is
    /// returned as [`UpstreamError::Suspended`]. A response without the
    /// station's entry is [`UpstreamError::NoData`].
    pub async fn station_schedule(
        &self,
        line: &str,
        station: StationCode,
    ) -> Result<StationSchedule, UpstreamError> {
        let url = format!("{}?line={line}&sta={station}&lang=TC", self.url);
        let response: MtrScheduleResponse = get_json(&*self.fetch, &url).await?;

        if response.status == Some(0) {
            let message = response
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| SUSPENDED_MESSAGE.to_string());
            return Err(UpstreamError::Suspended(message));
        }

        let key = format!("{line}-{station}");
        let entry = response
            .data
            .and_then(|mut data| data.remove(&key))
            .ok_or(UpstreamError::NoData)?;

        Ok(StationSchedule {
            up: convert_trains(entry.up.unwrap_or_default(), &key),
            down: convert_trains(entry.down.unwrap_or_default(), &key),
        })
    }
}

fn convert_trains(trains: Vec<MtrTrainDto>, key: &str) -> Vec<MtrTrain> {
    let mut converted: Vec<MtrTrain> = trains
        .into_iter()
        .filter_map(|dto| {
            let Some(time) = dto.time.as_deref().and_then(parse_upstream_time) else {
                debug!(station = key, time = ?dto.time, "Dropping train without usable time");
                return None;
            };
            Some(MtrTrain {
                time,
                dest: dto.dest.unwrap_or_default(),
                platform: dto.plat.unwrap_or_default(),
            })
        })
        .collect();
    converted.sort_by_key(|t| t.time);
    converted
}
