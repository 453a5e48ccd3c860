//! Light-rail schedule adapter.
//!
//! Unlike every other feed, light rail reports relative times as text
//! (`"3 min"`, `"Arriving"`, `"Departing"`, `"-"`). They are converted to
//! absolute times against the caller's "now" so that the shared normalizer
//! can treat every operator alike.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::error::UpstreamError;
use super::fetch::{HttpFetch, get_json};
use super::types::LrtScheduleResponse;
use crate::config::DashboardConfig;
use crate::eta::EtaEntry;

/// Routes that loop back to their origin and have no meaningful terminus.
const CIRCULAR_ROUTES: [&str; 2] = ["705", "706"];

/// Whether a light-rail route is circular.
pub fn is_circular(route: &str) -> bool {
    CIRCULAR_ROUTES.contains(&route)
}

/// Parse relative time text into whole minutes.
///
/// `"Arriving"` and `"Departing"` are due now; `"-"` and anything
/// unrecognised carry no prediction.
pub fn parse_relative_minutes(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("arriving") || text.eq_ignore_ascii_case("departing") {
        return Some(0);
    }
    let number = text
        .strip_suffix("mins")
        .or_else(|| text.strip_suffix("min"))?
        .trim();
    number.parse::<i64>().ok().filter(|m| *m >= 0)
}

/// One departure listed at a light-rail stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrtDeparture {
    pub route: String,
    /// Destination name in Chinese.
    pub dest: String,
    pub platform: String,
    pub minutes: i64,
}

impl LrtDeparture {
    /// Absolute arrival time relative to `now`.
    pub fn arrival_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(self.minutes)
    }
}

/// Arrivals of `route` among a stop's departures, soonest first.
///
/// When `dest` is given and the route is not circular, only departures to
/// that destination are kept. With `annotate`, each entry notes its
/// destination and platform.
pub fn route_arrivals(
    departures: &[LrtDeparture],
    route: &str,
    dest: Option<&str>,
    now: DateTime<Utc>,
    annotate: bool,
) -> Vec<EtaEntry> {
    let filter_dest = dest.filter(|_| !is_circular(route));
    let mut matching: Vec<&LrtDeparture> = departures
        .iter()
        .filter(|d| d.route == route)
        .filter(|d| filter_dest.is_none_or(|dest| d.dest == dest))
        .collect();
    matching.sort_by_key(|d| d.minutes);

    matching
        .into_iter()
        .map(|d| {
            let time = d.arrival_time(now);
            if annotate {
                EtaEntry::with_note(time, format!("往 {} ({}號月台)", d.dest, d.platform))
            } else {
                EtaEntry::new(time)
            }
        })
        .collect()
}

/// Client for the light-rail schedule endpoint.
pub struct LrtClient<F> {
    fetch: Arc<F>,
    url: String,
}

impl<F: HttpFetch> LrtClient<F> {
    /// Create a client using the configured endpoint.
    pub fn new(fetch: Arc<F>, config: &DashboardConfig) -> Self {
        Self {
            fetch,
            url: config.lrt_url.clone(),
        }
    }

    /// All departures at one stop, across platforms and routes.
    ///
    /// A non-success `status` is an empty schedule rather than an error.
    pub async fn stop_schedule(&self, station_id: u32) -> Result<Vec<LrtDeparture>, UpstreamError> {
        let url = format!("{}?station_id={station_id}", self.url);
        let response: LrtScheduleResponse = get_json(&*self.fetch, &url).await?;

        if response.status != Some(1) {
            debug!(station_id, status = ?response.status, "Light rail stop reports no schedule");
            return Ok(Vec::new());
        }

        let mut departures = Vec::new();
        for platform in response.platform_list.unwrap_or_default() {
            let platform_id = platform.platform_id.unwrap_or_default();
            for route in platform.route_list.unwrap_or_default() {
                let Some(minutes) = route.time_en.as_deref().and_then(parse_relative_minutes)
                else {
                    continue;
                };
                departures.push(LrtDeparture {
                    route: route.route_no.unwrap_or_default(),
                    dest: route.dest_ch.unwrap_or_default(),
                    platform: platform_id.clone(),
                    minutes,
                });
            }
        }
        Ok(departures)
    }
}
