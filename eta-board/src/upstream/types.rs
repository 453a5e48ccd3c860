//! Upstream response DTOs.
//!
//! These types map directly to the operators' JSON. They use `Option` and
//! `#[serde(default)]` liberally because the feeds omit fields, send empty
//! strings, or switch between strings and numbers for the same field.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

/// Accepts `"12"`, `12` or `null`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

/// Parse a numeric field delivered as either string or number.
pub(crate) fn parse_number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

// ============================================================================
// KMB / CTB (shared "data" envelope)
// ============================================================================

/// `{ "data": ... }` envelope used by the KMB and CTB feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: Option<T>,
}

/// Entry of the KMB or CTB route listing.
#[derive(Debug, Clone, Deserialize)]
pub struct BusRouteDto {
    pub route: String,
    #[serde(default)]
    pub orig_tc: Option<String>,
    #[serde(default)]
    pub dest_tc: Option<String>,
}

/// Entry of a KMB or CTB route-stop listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteStopDto {
    pub stop: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub seq: Option<String>,
}

/// KMB or CTB stop metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct StopDto {
    #[serde(default)]
    pub name_tc: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub lat: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub long: Option<String>,
}

/// KMB route/stop ETA record, also used for CTB stop ETAs.
#[derive(Debug, Clone, Deserialize)]
pub struct BusEtaDto {
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub seq: Option<String>,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub dest_tc: Option<String>,
    #[serde(default)]
    pub rmk_tc: Option<String>,
}

// ============================================================================
// NLB
// ============================================================================

/// NLB route listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NlbRoutesResponse {
    #[serde(default)]
    pub routes: Vec<NlbRouteDto>,
}

/// One NLB route variant; each direction is a separate variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NlbRouteDto {
    #[serde(deserialize_with = "string_or_number")]
    pub route_id: Option<String>,
    pub route_no: String,
    #[serde(rename = "routeName_c", default)]
    pub route_name_c: String,
}

/// NLB stop list for a route variant.
#[derive(Debug, Clone, Deserialize)]
pub struct NlbStopsResponse {
    #[serde(default)]
    pub stops: Vec<NlbStopDto>,
}

/// NLB stop.
#[derive(Debug, Clone, Deserialize)]
pub struct NlbStopDto {
    #[serde(rename = "stopId", deserialize_with = "string_or_number")]
    pub stop_id: Option<String>,
    #[serde(rename = "stopName_c", default)]
    pub stop_name_c: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub longitude: Option<String>,
}

/// NLB arrivals for one stop.
#[derive(Debug, Clone, Deserialize)]
pub struct NlbArrivalsResponse {
    #[serde(rename = "estimatedArrivals", default)]
    pub estimated_arrivals: Option<Vec<NlbArrivalDto>>,
}

/// One NLB arrival.
#[derive(Debug, Clone, Deserialize)]
pub struct NlbArrivalDto {
    #[serde(rename = "estimatedArrivalTime", default)]
    pub estimated_arrival_time: Option<String>,
}

// ============================================================================
// MTR heavy rail
// ============================================================================

/// Response of the heavy-rail schedule endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MtrScheduleResponse {
    /// 1 on success, 0 when the line is suspended or the query is invalid.
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// Keyed by `"{LINE}-{STATION}"`.
    #[serde(default)]
    pub data: Option<HashMap<String, MtrStationDto>>,
}

/// Both directions at one station.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MtrStationDto {
    #[serde(rename = "UP", default)]
    pub up: Option<Vec<MtrTrainDto>>,
    #[serde(rename = "DOWN", default)]
    pub down: Option<Vec<MtrTrainDto>>,
}

/// One train in the heavy-rail schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct MtrTrainDto {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub dest: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub plat: Option<String>,
}

// ============================================================================
// MTR light rail
// ============================================================================

/// Response of the light-rail schedule endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LrtScheduleResponse {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub platform_list: Option<Vec<LrtPlatformDto>>,
}

/// One platform of a light-rail stop.
#[derive(Debug, Clone, Deserialize)]
pub struct LrtPlatformDto {
    #[serde(default, deserialize_with = "string_or_number")]
    pub platform_id: Option<String>,
    #[serde(default)]
    pub route_list: Option<Vec<LrtRouteDto>>,
}

/// One upcoming light-rail departure.
#[derive(Debug, Clone, Deserialize)]
pub struct LrtRouteDto {
    #[serde(default)]
    pub route_no: Option<String>,
    #[serde(default)]
    pub dest_ch: Option<String>,
    /// Relative time text: `"3 min"`, `"Arriving"`, `"Departing"`, `"-"`.
    #[serde(default)]
    pub time_en: Option<String>,
}
