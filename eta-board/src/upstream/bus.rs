//! Bus adapters for KMB, Citybus and New Lantao Bus.
//!
//! The three operators expose different shapes:
//! - KMB publishes every stop's arrivals for a route in one `route-eta`
//!   listing, tagged with stop sequence and a direction letter
//! - Citybus publishes arrivals per stop, tagged with a direction letter
//! - NLB has no direction field at all; each direction is a separate route
//!   variant with its own id, and arrivals are fetched per stop

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use super::error::UpstreamError;
use super::fetch::{HttpFetch, get_json};
use super::stop_cache::StopCache;
use super::types::{
    BusEtaDto, BusRouteDto, DataEnvelope, NlbArrivalsResponse, NlbRouteDto, NlbRoutesResponse,
    NlbStopsResponse, RouteStopDto, StopDto, parse_number,
};
use crate::config::DashboardConfig;
use crate::domain::{BusDirection, BusOperator, StopInfo, StopRecord, UNKNOWN_STOP_NAME};
use crate::eta::{EtaEntry, parse_upstream_time};

/// One direction of an NLB route number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlbRouteVariant {
    pub route_id: String,
    /// Terminus label derived from the route name.
    pub terminus: String,
}

impl NlbRouteVariant {
    /// Build a variant from a listing entry; entries without an id are unusable.
    pub fn from_dto(dto: &NlbRouteDto) -> Option<Self> {
        let route_id = dto.route_id.clone().filter(|id| !id.is_empty())?;
        Some(Self {
            route_id,
            terminus: nlb_terminus(&dto.route_name_c),
        })
    }
}

/// The part of an NLB route name after `>`, or the whole name.
pub fn nlb_terminus(route_name: &str) -> String {
    match route_name.split_once('>') {
        Some((_, dest)) => dest.trim().to_string(),
        None => route_name.trim().to_string(),
    }
}

/// Stops and terminus of one direction of a bus route.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionStops {
    /// Ordered by sequence.
    pub stops: Vec<StopRecord>,
    pub dest_name: String,
    /// NLB only: the variant id serving this direction.
    pub nlb_route_id: Option<String>,
}

impl DirectionStops {
    fn empty(dir: BusDirection) -> Self {
        Self {
            stops: Vec::new(),
            dest_name: dir.fallback_label().to_string(),
            nlb_route_id: None,
        }
    }

    /// Whether the route runs in this direction at all.
    pub fn is_available(&self) -> bool {
        !self.stops.is_empty()
    }
}

/// Both directions of a bus route, loaded once per card.
#[derive(Debug, Clone, PartialEq)]
pub struct BusBoundaries {
    pub outbound: DirectionStops,
    pub inbound: DirectionStops,
}

impl BusBoundaries {
    /// Stops for one direction.
    pub fn get(&self, dir: BusDirection) -> &DirectionStops {
        match dir {
            BusDirection::Outbound => &self.outbound,
            BusDirection::Inbound => &self.inbound,
        }
    }

    /// A route with outbound stops only.
    pub fn is_circular(&self) -> bool {
        self.outbound.is_available() && !self.inbound.is_available()
    }
}

/// Arrivals for one stop; `None` when that stop's fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub struct StopSchedule {
    pub stop: StopRecord,
    pub etas: Option<Vec<EtaEntry>>,
}

/// Client for the three bus operators.
pub struct BusClient<F> {
    fetch: Arc<F>,
    kmb_url: String,
    ctb_url: String,
    nlb_url: String,
    stops: StopCache,
}

impl<F: HttpFetch> BusClient<F> {
    /// Create a client using the configured base URLs.
    pub fn new(fetch: Arc<F>, config: &DashboardConfig) -> Self {
        Self {
            fetch,
            kmb_url: config.kmb_url.trim_end_matches('/').to_string(),
            ctb_url: config.ctb_url.trim_end_matches('/').to_string(),
            nlb_url: config.nlb_url.trim_end_matches('/').to_string(),
            stops: StopCache::new(),
        }
    }

    /// The permanent stop cache shared by every bus card.
    pub fn stop_cache(&self) -> &StopCache {
        &self.stops
    }

    // ------------------------------------------------------------------
    // Route listings
    // ------------------------------------------------------------------

    /// Full KMB route listing.
    pub async fn kmb_routes(&self) -> Result<Vec<BusRouteDto>, UpstreamError> {
        self.get_data(&format!("{}/route/", self.kmb_url)).await
    }

    /// Full Citybus route listing.
    pub async fn ctb_routes(&self) -> Result<Vec<BusRouteDto>, UpstreamError> {
        self.get_data(&format!("{}/route/CTB", self.ctb_url)).await
    }

    /// Full NLB route listing; one entry per route variant.
    pub async fn nlb_routes(&self) -> Result<Vec<NlbRouteDto>, UpstreamError> {
        let url = format!("{}/route.php?action=list", self.nlb_url);
        let response: NlbRoutesResponse = get_json(&*self.fetch, &url).await?;
        Ok(response.routes)
    }

    // ------------------------------------------------------------------
    // Stops
    // ------------------------------------------------------------------

    /// Stops of a KMB or Citybus route in one direction, names unresolved.
    pub async fn route_stops(
        &self,
        operator: BusOperator,
        route: &str,
        dir: BusDirection,
    ) -> Result<Vec<StopRecord>, UpstreamError> {
        let url = match operator {
            BusOperator::Kmb => format!("{}/route-stop/{route}/{dir}/1", self.kmb_url),
            BusOperator::Ctb => format!("{}/route-stop/CTB/{route}/{dir}", self.ctb_url),
            BusOperator::Nlb => {
                return Err(UpstreamError::Unsupported(
                    "NLB stops are listed per route variant",
                ));
            }
        };

        let rows: Vec<RouteStopDto> = self.get_data(&url).await?;
        let mut stops: Vec<StopRecord> = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let seq = parse_number(row.seq.as_deref()).unwrap_or(i as u32 + 1);
                StopRecord::new(row.stop, seq, "")
            })
            .collect();
        stops.sort_by_key(|s| s.sequence);
        Ok(stops)
    }

    /// Stops of one NLB route variant, with names and coordinates.
    ///
    /// The metadata is written into the stop cache so later lookups for
    /// these stops need no request.
    pub async fn nlb_route_stops(&self, route_id: &str) -> Result<Vec<StopRecord>, UpstreamError> {
        let url = format!("{}/stop.php?action=list&routeId={route_id}", self.nlb_url);
        let response: NlbStopsResponse = get_json(&*self.fetch, &url).await?;

        let mut stops = Vec::with_capacity(response.stops.len());
        for (i, dto) in response.stops.into_iter().enumerate() {
            let Some(stop_id) = dto.stop_id.filter(|id| !id.is_empty()) else {
                debug!(route_id, index = i, "NLB stop without id, skipping");
                continue;
            };
            let info = StopInfo {
                name: dto.stop_name_c,
                latitude: parse_number(dto.latitude.as_deref()),
                longitude: parse_number(dto.longitude.as_deref()),
            };
            self.stops
                .insert(BusOperator::Nlb, &stop_id, info.clone())
                .await;
            stops.push(StopRecord::new(stop_id, i as u32 + 1, "").with_info(&info));
        }
        Ok(stops)
    }

    /// Resolve a stop's name and coordinates through the permanent cache.
    ///
    /// Never fails: an unresolvable stop yields the unknown placeholder,
    /// which is not cached. NLB stops are only known via
    /// [`nlb_route_stops`](Self::nlb_route_stops).
    pub async fn resolve_stop(&self, operator: BusOperator, stop_id: &str) -> StopInfo {
        let url = match operator {
            BusOperator::Kmb => format!("{}/stop/{stop_id}", self.kmb_url),
            BusOperator::Ctb => format!("{}/stop/{stop_id}", self.ctb_url),
            BusOperator::Nlb => {
                return self
                    .stops
                    .get(operator, stop_id)
                    .await
                    .unwrap_or_else(StopInfo::unknown);
            }
        };

        let fetch = &*self.fetch;
        let lookup = async move {
            let envelope: DataEnvelope<StopDto> = get_json(fetch, &url).await?;
            let dto = envelope
                .data
                .ok_or_else(|| UpstreamError::shape("stop response without data", ""))?;
            let name = dto
                .name_tc
                .filter(|n| !n.trim().is_empty())
                .ok_or_else(|| UpstreamError::shape("stop without name_tc", ""))?;
            Ok(StopInfo {
                name,
                latitude: parse_number(dto.lat.as_deref()),
                longitude: parse_number(dto.long.as_deref()),
            })
        };

        match self.stops.get_or_fetch(operator, stop_id, lookup).await {
            Ok(info) => info,
            Err(e) => {
                warn!(operator = %operator, stop = stop_id, error = %e, "Stop lookup failed");
                StopInfo::unknown()
            }
        }
    }

    /// Load both directions' stops and terminus names.
    ///
    /// A direction that fails to load is treated as having no stops. For
    /// NLB, `variants[0]` serves outbound and `variants[1]` inbound.
    pub async fn load_boundaries(
        &self,
        operator: BusOperator,
        route: &str,
        nlb_variants: &[NlbRouteVariant],
    ) -> BusBoundaries {
        let (outbound, inbound) = futures::join!(
            self.load_direction(operator, route, BusDirection::Outbound, nlb_variants.first()),
            self.load_direction(operator, route, BusDirection::Inbound, nlb_variants.get(1)),
        );
        BusBoundaries { outbound, inbound }
    }

    async fn load_direction(
        &self,
        operator: BusOperator,
        route: &str,
        dir: BusDirection,
        variant: Option<&NlbRouteVariant>,
    ) -> DirectionStops {
        if operator == BusOperator::Nlb {
            let Some(variant) = variant else {
                return DirectionStops::empty(dir);
            };
            let stops = match self.nlb_route_stops(&variant.route_id).await {
                Ok(stops) => stops,
                Err(e) => {
                    warn!(route, route_id = %variant.route_id, error = %e, "NLB stop list failed");
                    Vec::new()
                }
            };
            let dest_name = if variant.terminus.is_empty() {
                dir.fallback_label().to_string()
            } else {
                variant.terminus.clone()
            };
            return DirectionStops {
                stops,
                dest_name,
                nlb_route_id: Some(variant.route_id.clone()),
            };
        }

        let stops = match self.route_stops(operator, route, dir).await {
            Ok(stops) => stops,
            Err(e) => {
                debug!(operator = %operator, route, dir = %dir, error = %e, "No stops for direction");
                return DirectionStops::empty(dir);
            }
        };

        let infos = join_all(
            stops
                .iter()
                .map(|s| self.resolve_stop(operator, &s.stop_id)),
        )
        .await;
        let stops: Vec<StopRecord> = stops
            .into_iter()
            .zip(infos)
            .map(|(stop, info)| stop.with_info(&info))
            .collect();

        let dest_name = stops
            .last()
            .map(|s| s.name.clone())
            .filter(|name| !name.is_empty() && name != UNKNOWN_STOP_NAME)
            .unwrap_or_else(|| dir.fallback_label().to_string());

        DirectionStops {
            stops,
            dest_name,
            nlb_route_id: None,
        }
    }

    // ------------------------------------------------------------------
    // Arrivals
    // ------------------------------------------------------------------

    /// Every stop's arrivals for a KMB route, both directions.
    pub async fn kmb_route_etas(&self, route: &str) -> Result<Vec<BusEtaDto>, UpstreamError> {
        self.get_data(&format!("{}/route-eta/{route}/1", self.kmb_url))
            .await
    }

    /// Arrivals at one KMB or Citybus stop for a route and direction.
    pub async fn stop_etas(
        &self,
        operator: BusOperator,
        stop_id: &str,
        route: &str,
        dir: BusDirection,
    ) -> Result<Vec<EtaEntry>, UpstreamError> {
        let url = match operator {
            BusOperator::Kmb => format!("{}/eta/{stop_id}/{route}/1", self.kmb_url),
            BusOperator::Ctb => format!("{}/eta/CTB/{stop_id}/{route}", self.ctb_url),
            BusOperator::Nlb => {
                return Err(UpstreamError::Unsupported("NLB arrivals need a route id"));
            }
        };
        let records: Vec<BusEtaDto> = self.get_data(&url).await?;
        Ok(filter_etas(&records, dir, None))
    }

    /// Arrivals at one stop of an NLB route variant.
    pub async fn nlb_stop_etas(
        &self,
        route_id: &str,
        stop_id: &str,
    ) -> Result<Vec<EtaEntry>, UpstreamError> {
        let url = format!(
            "{}/stop.php?action=estimatedArrivals&routeId={route_id}&stopId={stop_id}&language=zh",
            self.nlb_url
        );
        let response: NlbArrivalsResponse = get_json(&*self.fetch, &url).await?;
        let mut etas: Vec<EtaEntry> = response
            .estimated_arrivals
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| parse_upstream_time(a.estimated_arrival_time.as_deref()?))
            .map(EtaEntry::new)
            .collect();
        etas.sort_by_key(|e| e.time);
        Ok(etas)
    }

    /// Arrivals for every stop of a route in one direction.
    ///
    /// KMB needs a single request, so its failure fails the whole card.
    /// Citybus and NLB fetch per stop: a failed stop becomes a `None` row,
    /// and only the failure of every stop is an error.
    pub async fn route_schedule(
        &self,
        operator: BusOperator,
        route: &str,
        dir: BusDirection,
        direction: &DirectionStops,
    ) -> Result<Vec<StopSchedule>, UpstreamError> {
        let stops = &direction.stops;

        if operator == BusOperator::Kmb {
            let records = self.kmb_route_etas(route).await?;
            return Ok(stops
                .iter()
                .map(|stop| StopSchedule {
                    stop: stop.clone(),
                    etas: Some(filter_etas(&records, dir, Some(stop.sequence))),
                })
                .collect());
        }

        let results = match operator {
            BusOperator::Nlb => {
                let route_id = direction
                    .nlb_route_id
                    .as_deref()
                    .ok_or(UpstreamError::NoData)?;
                join_all(
                    stops
                        .iter()
                        .map(|s| self.nlb_stop_etas(route_id, &s.stop_id)),
                )
                .await
            }
            _ => {
                join_all(
                    stops
                        .iter()
                        .map(|s| self.stop_etas(operator, &s.stop_id, route, dir)),
                )
                .await
            }
        };

        collect_partial(stops, results)
    }

    async fn get_data<T>(&self, url: &str) -> Result<T, UpstreamError>
    where
        T: serde::de::DeserializeOwned,
    {
        let envelope: DataEnvelope<T> = get_json(&*self.fetch, url).await?;
        envelope
            .data
            .ok_or_else(|| UpstreamError::shape(format!("no data field in {url}"), ""))
    }
}

/// Pair per-stop results with their stops, failing only if all failed.
fn collect_partial(
    stops: &[StopRecord],
    results: Vec<Result<Vec<EtaEntry>, UpstreamError>>,
) -> Result<Vec<StopSchedule>, UpstreamError> {
    let mut schedules = Vec::with_capacity(stops.len());
    let mut first_error = None;
    let mut any_ok = false;

    for (stop, result) in stops.iter().zip(results) {
        let etas = match result {
            Ok(etas) => {
                any_ok = true;
                Some(etas)
            }
            Err(e) => {
                warn!(stop = %stop.stop_id, error = %e, "Stop arrivals failed, showing no service");
                if first_error.is_none() {
                    first_error = Some(e);
                }
                None
            }
        };
        schedules.push(StopSchedule {
            stop: stop.clone(),
            etas,
        });
    }

    match first_error {
        Some(e) if !any_ok => Err(e),
        _ => Ok(schedules),
    }
}

/// Select records for a direction (and stop sequence), parse and sort them.
///
/// Records without a parseable time, i.e. scheduled slots with no
/// prediction, are dropped. Non-empty remarks become the entry note.
pub fn filter_etas(records: &[BusEtaDto], dir: BusDirection, seq: Option<u32>) -> Vec<EtaEntry> {
    let mut etas: Vec<EtaEntry> = records
        .iter()
        .filter(|r| r.dir.as_deref() == Some(dir.code()))
        .filter(|r| seq.is_none() || parse_number::<u32>(r.seq.as_deref()) == seq)
        .filter_map(|r| {
            let time = parse_upstream_time(r.eta.as_deref()?)?;
            Some(match r.rmk_tc.as_deref().map(str::trim) {
                Some(rmk) if !rmk.is_empty() => EtaEntry::with_note(time, rmk),
                _ => EtaEntry::new(time),
            })
        })
        .collect();
    etas.sort_by_key(|e| e.time);
    etas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::mock::MockFetch;

    const BASE: &str = "http://mock";

    fn client(fetch: MockFetch) -> (BusClient<MockFetch>, Arc<MockFetch>) {
        let fetch = Arc::new(fetch);
        let config = DashboardConfig::default().with_base_url(BASE);
        (BusClient::new(Arc::clone(&fetch), &config), fetch)
    }

    fn stop_body(name: &str) -> String {
        format!(r#"{{"data":{{"stop":"X","name_tc":"{name}","lat":"22.3","long":"114.1"}}}}"#)
    }

    fn eta(dir: &str, seq: u32, time: &str) -> BusEtaDto {
        BusEtaDto {
            dir: Some(dir.into()),
            seq: Some(seq.to_string()),
            eta: Some(time.into()),
            dest_tc: None,
            rmk_tc: None,
        }
    }

    #[test]
    fn nlb_terminus_uses_part_after_arrow() {
        assert_eq!(nlb_terminus("大澳 > 東涌"), "東涌");
        assert_eq!(nlb_terminus("梅窩循環線"), "梅窩循環線");
    }

    #[test]
    fn filter_etas_by_direction_and_seq() {
        let records = vec![
            eta("O", 1, "2024-03-15T14:40:00+08:00"),
            eta("O", 1, "2024-03-15T14:35:00+08:00"),
            eta("I", 1, "2024-03-15T14:31:00+08:00"),
            eta("O", 2, "2024-03-15T14:32:00+08:00"),
            BusEtaDto {
                eta: None,
                ..eta("O", 1, "")
            },
        ];

        let etas = filter_etas(&records, BusDirection::Outbound, Some(1));
        assert_eq!(etas.len(), 2);
        assert!(etas[0].time < etas[1].time);

        let inbound = filter_etas(&records, BusDirection::Inbound, None);
        assert_eq!(inbound.len(), 1);
    }

    #[tokio::test]
    async fn route_stops_sorted_by_sequence() {
        let (client, _) = client(MockFetch::new().with_body(
            "http://mock/kmb/route-stop/1A/outbound/1",
            r#"{"data":[{"stop":"B","seq":"2"},{"stop":"A","seq":"1"}]}"#,
        ));
        let stops = client
            .route_stops(BusOperator::Kmb, "1A", BusDirection::Outbound)
            .await
            .unwrap();
        assert_eq!(stops[0].stop_id, "A");
        assert_eq!(stops[1].sequence, 2);
    }

    #[tokio::test]
    async fn resolve_stop_is_cached_and_cleaned_later() {
        let (client, fetch) = client(
            MockFetch::new().with_body("http://mock/kmb/stop/S1", stop_body("旺角 (MK123)")),
        );

        let first = client.resolve_stop(BusOperator::Kmb, "S1").await;
        let second = client.resolve_stop(BusOperator::Kmb, "S1").await;
        assert_eq!(first, second);
        assert_eq!(fetch.hits("http://mock/kmb/stop/S1"), 1);

        let record = StopRecord::new("S1", 1, "").with_info(&first);
        assert_eq!(record.name, "旺角");
        assert_eq!(record.coordinates(), Some((22.3, 114.1)));
    }

    #[tokio::test]
    async fn failed_lookup_gives_placeholder_and_retries() {
        let (client, fetch) = client(MockFetch::new().with_network_error("http://mock/ctb/stop/S9"));

        let info = client.resolve_stop(BusOperator::Ctb, "S9").await;
        assert_eq!(info.name, UNKNOWN_STOP_NAME);
        assert_eq!(info.latitude, None);

        fetch.set_body("http://mock/ctb/stop/S9", stop_body("中環"));
        let info = client.resolve_stop(BusOperator::Ctb, "S9").await;
        assert_eq!(info.name, "中環");
        assert_eq!(fetch.hits("http://mock/ctb/stop/S9"), 2);
    }

    #[tokio::test]
    async fn nlb_stop_list_populates_cache() {
        let (client, fetch) = client(MockFetch::new().with_body(
            "http://mock/nlb/stop.php?action=list&routeId=7",
            r#"{"stops":[{"stopId":"11","stopName_c":"大澳","latitude":"22.25","longitude":"113.86"},
                         {"stopId":"12","stopName_c":"東涌站","latitude":"22.29","longitude":"113.94"}]}"#,
        ));

        let stops = client.nlb_route_stops("7").await.unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[1].sequence, 2);

        let info = client.resolve_stop(BusOperator::Nlb, "12").await;
        assert_eq!(info.name, "東涌站");
        assert_eq!(fetch.total_hits(), 1);
    }

    #[tokio::test]
    async fn boundaries_for_outbound_only_route_are_circular() {
        let (client, _) = client(
            MockFetch::new()
                .with_body(
                    "http://mock/kmb/route-stop/11/outbound/1",
                    r#"{"data":[{"stop":"A","seq":"1"},{"stop":"B","seq":"2"}]}"#,
                )
                .with_body("http://mock/kmb/route-stop/11/inbound/1", r#"{"data":[]}"#)
                .with_body("http://mock/kmb/stop/A", stop_body("九龍站"))
                .with_body("http://mock/kmb/stop/B", stop_body("鑽石山站 (DH1)")),
        );

        let boundaries = client.load_boundaries(BusOperator::Kmb, "11", &[]).await;
        assert!(boundaries.is_circular());
        assert_eq!(boundaries.outbound.dest_name, "鑽石山站");
        assert!(!boundaries.inbound.is_available());
        assert_eq!(boundaries.inbound.dest_name, "回程");
    }

    #[tokio::test]
    async fn failed_direction_is_empty() {
        let (client, _) = client(
            MockFetch::new()
                .with_body(
                    "http://mock/ctb/route-stop/CTB/1/outbound",
                    r#"{"data":[{"stop":"A","seq":1}]}"#,
                )
                .with_network_error("http://mock/ctb/route-stop/CTB/1/inbound"),
        );

        let boundaries = client.load_boundaries(BusOperator::Ctb, "1", &[]).await;
        assert!(boundaries.outbound.is_available());
        // Unresolvable last stop falls back to the direction label.
        assert_eq!(boundaries.outbound.dest_name, "去程");
        assert!(!boundaries.inbound.is_available());
    }

    #[tokio::test]
    async fn nlb_boundaries_use_variants_in_order() {
        let (client, _) = client(
            MockFetch::new()
                .with_body(
                    "http://mock/nlb/stop.php?action=list&routeId=1",
                    r#"{"stops":[{"stopId":"1","stopName_c":"大澳"}]}"#,
                )
                .with_body(
                    "http://mock/nlb/stop.php?action=list&routeId=2",
                    r#"{"stops":[{"stopId":"2","stopName_c":"東涌"}]}"#,
                ),
        );
        let variants = [
            NlbRouteVariant {
                route_id: "1".into(),
                terminus: "東涌".into(),
            },
            NlbRouteVariant {
                route_id: "2".into(),
                terminus: "大澳".into(),
            },
        ];

        let boundaries = client
            .load_boundaries(BusOperator::Nlb, "11", &variants)
            .await;
        assert_eq!(boundaries.outbound.nlb_route_id.as_deref(), Some("1"));
        assert_eq!(boundaries.outbound.dest_name, "東涌");
        assert_eq!(boundaries.inbound.nlb_route_id.as_deref(), Some("2"));
        assert!(!boundaries.is_circular());
    }

    #[tokio::test]
    async fn kmb_schedule_failure_is_card_error() {
        let (client, _) = client(MockFetch::new().with_network_error("http://mock/kmb/route-eta/1/1"));
        let direction = DirectionStops {
            stops: vec![StopRecord::new("A", 1, "甲")],
            dest_name: "乙".into(),
            nlb_route_id: None,
        };
        let result = client
            .route_schedule(BusOperator::Kmb, "1", BusDirection::Outbound, &direction)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn ctb_schedule_tolerates_partial_failure() {
        let (client, _) = client(
            MockFetch::new()
                .with_body(
                    "http://mock/ctb/eta/CTB/A/1",
                    r#"{"data":[{"dir":"O","seq":1,"eta":"2024-03-15T14:35:00+08:00"}]}"#,
                )
                .with_network_error("http://mock/ctb/eta/CTB/B/1"),
        );
        let direction = DirectionStops {
            stops: vec![StopRecord::new("A", 1, "甲"), StopRecord::new("B", 2, "乙")],
            dest_name: "乙".into(),
            nlb_route_id: None,
        };

        let rows = client
            .route_schedule(BusOperator::Ctb, "1", BusDirection::Outbound, &direction)
            .await
            .unwrap();
        assert_eq!(rows[0].etas.as_ref().map(Vec::len), Some(1));
        assert_eq!(rows[1].etas, None);
    }

    #[tokio::test]
    async fn ctb_schedule_all_failed_is_error() {
        let (client, _) = client(MockFetch::new());
        let direction = DirectionStops {
            stops: vec![StopRecord::new("A", 1, "甲")],
            dest_name: "甲".into(),
            nlb_route_id: None,
        };
        let result = client
            .route_schedule(BusOperator::Ctb, "1", BusDirection::Outbound, &direction)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn nlb_arrivals_parse_local_time() {
        let (client, _) = client(MockFetch::new().with_body(
            "http://mock/nlb/stop.php?action=estimatedArrivals&routeId=7&stopId=11&language=zh",
            r#"{"estimatedArrivals":[{"estimatedArrivalTime":"2024-03-15 14:45:00"},
                                     {"estimatedArrivalTime":"2024-03-15 14:35:00"}]}"#,
        ));
        let etas = client.nlb_stop_etas("7", "11").await.unwrap();
        assert_eq!(etas.len(), 2);
        assert!(etas[0].time < etas[1].time);
    }
}
