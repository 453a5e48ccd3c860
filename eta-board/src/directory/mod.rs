//! Route and station directory.
//!
//! Built once at startup from the static rail catalog plus the three bus
//! operators' route listings. Used for autocomplete search, exact-match
//! "search and create", and NLB route-variant lookup.

mod catalog;

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

pub use catalog::{
    LIGHT_RAIL_COLOR, LIGHT_RAIL_ROUTES, LightRailRoute, RAIL_LINES, RailLine,
    light_rail_route, light_rail_station_name, rail_line, station_name,
};

use crate::domain::BusOperator;
use crate::upstream::{BusClient, BusRouteDto, HttpFetch, NlbRouteDto, NlbRouteVariant};

/// Maximum bus routes returned by [`Directory::search`].
const MAX_BUS_MATCHES: usize = 50;

/// Maximum stations returned by [`Directory::search`].
const MAX_STATION_MATCHES: usize = 20;

/// One bus route of one operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDirectoryEntry {
    pub route: String,
    pub origin: String,
    pub dest: String,
    pub operator: BusOperator,
}

/// A heavy-rail station on a specific line.
#[derive(Debug, Clone, Copy)]
pub struct StationMatch {
    pub line: &'static RailLine,
    pub code: &'static str,
    pub name: &'static str,
}

/// Autocomplete results, grouped by kind.
#[derive(Debug, Default)]
pub struct SearchResults<'a> {
    pub lines: Vec<&'static RailLine>,
    pub light_rail: Vec<&'static LightRailRoute>,
    pub stations: Vec<StationMatch>,
    pub buses: Vec<&'a RouteDirectoryEntry>,
}

impl SearchResults<'_> {
    /// No matches of any kind.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
            && self.light_rail.is_empty()
            && self.stations.is_empty()
            && self.buses.is_empty()
    }
}

/// Result of an exact-match lookup.
#[derive(Debug, Clone, Copy)]
pub enum Resolved<'a> {
    RailLine(&'static RailLine),
    LightRail(&'static LightRailRoute),
    Station(StationMatch),
    Bus(&'a RouteDirectoryEntry),
}

/// The preloaded route catalog.
#[derive(Debug, Default)]
pub struct Directory {
    routes: Vec<RouteDirectoryEntry>,
    nlb_variants: HashMap<String, Vec<NlbRouteVariant>>,
}

/// Sort key for route codes: the number formed by all digits, then the code.
///
/// Codes without digits sort as 0.
///
/// # Examples
///
/// ```
/// use eta_board::directory::route_sort_key;
///
/// assert!(route_sort_key("2") < route_sort_key("10"));
/// assert!(route_sort_key("1A") > route_sort_key("1"));
/// assert_eq!(route_sort_key("A").0, 0);
/// ```
pub fn route_sort_key(route: &str) -> (u64, &str) {
    let digits: String = route.chars().filter(char::is_ascii_digit).collect();
    (digits.parse().unwrap_or(0), route)
}

impl Directory {
    /// An empty catalog; rail lookups still work.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge the three operator listings.
    ///
    /// Entries are deduplicated by `(operator, route)`, keeping the first,
    /// and sorted with [`route_sort_key`].
    pub fn from_listings(kmb: Vec<BusRouteDto>, ctb: Vec<BusRouteDto>, nlb: Vec<NlbRouteDto>) -> Self {
        let mut nlb_variants: HashMap<String, Vec<NlbRouteVariant>> = HashMap::new();
        let mut nlb_entries = Vec::new();
        for dto in &nlb {
            if !nlb_variants.contains_key(&dto.route_no) {
                let mut parts = dto.route_name_c.splitn(2, '>').map(str::trim);
                let origin = parts.next().filter(|s| !s.is_empty()).unwrap_or("?");
                let dest = parts.next().filter(|s| !s.is_empty()).unwrap_or("?");
                nlb_entries.push(RouteDirectoryEntry {
                    route: dto.route_no.clone(),
                    origin: origin.to_string(),
                    dest: dest.to_string(),
                    operator: BusOperator::Nlb,
                });
            }
            let variants = nlb_variants.entry(dto.route_no.clone()).or_default();
            if let Some(variant) = NlbRouteVariant::from_dto(dto) {
                variants.push(variant);
            }
        }

        let bus = |operator: BusOperator| {
            move |dto: BusRouteDto| RouteDirectoryEntry {
                route: dto.route,
                origin: dto.orig_tc.unwrap_or_default(),
                dest: dto.dest_tc.unwrap_or_default(),
                operator,
            }
        };

        let mut seen = HashSet::new();
        let mut routes: Vec<RouteDirectoryEntry> = kmb
            .into_iter()
            .map(bus(BusOperator::Kmb))
            .chain(ctb.into_iter().map(bus(BusOperator::Ctb)))
            .chain(nlb_entries)
            .filter(|entry| seen.insert((entry.operator, entry.route.clone())))
            .collect();
        routes.sort_by(|a, b| route_sort_key(&a.route).cmp(&route_sort_key(&b.route)));

        Self {
            routes,
            nlb_variants,
        }
    }

    /// Fetch all three listings concurrently and merge them.
    ///
    /// A failed listing contributes nothing; the directory is never an error.
    pub async fn preload<F: HttpFetch>(bus: &BusClient<F>) -> Self {
        let (kmb, ctb, nlb) = futures::join!(bus.kmb_routes(), bus.ctb_routes(), bus.nlb_routes());

        let kmb = kmb.unwrap_or_else(|e| {
            warn!(operator = "KMB", error = %e, "Route listing failed, continuing without it");
            Vec::new()
        });
        let ctb = ctb.unwrap_or_else(|e| {
            warn!(operator = "CTB", error = %e, "Route listing failed, continuing without it");
            Vec::new()
        });
        let nlb = nlb.unwrap_or_else(|e| {
            warn!(operator = "NLB", error = %e, "Route listing failed, continuing without it");
            Vec::new()
        });

        let directory = Self::from_listings(kmb, ctb, nlb);
        info!(routes = directory.routes.len(), "Route directory loaded");
        directory
    }

    /// All bus routes in display order.
    pub fn routes(&self) -> &[RouteDirectoryEntry] {
        &self.routes
    }

    /// NLB variants for a route number, outbound first.
    pub fn nlb_variants(&self, route: &str) -> &[NlbRouteVariant] {
        self.nlb_variants
            .get(route)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Autocomplete over every kind of entry.
    ///
    /// Codes match by prefix (case-insensitive); names match by substring.
    pub fn search(&self, query: &str) -> SearchResults<'_> {
        let query = query.trim();
        if query.is_empty() {
            return SearchResults::default();
        }
        let upper = query.to_uppercase();

        let lines = RAIL_LINES
            .iter()
            .filter(|l| l.name.contains(query) || l.code.starts_with(&upper))
            .collect();
        let light_rail = LIGHT_RAIL_ROUTES
            .iter()
            .filter(|r| r.route.starts_with(&upper))
            .collect();
        let stations = all_stations()
            .filter(|s| s.name.contains(query) || s.code.starts_with(&upper))
            .take(MAX_STATION_MATCHES)
            .collect();
        let buses = self
            .routes
            .iter()
            .filter(|r| r.route.starts_with(&upper))
            .take(MAX_BUS_MATCHES)
            .collect();

        SearchResults {
            lines,
            light_rail,
            stations,
            buses,
        }
    }

    /// Exact match, tried as rail line, light-rail route, station, then bus.
    pub fn resolve(&self, query: &str) -> Option<Resolved<'_>> {
        let query = query.trim();
        let upper = query.to_uppercase();

        if let Some(line) = RAIL_LINES
            .iter()
            .find(|l| l.name == query || l.code == upper)
        {
            return Some(Resolved::RailLine(line));
        }
        if let Some(route) = LIGHT_RAIL_ROUTES.iter().find(|r| r.route == upper) {
            return Some(Resolved::LightRail(route));
        }
        if let Some(station) = all_stations().find(|s| s.name == query || s.code == upper) {
            return Some(Resolved::Station(station));
        }
        self.routes
            .iter()
            .find(|r| r.route == upper)
            .map(Resolved::Bus)
    }
}

fn all_stations() -> impl Iterator<Item = StationMatch> {
    RAIL_LINES.iter().flat_map(|line| {
        line.stations.iter().map(move |&(code, name)| StationMatch { line, code, name })
    })
}
