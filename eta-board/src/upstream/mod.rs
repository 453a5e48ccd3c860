//! Upstream operator adapters.
//!
//! Each operator exposes a different JSON shape; the adapters map them onto
//! the shared stop and arrival records. All HTTP goes through
//! [`HttpFetch`] so tests can run without network access.

mod bus;
mod error;
mod fetch;
mod light_rail;
#[cfg(test)]
pub(crate) mod mock;
mod rail;
mod stop_cache;
mod types;

use std::sync::Arc;

pub use bus::{
    BusBoundaries, BusClient, DirectionStops, NlbRouteVariant, StopSchedule, filter_etas,
    nlb_terminus,
};
pub use error::{ErrorKind, UpstreamError};
pub use fetch::{HttpFetch, ReqwestFetch};
pub use light_rail::{LrtClient, LrtDeparture, is_circular, parse_relative_minutes, route_arrivals};
pub use rail::{
    MtrClient, MtrTrain, SUSPENDED_MESSAGE, StationSchedule, accepts_destination, platform_mark,
};
pub use stop_cache::StopCache;
pub use types::{BusRouteDto, NlbRouteDto};

use crate::config::DashboardConfig;

/// Every operator client over one shared transport.
pub struct Upstream<F> {
    pub bus: BusClient<F>,
    pub mtr: MtrClient<F>,
    pub lrt: LrtClient<F>,
}

impl<F: HttpFetch> Upstream<F> {
    /// Build all clients from the configured endpoints.
    pub fn new(fetch: Arc<F>, config: &DashboardConfig) -> Self {
        Self {
            bus: BusClient::new(Arc::clone(&fetch), config),
            mtr: MtrClient::new(Arc::clone(&fetch), config),
            lrt: LrtClient::new(fetch, config),
        }
    }
}
