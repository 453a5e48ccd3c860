//! The dashboard: owner of every live card.
//!
//! Cards are created and destroyed only through [`Dashboard`], which keeps
//! them in display order. Registry changes happen under one lock with no
//! await between lookup and mutation. A destroyed card leaves the registry
//! at once; its view is removed from the surface after the exit delay.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::card::{Card, CardConfig, CardContext, CardId, CardKind, CardView, PinState};
use crate::directory::{Resolved, SearchResults, light_rail_route, rail_line};
use crate::domain::{BusDirection, BusOperator, Direction, RailDirection, RowKey, StationCode};
use crate::focus::{FocusQuery, FocusQueryError};
use crate::store::{
    KeyValue, Preference, Preferences, SavedGroup, SavedGroupStore, StoreError,
    default_group_name,
};
use crate::surface::Surface;
use crate::upstream::HttpFetch;

/// Errors from dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("no card with id {0}")]
    UnknownCard(CardId),

    #[error("unknown rail line: {0}")]
    UnknownLine(String),

    #[error("unknown station {station} on line {line}")]
    UnknownStation { line: String, station: String },

    #[error("unknown light rail route: {0}")]
    UnknownLightRailRoute(String),

    #[error("there are no cards to save")]
    NothingToSave,

    #[error(transparent)]
    Focus(#[from] FocusQueryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

type Registry<F> = Arc<Mutex<Vec<Arc<Card<F>>>>>;

/// Live cards plus the saved-group store.
pub struct Dashboard<F, K> {
    ctx: Arc<CardContext<F>>,
    surface: Arc<dyn Surface>,
    cards: Registry<F>,
    next_id: AtomicU64,
    store: Mutex<SavedGroupStore<K>>,
}

impl<F: HttpFetch, K: KeyValue> Dashboard<F, K> {
    /// An empty dashboard; the surface shows its empty state.
    pub fn new(
        ctx: Arc<CardContext<F>>,
        surface: Arc<dyn Surface>,
        store: SavedGroupStore<K>,
    ) -> Self {
        surface.show_empty();
        Self {
            ctx,
            surface,
            cards: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
            store: Mutex::new(store),
        }
    }

    // ------------------------------------------------------------------
    // Creating cards
    // ------------------------------------------------------------------

    pub async fn create_bus(
        &self,
        operator: BusOperator,
        route: &str,
        dir: BusDirection,
    ) -> CardId {
        let kind = CardKind::Bus {
            operator,
            route: route.trim().to_uppercase(),
            dir,
            dest_name: String::new(),
        };
        self.spawn(kind, PinState::None).await
    }

    pub async fn create_rail_station(
        &self,
        line_code: &str,
        sta_code: &str,
    ) -> Result<CardId, DashboardError> {
        let (line, station) = rail_station(line_code, sta_code)?;
        Ok(self
            .spawn(CardKind::RailStation { line, station }, PinState::None)
            .await)
    }

    pub async fn create_rail_line(
        &self,
        line_code: &str,
        dir: RailDirection,
    ) -> Result<CardId, DashboardError> {
        let line = rail_line(line_code)
            .ok_or_else(|| DashboardError::UnknownLine(line_code.to_string()))?;
        Ok(self
            .spawn(CardKind::RailLine { line, dir }, PinState::None)
            .await)
    }

    /// A rail line card filtered to one of its stations.
    pub async fn create_rail_line_at(
        &self,
        line_code: &str,
        dir: RailDirection,
        sta_code: &str,
    ) -> Result<CardId, DashboardError> {
        let (line, station) = rail_station(line_code, sta_code)?;
        let pin = PinState::Filtered(RowKey::station(station.as_str()));
        Ok(self.spawn(CardKind::RailLine { line, dir }, pin).await)
    }

    pub async fn create_light_rail(
        &self,
        route: &str,
        dir: RailDirection,
    ) -> Result<CardId, DashboardError> {
        let route = light_rail_route(route.trim())
            .ok_or_else(|| DashboardError::UnknownLightRailRoute(route.to_string()))?;
        Ok(self
            .spawn(CardKind::LightRail { route, dir }, PinState::None)
            .await)
    }

    /// Recreate a card from its saved form, direction and pin included.
    pub async fn create_from_config(&self, config: &CardConfig) -> Result<CardId, DashboardError> {
        let pin = config.pin();
        let kind = match config {
            CardConfig::Bus {
                route,
                dir,
                co,
                dest_name,
                ..
            } => CardKind::Bus {
                operator: *co,
                route: route.clone(),
                dir: *dir,
                dest_name: dest_name.clone(),
            },
            CardConfig::RailStation { line_code, sta_code } => {
                let (line, station) = rail_station(line_code, sta_code)?;
                CardKind::RailStation { line, station }
            }
            CardConfig::RailLine { line_code, dir, .. } => CardKind::RailLine {
                line: rail_line(line_code)
                    .ok_or_else(|| DashboardError::UnknownLine(line_code.clone()))?,
                dir: *dir,
            },
            CardConfig::LightRailLine { route, dir, .. } => CardKind::LightRail {
                route: light_rail_route(route)
                    .ok_or_else(|| DashboardError::UnknownLightRailRoute(route.clone()))?,
                dir: *dir,
            },
        };
        Ok(self.spawn(kind, pin).await)
    }

    /// Open a focus view from its URL query string.
    pub async fn open_focus_url(&self, query: &str) -> Result<CardId, DashboardError> {
        let query = FocusQuery::parse(query)?;
        Ok(self.open_focus(query).await)
    }

    pub async fn open_focus(&self, query: FocusQuery) -> CardId {
        self.spawn(CardKind::Focus(query), PinState::None).await
    }

    async fn spawn(&self, kind: CardKind, pin: PinState) -> CardId {
        let id = CardId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let card = Card::new(
            id,
            kind,
            pin,
            Arc::clone(&self.ctx),
            Arc::clone(&self.surface),
        );
        self.cards.lock().await.push(Arc::clone(&card));
        card.init().await;
        info!(card = %id, "Card created");
        id
    }

    // ------------------------------------------------------------------
    // Removing cards
    // ------------------------------------------------------------------

    /// Destroy one card.
    pub async fn destroy(&self, id: CardId) -> Result<(), DashboardError> {
        let card = {
            let mut cards = self.cards.lock().await;
            let pos = cards
                .iter()
                .position(|c| c.id() == id)
                .ok_or(DashboardError::UnknownCard(id))?;
            cards.remove(pos)
        };
        self.retire(card).await;
        Ok(())
    }

    /// Destroy every card.
    pub async fn clear_all(&self) {
        let cards = std::mem::take(&mut *self.cards.lock().await);
        for card in cards {
            self.retire(card).await;
        }
    }

    async fn retire(&self, card: Arc<Card<F>>) {
        let id = card.id();
        card.destroy().await;

        let surface = Arc::clone(&self.surface);
        let cards = Arc::clone(&self.cards);
        let delay = self.ctx.config.removal_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            surface.remove(id);
            if cards.lock().await.is_empty() {
                surface.show_empty();
            }
        });
    }

    // ------------------------------------------------------------------
    // Card actions
    // ------------------------------------------------------------------

    /// Live card ids in display order.
    pub async fn card_ids(&self) -> Vec<CardId> {
        self.cards.lock().await.iter().map(|c| c.id()).collect()
    }

    /// Current rendered state of a card.
    pub async fn card_view(&self, id: CardId) -> Result<CardView, DashboardError> {
        Ok(self.card(id).await?.view().await)
    }

    pub(crate) async fn card(&self, id: CardId) -> Result<Arc<Card<F>>, DashboardError> {
        self.cards
            .lock()
            .await
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(DashboardError::UnknownCard(id))
    }

    pub async fn manual_refresh(&self, id: CardId) -> Result<bool, DashboardError> {
        Ok(self.card(id).await?.manual_refresh().await)
    }

    pub async fn switch_dir(&self, id: CardId, dir: Direction) -> Result<bool, DashboardError> {
        Ok(self.card(id).await?.switch_dir(dir).await)
    }

    pub async fn pin(&self, id: CardId, key: &RowKey) -> Result<bool, DashboardError> {
        Ok(self.card(id).await?.pin(key).await)
    }

    pub async fn toggle_mode(&self, id: CardId, key: &RowKey) -> Result<bool, DashboardError> {
        Ok(self.card(id).await?.toggle_mode(key).await)
    }

    /// Focus navigation for one row of a card, if the row supports it.
    pub async fn focus_query(
        &self,
        id: CardId,
        key: &RowKey,
    ) -> Result<Option<FocusQuery>, DashboardError> {
        Ok(self.card(id).await?.focus_query(key).await)
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    pub fn search(&self, query: &str) -> SearchResults<'_> {
        self.ctx.directory.search(query)
    }

    /// Create a card for an exact match of `query`; `None` if nothing matches.
    pub async fn resolve_and_create(&self, query: &str) -> Result<Option<CardId>, DashboardError> {
        let id = match self.ctx.directory.resolve(query) {
            None => return Ok(None),
            Some(Resolved::RailLine(line)) => {
                self.spawn(
                    CardKind::RailLine {
                        line,
                        dir: RailDirection::Up,
                    },
                    PinState::None,
                )
                .await
            }
            Some(Resolved::LightRail(route)) => {
                self.spawn(
                    CardKind::LightRail {
                        route,
                        dir: RailDirection::Up,
                    },
                    PinState::None,
                )
                .await
            }
            Some(Resolved::Station(station)) => {
                self.create_rail_station(station.line.code, station.code)
                    .await?
            }
            Some(Resolved::Bus(entry)) => {
                let (operator, route) = (entry.operator, entry.route.clone());
                self.create_bus(operator, &route, BusDirection::Outbound)
                    .await
            }
        };
        Ok(Some(id))
    }

    // ------------------------------------------------------------------
    // Saved groups
    // ------------------------------------------------------------------

    /// Saved form of every card except focus views, in display order.
    pub async fn snapshot(&self) -> Vec<CardConfig> {
        let cards: Vec<_> = self.cards.lock().await.clone();
        let mut configs = Vec::with_capacity(cards.len());
        for card in cards {
            if let Some(config) = card.config().await {
                configs.push(config);
            }
        }
        configs
    }

    /// Save the current cards; a blank name uses the suggested one.
    pub async fn save_current(&self, name: Option<&str>) -> Result<SavedGroup, DashboardError> {
        let configs = self.snapshot().await;
        if configs.is_empty() {
            return Err(DashboardError::NothingToSave);
        }
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_group_name(&configs),
        };
        Ok(self.store.lock().await.save(&name, configs)?)
    }

    /// Replace every card with the cards of a saved group.
    ///
    /// Entries that no longer resolve are skipped.
    pub async fn load_group(&self, group_id: u64) -> Result<Vec<CardId>, DashboardError> {
        let group = self.store.lock().await.get(group_id)?;
        Ok(self.load(&group).await)
    }

    /// Load the first saved group, if any.
    pub async fn load_default_group(&self) -> Result<Option<SavedGroup>, DashboardError> {
        let group = self.store.lock().await.default_group()?;
        if let Some(group) = &group {
            self.load(group).await;
        }
        Ok(group)
    }

    async fn load(&self, group: &SavedGroup) -> Vec<CardId> {
        self.clear_all().await;
        let mut ids = Vec::with_capacity(group.data.len());
        for config in &group.data {
            match self.create_from_config(config).await {
                Ok(id) => ids.push(id),
                Err(e) => warn!(group = group.id, error = %e, "Skipping saved card"),
            }
        }
        info!(group = group.id, name = %group.name, cards = ids.len(), "Loaded saved group");
        ids
    }

    /// The saved-group store, for listing and edit mode.
    pub fn store(&self) -> &Mutex<SavedGroupStore<K>> {
        &self.store
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    /// Read stored preferences and apply them to the context and surface.
    pub async fn load_preferences(&self) -> Result<Preferences, DashboardError> {
        let prefs = Preferences::load(self.store.lock().await.kv())?;
        self.apply_preferences(&prefs);
        Ok(prefs)
    }

    /// Store one preference and redraw every card with it applied.
    pub async fn set_preference(
        &self,
        pref: Preference,
        enabled: bool,
    ) -> Result<Preferences, DashboardError> {
        let prefs = {
            let store = self.store.lock().await;
            Preferences::set(store.kv(), pref, enabled)?;
            Preferences::load(store.kv())?
        };
        debug!(?pref, enabled, "Preference changed");
        self.apply_preferences(&prefs);
        let cards: Vec<_> = self.cards.lock().await.clone();
        for card in cards {
            card.rerender().await;
        }
        Ok(prefs)
    }

    fn apply_preferences(&self, prefs: &Preferences) {
        self.ctx.set_map_enabled(prefs.map_enabled);
        self.surface.apply_preferences(prefs);
    }
}

fn rail_station(
    line_code: &str,
    sta_code: &str,
) -> Result<(&'static crate::directory::RailLine, StationCode), DashboardError> {
    let line =
        rail_line(line_code).ok_or_else(|| DashboardError::UnknownLine(line_code.to_string()))?;
    let unknown = || DashboardError::UnknownStation {
        line: line_code.to_string(),
        station: sta_code.to_string(),
    };
    if line.station_name(sta_code).is_none() {
        return Err(unknown());
    }
    let station = StationCode::parse(sta_code).map_err(|_| unknown())?;
    Ok((line, station))
}
