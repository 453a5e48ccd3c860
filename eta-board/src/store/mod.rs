//! Saved groups and preferences.
//!
//! Both live in one client-local key-value store. Saved groups are an
//! ordered JSON list under a single key; the first group is the default
//! loaded at startup.
//!
//! Edit mode is a staging buffer: [`SavedGroupStore::begin_edit`] copies
//! the committed list, mutations touch only the copy, and
//! [`SavedGroupStore::commit`] or [`SavedGroupStore::discard`] ends the
//! session. Outside edit mode reads always see committed storage.

mod kv;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use kv::{FileKeyValue, KeyValue, MemoryKeyValue};

use crate::card::CardConfig;
use crate::directory::{rail_line, station_name};
use crate::domain::BusDirection;

/// Storage key of the saved-group list.
pub const SAVED_LIST_KEY: &str = "hk_transport_saved_list";

/// Name suggested when saving more than one card.
pub const MULTI_CARD_GROUP_NAME: &str = "我的通勤組合";

/// Errors from the local store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not in edit mode")]
    NotEditing,

    #[error("no saved group with id {0}")]
    UnknownGroup(u64),
}

/// A named, ordered list of card configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGroup {
    pub id: u64,
    pub name: String,
    pub data: Vec<CardConfig>,
}

impl SavedGroup {
    /// Short description for the saved-group list.
    pub fn description(&self) -> String {
        if self.data.len() > 1 {
            return format!("{} 個項目組合", self.data.len());
        }
        match self.data.first() {
            None => String::new(),
            Some(CardConfig::RailLine { line_code, .. }) => format!(
                "[港鐵] {}",
                rail_line(line_code).map_or(line_code.as_str(), |l| l.name)
            ),
            Some(CardConfig::RailStation { line_code, sta_code }) => format!(
                "[港鐵] {} ({})",
                station_name(sta_code).unwrap_or(sta_code.as_str()),
                rail_line(line_code).map_or("", |l| l.name)
            ),
            Some(CardConfig::LightRailLine { route, .. }) => format!("[輕鐵] {route} 綫"),
            Some(CardConfig::Bus {
                route,
                dir,
                co,
                dest_name,
                ..
            }) => {
                let towards = if dest_name.is_empty() {
                    match dir {
                        BusDirection::Outbound => "去程".to_string(),
                        BusDirection::Inbound => "回程".to_string(),
                    }
                } else {
                    format!("往 {dest_name}")
                };
                format!("[{co}] {route} {towards}")
            }
        }
    }
}

/// Name suggested when saving the given cards.
pub fn default_group_name(configs: &[CardConfig]) -> String {
    if configs.len() > 1 {
        return MULTI_CARD_GROUP_NAME.to_string();
    }
    match configs.first() {
        None => MULTI_CARD_GROUP_NAME.to_string(),
        Some(CardConfig::RailLine { line_code, .. }) => format!(
            "港鐵 {}",
            rail_line(line_code).map_or(line_code.as_str(), |l| l.name)
        ),
        Some(CardConfig::RailStation { sta_code, .. }) => {
            format!("港鐵 {}", station_name(sta_code).unwrap_or(sta_code.as_str()))
        }
        Some(CardConfig::LightRailLine { route, .. }) => format!("輕鐵 {route} 綫"),
        Some(CardConfig::Bus {
            route,
            co,
            dest_name,
            ..
        }) => {
            if dest_name.is_empty() {
                format!("{co} {route}")
            } else {
                format!("{co} {route} 往 {dest_name}")
            }
        }
    }
}

/// The saved-group list with an optional edit-mode staging buffer.
pub struct SavedGroupStore<K> {
    kv: K,
    staged: Option<Vec<SavedGroup>>,
    last_id: u64,
}

impl<K: KeyValue> SavedGroupStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            staged: None,
            last_id: 0,
        }
    }

    /// The underlying key-value store, shared with preferences.
    pub fn kv(&self) -> &K {
        &self.kv
    }

    /// The staged list in edit mode, otherwise the committed list.
    pub fn list(&self) -> Result<Vec<SavedGroup>, StoreError> {
        match &self.staged {
            Some(staged) => Ok(staged.clone()),
            None => self.committed(),
        }
    }

    /// The committed list, ignoring any staged changes.
    pub fn committed(&self) -> Result<Vec<SavedGroup>, StoreError> {
        match self.kv.get(SAVED_LIST_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// The first group, loaded at startup.
    pub fn default_group(&self) -> Result<Option<SavedGroup>, StoreError> {
        Ok(self.committed()?.into_iter().next())
    }

    pub fn get(&self, id: u64) -> Result<SavedGroup, StoreError> {
        self.list()?
            .into_iter()
            .find(|g| g.id == id)
            .ok_or(StoreError::UnknownGroup(id))
    }

    /// Append a new group.
    pub fn save(&mut self, name: &str, data: Vec<CardConfig>) -> Result<SavedGroup, StoreError> {
        let mut list = self.list()?;
        let id = self.next_id(&list);
        let group = SavedGroup {
            id,
            name: name.trim().to_string(),
            data,
        };
        list.push(group.clone());
        self.apply(list)?;
        info!(id, name = %group.name, cards = group.data.len(), "Saved group");
        Ok(group)
    }

    pub fn delete(&mut self, id: u64) -> Result<(), StoreError> {
        let mut list = self.list()?;
        let before = list.len();
        list.retain(|g| g.id != id);
        if list.len() == before {
            return Err(StoreError::UnknownGroup(id));
        }
        self.apply(list)
    }

    /// Rename a group. Only available in edit mode; blank names are ignored.
    pub fn rename(&mut self, id: u64, name: &str) -> Result<(), StoreError> {
        let staged = self.staged.as_mut().ok_or(StoreError::NotEditing)?;
        let group = staged
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or(StoreError::UnknownGroup(id))?;
        let name = name.trim();
        if !name.is_empty() {
            group.name = name.to_string();
        }
        Ok(())
    }

    /// Reorder groups by id. Only available in edit mode.
    ///
    /// Groups missing from `order` keep their relative order after the
    /// listed ones.
    pub fn reorder(&mut self, order: &[u64]) -> Result<(), StoreError> {
        let staged = self.staged.as_mut().ok_or(StoreError::NotEditing)?;
        if let Some(unknown) = order.iter().find(|id| !staged.iter().any(|g| g.id == **id)) {
            return Err(StoreError::UnknownGroup(*unknown));
        }
        let mut remaining = std::mem::take(staged);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(pos) = remaining.iter().position(|g| g.id == *id) {
                reordered.push(remaining.remove(pos));
            }
        }
        reordered.append(&mut remaining);
        *staged = reordered;
        Ok(())
    }

    /// Enter edit mode by copying the committed list. No-op when already editing.
    pub fn begin_edit(&mut self) -> Result<(), StoreError> {
        if self.staged.is_none() {
            self.staged = Some(self.committed()?);
            debug!("Entered edit mode");
        }
        Ok(())
    }

    /// Persist the staged list and leave edit mode.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        let staged = self.staged.take().ok_or(StoreError::NotEditing)?;
        self.write(&staged)?;
        info!(groups = staged.len(), "Committed saved groups");
        Ok(())
    }

    /// Drop the staged list and leave edit mode; storage is untouched.
    pub fn discard(&mut self) -> Result<(), StoreError> {
        self.staged.take().ok_or(StoreError::NotEditing)?;
        debug!("Discarded staged changes");
        Ok(())
    }

    pub fn is_editing(&self) -> bool {
        self.staged.is_some()
    }

    fn apply(&mut self, list: Vec<SavedGroup>) -> Result<(), StoreError> {
        match &mut self.staged {
            Some(staged) => {
                *staged = list;
                Ok(())
            }
            None => self.write(&list),
        }
    }

    fn write(&self, list: &[SavedGroup]) -> Result<(), StoreError> {
        let json = serde_json::to_string(list)?;
        self.kv.set(SAVED_LIST_KEY, &json)
    }

    /// Millisecond timestamp, bumped past every id already in use.
    fn next_id(&mut self, list: &[SavedGroup]) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let max_existing = list.iter().map(|g| g.id).max().unwrap_or(0);
        let id = now.max(self.last_id + 1).max(max_existing + 1);
        self.last_id = id;
        id
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// Display preferences, stored as `"enabled"`/`"disabled"` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub dark_mode: bool,
    /// Flash urgent arrivals.
    pub flash_enabled: bool,
    /// Attach route maps to bus cards.
    pub map_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: false,
            flash_enabled: true,
            map_enabled: false,
        }
    }
}

/// One stored preference flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    DarkMode,
    Flash,
    Map,
}

impl Preference {
    pub fn key(&self) -> &'static str {
        match self {
            Preference::DarkMode => "darkMode",
            Preference::Flash => "flashEnabled",
            Preference::Map => "mapEnabled",
        }
    }
}

impl Preferences {
    /// Read every flag; unset flags take their defaults.
    pub fn load(kv: &impl KeyValue) -> Result<Self, StoreError> {
        let defaults = Self::default();
        let flag = |pref: Preference, default: bool| -> Result<bool, StoreError> {
            Ok(match kv.get(pref.key())?.as_deref() {
                Some("enabled") => true,
                Some("disabled") => false,
                _ => default,
            })
        };
        Ok(Self {
            dark_mode: flag(Preference::DarkMode, defaults.dark_mode)?,
            flash_enabled: flag(Preference::Flash, defaults.flash_enabled)?,
            map_enabled: flag(Preference::Map, defaults.map_enabled)?,
        })
    }

    /// Store one flag.
    pub fn set(kv: &impl KeyValue, pref: Preference, enabled: bool) -> Result<(), StoreError> {
        kv.set(pref.key(), if enabled { "enabled" } else { "disabled" })
    }
}
