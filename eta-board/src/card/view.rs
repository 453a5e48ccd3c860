//! Render state of a card.
//!
//! A `CardView` is everything a surface needs to draw one card. It is
//! rebuilt after every fetch; row display modes (minutes or clock) carry
//! over from the previous view by row key.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::pin::PinState;
use crate::domain::RowKey;
use crate::eta::{EtaEntry, normalize};

/// Identifier of a live card, unique for the dashboard's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CardId(pub(crate) u64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

/// Header line of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHeader {
    pub icon: &'static str,
    pub title: String,
    pub subtitle: Option<String>,
    pub color: String,
}

/// One entry of the direction switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionTab {
    pub label: String,
    pub active: bool,
    /// Disabled tabs are shown but cannot be selected.
    pub enabled: bool,
}

/// The small status text in the card header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Loading,
    Updating,
    UpdatedAt(String),
    Failed,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLine::Loading => Ok(()),
            StatusLine::Updating => f.write_str("更新中..."),
            StatusLine::UpdatedAt(clock) => write!(f, "更新於 {clock}"),
            StatusLine::Failed => f.write_str("更新失敗"),
        }
    }
}

/// One arrival as displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtaChip {
    /// Number of minutes, or the arriving token.
    pub minutes: String,
    pub has_unit: bool,
    pub clock: String,
    pub urgent: bool,
    pub note: Option<String>,
}

impl EtaChip {
    /// Normalize an entry; departed entries give `None`.
    pub fn from_entry(entry: &EtaEntry, now: DateTime<Utc>) -> Option<Self> {
        let label = normalize(entry.time, now)?;
        Some(Self {
            minutes: label.minutes_value(),
            has_unit: label.has_unit(),
            clock: label.clock_label().to_string(),
            urgent: label.is_urgent(),
            note: entry.note.clone(),
        })
    }

    /// Minutes label with its unit, e.g. `"3分"` or `"即將"`.
    pub fn minutes_label(&self) -> String {
        if self.has_unit {
            format!("{}{}", self.minutes, crate::eta::MINUTE_SUFFIX)
        } else {
            self.minutes.clone()
        }
    }
}

/// One schedule row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub key: RowKey,
    /// Sequence number or display index.
    pub label: String,
    pub name: String,
    pub chips: Vec<EtaChip>,
    /// The row's fetch failed; distinct from an empty schedule.
    pub no_service: bool,
    pub marked: bool,
    pub hidden: bool,
    /// Show clock times instead of minutes.
    pub show_clock: bool,
}

/// Focus-view body: the nearest arrival large, the rest listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusView {
    pub main: Option<EtaChip>,
    pub rest: Vec<EtaChip>,
}

impl FocusView {
    /// Text under the main label: clock time and note, or the empty message.
    pub fn main_description(&self) -> String {
        match &self.main {
            Some(chip) => match &chip.note {
                Some(note) => format!("{} • {note}", chip.clock),
                None => chip.clock.clone(),
            },
            None => "目前沒有班次資料".to_string(),
        }
    }
}

/// Main content of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardBody {
    Loading(String),
    Rows(Vec<RowView>),
    /// Valid response without departures.
    Empty(String),
    Error(String),
    Focus(FocusView),
}

/// A stop drawn on the optional route map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStop {
    pub seq: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Route map attached to a bus card. Released on destroy and while a
/// row is filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOverlay {
    pub color: String,
    pub stops: Vec<MapStop>,
    /// Sequence of the marked stop, which the map centres on.
    pub highlighted: Option<u32>,
}

/// Everything a surface needs to draw a card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: CardId,
    pub header: CardHeader,
    pub directions: Vec<DirectionTab>,
    pub status: StatusLine,
    pub body: CardBody,
    pub map: Option<MapOverlay>,
    /// The card is playing its exit animation.
    pub exiting: bool,
}

impl CardView {
    /// A view showing the loading placeholder.
    pub fn loading(id: CardId, header: CardHeader, message: &str) -> Self {
        Self {
            id,
            header,
            directions: Vec::new(),
            status: StatusLine::Loading,
            body: CardBody::Loading(message.to_string()),
            map: None,
            exiting: false,
        }
    }

    /// Rows of the current body, if it has any.
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            CardBody::Rows(rows) => rows,
            _ => &[],
        }
    }

    /// Keys of rows currently showing clock times.
    pub fn clock_rows(&self) -> HashSet<RowKey> {
        self.rows()
            .iter()
            .filter(|r| r.show_clock)
            .map(|r| r.key.clone())
            .collect()
    }

    /// Recompute marked/hidden flags from a pin state.
    pub fn apply_pin(&mut self, pin: &PinState) {
        if let CardBody::Rows(rows) = &mut self.body {
            for row in rows {
                row.marked = pin.is_marked(&row.key);
                row.hidden = pin.is_hidden(&row.key);
            }
        }
    }

    /// Flip one row between minutes and clock display.
    pub fn toggle_clock(&mut self, key: &RowKey) -> bool {
        if let CardBody::Rows(rows) = &mut self.body
            && let Some(row) = rows.iter_mut().find(|r| &r.key == key)
        {
            row.show_clock = !row.show_clock;
            return true;
        }
        false
    }
}

/// Row content produced by a fetch, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RowData {
    pub key: RowKey,
    pub label: String,
    pub name: String,
    /// `None` when this row's upstream request failed.
    pub etas: Option<Vec<EtaEntry>>,
}

/// Normalize fetched rows into views.
///
/// Departed entries are dropped, at most `limit` chips are kept per row,
/// and rows listed in `clock_rows` keep their clock display.
pub fn build_rows(
    rows: Vec<RowData>,
    now: DateTime<Utc>,
    limit: Option<usize>,
    pin: &PinState,
    clock_rows: &HashSet<RowKey>,
) -> Vec<RowView> {
    rows.into_iter()
        .map(|row| {
            let no_service = row.etas.is_none();
            let chips = row
                .etas
                .unwrap_or_default()
                .iter()
                .filter_map(|e| EtaChip::from_entry(e, now))
                .take(limit.unwrap_or(usize::MAX))
                .collect();
            RowView {
                marked: pin.is_marked(&row.key),
                hidden: pin.is_hidden(&row.key),
                show_clock: clock_rows.contains(&row.key),
                key: row.key,
                label: row.label,
                name: row.name,
                chips,
                no_service,
            }
        })
        .collect()
}

/// Normalize focus-view arrivals.
pub fn build_focus(etas: &[EtaEntry], now: DateTime<Utc>) -> FocusView {
    let mut chips = etas.iter().filter_map(|e| EtaChip::from_entry(e, now));
    FocusView {
        main: chips.next(),
        rest: chips.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 6, 30, 0).unwrap()
    }

    fn row(seq: u32, offsets: &[i64]) -> RowData {
        RowData {
            key: RowKey::Seq(seq),
            label: seq.to_string(),
            name: format!("站{seq}"),
            etas: Some(
                offsets
                    .iter()
                    .map(|s| EtaEntry::new(now() + Duration::seconds(*s)))
                    .collect(),
            ),
        }
    }

    #[test]
    fn departed_dropped_and_limit_applied() {
        let rows = build_rows(
            vec![row(1, &[-30, 10, 120, 300, 600])],
            now(),
            Some(3),
            &PinState::None,
            &HashSet::new(),
        );
        let chips = &rows[0].chips;
        assert_eq!(chips.len(), 3);
        assert_eq!(chips[0].minutes_label(), "即將");
        assert!(chips[0].urgent);
        assert_eq!(chips[1].minutes_label(), "2分");
        assert!(!chips[1].urgent);
    }

    #[test]
    fn failed_row_is_no_service() {
        let rows = build_rows(
            vec![RowData {
                etas: None,
                ..row(1, &[])
            }],
            now(),
            None,
            &PinState::None,
            &HashSet::new(),
        );
        assert!(rows[0].no_service);
        assert!(rows[0].chips.is_empty());
    }

    #[test]
    fn clock_mode_survives_rebuild() {
        let pin = PinState::Filtered(RowKey::Seq(2));
        let first = build_rows(
            vec![row(1, &[60]), row(2, &[60])],
            now(),
            None,
            &pin,
            &HashSet::new(),
        );
        let mut view = CardView {
            body: CardBody::Rows(first),
            ..CardView::loading(
                CardId(1),
                CardHeader {
                    icon: "🚌",
                    title: "九巴 1".into(),
                    subtitle: None,
                    color: "#E3001B".into(),
                },
                "",
            )
        };
        assert!(view.rows()[0].hidden);
        assert!(view.rows()[1].marked);

        assert!(view.toggle_clock(&RowKey::Seq(2)));
        let rebuilt = build_rows(
            vec![row(1, &[60]), row(2, &[120])],
            now(),
            None,
            &pin,
            &view.clock_rows(),
        );
        assert!(!rebuilt[0].show_clock);
        assert!(rebuilt[1].show_clock);

        view.body = CardBody::Rows(rebuilt);
        view.apply_pin(&PinState::None);
        assert!(view.rows().iter().all(|r| !r.hidden && !r.marked));
    }

    #[test]
    fn focus_main_and_rest() {
        let etas = vec![
            EtaEntry::with_note(now() + Duration::seconds(90), "往 寶琳 (1號月台)"),
            EtaEntry::new(now() + Duration::seconds(400)),
        ];
        let focus = build_focus(&etas, now());
        let main = focus.main.as_ref().unwrap();
        assert_eq!(main.minutes_label(), "1分");
        assert_eq!(focus.rest.len(), 1);
        assert!(focus.main_description().ends_with("• 往 寶琳 (1號月台)"));

        let empty = build_focus(&[], now());
        assert_eq!(empty.main_description(), "目前沒有班次資料");
    }

    #[test]
    fn status_text() {
        assert_eq!(StatusLine::Updating.to_string(), "更新中...");
        assert_eq!(StatusLine::UpdatedAt("14:30".into()).to_string(), "更新於 14:30");
    }
}
