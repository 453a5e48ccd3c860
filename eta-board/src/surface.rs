//! Where card views are drawn.
//!
//! Cards push a fresh [`CardView`] after every state change. The binary
//! uses [`HtmlSurface`], which keeps the latest view of each card and
//! rewrites one HTML snapshot file through askama templates. The file is
//! written by a background task, so rendering never blocks on disk I/O.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use askama::Template;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::card::{CardBody, CardId, CardView, EtaChip, RowView};
use crate::store::Preferences;

/// Receives rendered card state.
pub trait Surface: Send + Sync + 'static {
    /// Draw or redraw one card.
    fn render(&self, view: &CardView);

    /// Remove a card after its exit animation.
    fn remove(&self, id: CardId);

    /// Show the placeholder for a dashboard without cards.
    fn show_empty(&self);

    /// Apply display preferences (theme, urgent flashing) to the page.
    fn apply_preferences(&self, prefs: &Preferences);
}

// ============================================================================
// Templates
// ============================================================================

/// Full dashboard page.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate<'a> {
    pub cards: Vec<CardTemplate<'a>>,
    pub dark_mode: bool,
    pub flash_enabled: bool,
}

/// Template view of one card.
pub struct CardTemplate<'a> {
    pub view: &'a CardView,
}

impl CardTemplate<'_> {
    pub fn dom_id(&self) -> String {
        self.view.id.to_string()
    }

    pub fn status(&self) -> String {
        self.view.status.to_string()
    }

    pub fn subtitle(&self) -> &str {
        self.view.header.subtitle.as_deref().unwrap_or_default()
    }

    /// Visible rows; filtered-out rows are not drawn.
    pub fn rows(&self) -> Vec<&RowView> {
        self.view.rows().iter().filter(|r| !r.hidden).collect()
    }

    pub fn has_placeholder(&self) -> bool {
        matches!(
            self.view.body,
            CardBody::Loading(_) | CardBody::Empty(_) | CardBody::Error(_)
        )
    }

    /// Text of the loading, empty or error placeholder.
    pub fn placeholder(&self) -> &str {
        match &self.view.body {
            CardBody::Loading(m) | CardBody::Empty(m) | CardBody::Error(m) => m,
            CardBody::Rows(_) | CardBody::Focus(_) => "",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.view.body, CardBody::Error(_))
    }

    pub fn is_focus(&self) -> bool {
        matches!(self.view.body, CardBody::Focus(_))
    }

    /// Large label of the focus view.
    pub fn focus_main(&self) -> String {
        match &self.view.body {
            CardBody::Focus(focus) => focus
                .main
                .as_ref()
                .map(EtaChip::minutes_label)
                .unwrap_or_else(|| "暫無".to_string()),
            _ => String::new(),
        }
    }

    pub fn focus_description(&self) -> String {
        match &self.view.body {
            CardBody::Focus(focus) => focus.main_description(),
            _ => String::new(),
        }
    }

    pub fn focus_rest(&self) -> Vec<&EtaChip> {
        match &self.view.body {
            CardBody::Focus(focus) => focus.rest.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn has_map(&self) -> bool {
        self.view.map.is_some()
    }

    /// One-line description of the attached route map.
    pub fn map_summary(&self) -> String {
        match &self.view.map {
            Some(map) => match map.highlighted {
                Some(seq) => format!("路線圖 {} 個車站 • 標記第 {seq} 站", map.stops.len()),
                None => format!("路線圖 {} 個車站", map.stops.len()),
            },
            None => String::new(),
        }
    }
}

// ============================================================================
// HTML snapshot surface
// ============================================================================

#[derive(Default)]
struct Snapshot {
    views: BTreeMap<CardId, CardView>,
    prefs: Preferences,
}

/// A rendered page, numbered so writers can report how far they got.
#[derive(Default)]
struct Page {
    seq: u64,
    html: String,
}

/// Renders every live card into one HTML file.
pub struct HtmlSurface {
    snapshot: Mutex<Snapshot>,
    pages: watch::Sender<Page>,
    written: watch::Receiver<u64>,
}

impl HtmlSurface {
    /// Create the surface and spawn its file writer.
    ///
    /// Must be called from within a tokio runtime. Only the newest page is
    /// written when renders arrive faster than the disk keeps up.
    pub fn spawn(path: impl Into<PathBuf>) -> Arc<Self> {
        let path = path.into();
        let (pages, mut page_rx) = watch::channel(Page::default());
        let (written_tx, written) = watch::channel(0);

        tokio::spawn(async move {
            while page_rx.changed().await.is_ok() {
                let (seq, html) = {
                    let page = page_rx.borrow_and_update();
                    (page.seq, page.html.clone())
                };
                if let Err(e) = tokio::fs::write(&path, html).await {
                    warn!(path = %path.display(), error = %e, "Failed to write dashboard");
                }
                written_tx.send_replace(seq);
            }
            debug!("Dashboard writer stopped");
        });

        Arc::new(Self {
            snapshot: Mutex::new(Snapshot::default()),
            pages,
            written,
        })
    }

    /// Render the current page to a string.
    pub fn render_page(&self) -> Result<String, askama::Error> {
        render_snapshot(&self.lock())
    }

    /// Wait until every page rendered so far has reached the file.
    pub async fn flushed(&self) {
        let target = self.pages.borrow().seq;
        let mut written = self.written.clone();
        // An error means the writer is gone and nothing more will land.
        let _ = written.wait_for(|seq| *seq >= target).await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: &Snapshot) {
        let html = match render_snapshot(snapshot) {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Failed to render dashboard");
                return;
            }
        };
        self.pages.send_modify(|page| {
            page.seq += 1;
            page.html = html;
        });
    }
}

fn render_snapshot(snapshot: &Snapshot) -> Result<String, askama::Error> {
    DashboardTemplate {
        cards: snapshot
            .views
            .values()
            .map(|view| CardTemplate { view })
            .collect(),
        dark_mode: snapshot.prefs.dark_mode,
        flash_enabled: snapshot.prefs.flash_enabled,
    }
    .render()
}

impl Surface for HtmlSurface {
    fn render(&self, view: &CardView) {
        let mut snapshot = self.lock();
        snapshot.views.insert(view.id, view.clone());
        self.publish(&snapshot);
    }

    fn remove(&self, id: CardId) {
        let mut snapshot = self.lock();
        snapshot.views.remove(&id);
        self.publish(&snapshot);
    }

    fn show_empty(&self) {
        debug!("Dashboard is empty");
        let snapshot = self.lock();
        self.publish(&snapshot);
    }

    fn apply_preferences(&self, prefs: &Preferences) {
        let mut snapshot = self.lock();
        snapshot.prefs = *prefs;
        self.publish(&snapshot);
    }
}

// ============================================================================
// Recording surface for tests
// ============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardHeader, StatusLine};
    use crate::domain::RowKey;

    fn view(id: u64, body: CardBody) -> CardView {
        CardView {
            body,
            status: StatusLine::UpdatedAt("14:30".into()),
            ..CardView::loading(
                CardId(id),
                CardHeader {
                    icon: "🚈",
                    title: "輕鐵 505".into(),
                    subtitle: Some("往 三聖".into()),
                    color: "#D3A809".into(),
                },
                "",
            )
        }
    }

    fn row(key: u32, hidden: bool, show_clock: bool) -> RowView {
        RowView {
            key: RowKey::Seq(key),
            label: key.to_string(),
            name: format!("站{key}"),
            chips: vec![EtaChip {
                minutes: "3".into(),
                has_unit: true,
                clock: "14:33".into(),
                urgent: false,
                note: None,
            }],
            no_service: false,
            marked: false,
            hidden,
            show_clock,
        }
    }

    #[tokio::test]
    async fn writes_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.html");
        let surface = HtmlSurface::spawn(&path);

        surface.render(&view(1, CardBody::Rows(vec![row(1, false, false), row(2, true, false)])));
        surface.flushed().await;
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("card-1"));
        assert!(html.contains("輕鐵 505"));
        assert!(html.contains("更新於 14:30"));
        assert!(html.contains("站1"));
        assert!(!html.contains("站2"));

        surface.remove(CardId(1));
        surface.flushed().await;
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(!html.contains("card-1"));
    }

    #[tokio::test]
    async fn render_returns_before_the_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.html");
        let surface = HtmlSurface::spawn(&path);

        // The writer only runs once this task yields.
        surface.render(&view(1, CardBody::Rows(vec![row(1, false, false)])));
        surface.render(&view(2, CardBody::Rows(vec![row(2, false, false)])));
        assert!(!path.exists());

        surface.flushed().await;
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("card-1"));
        assert!(html.contains("card-2"));
    }

    #[tokio::test]
    async fn renders_error_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let surface = HtmlSurface::spawn(dir.path().join("board.html"));
        surface.render(&view(2, CardBody::Error("輕鐵資料載入失敗".into())));
        let html = surface.render_page().unwrap();
        assert!(html.contains("輕鐵資料載入失敗"));
    }

    #[tokio::test]
    async fn clock_mode_rows_show_clock_times() {
        let dir = tempfile::tempdir().unwrap();
        let surface = HtmlSurface::spawn(dir.path().join("board.html"));
        surface.render(&view(3, CardBody::Rows(vec![row(1, false, true)])));
        let html = surface.render_page().unwrap();
        assert!(html.contains("14:33"));
        assert!(!html.contains("3分"));
    }

    #[tokio::test]
    async fn empty_dashboard_shows_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.html");
        let surface = HtmlSurface::spawn(&path);
        surface.show_empty();
        surface.flushed().await;
        assert!(std::fs::read_to_string(&path).unwrap().contains("尚未加入任何路線"));
    }

    #[tokio::test]
    async fn preferences_set_page_classes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.html");
        let surface = HtmlSurface::spawn(&path);
        surface.render(&view(1, CardBody::Rows(vec![row(1, false, false)])));

        let html = surface.render_page().unwrap();
        assert!(!html.contains("class=\"dark"));
        assert!(!html.contains("disable-flash"));

        surface.apply_preferences(&Preferences {
            dark_mode: true,
            flash_enabled: false,
            map_enabled: false,
        });
        surface.flushed().await;
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<body class=\"dark disable-flash\">"));
        assert!(html.contains("card-1"));
    }
}
