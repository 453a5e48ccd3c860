//! Per-card polling task.
//!
//! Each card owns one spawned task running fetch, render, wait, repeat.
//! The wait is a single-shot deadline re-armed after each fetch completes,
//! so a slow upstream delays the next poll instead of overlapping it.
//! All state lives behind one lock; nothing awaits while holding it, so
//! each user action is atomic with respect to the poll loop.
//!
//! A destroyed card cancels its task through a watch channel. An upstream
//! call already in flight is not aborted: its result is dropped when it
//! returns. A direction switch bumps a generation counter so that a result
//! fetched for the old direction is discarded and refetched.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::CardConfig;
use super::kind::{Board, CardKind, FetchOutcome, FetchRequest, LOADING_MESSAGE};
use super::pin::PinState;
use super::view::{CardBody, CardId, CardView, StatusLine, build_focus, build_rows};
use crate::config::DashboardConfig;
use crate::directory::Directory;
use crate::domain::{Direction, RowKey};
use crate::eta::format_clock;
use crate::focus::FocusQuery;
use crate::surface::Surface;
use crate::upstream::{BusBoundaries, ErrorKind, HttpFetch, Upstream};

/// Shared, read-mostly state every card polls through.
pub struct CardContext<F> {
    pub upstream: Upstream<F>,
    pub directory: Directory,
    pub config: DashboardConfig,
    map_enabled: AtomicBool,
}

impl<F: HttpFetch> CardContext<F> {
    pub fn new(upstream: Upstream<F>, directory: Directory, config: DashboardConfig) -> Self {
        Self {
            upstream,
            directory,
            config,
            map_enabled: AtomicBool::new(false),
        }
    }

    /// Whether bus cards attach a route map.
    pub fn map_enabled(&self) -> bool {
        self.map_enabled.load(Ordering::Relaxed)
    }

    pub fn set_map_enabled(&self, enabled: bool) {
        self.map_enabled.store(enabled, Ordering::Relaxed);
    }
}

/// Lifecycle phase of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Created,
    Fetching,
    Idle,
    /// Terminal.
    Destroyed,
}

struct CardState {
    phase: Phase,
    in_flight: bool,
    /// Bumped by direction switches; results of older generations are stale.
    generation: u64,
    kind: CardKind,
    pin: PinState,
    boundaries: Option<Arc<BusBoundaries>>,
    view: CardView,
    last_updated: Option<DateTime<Utc>>,
    next_poll: Option<Instant>,
}

impl CardState {
    fn request(&self) -> (u64, FetchRequest) {
        (
            self.generation,
            FetchRequest::new(self.kind.clone(), self.boundaries.clone()),
        )
    }
}

enum Completion {
    Applied,
    Stale,
    Destroyed,
}

/// One live card.
pub struct Card<F> {
    id: CardId,
    ctx: Arc<CardContext<F>>,
    surface: Arc<dyn Surface>,
    interval: Duration,
    state: Mutex<CardState>,
    wake: Notify,
    cancel: watch::Sender<bool>,
}

impl<F: HttpFetch> Card<F> {
    /// Create a card in the `Created` phase. Nothing is fetched until
    /// [`Card::init`].
    pub fn new(
        id: CardId,
        kind: CardKind,
        pin: PinState,
        ctx: Arc<CardContext<F>>,
        surface: Arc<dyn Surface>,
    ) -> Arc<Self> {
        let interval = if kind.is_focus() {
            ctx.config.focus_poll_interval
        } else {
            ctx.config.poll_interval
        };
        let view = CardView::loading(id, kind.header(), LOADING_MESSAGE);
        let (cancel, _) = watch::channel(false);
        Arc::new(Self {
            id,
            ctx,
            surface,
            interval,
            state: Mutex::new(CardState {
                phase: Phase::Created,
                in_flight: false,
                generation: 0,
                kind,
                pin,
                boundaries: None,
                view,
                last_updated: None,
                next_poll: None,
            }),
            wake: Notify::new(),
            cancel,
        })
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    /// Render the loading placeholder and start polling.
    ///
    /// The first fetch is claimed before the task is spawned, so a manual
    /// refresh issued right after `init` is already a no-op.
    pub async fn init(self: &Arc<Self>) {
        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            if state.phase != Phase::Created {
                return;
            }
            state.phase = Phase::Fetching;
            state.in_flight = true;
            self.render(state);
        }
        debug!(card = %self.id, "Card started");
        tokio::spawn(Arc::clone(self).run());
    }

    async fn run(self: Arc<Self>) {
        let mut cancel = self.cancel.subscribe();
        let mut next = self.snapshot().await;

        while let Some((generation, request)) = next {
            let outcome = request
                .execute(&self.ctx.upstream, &self.ctx.directory, Utc::now())
                .await;

            next = match self.complete_fetch(generation, outcome).await {
                Completion::Destroyed => None,
                Completion::Stale => self.snapshot().await,
                Completion::Applied => {
                    let Some(deadline) = self.arm_timer().await else {
                        break;
                    };
                    tokio::select! {
                        _ = tokio::time::sleep_until(deadline) => {}
                        _ = self.wake.notified() => {}
                        _ = cancel.changed() => break,
                    }
                    self.try_begin_fetch().await
                }
            };
        }
        debug!(card = %self.id, "Card task finished");
    }

    /// The pending request, unless destroyed.
    async fn snapshot(&self) -> Option<(u64, FetchRequest)> {
        let state = self.state.lock().await;
        (state.phase != Phase::Destroyed).then(|| state.request())
    }

    async fn try_begin_fetch(&self) -> Option<(u64, FetchRequest)> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.phase == Phase::Destroyed {
            return None;
        }
        state.next_poll = None;
        state.in_flight = true;
        state.phase = Phase::Fetching;
        state.view.status = StatusLine::Updating;
        self.render(state);
        Some(state.request())
    }

    async fn complete_fetch(&self, generation: u64, outcome: FetchOutcome) -> Completion {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.phase == Phase::Destroyed {
            debug!(card = %self.id, "Discarding result for destroyed card");
            return Completion::Destroyed;
        }
        if let Some(boundaries) = outcome.boundaries {
            state.kind.learn_boundaries(&boundaries);
            state.boundaries = Some(boundaries);
        }
        if generation != state.generation {
            debug!(card = %self.id, generation, current = state.generation, "Discarding stale result");
            return Completion::Stale;
        }

        state.in_flight = false;
        state.phase = Phase::Idle;
        let now = Utc::now();
        match outcome.result {
            Ok(board) => {
                state.last_updated = Some(now);
                state.view.status = StatusLine::UpdatedAt(format_clock(now));
                state.view.body = self.body_for(state, board, outcome.fetched_at);
            }
            Err(e) => {
                if e.kind() == ErrorKind::NoData {
                    debug!(card = %self.id, error = %e, "No schedule");
                    state.view.status = StatusLine::UpdatedAt(format_clock(now));
                } else {
                    warn!(card = %self.id, error = %e, "Fetch failed");
                    state.view.status = StatusLine::Failed;
                }
                state.view.body = state.kind.error_body(&e);
            }
        }
        self.render(state);
        Completion::Applied
    }

    fn body_for(&self, state: &CardState, board: Board, now: DateTime<Utc>) -> CardBody {
        match board {
            Board::Rows(rows) => CardBody::Rows(build_rows(
                rows,
                now,
                state.kind.chip_limit(self.ctx.config.bus_eta_limit),
                &state.pin,
                &state.view.clock_rows(),
            )),
            Board::Empty(message) | Board::Message(message) => CardBody::Empty(message),
            Board::Focus(etas) => CardBody::Focus(build_focus(&etas, now)),
        }
    }

    async fn arm_timer(&self) -> Option<Instant> {
        let mut state = self.state.lock().await;
        if state.phase == Phase::Destroyed {
            state.next_poll = None;
            return None;
        }
        let deadline = Instant::now() + self.interval;
        state.next_poll = Some(deadline);
        Some(deadline)
    }

    /// Refresh derived view parts and hand the view to the surface.
    fn render(&self, state: &mut CardState) {
        state.view.header = state.kind.header();
        state.view.directions = state.kind.directions(state.boundaries.as_deref());
        state.view.map = if state.phase != Phase::Destroyed && self.ctx.map_enabled() {
            state
                .kind
                .map_overlay(state.boundaries.as_deref(), &state.pin)
        } else {
            None
        };
        self.surface.render(&state.view);
    }

    /// Fetch now, unless a fetch is already running or the card is gone.
    ///
    /// Returns whether a fetch was triggered.
    pub async fn manual_refresh(&self) -> bool {
        let state = self.state.lock().await;
        if state.phase == Phase::Destroyed || state.in_flight {
            return false;
        }
        self.wake.notify_one();
        true
    }

    /// Change direction, clearing the pin and refetching.
    pub async fn switch_dir(&self, dir: Direction) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.phase == Phase::Destroyed {
            return false;
        }
        if !state.kind.switch_dir(dir, state.boundaries.as_deref()) {
            return false;
        }
        state.pin = PinState::None;
        state.generation += 1;
        state.view.body = CardBody::Loading(LOADING_MESSAGE.to_string());
        self.render(state);
        if !state.in_flight {
            self.wake.notify_one();
        }
        info!(card = %self.id, ?dir, "Direction switched");
        true
    }

    /// Apply one pin action to a row.
    pub async fn pin(&self, key: &RowKey) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.phase == Phase::Destroyed {
            return false;
        }
        state.pin = state.pin.toggle(key);
        state.view.apply_pin(&state.pin);
        self.render(state);
        true
    }

    /// Flip a row between minutes and clock display.
    pub async fn toggle_mode(&self, key: &RowKey) -> bool {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.phase == Phase::Destroyed || !state.view.toggle_clock(key) {
            return false;
        }
        self.render(state);
        true
    }

    /// Redraw without fetching, e.g. after a preference change.
    pub async fn rerender(&self) {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        if state.phase != Phase::Destroyed {
            self.render(state);
        }
    }

    /// Stop polling and play the exit animation. Idempotent.
    ///
    /// Returns `false` if the card was already destroyed.
    pub async fn destroy(&self) -> bool {
        {
            let mut guard = self.state.lock().await;
            let state = &mut *guard;
            if state.phase == Phase::Destroyed {
                return false;
            }
            state.phase = Phase::Destroyed;
            state.next_poll = None;
            state.view.exiting = true;
            self.render(state);
        }
        self.cancel.send_replace(true);
        debug!(card = %self.id, "Card destroyed");
        true
    }

    /// Saved form, or `None` for focus views.
    pub async fn config(&self) -> Option<CardConfig> {
        let state = self.state.lock().await;
        state.kind.config(&state.pin)
    }

    /// Focus navigation for one of this card's rows.
    pub async fn focus_query(&self, key: &RowKey) -> Option<FocusQuery> {
        let state = self.state.lock().await;
        state.kind.focus_query(key, state.boundaries.as_deref())
    }

    pub async fn view(&self) -> CardView {
        self.state.lock().await.view.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    pub async fn pin_state(&self) -> PinState {
        self.state.lock().await.pin.clone()
    }

    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_updated
    }

    /// When the next poll is due; `None` while fetching or once destroyed.
    pub async fn next_poll(&self) -> Option<Instant> {
        self.state.lock().await.next_poll
    }
}
