//! Dashboard cards.
//!
//! A card is one transit view (bus route, rail station, rail line,
//! light-rail line or a single-stop focus view) with its own poll loop.
//! The variants share one lifecycle and differ only in how they fetch.

mod config;
mod kind;
mod lifecycle;
mod pin;
mod view;

pub use config::CardConfig;
pub use kind::{
    Board, CardKind, FetchOutcome, FetchRequest, LOADING_MESSAGE, NO_SCHEDULE_MESSAGE,
    NO_STOPS_MESSAGE,
};
pub use lifecycle::{Card, CardContext, Phase};
pub use pin::PinState;
pub use view::{
    CardBody, CardHeader, CardId, CardView, DirectionTab, EtaChip, FocusView, MapOverlay, MapStop,
    RowData, RowView, StatusLine, build_focus, build_rows,
};
