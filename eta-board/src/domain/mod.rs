//! Domain types for the arrival dashboard.
//!
//! This module contains the validated identifiers and records shared by
//! the upstream adapters, the directory and the cards. Types enforce
//! their invariants at construction time.

mod direction;
mod operator;
mod row_key;
mod station;
mod stop;

pub use direction::{BusDirection, Direction, RailDirection};
pub use operator::{BusOperator, InvalidOperator};
pub use row_key::RowKey;
pub use station::{InvalidStationCode, StationCode};
pub use stop::{StopInfo, StopRecord, UNKNOWN_STOP_NAME, clean_name};
