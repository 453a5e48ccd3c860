//! Real-time arrival dashboard for Hong Kong public transport.
//!
//! Buses (KMB, Citybus, NLB), MTR heavy rail and light rail are shown as
//! independently polling cards. Each card fetches its upstream feed,
//! normalizes arrivals into minutes and clock labels, and re-arms its own
//! timer after every fetch.

pub mod card;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod domain;
pub mod eta;
pub mod focus;
pub mod store;
pub mod surface;
pub mod upstream;
