//! Arrival time normalization.
//!
//! Upstream feeds give absolute arrival timestamps. Cards never show those
//! directly: each poll converts them into a whole number of minutes
//! remaining, a Hong Kong clock label and an urgency flag. Departed
//! vehicles produce no label at all.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Hong_Kong;

/// Label shown instead of a number when a vehicle is due this minute.
pub const ARRIVING_LABEL: &str = "即將";

/// Unit suffix appended to every numeric minutes label, including 1.
pub const MINUTE_SUFFIX: &str = "分";

/// One predicted arrival, as delivered by an adapter.
///
/// Derived data: recomputed on every poll and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtaEntry {
    /// Absolute predicted arrival time.
    pub time: DateTime<Utc>,
    /// Optional annotation, e.g. destination and platform.
    pub note: Option<String>,
}

impl EtaEntry {
    /// An arrival without annotation.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { time, note: None }
    }

    /// An arrival with an annotation.
    pub fn with_note(time: DateTime<Utc>, note: impl Into<String>) -> Self {
        Self {
            time,
            note: Some(note.into()),
        }
    }
}

/// Display form of an arrival relative to "now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtaLabel {
    minutes: i64,
    clock: String,
}

impl EtaLabel {
    /// Whole minutes remaining (never negative).
    pub fn minutes(&self) -> i64 {
        self.minutes
    }

    /// Minutes label: the arriving token for 0, otherwise `"{m}分"`.
    pub fn minutes_label(&self) -> String {
        if self.minutes == 0 {
            ARRIVING_LABEL.to_string()
        } else {
            format!("{}{MINUTE_SUFFIX}", self.minutes)
        }
    }

    /// The numeric part of the label without its unit, or the arriving token.
    pub fn minutes_value(&self) -> String {
        if self.minutes == 0 {
            ARRIVING_LABEL.to_string()
        } else {
            self.minutes.to_string()
        }
    }

    /// Whether the label carries a unit suffix.
    pub fn has_unit(&self) -> bool {
        self.minutes != 0
    }

    /// 24-hour `HH:MM` in Hong Kong time.
    pub fn clock_label(&self) -> &str {
        &self.clock
    }

    /// Due within the next minute.
    pub fn is_urgent(&self) -> bool {
        self.minutes <= 1
    }
}

impl fmt::Display for EtaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.minutes_label())
    }
}

/// Normalize an absolute arrival time against `now`.
///
/// Returns `None` for vehicles that have already departed, i.e. when
/// `floor((eta - now) / 1 min)` is negative.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use eta_board::eta::normalize;
///
/// let now = Utc::now();
/// let label = normalize(now + Duration::seconds(90), now).unwrap();
/// assert_eq!(label.minutes_label(), "1分");
/// assert!(label.is_urgent());
///
/// assert!(normalize(now - Duration::seconds(1), now).is_none());
/// ```
pub fn normalize(eta: DateTime<Utc>, now: DateTime<Utc>) -> Option<EtaLabel> {
    let minutes = (eta - now).num_milliseconds().div_euclid(60_000);
    if minutes < 0 {
        return None;
    }
    Some(EtaLabel {
        minutes,
        clock: format_clock(eta),
    })
}

/// Format a timestamp as Hong Kong `HH:MM`.
pub fn format_clock(time: DateTime<Utc>) -> String {
    time.with_timezone(&Hong_Kong).format("%H:%M").to_string()
}

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339 (`2024-03-15T14:30:00+08:00`, used by the bus feeds)
/// and naive `YYYY-MM-DD HH:MM:SS` interpreted as Hong Kong local time
/// (used by the rail and NLB feeds). Empty strings yield `None`.
pub fn parse_upstream_time(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
    Hong_Kong
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 6, 30, 0).unwrap()
    }

    proptest! {
        /// Any timestamp strictly in the past yields no value.
        #[test]
        fn past_times_yield_nothing(ms_ago in 1i64..86_400_000) {
            let now = base();
            prop_assert!(normalize(now - Duration::milliseconds(ms_ago), now).is_none());
        }

        /// Anything inside the current minute is the arriving token.
        #[test]
        fn first_minute_is_arriving(ms_ahead in 0i64..60_000) {
            let now = base();
            let label = normalize(now + Duration::milliseconds(ms_ahead), now).unwrap();
            prop_assert_eq!(label.minutes_label(), ARRIVING_LABEL);
            prop_assert!(!label.has_unit());
        }

        /// Every whole minute from 1 upward carries the unit suffix.
        #[test]
        fn whole_minutes_carry_unit(m in 1i64..600, extra_ms in 0i64..60_000) {
            let now = base();
            let eta = now + Duration::minutes(m) + Duration::milliseconds(extra_ms);
            let label = normalize(eta, now).unwrap();
            prop_assert_eq!(label.minutes(), m);
            prop_assert_eq!(label.minutes_label(), format!("{m}{MINUTE_SUFFIX}"));
            prop_assert_eq!(label.is_urgent(), m <= 1);
        }
    }
}
