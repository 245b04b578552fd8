//! Ranking windows and their reset grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const HOUR_MS: i64 = 60 * 60 * 1000;
const DAY_MS: i64 = 24 * HOUR_MS;

/// A ranking mode for a board.
///
/// `AllTime` ranks by the raw metric. Every other window ranks by the delta
/// accumulated since its last reset, and resets on a fixed period aligned to
/// the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    AllTime,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl TimeWindow {
    /// Every window, all-time first.
    pub const ALL: [TimeWindow; 6] = [
        Self::AllTime,
        Self::Hourly,
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Yearly,
    ];

    /// The windows that keep delta/reset state, in column order.
    pub const ROLLING: [TimeWindow; 5] = [
        Self::Hourly,
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Yearly,
    ];

    /// Lowercase name, also the stem of the window's column names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllTime => "alltime",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Whether this window keeps delta/reset state.
    pub fn is_rolling(&self) -> bool {
        !matches!(self, Self::AllTime)
    }

    /// Reset period in milliseconds, `None` for all-time.
    pub fn reset_period_ms(&self) -> Option<i64> {
        match self {
            Self::AllTime => None,
            Self::Hourly => Some(HOUR_MS),
            Self::Daily => Some(DAY_MS),
            Self::Weekly => Some(7 * DAY_MS),
            Self::Monthly => Some(30 * DAY_MS),
            Self::Yearly => Some(365 * DAY_MS),
        }
    }

    /// The most recent grid line at or before `now_ms`.
    ///
    /// The grid is `k * period` for integer `k`, so two calls within the same
    /// period return the same anchor no matter how late either one runs.
    /// Returns `None` for all-time.
    pub fn anchor_for(&self, now_ms: i64) -> Option<i64> {
        self.reset_period_ms()
            .map(|period| now_ms.div_euclid(period) * period)
    }

    /// Column holding the ranking key for this window.
    pub fn ranking_column(&self) -> String {
        match self {
            Self::AllTime => "value".to_string(),
            _ => self.delta_column(),
        }
    }

    pub fn delta_column(&self) -> String {
        format!("{}_delta", self.as_str())
    }

    pub fn last_total_column(&self) -> String {
        format!("{}_lasttotal", self.as_str())
    }

    pub fn timestamp_column(&self) -> String {
        format!("{}_timestamp", self.as_str())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|w| w.as_str() == lower)
            .ok_or_else(|| crate::Error::UnknownWindow(s.to_string()))
    }
}
