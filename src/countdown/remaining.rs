use std::fmt;

use chrono::{DateTime, Utc};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60_000;
const MS_PER_HOUR: i64 = 3_600_000;
const MS_PER_DAY: i64 = 86_400_000;

/// Time left until a listing closes, as displayed on a card.
///
/// Every field is zero-padded to at least two digits. Recomputed from the
/// absolute clock each tick, never accumulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemainingTime {
    pub days: String,
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub has_ended: bool,
    remaining_ms: i64,
}

impl RemainingTime {
    /// All-zero value for a closed listing.
    pub fn ended() -> Self {
        Self {
            days: pad(0),
            hours: pad(0),
            minutes: pad(0),
            seconds: pad(0),
            has_ended: true,
            remaining_ms: 0,
        }
    }

    /// Milliseconds left, 0 once ended.
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_ended {
            return write!(f, "ended");
        }
        write!(
            f,
            "{}d {}h {}m {}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

fn pad(value: i64) -> String {
    format!("{:02}", value)
}

/// Remaining time from `now` until `ending_at`.
pub fn tick(now: DateTime<Utc>, ending_at: DateTime<Utc>) -> RemainingTime {
    let delta = (ending_at - now).num_milliseconds();
    if delta <= 0 {
        return RemainingTime::ended();
    }

    RemainingTime {
        days: pad(delta / MS_PER_DAY),
        hours: pad((delta / MS_PER_HOUR) % 24),
        minutes: pad((delta / MS_PER_MINUTE) % 60),
        seconds: pad((delta / MS_PER_SECOND) % 60),
        has_ended: false,
        remaining_ms: delta,
    }
}
