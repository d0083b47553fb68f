use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::Tz;

/// Source of "now" in the single configured observation zone.
///
/// In real mode the offset is zero. In test mode the offset is computed
/// exactly once at construction as `real_now_at_boot − virtual_start` and
/// never touched again, so virtual time advances at the real rate, just
/// shifted. `now()` is a pure function of wall time and this fixed state.
#[derive(Debug, Clone)]
pub struct Clock {
    tz: Tz,
    real: bool,
    /// Subtracted from every reading. Zero in real mode.
    offset: Duration,
}

impl Clock {
    pub fn real(tz: Tz) -> Self {
        Self {
            tz,
            real: true,
            offset: Duration::zero(),
        }
    }

    /// Test-mode clock whose first reading is today's date at
    /// `virtual_start`.
    pub fn test(tz: Tz, virtual_start: NaiveTime) -> Self {
        let real_now = Utc::now().with_timezone(&tz);
        let virtual_now = real_now.date_naive().and_time(virtual_start);
        let offset = real_now.naive_local() - virtual_now;
        Self {
            tz,
            real: false,
            offset,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_offset(tz: Tz, offset: Duration) -> Self {
        Self {
            tz,
            real: false,
            offset,
        }
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.tz) - self.offset
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn is_real(&self) -> bool {
        self.real
    }

    pub fn offset_ms(&self) -> i64 {
        self.offset.num_milliseconds()
    }
}
