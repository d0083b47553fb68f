//! Pure derivation of the day's [`TimeTable`] from a raw [`DayTimings`]
//! record, plus the "first future prayer" scan.

use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;

use minaret_core::config::ANNOUNCEMENT_LEAD_MINS;

use crate::types::{DayTimings, NextPrayer, Slot, SlotSchedule, TimeTable};

impl TimeTable {
    /// Split a day's record into start, iqamah and announcement times.
    /// Announcement = iqamah − 15 min, per slot, only where the slot is
    /// announcement-eligible. The lead is small and iqamah times are always
    /// well after 00:15, so no midnight wrap handling is needed.
    pub fn derive(timings: &DayTimings) -> Self {
        let build = |slot: Slot| {
            let t = timings.times(slot);
            SlotSchedule {
                start: t.start,
                iqamah: t.iqamah,
                announcement: slot
                    .announcement_eligible()
                    .then(|| t.iqamah - Duration::minutes(ANNOUNCEMENT_LEAD_MINS)),
            }
        };
        Self {
            fajr: build(Slot::Fajr),
            sunrise: build(Slot::Sunrise),
            zuhr: build(Slot::Zuhr),
            asr: build(Slot::Asr),
            maghrib: build(Slot::Maghrib),
            isha: build(Slot::Isha),
        }
    }

    /// First slot whose start time is strictly after `now`, scanning in
    /// canonical time-of-day order. `None` once every slot has passed.
    pub fn next_prayer(&self, now: NaiveTime) -> Option<(Slot, NaiveTime)> {
        Slot::IN_ORDER
            .iter()
            .map(|&slot| (slot, self.slot(slot).start))
            .find(|&(_, start)| start > now)
    }

    /// Build the cached next-prayer snapshot for a given clock reading.
    pub fn snapshot(&self, now: DateTime<Tz>) -> Option<NextPrayer> {
        let (slot, time) = self.next_prayer(now.time())?;
        Some(NextPrayer {
            slot,
            time,
            countdown_ms: (time - now.time()).num_milliseconds(),
        })
    }
}
