use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// One of the six named prayer events in a day.
///
/// The variant order is the canonical time-of-day order; every iteration
/// over slots must go through [`Slot::IN_ORDER`] so "first future prayer"
/// questions are answered correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Fajr,
    Sunrise,
    Zuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Slot {
    /// Canonical time-of-day order.
    pub const IN_ORDER: [Slot; 6] = [
        Slot::Fajr,
        Slot::Sunrise,
        Slot::Zuhr,
        Slot::Asr,
        Slot::Maghrib,
        Slot::Isha,
    ];

    /// Sunrise is not a prayer; no azan is ever called for it.
    pub fn azan_eligible(self) -> bool {
        !matches!(self, Slot::Sunrise)
    }

    /// Announcements are skipped for fajr (congregation is minimal at that
    /// hour) as well as sunrise.
    pub fn announcement_eligible(self) -> bool {
        !matches!(self, Slot::Fajr | Slot::Sunrise)
    }

    pub fn name(self) -> &'static str {
        match self {
            Slot::Fajr => "fajr",
            Slot::Sunrise => "sunrise",
            Slot::Zuhr => "zuhr",
            Slot::Asr => "asr",
            Slot::Maghrib => "maghrib",
            Slot::Isha => "isha",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "fajr" => Ok(Slot::Fajr),
            "sunrise" => Ok(Slot::Sunrise),
            "zuhr" => Ok(Slot::Zuhr),
            "asr" => Ok(Slot::Asr),
            "maghrib" => Ok(Slot::Maghrib),
            "isha" => Ok(Slot::Isha),
            other => Err(format!("unknown slot: {other}")),
        }
    }
}

/// What an armed trigger does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Azan,
    Announcement,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::Azan => write!(f, "azan"),
            TriggerKind::Announcement => write!(f, "announcement"),
        }
    }
}

/// Raw start/iqamah pair for one slot, as fetched. Sunrise carries the same
/// value in both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimes {
    pub start: NaiveTime,
    pub iqamah: NaiveTime,
}

/// One calendar day's record from the timings provider. Superseded whole by
/// the next day's fetch, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTimings {
    pub day: u32,
    pub month: u32,
    pub fajr: SlotTimes,
    pub sunrise: SlotTimes,
    pub zuhr: SlotTimes,
    pub asr: SlotTimes,
    pub maghrib: SlotTimes,
    pub isha: SlotTimes,
}

impl DayTimings {
    pub fn times(&self, slot: Slot) -> &SlotTimes {
        match slot {
            Slot::Fajr => &self.fajr,
            Slot::Sunrise => &self.sunrise,
            Slot::Zuhr => &self.zuhr,
            Slot::Asr => &self.asr,
            Slot::Maghrib => &self.maghrib,
            Slot::Isha => &self.isha,
        }
    }
}

/// Derived per-slot schedule: start and iqamah from the raw record plus the
/// announcement time (iqamah minus the fixed lead) where the slot is
/// announcement-eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotSchedule {
    pub start: NaiveTime,
    pub iqamah: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<NaiveTime>,
}

/// The day's derived schedule, owned by the engine and replaced wholesale
/// each cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeTable {
    pub fajr: SlotSchedule,
    pub sunrise: SlotSchedule,
    pub zuhr: SlotSchedule,
    pub asr: SlotSchedule,
    pub maghrib: SlotSchedule,
    pub isha: SlotSchedule,
}

impl TimeTable {
    pub fn slot(&self, slot: Slot) -> &SlotSchedule {
        match slot {
            Slot::Fajr => &self.fajr,
            Slot::Sunrise => &self.sunrise,
            Slot::Zuhr => &self.zuhr,
            Slot::Asr => &self.asr,
            Slot::Maghrib => &self.maghrib,
            Slot::Isha => &self.isha,
        }
    }
}

/// Cached "what's next" snapshot. Always recomputable from TimeTable +
/// Clock; a read optimisation, never a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextPrayer {
    pub slot: Slot,
    /// Start time-of-day in the observation zone.
    pub time: NaiveTime,
    /// Milliseconds from the clock reading that produced this snapshot.
    pub countdown_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_order_is_time_of_day_order() {
        assert_eq!(
            Slot::IN_ORDER,
            [
                Slot::Fajr,
                Slot::Sunrise,
                Slot::Zuhr,
                Slot::Asr,
                Slot::Maghrib,
                Slot::Isha
            ]
        );
    }

    #[test]
    fn sunrise_gets_no_azan() {
        assert!(!Slot::Sunrise.azan_eligible());
        for slot in Slot::IN_ORDER {
            if slot != Slot::Sunrise {
                assert!(slot.azan_eligible(), "{slot} should be azan-eligible");
            }
        }
    }

    #[test]
    fn fajr_and_sunrise_get_no_announcement() {
        assert!(!Slot::Fajr.announcement_eligible());
        assert!(!Slot::Sunrise.announcement_eligible());
        for slot in [Slot::Zuhr, Slot::Asr, Slot::Maghrib, Slot::Isha] {
            assert!(slot.announcement_eligible());
        }
    }

    #[test]
    fn slot_round_trips_through_strings() {
        for slot in Slot::IN_ORDER {
            assert_eq!(slot.name().parse::<Slot>().unwrap(), slot);
        }
        assert!("dhuhr".parse::<Slot>().is_err());
    }
}
