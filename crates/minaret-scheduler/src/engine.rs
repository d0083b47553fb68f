//! The daily scheduling engine: fetch, derive, arm, rearm at midnight.

use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Duration, NaiveTime, TimeZone};
use chrono_tz::Tz;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::FetchError;
use crate::fetch::TimingsFetcher;
use crate::notify::Notify;
use crate::types::{NextPrayer, Slot, TimeTable, TriggerKind};

/// Shared scheduler state. Always swapped as a whole under the lock so
/// readers see one consistent snapshot, never a half-updated mix of days.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub timetable: Option<TimeTable>,
    pub next_prayer: Option<NextPrayer>,
}

/// One armed one-shot trigger; `handle` aborts the backing tokio task.
struct ScheduledTrigger {
    kind: TriggerKind,
    slot: Slot,
    fire_at: DateTime<Tz>,
    handle: AbortHandle,
}

/// A trigger the planner decided to arm — pure data, no task yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlannedTrigger {
    kind: TriggerKind,
    slot: Slot,
    fire_at: DateTime<Tz>,
}

/// Core scheduler: one self-perpetuating cycle per day.
///
/// Cycle: fetch today's record → derive the timetable → swap shared state →
/// arm one tokio timer per eligible trigger → sleep until local midnight →
/// repeat. A failed fetch arms nothing and simply waits for the next
/// midnight; the midnight rearm is the single self-healing mechanism.
pub struct ScheduleEngine {
    clock: Clock,
    fetcher: TimingsFetcher,
    notifier: Arc<dyn Notify>,
    state: RwLock<SchedulerState>,
    /// Day-scoped trigger registry. Cancel-then-arm always happens with
    /// this lock held, which serialises concurrent reschedules.
    triggers: Mutex<Vec<ScheduledTrigger>>,
}

impl ScheduleEngine {
    pub fn new(clock: Clock, fetcher: TimingsFetcher, notifier: Arc<dyn Notify>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            fetcher,
            notifier,
            state: RwLock::new(SchedulerState::default()),
            triggers: Mutex::new(Vec::new()),
        })
    }

    /// Perpetual daily loop. The sleep-to-midnight arm is the midnight
    /// rearm trigger: exactly one per cycle, cancelled only by shutdown.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("schedule engine started");
        loop {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "daily cycle not armed");
            }
            let wait = until_next_midnight(self.clock.now());
            info!(rearm_in_secs = wait.as_secs(), "midnight rearm scheduled");
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    // Prayer times all precede midnight, so this is
                    // normally a no-op.
                    self.cancel_outstanding();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("schedule engine shutting down");
                        self.cancel_outstanding();
                        break;
                    }
                }
            }
        }
    }

    /// Fetch → derive → install → arm. Any `FetchError` aborts the cycle
    /// without touching the previous day's (already spent) state.
    async fn run_cycle(&self) -> Result<(), FetchError> {
        let timings = self.fetcher.fetch_today().await?;
        let table = TimeTable::derive(&timings);
        self.install(table.clone());
        self.arm_day(&table);
        Ok(())
    }

    /// Atomically replace the shared state with a fresh day.
    fn install(&self, table: TimeTable) {
        let next = table.snapshot(self.clock.now());
        let mut st = self.state.write().unwrap();
        *st = SchedulerState {
            timetable: Some(table),
            next_prayer: next,
        };
    }

    /// Cancel whatever is armed, then arm today's eligible triggers from
    /// `table` — a single critical section over the registry.
    fn arm_day(&self, table: &TimeTable) {
        let now = self.clock.now();
        let plan = plan_triggers(table, now);

        let mut registry = self.triggers.lock().unwrap();
        for old in registry.drain(..) {
            old.handle.abort();
            debug!(kind = %old.kind, slot = %old.slot, fire_at = %old.fire_at, "trigger cancelled");
        }
        for p in plan {
            let delay = (p.fire_at - now).to_std().unwrap_or_default();
            let notifier = Arc::clone(&self.notifier);
            let (kind, slot) = (p.kind, p.slot);
            let task = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                notifier.dispatch(kind, slot).await;
            });
            info!(kind = %p.kind, slot = %p.slot, fire_at = %p.fire_at, "trigger armed");
            registry.push(ScheduledTrigger {
                kind: p.kind,
                slot: p.slot,
                fire_at: p.fire_at,
                handle: task.abort_handle(),
            });
        }
    }

    /// Re-arm today's triggers against the current timetable. Called on
    /// feature-flag changes; never re-fetches — the day's timings have not
    /// changed.
    pub fn reschedule(&self) {
        let table = { self.state.read().unwrap().timetable.clone() };
        let Some(table) = table else {
            warn!("reschedule requested before any timetable was armed");
            return;
        };
        self.arm_day(&table);
        self.refresh_next_prayer();
        info!("triggers rescheduled from current timetable");
    }

    /// Recompute the cached next-prayer snapshot. Whole-struct swap under
    /// the write lock, same as `install`.
    pub fn refresh_next_prayer(&self) {
        let now = self.clock.now();
        let mut st = self.state.write().unwrap();
        let table = st.timetable.take();
        let next = table.as_ref().and_then(|t| t.snapshot(now));
        *st = SchedulerState {
            timetable: table,
            next_prayer: next,
        };
    }

    fn cancel_outstanding(&self) {
        let mut registry = self.triggers.lock().unwrap();
        let n = registry.len();
        for t in registry.drain(..) {
            t.handle.abort();
            debug!(kind = %t.kind, slot = %t.slot, fire_at = %t.fire_at, "trigger cancelled");
        }
        if n > 0 {
            warn!(count = n, "outstanding triggers cancelled");
        }
    }

    pub fn next_prayer(&self) -> Option<NextPrayer> {
        self.state.read().unwrap().next_prayer.clone()
    }

    pub fn timetable(&self) -> Option<TimeTable> {
        self.state.read().unwrap().timetable.clone()
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

/// Decide the day's eligible triggers. Azan fires at iqamah (sunrise
/// excluded); announcement at iqamah − 15 min (fajr and sunrise excluded,
/// encoded as `announcement: None` in the timetable). A slot is armed iff
/// its time is strictly after `now` — equal-to-now counts as passed, which
/// avoids a double-fire race at the boundary.
fn plan_triggers(table: &TimeTable, now: DateTime<Tz>) -> Vec<PlannedTrigger> {
    let mut plan = Vec::new();
    for slot in Slot::IN_ORDER {
        let sched = table.slot(slot);
        if slot.azan_eligible() {
            if let Some(fire_at) = future_today(now, sched.iqamah) {
                plan.push(PlannedTrigger {
                    kind: TriggerKind::Azan,
                    slot,
                    fire_at,
                });
            }
        }
        if let Some(announce) = sched.announcement {
            if let Some(fire_at) = future_today(now, announce) {
                plan.push(PlannedTrigger {
                    kind: TriggerKind::Announcement,
                    slot,
                    fire_at,
                });
            }
        }
    }
    plan
}

/// Resolve `time` on `now`'s date in the observation zone, returning it
/// only when strictly after `now`. A DST gap (nonexistent local time)
/// skips the trigger.
fn future_today(now: DateTime<Tz>, time: NaiveTime) -> Option<DateTime<Tz>> {
    let naive = now.date_naive().and_time(time);
    let Some(at) = now.timezone().from_local_datetime(&naive).earliest() else {
        warn!(time = %time, "local time does not exist today — trigger skipped");
        return None;
    };
    (at > now).then_some(at)
}

/// Duration from `now` to the next local midnight.
fn until_next_midnight(now: DateTime<Tz>) -> std::time::Duration {
    let naive = (now.date_naive() + Duration::days(1)).and_time(NaiveTime::MIN);
    let tz = now.timezone();
    let midnight = match tz.from_local_datetime(&naive).earliest() {
        Some(m) => m,
        // Midnight itself falls in a DST gap (real in some zones, e.g.
        // America/Santiago) — rearm an hour later instead.
        None => match tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
        {
            Some(m) => m,
            None => return std::time::Duration::from_secs(24 * 3_600),
        },
    };
    (midnight - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(1))
}
