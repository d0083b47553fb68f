//! `minaret-scheduler` — the daily prayer-announcement scheduling engine.
//!
//! # Overview
//!
//! Once per day the [`engine::ScheduleEngine`] fetches the day's prayer
//! record, derives a [`types::TimeTable`] from it and arms one one-shot
//! tokio timer per eligible trigger. At local midnight the whole cycle
//! re-runs for the next day, so the engine is self-perpetuating; a failed
//! fetch simply leaves the day unarmed until the next midnight.
//!
//! # Trigger kinds
//!
//! | Kind           | Fires at        | Excluded slots   |
//! |----------------|-----------------|------------------|
//! | `Azan`         | iqamah time     | sunrise          |
//! | `Announcement` | iqamah − 15 min | fajr, sunrise    |
//!
//! A slot whose time is not strictly in the future at arming time is
//! skipped, never fired late. Flag changes re-arm from the same timetable
//! without re-fetching; the cancel-then-arm sequence is a single critical
//! section so two live triggers for the same (slot, kind) can never exist.
//!
//! The [`clock::Clock`] supports a virtual test mode: a fixed offset
//! computed once at boot shifts every reading, letting the full pipeline
//! run without waiting for real prayer times.

pub mod clock;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod notify;
pub mod timetable;
pub mod tracker;
pub mod types;

pub use clock::Clock;
pub use engine::ScheduleEngine;
pub use error::{DispatchError, FetchError};
pub use fetch::TimingsFetcher;
pub use notify::{FeatureFlags, Notify, WebhookNotifier};
pub use types::{DayTimings, NextPrayer, Slot, TimeTable, TriggerKind};
