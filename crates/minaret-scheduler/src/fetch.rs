//! Timings provider client — one GET per day, keyed by installation id.

use chrono::{Datelike, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use minaret_core::config::ProviderConfig;

use crate::error::FetchError;
use crate::types::{DayTimings, Slot, SlotTimes};

/// Per-day record as returned on the wire. Times are `HH:MM` strings;
/// sunrise has no iqamah of its own.
#[derive(Debug, Deserialize)]
struct DayRecord {
    day: u32,
    month: u32,
    fajr: RawSlot,
    sunrise: RawSlot,
    zuhr: RawSlot,
    asr: RawSlot,
    maghrib: RawSlot,
    isha: RawSlot,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    start: String,
    iqamah: Option<String>,
}

pub struct TimingsFetcher {
    client: reqwest::Client,
    base_url: String,
    installation_id: String,
    tz: Tz,
}

impl TimingsFetcher {
    pub fn new(cfg: &ProviderConfig, tz: Tz) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: cfg.base_url.clone(),
            installation_id: cfg.installation_id.clone(),
            tz,
        }
    }

    /// Fetch the provider's record list and select today's entry.
    ///
    /// "Today" is the **real** calendar date in the observation zone, not
    /// the virtual clock's date — the provider indexes its data by real
    /// date. No retry here; a failed cycle waits for the midnight rearm.
    pub async fn fetch_today(&self) -> Result<DayTimings, FetchError> {
        let url = format!(
            "{}/api/installations/{}/timings",
            self.base_url, self.installation_id
        );
        debug!(url = %url, "fetching day timings");

        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let body = resp.text().await?;
        let records: Vec<DayRecord> = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

        let today = Utc::now().with_timezone(&self.tz);
        let record = select_for_date(&records, today.day(), today.month())?;
        parse_record(record)
    }
}

fn select_for_date(records: &[DayRecord], day: u32, month: u32) -> Result<&DayRecord, FetchError> {
    records
        .iter()
        .find(|r| r.day == day && r.month == month)
        .ok_or(FetchError::NoDataForToday { day, month })
}

fn parse_record(rec: &DayRecord) -> Result<DayTimings, FetchError> {
    Ok(DayTimings {
        day: rec.day,
        month: rec.month,
        fajr: parse_slot(Slot::Fajr, &rec.fajr)?,
        sunrise: parse_slot(Slot::Sunrise, &rec.sunrise)?,
        zuhr: parse_slot(Slot::Zuhr, &rec.zuhr)?,
        asr: parse_slot(Slot::Asr, &rec.asr)?,
        maghrib: parse_slot(Slot::Maghrib, &rec.maghrib)?,
        isha: parse_slot(Slot::Isha, &rec.isha)?,
    })
}

fn parse_slot(slot: Slot, raw: &RawSlot) -> Result<SlotTimes, FetchError> {
    let start = parse_time(slot, "start", &raw.start)?;
    let iqamah = match &raw.iqamah {
        Some(s) => parse_time(slot, "iqamah", s)?,
        // Sunrise carries a single time, used for both fields.
        None if slot == Slot::Sunrise => start,
        None => {
            return Err(FetchError::MalformedResponse(format!(
                "{slot}: missing iqamah time"
            )))
        }
    };
    Ok(SlotTimes { start, iqamah })
}

fn parse_time(slot: Slot, field: &str, value: &str) -> Result<NaiveTime, FetchError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| {
        FetchError::MalformedResponse(format!("{slot}.{field}: bad time {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
        {
            "day": 26, "month": 8,
            "fajr":    { "start": "04:45", "iqamah": "05:15" },
            "sunrise": { "start": "06:07" },
            "zuhr":    { "start": "13:05", "iqamah": "13:30" },
            "asr":     { "start": "17:15", "iqamah": "17:45" },
            "maghrib": { "start": "20:02", "iqamah": "20:07" },
            "isha":    { "start": "21:30", "iqamah": "22:00" }
        },
        {
            "day": 27, "month": 8,
            "fajr":    { "start": "04:47", "iqamah": "05:15" },
            "sunrise": { "start": "06:09" },
            "zuhr":    { "start": "13:05", "iqamah": "13:30" },
            "asr":     { "start": "17:14", "iqamah": "17:45" },
            "maghrib": { "start": "20:00", "iqamah": "20:05" },
            "isha":    { "start": "21:28", "iqamah": "22:00" }
        }
    ]"#;

    fn records() -> Vec<DayRecord> {
        serde_json::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn selects_record_matching_day_and_month() {
        let records = records();
        let rec = select_for_date(&records, 27, 8).unwrap();
        assert_eq!(rec.day, 27);
    }

    #[test]
    fn missing_date_is_no_data_for_today() {
        let records = records();
        let err = select_for_date(&records, 28, 8).unwrap_err();
        assert!(matches!(
            err,
            FetchError::NoDataForToday { day: 28, month: 8 }
        ));
    }

    #[test]
    fn parses_full_record() {
        let records = records();
        let timings = parse_record(&records[0]).unwrap();
        assert_eq!(
            timings.fajr.start,
            NaiveTime::from_hms_opt(4, 45, 0).unwrap()
        );
        assert_eq!(
            timings.fajr.iqamah,
            NaiveTime::from_hms_opt(5, 15, 0).unwrap()
        );
        assert_eq!(
            timings.isha.iqamah,
            NaiveTime::from_hms_opt(22, 0, 0).unwrap()
        );
    }

    #[test]
    fn sunrise_iqamah_defaults_to_its_start() {
        let records = records();
        let timings = parse_record(&records[0]).unwrap();
        assert_eq!(timings.sunrise.start, timings.sunrise.iqamah);
        assert_eq!(
            timings.sunrise.start,
            NaiveTime::from_hms_opt(6, 7, 0).unwrap()
        );
    }

    #[test]
    fn missing_iqamah_on_prayer_slot_is_malformed() {
        let raw = RawSlot {
            start: "13:05".into(),
            iqamah: None,
        };
        let err = parse_slot(Slot::Zuhr, &raw).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn unparseable_time_is_malformed() {
        let raw = RawSlot {
            start: "1pm".into(),
            iqamah: Some("13:30".into()),
        };
        assert!(matches!(
            parse_slot(Slot::Zuhr, &raw),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn garbage_body_is_malformed() {
        let err = serde_json::from_str::<Vec<DayRecord>>("{\"not\": \"a list\"}")
            .map_err(|e| FetchError::MalformedResponse(e.to_string()))
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }
}
