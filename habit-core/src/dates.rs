use chrono::{DateTime, Local, NaiveDate, NaiveTime};

/// Canonical day key format used in persisted data and the log form.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn date_key(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Parses a `YYYY-MM-DD` field as a calendar day, without any timezone step.
pub fn parse_date_input(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

/// Unix seconds of the day's UTC midnight.
pub fn day_timestamp(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}

pub fn day_from_timestamp(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Which form a stored day key was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKey {
    Iso(NaiveDate),
    /// Older data keyed days by epoch seconds.
    Legacy(NaiveDate),
}

impl DayKey {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(day) = parse_date_input(raw) {
            return Some(DayKey::Iso(day));
        }
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(day_from_timestamp)
            .map(DayKey::Legacy)
    }

    pub fn day(self) -> NaiveDate {
        match self {
            DayKey::Iso(day) | DayKey::Legacy(day) => day,
        }
    }
}

pub fn format_day_label(day: NaiveDate) -> String {
    let base = date_key(day);
    let diff = (today() - day).num_days();
    match diff {
        0 => format!("{base}, today"),
        d if d > 0 => format!("{base}, -{d}d"),
        d => format!("{base}, +{}d", -d),
    }
}

pub fn first_of_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

pub fn last_of_year(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
}

/// Serde adapter for `data`: writes canonical keys, reads both key forms.
pub mod day_map {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use tracing::warn;

    use super::{date_key, DayKey};
    use crate::types::{MAX_LOG_VALUE, MIN_LOG_VALUE};

    pub fn serialize<S>(data: &BTreeMap<NaiveDate, u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(data.iter().map(|(day, value)| (date_key(*day), *value)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<NaiveDate, u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(normalize(raw))
    }

    /// Values are read loosely so one bad entry cannot fail the whole list.
    pub(crate) fn normalize(raw: BTreeMap<String, Value>) -> BTreeMap<NaiveDate, u8> {
        let mut iso = BTreeMap::new();
        let mut legacy: BTreeMap<NaiveDate, u8> = BTreeMap::new();

        for (key, value) in raw {
            let Some(value) = value.as_i64() else {
                warn!(key = %key, value = %value, "dropping non-integer stored value");
                continue;
            };
            if !(MIN_LOG_VALUE..=MAX_LOG_VALUE).contains(&value) {
                warn!(key = %key, value, "dropping stored value outside 0..=5");
                continue;
            }
            match DayKey::parse(&key) {
                Some(DayKey::Iso(day)) => {
                    iso.insert(day, value as u8);
                }
                Some(DayKey::Legacy(day)) => {
                    // Two stamps on one day keep the larger value.
                    let slot = legacy.entry(day).or_insert(value as u8);
                    *slot = (*slot).max(value as u8);
                }
                None => warn!(key = %key, "dropping unrecognized day key"),
            }
        }

        for (day, value) in legacy {
            if iso.contains_key(&day) {
                warn!(day = %date_key(day), "legacy key shadowed by ISO key");
                continue;
            }
            iso.insert(day, value);
        }
        iso
    }
}
