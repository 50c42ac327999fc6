//! Partially-specified dates and masked comparison.
//!
//! A [`PartialDate`] names any subset of year, month, day, hour and minute.
//! Comparing it against a timestamp copies the timestamp, overwrites only the
//! components the filter gave, and compares the two. So `month:3` matches any
//! March, in any year, and `year:2024,month:3` only March 2024.
//!
//! Months are 1-based everywhere, including on the wire.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(
        default,
        rename = "offsetMinutesFromUTC",
        skip_serializing_if = "Option::is_none"
    )]
    pub offset_minutes_from_utc: Option<i32>,
}

impl PartialDate {
    /// Parses user text into a partial date. Returns `None` for anything that
    /// is not a recognised form, or that has an out-of-range component.
    ///
    /// Accepted forms:
    /// - `2024`, `2024-03`, `2024-03-15`, `2024-03-15T10:30`, `2024-03-15 10:30`
    /// - `10:30`
    /// - `15/03/2024`, `03/2024`
    /// - `march`, `mar 2024`, `15 march 2024`, `march 15, 2024`
    /// - `year:2024,month:3` (also `y=2024,mo=3`)
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let parsed = parse_components(&text)
            .or_else(|| parse_iso(&text))
            .or_else(|| parse_slashed(&text))
            .or_else(|| parse_clock(&text).map(|(hour, minute)| PartialDate::time(hour, minute)))
            .or_else(|| parse_words(&text))?;

        parsed.is_valid().then_some(parsed)
    }

    /// Attaches the UTC offset (in minutes) the components are expressed in.
    pub fn with_offset(mut self, minutes: i32) -> Self {
        self.offset_minutes_from_utc = Some(minutes);
        self
    }

    fn time(hour: u32, minute: u32) -> Self {
        PartialDate {
            hour: Some(hour),
            minute: Some(minute),
            ..Default::default()
        }
    }

    /// True when at least one component is set and all are in range.
    pub fn is_valid(&self) -> bool {
        let any = self.year.is_some()
            || self.month.is_some()
            || self.day.is_some()
            || self.hour.is_some()
            || self.minute.is_some();
        any && self.year.map_or(true, |y| (0..=9999).contains(&y))
            && self.month.map_or(true, |m| (1..=12).contains(&m))
            && self.day.map_or(true, |d| (1..=31).contains(&d))
            && self.hour.map_or(true, |h| h < 24)
            && self.minute.map_or(true, |m| m < 60)
            && self
                .offset_minutes_from_utc
                .map_or(true, |o| offset_from_minutes(o).is_some())
    }

    /// Compares `subject` against this date after masking.
    ///
    /// The subject is moved into this date's UTC offset and truncated to the
    /// minute; the given components are copied over it. A day past the end of
    /// the month rolls forward (day 31 in April is 1 May). Returns how the
    /// subject orders against the masked target, or `None` if the target cannot
    /// be built.
    pub fn compare(&self, subject: DateTime<Utc>) -> Option<Ordering> {
        let offset = offset_from_minutes(self.offset_minutes_from_utc.unwrap_or(0))?;
        let subject = subject
            .with_timezone(&offset)
            .with_second(0)?
            .with_nanosecond(0)?;

        let year = self.year.unwrap_or(subject.year());
        let month = self.month.unwrap_or(subject.month());
        let day = self.day.unwrap_or(subject.day());
        let hour = self.hour.unwrap_or(subject.hour());
        let minute = self.minute.unwrap_or(subject.minute());

        let date = NaiveDate::from_ymd_opt(year, month, 1)?
            .checked_add_days(Days::new(u64::from(day.checked_sub(1)?)))?;
        let target = offset
            .from_local_datetime(&date.and_hms_opt(hour, minute, 0)?)
            .single()?;

        Some(subject.cmp(&target))
    }
}

/// `year:2024,month:3` style lists. Keys must be alphabetic.
fn parse_components(text: &str) -> Option<PartialDate> {
    let mut date = PartialDate::default();
    let mut seen = false;
    for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part.split_once([':', '='])?;
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let value = value.trim();
        match key {
            "year" | "y" => date.year = Some(value.parse().ok()?),
            "month" | "mo" => {
                date.month = Some(value.parse().ok().or_else(|| month_number(value))?)
            }
            "day" | "d" => date.day = Some(value.parse().ok()?),
            "hour" | "h" => date.hour = Some(value.parse().ok()?),
            "minute" | "mi" => date.minute = Some(value.parse().ok()?),
            _ => return None,
        }
        seen = true;
    }
    seen.then_some(date)
}

/// `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, optionally followed by `T` or a space and `HH:MM`.
fn parse_iso(text: &str) -> Option<PartialDate> {
    let (date_part, time_part) = match text.split_once(['t', ' ']) {
        Some((d, t)) => (d, Some(t.trim())),
        None => (text, None),
    };

    let mut pieces = date_part.split('-');
    let year = pieces.next().filter(|y| y.len() == 4)?;
    let mut date = PartialDate {
        year: Some(digits(year)?),
        ..Default::default()
    };
    if let Some(month) = pieces.next() {
        date.month = Some(digits(month)?);
    }
    if let Some(day) = pieces.next() {
        date.day = Some(digits(day)?);
    }
    if pieces.next().is_some() {
        return None;
    }

    if let Some(time) = time_part {
        if date.day.is_none() {
            return None;
        }
        let (hour, minute) = parse_clock(time)?;
        date.hour = Some(hour);
        date.minute = Some(minute);
    }
    Some(date)
}

/// `DD/MM/YYYY` or `MM/YYYY`.
fn parse_slashed(text: &str) -> Option<PartialDate> {
    let pieces: Vec<&str> = text.split('/').collect();
    match pieces.as_slice() {
        [day, month, year] if year.len() == 4 => Some(PartialDate {
            year: Some(digits(year)?),
            month: Some(digits(month)?),
            day: Some(digits(day)?),
            ..Default::default()
        }),
        [month, year] if year.len() == 4 => Some(PartialDate {
            year: Some(digits(year)?),
            month: Some(digits(month)?),
            ..Default::default()
        }),
        _ => None,
    }
}

fn parse_clock(text: &str) -> Option<(u32, u32)> {
    let (hour, minute) = text.split_once(':')?;
    if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
        return None;
    }
    Some((digits(hour)?, digits(minute)?))
}

/// Free-form text built around a month name: `15 march 2024`, `mar 2024`,
/// `march 15, 2024 10:30`.
fn parse_words(text: &str) -> Option<PartialDate> {
    let mut date = PartialDate::default();
    for word in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
    {
        if let Some(month) = month_number(word) {
            if date.month.replace(month).is_some() {
                return None;
            }
        } else if let Some((hour, minute)) = parse_clock(word) {
            if date.hour.replace(hour).is_some() {
                return None;
            }
            date.minute = Some(minute);
        } else if word.len() == 4 {
            if date.year.replace(digits(word)?).is_some() {
                return None;
            }
        } else {
            let day = word.trim_end_matches(|c: char| c.is_ascii_alphabetic());
            let suffix = &word[day.len()..];
            if !matches!(suffix, "" | "st" | "nd" | "rd" | "th") || day.len() > 2 {
                return None;
            }
            if date.day.replace(digits(day)?).is_some() {
                return None;
            }
        }
    }
    date.month.is_some().then_some(date)
}

fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

fn month_number(word: &str) -> Option<u32> {
    if word.len() < 3 {
        return None;
    }
    let word = word.trim_end_matches('.');
    MONTHS
        .iter()
        .position(|name| *name == word || (word.len() >= 3 && name.starts_with(word)))
        .map(|idx| idx as u32 + 1)
}

fn digits<N: std::str::FromStr>(text: &str) -> Option<N> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
