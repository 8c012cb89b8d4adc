//! Weekly opening hours of the pharmacy.

use serde::{Deserialize, Serialize};

/// Opening window for a single weekday.
///
/// `open` and `close` are 24-hour `H:MM` / `HH:MM` strings. `closed` is kept
/// exactly as submitted (absent stays absent) so a stored schedule reads back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed: Option<bool>,
}

/// Per-weekday schedule, Monday first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub monday: DayHours,
    pub tuesday: DayHours,
    pub wednesday: DayHours,
    pub thursday: DayHours,
    pub friday: DayHours,
    pub saturday: DayHours,
    pub sunday: DayHours,
}

impl WeeklySchedule {
    /// Weekday name paired with its hours, Monday first.
    pub fn days(&self) -> [(&'static str, &DayHours); 7] {
        [
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ]
    }
}

/// Check a 24-hour clock value: hour `0`-`23` with an optional leading zero,
/// then `:` and a two-digit minute `00`-`59`.
pub fn is_clock_time(value: &str) -> bool {
    let Some((hour, minute)) = value.split_once(':') else {
        return false;
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(1..=2).contains(&hour.len()) || minute.len() != 2 {
        return false;
    }
    if !all_digits(hour) || !all_digits(minute) {
        return false;
    }
    match (hour.parse::<u8>(), minute.parse::<u8>()) {
        (Ok(h), Ok(m)) => h <= 23 && m <= 59,
        _ => false,
    }
}
