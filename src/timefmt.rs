use std::fmt;

use crate::model::Minutes;

/// A time string the codec could not understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTimeFormat(pub String);

impl fmt::Display for InvalidTimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time format: {:?}", self.0)
    }
}

impl std::error::Error for InvalidTimeFormat {}

/// Parse `"9:00am"`, `"5:00 PM"` or `"17:00"` into a minute-of-day offset.
///
/// Case and internal spaces are ignored. The 12-hour form requires an hour in
/// 1–12; the 24-hour form an hour in 0–23. Anything else is an error.
pub fn parse_minutes(text: &str) -> Result<Minutes, InvalidTimeFormat> {
    let cleaned: String = text
        .to_ascii_lowercase()
        .chars()
        .filter(|c| *c != ' ')
        .collect();
    let invalid = || InvalidTimeFormat(text.to_string());

    if let Some(body) = cleaned.strip_suffix("am") {
        let (hour, minute) = split_clock(body).ok_or_else(invalid)?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(invalid());
        }
        return Ok(((hour % 12) * 60 + minute) as Minutes);
    }
    if let Some(body) = cleaned.strip_suffix("pm") {
        let (hour, minute) = split_clock(body).ok_or_else(invalid)?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return Err(invalid());
        }
        return Ok(((hour % 12 + 12) * 60 + minute) as Minutes);
    }

    let (hour, minute) = split_clock(&cleaned).ok_or_else(invalid)?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour * 60 + minute) as Minutes)
}

/// Split `"H:MM"` into its two numeric fields. Digits only, 1–2 per field.
fn split_clock(s: &str) -> Option<(u32, u32)> {
    let (hour, minute) = s.split_once(':')?;
    for field in [hour, minute] {
        if field.is_empty() || field.len() > 2 || !field.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }
    Some((hour.parse().ok()?, minute.parse().ok()?))
}

/// Render a minute-of-day offset as the canonical 12-hour display string,
/// no leading zero on the hour (`900 -> "3:00 PM"`).
///
/// Not a byte-for-byte inverse of the parser: every accepted input form
/// normalizes to this one display form.
pub fn format_minutes(minutes: Minutes) -> String {
    let hour = minutes.div_euclid(60).rem_euclid(24);
    let minute = minutes.rem_euclid(60);
    let period = if hour < 12 { "AM" } else { "PM" };
    let hour12 = if hour % 12 == 0 { 12 } else { hour % 12 };
    format!("{hour12}:{minute:02} {period}")
}
