use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Wall-clock time of day, already converted to 24-hour form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpec {
    pub hour: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("24-hour time requires a colon: `{0}`")]
    MissingColon(String),
    #[error("invalid hour in `{0}`")]
    InvalidHour(String),
    #[error("invalid minute in `{0}`")]
    InvalidMinute(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

fn parse_digits(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok()
}

fn split_hour_minute(raw: &str, original: &str) -> Result<(u32, u32), TimeParseError> {
    let (hour, minute) = match raw.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (raw, None),
    };
    let hour =
        parse_digits(hour).ok_or_else(|| TimeParseError::InvalidHour(original.to_string()))?;
    let minute = match minute {
        Some(m) => {
            parse_digits(m).ok_or_else(|| TimeParseError::InvalidMinute(original.to_string()))?
        }
        None => 0,
    };
    if minute > 59 {
        return Err(TimeParseError::InvalidMinute(original.to_string()));
    }
    Ok((hour, minute))
}

/// Parse `6pm`, `6 pm`, `6:30pm` or `18:00` into a 24-hour [`TimeSpec`].
///
/// Under am/pm, `12` and `0` both name the first hour of the half day.
pub fn parse_time_of_day(raw: &str) -> Result<TimeSpec, TimeParseError> {
    let lower = raw.trim().to_ascii_lowercase();
    let compact: String = lower.chars().filter(|c| !c.is_whitespace()).collect();

    let (body, meridiem) = if let Some(body) = compact.strip_suffix("am") {
        (body, Some(Meridiem::Am))
    } else if let Some(body) = compact.strip_suffix("pm") {
        (body, Some(Meridiem::Pm))
    } else {
        (lower.as_str(), None)
    };

    let Some(meridiem) = meridiem else {
        if !body.contains(':') {
            return Err(TimeParseError::MissingColon(raw.to_string()));
        }
        let (hour, minute) = split_hour_minute(body, raw)?;
        if hour > 23 {
            return Err(TimeParseError::InvalidHour(raw.to_string()));
        }
        return Ok(TimeSpec { hour, minute });
    };

    let (hour, minute) = split_hour_minute(body, raw)?;
    if hour > 12 {
        return Err(TimeParseError::InvalidHour(raw.to_string()));
    }
    let hour = match (meridiem, hour) {
        (Meridiem::Am, 12) => 0,
        (Meridiem::Pm, 12) => 12,
        (Meridiem::Pm, h) => h + 12,
        (Meridiem::Am, h) => h,
    };
    Ok(TimeSpec { hour, minute })
}

pub fn parse_zone(label: &str) -> Option<Tz> {
    label.trim().parse::<Tz>().ok()
}

// Nonexistent wall times (spring-forward gaps) move forward by the usual one
// hour shift; repeated wall times take the earlier instant.
fn localize(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest(),
    }
}

/// Next occurrence of `spec` in `tz` strictly after `now`, plus `buffer`.
///
/// A time already reached today rolls over to the same wall-clock time on the
/// next calendar day in that zone.
pub fn next_reset(
    spec: TimeSpec,
    tz: Tz,
    now: DateTime<Utc>,
    buffer: TimeDelta,
) -> Option<DateTime<Tz>> {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let at = NaiveTime::from_hms_opt(spec.hour, spec.minute, 0)?;

    let mut candidate = localize(&tz, today.and_time(at))?;
    if candidate <= local_now {
        let tomorrow = today.succ_opt()?;
        candidate = localize(&tz, tomorrow.and_time(at))?;
    }
    candidate.checked_add_signed(buffer)
}
