//! Schedule expressions understood by the trigger engine.
//!
//! Accepted forms:
//! - `@every <duration>` with Go-style durations such as `1s`, `90s`, `1h30m`
//! - `@yearly`, `@annually`, `@monthly`, `@weekly`, `@daily`, `@midnight`, `@hourly`
//! - 5-field cron (`min hour dom month dow`), seconds default to 0
//! - 6-field cron with seconds
//! - 7-field cron with year, passed to the `cron` crate untouched
//!
//! In the 5- and 6-field forms day-of-week numbers run 0-6 from Sunday (7 is
//! also Sunday), matching the expressions existing deployments store. All
//! times are UTC.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;

use crate::error::CronError;

/// A parsed schedule.
#[derive(Debug, Clone)]
pub enum TriggerSchedule {
    /// Fixed interval since the previous fire.
    Every(Duration),
    /// Calendar expression.
    Cron(Box<Schedule>),
}

impl TriggerSchedule {
    /// Parse a schedule expression.
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let trimmed = expr.trim();
        let fail = |reason: String| CronError::Schedule {
            schedule: expr.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(fail("empty expression".to_string()));
        }

        if let Some(rest) = trimmed.strip_prefix("@every") {
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return Err(fail(format!("unknown descriptor '{}'", trimmed)));
            }
            let every = parse_duration(rest.trim()).map_err(fail)?;
            return Ok(TriggerSchedule::Every(every));
        }

        let normalized = normalize(trimmed).map_err(fail)?;
        let schedule = Schedule::from_str(&normalized).map_err(|e| fail(e.to_string()))?;
        Ok(TriggerSchedule::Cron(Box::new(schedule)))
    }

    /// The first fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TriggerSchedule::Every(every) => chrono::Duration::from_std(*every)
                .ok()
                .and_then(|d| after.checked_add_signed(d)),
            TriggerSchedule::Cron(schedule) => schedule.after(&after).next(),
        }
    }
}

impl FromStr for TriggerSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Rewrite descriptors and short forms into the 6/7-field `cron` crate syntax.
fn normalize(expr: &str) -> Result<String, String> {
    if expr.starts_with('@') {
        let fields = match expr.to_ascii_lowercase().as_str() {
            "@yearly" | "@annually" => "0 0 0 1 1 *",
            "@monthly" => "0 0 0 1 * *",
            "@weekly" => "0 0 0 * * SUN",
            "@daily" | "@midnight" => "0 0 0 * * *",
            "@hourly" => "0 0 * * * *",
            _ => return Err(format!("unknown descriptor '{}'", expr)),
        };
        return Ok(fields.to_string());
    }

    let mut fields: Vec<String> = expr.split_whitespace().map(String::from).collect();
    match fields.len() {
        5 => fields.insert(0, "0".to_string()),
        6 => {}
        7 => return Ok(fields.join(" ")),
        n => return Err(format!("expected 5 to 7 fields, found {}", n)),
    }
    fields[5] = shift_day_of_week(&fields[5])?;
    Ok(fields.join(" "))
}

/// Map Sunday-based 0-6 day numbers onto the `cron` crate's 1-7 numbering.
fn shift_day_of_week(field: &str) -> Result<String, String> {
    field
        .split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            let range = match range.split_once('-') {
                Some((start, end)) => format!("{}-{}", shift_day(start)?, shift_day(end)?),
                None => shift_day(range)?,
            };
            Ok(match step {
                Some(step) => format!("{}/{}", range, step),
                None => range,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map(|items| items.join(","))
}

fn shift_day(day: &str) -> Result<String, String> {
    if !day.chars().all(|c| c.is_ascii_digit()) || day.is_empty() {
        return Ok(day.to_string());
    }
    match day.parse::<u8>() {
        Ok(n @ 0..=6) => Ok((n + 1).to_string()),
        Ok(7) => Ok("1".to_string()),
        _ => Err(format!("day of week '{}' out of range 0-7", day)),
    }
}

/// Parse a Go-style duration: a sequence of `<number><unit>` pairs.
fn parse_duration(input: &str) -> Result<Duration, String> {
    if input.is_empty() {
        return Err("@every requires a duration".to_string());
    }

    let mut total = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        if number_len == 0 {
            return Err(format!("invalid duration '{}'", input));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration '{}'", input))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
        };
        rest = &rest[unit_len..];
        total += value * seconds;
    }

    if total <= 0.0 || !total.is_finite() {
        return Err(format!("duration '{}' must be positive", input));
    }
    let every = Duration::try_from_secs_f64(total)
        .map_err(|_| format!("duration '{}' is out of range", input))?;
    if every < MIN_EVERY {
        return Err(format!("duration '{}' must be at least 1ms", input));
    }
    Ok(every)
}

const MIN_EVERY: Duration = Duration::from_millis(1);

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
