//! Human readable durations ("2 minutes", "3 hours ago").

use chrono::{DateTime, Duration, Utc};

pub fn humanize(duration: Duration) -> String {
    let secs = duration.num_seconds().abs() as f64;
    let minutes = secs / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;

    if secs < 45.0 {
        format!("{} seconds", secs as i64)
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes.round() as i64)
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours.round() as i64)
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days.round() as i64)
    } else if days < 45.0 {
        "a month".to_string()
    } else if days < 320.0 {
        format!("{} months", (days / 30.0).round() as i64)
    } else if days < 548.0 {
        "a year".to_string()
    } else {
        format!("{} years", (days / 365.0).round() as i64)
    }
}

/// Age of `then` relative to `now`.
pub fn relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - then;
    if delta < Duration::zero() {
        format!("in {}", humanize(delta))
    } else {
        format!("{} ago", humanize(delta))
    }
}
