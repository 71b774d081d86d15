use std::time::{Duration, SystemTime};

/// Format an elapsed duration coarsely ("42s", "15m", "3h 20m", "2d 4h")
pub fn format_age(age: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let secs = age.as_secs();
    if secs >= DAY {
        format!("{}d {}h", secs / DAY, (secs % DAY) / HOUR)
    } else if secs >= HOUR {
        format!("{}h {}m", secs / HOUR, (secs % HOUR) / MINUTE)
    } else if secs >= MINUTE {
        format!("{}m", secs / MINUTE)
    } else {
        format!("{}s", secs)
    }
}

/// Format a point in time as `YYYY-MM-DD HH:MM:SS` UTC
pub fn format_timestamp(at: SystemTime) -> String {
    use time::macros::format_description;
    use time::OffsetDateTime;

    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    OffsetDateTime::from(at)
        .format(&format)
        .unwrap_or_else(|_| "unknown".to_string())
}
