use crate::utils::constants::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use std::time::Duration;

/// Two-digit department code used in shard paths (e.g. 7 -> "07")
pub fn as_dd(department: u8) -> String {
    format!("{:02}", department)
}

/// Hourly timestamp in the `YYYYMMDDHH` form used by the source and output files
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Group digits by thousands (e.g. 1234567 -> "1,234,567")
pub fn format_nice(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Human readable elapsed time
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();

    if millis < 10_000 {
        return format!("{}ms", format_nice(millis as usize));
    }
    if millis < 60_000 {
        return format!("{:.2}s", elapsed.as_secs_f64());
    }

    let total_secs = elapsed.as_secs();
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{}d{:02}h{:02}m{:02}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h{:02}m{:02}s", hours, minutes, seconds)
    } else {
        format!("{}m{:02}s", minutes, seconds)
    }
}
