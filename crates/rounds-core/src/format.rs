//! Time formatting helpers for display layers.

/// Format seconds as `MM:SS` (e.g. `05:30`).
pub fn format_time(seconds: f64) -> String {
    let total = seconds.abs().floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Parse an `MM:SS` string into seconds. Rejects seconds >= 60.
pub fn parse_time_string(input: &str) -> Option<u32> {
    let (minutes, seconds) = input.split_once(':')?;
    if minutes.is_empty() || minutes.len() > 2 || seconds.len() != 2 {
        return None;
    }
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(minutes * 60 + seconds)
}

/// Format seconds as a human-readable duration (`1h 15m`, `5m 30s`, `45s`).
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ")
}
