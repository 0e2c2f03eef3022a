/// `HH:MM:SS` for a duration in seconds; fractional seconds are truncated.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hours_minutes_seconds() {
        assert_eq!(format_duration(0.0), "00:00:00");
        assert_eq!(format_duration(1830.9), "00:30:30");
        assert_eq!(format_duration(3600.0 * 12.0 + 61.0), "12:01:01");
        assert_eq!(format_duration(-5.0), "00:00:00");
    }
}
