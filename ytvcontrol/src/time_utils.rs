//! Clock formatting for playing-time displays.

use std::time::Duration;

/// Formats a duration as `m:ss`, or `h:mm:ss` past one hour.
///
/// # Examples
/// ```
/// # use std::time::Duration;
/// # use ytvcontrol::time_utils::format_clock;
/// assert_eq!(format_clock(Duration::from_secs(0)), "0:00");
/// assert_eq!(format_clock(Duration::from_secs(61)), "1:01");
/// assert_eq!(format_clock(Duration::from_secs(3661)), "1:01:01");
/// ```
pub fn format_clock(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

/// Milliseconds variant, as carried by [`crate::PlaybackSnapshot`].
pub fn format_clock_ms(elapsed_ms: u64) -> String {
    format_clock(Duration::from_millis(elapsed_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Duration::ZERO), "0:00");
        assert_eq!(format_clock(Duration::from_secs(59)), "0:59");
        assert_eq!(format_clock(Duration::from_secs(600)), "10:00");
        assert_eq!(format_clock(Duration::from_secs(3599)), "59:59");
        assert_eq!(format_clock(Duration::from_secs(3600)), "1:00:00");
        assert_eq!(format_clock(Duration::from_secs(36_000 + 125)), "10:02:05");
    }

    #[test]
    fn test_sub_second_is_truncated() {
        assert_eq!(format_clock(Duration::from_millis(1999)), "0:01");
        assert_eq!(format_clock_ms(61_500), "1:01");
    }
}
