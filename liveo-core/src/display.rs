//! Race time formatting

/// Nanoseconds per second, the unit competitor times arrive in
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Format a nanosecond race time as `minutes:seconds`
///
/// Seconds are zero-padded to two digits and sub-second precision is truncated
/// toward zero. Negative times keep their sign in front.
///
/// ```rust
/// use liveo_core::display::format_race_time;
///
/// assert_eq!(format_race_time(125_300_000_000), "2:05");
/// assert_eq!(format_race_time(3_600_000_000_000), "60:00");
/// ```
pub fn format_race_time(nanos: i64) -> String {
    let total_seconds = nanos / NANOS_PER_SECOND;
    let sign = if total_seconds < 0 { "-" } else { "" };
    let total_seconds = total_seconds.unsigned_abs();
    format!("{}{}:{:02}", sign, total_seconds / 60, total_seconds % 60)
}
