//! Environment handed to the companion.

use std::ffi::OsStr;

use chrono::Local;

/// `Etc/GMT*` zone for a UTC offset in seconds. POSIX inverts the sign in
/// these names, so UTC+2 is `Etc/GMT-2`. Partial hours are truncated.
pub fn etc_gmt_zone(offset_seconds: i32) -> String {
    let hours = offset_seconds / 3600;
    if hours == 0 {
        "Etc/GMT".to_string()
    } else {
        format!("Etc/GMT{:+}", -hours)
    }
}

/// Zone to inject given the host's own `TZ`, so the companion's timestamps
/// follow local time. `None` leaves the environment alone.
pub fn injected_tz(host_tz: Option<&OsStr>) -> Option<String> {
    if host_tz.is_some() {
        return None;
    }
    Some(etc_gmt_zone(Local::now().offset().local_minus_utc()))
}
