//! Line formatting for per-thread logs.
//!
//! Each line has the layout:
//! ```text
//! 2024-05-01 10:22:31,123 America/New_York [worker-1] message
//! ```
//!
//! The timestamp uses the process default time zone as it is at the moment of
//! the call, not UTC.

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::path::Path;

/// `yyyy-MM-dd HH:mm:ss,SSS`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Written in place of a missing message.
pub const NULL_MESSAGE: &str = "<null message>";

const LOCALTIME_LINK: &str = "/etc/localtime";

/// The process default time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultZone {
    /// An IANA zone, printed by name (e.g. `Europe/Berlin`).
    Named(Tz),
    /// Zone name unknown; local time is printed with its offset as the id.
    Local,
}

impl DefaultZone {
    /// Detects the current default zone.
    ///
    /// `TZ` wins when set. An unset `TZ` falls back to the `/etc/localtime`
    /// link target. A `TZ` that is not an IANA name falls back to the local
    /// offset, since that is what the system clock will use.
    pub fn detect() -> Self {
        let named = match std::env::var("TZ") {
            Ok(value) => parse_zone_name(&value),
            Err(_) => zone_from_localtime(Path::new(LOCALTIME_LINK)),
        };
        named.map(Self::Named).unwrap_or(Self::Local)
    }
}

/// Parses a `TZ`-style zone name, ignoring a leading `:`.
pub fn parse_zone_name(value: &str) -> Option<Tz> {
    let name = value.trim().trim_start_matches(':');
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok()
}

/// Reads the zone name from a `.../zoneinfo/<Area>/<City>` symlink.
pub fn zone_from_localtime(link: &Path) -> Option<Tz> {
    let target = std::fs::read_link(link).ok()?;
    let target = target.to_string_lossy();
    let (_, name) = target.split_once("zoneinfo/")?;
    parse_zone_name(name)
}

/// Formats `now` in `zone` as `yyyy-MM-dd HH:mm:ss,SSS <zone-id>`.
pub fn format_timestamp_at(now: DateTime<Utc>, zone: DefaultZone) -> String {
    match zone {
        DefaultZone::Named(tz) => {
            let local = now.with_timezone(&tz);
            format!("{} {}", local.format(TIMESTAMP_FORMAT), tz.name())
        }
        DefaultZone::Local => {
            let local = now.with_timezone(&Local);
            let zone_id = if local.offset().local_minus_utc() == 0 {
                "Z".to_string()
            } else {
                local.format("%:z").to_string()
            };
            format!("{} {}", local.format(TIMESTAMP_FORMAT), zone_id)
        }
    }
}

/// Formats the current instant in the current default zone.
pub fn format_timestamp() -> String {
    format_timestamp_at(Utc::now(), DefaultZone::detect())
}

/// Builds one complete log line, including the trailing newline.
pub fn format_line(timestamp: &str, thread_name: &str, message: Option<&str>) -> String {
    format!(
        "{} [{}] {}\n",
        timestamp,
        thread_name,
        message.unwrap_or(NULL_MESSAGE)
    )
}

/// The calling thread's name, or its `ThreadId(N)` debug form if unnamed.
pub fn thread_display_name() -> String {
    let current = std::thread::current();
    match current.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", current.id()),
    }
}

#[cfg(test)]
#[path = "tests/timestamp_tests.rs"]
mod tests;
