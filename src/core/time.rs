//! Timestamp and run-id helpers.

use chrono::{SecondsFormat, Utc};
use ulid::Ulid;

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn new_run_id() -> String {
    Ulid::new().to_string()
}
