//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Current UTC time as an ISO-8601 string
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Tick rate configuration
pub const TICK_RATE: u32 = 20; // 20 ticks per second
pub const TICK_MILLIS: u64 = 1_000 / TICK_RATE as u64;
pub const ROUND_SECONDS: u32 = 90;

/// Interval between room ticks
pub fn tick_interval() -> Duration {
    Duration::from_millis(TICK_MILLIS)
}
