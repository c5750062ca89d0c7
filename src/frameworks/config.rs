use std::{env, time::Duration};

// Runtime/server constants (not relay tuning).

pub fn http_port() -> u16 {
    env::var("RELAY_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3003)
}

pub fn sweep_interval() -> Duration {
    let secs = env::var("SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(60);
    Duration::from_secs(secs)
}

pub fn stale_after() -> Duration {
    let secs = env::var("STALE_AFTER_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(300);
    Duration::from_secs(secs)
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;
