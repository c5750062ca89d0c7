use crate::use_cases::RelayEvent;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct AppState {
    // Events flowing from the network into the relay task.
    pub event_tx: mpsc::Sender<RelayEvent>,
    // Process start time for uptime reporting.
    pub started_at: Instant,
}
