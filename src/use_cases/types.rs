// Use-case level inputs/outputs for the relay task.

use crate::domain::{ConnId, LocationPayload, Session, Ticket, TicketPayload, TicketUpdatePayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc, oneshot};

/// Connection-lifecycle and client message events delivered to the relay
/// task. One mpsc channel carries every event, so events from a single
/// connection are processed in the order the transport delivered them.
#[derive(Debug)]
pub enum RelayEvent {
    /// A connection finished the WebSocket upgrade. Catch-up state goes to
    /// `outbound`; `shutdown` lets the relay force the transport closed.
    Open {
        conn_id: ConnId,
        outbound: mpsc::Sender<Outbound>,
        shutdown: Arc<Notify>,
    },
    LocationUpdate {
        conn_id: ConnId,
        payload: LocationPayload,
    },
    VisibilityChange {
        conn_id: ConnId,
        visible: bool,
    },
    CreateTicket {
        conn_id: ConnId,
        payload: TicketPayload,
    },
    UpdateTicket {
        conn_id: ConnId,
        payload: TicketUpdatePayload,
    },
    RequestTickets {
        conn_id: ConnId,
    },
    RequestUsers {
        conn_id: ConnId,
    },
    Close {
        conn_id: ConnId,
    },
    /// Read-only counters for the status endpoint.
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
}

/// Messages pushed from the relay task to connection loops. Snapshot-bearing
/// variants share one allocation across all recipients.
#[derive(Debug, Clone)]
pub enum Outbound {
    Identity { conn_id: ConnId },
    NearbyUsers(Arc<Vec<Session>>),
    AllTickets(Arc<Vec<Ticket>>),
    NewTicket(Ticket),
    TicketUpdated(Ticket),
    Error { message: String },
}

/// Tunables for the relay task.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Fixed interval between liveness sweeps.
    pub sweep_interval: Duration,
    /// Maximum silence tolerated before a connection is evicted.
    pub stale_after: Duration,
}

/// Counters reported to the status endpoint.
#[derive(Debug, Clone, Copy)]
pub struct StatusReport {
    pub connections: usize,
    pub sessions: usize,
    pub tickets: usize,
}
