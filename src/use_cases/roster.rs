// Connection roster: the broadcast engine's table of live outbound queues.

use crate::domain::ConnId;
use crate::use_cases::Outbound;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

/// Per-connection delivery handle held by the relay task.
#[derive(Debug, Clone)]
pub struct ConnHandle {
    /// Queue drained by the connection's socket loop.
    pub outbound: mpsc::Sender<Outbound>,
    /// Signal telling the socket loop to close the transport connection.
    pub shutdown: Arc<Notify>,
}

/// Live connections keyed by connection id.
#[derive(Debug, Default)]
pub struct Roster {
    conns: HashMap<ConnId, ConnHandle>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. An existing handle for the id is replaced.
    pub fn insert(&mut self, conn_id: ConnId, handle: ConnHandle) {
        self.conns.insert(conn_id, handle);
    }

    /// Drops the handle for a connection. Idempotent.
    pub fn remove(&mut self, conn_id: ConnId) {
        self.conns.remove(&conn_id);
    }

    /// Drops the handle and tells the socket loop to close the transport.
    pub fn disconnect(&mut self, conn_id: ConnId) {
        if let Some(handle) = self.conns.remove(&conn_id) {
            handle.shutdown.notify_one();
        }
    }

    /// Fire-and-forget push to a single connection.
    pub fn send_to(&self, conn_id: ConnId, msg: Outbound) {
        let Some(handle) = self.conns.get(&conn_id) else {
            debug!(conn_id, "push to unknown connection dropped");
            return;
        };
        deliver(conn_id, handle, msg);
    }

    /// Fire-and-forget push to every connection. Per-recipient failures are
    /// logged and never abort delivery to the rest of the batch.
    pub fn broadcast(&self, msg: &Outbound) {
        for (conn_id, handle) in &self.conns {
            deliver(*conn_id, handle, msg.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}

fn deliver(conn_id: ConnId, handle: &ConnHandle, msg: Outbound) {
    // A slow or dead client must not stall delivery to anyone else.
    match handle.outbound.try_send(msg) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            warn!(conn_id, "outbound queue full; dropping message");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!(conn_id, "outbound queue closed; dropping message");
        }
    }
}
