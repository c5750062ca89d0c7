// The relay task: single owner of sessions, tickets and the connection
// roster. All mutation flows through one event channel, so a broadcast
// snapshot can never observe a half-applied update, and the liveness sweep
// takes the same exclusion discipline as every other writer.

use crate::domain::{
    ConnId, LocationPayload, RelayError, SessionRegistry, TicketPayload, TicketStore,
    TicketUpdatePayload, validate_location, validate_ticket, validate_ticket_update,
};
use crate::use_cases::roster::{ConnHandle, Roster};
use crate::use_cases::{Outbound, RelayEvent, RelaySettings, StatusReport};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

struct Relay {
    sessions: SessionRegistry,
    tickets: TicketStore,
    roster: Roster,
    settings: RelaySettings,
}

/// Runs until the event channel closes (all senders dropped).
pub async fn relay_task(mut event_rx: mpsc::Receiver<RelayEvent>, settings: RelaySettings) {
    let mut sweep = tokio::time::interval(settings.sweep_interval);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can be stale yet.
    sweep.tick().await;

    let mut relay = Relay {
        sessions: SessionRegistry::new(),
        tickets: TicketStore::new(),
        roster: Roster::new(),
        settings,
    };

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => relay.handle_event(event),
                None => break,
            },
            _ = sweep.tick() => relay.sweep(Instant::now()),
        }
    }
}

impl Relay {
    fn handle_event(&mut self, event: RelayEvent) {
        let now = Instant::now();
        match event {
            RelayEvent::Open {
                conn_id,
                outbound,
                shutdown,
            } => self.open(conn_id, outbound, shutdown, now),
            RelayEvent::LocationUpdate { conn_id, payload } => {
                self.location_update(conn_id, payload, now)
            }
            RelayEvent::VisibilityChange { conn_id, visible } => {
                self.visibility_change(conn_id, visible, now)
            }
            RelayEvent::CreateTicket { conn_id, payload } => {
                self.create_ticket(conn_id, payload, now)
            }
            RelayEvent::UpdateTicket { conn_id, payload } => {
                self.update_ticket(conn_id, payload, now)
            }
            RelayEvent::RequestTickets { conn_id } => {
                self.sessions.touch(conn_id, now);
                self.roster.send_to(conn_id, self.all_tickets());
            }
            RelayEvent::RequestUsers { conn_id } => {
                self.sessions.touch(conn_id, now);
                self.roster.send_to(conn_id, self.nearby_users());
            }
            RelayEvent::Close { conn_id } => self.close(conn_id),
            RelayEvent::Status { reply } => self.report_status(reply),
        }
    }

    fn nearby_users(&self) -> Outbound {
        Outbound::NearbyUsers(Arc::new(self.sessions.snapshot()))
    }

    fn all_tickets(&self) -> Outbound {
        Outbound::AllTickets(Arc::new(self.tickets.all()))
    }

    fn reject(&self, conn_id: ConnId, err: RelayError) {
        self.roster.send_to(
            conn_id,
            Outbound::Error {
                message: err.message().to_string(),
            },
        );
    }

    fn open(
        &mut self,
        conn_id: ConnId,
        outbound: mpsc::Sender<Outbound>,
        shutdown: Arc<Notify>,
        now: Instant,
    ) {
        self.roster.insert(conn_id, ConnHandle { outbound, shutdown });
        self.sessions.open(conn_id, now);
        // Catch-up push: exactly once per connection, queued before any
        // other event from this connection can be processed (the transport
        // sends Open over the same channel as everything that follows). A
        // fresh session has no coordinates and cannot change the snapshot,
        // so nothing is broadcast to the rest of the room.
        self.roster.send_to(conn_id, Outbound::Identity { conn_id });
        self.roster.send_to(conn_id, self.nearby_users());
        self.roster.send_to(conn_id, self.all_tickets());
        info!(conn_id, "connection opened");
    }

    fn location_update(&mut self, conn_id: ConnId, payload: LocationPayload, now: Instant) {
        let update = match validate_location(payload) {
            Ok(update) => update,
            Err(err) => return self.reject(conn_id, err),
        };
        if !self.sessions.update_location(conn_id, update, now) {
            // The transport should never deliver messages for an unopened
            // connection; tolerate it rather than crash.
            warn!(conn_id, "location update for unknown session dropped");
            return;
        }
        self.roster.broadcast(&self.nearby_users());
    }

    fn visibility_change(&mut self, conn_id: ConnId, visible: bool, now: Instant) {
        // Silently ignored for unknown connections, per policy.
        if self.sessions.set_visibility(conn_id, visible, now) {
            self.roster.broadcast(&self.nearby_users());
        }
    }

    fn create_ticket(&mut self, conn_id: ConnId, payload: TicketPayload, now: Instant) {
        let ticket = match validate_ticket(payload) {
            Ok(ticket) => ticket,
            Err(err) => return self.reject(conn_id, err),
        };
        if let Err(err) = self.tickets.create(ticket.clone()) {
            return self.reject(conn_id, err);
        }
        self.sessions.touch(conn_id, now);
        info!(conn_id, ticket_id = %ticket.id, "ticket created");
        // Individual push first for incremental UIs, then the full replace.
        self.roster.broadcast(&Outbound::NewTicket(ticket));
        self.roster.broadcast(&self.all_tickets());
    }

    fn update_ticket(&mut self, conn_id: ConnId, payload: TicketUpdatePayload, now: Instant) {
        let (ticket_id, message) = match validate_ticket_update(payload) {
            Ok(update) => update,
            Err(err) => return self.reject(conn_id, err),
        };
        let requester = conn_id.to_string();
        match self.tickets.update(&requester, &ticket_id, message) {
            Ok(ticket) => {
                self.sessions.touch(conn_id, now);
                self.roster.broadcast(&Outbound::TicketUpdated(ticket));
            }
            Err(err) => self.reject(conn_id, err),
        }
    }

    fn close(&mut self, conn_id: ConnId) {
        // The roster entry goes first so the departing connection is not a
        // broadcast recipient. Idempotent: a second close finds nothing and
        // triggers nothing.
        self.roster.remove(conn_id);
        if self.sessions.close(conn_id) {
            self.roster.broadcast(&self.nearby_users());
            info!(conn_id, "connection closed");
        }
    }

    fn sweep(&mut self, now: Instant) {
        let evicted = self.sessions.evict_stale(now, self.settings.stale_after);
        if evicted.is_empty() {
            return;
        }
        for conn_id in &evicted {
            info!(conn_id = *conn_id, "evicting idle connection");
            self.roster.disconnect(*conn_id);
        }
        self.roster.broadcast(&self.nearby_users());
    }

    fn report_status(&self, reply: oneshot::Sender<StatusReport>) {
        let _ = reply.send(StatusReport {
            connections: self.roster.len(),
            sessions: self.sessions.len(),
            tickets: self.tickets.len(),
        });
    }
}
