// Session entities and the connection-keyed presence registry.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Transport-assigned connection identifier, stable for the connection
/// lifetime and stringified on the wire.
pub type ConnId = u64;

pub const DEFAULT_NAME: &str = "Anonymous";
pub const DEFAULT_ROLE: &str = "user";

/// Server-side record of one connected client's presence and declared
/// location.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: ConnId,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub visible: bool,
    pub name: String,
    pub role: String,
    pub image: String,
    /// Refreshed on every accepted inbound message; drives staleness
    /// eviction.
    pub last_activity: Instant,
}

impl Session {
    fn new(id: ConnId, now: Instant) -> Self {
        Self {
            id,
            lat: None,
            lng: None,
            visible: true,
            name: DEFAULT_NAME.to_string(),
            role: DEFAULT_ROLE.to_string(),
            image: String::new(),
            last_activity: now,
        }
    }

    /// A session qualifies for broadcast once it is opted in, carries
    /// coordinates, and has a usable name and role. `image` may stay empty:
    /// clients are not required to supply an avatar.
    fn broadcastable(&self) -> bool {
        self.visible
            && self.lat.is_some()
            && self.lng.is_some()
            && !self.name.is_empty()
            && !self.role.is_empty()
    }
}

/// Validated location payload produced by `validate_location`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub lat: f64,
    pub lng: f64,
    pub role: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Live sessions keyed by connection id. Owned exclusively by the relay
/// task, which serializes every mutation and snapshot read.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session with defaults. No-op when one already exists for
    /// the id. Returns whether a session was created.
    pub fn open(&mut self, id: ConnId, now: Instant) -> bool {
        if self.sessions.contains_key(&id) {
            return false;
        }
        self.sessions.insert(id, Session::new(id, now));
        true
    }

    /// Applies a validated location update and opts the session back into
    /// broadcasting. Returns false when the connection has no session
    /// (transport misbehavior; must not crash).
    pub fn update_location(&mut self, id: ConnId, update: LocationUpdate, now: Instant) -> bool {
        let Some(session) = self.sessions.get_mut(&id) else {
            return false;
        };
        session.lat = Some(update.lat);
        session.lng = Some(update.lng);
        session.role = update.role;
        if let Some(name) = update.name {
            session.name = name;
        }
        if let Some(image) = update.image {
            session.image = image;
        }
        session.visible = true;
        session.last_activity = now;
        true
    }

    /// Sets the visibility flag. Returns false (silently, per policy) when
    /// the connection has no session.
    pub fn set_visibility(&mut self, id: ConnId, visible: bool, now: Instant) -> bool {
        let Some(session) = self.sessions.get_mut(&id) else {
            return false;
        };
        session.visible = visible;
        session.last_activity = now;
        true
    }

    /// Refreshes the activity timestamp for an accepted inbound message
    /// that does not otherwise mutate the session.
    pub fn touch(&mut self, id: ConnId, now: Instant) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.last_activity = now;
        }
    }

    /// Removes the session. Idempotent; returns whether one was removed.
    pub fn close(&mut self, id: ConnId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// The sessions currently eligible for broadcast. Ordering is
    /// unspecified and may differ between snapshots.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions
            .values()
            .filter(|session| session.broadcastable())
            .cloned()
            .collect()
    }

    /// Removes every session idle strictly longer than `stale_after` and
    /// returns the evicted connection ids.
    pub fn evict_stale(&mut self, now: Instant, stale_after: Duration) -> Vec<ConnId> {
        let stale: Vec<ConnId> = self
            .sessions
            .values()
            .filter(|session| now.duration_since(session.last_activity) > stale_after)
            .map(|session| session.id)
            .collect();
        for id in &stale {
            self.sessions.remove(id);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
