// Ticket entities and the id-keyed ticket store.

use crate::domain::errors::RelayError;
use std::collections::HashMap;

/// A location-pinned help request. Creator fields are captured at creation
/// time and never follow later session changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub message: String,
    pub creator_id: String,
    pub creator_name: String,
}

/// Ticket records keyed by caller-supplied id. Tickets are never implicitly
/// deleted; the store lives for the server process lifetime and outlives the
/// sessions that created its entries.
#[derive(Debug, Default)]
pub struct TicketStore {
    tickets: HashMap<String, Ticket>,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a validated ticket. Duplicate ids are rejected so an id can
    /// never refer to two different requests.
    pub fn create(&mut self, ticket: Ticket) -> Result<(), RelayError> {
        if self.tickets.contains_key(&ticket.id) {
            return Err(RelayError::InvalidInput("duplicate ticket id"));
        }
        self.tickets.insert(ticket.id.clone(), ticket);
        Ok(())
    }

    /// Overwrites the message when the requester is the creator. Returns the
    /// updated ticket for notification.
    pub fn update(
        &mut self,
        requester_id: &str,
        ticket_id: &str,
        message: String,
    ) -> Result<Ticket, RelayError> {
        let ticket = self.tickets.get_mut(ticket_id).ok_or(RelayError::NotFound)?;
        if ticket.creator_id != requester_id {
            return Err(RelayError::Unauthorized);
        }
        ticket.message = message;
        Ok(ticket.clone())
    }

    /// The full, unfiltered ticket set. Tickets are public once created.
    /// Ordering is unspecified.
    pub fn all(&self) -> Vec<Ticket> {
        self.tickets.values().cloned().collect()
    }

    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.get(ticket_id)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
