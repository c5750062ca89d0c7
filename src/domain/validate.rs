// Pure validation of inbound payloads, reusable without any transport.
//
// Validators take the raw payload shape (everything optional, so missing
// fields reach the validator instead of failing mid-parse) and return the
// normalized domain value or the reason for rejection.

use crate::domain::errors::RelayError;
use crate::domain::session::LocationUpdate;
use crate::domain::ticket::Ticket;

/// Raw location payload as received from a client.
#[derive(Debug, Clone, Default)]
pub struct LocationPayload {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Raw ticket payload as received from a client.
#[derive(Debug, Clone, Default)]
pub struct TicketPayload {
    pub id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub message: Option<String>,
    pub creator_id: Option<String>,
    pub creator_name: Option<String>,
}

/// Raw ticket-update payload as received from a client.
#[derive(Debug, Clone, Default)]
pub struct TicketUpdatePayload {
    pub id: Option<String>,
    pub message: Option<String>,
}

fn check_coords(lat: Option<f64>, lng: Option<f64>) -> Result<(f64, f64), RelayError> {
    let lat = lat.ok_or(RelayError::InvalidInput("lat is required"))?;
    let lng = lng.ok_or(RelayError::InvalidInput("lng is required"))?;
    // NaN fails the range checks as well, but reject it explicitly.
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(RelayError::InvalidInput("lat out of range"));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(RelayError::InvalidInput("lng out of range"));
    }
    Ok((lat, lng))
}

fn non_empty(value: Option<String>, reason: &'static str) -> Result<String, RelayError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(RelayError::InvalidInput(reason)),
    }
}

/// A location payload is valid iff both coordinates are finite and in range
/// and the role is a non-empty string. Name and image stay optional.
pub fn validate_location(payload: LocationPayload) -> Result<LocationUpdate, RelayError> {
    let (lat, lng) = check_coords(payload.lat, payload.lng)?;
    let role = non_empty(payload.role, "role is required")?;
    Ok(LocationUpdate {
        lat,
        lng,
        role,
        name: payload.name,
        image: payload.image,
    })
}

/// A ticket payload is valid iff every string field is non-empty and the
/// coordinates pass the same checks as location updates.
pub fn validate_ticket(payload: TicketPayload) -> Result<Ticket, RelayError> {
    let (lat, lng) = check_coords(payload.lat, payload.lng)?;
    let id = non_empty(payload.id, "id is required")?;
    let message = non_empty(payload.message, "message is required")?;
    let creator_id = non_empty(payload.creator_id, "creatorId is required")?;
    let creator_name = non_empty(payload.creator_name, "creatorName is required")?;
    Ok(Ticket {
        id,
        lat,
        lng,
        message,
        creator_id,
        creator_name,
    })
}

/// A ticket update is valid iff both the target id and the replacement
/// message are non-empty.
pub fn validate_ticket_update(
    payload: TicketUpdatePayload,
) -> Result<(String, String), RelayError> {
    let id = non_empty(payload.id, "id is required")?;
    let message = non_empty(payload.message, "message is required")?;
    Ok((id, message))
}
