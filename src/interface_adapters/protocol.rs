// Wire protocol DTOs and conversions for public relay messages.
// Internal service-to-service DTOs should live outside this module.

use crate::domain::{ConnId, LocationPayload, Session, Ticket, TicketPayload};
use crate::use_cases::Outbound;
use serde::{Deserialize, Serialize};

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    // Geolocation push; also re-opts the sender into the snapshot.
    LocationUpdate(LocationUpdateDto),
    // Bare boolean: whether the sender wants to appear in snapshots.
    VisibilityChange(bool),
    CreateTicket(CreateTicketDto),
    UpdateTicket(UpdateTicketDto),
    RequestTickets,
    RequestUsers,
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent once after open.
    Identity { id: String },
    // Full-replace snapshot of broadcast-eligible sessions.
    NearbyUsers(Vec<UserDto>),
    // Full-replace ticket set.
    AllTickets(Vec<TicketDto>),
    NewTicket(TicketDto),
    TicketUpdated(TicketDto),
    Error { message: String },
}

/// Raw location payload. Fields stay optional so missing values reach the
/// validator instead of failing mid-parse.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdateDto {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub role: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl From<LocationUpdateDto> for LocationPayload {
    fn from(dto: LocationUpdateDto) -> Self {
        Self {
            lat: dto.lat,
            lng: dto.lng,
            role: dto.role,
            name: dto.name,
            image: dto.image,
        }
    }
}

/// Raw ticket payload, optional for the same reason as locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketDto {
    pub id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub message: Option<String>,
    pub creator_id: Option<String>,
    pub creator_name: Option<String>,
}

impl From<CreateTicketDto> for TicketPayload {
    fn from(dto: CreateTicketDto) -> Self {
        Self {
            id: dto.id,
            lat: dto.lat,
            lng: dto.lng,
            message: dto.message,
            creator_id: dto.creator_id,
            creator_name: dto.creator_name,
        }
    }
}

/// Message replacement for an existing ticket. The requester is the
/// current connection, never a payload field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketDto {
    pub id: Option<String>,
    pub message: Option<String>,
}

/// One session as it appears in `nearby-users`. The snapshot filter
/// guarantees coordinates are set, so they flatten to plain numbers here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub is_visible: bool,
    pub name: String,
    pub role: String,
    pub image: String,
}

impl From<&Session> for UserDto {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            lat: session.lat.unwrap_or_default(),
            lng: session.lng.unwrap_or_default(),
            is_visible: session.visible,
            name: session.name.clone(),
            role: session.role.clone(),
            image: session.image.clone(),
        }
    }
}

/// Ticket as transmitted in every ticket-bearing message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDto {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub message: String,
    pub creator_id: String,
    pub creator_name: String,
}

impl From<&Ticket> for TicketDto {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            lat: ticket.lat,
            lng: ticket.lng,
            message: ticket.message.clone(),
            creator_id: ticket.creator_id.clone(),
            creator_name: ticket.creator_name.clone(),
        }
    }
}

pub fn identity_message(conn_id: ConnId) -> ServerMessage {
    ServerMessage::Identity {
        id: conn_id.to_string(),
    }
}

impl From<&Outbound> for ServerMessage {
    fn from(outbound: &Outbound) -> Self {
        match outbound {
            Outbound::Identity { conn_id } => identity_message(*conn_id),
            Outbound::NearbyUsers(sessions) => {
                ServerMessage::NearbyUsers(sessions.iter().map(UserDto::from).collect())
            }
            Outbound::AllTickets(tickets) => {
                ServerMessage::AllTickets(tickets.iter().map(TicketDto::from).collect())
            }
            Outbound::NewTicket(ticket) => ServerMessage::NewTicket(TicketDto::from(ticket)),
            Outbound::TicketUpdated(ticket) => {
                ServerMessage::TicketUpdated(TicketDto::from(ticket))
            }
            Outbound::Error { message } => ServerMessage::Error {
                message: message.clone(),
            },
        }
    }
}
