// Domain layer: presence and ticket entities plus pure validation rules.

pub mod errors;
pub mod session;
pub mod ticket;
pub mod validate;

pub use errors::RelayError;
pub use session::{ConnId, LocationUpdate, Session, SessionRegistry};
pub use ticket::{Ticket, TicketStore};
pub use validate::{
    LocationPayload, TicketPayload, TicketUpdatePayload, validate_location, validate_ticket,
    validate_ticket_update,
};
