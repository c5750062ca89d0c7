// Domain-level errors for relay operations.

/// Outcome categories for rejected client requests. Rejections are reported
/// to the originating connection only and never mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// Malformed, missing, or out-of-range fields in a payload.
    InvalidInput(&'static str),
    /// Ticket update attempted by a connection that is not the creator.
    Unauthorized,
    /// Ticket update referencing an unknown ticket id.
    NotFound,
}

impl RelayError {
    /// Human-readable message sent back to the originating connection.
    pub fn message(&self) -> &'static str {
        match self {
            RelayError::InvalidInput(reason) => reason,
            RelayError::Unauthorized => "not the ticket creator",
            RelayError::NotFound => "unknown ticket id",
        }
    }
}
