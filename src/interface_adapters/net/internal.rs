use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::state::AppState;
use crate::use_cases::RelayEvent;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    connections: usize,
    sessions: usize,
    tickets: usize,
    uptime_seconds: u64,
}

/// Read-only health counters, answered by the relay task itself so the
/// numbers are a consistent snapshot rather than three racy reads.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (reply_tx, reply_rx) = oneshot::channel();
    if state
        .event_tx
        .send(RelayEvent::Status { reply: reply_tx })
        .await
        .is_err()
    {
        return unavailable();
    }

    match reply_rx.await {
        Ok(report) => (
            StatusCode::OK,
            Json(StatusResponse {
                connections: report.connections,
                sessions: report.sessions,
                tickets: report.tickets,
                uptime_seconds: state.started_at.elapsed().as_secs(),
            }),
        )
            .into_response(),
        Err(_) => unavailable(),
    }
}

fn unavailable() -> axum::response::Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            error: "relay unavailable".to_string(),
        }),
    )
        .into_response()
}
