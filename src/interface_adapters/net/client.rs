use crate::domain::{ConnId, TicketUpdatePayload};
use crate::frameworks::config;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{Outbound, RelayEvent};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures_util::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Notify, mpsc};
use tracing::{Instrument, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    EventsClosed,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let event_tx = state.event_tx.clone();
    // Separate connection id for correlating logs across the connection
    // lifetime; assigned here so the span covers the whole socket task.
    let conn_id = rand_id();
    let span = info_span!("conn", conn_id);
    ws.on_upgrade(move |socket| handle_socket(socket, event_tx, conn_id).instrument(span))
}

async fn handle_socket(mut socket: WebSocket, event_tx: mpsc::Sender<RelayEvent>, conn_id: ConnId) {
    let (outbound_tx, outbound_rx) = mpsc::channel(config::OUTBOUND_CHANNEL_CAPACITY);
    let shutdown = Arc::new(Notify::new());

    // Register with the relay before reading anything from the socket, so
    // the catch-up push is queued ahead of every message this client sends.
    if event_tx
        .send(RelayEvent::Open {
            conn_id,
            outbound: outbound_tx,
            shutdown: shutdown.clone(),
        })
        .await
        .is_err()
    {
        error!("relay unavailable; rejecting connection");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::ERROR,
                reason: "server unavailable".into(),
            })))
            .await;
        let _ = socket.close().await;
        return;
    }

    info!("client connected");

    let mut ctx = ConnCtx {
        conn_id,
        event_tx,
        outbound_rx,
        shutdown,

        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,

        invalid_json: 0,
        last_invalid_msg_log: Instant::now() - LOG_THROTTLE,

        close_frame: None,
    };

    if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

struct ConnCtx {
    pub conn_id: ConnId,
    pub event_tx: mpsc::Sender<RelayEvent>,
    // Queue the relay task pushes server messages into.
    pub outbound_rx: mpsc::Receiver<Outbound>,
    // Signalled by the relay when this connection is being evicted.
    pub shutdown: Arc<Notify>,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,
    pub last_invalid_msg_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

fn to_event(conn_id: ConnId, msg: ClientMessage) -> RelayEvent {
    match msg {
        ClientMessage::LocationUpdate(dto) => RelayEvent::LocationUpdate {
            conn_id,
            payload: dto.into(),
        },
        ClientMessage::VisibilityChange(visible) => RelayEvent::VisibilityChange { conn_id, visible },
        ClientMessage::CreateTicket(dto) => RelayEvent::CreateTicket {
            conn_id,
            payload: dto.into(),
        },
        ClientMessage::UpdateTicket(dto) => RelayEvent::UpdateTicket {
            conn_id,
            payload: TicketUpdatePayload {
                id: dto.id,
                message: dto.message,
            },
        },
        ClientMessage::RequestTickets => RelayEvent::RequestTickets { conn_id },
        ClientMessage::RequestUsers => RelayEvent::RequestUsers { conn_id },
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let conn_id = ctx.conn_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        event_tx,
        outbound_rx,
        shutdown,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_invalid_msg_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    socket,
                    incoming,
                    conn_id,
                    event_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_invalid_msg_log,
                    close_frame,
                ).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Outgoing Server Push
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(outbound) => {
                        match forward_outbound(&outbound, socket, msgs_out, bytes_out).await {
                            LoopControl::Continue => false,
                            LoopControl::Disconnect => true,
                        }
                    }
                    None => {
                        // The relay dropped our handle without signalling;
                        // it is shutting down.
                        debug!(conn_id, "outbound queue closed; disconnecting");
                        true
                    }
                }
            }

            // Eviction signal from the liveness sweep.
            _ = shutdown.notified() => {
                *close_frame = Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "idle timeout".into(),
                });
                info!(conn_id, "connection evicted for inactivity");
                true
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    // Close is idempotent on the relay side, so an eviction that already
    // removed the session makes this a no-op.
    if event_tx.send(RelayEvent::Close { conn_id }).await.is_err() && fatal.is_none() {
        fatal = Some(NetError::EventsClosed);
    }

    debug!(
        conn_id,
        msgs_in = *msgs_in,
        msgs_out = *msgs_out,
        bytes_in = *bytes_in,
        bytes_out = *bytes_out,
        invalid_json = *invalid_json,
        "connection stats"
    );
    info!(conn_id, "client disconnected");

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    conn_id: ConnId,
    event_tx: &mpsc::Sender<RelayEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_invalid_msg_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => forward_event(conn_id, event_tx, to_event(conn_id, client_msg)),
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_msg_log) {
                            warn!(
                                conn_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        // Unparseable frames get an error reply so clients
                        // can surface the problem.
                        let reply = ServerMessage::Error {
                            message: "unrecognized message".to_string(),
                        };
                        if send_message(socket, &reply).await.is_err() {
                            return Ok(LoopControl::Disconnect);
                        }
                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(conn_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(conn_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

fn forward_event(
    conn_id: ConnId,
    event_tx: &mpsc::Sender<RelayEvent>,
    event: RelayEvent,
) -> Result<LoopControl, NetError> {
    match event_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            // Drop-and-log under load; the client can resend.
            warn!(conn_id, "event channel full; dropping message");
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::EventsClosed),
    }
}

async fn forward_outbound(
    outbound: &Outbound,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let msg = ServerMessage::from(outbound);
    match send_message(socket, &msg).await {
        Ok(bytes) => {
            *msgs_out += 1;
            *bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send server message");
            LoopControl::Disconnect
        }
    }
}
