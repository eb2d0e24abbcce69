//! WebSocket sessions for the focus relay.
//!
//! Every frame a client sends is decoded, turned into its broadcast form
//! (`updateFocus` becomes `focusUpdated`) and forwarded to all other open
//! sessions. The relay keeps no focus state of its own.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use streaming::decode_client;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::hub::Hub;

pub fn router(hub: Arc<Hub>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_upgrade))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(hub)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> Response {
    ws.on_upgrade(move |socket| handle_session(socket, hub))
}

/// Runs one client session until either side closes.
pub async fn handle_session(socket: WebSocket, hub: Arc<Hub>) {
    let session_id = Uuid::new_v4();
    let mut relayed = hub.join();
    let (mut ws_tx, mut ws_rx) = socket.split();

    info!("relay session {session_id} connected ({} open)", hub.sessions());

    let sender_task = tokio::spawn(async move {
        loop {
            match relayed.recv().await {
                Ok(frame) if frame.from == session_id => {}
                Ok(frame) => {
                    if let Err(e) = ws_tx.send(Message::Text(frame.text.to_string())).await {
                        warn!("relay session {session_id}: send failed: {e}");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("relay session {session_id} lagging, skipped {skipped} frames");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("relay session {session_id}: receive error: {e}");
                break;
            }
        };

        match msg {
            Message::Text(text) => relay_frame(&hub, session_id, &text),
            Message::Close(_) => {
                info!("relay session {session_id} closed by client");
                break;
            }
            // Binary frames are not part of the protocol; pings are answered
            // by axum.
            _ => {}
        }
    }

    sender_task.abort();
    info!("relay session {session_id} disconnected");
}

fn relay_frame(hub: &Hub, from: Uuid, text: &str) {
    let msg = match decode_client(text) {
        Ok(m) => m,
        Err(e) => {
            warn!("relay session {from}: ignoring frame: {e}");
            return;
        }
    };

    match hub.publish(from, &msg.into_broadcast()) {
        Ok(reached) => debug!("relayed frame from {from} to {} sessions", reached.saturating_sub(1)),
        Err(e) => error!("failed to encode relay frame: {e}"),
    }
}
