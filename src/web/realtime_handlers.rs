// src/web/realtime_handlers.rs
use crate::{
    error::AppError,
    models::{
        account::Account,
        realtime::{ClientEvent, ServerEvent},
    },
    services::{auth_service, realtime_service::Session},
    state::AppState,
    web::mw_auth::bearer_from_headers,
};
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::Utc;
use futures_util::{stream::SplitStream, SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Frames buffered per connection before deliveries start being dropped.
const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
pub struct SocketQuery {
    token: Option<String>,
}

// GET /api/ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<SocketQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let raw = query
        .token
        .or_else(|| bearer_from_headers(&headers).map(str::to_string))
        .unwrap_or_default();
    let verified = auth_service::verify_credential(&state.store, &state.config.jwt_secret, &raw).await;

    ws.on_upgrade(move |socket| async move {
        match verified {
            Ok(account) => handle_socket(socket, state, account).await,
            Err(e) => reject(socket, e).await,
        }
    })
}

/// `auth_error` with the reason, then a policy close.
fn rejection_frames(error: &AppError) -> Vec<Message> {
    let mut frames = Vec::with_capacity(2);
    let event = ServerEvent::AuthError { message: error.parts().2 };
    match event.to_frame() {
        Ok(frame) => frames.push(Message::Text(frame.into())),
        Err(e) => tracing::error!("Failed to encode auth_error: {:?}", e),
    }
    frames.push(Message::Close(Some(CloseFrame {
        code: close_code::POLICY,
        reason: "authentication failed".into(),
    })));
    frames
}

/// Tells the client why and closes. The only path that closes a socket server-side.
async fn reject(mut socket: WebSocket, error: AppError) {
    tracing::warn!("🔌 WS handshake rejected: {}", error);
    for frame in rejection_frames(&error) {
        if socket.send(frame).await.is_err() {
            break;
        }
    }
}

/// Applies client events until the socket closes or errors.
async fn read_events(receiver: &mut SplitStream<WebSocket>, session: &mut Session, state: &AppState) {
    let conn_id = session.conn_id;
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    let out = session.handle(event, Utc::now());
                    state.hub.apply(conn_id, out).await;
                }
                Err(e) => {
                    tracing::warn!("Unreadable WS event from {}: {}", conn_id, e);
                }
            },
            Message::Close(_) => {
                tracing::debug!("WS {} sent close", conn_id);
                break;
            }
            _ => tracing::trace!("Ignoring non-text WS frame from {}", conn_id),
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState, account: Account) {
    let conn_id = Uuid::new_v4();
    tracing::info!("🔌 WS connected: {} (account {})", conn_id, account.id);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);
    state.hub.register(conn_id, tx).await;

    let mut session = Session::new(conn_id, account);
    let out = session.connect(Utc::now());
    state.hub.apply(conn_id, out).await;

    // --- Writer: drains the outbound channel into the socket ---
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::debug!("WS write failed for {}, stopping writer", conn_id);
                break;
            }
        }
    });

    // --- Reader: runs here so the session stays owned by this task ---
    tokio::select! {
        _ = (&mut send_task) => tracing::debug!("WS writer for {} ended first", conn_id),
        _ = read_events(&mut ws_receiver, &mut session, &state) => send_task.abort(),
    };

    let out = session.disconnect(Utc::now());
    state.hub.apply(conn_id, out).await;
    state.hub.unregister(conn_id).await;
    tracing::info!("🔌 WS closed: {}", conn_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_handshake_sends_auth_error_then_policy_close() {
        let frames = rejection_frames(&AppError::ExpiredCredential);
        assert_eq!(frames.len(), 2);

        let Message::Text(text) = &frames[0] else {
            panic!("expected a text frame, got {:?}", frames[0]);
        };
        let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(value["event"], "auth_error");
        assert_eq!(value["data"]["message"], "Token has expired");

        let Message::Close(Some(close)) = &frames[1] else {
            panic!("expected a close frame, got {:?}", frames[1]);
        };
        assert_eq!(close.code, close_code::POLICY);
    }
}
