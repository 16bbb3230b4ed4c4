//! Websocket gateway pushing live events to a signed-in user

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use crate::error::Result;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GatewayParams {
    pub token: String,
}

/// Authenticate the token, then upgrade
pub async fn gateway(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<GatewayParams>,
) -> Result<Response> {
    let user = state.users.authenticate(&params.token).await?;
    let user_id = user.id;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: u64) {
    tracing::info!("Gateway session opened for user {}", user_id);

    let mut events = state.hub.subscribe();
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(envelope) if envelope.user_id == user_id => {
                    let text = match serde_json::to_string(&envelope.event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!("Failed to serialize live event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Gateway for user {} skipped {} events", user_id, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if sender.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Gateway receive error for user {}: {}", user_id, e);
                    break;
                }
            },
        }
    }

    tracing::info!("Gateway session closed for user {}", user_id);
}
