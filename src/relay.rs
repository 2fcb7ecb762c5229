// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Websocket relay mode.
//!
//! When the upstream target uses a `ws`/`wss` scheme, the proxy exposes a
//! websocket listener instead of the HTTP pipeline and forwards every
//! message verbatim in both directions. No caching, no retry, no
//! transformation. Each client connection is paired with its own upstream
//! connection; either side closing tears down both.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message as UpstreamMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::RelayError;

use std::sync::Arc;

/// Builds the websocket-mode router over the upstream URL
pub fn router(upstream: Url) -> Router {
    Router::new()
        .route("/", get(ws_upgrade))
        .with_state(Arc::new(upstream))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(upstream): State<Arc<Url>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| relay_connection(socket, upstream))
}

async fn connect_upstream(
    upstream: &Url,
) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>, RelayError> {
    let (stream, _) = connect_async(upstream.as_str())
        .await
        .map_err(|e| RelayError::upstream_connect(upstream.as_str(), e))?;
    Ok(stream)
}

async fn relay_connection(client: WebSocket, upstream: Arc<Url>) {
    let stream = match connect_upstream(&upstream).await {
        Ok(stream) => stream,
        Err(failure) => {
            error!(error = %failure, "dropping client, upstream connect failed");
            return;
        }
    };
    info!(upstream = %upstream, "relaying websocket connection");

    let (mut upstream_tx, mut upstream_rx) = stream.split();
    let (mut client_tx, mut client_rx) = client.split();

    let client_to_upstream = async {
        while let Some(Ok(message)) = client_rx.next().await {
            let Some(message) = to_upstream_message(message) else {
                break;
            };
            if upstream_tx.send(message).await.is_err() {
                break;
            }
        }
    };

    let upstream_to_client = async {
        while let Some(Ok(message)) = upstream_rx.next().await {
            let Some(message) = to_client_message(message) else {
                break;
            };
            if client_tx.send(message).await.is_err() {
                break;
            }
        }
    };

    // Whichever side closes first tears the pair down
    tokio::select! {
        _ = client_to_upstream => debug!("client side closed"),
        _ = upstream_to_client => debug!("upstream side closed"),
    }
}

/// Maps a client frame onto the upstream connection, verbatim.
///
/// `None` signals a close frame; the relay tears the pair down rather than
/// forwarding it.
fn to_upstream_message(message: Message) -> Option<UpstreamMessage> {
    match message {
        Message::Text(text) => Some(UpstreamMessage::Text(text)),
        Message::Binary(bytes) => Some(UpstreamMessage::Binary(bytes)),
        Message::Ping(bytes) => Some(UpstreamMessage::Ping(bytes)),
        Message::Pong(bytes) => Some(UpstreamMessage::Pong(bytes)),
        Message::Close(_) => None,
    }
}

/// Maps an upstream frame back onto the client connection, verbatim.
fn to_client_message(message: UpstreamMessage) -> Option<Message> {
    match message {
        UpstreamMessage::Text(text) => Some(Message::Text(text)),
        UpstreamMessage::Binary(bytes) => Some(Message::Binary(bytes)),
        UpstreamMessage::Ping(bytes) => Some(Message::Ping(bytes)),
        UpstreamMessage::Pong(bytes) => Some(Message::Pong(bytes)),
        UpstreamMessage::Close(_) | UpstreamMessage::Frame(_) => None,
    }
}
