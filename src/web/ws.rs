//! WebSocket push stream for the render surface.
//!
//! After the upgrade the connection subscribes to the update bus and
//! forwards every event as a JSON text frame. The render surface is
//! read-only, so inbound frames other than Close are ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::broadcast;

use super::AppState;

/// Bound on a single outbound send so a hung peer cannot wedge the fan-out.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP handler that upgrades the connection to WebSocket.
pub async fn handle_events(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Manage a single subscriber connection after upgrade.
async fn handle_socket(socket: WebSocket, state: AppState) {
    tracing::info!("Events: Subscriber connected");

    let mut rx = state.bus.subscribe();
    let (mut sink, mut stream) = socket.split();

    // Sender task: forward bus events to the WebSocket sink.
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let msg = Message::Text(event.to_json().into());
                    match tokio::time::timeout(SEND_TIMEOUT, sink.send(msg)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) => break, // sink closed
                        Err(_) => {
                            tracing::warn!("Events: Send timed out, dropping subscriber");
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    // A slow subscriber recovers by re-reading a snapshot.
                    tracing::warn!("Events: Subscriber lagged by {} event(s)", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Receiver loop: drain inbound frames until the peer disconnects.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Events: Receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    tracing::info!("Events: Subscriber disconnected");
}
