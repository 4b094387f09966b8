//! Axum router: the `/socket` WebSocket endpoint and `/health`.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use shopchat_turn::Provider;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;

use crate::envelope::{ClientEvent, ServerEvent};
use crate::session::{SessionTransport, ToolHostConnector, TurnHandler};

/// WebSocket endpoint path.
pub const SOCKET_PATH: &str = "/socket";
/// Health endpoint path.
pub const HEALTH_PATH: &str = "/health";

/// Outbound frames buffered per socket before turns wait on the writer.
const OUTBOUND_BUFFER: usize = 64;

/// Build the relay router around a shared turn handler.
pub fn router<P, C>(handler: Arc<TurnHandler<P, C>>) -> Router
where
    P: Provider + 'static,
    C: ToolHostConnector + 'static,
{
    Router::new()
        .route(SOCKET_PATH, get(socket_upgrade::<P, C>))
        .route(HEALTH_PATH, get(health))
        .layer(CorsLayer::permissive())
        .with_state(handler)
}

async fn health() -> &'static str {
    "ok"
}

async fn socket_upgrade<P, C>(
    ws: WebSocketUpgrade,
    State(handler): State<Arc<TurnHandler<P, C>>>,
) -> Response
where
    P: Provider + 'static,
    C: ToolHostConnector + 'static,
{
    ws.on_upgrade(move |socket| serve_socket(socket, handler))
}

/// Drive one connection: a writer task drains the outbound queue while the
/// read loop spawns a task per `user-message`.
async fn serve_socket<P, C>(socket: WebSocket, handler: Arc<TurnHandler<P, C>>)
where
    P: Provider + 'static,
    C: ToolHostConnector + 'static,
{
    tracing::info!("client connected");
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTBOUND_BUFFER);

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match event.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unencodable event");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                tracing::debug!("socket closed, writer stopping");
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "socket read failed");
                break;
            }
        };

        match ClientEvent::decode(text.as_str()) {
            Ok(ClientEvent::UserMessage(message)) => {
                let handler = Arc::clone(&handler);
                let transport = SessionTransport::new(tx.clone());
                tokio::spawn(async move {
                    handler.handle(message, &transport).await;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed frame");
            }
        }
    }

    tracing::info!("client disconnected");
}
