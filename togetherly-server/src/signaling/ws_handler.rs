use crate::RelayService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use togetherly_core::ClientMessage;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<RelayService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: RelayService) {
    let (connection_id, mut rx) = service.connect().await;
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let mut shutdown = service.shutdown_signal();

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize {} message: {}", msg.kind(), e),
            }
        }
        let _ = sender.close().await;
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();
        let connection_id = connection_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(signal) => service.dispatch(&connection_id, signal).await,
                        Err(e) => warn!("Invalid ClientMessage from {}: {}", connection_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    let recv_finished = tokio::select! {
        _ = &mut send_task => false,
        _ = &mut recv_task => true,
        _ = async { let _ = shutdown.wait_for(|stopping| *stopping).await; } => false,
    };

    send_task.abort();
    if !recv_finished {
        // Cleanup has to see the final membership, so the reader must be gone.
        recv_task.abort();
        let _ = recv_task.await;
    }

    service.disconnect(&connection_id).await;
    info!("WebSocket disconnected: {}", connection_id);
}
