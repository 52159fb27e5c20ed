use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use togetherly_core::{ClientMessage, ConnectionId, RoomId, ServerMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::signal_helpers::{SIGNAL_TIMEOUT_MS, SILENCE_WINDOW_MS};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket client speaking the relay's JSON protocol.
pub struct TestClient {
    pub id: ConnectionId,
    socket: Socket,
}

impl TestClient {
    /// Connect and consume the welcome message.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (mut socket, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .context("WebSocket handshake failed")?;

        let welcome = read_message(&mut socket, SIGNAL_TIMEOUT_MS).await?;
        let user_id = match welcome {
            ServerMessage::Welcome { user_id } => user_id,
            other => bail!("Expected welcome, got {:?}", other),
        };

        Ok(Self {
            id: user_id,
            socket,
        })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::Text(text.to_string().into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn join(&mut self, room: &str) -> Result<()> {
        self.send(&ClientMessage::JoinRoom(RoomId::from(room))).await
    }

    pub async fn offer(&mut self, target: &ConnectionId, sdp: Value) -> Result<()> {
        self.send(&ClientMessage::Offer {
            target: target.clone(),
            sdp,
        })
        .await
    }

    pub async fn answer(&mut self, target: &ConnectionId, sdp: Value) -> Result<()> {
        self.send(&ClientMessage::Answer {
            target: target.clone(),
            sdp,
        })
        .await
    }

    pub async fn ice_candidate(&mut self, target: &ConnectionId, candidate: Value) -> Result<()> {
        self.send(&ClientMessage::IceCandidate {
            target: target.clone(),
            candidate,
        })
        .await
    }

    pub async fn recv(&mut self) -> Result<ServerMessage> {
        read_message(&mut self.socket, SIGNAL_TIMEOUT_MS).await
    }

    /// Fails if any message arrives within the silence window.
    pub async fn expect_silence(&mut self) -> Result<()> {
        match tokio::time::timeout(
            Duration::from_millis(SILENCE_WINDOW_MS),
            self.socket.next(),
        )
        .await
        {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("Unexpected message: {}", text.as_str()),
            Ok(other) => bail!("Unexpected socket activity: {:?}", other),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .context("Failed to close WebSocket")
    }

    /// Wait for the server to end the session.
    pub async fn wait_closed(&mut self) -> Result<()> {
        loop {
            let frame = tokio::time::timeout(
                Duration::from_millis(SIGNAL_TIMEOUT_MS),
                self.socket.next(),
            )
            .await
            .context("Timeout waiting for close")?;
            match frame {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return Ok(()),
                Some(Ok(_)) => continue,
            }
        }
    }
}

async fn read_message(socket: &mut Socket, timeout_ms: u64) -> Result<ServerMessage> {
    loop {
        let frame = tokio::time::timeout(Duration::from_millis(timeout_ms), socket.next())
            .await
            .context("Timeout waiting for message")?;

        match frame {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).context("Invalid ServerMessage");
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(other)) => bail!("Unexpected frame: {:?}", other),
            Some(Err(e)) => return Err(e).context("WebSocket error"),
            None => bail!("Socket closed"),
        }
    }
}
