use crate::model::connection::ConnectionId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages a client sends to the relay.
///
/// Negotiation payloads (`sdp`, `candidate`) are kept as raw JSON values and
/// forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom(RoomId),
    Offer {
        target: ConnectionId,
        sdp: Value,
    },
    Answer {
        target: ConnectionId,
        sdp: Value,
    },
    IceCandidate {
        target: ConnectionId,
        candidate: Value,
    },
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    Welcome {
        #[serde(rename = "userId")]
        user_id: ConnectionId,
    },
    UserJoined(ConnectionId),
    UserLeft(ConnectionId),
    Offer {
        sender: ConnectionId,
        sdp: Value,
    },
    Answer {
        sender: ConnectionId,
        sdp: Value,
    },
    IceCandidate {
        sender: ConnectionId,
        candidate: Value,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::JoinRoom(_) => "join-room",
            ClientMessage::Offer { .. } => "offer",
            ClientMessage::Answer { .. } => "answer",
            ClientMessage::IceCandidate { .. } => "ice-candidate",
        }
    }
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::UserJoined(_) => "user-joined",
            ServerMessage::UserLeft(_) => "user-left",
            ServerMessage::Offer { .. } => "offer",
            ServerMessage::Answer { .. } => "answer",
            ServerMessage::IceCandidate { .. } => "ice-candidate",
        }
    }
}
