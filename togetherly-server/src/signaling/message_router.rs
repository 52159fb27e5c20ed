use crate::room::RoomRegistry;
use crate::signaling::SignalingOutput;
use std::sync::Arc;
use togetherly_core::{ClientMessage, ConnectionId, RoomId, ServerMessage};
use tracing::{debug, info};

/// Applies the signaling protocol to inbound messages.
///
/// `join-room` and disconnects fan out to the rest of the room. Negotiation
/// messages are unicast to whatever target the client names: no shared-room
/// check is made, and the sender does not need to have joined anything.
#[derive(Clone)]
pub struct MessageRouter {
    registry: Arc<RoomRegistry>,
    output: Arc<dyn SignalingOutput>,
}

impl MessageRouter {
    pub fn new(registry: Arc<RoomRegistry>, output: Arc<dyn SignalingOutput>) -> Self {
        Self { registry, output }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub async fn dispatch(&self, sender: &ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::JoinRoom(room_id) => self.join_room(sender, room_id).await,

            ClientMessage::Offer { target, sdp } => {
                let msg = ServerMessage::Offer {
                    sender: sender.clone(),
                    sdp,
                };
                self.unicast(sender, &target, msg).await;
            }

            ClientMessage::Answer { target, sdp } => {
                let msg = ServerMessage::Answer {
                    sender: sender.clone(),
                    sdp,
                };
                self.unicast(sender, &target, msg).await;
            }

            ClientMessage::IceCandidate { target, candidate } => {
                // Only candidates are guarded; offers and answers may loop back.
                if &target == sender {
                    debug!("Dropping self-addressed ICE candidate from {}", sender);
                    return;
                }
                let msg = ServerMessage::IceCandidate {
                    sender: sender.clone(),
                    candidate,
                };
                self.unicast(sender, &target, msg).await;
            }
        }
    }

    /// Removes `connection_id` from every room it joined, telling the
    /// remaining members.
    pub async fn leave_all(&self, connection_id: &ConnectionId) {
        for room_id in self.registry.rooms_of(connection_id) {
            let Some(remaining) = self.registry.leave(&room_id, connection_id) else {
                continue;
            };
            let notified = self
                .broadcast(remaining, ServerMessage::UserLeft(connection_id.clone()))
                .await;
            info!(
                "User {} left room '{}' ({} notified)",
                connection_id, room_id, notified
            );
        }
    }

    async fn join_room(&self, sender: &ConnectionId, room_id: RoomId) {
        let Some(existing) = self.registry.join(&room_id, sender) else {
            debug!("User {} is already in room '{}'", sender, room_id);
            return;
        };

        let notified = self
            .broadcast(existing, ServerMessage::UserJoined(sender.clone()))
            .await;
        info!(
            "User {} joined room '{}' ({} notified)",
            sender, room_id, notified
        );
    }

    /// Sends `message` to a membership snapshot taken by the registry.
    async fn broadcast(&self, recipients: Vec<ConnectionId>, message: ServerMessage) -> usize {
        let mut delivered = 0;
        for member in recipients {
            if self.output.deliver(&member, message.clone()).await {
                delivered += 1;
            }
        }
        delivered
    }

    async fn unicast(&self, sender: &ConnectionId, target: &ConnectionId, message: ServerMessage) {
        let kind = message.kind();
        if self.output.deliver(target, message).await {
            debug!("Relayed {} from {} to {}", kind, sender, target);
        } else {
            debug!("Dropped {} from {}: {} is not connected", kind, sender, target);
        }
    }
}
