use async_trait::async_trait;
use togetherly_core::{ConnectionId, ServerMessage};

/// Outbound side of the relay: hands a message to a connection's mailbox.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue `message` for `target`.
    ///
    /// Returns `false` when `target` has no live connection. The message is
    /// dropped in that case; callers never retry.
    async fn deliver(&self, target: &ConnectionId, message: ServerMessage) -> bool;
}
