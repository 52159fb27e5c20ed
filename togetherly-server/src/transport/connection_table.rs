use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use togetherly_core::{ConnectionId, ServerMessage};
use tokio::sync::mpsc;
use tracing::debug;

pub type Mailbox = mpsc::UnboundedSender<ServerMessage>;

/// Live connections and their outbound mailboxes.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    mailboxes: DashMap<ConnectionId, Mailbox>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection under a fresh id.
    pub fn open(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        loop {
            let id = ConnectionId::new();
            if let Entry::Vacant(slot) = self.mailboxes.entry(id.clone()) {
                slot.insert(tx);
                return (id, rx);
            }
        }
    }

    /// Removes a connection. Only the first call for a given id returns `true`.
    pub fn close(&self, id: &ConnectionId) -> bool {
        self.mailboxes.remove(id).is_some()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.mailboxes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }
}

#[async_trait]
impl SignalingOutput for ConnectionTable {
    async fn deliver(&self, target: &ConnectionId, message: ServerMessage) -> bool {
        let Some(mailbox) = self.mailboxes.get(target) else {
            debug!("Dropping {} for disconnected user {}", message.kind(), target);
            return false;
        };

        if let Err(e) = mailbox.send(message) {
            debug!("Mailbox of {} already closed, dropping {}", target, e.0.kind());
            return false;
        }
        true
    }
}
