use crate::room::RoomRegistry;
use crate::signaling::{MessageRouter, SignalingOutput};
use crate::transport::ConnectionTable;
use std::sync::Arc;
use std::time::Duration;
use togetherly_core::{ClientMessage, ConnectionId, ServerMessage};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{info, warn};

struct RelayInner {
    connections: Arc<ConnectionTable>,
    router: MessageRouter,
    shutdown: watch::Sender<bool>,
}

/// Process-wide relay state, cheap to clone into every socket task.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new() -> Self {
        let connections = Arc::new(ConnectionTable::new());
        let registry = Arc::new(RoomRegistry::new());
        let router = MessageRouter::new(registry, connections.clone());
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(RelayInner {
                connections,
                router,
                shutdown,
            }),
        }
    }

    /// Allocates a connection and greets it with its own id.
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let (id, rx) = self.inner.connections.open();

        let welcome = ServerMessage::Welcome {
            user_id: id.clone(),
        };
        self.inner.connections.deliver(&id, welcome).await;

        info!("User connected: {}", id);
        (id, rx)
    }

    pub async fn dispatch(&self, sender: &ConnectionId, message: ClientMessage) {
        if !self.inner.connections.contains(sender) {
            warn!("Ignoring {} from closed connection {}", message.kind(), sender);
            return;
        }
        self.inner.router.dispatch(sender, message).await;
    }

    /// Runs the cleanup pass for `id`.
    ///
    /// Returns `false` if the connection was already gone, so concurrent
    /// callers never clean up twice.
    pub async fn disconnect(&self, id: &ConnectionId) -> bool {
        if !self.inner.connections.close(id) {
            return false;
        }

        self.inner.router.leave_all(id).await;
        info!("User disconnected: {}", id);
        true
    }

    /// Asks every socket task to close. Cleanup happens in the tasks.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.inner.shutdown.subscribe()
    }

    /// Waits until no connection is left or `grace` runs out.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while !self.inner.connections.is_empty() {
            if Instant::now() >= deadline {
                warn!(
                    "{} connections still open after {:?}",
                    self.inner.connections.len(),
                    grace
                );
                return false;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        true
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn registry(&self) -> &RoomRegistry {
        self.inner.router.registry()
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}
