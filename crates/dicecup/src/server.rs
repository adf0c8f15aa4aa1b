//! `ObserverServer` builder and accept loop.
//!
//! The observer server is the live half of the system: browsers open a
//! WebSocket on `/{session_id}/ws` and receive every event of that session
//! as a JSON text frame until they disconnect.

use std::sync::Arc;
use std::time::Duration;

use dicecup_game::{DiceRoller, RandomRoller, ScoringPolicy, ScoringTable};
use dicecup_protocol::JsonCodec;
use dicecup_store::{InMemoryStore, SessionStore};
use dicecup_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{DicecupError, SessionController};

/// Keepalive and size limits for observer connections.
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// How often the server pings an idle observer.
    pub ping_interval: Duration,
    /// How long the server waits for any frame (usually a pong) before
    /// dropping the observer. Must exceed `ping_interval`.
    pub pong_wait: Duration,
    /// Largest frame an observer may send, in bytes. Observers only listen,
    /// so anything bigger ends the connection.
    pub max_message_size: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(30);
        Self {
            ping_interval: pong_wait * 8 / 10,
            pong_wait,
            max_message_size: 512,
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S, P, R> {
    pub(crate) controller: Arc<SessionController<S, P, R>>,
    pub(crate) config: ObserverConfig,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting an observer server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use dicecup::prelude::*;
///
/// # async fn start() -> Result<(), DicecupError> {
/// let controller = Arc::new(SessionController::new());
/// let server = ObserverServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(Arc::clone(&controller))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ObserverServerBuilder {
    bind_addr: String,
    observer_config: ObserverConfig,
}

impl ObserverServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            observer_config: ObserverConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets keepalive and size limits.
    pub fn observer_config(mut self, config: ObserverConfig) -> Self {
        self.observer_config = config;
        self
    }

    /// Binds the listener. Observers subscribe through `controller`.
    pub async fn build<S, P, R>(
        self,
        controller: Arc<SessionController<S, P, R>>,
    ) -> Result<ObserverServer<S, P, R>, DicecupError>
    where
        S: SessionStore,
        P: ScoringPolicy,
        R: DiceRoller,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_max_message_size(self.observer_config.max_message_size);
        let state = Arc::new(ServerState {
            controller,
            config: self.observer_config,
            codec: JsonCodec,
        });
        Ok(ObserverServer { transport, state })
    }
}

impl Default for ObserverServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound observer server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ObserverServer<S = InMemoryStore, P = ScoringTable, R = RandomRoller> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, P, R>>,
}

impl ObserverServer {
    /// Creates a new builder.
    pub fn builder() -> ObserverServerBuilder {
        ObserverServerBuilder::new()
    }
}

impl<S, P, R> ObserverServer<S, P, R>
where
    S: SessionStore,
    P: ScoringPolicy,
    R: DiceRoller,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Spawns one handler task per observer. Runs until the process is
    /// terminated or the task is aborted.
    pub async fn run(mut self) -> Result<(), DicecupError> {
        tracing::info!(addr = ?self.local_addr().ok(), "observer server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "observer connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
