//! Per-observer connection handler.

use std::sync::Arc;

use dicecup_events::{EventBus, Subscription};
use dicecup_game::{DiceRoller, ScoringPolicy};
use dicecup_protocol::{Codec, JsonCodec, ObserverId, ProtocolError, SessionId};
use dicecup_store::SessionStore;
use dicecup_transport::{Connection, Incoming, TransportError, WebSocketConnection};
use tokio::time::{Instant, interval_at, timeout};

use crate::server::{ObserverConfig, ServerState};
use crate::DicecupError;

/// RAII guard that removes the observer from the bus when the handler
/// exits, on every path (clean close, error, or panic).
struct UnsubscribeGuard {
    session_id: SessionId,
    observer: ObserverId,
    bus: Arc<EventBus>,
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        self.bus.unsubscribe(&self.session_id, self.observer);
    }
}

/// Handles a single observer from accept to close.
pub(crate) async fn handle_connection<S, P, R>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, P, R>>,
) -> Result<(), DicecupError>
where
    S: SessionStore,
    P: ScoringPolicy,
    R: DiceRoller,
{
    let conn_id = conn.id();
    let observer = ObserverId(conn_id.into_inner());

    let Some(session_id) = session_id_from_path(conn.path()) else {
        tracing::debug!(%conn_id, path = conn.path(), "no session id in path");
        let _ = conn.close().await;
        return Ok(());
    };

    let subscription = match state.controller.subscribe(&session_id, observer).await {
        Ok(subscription) => subscription,
        Err(e) => {
            tracing::debug!(%session_id, %observer, error = %e, "observer rejected");
            let _ = conn.close().await;
            return Err(e);
        }
    };
    let _guard = UnsubscribeGuard {
        session_id: session_id.clone(),
        observer,
        bus: Arc::clone(state.controller.bus()),
    };
    tracing::info!(%session_id, %observer, peer = %conn.peer_addr(), "observer connected");

    // Whichever side finishes first drops the other.
    let reason = tokio::select! {
        reason = write_events(&conn, subscription, &state.codec, &state.config) => reason,
        reason = read_frames(&conn, &state.config) => reason,
    };

    let _ = conn.close().await;
    tracing::info!(%session_id, %observer, reason, "observer disconnected");
    Ok(())
}

/// Forwards events as JSON text frames and pings on a fixed interval.
///
/// Returns why it stopped.
async fn write_events(
    conn: &WebSocketConnection,
    mut subscription: Subscription,
    codec: &JsonCodec,
    config: &ObserverConfig,
) -> &'static str {
    let mut ticker = interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    return "dropped by event bus";
                };
                let text = match encode_text(codec, &*event) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(
                            observer = %subscription.observer(),
                            error = %e,
                            "event encode failed"
                        );
                        continue;
                    }
                };
                if let Err(e) = conn.send_text(&text).await {
                    tracing::debug!(
                        observer = %subscription.observer(),
                        error = %e,
                        "event write failed"
                    );
                    return "write failed";
                }
                tracing::trace!(
                    observer = %subscription.observer(),
                    seq = event.seq,
                    "event delivered"
                );
            }
            _ = ticker.tick() => {
                if conn.ping().await.is_err() {
                    return "ping failed";
                }
            }
        }
    }
}

/// Drains whatever the observer sends. Any frame, pongs included, pushes
/// the read deadline out by `pong_wait`. The transport rejects frames over
/// `max_message_size` before reading them.
///
/// Returns why it stopped.
async fn read_frames(conn: &WebSocketConnection, config: &ObserverConfig) -> &'static str {
    loop {
        match timeout(config.pong_wait, conn.recv()).await {
            Ok(Ok(Some(Incoming::Heartbeat | Incoming::Data(_)))) => {}
            Ok(Ok(None)) => return "closed by peer",
            Ok(Err(TransportError::MessageTooLarge { size, limit })) => {
                tracing::debug!(conn_id = %conn.id(), size, limit, "observer message too large");
                return "message too large";
            }
            Ok(Err(e)) => {
                tracing::debug!(conn_id = %conn.id(), error = %e, "read failed");
                return "read failed";
            }
            Err(_) => return "pong timeout",
        }
    }
}

fn encode_text<T: serde::Serialize>(codec: &JsonCodec, value: &T) -> Result<String, ProtocolError> {
    let bytes = codec.encode(value)?;
    String::from_utf8(bytes).map_err(|e| ProtocolError::InvalidValue(e.to_string()))
}

/// Extracts the session id from `/{id}/ws` or `/{id}`.
fn session_id_from_path(path: &str) -> Option<SessionId> {
    let trimmed = path.trim_matches('/');
    let raw = trimmed.strip_suffix("/ws").unwrap_or(trimmed);
    SessionId::parse(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // session_id_from_path()
    // =========================================================================

    #[test]
    fn test_session_id_from_path_with_ws_suffix() {
        assert_eq!(session_id_from_path("/ab12/ws"), Some(SessionId::new("ab12")));
    }

    #[test]
    fn test_session_id_from_path_bare() {
        assert_eq!(session_id_from_path("/ab12"), Some(SessionId::new("ab12")));
        assert_eq!(session_id_from_path("/ab12/"), Some(SessionId::new("ab12")));
    }

    #[test]
    fn test_session_id_from_path_rejects_empty_and_nested() {
        assert_eq!(session_id_from_path("/"), None);
        assert_eq!(session_id_from_path("/a/b/ws"), None);
    }

    // =========================================================================
    // encode_text()
    // =========================================================================

    #[test]
    fn test_encode_text_is_json() {
        let text = encode_text(&JsonCodec, &SessionId::new("ab12")).unwrap();
        assert_eq!(text, "\"ab12\"");
    }
}
