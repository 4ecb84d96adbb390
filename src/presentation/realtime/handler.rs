//! Realtime Connection Handler
//!
//! Per-connection WebSocket lifecycle: authenticate the first frame,
//! register with the hub, pump events both ways, clean up on disconnect.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, Stream, StreamExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use super::events::{ClientEvent, ServerEvent};
use super::hub::{ConnectionId, Hub};
use super::router::ChatRouter;
use crate::domain::{UserIdentity, UserRepository};
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::{
    PgCommunityRepository, PgMessageRepository, PgNotificationRepository, PgUserRepository,
};
use crate::shared::error::AppError;
use crate::startup::AppState;

/// JWT claims for token validation
#[derive(Debug, serde::Deserialize)]
struct Claims {
    sub: String,
    #[allow(dead_code)]
    exp: usize,
}

/// WebSocket upgrade handler
pub async fn realtime_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let max_message_size = state.settings.realtime.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id: ConnectionId = Uuid::new_v4();

    tracing::debug!(connection_id = %connection_id, "New realtime connection");

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing events; the hub holds the tx side once registered
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // Forward events from the channel to the WebSocket
    let sender_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!("Failed to serialize event: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // The first frame must be an authenticate event, within the deadline.
    // Failure refuses the connection before any registration happens.
    let auth_deadline = state.settings.realtime.auth_timeout();
    let token = match timeout(auth_deadline, wait_for_first_event(&mut receiver)).await {
        Ok(FirstFrame::Token(token)) => token,
        Ok(FirstFrame::NotAuthenticate) => {
            tracing::debug!(connection_id = %connection_id, "First event was not authenticate");
            let _ = tx.send(ServerEvent::error("Authentication required"));
            close_soon(sender_task).await;
            return;
        }
        Ok(FirstFrame::Closed) => {
            tracing::debug!(connection_id = %connection_id, "Connection closed before authenticate");
            sender_task.abort();
            return;
        }
        Err(_) => {
            tracing::debug!(connection_id = %connection_id, "Authenticate deadline expired");
            let _ = tx.send(ServerEvent::error("Authentication required"));
            close_soon(sender_task).await;
            return;
        }
    };

    let identity = match authenticate(&token, &state).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Connection refused");
            let _ = tx.send(ServerEvent::error("Invalid token"));
            close_soon(sender_task).await;
            return;
        }
    };

    let user_id = identity.id;

    // Register with the hub: presence broadcast + roster snapshot happen here
    state.hub.register(identity.clone(), connection_id, tx.clone());
    metrics::set_realtime_connections(state.hub.session_count());

    // Durable presence flag; best-effort, never fatal for the connection
    let user_repo = PgUserRepository::new(state.db.clone());
    if let Err(e) = user_repo.set_presence(user_id, true).await {
        tracing::warn!(user_id, error = %e, "Failed to persist online flag");
    }

    tracing::info!(
        user_id,
        name = %identity.name,
        connection_id = %connection_id,
        "User connected"
    );

    let router = ChatRouter::new(
        state.hub.clone(),
        Arc::new(PgMessageRepository::new(state.db.clone())),
        Arc::new(PgNotificationRepository::new(state.db.clone())),
        Arc::new(PgCommunityRepository::new(state.db.clone())),
        state.settings.realtime.store_timeout(),
    );

    // Main event loop
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let event = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "Malformed event");
                        continue;
                    }
                };
                dispatch_event(event, connection_id, &identity, &router, &tx).await;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Connection closed");
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by axum
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    // Cleanup
    state.hub.deregister(connection_id);
    metrics::set_realtime_connections(state.hub.session_count());

    clear_presence_if_offline(&state.hub, &user_repo, user_id).await;

    sender_task.abort();

    tracing::info!(user_id, connection_id = %connection_id, "User disconnected");
}

/// Dispatch one inbound client event. Store failures are reported back to
/// the originating connection only; the loop and the process keep running.
async fn dispatch_event<M, N, C>(
    event: ClientEvent,
    connection_id: ConnectionId,
    identity: &UserIdentity,
    router: &ChatRouter<M, N, C>,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) where
    M: crate::domain::MessageRepository,
    N: crate::domain::NotificationRepository,
    C: crate::domain::CommunityRepository,
{
    match event {
        ClientEvent::Authenticate(_) => {
            tracing::debug!(connection_id = %connection_id, "Duplicate authenticate ignored");
        }
        ClientEvent::JoinCommunity(payload) => {
            match router
                .join_community(connection_id, identity.id, payload.community_id)
                .await
            {
                Ok(()) => {}
                Err(AppError::Forbidden(_)) => {
                    let _ = tx.send(ServerEvent::error("Not a member of this community"));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "join_community failed");
                    let _ = tx.send(ServerEvent::error("Failed to join community"));
                }
            }
        }
        ClientEvent::LeaveCommunity(payload) => {
            router.leave_community(connection_id, payload.community_id);
        }
        ClientEvent::SendMessage(payload) => {
            if let Err(e) = router.send_message(connection_id, identity, payload).await {
                tracing::warn!(user_id = identity.id, error = %e, "send_message failed");
                // Store failures stay generic; the caller's own mistakes
                // (validation) are reported verbatim.
                let report = if e.is_store_failure() {
                    "Failed to send message".to_string()
                } else {
                    e.to_string()
                };
                let _ = tx.send(ServerEvent::error(report));
            }
        }
        ClientEvent::Typing(payload) => {
            router.relay_typing(connection_id, identity, payload);
        }
        ClientEvent::MarkRead(payload) => {
            if let Err(e) = router.mark_read(identity.id, payload.message_id).await {
                tracing::debug!(user_id = identity.id, error = %e, "mark_read failed");
            }
        }
    }
}

/// Outcome of waiting for the connection's first event.
#[derive(Debug)]
enum FirstFrame {
    /// An `authenticate` event carrying the bearer token.
    Token(String),
    /// A well-formed event other than `authenticate`; the connection is
    /// refused rather than waiting out the deadline.
    NotAuthenticate,
    /// The socket closed or errored before any event arrived.
    Closed,
}

/// Read frames until the first well-formed client event. Malformed text and
/// control frames are skipped; anything parseable decides the outcome.
async fn wait_for_first_event<S>(receiver: &mut S) -> FirstFrame
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Authenticate(payload)) => return FirstFrame::Token(payload.token),
                Ok(_) => return FirstFrame::NotAuthenticate,
                Err(_) => continue,
            },
            Ok(Message::Close(_)) => return FirstFrame::Closed,
            Err(_) => return FirstFrame::Closed,
            _ => continue,
        }
    }
    FirstFrame::Closed
}

/// Verify the bearer token's signature and expiry, returning the subject
/// user id.
fn verify_token(token: &str, secret: &str) -> Result<i64, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthorized("Invalid token claims".into()))
}

/// Look up the minimal identity for a verified user id, bounded by the
/// store-call deadline. An unknown user is an authentication failure.
async fn resolve_identity<U: UserRepository>(
    user_repo: &U,
    user_id: i64,
    limit: std::time::Duration,
) -> Result<UserIdentity, AppError> {
    tokio::time::timeout(limit, user_repo.find_identity(user_id))
        .await
        .map_err(|_| AppError::StoreUnavailable("identity lookup timed out".into()))??
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))
}

/// Verify the bearer token and resolve the minimal identity.
async fn authenticate(token: &str, state: &AppState) -> Result<UserIdentity, AppError> {
    let user_id = verify_token(token, &state.settings.jwt.secret)?;
    let user_repo = PgUserRepository::new(state.db.clone());
    resolve_identity(&user_repo, user_id, state.settings.realtime.store_timeout()).await
}

/// Clear the durable presence flag unless the user is still reachable.
///
/// After a reconnect the evicted socket's cleanup runs while the newer
/// connection is registered; writing `is_online = false` then would
/// contradict the registry. Best-effort: a store failure is logged, never
/// fatal.
async fn clear_presence_if_offline<U: UserRepository>(hub: &Hub, user_repo: &U, user_id: i64) {
    if hub.is_online(user_id) {
        tracing::debug!(user_id, "User still connected, online flag kept");
        return;
    }
    if let Err(e) = user_repo.set_presence(user_id, false).await {
        tracing::warn!(user_id, error = %e, "Failed to persist offline flag");
    }
}

/// Give the error event a moment to flush before tearing the socket down.
async fn close_soon(sender_task: tokio::task::JoinHandle<()>) {
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    sender_task.abort();
}
