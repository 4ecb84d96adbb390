//! Presence & Messaging Hub
//!
//! In-memory registry of live connections and the broadcast primitives the
//! chat router is built on. Process-scoped and intentionally volatile: after
//! a restart every user is offline until they reconnect. No cross-instance
//! synchronization; horizontal scaling would need an external pub/sub relay.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::{PresencePayload, ServerEvent, UserOfflinePayload};
use crate::domain::UserIdentity;

/// Opaque per-connection handle.
pub type ConnectionId = Uuid;

/// A registered live connection.
///
/// `identity` is a denormalized snapshot taken at connect time.
pub struct ConnectedSession {
    pub user_id: i64,
    pub connection_id: ConnectionId,
    pub identity: UserIdentity,
    sender: mpsc::UnboundedSender<ServerEvent>,
    /// Community broadcast groups this connection has joined.
    communities: Mutex<HashSet<i64>>,
}

/// Connection registry and event fan-out.
///
/// Policy: `single_active_connection_per_user` — at most one registered
/// session per user; a later connect for the same user silently evicts the
/// earlier session from the registry. The evicted socket stays open but
/// receives no further events, and its eventual disconnect cleanup is a
/// no-op. Choosing multi-device fan-out later means deliberately changing
/// this policy.
pub struct Hub {
    /// Inverse map: connection handle to session, for O(1) cleanup.
    sessions: DashMap<ConnectionId, Arc<ConnectedSession>>,
    /// Forward map: user id to "the" reachable connection for that user.
    active_users: DashMap<i64, ConnectionId>,
    /// Community id to member connections, for community broadcasts.
    community_groups: DashMap<i64, HashSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            active_users: DashMap::new(),
            community_groups: DashMap::new(),
        }
    }

    /// Register a connection for an authenticated user.
    ///
    /// Effects, in order: (1) insert/replace the registry mapping, (2)
    /// broadcast `user_online` to every other connection, (3) send the
    /// roster snapshot (which includes the new identity) to the new
    /// connection only. The new connection never receives its own
    /// `user_online` echo.
    pub fn register(
        &self,
        identity: UserIdentity,
        connection_id: ConnectionId,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let user_id = identity.id;
        let session = Arc::new(ConnectedSession {
            user_id,
            connection_id,
            identity: identity.clone(),
            sender,
            communities: Mutex::new(HashSet::new()),
        });

        self.sessions.insert(connection_id, session);

        if let Some(previous) = self.active_users.insert(user_id, connection_id) {
            if previous != connection_id {
                self.evict(previous);
            }
        }

        self.broadcast_except(
            connection_id,
            ServerEvent::UserOnline(PresencePayload {
                user_id,
                user: identity,
            }),
        );

        self.send_to_connection(connection_id, ServerEvent::OnlineUsers(self.roster()));

        tracing::info!(user_id, connection_id = %connection_id, "Connection registered");
    }

    /// Remove a connection and announce the user offline.
    ///
    /// Idempotent: an unknown (already cleaned up, or evicted-by-reconnect)
    /// connection is a silent no-op, and `user_offline` fires at most once.
    /// After a reconnect-replace the stale connection no longer owns the
    /// forward mapping, so its disconnect does not mark the user offline.
    pub fn deregister(&self, connection_id: ConnectionId) {
        let Some((_, session)) = self.sessions.remove(&connection_id) else {
            return;
        };

        self.remove_from_groups(&session);

        let owned = self
            .active_users
            .remove_if(&session.user_id, |_, current| *current == connection_id)
            .is_some();

        if owned {
            self.broadcast_except(
                connection_id,
                ServerEvent::UserOffline(UserOfflinePayload {
                    user_id: session.user_id,
                }),
            );
        }

        tracing::info!(
            user_id = session.user_id,
            connection_id = %connection_id,
            "Connection deregistered"
        );
    }

    /// Drop a session evicted by a newer connection for the same user.
    /// No `user_offline` fires: the user is still reachable.
    fn evict(&self, connection_id: ConnectionId) {
        if let Some((_, session)) = self.sessions.remove(&connection_id) {
            self.remove_from_groups(&session);
            tracing::debug!(
                user_id = session.user_id,
                connection_id = %connection_id,
                "Stale connection evicted by reconnect"
            );
        }
    }

    fn remove_from_groups(&self, session: &ConnectedSession) {
        let joined: Vec<i64> = session.communities.lock().drain().collect();
        for community_id in joined {
            if let Some(mut group) = self.community_groups.get_mut(&community_id) {
                group.remove(&session.connection_id);
            }
        }
    }

    /// Add a connection to a community broadcast group.
    ///
    /// Pure group membership; the caller is responsible for any
    /// authorization check before admitting the connection.
    pub fn join_community(&self, connection_id: ConnectionId, community_id: i64) {
        let Some(session) = self.sessions.get(&connection_id) else {
            return;
        };
        session.communities.lock().insert(community_id);
        self.community_groups
            .entry(community_id)
            .or_default()
            .insert(connection_id);
    }

    /// Remove a connection from a community broadcast group.
    pub fn leave_community(&self, connection_id: ConnectionId, community_id: i64) {
        if let Some(session) = self.sessions.get(&connection_id) {
            session.communities.lock().remove(&community_id);
        }
        if let Some(mut group) = self.community_groups.get_mut(&community_id) {
            group.remove(&connection_id);
        }
    }

    /// Deliver an event to the user's registered connection, if any.
    /// Returns whether the event was handed to a live connection; an
    /// unreachable user means the event is dropped, not queued.
    pub fn send_to_user(&self, user_id: i64, event: ServerEvent) -> bool {
        let Some(connection_id) = self.active_users.get(&user_id).map(|c| *c) else {
            return false;
        };
        self.send_to_connection(connection_id, event)
    }

    /// Deliver an event to one specific connection.
    pub fn send_to_connection(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        match self.sessions.get(&connection_id) {
            Some(session) => session.sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Broadcast an event to every registered connection except one.
    pub fn broadcast_except(&self, except: ConnectionId, event: ServerEvent) {
        for session in self.sessions.iter() {
            if session.connection_id != except {
                let _ = session.sender.send(event.clone());
            }
        }
    }

    /// Broadcast to every connection in a community group, optionally
    /// excluding one (typing relays exclude the sender; messages do not).
    pub fn broadcast_community(
        &self,
        community_id: i64,
        event: ServerEvent,
        except: Option<ConnectionId>,
    ) {
        let members: Vec<ConnectionId> = match self.community_groups.get(&community_id) {
            Some(group) => group.iter().copied().collect(),
            None => return,
        };

        for connection_id in members {
            if Some(connection_id) == except {
                continue;
            }
            self.send_to_connection(connection_id, event.clone());
        }
    }

    /// Snapshot of all currently online identities.
    pub fn roster(&self) -> Vec<UserIdentity> {
        self.active_users
            .iter()
            .filter_map(|entry| {
                self.sessions
                    .get(entry.value())
                    .map(|session| session.identity.clone())
            })
            .collect()
    }

    /// Whether the user has a registered connection.
    pub fn is_online(&self, user_id: i64) -> bool {
        self.active_users.contains_key(&user_id)
    }

    /// Number of registered connections.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}
