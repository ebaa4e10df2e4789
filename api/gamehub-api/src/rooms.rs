use std::{collections::HashSet, hash::Hash};

use dashmap::DashMap;
use gamehub_app::{
    domain::{
        MatchId, TeamId, TournamentId, UserId,
        event::{DomainEvent, Room},
    },
    ports::realtime::RealtimePort,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses the `<kind>:<id>` names clients use for rooms.
pub fn parse_room(name: &str) -> Option<Room> {
    let (kind, id) = name.split_once(':')?;
    let id = Uuid::parse_str(id).ok()?;
    match kind {
        "user" => Some(Room::User(UserId(id))),
        "tournament" => Some(Room::Tournament(TournamentId(id))),
        "team" => Some(Room::Team(TeamId(id))),
        "match" => Some(Room::Match(MatchId(id))),
        _ => None,
    }
}

/// Two-way index between rooms and the connections joined to them.
struct Membership<K, V> {
    forward: DashMap<K, HashSet<V>>,
    backward: DashMap<V, HashSet<K>>,
}

impl<K, V> Membership<K, V>
where
    K: Hash + Eq + Clone,
    V: Hash + Eq + Clone,
{
    fn new() -> Self {
        Self {
            forward: DashMap::new(),
            backward: DashMap::new(),
        }
    }

    fn insert(&self, key: K, value: V) {
        self.forward
            .entry(key.clone())
            .or_default()
            .insert(value.clone());
        self.backward.entry(value).or_default().insert(key);
    }

    fn remove(&self, key: &K, value: &V) -> bool {
        let mut removed = false;
        if let Some(mut values) = self.forward.get_mut(key) {
            removed = values.remove(value);
            if values.is_empty() {
                drop(values);
                self.forward.remove(key);
            }
        }
        if let Some(mut keys) = self.backward.get_mut(value) {
            keys.remove(key);
            if keys.is_empty() {
                drop(keys);
                self.backward.remove(value);
            }
        }
        removed
    }

    fn contains(&self, key: &K, value: &V) -> bool {
        self.forward
            .get(key)
            .is_some_and(|values| values.contains(value))
    }

    fn values(&self, key: &K) -> Vec<V> {
        self.forward
            .get(key)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn remove_value(&self, value: &V) -> Vec<K> {
        let Some((_, keys)) = self.backward.remove(value) else {
            return Vec::new();
        };
        for key in &keys {
            if let Some(mut values) = self.forward.get_mut(key) {
                values.remove(value);
                if values.is_empty() {
                    drop(values);
                    self.forward.remove(key);
                }
            }
        }
        keys.into_iter().collect()
    }
}

struct Connection {
    user_id: UserId,
    username: String,
    sender: UnboundedSender<String>,
    cancellation_token: CancellationToken,
}

/// Live websocket connections and the rooms they listen to.
pub struct RealtimeHub {
    connections: DashMap<ConnectionId, Connection>,
    rooms: Membership<Room, ConnectionId>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            rooms: Membership::new(),
        }
    }

    /// Registers a connection and puts it in its owner's personal room.
    pub fn connect(
        &self,
        id: ConnectionId,
        user_id: UserId,
        username: String,
        sender: UnboundedSender<String>,
        cancellation_token: CancellationToken,
    ) {
        self.connections.insert(
            id,
            Connection {
                user_id,
                username,
                sender,
                cancellation_token,
            },
        );
        self.rooms.insert(Room::User(user_id), id);
    }

    pub fn disconnect(&self, id: ConnectionId) {
        self.rooms.remove_value(&id);
        if let Some((_, connection)) = self.connections.remove(&id) {
            connection.cancellation_token.cancel();
        }
    }

    pub fn join(&self, id: ConnectionId, room: Room) {
        self.rooms.insert(room, id);
    }

    pub fn leave(&self, id: ConnectionId, room: &Room) -> bool {
        self.rooms.remove(room, &id)
    }

    pub fn is_joined(&self, id: ConnectionId, room: &Room) -> bool {
        self.rooms.contains(room, &id)
    }

    pub fn identity(&self, id: ConnectionId) -> Option<(UserId, String)> {
        self.connections
            .get(&id)
            .map(|c| (c.user_id, c.username.clone()))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Sends a raw frame to every connection in the room, optionally skipping one.
    pub fn broadcast(&self, room: &Room, frame: &str, except: Option<ConnectionId>) {
        for id in self.rooms.values(room) {
            if Some(id) == except {
                continue;
            }
            if let Some(connection) = self.connections.get(&id)
                && connection.sender.send(frame.to_string()).is_err()
            {
                log::debug!("Dropping frame for closed connection {}", id);
            }
        }
    }
}

impl RealtimePort for RealtimeHub {
    fn publish(&self, room: &Room, event: &DomainEvent) {
        match serde_json::to_string(event) {
            Ok(frame) => self.broadcast(room, &frame, None),
            Err(e) => log::error!("Failed to serialize event for {}: {}", room, e),
        }
    }
}
