use crate::Envelope;
use corridors_core::ConnectionId;
use corridors_core::GameId;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::Instant;
use tokio::sync::RwLock;
use tokio::sync::mpsc::UnboundedSender;

struct Subscription {
    sender: UnboundedSender<Envelope>,
    games: HashSet<GameId>,
    last_heartbeat: Instant,
}

/// Per-room subscription registry (spec §4.5): who is listening to which
/// GameId, keyed both ways so `broadcast` and `unsubscribe` are each a
/// single map lookup, mirroring the dual `active_connections` /
/// `connection_games` index the original websocket manager kept.
pub struct Registry {
    rooms: RwLock<HashMap<GameId, HashSet<ConnectionId>>>,
    subscriptions: RwLock<HashMap<ConnectionId, Subscription>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Register `connection_id` for `game_id` and send it a hello message
    /// carrying its own connection identifier and the room's population.
    /// Also tells the rest of the room a player connected.
    pub async fn subscribe(
        &self,
        connection_id: ConnectionId,
        sender: UnboundedSender<Envelope>,
        game_id: GameId,
    ) {
        {
            let mut rooms = self.rooms.write().await;
            rooms.entry(game_id).or_default().insert(connection_id);
        }
        let population = {
            let mut subscriptions = self.subscriptions.write().await;
            let subscription = subscriptions.entry(connection_id).or_insert_with(|| Subscription {
                sender: sender.clone(),
                games: HashSet::new(),
                last_heartbeat: Instant::now(),
            });
            subscription.games.insert(game_id);
            self.rooms.read().await.get(&game_id).map(HashSet::len).unwrap_or(0)
        };
        let _ = sender.send(Envelope::player_connected(game_id, connection_id, population));
        self.broadcast(game_id, Envelope::player_connected(game_id, connection_id, population), Some(connection_id))
            .await;
    }

    /// Remove `connection_id` from `game_id`'s room. A no-op if the pair
    /// was never subscribed. If the connection has no rooms left, forget
    /// it entirely.
    pub async fn unsubscribe(&self, connection_id: ConnectionId, game_id: GameId) {
        let had_room = {
            let mut rooms = self.rooms.write().await;
            if let Some(members) = rooms.get_mut(&game_id) {
                let removed = members.remove(&connection_id);
                if members.is_empty() {
                    rooms.remove(&game_id);
                }
                removed
            } else {
                false
            }
        };
        if !had_room {
            return;
        }
        let forget = {
            let mut subscriptions = self.subscriptions.write().await;
            match subscriptions.get_mut(&connection_id) {
                Some(subscription) => {
                    subscription.games.remove(&game_id);
                    subscription.games.is_empty()
                }
                None => true,
            }
        };
        if forget {
            self.subscriptions.write().await.remove(&connection_id);
        }
        self.broadcast(game_id, Envelope::player_disconnected(game_id, connection_id), None)
            .await;
    }

    /// Send `envelope` to every subscriber of `game_id` except `exclude`.
    /// Send failures are swallowed; the offending connection is reaped
    /// after the round finishes so the rest of the room is unaffected.
    pub async fn broadcast(&self, game_id: GameId, envelope: Envelope, exclude: Option<ConnectionId>) {
        let members: Vec<ConnectionId> = match self.rooms.read().await.get(&game_id) {
            Some(members) => members.iter().copied().filter(|id| Some(*id) != exclude).collect(),
            None => return,
        };
        let dead = self.send_to_many(&members, &envelope).await;
        self.reap(&dead, Some(game_id)).await;
    }

    /// Send `envelope` to every known subscriber, across every room.
    pub async fn broadcast_all(&self, envelope: Envelope) {
        let members: Vec<ConnectionId> = self.subscriptions.read().await.keys().copied().collect();
        let dead = self.send_to_many(&members, &envelope).await;
        self.reap(&dead, None).await;
    }

    async fn send_to_many(&self, members: &[ConnectionId], envelope: &Envelope) -> Vec<ConnectionId> {
        let subscriptions = self.subscriptions.read().await;
        members
            .iter()
            .filter_map(|id| {
                let subscription = subscriptions.get(id)?;
                match subscription.sender.send(envelope.clone()) {
                    Ok(()) => None,
                    Err(_) => {
                        log::warn!("[fanout] send to connection {} failed, scheduling reap", id);
                        Some(*id)
                    }
                }
            })
            .collect()
    }

    async fn reap(&self, dead: &[ConnectionId], game_id: Option<GameId>) {
        if dead.is_empty() {
            return;
        }
        let mut subscriptions = self.subscriptions.write().await;
        let mut rooms = self.rooms.write().await;
        for id in dead {
            if let Some(subscription) = subscriptions.remove(id) {
                for game in subscription.games {
                    if let Some(members) = rooms.get_mut(&game) {
                        members.remove(id);
                        if members.is_empty() {
                            rooms.remove(&game);
                        }
                    }
                }
            }
        }
        let _ = game_id;
    }

    /// Record that `connection_id` produced a reply (a pong or any other
    /// inbound message), resetting its heartbeat liveness clock.
    pub async fn record_heartbeat(&self, connection_id: ConnectionId) {
        if let Some(subscription) = self.subscriptions.write().await.get_mut(&connection_id) {
            subscription.last_heartbeat = Instant::now();
        }
    }

    /// Ping every subscriber and disconnect those silent for longer than
    /// `miss_after`. Intended to be driven by [`crate::spawn_heartbeat_loop`].
    pub async fn sweep_heartbeat(&self, miss_after: std::time::Duration) {
        let now = Instant::now();
        let (alive, stale): (Vec<_>, Vec<_>) = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions
                .iter()
                .map(|(id, subscription)| (*id, now.duration_since(subscription.last_heartbeat)))
                .partition(|(_, age)| *age <= miss_after)
        };
        for (id, _) in &alive {
            if let Some(subscription) = self.subscriptions.read().await.get(id) {
                let _ = subscription.sender.send(Envelope::ping());
            }
        }
        let stale_ids: Vec<ConnectionId> = stale.into_iter().map(|(id, _)| id).collect();
        if !stale_ids.is_empty() {
            log::info!("[fanout] disconnecting {} stale connections", stale_ids.len());
            self.reap(&stale_ids, None).await;
        }
    }

    pub async fn room_population(&self, game_id: GameId) -> usize {
        self.rooms.read().await.get(&game_id).map(HashSet::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn conn() -> ConnectionId {
        ConnectionId::default()
    }

    #[tokio::test]
    async fn subscribe_sends_hello_with_population() {
        let registry = Registry::new();
        let game_id = GameId::default();
        let (tx, mut rx) = unbounded_channel();
        registry.subscribe(conn(), tx, game_id).await;
        let hello = rx.recv().await.unwrap();
        assert!(matches!(hello, Envelope::PlayerConnected { population: 1, .. }));
    }

    #[tokio::test]
    async fn broadcast_excludes_requested_connection() {
        let registry = Registry::new();
        let game_id = GameId::default();
        let (id_a, id_b) = (conn(), conn());
        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        registry.subscribe(id_a, tx_a, game_id).await;
        registry.subscribe(id_b, tx_b, game_id).await;
        // drain the hello/player_connected noise from subscribing
        while rx_a.try_recv().is_ok() {}
        while rx_b.try_recv().is_ok() {}

        registry.broadcast(game_id, Envelope::game_created(game_id), Some(id_a)).await;
        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv().unwrap(), Envelope::GameCreated { .. }));
    }

    #[tokio::test]
    async fn dead_connection_is_reaped_on_send_failure() {
        let registry = Registry::new();
        let game_id = GameId::default();
        let id = conn();
        let (tx, rx) = unbounded_channel();
        registry.subscribe(id, tx, game_id).await;
        drop(rx);
        registry.broadcast(game_id, Envelope::game_created(game_id), None).await;
        assert_eq!(registry.room_population(game_id).await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_of_unknown_pair_is_a_no_op() {
        let registry = Registry::new();
        registry.unsubscribe(conn(), GameId::default()).await;
    }

    #[tokio::test]
    async fn heartbeat_sweep_disconnects_stale_connections() {
        let registry = Registry::new();
        let game_id = GameId::default();
        let (tx, _rx) = unbounded_channel();
        registry.subscribe(conn(), tx, game_id).await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        registry.sweep_heartbeat(std::time::Duration::from_secs(0)).await;
        assert_eq!(registry.room_population(game_id).await, 0);
    }
}
