// src/state.rs
use axum::extract::ws::Message;
use dashmap::DashMap;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::{
    config::Config,
    db::DocumentStore,
    models::{
        interview::InterviewSession,
        realtime::{Room, ServerEvent},
    },
    services::realtime_service::Outbound,
    throttle::Throttle,
};

// Outbound half of one WebSocket connection; a writer task drains it
pub type WsTx = mpsc::Sender<Message>;

#[derive(Debug, Default)]
struct HubTables {
    connections: HashMap<Uuid, WsTx>,
    rooms: HashMap<String, HashSet<Uuid>>,
}

/// Live connections and the rooms they joined. Cloning shares the tables.
#[derive(Debug, Clone, Default)]
pub struct RoomHub {
    tables: Arc<Mutex<HubTables>>,
}

impl RoomHub {
    pub async fn register(&self, conn_id: Uuid, tx: WsTx) {
        self.tables.lock().await.connections.insert(conn_id, tx);
    }

    /// Forgets the connection and removes it from every room.
    pub async fn unregister(&self, conn_id: Uuid) {
        let mut tables = self.tables.lock().await;
        tables.connections.remove(&conn_id);
        tables.rooms.retain(|_, members| {
            members.remove(&conn_id);
            !members.is_empty()
        });
    }

    pub async fn join(&self, conn_id: Uuid, room: &str) {
        self.tables
            .lock()
            .await
            .rooms
            .entry(room.to_string())
            .or_default()
            .insert(conn_id);
    }

    pub async fn leave(&self, conn_id: Uuid, room: &str) {
        let mut tables = self.tables.lock().await;
        if let Some(members) = tables.rooms.get_mut(room) {
            members.remove(&conn_id);
            if members.is_empty() {
                tables.rooms.remove(room);
            }
        }
    }

    #[cfg(test)]
    pub async fn room_size(&self, room: &str) -> usize {
        self.tables
            .lock()
            .await
            .rooms
            .get(room)
            .map_or(0, HashSet::len)
    }

    pub async fn connection_count(&self) -> usize {
        self.tables.lock().await.connections.len()
    }

    /// Carries out a session's directives in order.
    pub async fn apply(&self, conn_id: Uuid, outbounds: Vec<Outbound>) {
        for outbound in outbounds {
            match outbound {
                Outbound::Reply(event) => self.send_to(conn_id, &event).await,
                Outbound::Room { room, event, skip } => self.send_to_room(&room, &event, skip).await,
                Outbound::Everyone(event) => self.broadcast(&event).await,
                Outbound::Join(room) => self.join(conn_id, &room).await,
                Outbound::Leave(room) => self.leave(conn_id, &room).await,
            }
        }
    }

    pub async fn send_to(&self, conn_id: Uuid, event: &ServerEvent) {
        let target = self.tables.lock().await.connections.get(&conn_id).cloned();
        if let Some(tx) = target {
            deliver(&[(conn_id, tx)], event);
        }
    }

    pub async fn send_to_room(&self, room: &str, event: &ServerEvent, skip: Option<Uuid>) {
        let targets: Vec<(Uuid, WsTx)> = {
            let tables = self.tables.lock().await;
            match tables.rooms.get(room) {
                Some(members) => members
                    .iter()
                    .filter(|id| Some(**id) != skip)
                    .filter_map(|id| tables.connections.get(id).map(|tx| (*id, tx.clone())))
                    .collect(),
                None => Vec::new(),
            }
        };
        tracing::debug!("Room {}: fan-out to {} connections", room, targets.len());
        deliver(&targets, event);
    }

    pub async fn broadcast(&self, event: &ServerEvent) {
        let targets: Vec<(Uuid, WsTx)> = self
            .tables
            .lock()
            .await
            .connections
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();
        deliver(&targets, event);
    }

    /// Server-originated push to every connection of one account.
    pub async fn notify_user(&self, account_id: &str, event: &ServerEvent) {
        self.send_to_room(&Room::User(account_id.to_string()).to_string(), event, None)
            .await;
    }
}

// At-most-once: a full or closed channel drops the frame for that connection.
fn deliver(targets: &[(Uuid, WsTx)], event: &ServerEvent) {
    if targets.is_empty() {
        return;
    }
    let frame = match event.to_frame() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!("Failed to encode server event: {:?}", e);
            return;
        }
    };
    for (conn_id, tx) in targets {
        if let Err(e) = tx.try_send(Message::Text(frame.clone().into())) {
            tracing::warn!("Dropping frame for connection {}: {}", conn_id, e);
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub config: Arc<Config>,
    pub hub: RoomHub,
    /// Default throttle for authenticated API groups.
    pub api_throttle: Arc<Throttle>,
    /// Tighter throttle for the users API.
    pub users_throttle: Arc<Throttle>,
    /// Register/login attempts, keyed by client address.
    pub auth_throttle: Arc<Throttle>,
    pub interviews: Arc<DashMap<String, InterviewSession>>,
}

/// Requests per window on the users API.
pub const USERS_THROTTLE_MAX: usize = 50;
/// Register/login attempts per window from one address.
pub const AUTH_THROTTLE_MAX: usize = 10;

impl AppState {
    pub fn new(store: DocumentStore, config: Config) -> Self {
        let api_throttle = Throttle::new(config.throttle_window, config.throttle_max_requests);
        let users_throttle = Throttle::new(config.throttle_window, USERS_THROTTLE_MAX);
        let auth_throttle = Throttle::new(config.throttle_window, AUTH_THROTTLE_MAX);
        Self {
            store,
            config: Arc::new(config),
            hub: RoomHub::default(),
            api_throttle: Arc::new(api_throttle),
            users_throttle: Arc::new(users_throttle),
            auth_throttle: Arc::new(auth_throttle),
            interviews: Arc::new(DashMap::new()),
        }
    }
}

impl axum::extract::FromRef<AppState> for DocumentStore {
    fn from_ref(state: &AppState) -> DocumentStore {
        state.store.clone()
    }
}

impl axum::extract::FromRef<AppState> for RoomHub {
    fn from_ref(state: &AppState) -> RoomHub {
        state.hub.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            account::{sample_account, ClubRoleTag, Role},
            realtime::ClientEvent,
        },
        services::realtime_service::Session,
    };
    use chrono::Utc;

    async fn connect(hub: &RoomHub, account_id: &str, clubs: &[&str]) -> (Session, mpsc::Receiver<Message>) {
        let mut account = sample_account(account_id, Role::Student);
        for club in clubs {
            account.set_club_membership(club, ClubRoleTag::Member, Utc::now());
        }
        let (tx, rx) = mpsc::channel(16);
        let mut session = Session::new(Uuid::new_v4(), account);
        hub.register(session.conn_id, tx).await;
        let out = session.connect(Utc::now());
        hub.apply(session.conn_id, out).await;
        (session, rx)
    }

    fn next_event(rx: &mut mpsc::Receiver<Message>) -> ServerEvent {
        match rx.try_recv().expect("a pending frame") {
            Message::Text(text) => serde_json::from_str(text.as_str()).expect("server event"),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[tokio::test]
    async fn message_reaches_every_session_in_the_club_room() {
        let hub = RoomHub::default();
        let (mut alice, mut alice_rx) = connect(&hub, "alice", &["42"]).await;
        let (_bob, mut bob_rx) = connect(&hub, "bob", &["42"]).await;
        assert_eq!(hub.room_size("club_42").await, 2);

        // alice was told bob came online
        assert!(matches!(next_event(&mut alice_rx), ServerEvent::UserOnline { user_id, .. } if user_id == "bob"));

        let out = alice.handle(
            ClientEvent::SendMessage {
                room_id: "42".into(),
                room_type: "club".into(),
                message: "hi".into(),
                message_type: "text".into(),
                reply_to: None,
                temp_id: Some(serde_json::json!("tmp")),
            },
            Utc::now(),
        );
        hub.apply(alice.conn_id, out).await;

        let ServerEvent::NewMessage { room_id, message } = next_event(&mut bob_rx) else {
            panic!("bob expected new_message");
        };
        assert_eq!(room_id, "42");
        assert_eq!(message.message, "hi");
        assert_eq!(message.sender_id, "alice");
        assert!(!message.id.is_empty());

        assert!(matches!(next_event(&mut alice_rx), ServerEvent::NewMessage { .. }));
        let ServerEvent::MessageDelivered { message_id, .. } = next_event(&mut alice_rx) else {
            panic!("alice expected message_delivered");
        };
        assert_eq!(message_id, message.id);
    }

    #[tokio::test]
    async fn unregister_clears_rooms_and_personal_pushes_arrive() {
        let hub = RoomHub::default();
        let (alice, mut alice_rx) = connect(&hub, "alice", &["42"]).await;

        let event = ServerEvent::NotificationSubscription { status: "subscribed".into() };
        hub.notify_user("alice", &event).await;
        assert_eq!(next_event(&mut alice_rx), event);

        hub.unregister(alice.conn_id).await;
        assert_eq!(hub.room_size("club_42").await, 0);
        assert_eq!(hub.room_size("user_alice").await, 0);
        assert_eq!(hub.connection_count().await, 0);
    }
}
