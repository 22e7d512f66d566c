// src/models/realtime.rs
//
// Wire types of the real-time channel. Frames are `{"event": name, "data": {...}}`
// in both directions.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A fan-out topic. Its string form is the room key used by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    User(String),
    Department(String),
    Cohort(String, u8),
    Club(String),
    Chat(String),
    Interview(String),
    Study(String),
    Resume(String),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user_{id}"),
            Room::Department(dept) => write!(f, "dept_{dept}"),
            Room::Cohort(dept, year) => write!(f, "year_{dept}_{year}"),
            Room::Club(id) => write!(f, "club_{id}"),
            Room::Chat(id) => write!(f, "chat_{id}"),
            Room::Interview(id) => write!(f, "interview_{id}"),
            Room::Study(id) => write!(f, "study_{id}"),
            Room::Resume(id) => write!(f, "resume_{id}"),
        }
    }
}

impl Room {
    /// The room a client asked for with `join_room`, if that type is joinable and the id is set.
    pub fn joinable(room_type: &str, room_id: &str) -> Option<Room> {
        if room_id.trim().is_empty() {
            return None;
        }
        let id = room_id.to_string();
        match room_type {
            "club" => Some(Room::Club(id)),
            "chat" => Some(Room::Chat(id)),
            "interview" => Some(Room::Interview(id)),
            "study" => Some(Room::Study(id)),
            _ => None,
        }
    }
}

/// Room key for a `{roomType, roomId}` pair as sent by clients.
pub fn room_key(room_type: &str, room_id: &str) -> String {
    format!("{room_type}_{room_id}")
}

fn default_room_type() -> String {
    "club".to_string()
}

fn default_message_type() -> String {
    "text".to_string()
}

fn default_priority() -> String {
    "normal".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementScope {
    All,
    Department,
    Year,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementTarget {
    #[serde(rename = "type")]
    pub scope: AnnouncementScope,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub year: Option<u8>,
}

/// Client → server events.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinRoom {
        room_type: String,
        #[serde(default)]
        room_id: String,
    },
    LeaveRoom {
        room_type: String,
        #[serde(default)]
        room_id: String,
    },
    SendMessage {
        room_id: String,
        #[serde(default = "default_room_type")]
        room_type: String,
        #[serde(default)]
        message: String,
        #[serde(default = "default_message_type")]
        message_type: String,
        #[serde(default)]
        reply_to: Option<Value>,
        #[serde(default)]
        temp_id: Option<Value>,
    },
    ToggleReaction {
        message_id: String,
        reaction: String,
        room_id: String,
        #[serde(default = "default_room_type")]
        room_type: String,
    },
    TypingStart {
        room_id: String,
        #[serde(default = "default_room_type")]
        room_type: String,
    },
    TypingStop {
        room_id: String,
        #[serde(default = "default_room_type")]
        room_type: String,
    },
    SubscribeNotifications,
    StartInterviewSession {
        session_id: String,
        #[serde(default)]
        interview_type: Option<String>,
    },
    InterviewAnswer {
        session_id: String,
        question_id: Value,
        #[serde(default)]
        time_spent: Option<u64>,
    },
    EndInterviewSession {
        session_id: String,
    },
    JoinStudyGroup {
        group_id: String,
    },
    StudyProgressUpdate {
        group_id: String,
        progress: Value,
    },
    ScheduleUpdate {
        update_type: String,
        #[serde(default)]
        event_data: Value,
    },
    CollaborateResume {
        resume_id: String,
        action: String,
        #[serde(default)]
        content: Value,
    },
    AdminAnnouncement {
        target: AnnouncementTarget,
        message: String,
        #[serde(default = "default_priority")]
        priority: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_avatar: Option<String>,
    pub message: String,
    pub message_type: String,
    pub timestamp: DateTime<Utc>,
    pub reply_to: Option<Value>,
    pub reactions: Vec<Value>,
    pub edited: bool,
    pub delivered: bool,
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    AuthError {
        message: String,
    },
    JoinedRoom {
        room_type: String,
        room_id: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        message: Option<String>,
    },
    LeftRoom {
        room_type: String,
        room_id: String,
    },
    NewMessage {
        room_id: String,
        message: ChatMessage,
    },
    MessageDelivered {
        temp_id: Option<Value>,
        message_id: String,
        timestamp: DateTime<Utc>,
    },
    MessageError {
        error: String,
    },
    ReactionToggled {
        message_id: String,
        reaction: String,
        user_id: String,
        user_name: String,
        action: String,
    },
    UserTyping {
        user_id: String,
        user_name: String,
        room_id: String,
    },
    UserStoppedTyping {
        user_id: String,
        room_id: String,
    },
    NotificationSubscription {
        status: String,
    },
    InterviewSessionStarted {
        session_id: String,
        interview_type: Option<String>,
        start_time: DateTime<Utc>,
    },
    PeerAnswered {
        question_id: Value,
        time_spent: Option<u64>,
        answered_by: String,
    },
    InterviewSessionEnded {
        session_id: String,
        end_time: DateTime<Utc>,
    },
    UserJoinedStudy {
        user_id: String,
        user_name: String,
        join_time: DateTime<Utc>,
    },
    StudyProgressUpdated {
        user_id: String,
        user_name: String,
        progress: Value,
        timestamp: DateTime<Utc>,
    },
    PeerScheduleUpdate {
        user_id: String,
        user_name: String,
        update_type: String,
        event_data: Value,
        timestamp: DateTime<Utc>,
    },
    ResumeCollaboration {
        user_id: String,
        user_name: String,
        action: String,
        content: Value,
        timestamp: DateTime<Utc>,
    },
    Announcement {
        from: String,
        message: String,
        priority: String,
        timestamp: DateTime<Utc>,
        #[serde(rename = "type")]
        scope: AnnouncementScope,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        department: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        year: Option<u8>,
    },
    UserOnline {
        user_id: String,
        user_name: String,
        timestamp: DateTime<Utc>,
    },
    UserOffline {
        user_id: String,
        user_name: String,
        timestamp: DateTime<Utc>,
    },
    ClubRequestDecided {
        club_id: String,
        club_name: String,
        request_id: String,
        status: String,
        message: Option<String>,
    },
}

impl ServerEvent {
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn room_names() {
        assert_eq!(Room::User("7".into()).to_string(), "user_7");
        assert_eq!(Room::Cohort("CSE".into(), 2).to_string(), "year_CSE_2");
        assert_eq!(Room::Club("42".into()).to_string(), room_key("club", "42"));
    }

    #[test]
    fn only_known_room_types_are_joinable() {
        assert_eq!(Room::joinable("chat", "lobby"), Some(Room::Chat("lobby".into())));
        assert_eq!(Room::joinable("chat", "lobby").unwrap().to_string(), room_key("chat", "lobby"));
        assert_eq!(Room::joinable("study", "g1"), Some(Room::Study("g1".into())));
        assert_eq!(Room::joinable("chat", "  "), None);
        assert_eq!(Room::joinable("user", "alice"), None);
        assert_eq!(Room::joinable("dept", "CSE"), None);
    }

    #[test]
    fn client_frames_decode_with_defaults() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "send_message",
            "data": { "roomId": "42", "message": "hi", "tempId": "t-1" }
        }))
        .unwrap();
        let ClientEvent::SendMessage { room_type, message_type, temp_id, .. } = event else {
            panic!("wrong variant");
        };
        assert_eq!(room_type, "club");
        assert_eq!(message_type, "text");
        assert_eq!(temp_id, Some(json!("t-1")));

        let event: ClientEvent =
            serde_json::from_value(json!({ "event": "subscribe_notifications" })).unwrap();
        assert!(matches!(event, ClientEvent::SubscribeNotifications));
    }

    #[test]
    fn server_frames_use_camel_case_payloads() {
        let frame = serde_json::to_value(ServerEvent::JoinedRoom {
            room_type: "club".into(),
            room_id: "42".into(),
            success: true,
            message: None,
        })
        .unwrap();
        assert_eq!(
            frame,
            json!({ "event": "joined_room", "data": { "roomType": "club", "roomId": "42", "success": true } })
        );
    }
}
