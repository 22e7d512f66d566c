// src/services/realtime_service.rs
//
// Per-connection session state machine. `handle` maps one client event to the
// directives the hub must carry out; it never touches a socket itself.
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{
    account::{Account, Role},
    realtime::{room_key, AnnouncementScope, ChatMessage, ClientEvent, Room, ServerEvent},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Only to this connection.
    Reply(ServerEvent),
    /// Every connection in the room, optionally skipping one.
    Room {
        room: String,
        event: ServerEvent,
        skip: Option<Uuid>,
    },
    /// Every live connection.
    Everyone(ServerEvent),
    Join(String),
    Leave(String),
}

#[derive(Debug)]
pub struct Session {
    pub conn_id: Uuid,
    pub account: Account,
    pub rooms: HashSet<String>,
}

impl Session {
    pub fn new(conn_id: Uuid, account: Account) -> Self {
        Self {
            conn_id,
            account,
            rooms: HashSet::new(),
        }
    }

    /// Rooms derived from the account: personal, cohort (students only) and clubs.
    pub fn initial_rooms(&self) -> Vec<Room> {
        let mut rooms = vec![Room::User(self.account.id.clone())];
        if self.account.role == Role::Student {
            if let Some(academic) = &self.account.academic {
                if let Some(dept) = &academic.department {
                    rooms.push(Room::Department(dept.clone()));
                    if let Some(year) = academic.year {
                        rooms.push(Room::Cohort(dept.clone(), year));
                    }
                }
            }
        }
        rooms.extend(
            self.account
                .joined_clubs
                .iter()
                .map(|m| Room::Club(m.club.clone())),
        );
        rooms
    }

    fn user_id(&self) -> String {
        self.account.id.clone()
    }

    fn first_name(&self) -> String {
        self.account.profile.first_name.clone()
    }

    fn join(&mut self, room: String, out: &mut Vec<Outbound>) {
        self.rooms.insert(room.clone());
        out.push(Outbound::Join(room));
    }

    fn to_others(&self, room: String, event: ServerEvent) -> Outbound {
        Outbound::Room {
            room,
            event,
            skip: Some(self.conn_id),
        }
    }

    fn club_rooms(&self) -> impl Iterator<Item = &String> {
        self.rooms.iter().filter(|r| r.starts_with("club_"))
    }

    /// Joins the derived rooms and tells club rooms the account is online.
    pub fn connect(&mut self, now: DateTime<Utc>) -> Vec<Outbound> {
        let mut out = Vec::new();
        for room in self.initial_rooms() {
            self.join(room.to_string(), &mut out);
        }
        let mut clubs: Vec<String> = self.club_rooms().cloned().collect();
        clubs.sort();
        for room in clubs {
            let event = ServerEvent::UserOnline {
                user_id: self.user_id(),
                user_name: self.first_name(),
                timestamp: now,
            };
            out.push(self.to_others(room, event));
        }
        out
    }

    /// `user_offline` to every club room this session is in.
    pub fn disconnect(&self, now: DateTime<Utc>) -> Vec<Outbound> {
        let mut clubs: Vec<&String> = self.club_rooms().collect();
        clubs.sort();
        clubs
            .into_iter()
            .map(|room| {
                self.to_others(
                    room.clone(),
                    ServerEvent::UserOffline {
                        user_id: self.user_id(),
                        user_name: self.first_name(),
                        timestamp: now,
                    },
                )
            })
            .collect()
    }

    pub fn handle(&mut self, event: ClientEvent, now: DateTime<Utc>) -> Vec<Outbound> {
        let mut out = Vec::new();
        match event {
            ClientEvent::JoinRoom { room_type, room_id } => {
                let room = Room::joinable(&room_type, &room_id).filter(|room| match room {
                    Room::Club(club_id) => self.account.belongs_to_club(club_id),
                    _ => true,
                });
                if let Some(room) = room {
                    self.join(room.to_string(), &mut out);
                    out.push(Outbound::Reply(ServerEvent::JoinedRoom {
                        room_type,
                        room_id,
                        success: true,
                        message: None,
                    }));
                } else {
                    tracing::warn!(
                        "Session {}: join {}_{} denied for {}",
                        self.conn_id,
                        room_type,
                        room_id,
                        self.account.id
                    );
                    out.push(Outbound::Reply(ServerEvent::JoinedRoom {
                        room_type,
                        room_id,
                        success: false,
                        message: Some("Permission denied".to_string()),
                    }));
                }
            }
            ClientEvent::LeaveRoom { room_type, room_id } => {
                let room = room_key(&room_type, &room_id);
                self.rooms.remove(&room);
                out.push(Outbound::Leave(room));
                out.push(Outbound::Reply(ServerEvent::LeftRoom { room_type, room_id }));
            }
            ClientEvent::SendMessage {
                room_id,
                room_type,
                message,
                message_type,
                reply_to,
                temp_id,
            } => {
                let text = message.trim();
                let room = room_key(&room_type, &room_id);
                if text.is_empty() {
                    out.push(Outbound::Reply(ServerEvent::MessageError {
                        error: "Message cannot be empty".to_string(),
                    }));
                } else if !self.rooms.contains(&room) {
                    out.push(Outbound::Reply(ServerEvent::MessageError {
                        error: "You have not joined this room".to_string(),
                    }));
                } else {
                    let message = ChatMessage {
                        id: Uuid::new_v4().to_string(),
                        sender_id: self.user_id(),
                        sender_name: self.account.full_name(),
                        sender_avatar: self
                            .account
                            .profile
                            .avatar
                            .as_ref()
                            .and_then(|a| a.url.clone()),
                        message: text.to_string(),
                        message_type,
                        timestamp: now,
                        reply_to,
                        reactions: Vec::new(),
                        edited: false,
                        delivered: true,
                    };
                    let message_id = message.id.clone();
                    out.push(Outbound::Room {
                        room,
                        event: ServerEvent::NewMessage { room_id, message },
                        skip: None,
                    });
                    out.push(Outbound::Reply(ServerEvent::MessageDelivered {
                        temp_id,
                        message_id,
                        timestamp: now,
                    }));
                }
            }
            ClientEvent::ToggleReaction {
                message_id,
                reaction,
                room_id,
                room_type,
            } => {
                let event = ServerEvent::ReactionToggled {
                    message_id,
                    reaction,
                    user_id: self.user_id(),
                    user_name: self.account.full_name(),
                    action: "toggle".to_string(),
                };
                out.push(self.to_others(room_key(&room_type, &room_id), event));
            }
            ClientEvent::TypingStart { room_id, room_type } => {
                let room = room_key(&room_type, &room_id);
                let event = ServerEvent::UserTyping {
                    user_id: self.user_id(),
                    user_name: self.first_name(),
                    room_id,
                };
                out.push(self.to_others(room, event));
            }
            ClientEvent::TypingStop { room_id, room_type } => {
                let room = room_key(&room_type, &room_id);
                let event = ServerEvent::UserStoppedTyping {
                    user_id: self.user_id(),
                    room_id,
                };
                out.push(self.to_others(room, event));
            }
            ClientEvent::SubscribeNotifications => {
                out.push(Outbound::Reply(ServerEvent::NotificationSubscription {
                    status: "subscribed".to_string(),
                }));
            }
            ClientEvent::StartInterviewSession {
                session_id,
                interview_type,
            } => {
                self.join(Room::Interview(session_id.clone()).to_string(), &mut out);
                out.push(Outbound::Reply(ServerEvent::InterviewSessionStarted {
                    session_id,
                    interview_type,
                    start_time: now,
                }));
            }
            ClientEvent::InterviewAnswer {
                session_id,
                question_id,
                time_spent,
                ..
            } => {
                let event = ServerEvent::PeerAnswered {
                    question_id,
                    time_spent,
                    answered_by: self.first_name(),
                };
                out.push(self.to_others(Room::Interview(session_id).to_string(), event));
            }
            ClientEvent::EndInterviewSession { session_id } => {
                let room = Room::Interview(session_id.clone()).to_string();
                out.push(self.to_others(
                    room.clone(),
                    ServerEvent::InterviewSessionEnded {
                        session_id,
                        end_time: now,
                    },
                ));
                self.rooms.remove(&room);
                out.push(Outbound::Leave(room));
            }
            ClientEvent::JoinStudyGroup { group_id } => {
                let room = Room::Study(group_id).to_string();
                self.join(room.clone(), &mut out);
                let event = ServerEvent::UserJoinedStudy {
                    user_id: self.user_id(),
                    user_name: self.account.full_name(),
                    join_time: now,
                };
                out.push(self.to_others(room, event));
            }
            ClientEvent::StudyProgressUpdate { group_id, progress } => {
                let event = ServerEvent::StudyProgressUpdated {
                    user_id: self.user_id(),
                    user_name: self.first_name(),
                    progress,
                    timestamp: now,
                };
                out.push(self.to_others(Room::Study(group_id).to_string(), event));
            }
            ClientEvent::ScheduleUpdate {
                update_type,
                event_data,
            } => {
                if let Some((dept, year)) = self.account.cohort() {
                    let room = Room::Cohort(dept.to_string(), year).to_string();
                    let event = ServerEvent::PeerScheduleUpdate {
                        user_id: self.user_id(),
                        user_name: self.first_name(),
                        update_type,
                        event_data,
                        timestamp: now,
                    };
                    out.push(self.to_others(room, event));
                }
            }
            ClientEvent::CollaborateResume {
                resume_id,
                action,
                content,
            } => {
                let event = ServerEvent::ResumeCollaboration {
                    user_id: self.user_id(),
                    user_name: self.first_name(),
                    action,
                    content,
                    timestamp: now,
                };
                out.push(self.to_others(Room::Resume(resume_id).to_string(), event));
            }
            ClientEvent::AdminAnnouncement {
                target,
                message,
                priority,
            } => {
                if !self.account.role.is_staff() {
                    tracing::debug!(
                        "Session {}: announcement from {} ignored",
                        self.conn_id,
                        self.account.role
                    );
                    return out;
                }
                let event = ServerEvent::Announcement {
                    from: self.account.full_name(),
                    message,
                    priority,
                    timestamp: now,
                    scope: target.scope,
                    department: target.department.clone(),
                    year: target.year,
                };
                match (target.scope, target.department, target.year) {
                    (AnnouncementScope::All, _, _) => out.push(Outbound::Everyone(event)),
                    (AnnouncementScope::Department, Some(dept), _) => out.push(Outbound::Room {
                        room: Room::Department(dept).to_string(),
                        event,
                        skip: None,
                    }),
                    (AnnouncementScope::Year, Some(dept), Some(year)) => out.push(Outbound::Room {
                        room: Room::Cohort(dept, year).to_string(),
                        event,
                        skip: None,
                    }),
                    _ => tracing::debug!("Session {}: announcement target incomplete", self.conn_id),
                }
            }
        }
        out
    }
}
