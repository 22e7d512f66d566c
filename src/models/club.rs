// src/models/club.rs
//
// Club aggregate and its membership lifecycle. Every transition takes the club by
// value and hands back the new state, so the rules can be exercised without a store.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Collection, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Technical,
    Cultural,
    Sports,
    Academic,
    Social,
    Entrepreneurship,
    Arts,
    Music,
    Dance,
    Drama,
    Photography,
    Literature,
    Debate,
    Volunteer,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeratorTitle {
    President,
    VicePresident,
    Secretary,
    Treasurer,
    Coordinator,
    #[default]
    Moderator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeratorEntry {
    pub user: String,
    pub role: ModeratorTitle,
    pub appointed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberEntry {
    pub user: String,
    pub joined_at: DateTime<Utc>,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub message: String,
    pub requested_at: DateTime<Utc>,
    pub status: RequestStatus,
    #[serde(default)]
    pub reviewed_by: Option<String>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSettings {
    pub is_public: bool,
    pub allow_join_requests: bool,
    pub require_approval: bool,
    pub max_members: usize,
    pub min_members: usize,
}

impl Default for ClubSettings {
    fn default() -> Self {
        Self {
            is_public: true,
            allow_join_requests: true,
            require_approval: false,
            max_members: 500,
            min_members: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubStats {
    pub total_members: usize,
    pub total_events: usize,
    pub rating: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub short_description: Option<String>,
    pub category: Category,
    pub admin: String,
    #[serde(default)]
    pub moderators: Vec<ModeratorEntry>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
    #[serde(default)]
    pub join_requests: Vec<JoinRequest>,
    #[serde(default)]
    pub settings: ClubSettings,
    #[serde(default)]
    pub stats: ClubStats,
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Document for Club {
    const COLLECTION: Collection = Collection::Clubs;
    const UNIQUE_FIELD: &'static str = "name";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.name.to_lowercase())
    }
}

/// Permission level a route requires inside a club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPermission {
    Member,
    Moderator,
    Admin,
}

impl GroupPermission {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupPermission::Member => "member",
            GroupPermission::Moderator => "moderator",
            GroupPermission::Admin => "admin",
        }
    }
}

/// Resolved standing of an account inside a club.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "title")]
pub enum GroupRole {
    None,
    Member,
    Moderator(ModeratorTitle),
    Admin,
}

impl GroupRole {
    fn rank(self) -> u8 {
        match self {
            GroupRole::None => 0,
            GroupRole::Member => 1,
            GroupRole::Moderator(_) => 2,
            GroupRole::Admin => 3,
        }
    }

    /// `None` for non-members.
    pub fn label(self) -> Option<&'static str> {
        match self {
            GroupRole::None => None,
            GroupRole::Member => Some("member"),
            GroupRole::Moderator(_) => Some("moderator"),
            GroupRole::Admin => Some("admin"),
        }
    }

    pub fn meets(self, required: GroupPermission) -> bool {
        let needed = match required {
            GroupPermission::Member => 1,
            GroupPermission::Moderator => 2,
            GroupPermission::Admin => 3,
        };
        self.rank() >= needed
    }
}

/// Listing shape of a club.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubCard {
    pub id: String,
    pub name: String,
    pub short_description: Option<String>,
    pub category: Category,
    pub admin: String,
    pub stats: ClubStats,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Club> for ClubCard {
    fn from(club: &Club) -> Self {
        Self {
            id: club.id.clone(),
            name: club.name.clone(),
            short_description: club.short_description.clone(),
            category: club.category,
            admin: club.admin.clone(),
            stats: club.stats.clone(),
            is_active: club.is_active,
            created_at: club.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Pending { request_id: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MembershipError {
    #[error("Club is not available for joining")]
    ClubUnavailable,
    #[error("You are already a member of this club")]
    AlreadyMember,
    #[error("Membership in this club is suspended")]
    Suspended,
    #[error("A join request is already pending for this club")]
    RequestPending,
    #[error("Club has reached its member limit")]
    ClubFull,
    #[error("Join request not found")]
    RequestNotFound,
    #[error("Join request has already been decided")]
    AlreadyDecided,
    #[error("User must be an active member of the club")]
    NotAMember,
    #[error("User is not a moderator of this club")]
    NotAModerator,
    #[error("The club admin cannot be removed or suspended")]
    AdminImmovable,
}

pub type Transition<T = ()> = Result<(Club, T), MembershipError>;

impl Club {
    /// A fresh club whose creator is its admin and first member.
    pub fn new(
        name: String,
        description: String,
        short_description: Option<String>,
        category: Category,
        admin: &str,
        settings: ClubSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let club = Club {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            short_description,
            category,
            admin: admin.to_string(),
            moderators: Vec::new(),
            members: vec![MemberEntry {
                user: admin.to_string(),
                joined_at: now,
                status: MemberStatus::Active,
            }],
            join_requests: Vec::new(),
            settings,
            stats: ClubStats::default(),
            is_active: true,
            tags: Vec::new(),
            created_at: now,
        };
        club.recompute_stats()
    }

    pub fn active_member_count(&self) -> usize {
        self.members
            .iter()
            .filter(|m| m.status == MemberStatus::Active)
            .count()
    }

    fn member(&self, user: &str) -> Option<&MemberEntry> {
        self.members.iter().find(|m| m.user == user)
    }

    pub fn is_active_member(&self, user: &str) -> bool {
        self.member(user)
            .is_some_and(|m| m.status == MemberStatus::Active)
    }

    /// Precedence: club admin, then moderator entry, then active member.
    pub fn role_of(&self, user: &str) -> GroupRole {
        if self.admin == user {
            return GroupRole::Admin;
        }
        if let Some(moderator) = self.moderators.iter().find(|m| m.user == user) {
            return GroupRole::Moderator(moderator.role);
        }
        if self.is_active_member(user) {
            return GroupRole::Member;
        }
        GroupRole::None
    }

    /// `totalMembers` always mirrors the active member list.
    pub fn recompute_stats(mut self) -> Self {
        self.stats.total_members = self.active_member_count();
        self
    }

    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self
                .short_description
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&needle))
    }

    fn admit(mut self, user: &str, now: DateTime<Utc>) -> Transition {
        if self.active_member_count() >= self.settings.max_members {
            return Err(MembershipError::ClubFull);
        }
        match self.members.iter_mut().find(|m| m.user == user) {
            Some(existing) => match existing.status {
                MemberStatus::Active => return Err(MembershipError::AlreadyMember),
                MemberStatus::Suspended => return Err(MembershipError::Suspended),
                MemberStatus::Inactive => {
                    existing.status = MemberStatus::Active;
                    existing.joined_at = now;
                }
            },
            None => self.members.push(MemberEntry {
                user: user.to_string(),
                joined_at: now,
                status: MemberStatus::Active,
            }),
        }
        Ok((self.recompute_stats(), ()))
    }

    pub fn request_join(self, user: &str, message: Option<String>, now: DateTime<Utc>) -> Transition<JoinOutcome> {
        if !self.is_active || !self.settings.is_public || !self.settings.allow_join_requests {
            return Err(MembershipError::ClubUnavailable);
        }
        match self.member(user).map(|m| m.status) {
            Some(MemberStatus::Active) => return Err(MembershipError::AlreadyMember),
            Some(MemberStatus::Suspended) => return Err(MembershipError::Suspended),
            _ => {}
        }
        if self
            .join_requests
            .iter()
            .any(|r| r.user == user && r.status == RequestStatus::Pending)
        {
            return Err(MembershipError::RequestPending);
        }

        if !self.settings.require_approval {
            let (club, ()) = self.admit(user, now)?;
            return Ok((club, JoinOutcome::Joined));
        }

        if self.active_member_count() >= self.settings.max_members {
            return Err(MembershipError::ClubFull);
        }
        let mut club = self;
        let request_id = Uuid::new_v4().to_string();
        club.join_requests.push(JoinRequest {
            id: request_id.clone(),
            user: user.to_string(),
            message: message.unwrap_or_default(),
            requested_at: now,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            review_message: None,
        });
        Ok((club.recompute_stats(), JoinOutcome::Pending { request_id }))
    }

    /// Approves or rejects a pending request. Returns the requesting account id.
    pub fn decide_request(
        mut self,
        request_id: &str,
        decision: Decision,
        reviewer: &str,
        review_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Transition<String> {
        let request = self
            .join_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(MembershipError::RequestNotFound)?;
        if request.status != RequestStatus::Pending {
            return Err(MembershipError::AlreadyDecided);
        }

        request.status = match decision {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        };
        request.reviewed_by = Some(reviewer.to_string());
        request.reviewed_at = Some(now);
        request.review_message = review_message;
        let requester = request.user.clone();

        match decision {
            Decision::Approved => {
                let (club, ()) = self.admit(&requester, now)?;
                Ok((club, requester))
            }
            Decision::Rejected => Ok((self.recompute_stats(), requester)),
        }
    }

    /// Assigns or overwrites a moderator title. Returns whether anything changed.
    pub fn promote(mut self, user: &str, title: ModeratorTitle, now: DateTime<Utc>) -> Transition<bool> {
        if !self.is_active_member(user) {
            return Err(MembershipError::NotAMember);
        }
        let changed = match self.moderators.iter_mut().find(|m| m.user == user) {
            Some(existing) if existing.role == title => false,
            Some(existing) => {
                existing.role = title;
                true
            }
            None => {
                self.moderators.push(ModeratorEntry {
                    user: user.to_string(),
                    role: title,
                    appointed_at: now,
                });
                true
            }
        };
        Ok((self.recompute_stats(), changed))
    }

    pub fn demote(mut self, user: &str) -> Transition {
        let before = self.moderators.len();
        self.moderators.retain(|m| m.user != user);
        if self.moderators.len() == before {
            return Err(MembershipError::NotAModerator);
        }
        Ok((self.recompute_stats(), ()))
    }

    /// Drops the member entry and any moderator entry for the same account.
    pub fn remove_member(mut self, user: &str) -> Transition {
        if self.admin == user {
            return Err(MembershipError::AdminImmovable);
        }
        let before = self.members.len();
        self.members.retain(|m| m.user != user);
        if self.members.len() == before {
            return Err(MembershipError::NotAMember);
        }
        self.moderators.retain(|m| m.user != user);
        Ok((self.recompute_stats(), ()))
    }

    pub fn set_member_status(mut self, user: &str, status: MemberStatus) -> Transition {
        if self.admin == user && status != MemberStatus::Active {
            return Err(MembershipError::AdminImmovable);
        }
        let entry = self
            .members
            .iter_mut()
            .find(|m| m.user == user)
            .ok_or(MembershipError::NotAMember)?;
        entry.status = status;
        Ok((self.recompute_stats(), ()))
    }
}

#[cfg(test)]
pub fn sample_club(admin: &str, require_approval: bool) -> Club {
    Club::new(
        "Robotics".to_string(),
        "Build robots together".to_string(),
        None,
        Category::Technical,
        admin,
        ClubSettings {
            require_approval,
            ..Default::default()
        },
        Utc::now(),
    )
}
