// src/models/account.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::{Collection, Document};

/// Platform-wide role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Faculty,
    Admin,
    ClubAdmin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Faculty, Role::Admin, Role::ClubAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
            Role::ClubAdmin => "club_admin",
        }
    }

    /// Roles that may read other accounts and send announcements.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Faculty)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Invalid role '{s}'"))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub public_id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub avatar: Option<Avatar>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Academic {
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub semester: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyInfo {
    pub employee_id: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: u32,
    pub streak_days: u32,
    pub points: i64,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// Role held inside a club, mirrored on the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubRoleTag {
    Member,
    Moderator,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubMembership {
    pub club: String,
    pub role: ClubRoleTag,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile: Profile,
    #[serde(default)]
    pub academic: Option<Academic>,
    #[serde(default)]
    pub faculty: Option<FacultyInfo>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub activity: Activity,
    #[serde(default)]
    pub joined_clubs: Vec<ClubMembership>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(default)]
    pub deactivated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deactivation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document for Account {
    const COLLECTION: Collection = Collection::Accounts;
    const UNIQUE_FIELD: &'static str = "email";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.to_lowercase())
    }
}

impl Account {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.profile.first_name, self.profile.last_name)
    }

    /// Department and year for students that carry both.
    pub fn cohort(&self) -> Option<(&str, u8)> {
        let academic = self.academic.as_ref()?;
        Some((academic.department.as_deref()?, academic.year?))
    }

    pub fn department(&self) -> Option<&str> {
        self.academic
            .as_ref()
            .and_then(|a| a.department.as_deref())
            .or_else(|| self.faculty.as_ref().and_then(|f| f.department.as_deref()))
    }

    pub fn belongs_to_club(&self, club_id: &str) -> bool {
        self.joined_clubs.iter().any(|m| m.club == club_id)
    }

    /// Updates login counters and the daily streak.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        let activity = &mut self.activity;
        activity.login_count += 1;

        match activity.last_login {
            Some(last) => {
                let days = (now - last).num_days();
                if days == 1 {
                    activity.streak_days += 1;
                } else if days > 1 {
                    activity.streak_days = 1;
                }
            }
            None => activity.streak_days = 1,
        }
        activity.last_login = Some(now);
    }

    /// Adds an achievement unless one with the same title exists. Returns whether it was added.
    pub fn add_achievement(&mut self, title: &str, description: &str, icon: &str, now: DateTime<Utc>) -> bool {
        if self.activity.achievements.iter().any(|a| a.title == title) {
            return false;
        }
        self.activity.achievements.push(Achievement {
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            earned_at: now,
        });
        true
    }

    pub fn set_club_membership(&mut self, club_id: &str, role: ClubRoleTag, now: DateTime<Utc>) {
        match self.joined_clubs.iter_mut().find(|m| m.club == club_id) {
            Some(existing) => existing.role = role,
            None => self.joined_clubs.push(ClubMembership {
                club: club_id.to_string(),
                role,
                joined_at: now,
            }),
        }
    }

    pub fn drop_club_membership(&mut self, club_id: &str) {
        self.joined_clubs.retain(|m| m.club != club_id);
    }

    /// Case-insensitive substring match over name, email and institutional ids.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        let mut fields = vec![
            self.profile.first_name.as_str(),
            self.profile.last_name.as_str(),
            self.email.as_str(),
        ];
        if let Some(id) = self.academic.as_ref().and_then(|a| a.student_id.as_deref()) {
            fields.push(id);
        }
        if let Some(id) = self.faculty.as_ref().and_then(|f| f.employee_id.as_deref()) {
            fields.push(id);
        }
        fields.iter().any(|f| f.to_lowercase().contains(&needle))
    }
}

/// Public shape of an account; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub profile: Profile,
    pub academic: Option<Academic>,
    pub faculty: Option<FacultyInfo>,
    pub preferences: Preferences,
    pub activity: Activity,
    pub joined_clubs: Vec<ClubMembership>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            role: account.role,
            profile: account.profile.clone(),
            academic: account.academic.clone(),
            faculty: account.faculty.clone(),
            preferences: account.preferences.clone(),
            activity: account.activity.clone(),
            joined_clubs: account.joined_clubs.clone(),
            is_active: account.is_active,
            is_verified: account.is_verified,
            created_at: account.created_at,
            full_name: account.full_name(),
        }
    }
}

/// Compact listing entry used by search, classmates and leaderboards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub points: i64,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            full_name: account.full_name(),
            email: account.email.clone(),
            role: account.role,
            department: account.department().map(str::to_string),
            year: account.academic.as_ref().and_then(|a| a.year),
            points: account.activity.points,
        }
    }
}

// --- Request payloads ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub student_id: Option<String>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub semester: Option<u8>,
    pub employee_id: Option<String>,
    pub designation: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub preferences: Option<Preferences>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct DeactivatePayload {
    pub password: String,
    pub reason: Option<String>,
}

#[cfg(test)]
pub fn sample_account(id: &str, role: Role) -> Account {
    Account {
        id: id.to_string(),
        email: format!("{id}@campus.test"),
        password_hash: String::new(),
        role,
        profile: Profile {
            first_name: "Test".to_string(),
            last_name: id.to_string(),
            ..Default::default()
        },
        academic: None,
        faculty: None,
        preferences: Preferences::default(),
        activity: Activity::default(),
        joined_clubs: Vec::new(),
        is_active: true,
        is_verified: false,
        deactivated_at: None,
        deactivation_reason: None,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn streak_counts_consecutive_days() {
        let mut account = sample_account("a1", Role::Student);
        let day0 = Utc::now();

        account.record_login(day0);
        assert_eq!(account.activity.streak_days, 1);

        account.record_login(day0 + Duration::hours(3));
        assert_eq!(account.activity.streak_days, 1, "same day keeps the streak");

        account.record_login(day0 + Duration::hours(3) + Duration::days(1));
        assert_eq!(account.activity.streak_days, 2);

        account.record_login(day0 + Duration::days(5));
        assert_eq!(account.activity.streak_days, 1, "gap resets the streak");
        assert_eq!(account.activity.login_count, 4);
    }

    #[test]
    fn roles_round_trip_through_their_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn achievements_are_unique_by_title() {
        let mut account = sample_account("a1", Role::Student);
        assert!(account.add_achievement("Early bird", "Logged in before 7", "🏆", Utc::now()));
        assert!(!account.add_achievement("Early bird", "Again", "🏆", Utc::now()));
        assert_eq!(account.activity.achievements.len(), 1);
    }
}
