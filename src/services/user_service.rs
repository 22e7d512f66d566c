// src/services/user_service.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::DocumentStore,
    error::{AppError, AppResult},
    models::account::{
        Academic, Account, AccountSummary, Achievement, Activity, DeactivatePayload, FacultyInfo, PasswordChange, Preferences,
        Profile, ProfileUpdate, RegisterPayload, Role,
    },
    services::auth_service,
};

// --- Validation ---

pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
                && !domain.contains('@')
        }
        None => false,
    };
    if valid {
        Ok(email)
    } else {
        Err(AppError::validation("Please provide a valid email"))
    }
}

/// At least six characters with an uppercase letter, a lowercase letter and a digit.
pub fn check_password_strength(password: &str) -> AppResult<()> {
    let strong = password.chars().count() >= 6
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        Err(AppError::validation(
            "Password must be at least 6 characters and contain an uppercase letter, a lowercase letter and a number",
        ))
    }
}

fn check_name(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if (2..=50).contains(&value.chars().count()) {
        Ok(value.to_string())
    } else {
        Err(AppError::validation(format!("{field} must be between 2 and 50 characters")))
    }
}

fn required(field: &str, value: &Option<String>) -> AppResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::validation(format!("{field} is required"))),
    }
}

// --- Lookups ---

pub async fn find_account(store: &DocumentStore, account_id: &str) -> AppResult<Account> {
    tracing::debug!("Loading account {}", account_id);
    store
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found", "USER_NOT_FOUND"))
}

// --- Registration & credentials ---

pub async fn register(store: &DocumentStore, payload: RegisterPayload, now: DateTime<Utc>) -> AppResult<Account> {
    let email = normalize_email(&payload.email)?;
    check_password_strength(&payload.password)?;
    let first_name = check_name("First name", &payload.first_name)?;
    let last_name = check_name("Last name", &payload.last_name)?;

    let (academic, faculty) = match payload.role {
        Role::Student => {
            let year = payload
                .year
                .filter(|y| (1..=6).contains(y))
                .ok_or_else(|| AppError::validation("Year must be between 1 and 6"))?;
            let academic = Academic {
                student_id: Some(required("Student ID", &payload.student_id)?),
                department: Some(required("Department", &payload.department)?),
                year: Some(year),
                semester: Some(payload.semester.unwrap_or(1)),
            };
            (Some(academic), None)
        }
        Role::Faculty => {
            let faculty = FacultyInfo {
                employee_id: Some(required("Employee ID", &payload.employee_id)?),
                designation: Some(required("Designation", &payload.designation)?),
                department: payload.department.clone(),
            };
            (None, Some(faculty))
        }
        _ => return Err(AppError::validation("Role must be either student or faculty")),
    };

    if store.find_by_unique_key::<Account>(&email).await?.is_some() {
        tracing::warn!("Registration refused, email {} already used", email);
        return Err(AppError::conflict("User already exists with this email", "USER_EXISTS"));
    }
    if let Some(student_id) = academic.as_ref().and_then(|a| a.student_id.clone()) {
        let taken = store
            .find_one(|a: &Account| a.academic.as_ref().and_then(|x| x.student_id.as_deref()) == Some(student_id.as_str()))
            .await?;
        if taken.is_some() {
            return Err(AppError::conflict("Student ID already exists", "STUDENT_ID_EXISTS"));
        }
    }
    if let Some(employee_id) = faculty.as_ref().and_then(|f| f.employee_id.clone()) {
        let taken = store
            .find_one(|a: &Account| a.faculty.as_ref().and_then(|x| x.employee_id.as_deref()) == Some(employee_id.as_str()))
            .await?;
        if taken.is_some() {
            return Err(AppError::conflict("Employee ID already exists", "EMPLOYEE_ID_EXISTS"));
        }
    }

    let password_hash = auth_service::hash_password(&payload.password).await?;
    let mut account = Account {
        id: Uuid::new_v4().to_string(),
        email,
        password_hash,
        role: payload.role,
        profile: Profile {
            first_name,
            last_name,
            avatar: None,
            phone: payload.phone,
            gender: payload.gender,
        },
        academic,
        faculty,
        preferences: Preferences::default(),
        activity: Activity::default(),
        joined_clubs: Vec::new(),
        is_active: true,
        is_verified: false,
        deactivated_at: None,
        deactivation_reason: None,
        created_at: now,
    };
    account.record_login(now);
    store.create(&account).await?;
    tracing::info!("Registered account {} ({})", account.id, account.role);
    Ok(account)
}

/// Email/password login. Records the login on success.
pub async fn login(store: &DocumentStore, email: &str, password: &str, now: DateTime<Utc>) -> AppResult<Account> {
    let invalid = || AppError::unauthorized("Invalid email or password", "INVALID_CREDENTIALS");

    let email = normalize_email(email)?;
    let mut account: Account = store.find_by_unique_key(&email).await?.ok_or_else(invalid)?;
    if !account.is_active {
        return Err(AppError::AccountDeactivated);
    }
    if !auth_service::verify_password(password, &account.password_hash).await? {
        tracing::warn!("Failed login for {}", account.id);
        return Err(invalid());
    }

    account.record_login(now);
    store.save(&account).await?;
    Ok(account)
}

pub async fn update_profile(store: &DocumentStore, mut account: Account, update: ProfileUpdate) -> AppResult<Account> {
    if let Some(first_name) = update.first_name {
        account.profile.first_name = check_name("First name", &first_name)?;
    }
    if let Some(last_name) = update.last_name {
        account.profile.last_name = check_name("Last name", &last_name)?;
    }
    if let Some(phone) = update.phone {
        let valid = !phone.trim().is_empty()
            && phone
                .chars()
                .enumerate()
                .all(|(i, c)| c.is_ascii_digit() || " -()".contains(c) || (i == 0 && c == '+'));
        if !valid {
            return Err(AppError::validation("Please enter a valid phone number"));
        }
        account.profile.phone = Some(phone);
    }
    if let Some(gender) = update.gender {
        if !["male", "female", "other", "prefer_not_to_say"].contains(&gender.as_str()) {
            return Err(AppError::validation("Invalid gender value"));
        }
        account.profile.gender = Some(gender);
    }
    if let Some(preferences) = update.preferences {
        account.preferences = preferences;
    }
    store.save(&account).await?;
    Ok(account)
}

pub async fn change_password(store: &DocumentStore, mut account: Account, change: PasswordChange) -> AppResult<()> {
    if !auth_service::verify_password(&change.current_password, &account.password_hash).await? {
        return Err(AppError::bad_request("Current password is incorrect", "INVALID_CURRENT_PASSWORD"));
    }
    check_password_strength(&change.new_password)?;
    account.password_hash = auth_service::hash_password(&change.new_password).await?;
    store.save(&account).await
}

/// Tokens are stateless; logout only touches the activity timestamp.
pub async fn logout(store: &DocumentStore, mut account: Account, now: DateTime<Utc>) -> AppResult<()> {
    account.activity.last_login = Some(now);
    store.save(&account).await
}

/// Self-service soft delete, confirmed by password.
pub async fn deactivate(
    store: &DocumentStore,
    mut account: Account,
    payload: DeactivatePayload,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if payload.reason.as_ref().is_some_and(|r| r.chars().count() > 500) {
        return Err(AppError::validation("Reason cannot exceed 500 characters"));
    }
    if !auth_service::verify_password(&payload.password, &account.password_hash).await? {
        return Err(AppError::bad_request("Password is incorrect", "INVALID_PASSWORD"));
    }
    account.is_active = false;
    account.deactivated_at = Some(now);
    account.deactivation_reason = payload.reason;
    store.save(&account).await?;
    tracing::info!("Account {} deactivated by its owner", account.id);
    Ok(())
}

// --- Directory ---

#[derive(Debug, Default, Clone)]
pub struct AccountFilter {
    pub role: Option<Role>,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub search: Option<String>,
    /// Admin listings may include deactivated accounts.
    pub include_inactive: bool,
}

impl AccountFilter {
    pub fn validate(&self) -> AppResult<()> {
        if self.search.as_ref().is_some_and(|s| s.trim().chars().count() < 2) {
            return Err(AppError::validation("Search term must be at least 2 characters"));
        }
        if self.year.is_some_and(|y| !(1..=6).contains(&y)) {
            return Err(AppError::validation("Year must be between 1 and 6"));
        }
        Ok(())
    }

    fn matches(&self, account: &Account) -> bool {
        (self.include_inactive || account.is_active)
            && self.role.is_none_or(|r| account.role == r)
            && self
                .department
                .as_deref()
                .is_none_or(|d| account.department() == Some(d))
            && self
                .year
                .is_none_or(|y| account.academic.as_ref().and_then(|a| a.year) == Some(y))
            && self
                .search
                .as_deref()
                .is_none_or(|s| account.matches_search(s.trim()))
    }
}

/// Filtered accounts ordered by first name.
pub async fn search_accounts(store: &DocumentStore, filter: &AccountFilter) -> AppResult<Vec<Account>> {
    filter.validate()?;
    let mut accounts = store.find(|a: &Account| filter.matches(a)).await?;
    accounts.sort_by(|a, b| a.profile.first_name.cmp(&b.profile.first_name));
    Ok(accounts)
}

/// Students (optionally one year) or faculty of a department.
pub async fn department_members(
    store: &DocumentStore,
    department: &str,
    year: Option<u8>,
    role: Role,
) -> AppResult<Vec<Account>> {
    if !matches!(role, Role::Student | Role::Faculty) {
        return Err(AppError::validation("Role must be student or faculty"));
    }
    let filter = AccountFilter {
        role: Some(role),
        department: Some(department.to_string()),
        year: if role == Role::Student { year } else { None },
        ..Default::default()
    };
    filter.validate()?;
    let mut members = store.find(|a: &Account| filter.matches(a)).await?;
    members.sort_by(|a, b| {
        let year_of = |x: &Account| x.academic.as_ref().and_then(|ac| ac.year);
        year_of(a)
            .cmp(&year_of(b))
            .then_with(|| a.profile.first_name.cmp(&b.profile.first_name))
    });
    Ok(members)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classmates {
    pub department: String,
    pub year: u8,
    pub classmates: Vec<AccountSummary>,
}

/// Active students sharing the account's department and year, excluding the account.
pub async fn classmates(store: &DocumentStore, account_id: &str) -> AppResult<Classmates> {
    let account = find_account(store, account_id).await?;
    let (department, year) = account
        .cohort()
        .map(|(d, y)| (d.to_string(), y))
        .ok_or_else(|| AppError::not_found("User not found or missing academic information", "USER_NOT_FOUND"))?;

    let mut classmates = store
        .find(|a: &Account| {
            a.id != account.id
                && a.is_active
                && a.role == Role::Student
                && a.cohort() == Some((department.as_str(), year))
        })
        .await?;
    classmates.sort_by(|a, b| a.profile.first_name.cmp(&b.profile.first_name));
    let classmates = classmates.iter().map(AccountSummary::from).collect();
    Ok(Classmates { department, year, classmates })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: String,
    pub full_name: String,
    pub department: Option<String>,
    pub year: Option<u8>,
    pub points: i64,
    pub streak_days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub current_user_rank: Option<usize>,
    pub total: usize,
}

/// Students with points, highest first (ties broken by streak).
pub async fn leaderboard(
    store: &DocumentStore,
    caller: &Account,
    department: Option<&str>,
    year: Option<u8>,
    limit: usize,
) -> AppResult<Leaderboard> {
    if year.is_some_and(|y| !(1..=6).contains(&y)) {
        return Err(AppError::validation("Year must be between 1 and 6"));
    }
    let eligible = |a: &Account| {
        a.is_active
            && a.role == Role::Student
            && a.activity.points > 0
            && department.is_none_or(|d| a.academic.as_ref().and_then(|x| x.department.as_deref()) == Some(d))
            && year.is_none_or(|y| a.academic.as_ref().and_then(|x| x.year) == Some(y))
    };
    let mut ranked = store.find(eligible).await?;
    ranked.sort_by(|a, b| {
        b.activity
            .points
            .cmp(&a.activity.points)
            .then_with(|| b.activity.streak_days.cmp(&a.activity.streak_days))
    });

    let current_user_rank = (caller.role == Role::Student).then(|| {
        ranked
            .iter()
            .filter(|a| a.activity.points > caller.activity.points)
            .count()
            + 1
    });

    let leaderboard: Vec<LeaderboardEntry> = ranked
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, a)| LeaderboardEntry {
            rank: i + 1,
            id: a.id.clone(),
            full_name: a.full_name(),
            department: a.academic.as_ref().and_then(|x| x.department.clone()),
            year: a.academic.as_ref().and_then(|x| x.year),
            points: a.activity.points,
            streak_days: a.activity.streak_days,
        })
        .collect();
    let total = leaderboard.len();
    Ok(Leaderboard { leaderboard, current_user_rank, total })
}

// --- Admin operations ---

/// Sets an account's points. Returns `(old, new)`.
pub async fn set_points(store: &DocumentStore, account_id: &str, points: i64) -> AppResult<(i64, i64)> {
    if points < 0 {
        return Err(AppError::validation("Points must be a non-negative integer"));
    }
    let mut account = find_account(store, account_id).await?;
    let old = account.activity.points;
    account.activity.points = points;
    store.save(&account).await?;
    tracing::info!("Points of {} changed {} -> {}", account_id, old, points);
    Ok((old, points))
}

pub async fn grant_achievement(
    store: &DocumentStore,
    account_id: &str,
    title: &str,
    description: &str,
    icon: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<Achievement> {
    let title = title.trim();
    let description = description.trim();
    if !(3..=100).contains(&title.chars().count()) {
        return Err(AppError::validation("Title must be between 3 and 100 characters"));
    }
    if !(10..=500).contains(&description.chars().count()) {
        return Err(AppError::validation("Description must be between 10 and 500 characters"));
    }
    let icon = icon.map(str::trim).filter(|i| !i.is_empty()).unwrap_or("🏆");

    let mut account = find_account(store, account_id).await?;
    if account.add_achievement(title, description, icon, now) {
        store.save(&account).await?;
    }
    Ok(Achievement {
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        earned_at: now,
    })
}

fn refuse_self(actor: &Account, target_id: &str) -> AppResult<()> {
    if actor.id == target_id {
        return Err(AppError::bad_request(
            "Cannot modify your own account",
            "SELF_MODIFICATION_DENIED",
        ));
    }
    Ok(())
}

pub async fn set_active(
    store: &DocumentStore,
    actor: &Account,
    account_id: &str,
    is_active: bool,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<Account> {
    refuse_self(actor, account_id)?;
    let mut account = find_account(store, account_id).await?;
    account.is_active = is_active;
    if is_active {
        account.deactivated_at = None;
        account.deactivation_reason = None;
    } else {
        account.deactivated_at = Some(now);
        account.deactivation_reason = reason;
    }
    store.save(&account).await?;
    tracing::info!("Account {} set active={} by {}", account_id, is_active, actor.id);
    Ok(account)
}

/// Admin edit of role and status flags. Absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

pub async fn admin_update(
    store: &DocumentStore,
    actor: &Account,
    account_id: &str,
    update: AccountUpdate,
    now: DateTime<Utc>,
) -> AppResult<Account> {
    refuse_self(actor, account_id)?;
    let mut account = find_account(store, account_id).await?;
    if let Some(role) = update.role {
        account.role = role;
    }
    if let Some(is_active) = update.is_active {
        if account.is_active != is_active {
            account.deactivated_at = (!is_active).then_some(now);
            account.deactivation_reason = None;
        }
        account.is_active = is_active;
    }
    if let Some(is_verified) = update.is_verified {
        account.is_verified = is_verified;
    }
    store.save(&account).await?;
    tracing::info!("Account {} updated by {}", account_id, actor.id);
    Ok(account)
}

pub async fn set_role(store: &DocumentStore, actor: &Account, account_id: &str, role: Role) -> AppResult<Account> {
    refuse_self(actor, account_id)?;
    let mut account = find_account(store, account_id).await?;
    account.role = role;
    store.save(&account).await?;
    tracing::info!("Account {} is now {} (by {})", account_id, role, actor.id);
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    fn student_payload(email: &str, student_id: &str) -> RegisterPayload {
        RegisterPayload {
            email: email.to_string(),
            password: "Secret123".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            role: Role::Student,
            student_id: Some(student_id.to_string()),
            department: Some("CSE".to_string()),
            year: Some(2),
            semester: None,
            employee_id: None,
            designation: None,
            phone: None,
            gender: None,
        }
    }

    #[test]
    fn email_and_password_rules() {
        assert_eq!(normalize_email("  Asha@Campus.EDU ").unwrap(), "asha@campus.edu");
        assert!(normalize_email("asha@campus").is_err());
        assert!(normalize_email("@campus.edu").is_err());
        assert!(check_password_strength("Secret123").is_ok());
        assert!(check_password_strength("secret123").is_err());
        assert!(check_password_strength("Se1").is_err());
    }

    #[tokio::test]
    async fn registration_rejects_duplicates_case_insensitively() {
        let store = test_store().await;
        let now = Utc::now();
        let account = register(&store, student_payload("asha@campus.edu", "S-1"), now).await.unwrap();
        assert_eq!(account.activity.login_count, 1);
        assert_eq!(account.activity.streak_days, 1);

        let err = register(&store, student_payload("ASHA@campus.edu", "S-2"), now).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { code: "USER_EXISTS", .. }));

        let err = register(&store, student_payload("other@campus.edu", "S-1"), now).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict { code: "STUDENT_ID_EXISTS", .. }));
    }

    #[tokio::test]
    async fn login_checks_password_and_status() {
        let store = test_store().await;
        let registered = register(&store, student_payload("asha@campus.edu", "S-1"), Utc::now()).await.unwrap();

        let err = login(&store, "asha@campus.edu", "Wrong1234", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { code: "INVALID_CREDENTIALS", .. }));

        let account = login(&store, "Asha@Campus.edu", "Secret123", Utc::now()).await.unwrap();
        assert_eq!(account.id, registered.id);
        assert_eq!(account.activity.login_count, 2);

        deactivate(
            &store,
            account,
            DeactivatePayload { password: "Secret123".into(), reason: Some("graduated".into()) },
            Utc::now(),
        )
        .await
        .unwrap();
        let err = login(&store, "asha@campus.edu", "Secret123", Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::AccountDeactivated));
    }

    #[tokio::test]
    async fn classmates_share_department_and_year() {
        let store = test_store().await;
        let now = Utc::now();
        let me = register(&store, student_payload("a@campus.edu", "S-1"), now).await.unwrap();
        register(&store, student_payload("b@campus.edu", "S-2"), now).await.unwrap();
        let mut other_year = student_payload("c@campus.edu", "S-3");
        other_year.year = Some(3);
        register(&store, other_year, now).await.unwrap();

        let result = classmates(&store, &me.id).await.unwrap();
        assert_eq!(result.department, "CSE");
        assert_eq!(result.year, 2);
        assert_eq!(result.classmates.len(), 1);
        assert_eq!(result.classmates[0].email, "b@campus.edu");
    }

    #[tokio::test]
    async fn leaderboard_orders_by_points() {
        let store = test_store().await;
        let now = Utc::now();
        let a = register(&store, student_payload("a@campus.edu", "S-1"), now).await.unwrap();
        let b = register(&store, student_payload("b@campus.edu", "S-2"), now).await.unwrap();
        let c = register(&store, student_payload("c@campus.edu", "S-3"), now).await.unwrap();
        set_points(&store, &a.id, 10).await.unwrap();
        set_points(&store, &b.id, 30).await.unwrap();

        let caller = find_account(&store, &c.id).await.unwrap();
        let board = leaderboard(&store, &caller, None, None, 20).await.unwrap();
        let ids: Vec<_> = board.leaderboard.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str()]);
        assert_eq!(board.current_user_rank, Some(3));
        assert!(set_points(&store, &a.id, -1).await.is_err());
    }

    #[tokio::test]
    async fn admin_update_touches_only_given_flags() {
        let store = test_store().await;
        let admin = crate::models::account::sample_account("root", Role::Admin);
        let target = crate::models::account::sample_account("s1", Role::Student);
        store.create(&admin).await.unwrap();
        store.create(&target).await.unwrap();
        let now = Utc::now();

        let verify = AccountUpdate { is_verified: Some(true), ..Default::default() };
        let updated = admin_update(&store, &admin, "s1", verify, now).await.unwrap();
        assert!(updated.is_verified);
        assert!(updated.is_active);
        assert_eq!(updated.role, Role::Student);

        let suspend = AccountUpdate { is_active: Some(false), role: Some(Role::ClubAdmin), ..Default::default() };
        let updated = admin_update(&store, &admin, "s1", suspend, now).await.unwrap();
        assert!(!updated.is_active && updated.is_verified);
        assert_eq!(updated.deactivated_at, Some(now));
        assert_eq!(updated.role, Role::ClubAdmin);

        let err = admin_update(&store, &admin, "root", AccountUpdate::default(), now).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { code: "SELF_MODIFICATION_DENIED", .. }));
    }
}
