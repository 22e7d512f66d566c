// src/services/club_service.rs
//
// Load → pure transition → persist. The club is saved first, then the member's
// joined-club list is mirrored; the two writes are independent (last write wins).
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    db::DocumentStore,
    error::{AppError, AppResult},
    models::{
        account::{Account, ClubRoleTag},
        club::{Category, Club, ClubSettings, Decision, JoinOutcome, MemberStatus, ModeratorTitle, Transition},
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClub {
    pub name: String,
    pub description: String,
    pub short_description: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub settings: Option<ClubSettings>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ClubFilter {
    pub category: Option<Category>,
    pub search: Option<String>,
    /// `None` matches either state.
    pub is_active: Option<bool>,
    pub include_private: bool,
}

pub async fn find_club(store: &DocumentStore, club_id: &str) -> AppResult<Club> {
    store
        .find_by_id(club_id)
        .await?
        .ok_or_else(|| AppError::not_found("Club not found", "CLUB_NOT_FOUND"))
}

async fn persist(store: &DocumentStore, club: Club) -> AppResult<Club> {
    // Stats are recomputed on every save, not only after transitions
    let club = club.recompute_stats();
    store.save(&club).await?;
    Ok(club)
}

/// Applies a transition and saves the result.
async fn commit<T>(store: &DocumentStore, transition: Transition<T>) -> AppResult<(Club, T)> {
    let (club, outcome) = transition?;
    let club = persist(store, club).await?;
    Ok((club, outcome))
}

/// Mirrors a membership change onto the account document.
async fn mirror(
    store: &DocumentStore,
    account_id: &str,
    club_id: &str,
    role: Option<ClubRoleTag>,
    now: DateTime<Utc>,
) -> AppResult<()> {
    let Some(mut account) = store.find_by_id::<Account>(account_id).await? else {
        tracing::warn!("Membership mirror skipped, account {} is gone", account_id);
        return Ok(());
    };
    match role {
        Some(role) => account.set_club_membership(club_id, role, now),
        None => account.drop_club_membership(club_id),
    }
    store.save(&account).await
}

pub async fn create_club(store: &DocumentStore, creator: &Account, payload: NewClub, now: DateTime<Utc>) -> AppResult<Club> {
    let name = payload.name.trim().to_string();
    let description = payload.description.trim().to_string();
    if !(3..=100).contains(&name.chars().count()) {
        return Err(AppError::validation("Club name must be between 3 and 100 characters"));
    }
    if !(10..=1000).contains(&description.chars().count()) {
        return Err(AppError::validation("Description must be between 10 and 1000 characters"));
    }
    if store.find_by_unique_key::<Club>(&name.to_lowercase()).await?.is_some() {
        return Err(AppError::conflict("Club with this name already exists", "CLUB_EXISTS"));
    }

    let mut club = Club::new(
        name,
        description,
        payload.short_description,
        payload.category,
        &creator.id,
        payload.settings.unwrap_or_default(),
        now,
    );
    club.tags = payload.tags;
    store.create(&club).await?;
    mirror(store, &creator.id, &club.id, Some(ClubRoleTag::Admin), now).await?;
    tracing::info!("Club '{}' ({}) created by {}", club.name, club.id, creator.id);
    Ok(club)
}

/// Clubs matching the filter, largest first then newest.
pub async fn list_clubs(store: &DocumentStore, filter: &ClubFilter) -> AppResult<Vec<Club>> {
    let mut clubs = store
        .find(|c: &Club| {
            filter.is_active.is_none_or(|active| c.is_active == active)
                && (filter.include_private || c.settings.is_public)
                && filter.category.is_none_or(|cat| c.category == cat)
                && filter
                    .search
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .is_none_or(|s| c.matches_search(s))
        })
        .await?;
    clubs.sort_by(|a, b| {
        b.stats
            .total_members
            .cmp(&a.stats.total_members)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(clubs)
}

pub async fn join(
    store: &DocumentStore,
    account: &Account,
    club_id: &str,
    message: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<(Club, JoinOutcome)> {
    if message.as_ref().is_some_and(|m| m.chars().count() > 500) {
        return Err(AppError::validation("Message cannot exceed 500 characters"));
    }
    let club = find_club(store, club_id).await?;
    let (club, outcome) = commit(store, club.request_join(&account.id, message, now)).await?;
    if outcome == JoinOutcome::Joined {
        mirror(store, &account.id, &club.id, Some(ClubRoleTag::Member), now).await?;
    }
    tracing::info!("Account {} join on club {}: {:?}", account.id, club.id, outcome);
    Ok((club, outcome))
}

pub async fn leave(store: &DocumentStore, account: &Account, club_id: &str) -> AppResult<Club> {
    let club = find_club(store, club_id).await?;
    let (club, ()) = commit(store, club.remove_member(&account.id)).await?;
    mirror(store, &account.id, &club.id, None, Utc::now()).await?;
    Ok(club)
}

/// Decides a join request. Returns the saved club and the requester id.
pub async fn decide_request(
    store: &DocumentStore,
    club: Club,
    reviewer: &Account,
    request_id: &str,
    decision: Decision,
    review_message: Option<String>,
    now: DateTime<Utc>,
) -> AppResult<(Club, String)> {
    let (club, requester) = commit(
        store,
        club.decide_request(request_id, decision, &reviewer.id, review_message, now),
    )
    .await?;
    if decision == Decision::Approved {
        mirror(store, &requester, &club.id, Some(ClubRoleTag::Member), now).await?;
    }
    tracing::info!(
        "Join request {} on club {} {:?} by {}",
        request_id,
        club.id,
        decision,
        reviewer.id
    );
    Ok((club, requester))
}

pub async fn set_member_status(store: &DocumentStore, club: Club, account_id: &str, status: MemberStatus) -> AppResult<Club> {
    let (club, ()) = commit(store, club.set_member_status(account_id, status)).await?;
    Ok(club)
}

pub async fn remove_member(store: &DocumentStore, club: Club, account_id: &str) -> AppResult<Club> {
    let (club, ()) = commit(store, club.remove_member(account_id)).await?;
    mirror(store, account_id, &club.id, None, Utc::now()).await?;
    Ok(club)
}

/// Returns whether the title changed.
pub async fn add_moderator(
    store: &DocumentStore,
    club: Club,
    account_id: &str,
    title: ModeratorTitle,
    now: DateTime<Utc>,
) -> AppResult<(Club, bool)> {
    let (club, changed) = commit(store, club.promote(account_id, title, now)).await?;
    if changed {
        mirror(store, account_id, &club.id, Some(ClubRoleTag::Moderator), now).await?;
    }
    Ok((club, changed))
}

pub async fn remove_moderator(store: &DocumentStore, club: Club, account_id: &str) -> AppResult<Club> {
    let (club, ()) = commit(store, club.demote(account_id)).await?;
    mirror(store, account_id, &club.id, Some(ClubRoleTag::Member), Utc::now()).await?;
    Ok(club)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_store,
        models::account::{sample_account, Role},
    };

    async fn seeded(require_approval: bool) -> (DocumentStore, Account, Account, Club) {
        let store = test_store().await;
        let admin = sample_account("boss", Role::ClubAdmin);
        let student = sample_account("alice", Role::Student);
        store.create(&admin).await.unwrap();
        store.create(&student).await.unwrap();
        let club = create_club(
            &store,
            &admin,
            NewClub {
                name: "Robotics".into(),
                description: "Build robots together".into(),
                short_description: None,
                category: Category::Technical,
                settings: Some(ClubSettings { require_approval, ..Default::default() }),
                tags: vec![],
            },
            Utc::now(),
        )
        .await
        .unwrap();
        (store, admin, student, club)
    }

    #[tokio::test]
    async fn direct_join_updates_club_and_account() {
        let (store, _, student, club) = seeded(false).await;
        let (saved, outcome) = join(&store, &student, &club.id, None, Utc::now()).await.unwrap();

        assert_eq!(outcome, JoinOutcome::Joined);
        assert_eq!(saved.stats.total_members, 2);
        let stored = find_club(&store, &club.id).await.unwrap();
        assert!(stored.is_active_member("alice"));
        let account: Account = store.find_by_id("alice").await.unwrap().unwrap();
        assert!(account.belongs_to_club(&club.id));
    }

    #[tokio::test]
    async fn approval_flow_mirrors_on_approval_only() {
        let (store, admin, student, club) = seeded(true).await;
        let (_, outcome) = join(&store, &student, &club.id, Some("hi".into()), Utc::now()).await.unwrap();
        let JoinOutcome::Pending { request_id } = outcome else { panic!("expected pending") };
        let account: Account = store.find_by_id("alice").await.unwrap().unwrap();
        assert!(!account.belongs_to_club(&club.id));

        let club = find_club(&store, &club.id).await.unwrap();
        let (club, requester) =
            decide_request(&store, club, &admin, &request_id, Decision::Approved, None, Utc::now())
                .await
                .unwrap();
        assert_eq!(requester, "alice");
        assert!(club.is_active_member("alice"));
        let account: Account = store.find_by_id("alice").await.unwrap().unwrap();
        assert!(account.belongs_to_club(&club.id));
    }

    #[tokio::test]
    async fn duplicate_club_names_conflict() {
        let (store, admin, _, _) = seeded(false).await;
        let err = create_club(
            &store,
            &admin,
            NewClub {
                name: "ROBOTICS".into(),
                description: "Another robotics club".into(),
                short_description: None,
                category: Category::Technical,
                settings: None,
                tags: vec![],
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict { code: "CLUB_EXISTS", .. }));
    }
}
