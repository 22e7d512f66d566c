// src/services/admin_service.rs
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    db::DocumentStore,
    error::AppResult,
    models::{
        account::{Account, Role},
        club::Club,
    },
    services::club_service::{self, ClubFilter},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: usize,
    pub total_students: usize,
    pub total_faculty: usize,
    pub total_clubs: usize,
    pub active_users_today: usize,
    pub new_users_this_week: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DepartmentStat {
    pub department: Option<String>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularClub {
    pub id: String,
    pub name: String,
    pub total_members: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub department_stats: Vec<DepartmentStat>,
    pub popular_clubs: Vec<PopularClub>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
    pub role: Role,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    pub total_users: usize,
    pub new_users_today: usize,
    pub active_users_today: usize,
    /// Every account, active or not.
    pub by_role: Vec<RoleCount>,
    pub timestamp: DateTime<Utc>,
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or(now)
}

pub async fn account_stats(store: &DocumentStore, now: DateTime<Utc>) -> AppResult<AccountStats> {
    let today = start_of_day(now);
    let total_users = store.count(|a: &Account| a.is_active).await?;
    let new_users_today = store.count(|a: &Account| a.is_active && a.created_at >= today).await?;
    let active_users_today = store
        .count(|a: &Account| a.is_active && a.activity.last_login.is_some_and(|t| t >= today))
        .await?;

    let mut by_role = Vec::new();
    for role in Role::ALL {
        let count = store.count(|a: &Account| a.role == role).await?;
        if count > 0 {
            by_role.push(RoleCount { role, count });
        }
    }

    Ok(AccountStats {
        total_users,
        new_users_today,
        active_users_today,
        by_role,
        timestamp: now,
    })
}

/// Counts over active accounts and clubs.
pub async fn dashboard(store: &DocumentStore, now: DateTime<Utc>) -> AppResult<Dashboard> {
    let accounts: Vec<Account> = store.find(|a: &Account| a.is_active).await?;
    let clubs: Vec<Club> = store.find(|c: &Club| c.is_active).await?;

    let today = start_of_day(now);
    let week_ago = now - Duration::days(7);

    let overview = Overview {
        total_users: accounts.len(),
        total_students: accounts.iter().filter(|a| a.role == Role::Student).count(),
        total_faculty: accounts.iter().filter(|a| a.role == Role::Faculty).count(),
        total_clubs: clubs.len(),
        active_users_today: accounts
            .iter()
            .filter(|a| a.activity.last_login.is_some_and(|t| t >= today))
            .count(),
        new_users_this_week: accounts.iter().filter(|a| a.created_at >= week_ago).count(),
    };

    let mut per_department: HashMap<Option<String>, usize> = HashMap::new();
    for account in accounts.iter().filter(|a| a.role == Role::Student) {
        let department = account.academic.as_ref().and_then(|a| a.department.clone());
        *per_department.entry(department).or_default() += 1;
    }
    let mut department_stats: Vec<DepartmentStat> = per_department
        .into_iter()
        .map(|(department, count)| DepartmentStat { department, count })
        .collect();
    department_stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.department.cmp(&b.department)));

    let mut popular: Vec<&Club> = clubs.iter().collect();
    popular.sort_by(|a, b| b.stats.total_members.cmp(&a.stats.total_members));
    let popular_clubs = popular
        .into_iter()
        .take(5)
        .map(|c| PopularClub {
            id: c.id.clone(),
            name: c.name.clone(),
            total_members: c.stats.total_members,
        })
        .collect();

    Ok(Dashboard {
        overview,
        department_stats,
        popular_clubs,
        last_updated: now,
    })
}

/// Every club matching the filter regardless of visibility, newest first.
pub async fn list_clubs(store: &DocumentStore, filter: ClubFilter) -> AppResult<Vec<Club>> {
    let filter = ClubFilter { include_private: true, ..filter };
    let mut clubs = club_service::list_clubs(store, &filter).await?;
    clubs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(clubs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::test_store,
        models::account::{sample_account, Academic},
    };

    fn student(id: &str, department: &str) -> Account {
        let mut account = sample_account(id, Role::Student);
        account.academic = Some(Academic {
            department: Some(department.into()),
            year: Some(2),
            ..Default::default()
        });
        account
    }

    #[tokio::test]
    async fn dashboard_counts_active_accounts_only() {
        let store = test_store().await;
        let now = Utc::now();
        let mut gone = student("s3", "CSE");
        gone.is_active = false;
        let mut logged_in = student("s1", "CSE");
        logged_in.record_login(now);
        for account in [logged_in, student("s2", "ECE"), gone, sample_account("f1", Role::Faculty)] {
            store.create(&account).await.unwrap();
        }

        let dashboard = dashboard(&store, now).await.unwrap();
        assert_eq!(dashboard.overview.total_users, 3);
        assert_eq!(dashboard.overview.total_students, 2);
        assert_eq!(dashboard.overview.total_faculty, 1);
        assert_eq!(dashboard.overview.active_users_today, 1);
        assert_eq!(dashboard.department_stats.len(), 2);
        assert!(dashboard.department_stats.iter().all(|d| d.count == 1));
    }

    #[tokio::test]
    async fn stats_count_roles_over_every_account() {
        let store = test_store().await;
        let now = Utc::now();
        let mut gone = student("s3", "CSE");
        gone.is_active = false;
        let mut logged_in = student("s1", "CSE");
        logged_in.record_login(now);
        for account in [logged_in, student("s2", "ECE"), gone, sample_account("f1", Role::Faculty)] {
            store.create(&account).await.unwrap();
        }

        let stats = account_stats(&store, now).await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.new_users_today, 3);
        assert_eq!(stats.active_users_today, 1);
        let roles: Vec<(Role, usize)> = stats.by_role.iter().map(|r| (r.role, r.count)).collect();
        assert_eq!(roles, vec![(Role::Student, 3), (Role::Faculty, 1)]);
    }

    #[tokio::test]
    async fn admin_listing_includes_inactive_clubs() {
        let store = test_store().await;
        let open = crate::models::club::sample_club("boss", false);
        let mut closed = crate::models::club::sample_club("boss", false);
        closed.name = "Chess".into();
        closed.is_active = false;
        store.create(&open).await.unwrap();
        store.create(&closed).await.unwrap();

        assert_eq!(list_clubs(&store, ClubFilter::default()).await.unwrap().len(), 2);
        let only_closed = list_clubs(&store, ClubFilter { is_active: Some(false), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(only_closed.len(), 1);
    }
}
