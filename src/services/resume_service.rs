// src/services/resume_service.rs
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::DocumentStore,
    error::{AppError, AppResult},
    models::resume::{Resume, ResumeUpdate},
};

/// The stored resume, or an unsaved blank one.
pub async fn get(store: &DocumentStore, account_id: &str) -> AppResult<Resume> {
    Ok(store
        .find_by_unique_key::<Resume>(account_id)
        .await?
        .unwrap_or_else(|| Resume::blank(Uuid::new_v4().to_string(), account_id)))
}

pub async fn update(store: &DocumentStore, account_id: &str, update: ResumeUpdate, now: DateTime<Utc>) -> AppResult<Resume> {
    if update.personal_info.as_ref().is_some_and(|v| !v.is_object()) {
        return Err(AppError::validation("Personal info must be an object"));
    }
    let mut resume = match store.find_by_unique_key::<Resume>(account_id).await? {
        Some(resume) => resume,
        None => {
            let blank = Resume::blank(Uuid::new_v4().to_string(), account_id);
            store.create_or_fetch(blank).await?
        }
    };
    resume.apply(update, now);
    store.save(&resume).await?;
    tracing::debug!("Resume {} saved for {}", resume.id, account_id);
    Ok(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::test_store, models::resume::ResumeTemplate};
    use serde_json::json;

    #[tokio::test]
    async fn concurrent_first_updates_land_on_one_resume() {
        let store = test_store().await;
        let now = Utc::now();
        let skills = ResumeUpdate { skills: Some(vec![json!("Rust")]), ..Default::default() };
        let template = ResumeUpdate { template: Some(ResumeTemplate::Classic), ..Default::default() };
        let (a, b) = tokio::join!(update(&store, "u1", skills, now), update(&store, "u1", template, now));
        assert_eq!(a.unwrap().id, b.unwrap().id);
        assert_eq!(store.count::<Resume, _>(|r| r.user == "u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn partial_updates_keep_other_sections() {
        let store = test_store().await;
        let blank = get(&store, "u1").await.unwrap();
        assert_eq!(blank.template, ResumeTemplate::Modern);
        assert!(blank.last_updated.is_none());

        update(
            &store,
            "u1",
            ResumeUpdate { skills: Some(vec![json!("Rust")]), ..Default::default() },
            Utc::now(),
        )
        .await
        .unwrap();
        let saved = update(
            &store,
            "u1",
            ResumeUpdate { template: Some(ResumeTemplate::Minimal), ..Default::default() },
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(saved.skills, vec![json!("Rust")]);
        assert_eq!(saved.template, ResumeTemplate::Minimal);
        assert_eq!(get(&store, "u1").await.unwrap().id, saved.id);
    }

    #[tokio::test]
    async fn personal_info_must_be_an_object() {
        let store = test_store().await;
        let err = update(
            &store,
            "u1",
            ResumeUpdate { personal_info: Some(json!("nope")), ..Default::default() },
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }
}
