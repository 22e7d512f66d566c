// src/services/mess_service.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::DocumentStore,
    error::{AppError, AppResult},
    models::{
        account::Account,
        mess::{Complaint, ComplaintStatus, ComplaintType},
    },
};

#[derive(Debug, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ComplaintType,
}

#[derive(Debug, Deserialize)]
pub struct Resolution {
    pub response: String,
}

pub async fn find_complaint(store: &DocumentStore, complaint_id: &str) -> AppResult<Option<Complaint>> {
    store.find_by_id(complaint_id).await
}

pub async fn submit(store: &DocumentStore, author: &Account, new: NewComplaint, now: DateTime<Utc>) -> AppResult<Complaint> {
    let title = new.title.trim();
    let description = new.description.trim();
    if title.is_empty() {
        return Err(AppError::validation("Complaint title is required"));
    }
    if description.is_empty() {
        return Err(AppError::validation("Description is required"));
    }

    let complaint = Complaint {
        id: Uuid::new_v4().to_string(),
        user: author.id.clone(),
        user_name: author.full_name(),
        title: title.to_string(),
        description: description.to_string(),
        kind: new.kind,
        status: ComplaintStatus::Pending,
        created_at: now,
        resolved_at: None,
        resolved_by: None,
        response: None,
    };
    store.create(&complaint).await?;
    tracing::info!("Complaint {} submitted by {}", complaint.id, author.id);
    Ok(complaint)
}

/// Staff see every complaint; everyone else only their own. Newest first.
pub async fn list(store: &DocumentStore, viewer: &Account) -> AppResult<Vec<Complaint>> {
    let see_all = viewer.role.is_staff();
    let mut complaints = store
        .find(|c: &Complaint| see_all || c.user == viewer.id)
        .await?;
    complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(complaints)
}

pub async fn resolve(
    store: &DocumentStore,
    resolver: &Account,
    complaint_id: &str,
    resolution: Resolution,
    now: DateTime<Utc>,
) -> AppResult<Complaint> {
    let response = resolution.response.trim();
    if response.is_empty() {
        return Err(AppError::validation("Response is required"));
    }
    let mut complaint = find_complaint(store, complaint_id)
        .await?
        .ok_or_else(|| AppError::not_found("Complaint not found", "COMPLAINT_NOT_FOUND"))?;
    if complaint.status == ComplaintStatus::Resolved {
        return Err(AppError::conflict("Complaint is already resolved", "COMPLAINT_ALREADY_RESOLVED"));
    }

    complaint.status = ComplaintStatus::Resolved;
    complaint.response = Some(response.to_string());
    complaint.resolved_at = Some(now);
    complaint.resolved_by = Some(resolver.id.clone());
    store.save(&complaint).await?;
    tracing::info!("Complaint {} resolved by {}", complaint.id, resolver.id);
    Ok(complaint)
}
