// src/models/mess.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    db::{Collection, Document},
    services::policy::{OwnerFields, Owned},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintType {
    FoodQuality,
    Service,
    Hygiene,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: String,
    pub user: String,
    pub user_name: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ComplaintType,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_by: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl Document for Complaint {
    const COLLECTION: Collection = Collection::Complaints;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Owned for Complaint {
    fn owner_fields(&self) -> OwnerFields<'_> {
        OwnerFields { user: Some(&self.user), ..Default::default() }
    }
}

/// Meals served per weekday.
#[derive(Debug, Clone, Serialize)]
pub struct DayMenu {
    pub breakfast: Vec<&'static str>,
    pub lunch: Vec<&'static str>,
    pub dinner: Vec<&'static str>,
}

pub fn weekly_menu() -> BTreeMap<&'static str, DayMenu> {
    let mut menu = BTreeMap::new();
    menu.insert(
        "Monday",
        DayMenu {
            breakfast: vec!["Poha", "Tea/Coffee", "Banana"],
            lunch: vec!["Rice", "Dal", "Sabzi", "Roti", "Pickle"],
            dinner: vec!["Roti", "Rice", "Dal", "Sabzi", "Curd"],
        },
    );
    menu.insert(
        "Tuesday",
        DayMenu {
            breakfast: vec!["Upma", "Tea/Coffee", "Boiled Eggs"],
            lunch: vec!["Rice", "Sambar", "Dry Sabzi", "Roti", "Papad"],
            dinner: vec!["Roti", "Rice", "Dal", "Paneer Sabzi", "Salad"],
        },
    );
    menu
}
