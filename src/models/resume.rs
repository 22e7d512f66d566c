// src/models/resume.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db::{Collection, Document},
    services::policy::{OwnerFields, Owned},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeTemplate {
    #[default]
    Modern,
    Classic,
    Creative,
    Minimal,
}

/// Resume sections are kept as free-form JSON; the builder UI owns their shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub personal_info: Value,
    #[serde(default)]
    pub education: Vec<Value>,
    #[serde(default)]
    pub experience: Vec<Value>,
    #[serde(default)]
    pub skills: Vec<Value>,
    #[serde(default)]
    pub projects: Vec<Value>,
    #[serde(default)]
    pub certifications: Vec<Value>,
    #[serde(default)]
    pub template: ResumeTemplate,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Document for Resume {
    const COLLECTION: Collection = Collection::Resumes;
    const UNIQUE_FIELD: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.user.clone())
    }
}

impl Owned for Resume {
    fn owner_fields(&self) -> OwnerFields<'_> {
        OwnerFields { user: Some(&self.user), ..Default::default() }
    }
}

/// Partial update; absent sections keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeUpdate {
    pub personal_info: Option<Value>,
    pub education: Option<Vec<Value>>,
    pub experience: Option<Vec<Value>>,
    pub skills: Option<Vec<Value>>,
    pub projects: Option<Vec<Value>>,
    pub certifications: Option<Vec<Value>>,
    pub template: Option<ResumeTemplate>,
}

impl Resume {
    pub fn blank(id: String, user: &str) -> Self {
        Self {
            id,
            user: user.to_string(),
            personal_info: Value::Object(Default::default()),
            education: Vec::new(),
            experience: Vec::new(),
            skills: Vec::new(),
            projects: Vec::new(),
            certifications: Vec::new(),
            template: ResumeTemplate::default(),
            last_updated: None,
        }
    }

    pub fn apply(&mut self, update: ResumeUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.personal_info {
            self.personal_info = v;
        }
        if let Some(v) = update.education {
            self.education = v;
        }
        if let Some(v) = update.experience {
            self.experience = v;
        }
        if let Some(v) = update.skills {
            self.skills = v;
        }
        if let Some(v) = update.projects {
            self.projects = v;
        }
        if let Some(v) = update.certifications {
            self.certifications = v;
        }
        if let Some(v) = update.template {
            self.template = v;
        }
        self.last_updated = Some(now);
    }
}
