// src/models/schedule.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{Collection, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    #[default]
    Lecture,
    Lab,
    Tutorial,
    Seminar,
    Practical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub building: Option<String>,
    pub room: Option<String>,
    pub floor: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
    pub id: String,
    pub subject: String,
    pub subject_code: String,
    pub instructor_name: String,
    #[serde(default)]
    pub class_type: ClassType,
    pub day_of_week: u8,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub location: Location,
    pub duration: u32,
    pub credits: u8,
    pub semester: String,
    pub academic_year: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Assignment,
    Exam,
    Project,
    Presentation,
    Meeting,
    Personal,
    Deadline,
    Reminder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Minutes before the event starts.
    pub time: u32,
    #[serde(default)]
    pub sent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    pub interval: Option<u32>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    #[serde(default)]
    pub recurring: Option<Recurrence>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    MidTerm,
    EndTerm,
    Quiz,
    Practical,
    Viva,
    Assignment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamResult {
    Pass,
    Fail,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusTopic {
    pub topic: String,
    #[serde(default)]
    pub weightage: Option<f32>,
    #[serde(default)]
    pub studied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub subject: String,
    pub subject_code: String,
    pub exam_type: ExamType,
    pub date: DateTime<Utc>,
    pub start_time: String,
    pub duration: u32,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub syllabus: Vec<SyllabusTopic>,
    #[serde(default)]
    pub total_marks: Option<f32>,
    #[serde(default)]
    pub obtained_marks: Option<f32>,
    #[serde(default)]
    pub result: Option<ExamResult>,
}

/// One per account; the three lists evolve independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: String,
    pub user: String,
    #[serde(default)]
    pub classes: Vec<ClassSlot>,
    #[serde(default)]
    pub events: Vec<ScheduleEvent>,
    #[serde(default)]
    pub exams: Vec<Exam>,
    pub created_at: DateTime<Utc>,
}

impl Document for Schedule {
    const COLLECTION: Collection = Collection::Schedules;
    const UNIQUE_FIELD: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.user.clone())
    }
}

impl Schedule {
    pub fn empty(user: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            classes: Vec::new(),
            events: Vec::new(),
            exams: Vec::new(),
            created_at: now,
        }
    }

    /// Marks an event completed. Returns false when no event has that id.
    pub fn complete_event(&mut self, event_id: &str) -> bool {
        match self.events.iter_mut().find(|e| e.id == event_id) {
            Some(event) => {
                event.status = EventStatus::Completed;
                true
            }
            None => false,
        }
    }

    /// Future events that are neither completed nor cancelled, soonest first.
    pub fn upcoming_events(&self, now: DateTime<Utc>) -> Vec<&ScheduleEvent> {
        let mut events: Vec<_> = self
            .events
            .iter()
            .filter(|e| {
                e.start_date > now && !matches!(e.status, EventStatus::Completed | EventStatus::Cancelled)
            })
            .collect();
        events.sort_by_key(|e| e.start_date);
        events
    }

    pub fn upcoming_exams(&self, now: DateTime<Utc>) -> Vec<&Exam> {
        let mut exams: Vec<_> = self.exams.iter().filter(|e| e.date > now).collect();
        exams.sort_by_key(|e| e.date);
        exams
    }

    /// Active classes on a weekday (0 = Sunday), ordered by start time.
    pub fn classes_on(&self, day_of_week: u8) -> Vec<&ClassSlot> {
        let mut classes: Vec<_> = self
            .classes
            .iter()
            .filter(|c| c.is_active && c.day_of_week == day_of_week)
            .collect();
        classes.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        classes
    }
}

/// Parses `H:MM`/`HH:MM` (24h) into minutes after midnight.
pub fn parse_clock(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return None;
    }
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(id: &str, start: DateTime<Utc>, status: EventStatus) -> ScheduleEvent {
        ScheduleEvent {
            id: id.into(),
            title: id.into(),
            description: None,
            kind: EventType::Assignment,
            start_date: start,
            end_date: None,
            is_all_day: false,
            priority: Priority::default(),
            status,
            location: None,
            reminders: Vec::new(),
            recurring: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn clock_strings() {
        assert_eq!(parse_clock("9:05"), Some(545));
        assert_eq!(parse_clock("23:59"), Some(1439));
        assert_eq!(parse_clock("24:00"), None);
        assert_eq!(parse_clock("7:5"), None);
        assert_eq!(parse_clock("noon"), None);
    }

    #[test]
    fn upcoming_skips_past_and_finished_events() {
        let now = Utc::now();
        let mut schedule = Schedule::empty("u1", now);
        schedule.events.push(event("later", now + Duration::days(2), EventStatus::Pending));
        schedule.events.push(event("soon", now + Duration::hours(1), EventStatus::InProgress));
        schedule.events.push(event("past", now - Duration::days(1), EventStatus::Pending));
        schedule.events.push(event("done", now + Duration::days(1), EventStatus::Completed));

        let ids: Vec<_> = schedule.upcoming_events(now).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "later"]);

        assert!(schedule.complete_event("later"));
        assert!(!schedule.complete_event("missing"));
        assert_eq!(schedule.upcoming_events(now).len(), 1);
    }
}
