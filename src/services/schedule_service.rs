// src/services/schedule_service.rs
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::DocumentStore,
    error::{AppError, AppResult},
    models::schedule::{
        parse_clock, ClassSlot, ClassType, Exam, ExamType, Location, Priority, Recurrence, Reminder, Schedule,
        EventStatus, EventType, ScheduleEvent, SyllabusTopic,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
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
    #[serde(default = "default_credits")]
    pub credits: u8,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub academic_year: String,
}

fn default_credits() -> u8 {
    3
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub priority: Priority,
    pub location: Option<String>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    pub recurring: Option<Recurrence>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
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
    pub total_marks: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upcoming {
    pub upcoming_events: Vec<ScheduleEvent>,
    pub upcoming_exams: Vec<Exam>,
    pub today_classes: Vec<ClassSlot>,
}

fn non_empty(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn clock(field: &str, value: &str) -> AppResult<u32> {
    parse_clock(value.trim())
        .ok_or_else(|| AppError::validation(format!("{field} must be in HH:MM format")))
}

/// The account's schedule, created empty on first access.
pub async fn get_or_create(store: &DocumentStore, account_id: &str, now: DateTime<Utc>) -> AppResult<Schedule> {
    if let Some(schedule) = store.find_by_unique_key::<Schedule>(account_id).await? {
        return Ok(schedule);
    }
    let schedule = store.create_or_fetch(Schedule::empty(account_id, now)).await?;
    tracing::debug!("Schedule {} ready for {}", schedule.id, account_id);
    Ok(schedule)
}

pub async fn add_class(store: &DocumentStore, account_id: &str, new: NewClass, now: DateTime<Utc>) -> AppResult<ClassSlot> {
    if new.day_of_week > 6 {
        return Err(AppError::validation("Day of week must be between 0 and 6"));
    }
    let start = clock("Start time", &new.start_time)?;
    let end = clock("End time", &new.end_time)?;
    if end <= start {
        return Err(AppError::validation("End time must be after start time"));
    }

    let slot = ClassSlot {
        id: Uuid::new_v4().to_string(),
        subject: non_empty("Subject", &new.subject)?,
        subject_code: non_empty("Subject code", &new.subject_code)?,
        instructor_name: non_empty("Instructor name", &new.instructor_name)?,
        class_type: new.class_type,
        day_of_week: new.day_of_week,
        start_time: new.start_time.trim().to_string(),
        end_time: new.end_time.trim().to_string(),
        location: new.location,
        duration: end - start,
        credits: new.credits,
        semester: new.semester,
        academic_year: new.academic_year,
        is_active: true,
    };

    let mut schedule = get_or_create(store, account_id, now).await?;
    schedule.classes.push(slot.clone());
    store.save(&schedule).await?;
    Ok(slot)
}

pub async fn add_event(store: &DocumentStore, account_id: &str, new: NewEvent, now: DateTime<Utc>) -> AppResult<ScheduleEvent> {
    if new.end_date.is_some_and(|end| end < new.start_date) {
        return Err(AppError::validation("End date must be after start date"));
    }
    let event = ScheduleEvent {
        id: Uuid::new_v4().to_string(),
        title: non_empty("Title", &new.title)?,
        description: new.description,
        kind: new.kind,
        start_date: new.start_date,
        end_date: new.end_date,
        is_all_day: new.is_all_day,
        priority: new.priority,
        status: EventStatus::Pending,
        location: new.location,
        reminders: new.reminders,
        recurring: new.recurring,
        tags: new.tags,
    };

    let mut schedule = get_or_create(store, account_id, now).await?;
    schedule.events.push(event.clone());
    store.save(&schedule).await?;
    Ok(event)
}

pub async fn add_exam(store: &DocumentStore, account_id: &str, new: NewExam, now: DateTime<Utc>) -> AppResult<Exam> {
    clock("Start time", &new.start_time)?;
    if new.duration == 0 {
        return Err(AppError::validation("Duration must be a positive number of minutes"));
    }
    let exam = Exam {
        id: Uuid::new_v4().to_string(),
        subject: non_empty("Subject", &new.subject)?,
        subject_code: non_empty("Subject code", &new.subject_code)?,
        exam_type: new.exam_type,
        date: new.date,
        start_time: new.start_time.trim().to_string(),
        duration: new.duration,
        location: new.location,
        syllabus: new.syllabus,
        total_marks: new.total_marks,
        obtained_marks: None,
        result: None,
    };

    let mut schedule = get_or_create(store, account_id, now).await?;
    schedule.exams.push(exam.clone());
    store.save(&schedule).await?;
    Ok(exam)
}

pub async fn complete_event(store: &DocumentStore, account_id: &str, event_id: &str, now: DateTime<Utc>) -> AppResult<()> {
    let mut schedule = get_or_create(store, account_id, now).await?;
    if !schedule.complete_event(event_id) {
        return Err(AppError::not_found("Event not found", "EVENT_NOT_FOUND"));
    }
    store.save(&schedule).await
}

/// Upcoming events and exams (at most `limit` each) plus today's classes.
pub async fn upcoming(store: &DocumentStore, account_id: &str, limit: usize, now: DateTime<Utc>) -> AppResult<Upcoming> {
    let schedule = get_or_create(store, account_id, now).await?;
    let weekday = now.weekday().num_days_from_sunday() as u8;
    Ok(Upcoming {
        upcoming_events: schedule.upcoming_events(now).into_iter().take(limit).cloned().collect(),
        upcoming_exams: schedule.upcoming_exams(now).into_iter().take(limit).cloned().collect(),
        today_classes: schedule.classes_on(weekday).into_iter().cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use chrono::Duration;

    #[tokio::test]
    async fn concurrent_first_access_shares_one_schedule() {
        let store = test_store().await;
        let now = Utc::now();
        let (a, b) = tokio::join!(get_or_create(&store, "u1", now), get_or_create(&store, "u1", now));
        assert_eq!(a.unwrap().id, b.unwrap().id);
        assert_eq!(store.count::<Schedule, _>(|s| s.user == "u1").await.unwrap(), 1);
    }

    fn lecture(start: &str, end: &str) -> NewClass {
        NewClass {
            subject: "Compilers".into(),
            subject_code: "CS401".into(),
            instructor_name: "Dr. Rao".into(),
            class_type: ClassType::Lecture,
            day_of_week: 1,
            start_time: start.into(),
            end_time: end.into(),
            location: Location::default(),
            credits: 4,
            semester: "7".into(),
            academic_year: "2026-27".into(),
        }
    }

    #[tokio::test]
    async fn schedule_is_created_once_per_account() {
        let store = test_store().await;
        let first = get_or_create(&store, "u1", Utc::now()).await.unwrap();
        let second = get_or_create(&store, "u1", Utc::now()).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn classes_need_a_valid_time_window() {
        let store = test_store().await;
        let slot = add_class(&store, "u1", lecture("9:00", "10:30"), Utc::now()).await.unwrap();
        assert_eq!(slot.duration, 90);

        let err = add_class(&store, "u1", lecture("11:00", "10:00"), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { code: "VALIDATION_ERROR", .. }));
        let err = add_class(&store, "u1", lecture("25:00", "26:00"), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn completing_events() {
        let store = test_store().await;
        let now = Utc::now();
        let event = add_event(
            &store,
            "u1",
            NewEvent {
                title: "Lab report".into(),
                description: None,
                kind: EventType::Assignment,
                start_date: now + Duration::days(1),
                end_date: None,
                is_all_day: false,
                priority: Priority::High,
                location: None,
                reminders: vec![],
                recurring: None,
                tags: vec![],
            },
            now,
        )
        .await
        .unwrap();

        assert_eq!(upcoming(&store, "u1", 10, now).await.unwrap().upcoming_events.len(), 1);
        complete_event(&store, "u1", &event.id, now).await.unwrap();
        assert!(upcoming(&store, "u1", 10, now).await.unwrap().upcoming_events.is_empty());

        let err = complete_event(&store, "u1", "missing", now).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { code: "EVENT_NOT_FOUND", .. }));
    }
}
