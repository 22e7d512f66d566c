// src/services/mod.rs
pub mod admin_service;
pub mod auth_service;
pub mod club_service;
pub mod interview_service;
pub mod mess_service;
pub mod policy;
pub mod realtime_service;
pub mod resume_service;
pub mod schedule_service;
pub mod user_service;
