// src/web/mod.rs
pub mod admin_handlers;
pub mod auth_handlers;
pub mod club_handlers;
pub mod health_handlers;
pub mod interview_handlers;
pub mod mess_handlers;
pub mod mw_auth;
pub mod mw_club;
pub mod mw_ownership;
pub mod mw_roles;
pub mod mw_throttle;
pub mod realtime_handlers;
pub mod resume_handlers;
pub mod routes;
pub mod schedule_handlers;
pub mod user_handlers;
