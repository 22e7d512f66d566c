// src/models/mod.rs
pub mod account;
pub mod club;
pub mod interview;
pub mod mess;
pub mod page;
pub mod realtime;
pub mod resume;
pub mod schedule;
