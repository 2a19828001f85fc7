// src/api/handlers/mod.rs
pub mod timetable_handler;
