// src/service/mod.rs
pub mod timetable_service;
