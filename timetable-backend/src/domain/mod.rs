// src/domain/mod.rs
pub mod activity;
pub mod clock;
pub mod timetable;
pub mod timetable_model;
pub mod timetable_stats;
pub mod week_period;
