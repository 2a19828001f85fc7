// src/api/dto/mod.rs
pub mod timetable_dto;
