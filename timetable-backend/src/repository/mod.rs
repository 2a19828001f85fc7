// src/repository/mod.rs
pub mod in_memory_timetable_store;
pub mod timetable_repository;
pub mod timetable_store;

pub use in_memory_timetable_store::InMemoryTimetableStore;
pub use timetable_repository::TimetableRepository;
pub use timetable_store::TimetableStore;
