// src/extractors/mod.rs
pub mod body;
pub mod current_user;
pub mod uuid;

pub use body::{JsonBody, QueryParams};
pub use current_user::CurrentUser;
pub use uuid::UuidPath;
