// timetable-backend/src/utils/validation.rs

//! DTO で共有するバリデーション定数と関数

use validator::ValidationError;

/// アクティビティ定義の制約
pub mod activity {
    pub const FIELD_MAX_LENGTH: u64 = 100;
    pub const CATALOG_MAX_SIZE: u64 = 50;
}

/// タイムテーブル本体の制約
pub mod timetable {
    pub const NAME_MIN_LENGTH: u64 = 1;
    pub const NAME_MAX_LENGTH: u64 = 100;
    pub const DESCRIPTION_MAX_LENGTH: u64 = 500;
}

/// 空白だけの文字列を拒否する
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("Value must not be blank".into());
        return Err(error);
    }
    Ok(())
}
