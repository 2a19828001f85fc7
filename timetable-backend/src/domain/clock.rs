// timetable-backend/src/domain/clock.rs

//! 時刻と識別子の供給元
//!
//! 週のロールオーバーはサーバーのローカル時刻で判定する。テストで
//! システム時計を操作せずに済むよう、どちらもトレイトとして注入する。

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use uuid::Uuid;

/// 現在時刻を返す
pub trait Clock: Send + Sync {
    /// 週の境界判定に使うローカル時刻
    fn now(&self) -> NaiveDateTime;

    /// `created_at` / `updated_at` に記録する時刻
    fn timestamp(&self) -> DateTime<Utc>;
}

/// サーバーのローカル時計
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 新しい一意な識別子を返す
pub trait IdGenerator: Send + Sync {
    fn new_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
