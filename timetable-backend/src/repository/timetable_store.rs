// src/repository/timetable_store.rs

use crate::domain::timetable::TimetableAggregate;
use crate::error::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// タイムテーブル集約の保存先
///
/// 集約は常に丸ごと読み書きする。`save` は `version` による楽観的ロックを行い、
/// 競合した場合は `AppError::Conflict` を返す。
#[async_trait]
pub trait TimetableStore: Send + Sync {
    /// 所有者を確認して読み込む。存在しない、または他人のものなら `NotFound`
    async fn load(&self, id: Uuid, user_id: Uuid) -> AppResult<TimetableAggregate>;

    /// ユーザーのアクティブなタイムテーブル
    async fn find_active(&self, user_id: Uuid) -> AppResult<Option<TimetableAggregate>>;

    /// ユーザーのタイムテーブル一覧（作成順）
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<TimetableAggregate>>;

    /// 同じユーザーに同名のタイムテーブルがあるか
    async fn name_exists(&self, user_id: Uuid, name: &str, exclude: Option<Uuid>)
        -> AppResult<bool>;

    /// `version` が 0 なら新規作成、それ以外は楽観的ロック付きで更新する。
    /// 保存後の集約（新しい `version`）を返す
    async fn save(&self, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate>;

    /// 指定したもの以外の同ユーザーのタイムテーブルを非アクティブにする
    async fn deactivate_all_except(&self, user_id: Uuid, keep_id: Uuid) -> AppResult<u64>;

    /// 他を非アクティブにしてから集約を保存する。1つのトランザクションで行う
    async fn save_active(&self, aggregate: &TimetableAggregate) -> AppResult<TimetableAggregate>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}
