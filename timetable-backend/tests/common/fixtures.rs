// tests/common/fixtures.rs
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use timetable_backend::domain::activity::Activity;
use timetable_backend::domain::clock::{Clock, IdGenerator};
use timetable_backend::repository::InMemoryTimetableStore;
use timetable_backend::service::timetable_service::TimetableService;
use uuid::Uuid;

/// 手動で進められる時計
#[derive(Clone)]
pub struct FixedClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += duration;
    }

    pub fn set(&self, value: NaiveDateTime) {
        *self.now.lock().unwrap() = value;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    // ローカル時刻をそのまま UTC とみなす
    fn timestamp(&self) -> DateTime<Utc> {
        self.now().and_utc()
    }
}

/// 連番の UUID を返す
#[derive(Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.0.fetch_add(1, Ordering::SeqCst)) + 1)
    }
}

/// 2025-08-06（水）10:00
pub fn wednesday() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 6)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// 2025-08-04（月）00:00
pub fn week_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn study_catalog() -> Vec<Activity> {
    vec![
        Activity::new("Coding", "09-11", "Dev"),
        Activity::new("Reading", "20-21", "Learning"),
    ]
}

pub struct ServiceContext {
    pub service: Arc<TimetableService>,
    pub store: InMemoryTimetableStore,
    pub clock: FixedClock,
}

/// メモリ上の保存先と固定時計でサービスを組み立てる
pub fn service_at(now: NaiveDateTime) -> ServiceContext {
    let store = InMemoryTimetableStore::new();
    let clock = FixedClock::at(now);
    let service = Arc::new(TimetableService::new(
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
        Arc::new(SequentialIds::default()),
    ));
    ServiceContext {
        service,
        store,
        clock,
    }
}
