use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use queue_cell::{AllocateTokenRequest, Clock, QueueCellState};
use shared_config::AppConfig;

pub struct FixedClock {
    now: DateTime<Utc>,
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

pub fn queue_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date")
}

pub fn fixed_clock(hour: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock {
        now: Utc
            .with_ymd_and_hms(2025, 6, 2, hour, 30, 0)
            .single()
            .expect("valid timestamp"),
    })
}

pub fn test_state(hour: u32) -> Arc<QueueCellState> {
    Arc::new(QueueCellState::with_clock(
        &AppConfig::default(),
        fixed_clock(hour),
    ))
}

pub fn allocate_request(provider_id: Uuid, is_emergency: bool) -> AllocateTokenRequest {
    AllocateTokenRequest {
        provider_id,
        appointment_id: Uuid::new_v4(),
        queue_date: queue_day(),
        is_emergency,
        avg_consult_minutes: Some(15.0),
    }
}
