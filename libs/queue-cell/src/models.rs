use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One independent queue instance: a provider's waiting line for one logical day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueScope {
    pub provider_id: Uuid,
    pub queue_date: NaiveDate,
}

impl QueueScope {
    pub fn new(provider_id: Uuid, queue_date: NaiveDate) -> Self {
        Self {
            provider_id,
            queue_date,
        }
    }
}

impl fmt::Display for QueueScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider_id, self.queue_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Waiting,
    Serving,
    Completed,
    Skipped,
}

impl TokenStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TokenStatus::Completed | TokenStatus::Skipped)
    }

    pub fn can_transition_to(&self, target: &TokenStatus) -> bool {
        use TokenStatus::*;
        matches!(
            (self, target),
            (Waiting, Serving) | (Serving, Completed) | (Waiting, Skipped)
        )
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TokenStatus::Waiting => "waiting",
            TokenStatus::Serving => "serving",
            TokenStatus::Completed => "completed",
            TokenStatus::Skipped => "skipped",
        })
    }
}

/// One patient's place in one provider's queue for one day.
///
/// Tokens are created by the allocator, mutated only through status
/// transitions, and never deleted; terminal tokens stay behind for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueToken {
    pub id: Uuid,
    pub token_number: u32,
    pub provider_id: Uuid,
    pub appointment_id: Uuid,
    pub queue_date: NaiveDate,
    pub is_emergency: bool,
    pub status: TokenStatus,
    /// 1-based rank among waiting tokens of the same scope; `None` otherwise.
    pub position: Option<u32>,
    pub check_in_time: DateTime<Utc>,
    pub called_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
}

impl QueueToken {
    pub fn scope(&self) -> QueueScope {
        QueueScope::new(self.provider_id, self.queue_date)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocateTokenRequest {
    pub provider_id: Uuid,
    pub appointment_id: Uuid,
    pub queue_date: NaiveDate,
    #[serde(default)]
    pub is_emergency: bool,
    pub avg_consult_minutes: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenIssued {
    pub token_id: Uuid,
    pub token_number: u32,
    pub position: u32,
    pub estimated_wait_minutes: u32,
    pub estimate_degraded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub target_status: TokenStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EstimateRequest {
    pub provider_id: Uuid,
    pub queue_date: NaiveDate,
    #[serde(default)]
    pub is_emergency: bool,
    pub avg_consult_minutes: Option<f64>,
    pub hour_of_day: Option<u32>,
}

/// Advisory wait prediction. `degraded` marks an estimate computed from the
/// fallback consultation time rather than real provider data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WaitEstimate {
    pub minutes: u32,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePosition {
    pub token_id: Uuid,
    pub token_number: u32,
    pub position: u32,
    pub is_emergency: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub provider_id: Uuid,
    pub queue_date: NaiveDate,
    pub serving: Option<SnapshotEntry>,
    pub waiting: Vec<SnapshotEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotEntry {
    pub token_id: Uuid,
    pub token_number: u32,
    pub position: Option<u32>,
    pub is_emergency: bool,
}

impl SnapshotEntry {
    pub(crate) fn from_token(token: &QueueToken) -> Self {
        Self {
            token_id: token.id,
            token_number: token.token_number,
            position: token.position,
            is_emergency: token.is_emergency,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    pub provider_id: Uuid,
    pub queue_date: NaiveDate,
    pub waiting: u64,
    pub emergency_waiting: u64,
    pub completed: u64,
    pub skipped: u64,
    pub now_serving: Option<u32>,
}

/// Published on every visible change to a scope's queue, in commit order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    TokenCreated {
        token: QueueToken,
        ordering: Vec<QueuePosition>,
    },
    TokenStatusChanged {
        token: QueueToken,
        previous_status: TokenStatus,
        ordering: Vec<QueuePosition>,
    },
}
