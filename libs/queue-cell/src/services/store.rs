use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::models::{QueueScope, QueueSnapshot, QueueStats, QueueToken, SnapshotEntry, TokenStatus};

/// All tokens for one (provider, queue day), guarded by that scope's lock.
#[derive(Default)]
pub(crate) struct ScopeQueue {
    pub(crate) tokens: Vec<QueueToken>,
}

impl ScopeQueue {
    pub(crate) fn max_token_number(&self) -> u32 {
        self.tokens.iter().map(|t| t.token_number).max().unwrap_or(0)
    }

    pub(crate) fn waiting_count(&self) -> u32 {
        self.tokens
            .iter()
            .filter(|t| t.status == TokenStatus::Waiting)
            .count() as u32
    }

    pub(crate) fn serving(&self) -> Option<&QueueToken> {
        self.tokens.iter().find(|t| t.status == TokenStatus::Serving)
    }

    pub(crate) fn token(&self, token_id: Uuid) -> Option<&QueueToken> {
        self.tokens.iter().find(|t| t.id == token_id)
    }

    pub(crate) fn token_mut(&mut self, token_id: Uuid) -> Option<&mut QueueToken> {
        self.tokens.iter_mut().find(|t| t.id == token_id)
    }
}

/// Single source of truth for token state.
///
/// One mutex per (provider, queue day) serializes every mutation touching
/// that queue; different scopes proceed in parallel. The scope, directory and
/// appointment maps have short non-awaiting critical sections and are never
/// held while waiting on a scope lock.
pub struct TokenStore {
    scopes: RwLock<HashMap<QueueScope, Arc<Mutex<ScopeQueue>>>>,
    directory: RwLock<HashMap<Uuid, QueueScope>>,
    appointments: RwLock<HashMap<Uuid, Uuid>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            directory: RwLock::new(HashMap::new()),
            appointments: RwLock::new(HashMap::new()),
        }
    }

    /// Acquire the mutation lock for a scope, creating the queue on first use.
    pub(crate) async fn lock_scope(&self, scope: QueueScope) -> OwnedMutexGuard<ScopeQueue> {
        let cell = {
            let scopes = self.scopes.read().await;
            scopes.get(&scope).cloned()
        };

        let cell = match cell {
            Some(cell) => cell,
            None => {
                let mut scopes = self.scopes.write().await;
                scopes
                    .entry(scope)
                    .or_insert_with(|| {
                        debug!("Creating queue for scope {}", scope);
                        Arc::new(Mutex::new(ScopeQueue::default()))
                    })
                    .clone()
            }
        };

        cell.lock_owned().await
    }

    /// Claim an appointment for a token. Returns false when the appointment
    /// already holds one, in which case nothing is recorded.
    pub(crate) async fn reserve_appointment(&self, appointment_id: Uuid, token_id: Uuid) -> bool {
        let mut appointments = self.appointments.write().await;
        match appointments.entry(appointment_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(token_id);
                true
            }
        }
    }

    /// Record which scope a token lives in, for id-based lookups.
    pub(crate) async fn register(&self, token_id: Uuid, scope: QueueScope) {
        self.directory.write().await.insert(token_id, scope);
    }

    pub async fn locate(&self, token_id: Uuid) -> Option<QueueScope> {
        self.directory.read().await.get(&token_id).copied()
    }

    pub async fn get_token(&self, token_id: Uuid) -> Option<QueueToken> {
        let scope = self.locate(token_id).await?;
        let queue = self.lock_scope(scope).await;
        queue.token(token_id).cloned()
    }

    pub async fn token_for_appointment(&self, appointment_id: Uuid) -> Option<Uuid> {
        self.appointments.read().await.get(&appointment_id).copied()
    }

    /// Point-in-time view for live displays: the serving token plus the
    /// ordered waiting list. Never deleted terminal tokens are excluded.
    pub async fn snapshot(&self, provider_id: Uuid, queue_date: NaiveDate) -> QueueSnapshot {
        let scope = QueueScope::new(provider_id, queue_date);
        let cell = {
            let scopes = self.scopes.read().await;
            scopes.get(&scope).cloned()
        };

        let mut serving = None;
        let mut waiting = Vec::new();

        if let Some(cell) = cell {
            let queue = cell.lock().await;
            serving = queue.serving().map(SnapshotEntry::from_token);
            waiting = queue
                .tokens
                .iter()
                .filter(|t| t.status == TokenStatus::Waiting)
                .map(SnapshotEntry::from_token)
                .collect::<Vec<_>>();
            waiting.sort_by_key(|entry| entry.position);
        }

        QueueSnapshot {
            provider_id,
            queue_date,
            serving,
            waiting,
        }
    }

    pub async fn stats(&self, provider_id: Uuid, queue_date: NaiveDate) -> QueueStats {
        let scope = QueueScope::new(provider_id, queue_date);
        let cell = {
            let scopes = self.scopes.read().await;
            scopes.get(&scope).cloned()
        };

        let mut stats = QueueStats {
            provider_id,
            queue_date,
            waiting: 0,
            emergency_waiting: 0,
            completed: 0,
            skipped: 0,
            now_serving: None,
        };

        if let Some(cell) = cell {
            let queue = cell.lock().await;
            for token in &queue.tokens {
                match token.status {
                    TokenStatus::Waiting => {
                        stats.waiting += 1;
                        if token.is_emergency {
                            stats.emergency_waiting += 1;
                        }
                    }
                    TokenStatus::Serving => stats.now_serving = Some(token.token_number),
                    TokenStatus::Completed => stats.completed += 1,
                    TokenStatus::Skipped => stats.skipped += 1,
                }
            }
        }

        stats
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}
