use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::QueueError;
use crate::models::{QueueEvent, QueueToken, TokenStatus};
use crate::services::clock::Clock;
use crate::services::orderer;
use crate::services::publisher::QueueEventPublisher;
use crate::services::store::TokenStore;

/// Enforces the legal status transitions and their side effects.
///
/// waiting -> serving -> completed is the happy path; waiting -> skipped
/// covers a patient who is absent when called. Terminal states accept
/// nothing further.
pub struct StatusMachine {
    store: Arc<TokenStore>,
    publisher: QueueEventPublisher,
    clock: Arc<dyn Clock>,
}

impl StatusMachine {
    pub fn new(
        store: Arc<TokenStore>,
        publisher: QueueEventPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    /// Apply one status transition and recompute the waiting ranking.
    ///
    /// All validation happens before any field is touched, so a rejected
    /// call leaves the queue exactly as it was.
    pub async fn transition(
        &self,
        token_id: Uuid,
        target: TokenStatus,
    ) -> Result<QueueToken, QueueError> {
        let scope = self
            .store
            .locate(token_id)
            .await
            .ok_or(QueueError::TokenNotFound(token_id))?;
        let mut queue = self.store.lock_scope(scope).await;

        let current = queue
            .token(token_id)
            .map(|t| t.status)
            .ok_or(QueueError::TokenNotFound(token_id))?;

        if !current.can_transition_to(&target) {
            return Err(QueueError::IllegalTransition {
                from: current,
                to: target,
            });
        }

        if target == TokenStatus::Serving {
            if let Some(serving) = queue.serving() {
                debug!(
                    "Scope {} is already serving token #{}",
                    scope, serving.token_number
                );
                return Err(QueueError::ProviderBusy {
                    serving_token_number: serving.token_number,
                });
            }
        }

        let now = self.clock.now();
        if let Some(token) = queue.token_mut(token_id) {
            token.status = target;
            match target {
                TokenStatus::Serving => token.called_time = Some(now),
                TokenStatus::Completed => token.completed_time = Some(now),
                _ => {}
            }
        }

        let ordering = orderer::reorder(&mut queue.tokens);
        let token = queue
            .token(token_id)
            .cloned()
            .ok_or(QueueError::TokenNotFound(token_id))?;

        self.publisher
            .publish(
                scope,
                &QueueEvent::TokenStatusChanged {
                    token: token.clone(),
                    previous_status: current,
                    ordering,
                },
            )
            .await;

        info!(
            "Token #{} moved from {} to {} in scope {}",
            token.token_number, current, target, scope
        );

        Ok(token)
    }
}
