use std::sync::Arc;

use chrono::Timelike;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::QueueError;
use crate::models::{
    AllocateTokenRequest, QueueEvent, QueueScope, QueueToken, TokenIssued, TokenStatus,
};
use crate::services::clock::{Clock, TariffBucket};
use crate::services::estimator;
use crate::services::orderer;
use crate::services::publisher::QueueEventPublisher;
use crate::services::store::TokenStore;

/// The only component that creates tokens.
pub struct TokenAllocator {
    store: Arc<TokenStore>,
    publisher: QueueEventPublisher,
    clock: Arc<dyn Clock>,
}

impl TokenAllocator {
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

    /// Issue the next token for a confirmed appointment.
    ///
    /// Runs entirely under the scope lock: the max-number read, the insert
    /// and the reorder commit together or not at all, so concurrent bookings
    /// for the same provider and day can never share a token number.
    pub async fn allocate(&self, request: AllocateTokenRequest) -> Result<TokenIssued, QueueError> {
        let scope = QueueScope::new(request.provider_id, request.queue_date);
        let mut queue = self.store.lock_scope(scope).await;

        let token_id = Uuid::new_v4();
        if !self
            .store
            .reserve_appointment(request.appointment_id, token_id)
            .await
        {
            debug!(
                "Appointment {} already holds a token",
                request.appointment_id
            );
            return Err(QueueError::DuplicateToken(request.appointment_id));
        }

        // Booking-time estimate sees the queue as it was before this token
        // joined; the emergency factor models the jump to the front.
        let ahead = queue.waiting_count();
        let token_number = queue.max_token_number() + 1;
        let now = self.clock.now();

        let mut token = QueueToken {
            id: token_id,
            token_number,
            provider_id: request.provider_id,
            appointment_id: request.appointment_id,
            queue_date: request.queue_date,
            is_emergency: request.is_emergency,
            status: TokenStatus::Waiting,
            position: None,
            check_in_time: now,
            called_time: None,
            completed_time: None,
        };

        queue.tokens.push(token.clone());
        let ordering = orderer::reorder(&mut queue.tokens);

        let position = ordering
            .iter()
            .find(|p| p.token_id == token_id)
            .map(|p| p.position)
            .unwrap_or(ahead + 1);
        token.position = Some(position);

        let bucket = TariffBucket::from_hour(now.hour());
        let estimate = estimator::estimate_or_default(
            ahead,
            request.avg_consult_minutes,
            request.is_emergency,
            bucket,
        );

        self.store.register(token_id, scope).await;
        self.publisher
            .publish(
                scope,
                &QueueEvent::TokenCreated {
                    token: token.clone(),
                    ordering,
                },
            )
            .await;

        info!(
            "Issued token #{} at position {} for scope {}",
            token_number, position, scope
        );

        Ok(TokenIssued {
            token_id,
            token_number,
            position,
            estimated_wait_minutes: estimate.minutes,
            estimate_degraded: estimate.degraded,
        })
    }
}
