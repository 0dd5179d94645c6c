use thiserror::Error;
use uuid::Uuid;

use crate::models::TokenStatus;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Appointment {0} already has a queue token")]
    DuplicateToken(Uuid),

    #[error("Provider is busy: token {serving_token_number} is currently being served")]
    ProviderBusy { serving_token_number: u32 },

    #[error("Illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: TokenStatus,
        to: TokenStatus,
    },

    #[error("Token not found: {0}")]
    TokenNotFound(Uuid),
}
