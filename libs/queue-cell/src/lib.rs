pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

use std::sync::Arc;

use shared_config::AppConfig;

pub use error::*;
pub use models::*;
pub use router::create_queue_router;
pub use services::*;

/// Shared state behind the queue routes: the store plus the two mutating
/// services wired to the same publisher and clock.
pub struct QueueCellState {
    pub store: Arc<TokenStore>,
    pub allocator: TokenAllocator,
    pub status_machine: StatusMachine,
    pub publisher: QueueEventPublisher,
    pub clock: Arc<dyn Clock>,
}

impl QueueCellState {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(TokenStore::new());
        let publisher = QueueEventPublisher::new(config.event_channel_capacity);
        let allocator = TokenAllocator::new(
            Arc::clone(&store),
            publisher.clone(),
            Arc::clone(&clock),
        );
        let status_machine = StatusMachine::new(
            Arc::clone(&store),
            publisher.clone(),
            Arc::clone(&clock),
        );

        Self {
            store,
            allocator,
            status_machine,
            publisher,
            clock,
        }
    }
}
