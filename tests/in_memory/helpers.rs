//! Shared fixtures for in-memory integration tests.

use crate::test_helpers::ManualClock;
use rstest::fixture;
use std::sync::Arc;
use taskmate::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::{Actor, ChatId},
    services::TaskLifecycleService,
};

/// Service type exercised by the in-memory tests.
pub type TestService = TaskLifecycleService<InMemoryTaskRepository, ManualClock>;

/// Service, its repository and the clock driving it.
pub struct Harness {
    pub service: TestService,
    pub repository: Arc<InMemoryTaskRepository>,
    pub clock: Arc<ManualClock>,
}

/// Provides a service over an empty repository and a frozen clock.
#[fixture]
pub fn harness() -> Harness {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let clock = Arc::new(ManualClock::default());
    Harness {
        service: TaskLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock)),
        repository,
        clock,
    }
}

/// Chat used by most scenarios.
pub const SHOPPING_CHAT: ChatId = ChatId::new(5);

/// Actor taking tasks in the scenarios.
pub fn alice() -> Actor {
    Actor::new("Alice").with_handle("@alice")
}
