//! Environment dependencies for the access request reducer.

use access_ledger_core::environment::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Environment dependencies for the access request reducer
#[derive(Clone)]
pub struct AccessRequestEnvironment {
    /// Clock used for creation timestamps and expiry checks
    pub clock: Arc<dyn Clock>,
}

impl AccessRequestEnvironment {
    /// Creates a new `AccessRequestEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Current time according to the injected clock
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
