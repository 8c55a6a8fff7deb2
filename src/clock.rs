//! Time and identifier sources injected into the job service.
//!
//! Both are traits so tests can pin timestamps and ids.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Source of timestamps. Implementations must never go backwards.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock clamped so it never returns an earlier value than before
#[derive(Debug, Default)]
pub struct SystemClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl SystemClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now();
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = match *last {
            Some(previous) if previous > wall => previous,
            _ => wall,
        };
        *last = Some(now);
        now
    }
}

/// Source of collision-resistant job identifiers
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
