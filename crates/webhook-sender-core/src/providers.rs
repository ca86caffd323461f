//! Injectable sources of per-delivery values.
//!
//! Each delivery carries a fresh `hash` and, unless the payload template pins
//! one, the current time. Both come from these traits so that tests can make
//! payloads, and therefore signatures, fully deterministic.

use chrono::Utc;
use ulid::Ulid;

/// Source of the unique `hash` identifier attached to each payload.
pub trait HashGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Generates ULIDs: unique and lexicographically sortable by creation time.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidHashGenerator;

impl HashGenerator for UlidHashGenerator {
    fn generate(&self) -> String {
        Ulid::new().to_string()
    }
}

/// Always returns the same identifier.
///
/// Used when an operator replays a specific delivery and in tests.
#[derive(Debug, Clone)]
pub struct FixedHashGenerator(String);

impl FixedHashGenerator {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }
}

impl HashGenerator for FixedHashGenerator {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(i64);

impl FixedClock {
    pub fn new(unix_seconds: i64) -> Self {
        Self(unix_seconds)
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0
    }
}
