//! Abstractions for providing the current time.
//!
//! The resolution table evaluates its timeout policy lazily against a time
//! environment, so tests can advance the clock without sleeping.

use std::fmt::Debug;
use std::time::{
    Duration,
    Instant,
};

/// An environment that provides the current time.
pub trait Env: Clone + Debug {
    /// Returns an instant corresponding to "now".
    fn now(&self) -> Instant;
}

/// An environment that provides system based time.
#[derive(Clone, Debug)]
pub struct SystemEnv;

impl SystemEnv {
    pub fn new() -> SystemEnv {
        SystemEnv {}
    }
}

impl Env for SystemEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// An environment with a manually advanced clock.
#[derive(Clone, Debug)]
pub struct MockEnv {
    pub now: Instant,
}

impl MockEnv {
    pub fn new() -> MockEnv {
        MockEnv {
            now: Instant::now(),
        }
    }

    /// Moves the clock forward by secs seconds.
    pub fn advance(&mut self, secs: u64) {
        self.now += Duration::from_secs(secs);
    }
}

impl Env for MockEnv {
    fn now(&self) -> Instant {
        self.now
    }
}
