//! Creation (admission) policies.
//!
//! Admission is checked *before* construction so the cache never builds an
//! instance it would have to throw away. A refusal (`Ok(false)`) makes the
//! cache evict one idle instance and then construct anyway; an error aborts
//! the request.
//!
//! | Policy                    | `can_create`                              | Hooks            |
//! |---------------------------|-------------------------------------------|------------------|
//! | [`AlwaysCreate`]          | `Ok(true)`                                | none             |
//! | [`NeverCreate`]           | `Err(CreationForbidden)`                  | none             |
//! | [`RateLimitedCreation`]   | `Err(CreationRateExceeded)` above the rate| create logs time |
//! | [`AmountLimitedCreation`] | `Ok(live < max_live)`                     | count live       |
//!
//! `NeverCreate` exists for tests and diagnostics only.
//!
//! ## Example Usage
//!
//! ```
//! use cachedfactory::policy::creation::AmountLimitedCreation;
//! use cachedfactory::traits::CreationPolicy;
//!
//! let mut policy = AmountLimitedCreation::try_new(2).unwrap();
//! policy.on_create();
//! assert_eq!(policy.can_create(), Ok(true));
//! policy.on_create();
//! assert_eq!(policy.can_create(), Ok(false));
//! policy.on_destroy();
//! assert_eq!(policy.can_create(), Ok(true));
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{CacheError, ConfigError, Result};
use crate::traits::CreationPolicy;

/// Default rate: at most this many creations per [`DEFAULT_RATE_WINDOW`].
pub const DEFAULT_MAX_CREATIONS: usize = 10;
/// Default sliding window of [`RateLimitedCreation`].
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_millis(1000);
/// Default live-instance cap of [`AmountLimitedCreation`].
pub const DEFAULT_MAX_LIVE: usize = 10;

// ---------------------------------------------------------------------------
// AlwaysCreate / NeverCreate
// ---------------------------------------------------------------------------

/// Always allows creation.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysCreate;

impl CreationPolicy for AlwaysCreate {
    #[inline]
    fn can_create(&mut self) -> Result<bool> {
        Ok(true)
    }

    #[inline]
    fn on_create(&mut self) {}

    #[inline]
    fn on_destroy(&mut self) {}

    fn name(&self) -> &'static str {
        "always"
    }
}

/// Never allows creation; every miss fails with
/// [`CacheError::CreationForbidden`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCreate;

impl CreationPolicy for NeverCreate {
    #[inline]
    fn can_create(&mut self) -> Result<bool> {
        Err(CacheError::CreationForbidden)
    }

    #[inline]
    fn on_create(&mut self) {}

    #[inline]
    fn on_destroy(&mut self) {}

    fn name(&self) -> &'static str {
        "never"
    }
}

// ---------------------------------------------------------------------------
// RateLimitedCreation
// ---------------------------------------------------------------------------

/// Limits how many creations may happen within a sliding time window.
///
/// Keeps a timestamp per creation. `can_create` first drops timestamps older
/// than the window, then fails if more than `max_creations` remain.
#[derive(Debug, Clone)]
pub struct RateLimitedCreation {
    created_at: VecDeque<Instant>,
    max_creations: usize,
    window: Duration,
}

impl Default for RateLimitedCreation {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitedCreation {
    /// `DEFAULT_MAX_CREATIONS` creations per `DEFAULT_RATE_WINDOW`.
    pub fn new() -> Self {
        Self {
            created_at: VecDeque::new(),
            max_creations: DEFAULT_MAX_CREATIONS,
            window: DEFAULT_RATE_WINDOW,
        }
    }

    /// Builds a policy allowing `max_creations` within `window`.
    pub fn try_new(max_creations: usize, window: Duration) -> Result<Self, ConfigError> {
        let mut policy = Self::new();
        policy.set_rate(max_creations, window)?;
        Ok(policy)
    }

    /// No more than `max_creations` within `window`. Both must be non-zero.
    pub fn set_rate(&mut self, max_creations: usize, window: Duration) -> Result<(), ConfigError> {
        if max_creations == 0 {
            return Err(ConfigError::new("max_creations must be > 0"));
        }
        if window.is_zero() {
            return Err(ConfigError::new("rate window must be > 0"));
        }
        self.max_creations = max_creations;
        self.window = window;
        debug!(
            "rate limit set to {} creations within {} ms",
            max_creations,
            window.as_millis()
        );
        Ok(())
    }

    pub fn max_creations(&self) -> usize {
        self.max_creations
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Creations currently inside the window (as of the last purge).
    pub fn logged(&self) -> usize {
        self.created_at.len()
    }

    /// [`can_create`](CreationPolicy::can_create) evaluated at `now`.
    pub fn can_create_at(&mut self, now: Instant) -> Result<bool> {
        self.purge(now);
        if self.created_at.len() > self.max_creations {
            debug!(
                "creation refused: {} creations within {} ms",
                self.created_at.len(),
                self.window.as_millis()
            );
            return Err(CacheError::CreationRateExceeded {
                max_creations: self.max_creations,
                window: self.window,
            });
        }
        Ok(true)
    }

    /// [`on_create`](CreationPolicy::on_create) recorded at `now`.
    pub fn on_create_at(&mut self, now: Instant) {
        self.created_at.push_back(now);
    }

    fn purge(&mut self, now: Instant) {
        // timestamps are pushed in order, so stale ones sit at the front
        while let Some(&oldest) = self.created_at.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.created_at.pop_front();
            } else {
                break;
            }
        }
    }
}

impl CreationPolicy for RateLimitedCreation {
    fn can_create(&mut self) -> Result<bool> {
        self.can_create_at(Instant::now())
    }

    fn on_create(&mut self) {
        self.on_create_at(Instant::now());
    }

    #[inline]
    fn on_destroy(&mut self) {}

    fn name(&self) -> &'static str {
        "rate limited"
    }
}

// ---------------------------------------------------------------------------
// AmountLimitedCreation
// ---------------------------------------------------------------------------

/// Caps the number of live instances (idle + checked out).
#[derive(Debug, Clone)]
pub struct AmountLimitedCreation {
    max_live: usize,
    live: usize,
}

impl Default for AmountLimitedCreation {
    fn default() -> Self {
        Self::new()
    }
}

impl AmountLimitedCreation {
    /// Cap of `DEFAULT_MAX_LIVE`.
    pub fn new() -> Self {
        Self {
            max_live: DEFAULT_MAX_LIVE,
            live: 0,
        }
    }

    pub fn try_new(max_live: usize) -> Result<Self, ConfigError> {
        let mut policy = Self::new();
        policy.set_max_creation(max_live)?;
        Ok(policy)
    }

    /// Sets the live-instance cap. Must be non-zero.
    ///
    /// Lowering the cap below the current live count does not destroy
    /// anything; the next misses each evict one instance instead.
    pub fn set_max_creation(&mut self, max_live: usize) -> Result<(), ConfigError> {
        if max_live == 0 {
            return Err(ConfigError::new("max_live must be > 0"));
        }
        self.max_live = max_live;
        debug!("live instance cap set to {}", max_live);
        Ok(())
    }

    pub fn max_live(&self) -> usize {
        self.max_live
    }

    pub fn live(&self) -> usize {
        self.live
    }
}

impl CreationPolicy for AmountLimitedCreation {
    #[inline]
    fn can_create(&mut self) -> Result<bool> {
        Ok(self.live < self.max_live)
    }

    #[inline]
    fn on_create(&mut self) {
        self.live += 1;
    }

    #[inline]
    fn on_destroy(&mut self) {
        self.live = self.live.saturating_sub(1);
    }

    fn name(&self) -> &'static str {
        "amount limited"
    }
}
