//! Error types for the cachedfactory library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by [`CachedFactory`](crate::cache::CachedFactory)
//!   operations (unknown identifier, refused admission, impossible eviction,
//!   foreign handle, corrupted bookkeeping).
//! - [`ConfigError`]: Returned when policy configuration parameters are invalid
//!   (e.g. zero maximum, zero time window).
//! - [`InvariantError`]: Returned when the idle pool / checked-out registry
//!   invariant is found broken.
//!
//! ## Example Usage
//!
//! ```
//! use cachedfactory::error::{CacheError, ConfigError};
//! use cachedfactory::policy::creation::AmountLimitedCreation;
//!
//! // Zero is not a valid live-instance cap
//! let bad: Result<AmountLimitedCreation, ConfigError> = AmountLimitedCreation::try_new(0);
//! assert!(bad.is_err());
//!
//! assert_eq!(
//!     CacheError::EvictionImpossible.to_string(),
//!     "eviction policy: trying to make room but no objects are available"
//! );
//! ```

use std::fmt;
use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache and factory operations.
///
/// Every variant is raised synchronously at the point of detection; none is
/// retried by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The factory has no creator registered for the identifier.
    UnknownIdentifier {
        /// `Debug` rendering of the identifier.
        id: String,
    },
    /// The [`NeverCreate`](crate::policy::creation::NeverCreate) policy refused
    /// to construct anything.
    CreationForbidden,
    /// More than `max_creations` constructions happened within `window`.
    CreationRateExceeded { max_creations: usize, window: Duration },
    /// Admission was refused and no idle instance qualifies for eviction.
    EvictionImpossible,
    /// The released handle is not currently checked out from this cache.
    NotOwned,
    /// The idle pool / checked-out registry bookkeeping is corrupted.
    Internal(InvariantError),
}

impl CacheError {
    /// Returns `true` for errors that signal a corrupted cache rather than a
    /// caller mistake or a policy decision.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(self, CacheError::Internal(_))
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::UnknownIdentifier { id } => write!(f, "unknown type identifier {id}"),
            CacheError::CreationForbidden => f.write_str("creation policy: object creation is forbidden"),
            CacheError::CreationRateExceeded {
                max_creations,
                window,
            } => write!(
                f,
                "creation policy: exceeded the authorized creation rate ({} within {} ms)",
                max_creations,
                window.as_millis()
            ),
            CacheError::EvictionImpossible => {
                f.write_str("eviction policy: trying to make room but no objects are available")
            },
            CacheError::NotOwned => f.write_str("object was not provided by this cache"),
            CacheError::Internal(err) => write!(f, "internal cache error: {err}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvariantError> for CacheError {
    fn from(err: InvariantError) -> Self {
        CacheError::Internal(err)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by [`CachedFactory::check_invariants`](crate::cache::CachedFactory::check_invariants)
/// and wrapped in [`CacheError::Internal`] when the eviction path runs into an
/// instance that is checked out or unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when policy configuration parameters are invalid.
///
/// Produced by fallible constructors and setters such as
/// [`RateLimitedCreation::set_rate`](crate::policy::creation::RateLimitedCreation::set_rate)
/// and by [`CachedFactoryBuilder::try_build`](crate::builder::CachedFactoryBuilder::try_build).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cachedfactory::policy::creation::RateLimitedCreation;
///
/// let mut policy = RateLimitedCreation::new();
/// let err = policy.set_rate(5, Duration::ZERO).unwrap_err();
/// assert!(err.to_string().contains("window"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
