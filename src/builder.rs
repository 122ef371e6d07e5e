//! Runtime-configured cached factories.
//!
//! [`CachedFactory`] picks its policies through type parameters. When the
//! choice is only known at run time (configuration files, command-line
//! flags) the builder selects them from plain enums and wraps them in
//! enum-dispatch types ([`AnyCreation`], [`AnyEviction`], [`AnyStatistics`]).
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use cachedfactory::builder::{CachedFactoryBuilder, CreationConfig, EvictionConfig};
//!
//! let mut cache = CachedFactoryBuilder::new()
//!     .creation(CreationConfig::AmountLimited { max_live: 4 })
//!     .eviction(EvictionConfig::Lru)
//!     .statistics(true)
//!     .try_build::<&str, (u32,), u32>()
//!     .unwrap();
//! cache.register("square", |(n,)| n * n);
//!
//! let handle = cache.create_object("square", (7,)).unwrap();
//! assert_eq!(cache.get(&handle), Some(&49));
//!
//! // zero is rejected by try_build
//! let invalid = CachedFactoryBuilder::new()
//!     .creation(CreationConfig::RateLimited { max_creations: 0, window: Duration::from_secs(1) })
//!     .try_build::<u8, (), u8>();
//! assert!(invalid.is_err());
//! ```

use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::CachedFactory;
use crate::error::{ConfigError, Result};
use crate::handle::ObjectId;
use crate::key::Params;
use crate::metrics::snapshot::StatisticsSnapshot;
use crate::metrics::{NoStatistics, SimpleStatistics};
use crate::policy::aging::EvictAging;
use crate::policy::creation::{
    AlwaysCreate, AmountLimitedCreation, NeverCreate, RateLimitedCreation, DEFAULT_MAX_CREATIONS,
    DEFAULT_MAX_LIVE, DEFAULT_RATE_WINDOW,
};
use crate::policy::lru::EvictLru;
use crate::policy::random::EvictRandom;
use crate::traits::{CreationPolicy, EvictionPolicy, StatisticsPolicy};

/// Cached factory whose policies were chosen at run time.
pub type DynCachedFactory<Id, P, T> =
    CachedFactory<Id, P, T, AnyCreation, AnyEviction, AnyStatistics>;

/// Available admission policies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CreationConfig {
    /// Construct whenever asked.
    #[default]
    Always,
    /// Refuse every construction (diagnostics only).
    Never,
    /// At most `max_creations` constructions per sliding `window`.
    RateLimited { max_creations: usize, window: Duration },
    /// At most `max_live` products alive at once.
    AmountLimited { max_live: usize },
}

/// Available eviction policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvictionConfig {
    /// Least-released idle instance.
    Lru,
    /// Smallest aging register.
    Aging,
    /// Random release-log entry; `seed` makes draws reproducible, `None`
    /// seeds from per-process entropy.
    Random { seed: Option<u64> },
}

impl Default for EvictionConfig {
    fn default() -> Self {
        EvictionConfig::Random { seed: None }
    }
}

// ---------------------------------------------------------------------------
// Enum-dispatch policies
// ---------------------------------------------------------------------------

/// Any admission policy.
#[derive(Debug, Clone)]
pub enum AnyCreation {
    Always(AlwaysCreate),
    Never(NeverCreate),
    RateLimited(RateLimitedCreation),
    AmountLimited(AmountLimitedCreation),
}

impl AnyCreation {
    /// Reconfigures a rate-limited policy.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the values are zero or the policy is not
    /// rate-limited.
    pub fn set_rate(&mut self, max_creations: usize, window: Duration) -> Result<(), ConfigError> {
        match self {
            AnyCreation::RateLimited(policy) => policy.set_rate(max_creations, window),
            other => Err(ConfigError::new(format!(
                "cannot set a rate on the {} creation policy",
                other.name()
            ))),
        }
    }

    /// Reconfigures an amount-limited policy.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if `max_live` is zero or the policy is not
    /// amount-limited.
    pub fn set_max_creation(&mut self, max_live: usize) -> Result<(), ConfigError> {
        match self {
            AnyCreation::AmountLimited(policy) => policy.set_max_creation(max_live),
            other => Err(ConfigError::new(format!(
                "cannot set a live cap on the {} creation policy",
                other.name()
            ))),
        }
    }
}

impl CreationPolicy for AnyCreation {
    fn can_create(&mut self) -> Result<bool> {
        match self {
            AnyCreation::Always(policy) => policy.can_create(),
            AnyCreation::Never(policy) => policy.can_create(),
            AnyCreation::RateLimited(policy) => policy.can_create(),
            AnyCreation::AmountLimited(policy) => policy.can_create(),
        }
    }

    fn on_create(&mut self) {
        match self {
            AnyCreation::Always(policy) => policy.on_create(),
            AnyCreation::Never(policy) => policy.on_create(),
            AnyCreation::RateLimited(policy) => policy.on_create(),
            AnyCreation::AmountLimited(policy) => policy.on_create(),
        }
    }

    fn on_destroy(&mut self) {
        match self {
            AnyCreation::Always(policy) => policy.on_destroy(),
            AnyCreation::Never(policy) => policy.on_destroy(),
            AnyCreation::RateLimited(policy) => policy.on_destroy(),
            AnyCreation::AmountLimited(policy) => policy.on_destroy(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyCreation::Always(policy) => policy.name(),
            AnyCreation::Never(policy) => policy.name(),
            AnyCreation::RateLimited(policy) => policy.name(),
            AnyCreation::AmountLimited(policy) => policy.name(),
        }
    }
}

/// Any eviction policy.
#[derive(Debug, Clone)]
pub enum AnyEviction {
    Lru(EvictLru),
    Aging(EvictAging),
    Random(EvictRandom),
}

impl EvictionPolicy for AnyEviction {
    fn on_create(&mut self, id: ObjectId) {
        match self {
            AnyEviction::Lru(policy) => policy.on_create(id),
            AnyEviction::Aging(policy) => policy.on_create(id),
            AnyEviction::Random(policy) => policy.on_create(id),
        }
    }

    fn on_fetch(&mut self, id: ObjectId) {
        match self {
            AnyEviction::Lru(policy) => policy.on_fetch(id),
            AnyEviction::Aging(policy) => policy.on_fetch(id),
            AnyEviction::Random(policy) => policy.on_fetch(id),
        }
    }

    fn on_release(&mut self, id: ObjectId) {
        match self {
            AnyEviction::Lru(policy) => policy.on_release(id),
            AnyEviction::Aging(policy) => policy.on_release(id),
            AnyEviction::Random(policy) => policy.on_release(id),
        }
    }

    fn on_destroy(&mut self, id: ObjectId) {
        match self {
            AnyEviction::Lru(policy) => policy.on_destroy(id),
            AnyEviction::Aging(policy) => policy.on_destroy(id),
            AnyEviction::Random(policy) => policy.on_destroy(id),
        }
    }

    fn select_victim(&mut self, is_evictable: &dyn Fn(ObjectId) -> bool) -> Result<ObjectId> {
        match self {
            AnyEviction::Lru(policy) => policy.select_victim(is_evictable),
            AnyEviction::Aging(policy) => policy.select_victim(is_evictable),
            AnyEviction::Random(policy) => policy.select_victim(is_evictable),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyEviction::Lru(policy) => policy.name(),
            AnyEviction::Aging(policy) => policy.name(),
            AnyEviction::Random(policy) => policy.name(),
        }
    }
}

/// Any statistics policy.
#[derive(Debug, Clone)]
pub enum AnyStatistics {
    No(NoStatistics),
    Simple(SimpleStatistics),
}

impl StatisticsPolicy for AnyStatistics {
    fn on_create(&mut self) {
        match self {
            AnyStatistics::No(policy) => policy.on_create(),
            AnyStatistics::Simple(policy) => policy.on_create(),
        }
    }

    fn on_fetch(&mut self) {
        match self {
            AnyStatistics::No(policy) => policy.on_fetch(),
            AnyStatistics::Simple(policy) => policy.on_fetch(),
        }
    }

    fn on_release(&mut self) {
        match self {
            AnyStatistics::No(policy) => policy.on_release(),
            AnyStatistics::Simple(policy) => policy.on_release(),
        }
    }

    fn on_destroy(&mut self) {
        match self {
            AnyStatistics::No(policy) => policy.on_destroy(),
            AnyStatistics::Simple(policy) => policy.on_destroy(),
        }
    }

    fn snapshot(&self) -> Option<StatisticsSnapshot> {
        match self {
            AnyStatistics::No(policy) => policy.snapshot(),
            AnyStatistics::Simple(policy) => policy.snapshot(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AnyStatistics::No(policy) => policy.name(),
            AnyStatistics::Simple(policy) => policy.name(),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`DynCachedFactory`] instances.
#[derive(Debug, Clone, Default)]
pub struct CachedFactoryBuilder {
    creation: CreationConfig,
    eviction: EvictionConfig,
    statistics: bool,
}

impl CachedFactoryBuilder {
    /// Always-create admission, entropy-seeded random eviction, no statistics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creation(mut self, creation: CreationConfig) -> Self {
        self.creation = creation;
        self
    }

    pub fn eviction(mut self, eviction: EvictionConfig) -> Self {
        self.eviction = eviction;
        self
    }

    /// Count lifecycle events when `enabled`.
    pub fn statistics(mut self, enabled: bool) -> Self {
        self.statistics = enabled;
        self
    }

    /// Builds the cache, rejecting invalid limits.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] for a zero creation count, window or live cap.
    pub fn try_build<Id, P, T>(&self) -> Result<DynCachedFactory<Id, P, T>, ConfigError>
    where
        Id: Ord + Clone + fmt::Debug,
        P: Params,
    {
        let creation = self.creation_policy()?;
        Ok(self.assemble(creation))
    }

    /// Builds the cache, replacing invalid limits with the defaults.
    ///
    /// Rate-limited admission falls back to
    /// [`DEFAULT_MAX_CREATIONS`] per [`DEFAULT_RATE_WINDOW`], amount-limited
    /// admission to [`DEFAULT_MAX_LIVE`].
    pub fn build<Id, P, T>(&self) -> DynCachedFactory<Id, P, T>
    where
        Id: Ord + Clone + fmt::Debug,
        P: Params,
    {
        let creation = match self.creation_policy() {
            Ok(creation) => creation,
            Err(err) => {
                warn!("{}; falling back to default limits", err);
                match self.creation {
                    CreationConfig::RateLimited { .. } => {
                        AnyCreation::RateLimited(RateLimitedCreation::new())
                    },
                    _ => AnyCreation::AmountLimited(AmountLimitedCreation::new()),
                }
            },
        };
        self.assemble(creation)
    }

    fn creation_policy(&self) -> Result<AnyCreation, ConfigError> {
        Ok(match self.creation {
            CreationConfig::Always => AnyCreation::Always(AlwaysCreate),
            CreationConfig::Never => AnyCreation::Never(NeverCreate),
            CreationConfig::RateLimited {
                max_creations,
                window,
            } => AnyCreation::RateLimited(RateLimitedCreation::try_new(max_creations, window)?),
            CreationConfig::AmountLimited { max_live } => {
                AnyCreation::AmountLimited(AmountLimitedCreation::try_new(max_live)?)
            },
        })
    }

    fn assemble<Id, P, T>(&self, creation: AnyCreation) -> DynCachedFactory<Id, P, T>
    where
        Id: Ord + Clone + fmt::Debug,
        P: Params,
    {
        let eviction = match self.eviction {
            EvictionConfig::Lru => AnyEviction::Lru(EvictLru::new()),
            EvictionConfig::Aging => AnyEviction::Aging(EvictAging::new()),
            EvictionConfig::Random { seed: Some(seed) } => {
                AnyEviction::Random(EvictRandom::with_seed(seed))
            },
            EvictionConfig::Random { seed: None } => {
                AnyEviction::Random(EvictRandom::from_entropy())
            },
        };
        let statistics = if self.statistics {
            AnyStatistics::Simple(SimpleStatistics::new())
        } else {
            AnyStatistics::No(NoStatistics)
        };
        debug!(
            "building cache: {} creation, {} eviction, {} statistics",
            creation.name(),
            eviction.name(),
            statistics.name()
        );
        CachedFactory::with_policies(creation, eviction, statistics)
    }
}
