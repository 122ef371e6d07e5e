pub use crate::builder::{CachedFactoryBuilder, CreationConfig, EvictionConfig};
pub use crate::cache::CachedFactory;
pub use crate::error::{CacheError, ConfigError, InvariantError};
pub use crate::handle::{ObjectId, RawHandle, RawPointer};
pub use crate::key::{Key, Params};
pub use crate::metrics::{NoStatistics, SimpleStatistics, StatisticsSnapshot};
pub use crate::policy::aging::EvictAging;
pub use crate::policy::creation::{
    AlwaysCreate, AmountLimitedCreation, NeverCreate, RateLimitedCreation,
};
pub use crate::policy::lru::EvictLru;
pub use crate::policy::random::EvictRandom;
pub use crate::traits::{CreationPolicy, Encapsulation, EvictionPolicy, StatisticsPolicy};

#[cfg(feature = "concurrency")]
pub use crate::sync::ConcurrentCachedFactory;
