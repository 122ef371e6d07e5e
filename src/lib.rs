//! cachedfactory: a policy-configured object cache in front of an object
//! factory.
//!
//! Clients ask for a product by identifier and construction parameters. The
//! cache hands back an idle instance built earlier for the same key, or
//! constructs a new one through the registered creator, subject to an
//! admission policy that may demand an eviction first. Products must be
//! released explicitly and return to the idle pool.
//!
//! ```
//! use cachedfactory::prelude::*;
//!
//! let mut cache: CachedFactory<&str, (), String, _, _, _> = CachedFactory::with_policies(
//!     AmountLimitedCreation::try_new(2).unwrap(),
//!     EvictLru::new(),
//!     SimpleStatistics::new(),
//! );
//! cache.register("greeting", |()| "hello".to_string());
//!
//! let handle = cache.create_object("greeting", ()).unwrap();
//! assert_eq!(cache.get(&handle).map(String::as_str), Some("hello"));
//! cache.release_object(handle).unwrap();
//!
//! assert_eq!(cache.statistics().unwrap().created, 1);
//! ```

pub mod builder;
pub mod cache;
pub mod ds;
pub mod error;
pub mod factory;
pub mod handle;
pub mod key;
pub mod metrics;
pub mod policy;
pub mod prelude;
#[cfg(feature = "concurrency")]
pub mod sync;
pub mod traits;

pub use cache::CachedFactory;
pub use error::{CacheError, ConfigError, InvariantError};
