//! Identifier-keyed registry of product constructors.
//!
//! A [`Factory`] maps an identifier to a *creator*, a closure turning the
//! construction parameters into a fresh product. The registry is plain owned
//! state: each factory has its own table, there is no process-wide registry.
//!
//! ```
//! use cachedfactory::factory::Factory;
//!
//! let mut factory: Factory<&str, (u32,), Vec<u8>> = Factory::new();
//! assert!(factory.register("zeros", |(n,)| vec![0; n as usize]));
//! assert!(!factory.register("zeros", |_| Vec::new()));
//!
//! assert_eq!(factory.create(&"zeros", (3,)).unwrap(), vec![0, 0, 0]);
//! assert!(factory.create(&"ones", (3,)).is_err());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{CacheError, Result};

/// Boxed constructor for products of type `T` from parameters `P`.
pub type Creator<P, T> = Box<dyn FnMut(P) -> T + Send>;

/// Identifier -> creator registry.
pub struct Factory<Id, P, T> {
    creators: BTreeMap<Id, Creator<P, T>>,
}

impl<Id, P, T> Default for Factory<Id, P, T> {
    fn default() -> Self {
        Self {
            creators: BTreeMap::new(),
        }
    }
}

impl<Id, P, T> Factory<Id, P, T>
where
    Id: Ord + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `creator` under `id`.
    ///
    /// Returns `false` and keeps the existing creator if `id` is taken.
    pub fn register<F>(&mut self, id: Id, creator: F) -> bool
    where
        F: FnMut(P) -> T + Send + 'static,
    {
        if self.creators.contains_key(&id) {
            return false;
        }
        self.creators.insert(id, Box::new(creator));
        true
    }

    /// Drops the creator registered under `id`; `false` if there was none.
    pub fn unregister(&mut self, id: &Id) -> bool {
        self.creators.remove(id).is_some()
    }

    pub fn is_registered(&self, id: &Id) -> bool {
        self.creators.contains_key(id)
    }

    /// Registered identifiers, in ascending order.
    pub fn registered_ids(&self) -> Vec<Id> {
        self.creators.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }

    /// Builds a new product with the creator registered under `id`.
    ///
    /// # Errors
    ///
    /// [`CacheError::UnknownIdentifier`] if nothing is registered under `id`.
    pub fn create(&mut self, id: &Id, params: P) -> Result<T> {
        match self.creators.get_mut(id) {
            Some(creator) => Ok(creator(params)),
            None => Err(CacheError::UnknownIdentifier {
                id: format!("{:?}", id),
            }),
        }
    }
}

impl<Id: fmt::Debug, P, T> fmt::Debug for Factory<Id, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("registered", &self.creators.keys().collect::<Vec<_>>())
            .finish()
    }
}
