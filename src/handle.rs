//! Product identities and client-facing handles.
//!
//! The cache owns every product instance for its whole life. Clients receive a
//! handle minted by the cache's [`Encapsulation`] policy and reach the product
//! through [`CachedFactory::get`](crate::cache::CachedFactory::get) /
//! [`get_mut`](crate::cache::CachedFactory::get_mut).
//!
//! ```text
//!   create_object ──► ObjectId ──► Encapsulation::encapsulate ──► Handle
//!   release_object ◄── ObjectId ◄── Encapsulation::release   ◄── Handle (consumed)
//! ```
//!
//! [`ObjectId`]s come from a process-wide monotonic counter: they are never
//! reused, so a handle from one cache cannot alias an instance of another.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::Encapsulation;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one product instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocates a fresh identity.
    #[inline]
    pub(crate) fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Plain handle: the instance identity and nothing else.
///
/// Not `Clone`: releasing consumes it, so the same handle cannot be released
/// twice.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RawHandle {
    id: ObjectId,
}

impl RawHandle {
    /// Identity of the wrapped instance.
    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }
}

/// Encapsulation policy returning a [`RawHandle`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RawPointer;

impl Encapsulation for RawPointer {
    type Handle = RawHandle;

    #[inline]
    fn encapsulate(&self, id: ObjectId) -> RawHandle {
        RawHandle { id }
    }

    #[inline]
    fn object_id(&self, handle: &RawHandle) -> ObjectId {
        handle.id
    }

    #[inline]
    fn release(&self, handle: RawHandle) -> ObjectId {
        handle.id
    }

    fn name(&self) -> &'static str {
        "raw pointer"
    }
}
