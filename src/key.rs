//! Composite cache keys.
//!
//! A [`Key`] names a class of requested product: the factory identifier plus
//! the tuple of construction parameters. Products built from equal keys are
//! interchangeable, so the idle pool is partitioned by `Key`.
//!
//! ## Ordering
//!
//! ```text
//!   1. parameter values         (lexicographic, via P: Ord)
//!   2. identifier               (tie-break)
//! ```
//!
//! `()` always compares equal, so empty-parameter keys order by identifier
//! alone. Arity is a property of the parameter type `P`, so two keys of the
//! same type always share it and it never decides an ordering.
//!
//! ## Example
//!
//! ```
//! use cachedfactory::key::Key;
//!
//! let a = Key::new("img", (64u32, 64u32));
//! let b = Key::new("img", (64u32, 128u32));
//! assert!(a < b);
//! assert_eq!(a, Key::new("img", (64, 64)));
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Construction parameters usable inside a [`Key`].
///
/// Implemented for `()` and tuples of up to eight `Clone + Ord` elements.
/// Implement it for your own parameter struct to use that struct directly.
pub trait Params: Clone + Ord {
    /// Number of construction parameters.
    const ARITY: usize;
}

impl Params for () {
    const ARITY: usize = 0;
}

macro_rules! impl_params_for_tuple {
    ($arity:expr; $($name:ident),+) => {
        impl<$($name: Clone + Ord),+> Params for ($($name,)+) {
            const ARITY: usize = $arity;
        }
    };
}

impl_params_for_tuple!(1; A);
impl_params_for_tuple!(2; A, B);
impl_params_for_tuple!(3; A, B, C);
impl_params_for_tuple!(4; A, B, C, D);
impl_params_for_tuple!(5; A, B, C, D, E);
impl_params_for_tuple!(6; A, B, C, D, E, F);
impl_params_for_tuple!(7; A, B, C, D, E, F, G);
impl_params_for_tuple!(8; A, B, C, D, E, F, G, H);

/// Immutable identifier + parameter tuple.
#[derive(Clone)]
pub struct Key<Id, P> {
    id: Id,
    params: P,
}

impl<Id, P> Key<Id, P> {
    /// Builds a key from an identifier and its construction parameters.
    #[inline]
    pub fn new(id: Id, params: P) -> Self {
        Self { id, params }
    }

    /// Factory identifier.
    #[inline]
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Construction parameters.
    #[inline]
    pub fn params(&self) -> &P {
        &self.params
    }
}

impl<Id, P: Params> Key<Id, P> {
    /// Number of construction parameters carried by this key.
    #[inline]
    pub fn arity(&self) -> usize {
        P::ARITY
    }
}

impl<Id: Ord, P: Params> PartialEq for Key<Id, P> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<Id: Ord, P: Params> Eq for Key<Id, P> {}

impl<Id: Ord, P: Params> PartialOrd for Key<Id, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Id: Ord, P: Params> Ord for Key<Id, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.params
            .cmp(&other.params)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl<Id: fmt::Debug, P: fmt::Debug> fmt::Debug for Key<Id, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id)
            .field("params", &self.params)
            .finish()
    }
}
