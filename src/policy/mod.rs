//! Admission and eviction policies.
//!
//! | Module       | Policy                                      |
//! |--------------|---------------------------------------------|
//! | [`creation`] | always / never / rate-limited / amount-limited admission |
//! | [`lru`]      | evict the least-released idle instance      |
//! | [`aging`]    | evict the idle instance with the stalest aging register |
//! | [`random`]   | evict a random entry of the release log     |

pub mod aging;
pub mod creation;
pub mod lru;
pub mod random;
