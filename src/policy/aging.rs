//! Aging eviction: LRU approximated with a decaying bit register.
//!
//! Each instance carries a 32-bit register. Every release ages *all*
//! registers by one bit; the released instance also gets its top bit set:
//!
//! ```text
//!   release(B)        A            B            C
//!   before        0100_0000…   0000_0000…   1000_0000…
//!   shift >> 1    0010_0000…   0000_0000…   0100_0000…
//!   set MSB(B)    0010_0000…   1000_0000…   0100_0000…
//! ```
//!
//! Recent releases dominate, older ones fade geometrically. The victim is the
//! idle instance with the smallest register. A register that decayed to zero
//! is still evicted when another idle register is nonzero; only an all-zero
//! idle set refuses eviction.
//!
//! Each release costs O(n) in the number of live instances; prefer
//! [`EvictLru`](crate::policy::lru::EvictLru) when that matters.

use log::trace;

use crate::ds::ScoreTable;
use crate::error::Result;
use crate::handle::ObjectId;
use crate::traits::EvictionPolicy;

/// Bit set on the released instance's register.
pub const AGING_MSB: u32 = 1 << (u32::BITS - 1);

/// Aging eviction policy. See the [module docs](self).
#[derive(Debug, Default, Clone)]
pub struct EvictAging {
    registers: ScoreTable<u32>,
}

impl EvictAging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current register of `id`, if tracked.
    pub fn score(&self, id: ObjectId) -> Option<u32> {
        self.registers.score(id)
    }

    /// Number of tracked instances.
    pub fn tracked(&self) -> usize {
        self.registers.len()
    }
}

impl EvictionPolicy for EvictAging {
    fn on_create(&mut self, id: ObjectId) {
        self.registers.track(id);
    }

    #[inline]
    fn on_fetch(&mut self, _id: ObjectId) {}

    fn on_release(&mut self, id: ObjectId) {
        self.registers.update_all(|other, register| {
            *register >>= 1;
            if other == id {
                *register |= AGING_MSB;
            }
        });
    }

    fn on_destroy(&mut self, id: ObjectId) {
        self.registers.untrack(id);
    }

    fn select_victim(&mut self, is_evictable: &dyn Fn(ObjectId) -> bool) -> Result<ObjectId> {
        let victim = self.registers.select_min(is_evictable)?;
        trace!(
            "aging victim {} (register {:#034b})",
            victim,
            self.registers.score(victim).unwrap_or_default()
        );
        Ok(victim)
    }

    fn name(&self) -> &'static str {
        "LRU with aging"
    }
}
