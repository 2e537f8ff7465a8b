//! ## Register array
//! Holds `M = 2^P` registers, each storing the maximum rank observed among
//! hashes routed to it. Register values only ever grow.
//!
//! Hash layout for a `W`-bit hash:
//! - 0..P bits     - register index
//! - P..W bits     - remainder used to compute rank (`rho`)
//!
//! Besides the registers themselves, a histogram of register ranks is kept
//! up to date on every register change. Number of zero registers is read
//! directly from it and harmonic sum is computed over at most `MAX_RANK + 1`
//! buckets instead of `M` registers.

use std::fmt::{Debug, Formatter};

/// Largest rank a register can hold (64-bit hash with no index bits)
pub const MAX_RANK: u8 = 65;
/// One histogram bucket per rank in `[0..=MAX_RANK]`
const HISTOGRAM_LEN: usize = 66;

#[derive(Clone, PartialEq, Eq)]
pub struct Registers {
    /// Register ranks
    ranks: Vec<u8>,
    /// Number of registers holding each rank
    histogram: [u32; HISTOGRAM_LEN],
}

impl Registers {
    /// Create `2^index_bits` zero registers
    #[inline]
    pub fn new(index_bits: u8) -> Self {
        let m = 1usize << index_bits;
        let mut histogram = [0u32; HISTOGRAM_LEN];
        histogram[0] = m as u32;
        Self {
            ranks: vec![0; m],
            histogram,
        }
    }

    /// Number of registers
    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Raise `idx` register to `rank` if it is currently lower.
    /// Returns whether register has changed.
    #[inline]
    pub fn update(&mut self, idx: usize, rank: u8) -> bool {
        let rank = rank.min(MAX_RANK);
        let old_rank = self.ranks[idx];
        if rank <= old_rank {
            return false;
        }
        self.ranks[idx] = rank;
        self.histogram[usize::from(old_rank)] -= 1;
        self.histogram[usize::from(rank)] += 1;
        true
    }

    /// Number of registers still set to 0
    #[inline]
    pub fn zeros(&self) -> u32 {
        self.histogram[0]
    }

    /// Sum of `2^-rank` over all registers
    #[inline]
    pub fn harmonic_sum(&self) -> f64 {
        self.histogram
            .iter()
            .enumerate()
            .map(|(rank, &count)| f64::from(count) * 2f64.powi(-(rank as i32)))
            .sum()
    }

    /// Register ranks as slice
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.ranks
    }
}

impl Debug for Registers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registers")
            .field("len", &self.len())
            .field("zeros", &self.zeros())
            .field("harmonic_sum", &self.harmonic_sum())
            .finish()
    }
}

/// Split `hash` into register index (lowest `index_bits` bits) and remainder
#[inline]
pub fn split_hash(hash: u64, index_bits: u8) -> (usize, u64) {
    let idx = (hash & ((1 << index_bits) - 1)) as usize;
    (idx, hash >> index_bits)
}

/// Rank of `remainder` interpreted as `width`-bit value: position of its
/// most significant set bit counted from the top of the field, starting at 1.
/// Returns `width + 1` when no bit is set and 1 for an empty field.
#[inline]
pub fn rho(remainder: u64, width: u32) -> u8 {
    if width == 0 {
        return 1;
    }
    let max_rank = width.min(64) + 1;
    if remainder == 0 {
        return max_rank as u8;
    }
    let aligned = remainder << (64 - width.min(64));
    (aligned.leading_zeros() + 1).min(max_rank) as u8
}
