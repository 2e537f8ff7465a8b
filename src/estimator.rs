//! Cardinality estimator allows to estimate number of distinct byte strings
//! in the stream or dataset using fixed amount of memory. It is defined by:
//! - `index_bits` (`P`): number of hash bits used for register index in [4..16]
//!   range, giving `M = 2^P` registers.
//! - `H`: hash function producing `W`-bit hashes (`W` = 32 or 64).
//! - `Correction`: strategy turning raw estimate into final one.
//!
//! # Data-structure design rationale
//!
//! ## Fixed memory footprint
//! Sketch state is `M` one-byte registers plus a small histogram of register
//! ranks. All memory is allocated on construction, `insert` and `estimate`
//! never allocate.
//!
//! ## Low latency
//! - Number of zero registers and the rank histogram are updated as registers
//!   change, so `estimate` sums at most 66 histogram buckets instead of `M`
//!   registers.
//!
//! ## Accuracy
//! - Expected error:
//!     P = 4:  1.04 / sqrt(2^4)  = 26.00%
//!     P = 10: 1.04 / sqrt(2^10) = 3.25%
//!     P = 12: 1.04 / sqrt(2^12) = 1.62%
//!     P = 16: 1.04 / sqrt(2^16) = 0.41%
//! - `Classic` correction uses linear counting for small cardinalities.
//! - `BiasCorrected` correction also subtracts empirical bias for mid-range
//!   cardinalities (calibrated for P = 12) and corrects hash space saturation
//!   for huge cardinalities.
//!
//! [Original HyperLogLog paper](http://algo.inria.fr/flajolet/Publications/FlFuGaMe07.pdf)

use std::fmt::{Debug, Formatter};
use std::mem::size_of;

use tracing::{debug, trace};

use crate::config::SketchConfig;
use crate::correction::{BiasCorrected, Classic, Correction, CorrectionTrait, Estimate};
use crate::error::SketchError;
use crate::hash::{Fnv32, Fnv64, SketchHasher};
use crate::registers::{rho, split_hash, Registers};

/// HyperLogLog sketch over `H` hashes.
#[derive(Clone, PartialEq)]
pub struct CardinalityEstimator<H: SketchHasher = Fnv64> {
    config: SketchConfig,
    registers: Registers,
    hasher: H,
    /// Bias correction constant derived from number of registers
    alpha: f64,
    correction: Correction,
}

/// 32-bit hash sketch with small-range correction only
pub type ClassicEstimator = CardinalityEstimator<Fnv32>;
/// 64-bit hash sketch with small, mid and large range corrections
pub type BiasCorrectedEstimator = CardinalityEstimator<Fnv64>;

impl<H: SketchHasher> CardinalityEstimator<H> {
    /// Mask keeping the lowest `H::BITS` bits of a hash
    const HASH_MASK: u64 = match H::BITS {
        0 => 0,
        bits => u64::MAX >> (64 - bits),
    };

    /// Creates new instance of `CardinalityEstimator` hashing with `H` seeded by `config.hash_seed`
    pub fn new(config: SketchConfig, correction: Correction) -> Result<Self, SketchError> {
        Self::with_hasher(H::with_seed(config.hash_seed), config, correction)
    }

    /// Creates new instance of `CardinalityEstimator` using provided `hasher`
    pub fn with_hasher(
        hasher: H,
        config: SketchConfig,
        correction: Correction,
    ) -> Result<Self, SketchError> {
        config.validate()?;
        if H::BITS == 0 || u32::from(config.index_bits) > H::BITS {
            return Err(SketchError::IndexBitsExceedHashWidth {
                index_bits: config.index_bits,
                hash_bits: H::BITS,
            });
        }

        let m = config.register_count();
        debug!(
            index_bits = config.index_bits,
            registers = m,
            hash_bits = H::BITS,
            %correction,
            "created cardinality estimator"
        );

        Ok(Self {
            config,
            registers: Registers::new(config.index_bits),
            hasher,
            alpha: alpha(m),
            correction,
        })
    }

    /// Insert item into `CardinalityEstimator`
    #[inline]
    pub fn insert<T: AsRef<[u8]> + ?Sized>(&mut self, item: &T) {
        let hash = self.hasher.hash_bytes(item.as_ref());
        self.insert_hash(hash);
    }

    /// Insert hash into `CardinalityEstimator`. Bits above `H::BITS` are ignored.
    #[inline]
    pub fn insert_hash(&mut self, hash: u64) {
        let index_bits = self.config.index_bits;
        let (idx, remainder) = split_hash(hash & Self::HASH_MASK, index_bits);
        let rank = rho(remainder, H::BITS - u32::from(index_bits));
        self.registers.update(idx, rank);
    }

    /// Return cardinality estimate
    #[inline]
    pub fn estimate(&self) -> f64 {
        self.evaluate().value
    }

    /// Return cardinality estimate together with raw estimate and applied correction
    pub fn evaluate(&self) -> Estimate {
        let m = self.registers.len() as f64;
        let raw = self.alpha * m * m / self.registers.harmonic_sum();
        let estimate = self.correction.correct(raw, &self.registers);
        trace!(
            raw = estimate.raw,
            value = estimate.value,
            regime = ?estimate.regime,
            "evaluated cardinality estimate"
        );
        estimate
    }

    /// Number of register index bits
    #[inline]
    pub fn index_bits(&self) -> u8 {
        self.config.index_bits
    }

    /// Number of registers
    #[inline]
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    /// Register values
    #[inline]
    pub fn registers(&self) -> &[u8] {
        self.registers.as_slice()
    }

    /// Number of registers still set to 0
    #[inline]
    pub fn zero_registers(&self) -> usize {
        self.registers.zeros() as usize
    }

    /// Return whether nothing has been inserted yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.zero_registers() == self.register_count()
    }

    /// Seed the hash function was created with
    #[inline]
    pub fn hash_seed(&self) -> u64 {
        self.config.hash_seed
    }

    /// Correction strategy
    #[inline]
    pub fn correction(&self) -> Correction {
        self.correction
    }

    /// Theoretical relative standard error `1.04 / sqrt(M)`
    #[inline]
    pub fn expected_relative_error(&self) -> f64 {
        1.04 / (self.register_count() as f64).sqrt()
    }

    /// Return memory size of `CardinalityEstimator`
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.register_count()
    }
}

impl CardinalityEstimator<Fnv32> {
    /// Creates `Classic` estimator over 32-bit FNV-1a hashes
    pub fn classic(hash_seed: u32, index_bits: u8) -> Result<Self, SketchError> {
        Self::new(
            SketchConfig::new(u64::from(hash_seed), index_bits),
            Classic.into(),
        )
    }
}

impl CardinalityEstimator<Fnv64> {
    /// Creates `BiasCorrected` estimator over 64-bit FNV-1a hashes
    pub fn bias_corrected(hash_seed: u64, index_bits: u8) -> Result<Self, SketchError> {
        Self::new(
            SketchConfig::new(hash_seed, index_bits),
            BiasCorrected.into(),
        )
    }
}

impl<H: SketchHasher> Debug for CardinalityEstimator<H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let estimate = self.evaluate();
        write!(
            f,
            "{{ correction: {}, index_bits: {}, regime: {:?}, estimate: {:.0} }}",
            self.correction, self.config.index_bits, estimate.regime, estimate.value
        )
    }
}

/// Parameter for bias correction
#[inline]
pub(crate) fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / (m as f64)),
    }
}
