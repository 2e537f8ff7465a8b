//! Construction parameters of `CardinalityEstimator`.

use crate::error::SketchError;

/// Smallest supported number of register index bits (16 registers)
pub const MIN_INDEX_BITS: u8 = 4;
/// Largest supported number of register index bits (65536 registers)
pub const MAX_INDEX_BITS: u8 = 16;

/// Parameters fixed for the lifetime of a sketch.
///
/// - `index_bits`: number of low hash bits used as register index, in
///   `[MIN_INDEX_BITS..=MAX_INDEX_BITS]`. The sketch has `2^index_bits` registers
///   and an expected relative error of `1.04 / sqrt(2^index_bits)`.
/// - `hash_seed`: seed passed to the hash function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SketchConfig {
    pub index_bits: u8,
    pub hash_seed: u64,
}

impl SketchConfig {
    /// Creates new config from given seed and number of index bits
    #[inline]
    pub fn new(hash_seed: u64, index_bits: u8) -> Self {
        Self {
            index_bits,
            hash_seed,
        }
    }

    /// Check that `index_bits` is in supported range
    pub fn validate(&self) -> Result<(), SketchError> {
        if !(MIN_INDEX_BITS..=MAX_INDEX_BITS).contains(&self.index_bits) {
            return Err(SketchError::IndexBitsOutOfRange {
                index_bits: self.index_bits,
                min: MIN_INDEX_BITS,
                max: MAX_INDEX_BITS,
            });
        }
        Ok(())
    }

    /// Number of registers implied by `index_bits`
    #[inline]
    pub fn register_count(&self) -> usize {
        1 << self.index_bits
    }
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self::new(0, 12)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(4 => Ok(16))]
    #[test_case(12 => Ok(4096))]
    #[test_case(16 => Ok(65536))]
    #[test_case(0 => Err("index bits 0 out of range [4..=16]".to_string()))]
    #[test_case(3 => Err("index bits 3 out of range [4..=16]".to_string()))]
    #[test_case(17 => Err("index bits 17 out of range [4..=16]".to_string()))]
    #[test_case(64 => Err("index bits 64 out of range [4..=16]".to_string()))]
    fn test_validate(index_bits: u8) -> Result<usize, String> {
        let config = SketchConfig::new(123, index_bits);
        config
            .validate()
            .map(|_| config.register_count())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn test_default() {
        let config = SketchConfig::default();
        assert_eq!(config.index_bits, 12);
        assert_eq!(config.hash_seed, 0);
        assert!(config.validate().is_ok());
    }
}
