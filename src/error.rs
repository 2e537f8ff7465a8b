//! Errors returned when building a `CardinalityEstimator`.

use thiserror::Error;

/// Sketch construction error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchError {
    /// Number of register index bits lies outside of the supported range,
    /// which would break the power-of-two register count or leave no hash
    /// bits for rank extraction.
    #[error("index bits {index_bits} out of range [{min}..={max}]")]
    IndexBitsOutOfRange { index_bits: u8, min: u8, max: u8 },
    /// Hash function is too narrow to provide `index_bits` register index bits.
    #[error("index bits {index_bits} exceed hash width of {hash_bits} bits")]
    IndexBitsExceedHashWidth { index_bits: u8, hash_bits: u32 },
}
