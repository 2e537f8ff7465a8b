//! `cardinality-sketch` estimates the number of distinct byte strings in a stream or dataset
//! using a fixed amount of memory.
//!
//! The library implements HyperLogLog with two correction strategies: `Classic`, which only
//! switches to linear counting for small cardinalities, and `BiasCorrected`, which also
//! subtracts empirical bias in the mid range and corrects hash space saturation for huge
//! cardinalities.
//!
//! ```
//! use cardinality_sketch::BiasCorrectedEstimator;
//!
//! let mut estimator = BiasCorrectedEstimator::bias_corrected(123, 12)?;
//! for i in 0..1000 {
//!     estimator.insert(&format!("item{}", i));
//! }
//! let estimate = estimator.estimate();
//! assert!((estimate - 1000.0).abs() < 100.0);
//! # Ok::<(), cardinality_sketch::SketchError>(())
//! ```
pub mod bias;
pub mod config;
pub mod correction;
pub mod error;
pub mod estimator;
pub mod hash;
mod registers;

pub use config::{SketchConfig, MAX_INDEX_BITS, MIN_INDEX_BITS};
pub use correction::{BiasCorrected, Classic, Correction, Estimate, Regime};
pub use error::SketchError;
pub use estimator::{BiasCorrectedEstimator, CardinalityEstimator, ClassicEstimator};
pub use hash::{Fnv32, Fnv64, SketchHasher, WyHash64};
