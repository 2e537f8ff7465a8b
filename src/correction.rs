//! Correction strategies turning the raw HyperLogLog estimate into the final one.
//!
//! Both strategies share the small-range check: when the raw estimate is at most
//! `2.5 * M` and some registers are still zero, linear counting
//! `M * ln(M / zeros)` is used instead.
//!
//! `BiasCorrected` additionally applies:
//! - mid-range correction for raw estimates in `(2.5 * M, 5 * M)`: the average
//!   empirical bias around the raw estimate is subtracted (see `bias` module);
//! - large-range correction for estimates above `2^64 / 30`:
//!   `-2^64 * ln(1 - E / 2^64)`.

use std::fmt::{Display, Formatter};

use enum_dispatch::enum_dispatch;

use crate::bias::{estimate_bias, CALIBRATED_INDEX_BITS};
use crate::registers::Registers;

/// Raw estimates up to `SMALL_RANGE_FACTOR * M` are candidates for linear counting
const SMALL_RANGE_FACTOR: f64 = 2.5;
/// Raw estimates below `MID_RANGE_FACTOR * M` are candidates for bias correction
const MID_RANGE_FACTOR: f64 = 5.0;
/// Size of the 64-bit hash space
pub const TWO_POW_64: f64 = 18_446_744_073_709_551_616.0;
/// Estimates above this threshold get large-range correction
pub const LARGE_RANGE_THRESHOLD: f64 = TWO_POW_64 / 30.0;

/// Correction applied to produce the final estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Raw harmonic-mean estimate returned as is
    Raw,
    /// Small-range linear counting over zero registers
    LinearCounting,
    /// Mid-range empirical bias subtracted from raw estimate
    BiasTable,
    /// Large-range hash space saturation correction
    Saturation,
}

/// Result of cardinality estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Raw harmonic-mean estimate `alpha * M^2 / sum(2^-register)`
    pub raw: f64,
    /// Final corrected estimate
    pub value: f64,
    /// Correction which produced `value`
    pub regime: Regime,
}

impl Estimate {
    #[inline]
    fn uncorrected(raw: f64) -> Self {
        Self {
            raw,
            value: raw,
            regime: Regime::Raw,
        }
    }
}

/// Correction strategies supported by `CardinalityEstimator`
#[enum_dispatch]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    Classic(Classic),
    BiasCorrected(BiasCorrected),
}

/// Correction trait which must be implemented by all strategies.
#[enum_dispatch(Correction)]
pub(crate) trait CorrectionTrait {
    /// Short name of the strategy
    fn name(&self) -> &'static str;
    /// Correct `raw` estimate computed over `registers`
    fn correct(&self, raw: f64, registers: &Registers) -> Estimate;
}

/// Linear counting for small ranges only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classic;

impl CorrectionTrait for Classic {
    #[inline]
    fn name(&self) -> &'static str {
        "Classic"
    }

    #[inline]
    fn correct(&self, raw: f64, registers: &Registers) -> Estimate {
        linear_counting(raw, registers).unwrap_or(Estimate::uncorrected(raw))
    }
}

/// Linear counting, table-driven mid-range bias correction and
/// large-range saturation correction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BiasCorrected;

impl CorrectionTrait for BiasCorrected {
    #[inline]
    fn name(&self) -> &'static str {
        "BiasCorrected"
    }

    fn correct(&self, raw: f64, registers: &Registers) -> Estimate {
        let m = registers.len() as f64;
        let mut estimate = Estimate::uncorrected(raw);

        if raw <= SMALL_RANGE_FACTOR * m {
            if let Some(small) = linear_counting(raw, registers) {
                estimate = small;
            }
        } else if raw < MID_RANGE_FACTOR * m && registers.len() == 1 << CALIBRATED_INDEX_BITS {
            estimate.value = raw - estimate_bias(raw);
            estimate.regime = Regime::BiasTable;
        }

        if estimate.value > LARGE_RANGE_THRESHOLD {
            estimate.value = saturation_correction(estimate.value);
            estimate.regime = Regime::Saturation;
        }

        estimate
    }
}

impl Default for Correction {
    fn default() -> Self {
        Correction::BiasCorrected(BiasCorrected)
    }
}

impl Display for Correction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Linear counting estimate if `raw` lies in small range and zero registers remain
#[inline]
fn linear_counting(raw: f64, registers: &Registers) -> Option<Estimate> {
    let m = registers.len() as f64;
    let zeros = registers.zeros();
    if raw > SMALL_RANGE_FACTOR * m || zeros == 0 {
        return None;
    }
    Some(Estimate {
        raw,
        value: m * (m / f64::from(zeros)).ln(),
        regime: Regime::LinearCounting,
    })
}

/// Large-range correction `-2^64 * ln(1 - estimate / 2^64)`.
///
/// Estimates reaching the size of the hash space map to infinity, the limit
/// of the formula.
#[inline]
pub fn saturation_correction(estimate: f64) -> f64 {
    if estimate >= TWO_POW_64 {
        return f64::INFINITY;
    }
    -TWO_POW_64 * (1.0 - estimate / TWO_POW_64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn registers_with_rank(index_bits: u8, rank: u8) -> Registers {
        let mut registers = Registers::new(index_bits);
        for idx in 0..1 << index_bits {
            registers.update(idx, rank);
        }
        registers
    }

    #[test_case(Correction::Classic(Classic) => "Classic")]
    #[test_case(Correction::BiasCorrected(BiasCorrected) => "BiasCorrected")]
    fn test_name(correction: Correction) -> &'static str {
        correction.name()
    }

    #[test_case(4)]
    #[test_case(12)]
    #[test_case(16)]
    fn test_linear_counting_of_empty_registers(index_bits: u8) {
        let registers = Registers::new(index_bits);
        let m = registers.len() as f64;
        for correction in [Correction::from(Classic), Correction::from(BiasCorrected)] {
            let estimate = correction.correct(0.7 * m, &registers);
            assert_eq!(estimate.value, 0.0);
            assert_eq!(estimate.regime, Regime::LinearCounting);
        }
    }

    #[test]
    fn test_full_registers_skip_linear_counting() {
        let registers = registers_with_rank(12, 1);
        let estimate = Classic.correct(2000.0, &registers);
        assert_eq!(estimate, Estimate::uncorrected(2000.0));
        let estimate = BiasCorrected.correct(2000.0, &registers);
        assert_eq!(estimate, Estimate::uncorrected(2000.0));
    }

    #[test]
    fn test_mid_range() {
        let registers = registers_with_rank(12, 2);
        let raw = 12_000.0;

        let estimate = Classic.correct(raw, &registers);
        assert_eq!(estimate.regime, Regime::Raw);
        assert_eq!(estimate.value, raw);

        let estimate = BiasCorrected.correct(raw, &registers);
        assert_eq!(estimate.regime, Regime::BiasTable);
        assert_eq!(estimate.value, raw - estimate_bias(raw));
    }

    #[test_case(10_240.0 => Regime::Raw; "upper bound of small range with full registers")]
    #[test_case(10_240.5 => Regime::BiasTable; "lower bound of mid range")]
    #[test_case(20_479.5 => Regime::BiasTable; "upper bound of mid range")]
    #[test_case(20_480.0 => Regime::Raw; "above mid range")]
    fn test_mid_range_bounds(raw: f64) -> Regime {
        BiasCorrected
            .correct(raw, &registers_with_rank(12, 3))
            .regime
    }

    #[test]
    fn test_mid_range_requires_calibrated_index_bits() {
        let registers = registers_with_rank(11, 2);
        let estimate = BiasCorrected.correct(6_000.0, &registers);
        assert_eq!(estimate.regime, Regime::Raw);
        assert_eq!(estimate.value, 6_000.0);
    }

    #[test]
    fn test_large_range() {
        let registers = registers_with_rank(16, 45);
        let raw = LARGE_RANGE_THRESHOLD * 1.5;
        let estimate = BiasCorrected.correct(raw, &registers);
        assert_eq!(estimate.regime, Regime::Saturation);
        assert_eq!(
            estimate.value,
            -TWO_POW_64 * (1.0 - raw / TWO_POW_64).ln()
        );
        assert!(estimate.value.is_finite());

        // classic strategy leaves large estimates alone
        let estimate = Classic.correct(raw, &registers);
        assert_eq!(estimate, Estimate::uncorrected(raw));
    }

    #[test]
    fn test_large_range_threshold() {
        let registers = registers_with_rank(16, 45);
        let estimate = BiasCorrected.correct(LARGE_RANGE_THRESHOLD, &registers);
        assert_eq!(estimate.regime, Regime::Raw);
    }

    #[test_case(TWO_POW_64 => f64::INFINITY)]
    #[test_case(TWO_POW_64 * 2.0 => f64::INFINITY)]
    #[test_case(0.0 => 0.0)]
    fn test_saturation_correction(estimate: f64) -> f64 {
        saturation_correction(estimate)
    }

    #[test]
    fn test_default() {
        assert_eq!(Correction::default(), Correction::BiasCorrected(BiasCorrected));
    }
}
