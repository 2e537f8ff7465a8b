#![no_main]

use cardinality_sketch::{BiasCorrectedEstimator, ClassicEstimator};
use libfuzzer_sys::fuzz_target;
use wyhash::wyhash;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // first byte picks index bits, the rest is split into items of varying size
    let index_bits = 4 + data[0] % 13;
    let chunk_size = 1 + (wyhash(data, 0) as usize % 8);

    let mut classic = ClassicEstimator::classic(u32::from(data[0]), index_bits).unwrap();
    let mut bias_corrected =
        BiasCorrectedEstimator::bias_corrected(u64::from(data[0]), index_bits).unwrap();

    for chunk in data[1..].chunks(chunk_size) {
        let before = bias_corrected.registers().to_vec();
        classic.insert(chunk);
        bias_corrected.insert(chunk);

        assert!(before
            .iter()
            .zip(bias_corrected.registers())
            .all(|(old, new)| old <= new));
        assert!(!classic.is_empty());

        let classic_estimate = classic.estimate();
        let bias_corrected_estimate = bias_corrected.estimate();
        assert!(classic_estimate.is_finite() && classic_estimate > 0.0);
        assert!(bias_corrected_estimate.is_finite() && bias_corrected_estimate > 0.0);
    }
});
