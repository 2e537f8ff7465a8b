//! Empirical bias correction for mid-range raw estimates.
//!
//! In the `[2.5 * M, 5 * M)` range the raw HyperLogLog estimate systematically
//! overestimates cardinality. The table below pairs raw estimates with their
//! measured bias for `P = 12` (4096 registers). Correction averages the bias
//! of `WINDOW_LEN` table entries surrounding the raw estimate.
//!
//! The measured bias is in absolute units of a 4096-register sketch, up to
//! 2953 at the low end. Subtracting it from the raw estimate of a smaller
//! sketch can drive the estimate below zero, so the correction only runs when
//! the sketch has `CALIBRATED_INDEX_BITS` index bits.
//!
//! [HyperLogLog++ paper](https://static.googleusercontent.com/media/research.google.com/en//pubs/archive/40671.pdf)

use std::ops::Range;

/// Number of table entries
pub const TABLE_LEN: usize = 200;
/// Number of neighbouring entries averaged per lookup
pub const WINDOW_LEN: usize = 6;
/// Index bits the table was calibrated for
pub const CALIBRATED_INDEX_BITS: u8 = 12;

/// Index of the first `RAW_ESTIMATE` entry not less than `estimate`,
/// or `TABLE_LEN` when every entry is smaller.
#[inline]
pub fn lower_bound(estimate: f64) -> usize {
    RAW_ESTIMATE.partition_point(|&raw| raw < estimate)
}

/// Window of `WINDOW_LEN` entries centered on `idx`, shifted back inside
/// `[0..TABLE_LEN)` near the table edges.
#[inline]
pub fn window(idx: usize) -> Range<usize> {
    let mut left = idx.saturating_sub(WINDOW_LEN / 2);
    let right = (left + WINDOW_LEN).min(TABLE_LEN);
    if right < left + WINDOW_LEN {
        left = right.saturating_sub(WINDOW_LEN);
    }
    left..right
}

/// Average bias of the table window surrounding `estimate`
#[inline]
pub fn estimate_bias(estimate: f64) -> f64 {
    let window = window(lower_bound(estimate));
    let count = window.len() as f64;
    BIAS[window].iter().sum::<f64>() / count
}

/// Raw estimates at which `BIAS` was measured, strictly increasing
pub const RAW_ESTIMATE: [f64; TABLE_LEN] = [
    2954.0, 3003.4782, 3053.3568, 3104.3666, 3155.324, 3206.9598, 3259.648, 3312.539, 3366.1474,
    3420.2576, 3474.8376, 3530.6076, 3586.451, 3643.38, 3700.4104, 3757.5638, 3815.9676, 3875.193,
    3934.838, 3994.8548, 4055.018, 4117.1742, 4178.4482, 4241.1294, 4304.4776, 4367.4044, 4431.8724,
    4496.3732, 4561.4304, 4627.5326, 4693.949, 4761.5532, 4828.7256, 4897.6182, 4965.5186,
    5034.4528, 5104.865, 5174.7164, 5244.6828, 5316.6708, 5387.8312, 5459.9036, 5532.476, 5604.8652,
    5679.6718, 5753.757, 5830.2072, 5905.2828, 5980.0434, 6056.6264, 6134.3192, 6211.5746,
    6290.0816, 6367.1176, 6447.9796, 6526.5576, 6606.1858, 6686.9144, 6766.1142, 6847.0818,
    6927.9664, 7010.9096, 7091.0816, 7175.3962, 7260.3454, 7344.018, 7426.4214, 7511.3106,
    7596.0686, 7679.8094, 7765.818, 7852.4248, 7936.834, 8022.363, 8109.5066, 8200.4554, 8288.5832,
    8373.366, 8463.4808, 8549.7682, 8642.0522, 8728.3288, 8820.9528, 8907.727, 9001.0794, 9091.2522,
    9179.988, 9269.852, 9362.6394, 9453.642, 9546.9024, 9640.6616, 9732.6622, 9824.3254, 9917.7484,
    10007.9392, 10106.7508, 10196.2152, 10289.8114, 10383.5494, 10482.3064, 10576.8734, 10668.7872,
    10764.7156, 10862.0196, 10952.793, 11049.9748, 11146.0702, 11241.4492, 11339.2772, 11434.2336,
    11530.741, 11627.6136, 11726.311, 11821.5964, 11918.837, 12015.3724, 12113.0162, 12213.0424,
    12306.9804, 12408.4518, 12504.8968, 12604.586, 12700.9332, 12798.705, 12898.5142, 12997.0488,
    13094.788, 13198.475, 13292.7764, 13392.9698, 13486.8574, 13590.1616, 13686.5838, 13783.6264,
    13887.2638, 13992.0978, 14081.0844, 14189.9956, 14280.0912, 14382.4956, 14486.4384, 14588.1082,
    14686.2392, 14782.276, 14888.0284, 14985.1864, 15088.8596, 15187.0998, 15285.027, 15383.6694,
    15495.8266, 15591.3736, 15694.2008, 15790.3246, 15898.4116, 15997.4522, 16095.5014, 16198.8514,
    16291.7492, 16402.6424, 16499.1266, 16606.2436, 16697.7186, 16796.3946, 16902.3376, 17005.7672,
    17100.814, 17206.8282, 17305.8262, 17416.0744, 17508.4092, 17617.0178, 17715.4554, 17816.758,
    17920.1748, 18012.9236, 18119.7984, 18223.2248, 18324.2482, 18426.6276, 18525.0932, 18629.8976,
    18733.2588, 18831.0466, 18940.1366, 19032.2696, 19131.729, 19243.4864, 19349.6932, 19442.866,
    19547.9448, 19653.2798, 19754.4034, 19854.0692, 19965.1224, 20065.1774, 20158.2212, 20253.353,
    20366.3264,
];

/// Measured bias of the raw estimate at matching `RAW_ESTIMATE` entry
pub const BIAS: [f64; TABLE_LEN] = [
    2953.0, 2900.4782, 2848.3568, 2796.3666, 2745.324, 2694.9598, 2644.648, 2595.539, 2546.1474,
    2498.2576, 2450.8376, 2403.6076, 2357.451, 2311.38, 2266.4104, 2221.5638, 2176.9676, 2134.193,
    2090.838, 2048.8548, 2007.018, 1966.1742, 1925.4482, 1885.1294, 1846.4776, 1807.4044, 1768.8724,
    1731.3732, 1693.4304, 1657.5326, 1621.949, 1586.5532, 1551.7256, 1517.6182, 1483.5186,
    1450.4528, 1417.865, 1385.7164, 1352.6828, 1322.6708, 1291.8312, 1260.9036, 1231.476, 1201.8652,
    1173.6718, 1145.757, 1119.2072, 1092.2828, 1065.0434, 1038.6264, 1014.3192, 988.5746, 965.0816,
    940.1176, 917.9796, 894.5576, 871.1858, 849.9144, 827.1142, 805.0818, 783.9664, 763.9096,
    742.0816, 724.3962, 706.3454, 688.018, 667.4214, 650.3106, 633.0686, 613.8094, 597.818,
    581.4248, 563.834, 547.363, 531.5066, 520.455400000001, 505.583199999999, 488.366,
    476.480799999999, 459.7682, 450.0522, 434.328799999999, 423.952799999999, 408.727000000001,
    399.079400000001, 387.252200000001, 373.987999999999, 360.852000000001, 351.6394, 339.642,
    330.902400000001, 322.661599999999, 311.662200000001, 301.3254, 291.7484, 279.939200000001,
    276.7508, 263.215200000001, 254.811400000001, 245.5494, 242.306399999999, 234.8734,
    223.787200000001, 217.7156, 212.0196, 200.793, 195.9748, 189.0702, 182.449199999999, 177.2772,
    170.2336, 164.741, 158.613600000001, 155.311, 147.5964, 142.837, 137.3724, 132.0162, 130.0424,
    121.9804, 120.451800000001, 114.8968, 111.585999999999, 105.933199999999, 101.705,
    98.5141999999996, 95.0488000000005, 89.7880000000005, 91.4750000000004, 83.7764000000006,
    80.9698000000008, 72.8574000000008, 73.1615999999995, 67.5838000000003, 62.6263999999992,
    63.2638000000006, 66.0977999999996, 52.0843999999997, 58.9956000000002, 47.0912000000008,
    46.4956000000002, 48.4383999999991, 47.1082000000006, 43.2392, 37.2759999999998,
    40.0283999999992, 35.1864000000005, 35.8595999999998, 32.0998, 28.027, 23.6694000000007,
    33.8266000000003, 26.3736000000008, 27.2008000000005, 21.3245999999999, 26.4115999999995,
    23.4521999999997, 19.5013999999992, 19.8513999999996, 10.7492000000002, 18.6424000000006,
    13.1265999999996, 18.2436000000016, 6.71860000000015, 3.39459999999963, 6.33759999999893,
    7.76719999999841, 0.813999999998487, 3.82819999999992, 0.826199999999517, 8.07440000000133,
    -1.59080000000176, 5.01780000000144, 0.455399999998917, -0.24199999999837, 0.174800000000687,
    -9.07640000000174, -4.20160000000033, -3.77520000000004, -4.75179999999818, -5.3724000000002,
    -8.90680000000066, -6.10239999999976, -5.74120000000039, -9.95339999999851, -3.86339999999836,
    -13.7304000000004, -16.2710000000006, -7.51359999999841, -3.30679999999847, -13.1339999999982,
    -10.0551999999989, -6.72019999999975, -8.59660000000076, -10.9307999999983, -1.8775999999998,
    -4.82259999999951, -13.7788, -21.6470000000008, -10.6735999999983,
];

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_raw_estimates_increasing() {
        assert!(RAW_ESTIMATE.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_window_always_full() {
        for idx in 0..=TABLE_LEN {
            let window = window(idx);
            assert_eq!(window.len(), WINDOW_LEN, "idx = {idx}");
            assert!(window.end <= TABLE_LEN, "idx = {idx}");
        }
    }

    #[test_case(0 => 0..6; "below table")]
    #[test_case(2 => 0..6)]
    #[test_case(3 => 0..6)]
    #[test_case(4 => 1..7)]
    #[test_case(100 => 97..103)]
    #[test_case(196 => 193..199)]
    #[test_case(197 => 194..200)]
    #[test_case(199 => 194..200)]
    #[test_case(200 => 194..200; "above table")]
    fn test_window(idx: usize) -> Range<usize> {
        window(idx)
    }

    #[test_case(0.0 => 0; "zero")]
    #[test_case(2954.0 => 0; "first entry")]
    #[test_case(2954.5 => 1; "between first and second")]
    #[test_case(10007.9392 => 95; "exact entry")]
    #[test_case(20366.3264 => 199; "last entry")]
    #[test_case(20366.5 => 200; "above last entry")]
    #[test_case(f64::MAX => 200; "max")]
    fn test_lower_bound(estimate: f64) -> usize {
        lower_bound(estimate)
    }

    #[test]
    fn test_estimate_bias_at_edges() {
        let head = BIAS[..6].iter().sum::<f64>() / 6.0;
        let tail = BIAS[194..].iter().sum::<f64>() / 6.0;
        assert_eq!(estimate_bias(1.0), head);
        assert_eq!(estimate_bias(1e9), tail);
    }

    #[test]
    fn test_estimate_bias_mid_table() {
        let estimate = RAW_ESTIMATE[120];
        let expected = BIAS[117..123].iter().sum::<f64>() / 6.0;
        assert_eq!(estimate_bias(estimate), expected);
    }
}
