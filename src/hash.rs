//! Seeded hash functions feeding `CardinalityEstimator`.
//!
//! The sketch only relies on hashes being deterministic for a given
//! `(bytes, seed)` pair and close to uniform over `BITS` bits. None of the
//! hashers below is meant to withstand adversarial input.

/// Hash function used by `CardinalityEstimator` to map items into registers.
pub trait SketchHasher {
    /// Width of produced hashes in bits, at most 64.
    const BITS: u32;

    /// Create hasher from given seed
    fn with_seed(seed: u64) -> Self;

    /// Hash given bytes. Returned value must be below `2^BITS`.
    fn hash_bytes(&self, bytes: &[u8]) -> u64;
}

const FNV32_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV32_PRIME: u32 = 16_777_619;
const FNV64_OFFSET_BASIS: u64 = 14_695_981_039_346_656_037;
const FNV64_PRIME: u64 = 1_099_511_628_211;

/// 32-bit FNV-1a followed by an xor-shift-multiply finalizer mixing
/// the low (register index) bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv32 {
    seed: u32,
}

impl SketchHasher for Fnv32 {
    const BITS: u32 = 32;

    /// Only the lowest 32 bits of `seed` are used.
    #[inline]
    fn with_seed(seed: u64) -> Self {
        Self { seed: seed as u32 }
    }

    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let mut h = FNV32_OFFSET_BASIS ^ self.seed;
        for &b in bytes {
            h ^= u32::from(b);
            h = h.wrapping_mul(FNV32_PRIME);
        }
        h ^= h >> 16;
        h = h.wrapping_mul(0x7feb_352d);
        h ^= h >> 15;
        h = h.wrapping_mul(0x846c_a68b);
        h ^= h >> 16;
        u64::from(h)
    }
}

/// 64-bit FNV-1a followed by the MurmurHash3 `fmix64` finalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv64 {
    seed: u64,
}

impl SketchHasher for Fnv64 {
    const BITS: u32 = 64;

    #[inline]
    fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        let h = bytes.iter().fold(FNV64_OFFSET_BASIS ^ self.seed, |h, &b| {
            (h ^ u64::from(b)).wrapping_mul(FNV64_PRIME)
        });
        fmix64(h)
    }
}

/// Final avalanche step of 64-bit MurmurHash3
#[inline]
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// 64-bit wyhash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WyHash64 {
    seed: u64,
}

impl SketchHasher for WyHash64 {
    const BITS: u32 = 64;

    #[inline]
    fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    #[inline]
    fn hash_bytes(&self, bytes: &[u8]) -> u64 {
        wyhash::wyhash(bytes, self.seed)
    }
}
