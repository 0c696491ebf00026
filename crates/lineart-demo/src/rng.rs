//! Deterministic pseudo-random scalars for the particle trail.

use crate::error::ConfigError;

/// Source of uniform floats in `[-1, 1)`.
pub trait UnitRandom {
    fn next_unit_float(&mut self) -> f32;
}

/// 32-bit xorshift generator (shifts 13, 17, 5).
///
/// Same seed, same sequence. State must never be zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Seed that reproduces the reference animation frame for frame.
    pub const DEFAULT_SEED: u32 = 0x1234_5678;

    pub fn with_seed(seed: u32) -> Result<Self, ConfigError> {
        if seed == 0 {
            return Err(ConfigError::ZeroSeed);
        }
        Ok(Self { state: seed })
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self { state: Self::DEFAULT_SEED }
    }
}

impl UnitRandom for XorShift32 {
    /// Low 16 bits scaled to `[0, 1)`, then to `[-1, 1)`.
    #[inline]
    fn next_unit_float(&mut self) -> f32 {
        let bits = self.next_u32() & 0xFFFF;
        (bits as f32 / 65536.0) * 2.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_values_from_default_seed() {
        let mut rng = XorShift32::default();
        assert_eq!(rng.next_u32(), 0x8798_5AA5);
        assert_eq!(rng.next_u32(), 0x155B_24A3);
        assert_eq!(rng.next_u32(), 0x4820_F4C4);
    }

    #[test]
    fn unit_float_uses_low_bits() {
        // 0x87985AA5 & 0xFFFF = 23205; 23205 / 65536 * 2 - 1 = -19126 / 65536
        let mut rng = XorShift32::default();
        assert_eq!(rng.next_unit_float(), -19126.0 / 65536.0);
    }

    #[test]
    fn zero_seed_rejected() {
        assert_eq!(XorShift32::with_seed(0), Err(ConfigError::ZeroSeed));
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = XorShift32::with_seed(42).unwrap();
        let mut b = XorShift32::with_seed(42).unwrap();
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = XorShift32::with_seed(1).unwrap();
        let mut b = XorShift32::with_seed(2).unwrap();
        assert_ne!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn never_reaches_zero_state() {
        let mut rng = XorShift32::default();
        for _ in 0..100_000 {
            assert_ne!(rng.next_u32(), 0);
        }
    }

    #[test]
    fn unit_float_range() {
        for seed in [1, 7, 0xDEAD_BEEF, u32::MAX, XorShift32::DEFAULT_SEED] {
            let mut rng = XorShift32::with_seed(seed).unwrap();
            for _ in 0..10_000 {
                let v = rng.next_unit_float();
                assert!((-1.0..1.0).contains(&v), "seed {seed:#x} produced {v}");
            }
        }
    }
}
