//! Lightweight xorshift32 PRNG, deterministic per seed, no allocation

use herbfall_core::Vec2;
use std::f32::consts::TAU;

pub struct HerbRng {
    state: u32,
}

impl HerbRng {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Returns a float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        // 24 high bits fit the f32 mantissa exactly, so 1.0 is never produced
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Returns a float in [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns a float in [range.0, range.1)
    pub fn in_range(&mut self, range: (f32, f32)) -> f32 {
        self.range(range.0, range.1)
    }

    /// Returns a float in [-magnitude, magnitude)
    pub fn signed(&mut self, magnitude: f32) -> f32 {
        self.range(-magnitude, magnitude)
    }

    /// Returns an index in [0, len). `len` must be nonzero.
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next_f32() * len as f32) as usize).min(len.saturating_sub(1))
    }

    /// Returns a phase angle in [0, 2π)
    pub fn phase(&mut self) -> f32 {
        self.range(0.0, TAU)
    }

    /// Returns a uniformly distributed unit vector
    pub fn unit_vector(&mut self) -> Vec2 {
        let angle = self.phase();
        Vec2::new(angle.cos(), angle.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_range_bounds() {
        let mut rng = HerbRng::new(42);
        for _ in 0..1000 {
            let v = rng.range(0.0, 10.0);
            assert!((0.0..10.0).contains(&v));
        }
    }

    #[test]
    fn rng_unit_vector_length() {
        let mut rng = HerbRng::new(123);
        for _ in 0..100 {
            let v = rng.unit_vector();
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn rng_index_in_bounds() {
        let mut rng = HerbRng::new(7);
        for _ in 0..1000 {
            assert!(rng.index(3) < 3);
        }
    }

    #[test]
    fn rng_same_seed_same_sequence() {
        let mut a = HerbRng::new(99);
        let mut b = HerbRng::new(99);
        for _ in 0..16 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn rng_zero_seed_is_usable() {
        let mut rng = HerbRng::new(0);
        let first = rng.next_f32();
        let second = rng.next_f32();
        assert_ne!(first, second);
    }
}
