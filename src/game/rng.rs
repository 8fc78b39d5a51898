//! Random source for colour picks and suspense delays
//!
//! A small LCG keeps games reproducible from a seed, which is all the
//! randomness this game needs.

use super::player::Color;
use std::time::{SystemTime, UNIX_EPOCH};

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Knuth's MMIX
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u64) -> Self {
        // Avoid 0 seed which would produce a weak first stretch
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Seed from the wall clock
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9e37_79b9_7f4a_7c15);
        Self::new(nanos)
    }

    /// Seeded if a seed is given, clock-seeded otherwise
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map(Self::new).unwrap_or_else(Self::from_clock)
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        // High bits of an LCG are the well-mixed ones
        (self.state >> 33) as u32
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Random value in [min, max], inclusive
    pub fn next_between(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())) % span
    }

    /// Uniform pick from RED, GREEN, BLUE
    pub fn next_color(&mut self) -> Color {
        Color::ALL[self.next_range(Color::ALL.len() as u32) as usize]
    }
}
