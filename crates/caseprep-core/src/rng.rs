//! Random number generator abstraction for determinism.
//!
//! In production, this wraps the thread-local RNG. In tests, a seeded or
//! sequenced implementation is injected so generated identifiers (guest
//! relay scopes, for example) are predictable.

use rand::Rng;

/// Abstraction over random number generation.
pub trait DeterministicRng: Send + Sync {
    /// Generate a random `u32` in the range `[min, max]` inclusive.
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32;

    /// Generate `len` random bytes rendered as lowercase hex.
    fn hex_token(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| format!("{:02x}", self.next_u32_range(0, 255)))
            .collect()
    }
}

/// Production RNG backed by `rand::rng()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRng;

impl DeterministicRng for ThreadRng {
    fn next_u32_range(&mut self, min: u32, max: u32) -> u32 {
        rand::rng().random_range(min..=max)
    }
}
