use std::hash::{BuildHasherDefault, Hasher};

use rand::Rng;


/// Large prime used as the MAD modulus unless a map is configured otherwise
pub const DEFAULT_PRIME: u64 = 109_345_121;

/// Hash codes are folded with a 5-bit cyclic shift
const CYCLIC_SHIFT: u32 = 5;


/// Polynomial-style hash code built with a 5-bit cyclic left shift
///
/// Every byte written to the hasher is folded into a 32-bit accumulator:
/// the accumulator is rotated left by five bits and the byte is added.
/// Strings are folded byte by byte, integers and floats through their
/// underlying bit pattern (the standard `Hash` impls write those bytes).
#[derive(Debug, Default, Clone, Copy)]
pub struct CyclicShiftHasher {
    code: u32,
}

impl Hasher for CyclicShiftHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.code = self.code.rotate_left(CYCLIC_SHIFT).wrapping_add(u32::from(byte));
        }
    }

    fn finish(&self) -> u64 {
        u64::from(self.code)
    }
}

pub type CyclicShiftBuildHasher = BuildHasherDefault<CyclicShiftHasher>;


/// Multiply-Add-Divide compression: `((a * h + b) mod p) mod n`
///
/// `a` and `b` are drawn once when the owning map is created, so the same
/// key sequence clusters differently in different map instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MadCompression {
    prime: u64,
    scale: u64, // a, in [1, p)
    shift: u64, // b, in [0, p)
}

impl MadCompression {

    /// Draw random scale and shift coefficients for the given prime
    pub fn new<R: Rng>(prime: u64, rng: &mut R) -> Self {
        // a prime below 2 leaves no valid scale
        let prime = prime.max(2);
        Self {
            prime,
            scale: rng.random_range(1..prime),
            shift: rng.random_range(0..prime),
        }
    }

    /// Fixed coefficients, clamped into their valid ranges
    pub fn with_coefficients(prime: u64, scale: u64, shift: u64) -> Self {
        let prime = prime.max(2);
        Self {
            prime,
            scale: (scale % prime).max(1),
            shift: shift % prime,
        }
    }

    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Compress a hash code into a bucket index in `[0, buckets)`
    pub fn compress(&self, hash_code: u64, buckets: usize) -> usize {
        let buckets = buckets.max(1) as u128;
        let mixed = (u128::from(self.scale) * u128::from(hash_code) + u128::from(self.shift))
            % u128::from(self.prime);
        (mixed % buckets) as usize
    }
}
