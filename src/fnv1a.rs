//! FNV-1a, the table layer's default hash.
//!
//! 64-bit Fowler–Noll–Vo in the 1a byte order (xor then multiply), exposed
//! both as a plain byte-hash function and through the standard
//! `Hasher`/`BuildHasher` traits so `HopTable` can take any `BuildHasher`
//! and default to this one. FNV is not collision-resistant against
//! adversarial keys; it is the fast, dependency-free default, not a DoS
//! defense.

use core::hash::{BuildHasher, Hasher};

const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const PRIME: u64 = 0x100000001b3;

/// Hash a byte string with 64-bit FNV-1a.
pub fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut state = OFFSET_BASIS;
    for &b in bytes {
        state ^= u64::from(b);
        state = state.wrapping_mul(PRIME);
    }
    state
}

/// Streaming FNV-1a 64 state.
#[derive(Copy, Clone, Debug)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= u64::from(b);
            self.state = self.state.wrapping_mul(PRIME);
        }
    }
}

/// `BuildHasher` producing fresh `Fnv1aHasher`s; the `HopTable` default.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Fnv1aBuildHasher;

impl BuildHasher for Fnv1aBuildHasher {
    type Hasher = Fnv1aHasher;

    fn build_hasher(&self) -> Fnv1aHasher {
        Fnv1aHasher::default()
    }
}
