//! Universal hash family used for MinHash permutations.
//!
//! Each function is an affine map `h(x) = (a * x + b) mod M` with
//! `M = 2^32 - 1`, `a` drawn from `[1, M - 1]` and `b` from `[0, M - 1]`.

use serde::{Deserialize, Serialize};

use crate::config::PerceptualError;

/// Modulus shared by every hash function in the family.
pub const HASH_MODULUS: u64 = (1 << 32) - 1;

/// One affine hash function over vocabulary ids.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashFunction {
    pub a: u64,
    pub b: u64,
}

impl HashFunction {
    /// Evaluate the function. Always returns a value below [`HASH_MODULUS`].
    #[inline]
    pub fn apply(&self, x: u64) -> u64 {
        // Widen so ids beyond 2^32 cannot overflow the product.
        let m = HASH_MODULUS as u128;
        ((self.a as u128 * x as u128 + self.b as u128) % m) as u64
    }
}

/// Ordered sequence of independently drawn hash functions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HashFamily {
    functions: Vec<HashFunction>,
}

impl HashFamily {
    /// Draw `count` hash functions.
    ///
    /// With `seed = None` the draw comes from a freshly seeded generator, so
    /// two calls will almost surely return different families. With
    /// `Some(seed)` the same family is returned every time.
    pub fn generate(count: usize, seed: Option<u64>) -> Result<Self, PerceptualError> {
        if count == 0 {
            return Err(PerceptualError::InvalidConfigNumHashes { num_hashes: count });
        }

        let mut rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };

        let functions = (0..count)
            .map(|_| HashFunction {
                a: rng.u64(1..HASH_MODULUS),
                b: rng.u64(0..HASH_MODULUS),
            })
            .collect();

        Ok(Self { functions })
    }

    /// Wrap explicit functions, e.g. to replay a family from a report.
    pub fn from_functions(functions: Vec<HashFunction>) -> Result<Self, PerceptualError> {
        if functions.is_empty() {
            return Err(PerceptualError::InvalidConfigNumHashes { num_hashes: 0 });
        }
        Ok(Self { functions })
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn functions(&self) -> &[HashFunction] {
        &self.functions
    }

    pub fn iter(&self) -> impl Iterator<Item = &HashFunction> + '_ {
        self.functions.iter()
    }
}
