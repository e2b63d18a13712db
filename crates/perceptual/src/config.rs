//! Configuration and error types for the docsim perceptual layer.
//!
//! This module defines the public configuration surface for shingling and
//! MinHash signatures. It performs no I/O; the only source of
//! non-determinism in the layer is the hash family draw, which becomes
//! reproducible once [`PerceptualConfig::seed`] is set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the shingling and signature stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerceptualConfig {
    /// Number of characters per shingle (k-shingling).
    ///
    /// Small values make every document look alike; large values make
    /// near-duplicates with a single edit share few shingles.
    pub k: usize,
    /// Number of hash functions, i.e. the signature length.
    ///
    /// Signature cost grows linearly with this value, and so does the
    /// accuracy of the MinHash similarity estimate.
    pub num_hashes: usize,
    /// Optional seed for the hash family.
    ///
    /// `None` draws a fresh family on every rebuild, so absolute signature
    /// values are not stable across rebuilds. `Some` makes every rebuild
    /// with the same documents bit-identical.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PerceptualConfig {
    /// Create a new configuration with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shingle size (k). Typical values: 2-9.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Set the number of hash functions. Typical values: 20-200.
    pub fn with_num_hashes(mut self, num_hashes: usize) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Pin the hash family to a seed for reproducible signatures.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Go back to drawing an unseeded family on every rebuild.
    pub fn unseeded(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), PerceptualError> {
        if self.k < 1 {
            return Err(PerceptualError::InvalidConfigK { k: self.k });
        }
        if self.num_hashes < 1 {
            return Err(PerceptualError::InvalidConfigNumHashes {
                num_hashes: self.num_hashes,
            });
        }
        Ok(())
    }
}

impl Default for PerceptualConfig {
    fn default() -> Self {
        Self {
            k: 3,
            num_hashes: 100,
            seed: None,
        }
    }
}

/// Errors returned by the perceptual layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PerceptualError {
    #[error("invalid parameter: k must be >= 1 (got {k})")]
    InvalidConfigK { k: usize },

    #[error("invalid parameter: num_hashes must be >= 1 (got {num_hashes})")]
    InvalidConfigNumHashes { num_hashes: usize },

    #[error("shingle {shingle:?} has no vocabulary id")]
    UnknownShingle { shingle: String },
}

impl PerceptualError {
    /// Whether this error reports a rejected caller-supplied parameter.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            PerceptualError::InvalidConfigK { .. } | PerceptualError::InvalidConfigNumHashes { .. }
        )
    }
}
