//! Fingerprint bundle produced by the perceptual layer for a whole
//! collection.
//!
//! The bundle keeps every artifact of one pass together (shingle sets,
//! vocabulary, hash family, signatures), so they can only be replaced as a
//! unit and never mixed across passes.

use serde::{Deserialize, Serialize};

use crate::hash_family::HashFamily;
use crate::minhash::Signature;
use crate::shingles::ShingleSet;
use crate::vocabulary::Vocabulary;

/// All perceptual artifacts for one document collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptualFingerprints {
    /// Shingle set per document, in collection order.
    pub shingle_sets: Vec<ShingleSet>,
    /// Vocabulary built over `shingle_sets`.
    pub vocabulary: Vocabulary,
    /// Hash family the signatures were computed with.
    pub hash_family: HashFamily,
    /// Signature per document, in collection order.
    pub signatures: Vec<Signature>,
    pub meta: PerceptualMeta,
}

impl PerceptualFingerprints {
    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

/// Metadata for traceability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PerceptualMeta {
    /// Perceptual algorithm version; bumped whenever shingling, id
    /// assignment, or the hash family changes in a way that can affect
    /// signatures.
    pub perceptual_version: u16,
    /// Human-readable algorithm identifier.
    pub algorithm_name: String,
    /// Shingle length in characters.
    pub k: usize,
    /// Signature length.
    pub num_hashes: usize,
    /// Seed the family was drawn with, if any.
    pub seed: Option<u64>,
    /// Number of documents.
    pub documents: usize,
    /// Number of distinct shingles across the collection.
    pub vocabulary_size: usize,
}
