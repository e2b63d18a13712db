//! # docsim Perceptual Layer
//!
//! This crate turns a collection of short text documents into MinHash
//! signatures whose agreement rate approximates the Jaccard similarity of
//! the documents' character shingle sets.
//!
//! ## Contract
//!
//! - Documents are identified by their position in the input slice.
//! - Everything derived from one collection (shingle sets, vocabulary, hash
//!   family, signatures) is produced together in one
//!   [`PerceptualFingerprints`] value and is never updated in place.
//! - With [`PerceptualConfig::seed`] set the output is a pure function of
//!   `(documents, config)`. Without it, only the hash family changes between
//!   runs; shingle sets and vocabulary are always deterministic.
//!
//! ## Core Pipeline
//!
//! 1.  **Shingling**: each document becomes the set of its contiguous
//!     k-character substrings. Documents shorter than `k` contribute a
//!     single shingle, the whole document.
//!
//! 2.  **Vocabulary**: every distinct shingle receives a dense integer id in
//!     first-encountered order.
//!
//! 3.  **Hash family**: `num_hashes` affine functions
//!     `h(x) = (a * x + b) mod (2^32 - 1)` are drawn at random.
//!
//! 4.  **MinHashing**: position `j` of a signature is the minimum of `h_j`
//!     over the ids of the document's shingles.
//!
//! ## Example Usage
//!
//! ```
//! use perceptual::{fingerprint_documents, PerceptualConfig};
//!
//! let docs = ["the cat sat", "the cat ran", "a dog barked"];
//! let cfg = PerceptualConfig::new().with_k(3).with_num_hashes(20).with_seed(7);
//!
//! let fps = fingerprint_documents(&docs, &cfg).unwrap();
//!
//! assert_eq!(fps.signatures.len(), 3);
//! assert_eq!(fps.signatures[0].len(), 20);
//! assert_eq!(fps.meta.k, 3);
//! ```
pub mod config;
pub mod fingerprint;
pub mod hash_family;
pub mod minhash;
pub mod shingles;
pub mod vocabulary;

use std::time::Instant;

use tracing::debug;

pub use crate::config::{PerceptualConfig, PerceptualError};
pub use crate::fingerprint::{PerceptualFingerprints, PerceptualMeta};
pub use crate::hash_family::{HashFamily, HashFunction, HASH_MODULUS};
pub use crate::minhash::{
    build_signatures, estimate_similarity, signature_for, signature_for_known, Signature, UNSET,
};
pub use crate::shingles::{shingle_documents, shingles, ShingleSet};
pub use crate::vocabulary::Vocabulary;

/// Current perceptual algorithm version for this crate.
pub const PERCEPTUAL_VERSION: u16 = 1;

/// Human-readable algorithm identifier.
pub const PERCEPTUAL_ALGORITHM: &str = "char_shingle_affine_minhash_v1";

/// Run the full perceptual pass (shingles → vocabulary → hash family →
/// signatures) over `documents`.
pub fn fingerprint_documents<S>(
    documents: &[S],
    cfg: &PerceptualConfig,
) -> Result<PerceptualFingerprints, PerceptualError>
where
    S: AsRef<str>,
{
    cfg.validate()?;

    let start = Instant::now();
    let shingle_sets = shingle_documents(documents, cfg.k)?;
    let vocabulary = Vocabulary::build(&shingle_sets);
    debug!(
        documents = documents.len(),
        vocabulary_size = vocabulary.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "perceptual.shingled"
    );

    let start = Instant::now();
    let hash_family = HashFamily::generate(cfg.num_hashes, cfg.seed)?;
    let signatures = build_signatures(&shingle_sets, &vocabulary, &hash_family)?;
    debug!(
        num_hashes = cfg.num_hashes,
        seeded = cfg.seed.is_some(),
        elapsed_micros = start.elapsed().as_micros(),
        "perceptual.signed"
    );

    let meta = PerceptualMeta {
        perceptual_version: PERCEPTUAL_VERSION,
        algorithm_name: PERCEPTUAL_ALGORITHM.to_string(),
        k: cfg.k,
        num_hashes: cfg.num_hashes,
        seed: cfg.seed,
        documents: documents.len(),
        vocabulary_size: vocabulary.len(),
    };

    Ok(PerceptualFingerprints {
        shingle_sets,
        vocabulary,
        hash_family,
        signatures,
        meta,
    })
}
