//! # docsim Index
//!
//! This crate provides the Locality-Sensitive-Hashing band index over
//! MinHash signatures produced by the `perceptual` crate.
//!
//! ## Core Concepts
//!
//! - Each signature of length `n` is cut into `num_bands` contiguous bands
//!   of `rows = n / num_bands` values. By default `n` must divide evenly;
//!   with [`IndexConfig::truncate_remainder`] the rows are
//!   `floor(n / num_bands)` and trailing values past `num_bands * rows`
//!   are not banded.
//! - A bucket key is the band number together with the exact row values of
//!   that band. Two documents share a bucket only if every row matches.
//! - A query returns every other document sharing at least one bucket with
//!   the query document. Documents with identical signatures always
//!   collide; similar documents collide with probability
//!   `1 - (1 - s^rows)^bands` (see [`collision_probability`]).
//!
//! The index is built once from a full signature collection and is
//! immutable afterwards. Rebuild it together with the signatures whenever
//! either changes.
//!
//! ## Example Usage
//!
//! ```
//! use index::BandIndex;
//! use perceptual::Signature;
//!
//! let signatures = vec![
//!     Signature::new(vec![1, 2, 3, 4]),
//!     Signature::new(vec![1, 2, 9, 9]),
//!     Signature::new(vec![7, 7, 7, 7]),
//! ];
//!
//! let index = BandIndex::build(&signatures, 2).unwrap();
//! assert_eq!(index.rows_per_band(), 2);
//!
//! let candidates = index.query(0, &signatures).unwrap();
//! assert!(candidates.contains(&1));
//! assert!(!candidates.contains(&2));
//! ```

mod band;
mod query;

use std::time::Instant;

use hashbrown::HashMap;
use perceptual::Signature;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::band::{band_keys, BandKey, BandKeyRef};

pub use crate::band::{
    collision_probability, rows_per_band, rows_per_band_truncated, similarity_threshold,
};
pub use crate::query::CandidatePair;

/// Errors returned while building or querying a [`BandIndex`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("invalid parameter: num_bands must be >= 1 (got {num_bands})")]
    InvalidNumBands { num_bands: usize },

    #[error(
        "incompatible banding: {signature_len} hash values do not split into {num_bands} bands of at least one row"
    )]
    IncompatibleBanding {
        signature_len: usize,
        num_bands: usize,
    },

    #[error("signature of document {doc_id} has {found} values, expected {expected}")]
    SignatureLengthMismatch {
        doc_id: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown document {doc_id} (collection has {documents} documents)")]
    UnknownDocument { doc_id: usize, documents: usize },
}

/// Index configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of bands each signature is cut into.
    ///
    /// More bands with fewer rows raise recall and lower precision.
    pub num_bands: usize,
    /// Accept signature lengths that are not a multiple of `num_bands`,
    /// leaving the trailing values out of banding.
    #[serde(default)]
    pub truncate_remainder: bool,
}

impl IndexConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_num_bands(mut self, num_bands: usize) -> Self {
        self.num_bands = num_bands;
        self
    }

    pub fn with_truncate_remainder(mut self, truncate_remainder: bool) -> Self {
        self.truncate_remainder = truncate_remainder;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.num_bands < 1 {
            return Err(IndexError::InvalidNumBands {
                num_bands: self.num_bands,
            });
        }
        Ok(())
    }

    /// Rows per band for signatures of `num_hashes` values.
    pub fn rows_per_band(&self, num_hashes: usize) -> Option<usize> {
        if self.truncate_remainder {
            rows_per_band_truncated(num_hashes, self.num_bands)
        } else {
            rows_per_band(num_hashes, self.num_bands)
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            num_bands: 20,
            truncate_remainder: false,
        }
    }
}

/// Summary of a built index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    pub num_bands: usize,
    pub rows_per_band: usize,
    /// Signature values past the last full band, ignored by banding.
    pub truncated_values: usize,
    pub buckets: usize,
    /// Buckets holding more than one document.
    pub colliding_buckets: usize,
    pub largest_bucket: usize,
}

/// LSH band index mapping bucket keys to document ids.
#[derive(Debug, Clone)]
pub struct BandIndex {
    num_bands: usize,
    rows: usize,
    signature_len: usize,
    documents: usize,
    /// Bucket members in insertion (document) order.
    buckets: HashMap<BandKey, Vec<usize>>,
}

impl BandIndex {
    /// Build the index from a full signature collection.
    ///
    /// An empty collection yields an empty index. All signatures must have
    /// the same length, and that length must split evenly into `num_bands`
    /// bands of at least one row.
    pub fn build(signatures: &[Signature], num_bands: usize) -> Result<Self, IndexError> {
        Self::build_with(signatures, &IndexConfig::new().with_num_bands(num_bands))
    }

    /// Like [`BandIndex::build`], but a remainder of the signature length
    /// is left out of banding instead of being rejected.
    pub fn build_truncated(signatures: &[Signature], num_bands: usize) -> Result<Self, IndexError> {
        let cfg = IndexConfig::new()
            .with_num_bands(num_bands)
            .with_truncate_remainder(true);
        Self::build_with(signatures, &cfg)
    }

    /// Build the index with the band layout described by `cfg`.
    pub fn build_with(signatures: &[Signature], cfg: &IndexConfig) -> Result<Self, IndexError> {
        cfg.validate()?;
        let num_bands = cfg.num_bands;

        let Some(first) = signatures.first() else {
            return Ok(Self {
                num_bands,
                rows: 0,
                signature_len: 0,
                documents: 0,
                buckets: HashMap::new(),
            });
        };

        let start = Instant::now();
        let signature_len = first.len();
        let rows = cfg.rows_per_band(signature_len).ok_or(
            IndexError::IncompatibleBanding {
                signature_len,
                num_bands,
            },
        )?;

        let mut buckets: HashMap<BandKey, Vec<usize>> =
            HashMap::with_capacity(signatures.len() * num_bands);

        for (doc_id, signature) in signatures.iter().enumerate() {
            if signature.len() != signature_len {
                return Err(IndexError::SignatureLengthMismatch {
                    doc_id,
                    expected: signature_len,
                    found: signature.len(),
                });
            }
            for key in band_keys(signature.values(), num_bands, rows) {
                match buckets.get_mut(&key) {
                    Some(members) => members.push(doc_id),
                    None => {
                        buckets.insert(key.to_owned_key(), vec![doc_id]);
                    }
                }
            }
        }

        debug!(
            documents = signatures.len(),
            num_bands,
            rows,
            buckets = buckets.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "index.built"
        );

        Ok(Self {
            num_bands,
            rows,
            signature_len,
            documents: signatures.len(),
            buckets,
        })
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Rows per band; zero only for an index built from no signatures.
    pub fn rows_per_band(&self) -> usize {
        self.rows
    }

    /// Signature length the index was built for.
    pub fn signature_len(&self) -> usize {
        self.signature_len
    }

    /// Number of documents indexed.
    pub fn len(&self) -> usize {
        self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Documents in bucket `band` with exactly these row values, in
    /// insertion order.
    pub fn bucket(&self, band: usize, rows: &[u64]) -> Option<&[usize]> {
        self.buckets
            .get(&BandKeyRef::new(band, rows))
            .map(Vec::as_slice)
    }

    /// Bucket sizes per band number, for diagnostics.
    pub fn buckets_per_band(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_bands];
        for key in self.buckets.keys() {
            counts[key.band()] += 1;
        }
        counts
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.documents,
            num_bands: self.num_bands,
            rows_per_band: self.rows,
            truncated_values: self.signature_len - self.num_bands * self.rows,
            buckets: self.buckets.len(),
            colliding_buckets: self.buckets.values().filter(|m| m.len() > 1).count(),
            largest_bucket: self.buckets.values().map(Vec::len).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sigs(values: &[&[u64]]) -> Vec<Signature> {
        values.iter().map(|v| Signature::new(v.to_vec())).collect()
    }

    #[test]
    fn build_rejects_zero_bands() {
        let s = sigs(&[&[1, 2]]);
        assert_eq!(
            BandIndex::build(&s, 0).unwrap_err(),
            IndexError::InvalidNumBands { num_bands: 0 }
        );
    }

    #[test]
    fn build_four_hashes_two_bands_has_two_rows() {
        let s = sigs(&[&[1, 2, 3, 4]]);
        let index = BandIndex::build(&s, 2).unwrap();
        assert_eq!(index.rows_per_band(), 2);
        assert_eq!(index.bucket_count(), 2);
    }

    #[test]
    fn build_five_hashes_two_bands_is_incompatible() {
        let s = sigs(&[&[1, 2, 3, 4, 5]]);
        assert_eq!(
            BandIndex::build(&s, 2).unwrap_err(),
            IndexError::IncompatibleBanding {
                signature_len: 5,
                num_bands: 2
            }
        );
    }

    #[test]
    fn build_truncated_drops_last_value() {
        let s = sigs(&[&[1, 2, 3, 4, 5], &[1, 2, 3, 4, 6]]);
        let index = BandIndex::build_truncated(&s, 2).unwrap();
        assert_eq!(index.rows_per_band(), 2);
        assert_eq!(index.stats().truncated_values, 1);
        // The differing fifth value is never banded, so both share both buckets.
        assert_eq!(index.bucket(0, &[1, 2]), Some(&[0, 1][..]));
        assert_eq!(index.bucket(1, &[3, 4]), Some(&[0, 1][..]));
    }

    #[test]
    fn build_incompatible_when_fewer_hashes_than_bands() {
        let s = sigs(&[&[1, 2, 3]]);
        assert_eq!(
            BandIndex::build(&s, 4).unwrap_err(),
            IndexError::IncompatibleBanding {
                signature_len: 3,
                num_bands: 4
            }
        );
    }

    #[test]
    fn build_empty_collection_is_empty_index() {
        let index = BandIndex::build(&[], 3).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.bucket_count(), 0);
        assert_eq!(index.rows_per_band(), 0);
        assert_eq!(index.stats().truncated_values, 0);
    }

    #[test]
    fn build_rejects_ragged_signatures() {
        let s = sigs(&[&[1, 2, 3, 4], &[1, 2]]);
        assert_eq!(
            BandIndex::build(&s, 2).unwrap_err(),
            IndexError::SignatureLengthMismatch {
                doc_id: 1,
                expected: 4,
                found: 2
            }
        );
    }

    #[test]
    fn bucket_members_keep_insertion_order() {
        let s = sigs(&[&[1, 1], &[2, 2], &[1, 1], &[1, 1]]);
        let index = BandIndex::build(&s, 1).unwrap();
        assert_eq!(index.bucket(0, &[1, 1]), Some(&[0, 2, 3][..]));
        assert_eq!(index.bucket(0, &[2, 2]), Some(&[1][..]));
        assert_eq!(index.bucket(0, &[3, 3]), None);
    }

    #[test]
    fn band_number_is_part_of_the_key() {
        // Same row values, different bands: no shared bucket.
        let s = sigs(&[&[5, 5, 6, 6], &[6, 6, 5, 5]]);
        let index = BandIndex::build(&s, 2).unwrap();
        assert_eq!(index.bucket_count(), 4);
        assert_eq!(index.stats().colliding_buckets, 0);
    }

    #[test]
    fn stats_summarize_buckets() {
        let s = sigs(&[&[1, 2, 3, 4], &[1, 2, 9, 9], &[1, 2, 3, 4]]);
        let index = BandIndex::build(&s, 2).unwrap();
        let stats = index.stats();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.num_bands, 2);
        assert_eq!(stats.rows_per_band, 2);
        assert_eq!(stats.buckets, 3);
        assert_eq!(stats.colliding_buckets, 2);
        assert_eq!(stats.largest_bucket, 3);
        assert_eq!(index.buckets_per_band(), vec![1, 2]);
    }

    #[test]
    fn config_defaults_and_validation() {
        let cfg = IndexConfig::default();
        assert_eq!(cfg.num_bands, 20);
        assert!(cfg.validate().is_ok());
        assert!(!cfg.truncate_remainder);
        assert_eq!(cfg.rows_per_band(100), Some(5));
        assert_eq!(cfg.rows_per_band(101), None);
        assert_eq!(cfg.with_truncate_remainder(true).rows_per_band(101), Some(5));
        assert_eq!(
            IndexConfig::new().with_num_bands(0).validate(),
            Err(IndexError::InvalidNumBands { num_bands: 0 })
        );
    }

    #[test]
    fn config_deserializes_without_truncation_flag() {
        let cfg: IndexConfig = serde_json::from_str(r#"{"num_bands":10}"#).unwrap();
        assert_eq!(cfg, IndexConfig::new().with_num_bands(10));
    }

    #[test]
    fn error_display_mentions_parameters() {
        let err = IndexError::IncompatibleBanding {
            signature_len: 5,
            num_bands: 10,
        };
        let text = err.to_string();
        assert!(text.contains("incompatible banding"));
        assert!(text.contains("5"));
        assert!(text.contains("10"));
    }
}
