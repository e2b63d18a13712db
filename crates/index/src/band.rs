//! Band layout helpers: rows per band, band keys, and the LSH S-curve.

use hashbrown::Equivalent;

/// Rows per band for a signature of `signature_len` values split into
/// `num_bands` bands, or `None` when a band would be empty.
///
/// Trailing values beyond `num_bands * rows` are left out of banding.
pub fn rows_per_band_truncated(signature_len: usize, num_bands: usize) -> Option<usize> {
    if num_bands == 0 {
        return None;
    }
    match signature_len / num_bands {
        0 => None,
        rows => Some(rows),
    }
}

/// Rows per band when `signature_len` splits into `num_bands` equal bands
/// with no remainder, otherwise `None`.
pub fn rows_per_band(signature_len: usize, num_bands: usize) -> Option<usize> {
    rows_per_band_truncated(signature_len, num_bands)
        .filter(|rows| rows * num_bands == signature_len)
}

/// Owned bucket key: band number plus the exact row values of that band.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BandKey {
    band: usize,
    rows: Box<[u64]>,
}

impl BandKey {
    pub(crate) fn band(&self) -> usize {
        self.band
    }
}

/// Borrowed form of [`BandKey`] used for lookups without allocating.
///
/// Field order and types mirror `BandKey`, so the derived hashes agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct BandKeyRef<'a> {
    band: usize,
    rows: &'a [u64],
}

impl<'a> BandKeyRef<'a> {
    pub(crate) fn new(band: usize, rows: &'a [u64]) -> Self {
        Self { band, rows }
    }

    pub(crate) fn to_owned_key(self) -> BandKey {
        BandKey {
            band: self.band,
            rows: self.rows.into(),
        }
    }
}

impl Equivalent<BandKey> for BandKeyRef<'_> {
    fn equivalent(&self, key: &BandKey) -> bool {
        self.band == key.band && *self.rows == *key.rows
    }
}

/// Borrowed keys for each of the `num_bands` bands of `values`.
///
/// Yields nothing when `values` is too short for the layout.
pub(crate) fn band_keys(
    values: &[u64],
    num_bands: usize,
    rows: usize,
) -> impl Iterator<Item = BandKeyRef<'_>> + '_ {
    let usable = rows > 0 && values.len() >= num_bands * rows;
    let bands = if usable { num_bands } else { 0 };
    (0..bands).map(move |band| BandKeyRef {
        band,
        rows: &values[band * rows..(band + 1) * rows],
    })
}

/// Probability that two documents with Jaccard similarity `similarity`
/// share at least one bucket: `1 - (1 - s^rows)^bands`.
pub fn collision_probability(similarity: f64, num_bands: usize, rows: usize) -> f64 {
    let s = similarity.clamp(0.0, 1.0);
    let band_match = s.powi(rows as i32);
    1.0 - (1.0 - band_match).powi(num_bands as i32)
}

/// Similarity at which the S-curve rises most steeply, roughly where the
/// collision probability crosses one half: `(1 / bands)^(1 / rows)`.
pub fn similarity_threshold(num_bands: usize, rows: usize) -> Option<f64> {
    if num_bands == 0 || rows == 0 {
        return None;
    }
    Some((1.0 / num_bands as f64).powf(1.0 / rows as f64))
}
