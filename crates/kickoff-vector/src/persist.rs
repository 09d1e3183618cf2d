//! On-disk index format
//!
//! Version 1 layout, all integers little-endian:
//!
//! ```text
//! magic      4 bytes  "KOIX"
//! version    u32
//! metric     u8       see DistanceMetric::code
//! reserved   3 bytes  zero
//! count      u64      N
//! dimension  u64      D
//! data       N * D f32, row-major
//! ```

use std::path::Path;

use kickoff_core::{DistanceMetric, KickoffError, Result};
use ndarray::Array2;

use crate::{FlatIndex, VectorIndex};

const MAGIC: &[u8; 4] = b"KOIX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 1 + 3 + 8 + 8;

impl FlatIndex {
    /// Serialize to the versioned binary layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let vectors = self.vectors();
        let mut bytes = Vec::with_capacity(HEADER_LEN + vectors.len() * 4);

        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.push(self.metric().code());
        bytes.extend_from_slice(&[0u8; 3]);
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&(self.dimension() as u64).to_le_bytes());
        for value in vectors.iter() {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Parse the versioned binary layout
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;

        let magic: [u8; 4] = take(&mut cursor, "magic")?;
        if &magic != MAGIC {
            return Err(corrupt("not a kickoff index file"));
        }

        let version = u32::from_le_bytes(take(&mut cursor, "version")?);
        if version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format version {version}")));
        }

        let [code] = take::<1>(&mut cursor, "metric")?;
        let metric = DistanceMetric::from_code(code)
            .ok_or_else(|| corrupt(format!("unknown metric code {code}")))?;

        let reserved: [u8; 3] = take(&mut cursor, "reserved")?;
        if reserved != [0; 3] {
            return Err(corrupt("reserved header bytes are not zero"));
        }

        let count = read_len(&mut cursor, "count")?;
        let dimension = read_len(&mut cursor, "dimension")?;
        if count == 0 || dimension == 0 {
            return Err(corrupt(format!(
                "empty index header (count {count}, dimension {dimension})"
            )));
        }

        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt("index size overflows"))?;
        if cursor.len() != expected {
            return Err(corrupt(format!(
                "expected {expected} bytes of vector data, found {}",
                cursor.len()
            )));
        }

        let data: Vec<f32> = cursor
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        if data.iter().any(|v| !v.is_finite()) {
            return Err(corrupt("vector data contains non-finite values"));
        }

        let vectors = Array2::from_shape_vec((count, dimension), data)
            .map_err(|e| corrupt(format!("bad shape: {e}")))?;
        Self::from_array(vectors, metric)
    }

    /// Write the index, replacing any existing file atomically
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| KickoffError::io(parent, e))?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        std::fs::write(tmp_path, self.to_bytes()).map_err(|e| KickoffError::io(tmp_path, e))?;
        std::fs::rename(tmp_path, path).map_err(|e| KickoffError::io(path, e))?;

        tracing::info!(
            path = %path.display(),
            vectors = self.len(),
            dimension = self.dimension(),
            metric = %self.metric(),
            "Saved vector index"
        );
        Ok(())
    }

    /// Read an index written by [`FlatIndex::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| KickoffError::io(path, e))?;
        let index = Self::from_bytes(&bytes)?;

        tracing::info!(
            path = %path.display(),
            vectors = index.len(),
            dimension = index.dimension(),
            metric = %index.metric(),
            "Loaded vector index"
        );
        Ok(index)
    }
}

fn corrupt(message: impl Into<String>) -> KickoffError {
    KickoffError::CorruptIndex(message.into())
}

fn take<const N: usize>(cursor: &mut &[u8], field: &str) -> Result<[u8; N]> {
    if cursor.len() < N {
        return Err(corrupt(format!("truncated header at {field}")));
    }
    let (head, rest) = cursor.split_at(N);
    *cursor = rest;

    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok(out)
}

fn read_len(cursor: &mut &[u8], field: &str) -> Result<usize> {
    let raw = u64::from_le_bytes(take(cursor, field)?);
    usize::try_from(raw).map_err(|_| corrupt(format!("{field} {raw} does not fit in memory")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatIndex {
        FlatIndex::build(
            &[vec![1.0, 0.0, -2.5], vec![0.0, 1.0, 0.25], vec![1.0, 1.0, 1e-7]],
            DistanceMetric::Cosine,
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_search() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings").join("football.index");

        let index = sample();
        index.save(&path).unwrap();
        let loaded = FlatIndex::load(&path).unwrap();

        assert_eq!(loaded, index);
        assert_eq!(loaded.metric(), DistanceMetric::Cosine);

        let query = [0.3, -0.2, 0.9];
        assert_eq!(
            loaded.search(&query, 3).unwrap(),
            index.search(&query, 3).unwrap()
        );
        assert!(!path.with_extension("index.tmp").exists());
    }

    #[test]
    fn test_header_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(&bytes[..4], b"KOIX");
        assert_eq!(bytes[8], DistanceMetric::Cosine.code());
        assert_eq!(bytes.len(), HEADER_LEN + 3 * 3 * 4);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            FlatIndex::from_bytes(&bytes),
            Err(KickoffError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version_and_metric() {
        let mut bytes = sample().to_bytes();
        bytes[4] = 9;
        assert!(matches!(
            FlatIndex::from_bytes(&bytes),
            Err(KickoffError::CorruptIndex(_))
        ));

        let mut bytes = sample().to_bytes();
        bytes[8] = 42;
        assert!(matches!(
            FlatIndex::from_bytes(&bytes),
            Err(KickoffError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_rejects_truncated_and_trailing_data() {
        let bytes = sample().to_bytes();

        for cut in [0, 3, HEADER_LEN - 1, bytes.len() - 1] {
            assert!(
                matches!(
                    FlatIndex::from_bytes(&bytes[..cut]),
                    Err(KickoffError::CorruptIndex(_))
                ),
                "cut at {cut} should be rejected"
            );
        }

        let mut longer = bytes.clone();
        longer.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(
            FlatIndex::from_bytes(&longer),
            Err(KickoffError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_data() {
        let mut bytes = sample().to_bytes();
        bytes[HEADER_LEN..HEADER_LEN + 4].copy_from_slice(&f32::INFINITY.to_le_bytes());
        assert!(matches!(
            FlatIndex::from_bytes(&bytes),
            Err(KickoffError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            FlatIndex::load("/no/such/football.index"),
            Err(KickoffError::Io { .. })
        ));
    }
}
