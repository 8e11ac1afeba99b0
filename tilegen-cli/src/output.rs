//! Writes assembled vectors to disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use av1::ivf::{Timebase, wrap_single_frame};
use bytes::Bytes;
use tracing::{debug, info};

use crate::assemble::{TestVector, VectorSummary};
use crate::error::Result;

pub const VECTOR_EXTENSION: &str = "av1";
pub const IVF_EXTENSION: &str = "ivf";
pub const MANIFEST_FILE: &str = "manifest.json";

/// A directory of generated vectors.
#[derive(Debug, Clone)]
pub struct VectorStore {
    out_dir: PathBuf,
}

impl VectorStore {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn vector_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{name}.{VECTOR_EXTENSION}"))
    }

    pub fn ivf_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(format!("{name}.{IVF_EXTENSION}"))
    }

    /// Writes `<name>.av1`, plus `<name>.ivf` when `ivf` is set, and returns
    /// the paths written.
    pub fn write_vector(&self, vector: &TestVector, ivf: bool) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.out_dir)?;

        let path = self.vector_path(&vector.name);
        fs::write(&path, &vector.stream)?;
        info!(path = %path.display(), bytes = vector.stream.len(), "wrote vector");
        let mut written = vec![path];

        if ivf {
            let wrapped = wrap_single_frame(&vector.stream, vector.width, vector.height, Timebase::default())?;
            let path = self.ivf_path(&vector.name);
            fs::write(&path, &wrapped)?;
            debug!(path = %path.display(), bytes = wrapped.len(), "wrote IVF wrapper");
            written.push(path);
        }

        Ok(written)
    }

    /// Writes `manifest.json`, mapping each vector name to its summary.
    pub fn write_manifest(&self, vectors: &[TestVector]) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;

        let manifest: BTreeMap<&str, &VectorSummary> = vectors
            .iter()
            .map(|vector| (vector.name.as_str(), &vector.summary))
            .collect();

        let path = self.out_dir.join(MANIFEST_FILE);
        fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;
        info!(path = %path.display(), vectors = vectors.len(), "wrote manifest");
        Ok(path)
    }

    /// Reads back `<name>.av1`.
    pub fn read_vector(&self, name: &str) -> Result<Bytes> {
        Ok(Bytes::from(fs::read(self.vector_path(name))?))
    }
}

#[cfg(test)]
#[cfg_attr(all(coverage_nightly, test), coverage(off))]
mod tests {
    use super::*;
    use crate::assemble::VectorAssembler;
    use crate::recipe;

    fn first_two_vectors() -> Vec<TestVector> {
        let recipes = recipe::builtin().unwrap();
        VectorAssembler::new().assemble_all(&recipes[..2]).unwrap()
    }

    #[test]
    fn test_write_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path().join("nested/av1"));
        let vectors = first_two_vectors();

        for vector in &vectors {
            let written = store.write_vector(vector, false).unwrap();
            assert_eq!(written, [store.vector_path(&vector.name)]);
            assert_eq!(store.read_vector(&vector.name).unwrap(), vector.stream);
        }
        assert!(!store.ivf_path(&vectors[0].name).exists());
    }

    #[test]
    fn test_write_ivf() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        let vector = &first_two_vectors()[0];

        let written = store.write_vector(vector, true).unwrap();
        assert_eq!(written.len(), 2);

        let ivf = fs::read(store.ivf_path(&vector.name)).unwrap();
        assert_eq!(&ivf[..4], b"DKIF");
        assert_eq!(&ivf[12..16], &[64, 0, 64, 0]);
        assert_eq!(&ivf[44..], vector.stream.as_ref());
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::new(dir.path());
        let path = store.write_manifest(&first_two_vectors()).unwrap();

        let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(
            manifest["m3b_tilegroup_1tile"],
            serde_json::json!({
                "tile_cols": 1,
                "tile_rows": 1,
                "tile_size_bytes": 0,
                "tg_start": 0,
                "tg_end": 0,
                "tiles": [[0, 4]],
            })
        );
        assert_eq!(manifest["m3b_tilegroup_1tile_trailingonly"]["tiles"], serde_json::json!([[0, 1]]));
    }

    #[test]
    fn test_read_missing_vector() {
        let dir = tempfile::tempdir().unwrap();
        let err = VectorStore::new(dir.path()).read_vector("missing").unwrap_err();
        assert!(matches!(err, crate::error::AppError::Io(_)));
    }
}
