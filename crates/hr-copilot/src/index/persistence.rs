//! On-disk format for the vector index
//!
//! A store directory holds `manifest.json` (format version, metric,
//! dimensions, embedding model, entry count) and `entries.json` (every
//! embedded chunk in insertion order). Both files are written under
//! temporary names and renamed into place, the manifest last, so a
//! partially written directory fails to load instead of mixing two saves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::vector_index::{DistanceMetric, VectorIndex};
use crate::error::{Error, Result};
use crate::types::EmbeddedChunk;

pub const FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";
pub const ENTRIES_FILE: &str = "entries.json";

/// Header describing a persisted index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub metric: DistanceMetric,
    pub dimensions: usize,
    pub embedding_model: String,
    pub count: usize,
    pub created_at: DateTime<Utc>,
}

/// What the loader requires of a persisted index
#[derive(Debug, Clone)]
pub struct LoadExpectations<'a> {
    pub dimensions: usize,
    pub embedding_model: &'a str,
}

impl VectorIndex {
    /// Write the index into `dir`, creating it if needed
    pub fn save(&self, dir: &Path, embedding_model: &str) -> Result<IndexManifest> {
        std::fs::create_dir_all(dir)?;

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            metric: self.metric(),
            dimensions: self.dimensions(),
            embedding_model: embedding_model.to_string(),
            count: self.len(),
            created_at: Utc::now(),
        };

        let entries_tmp = temp_path(dir, ENTRIES_FILE);
        let mut writer = BufWriter::new(File::create(&entries_tmp)?);
        serde_json::to_writer(&mut writer, self.entries())?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        let manifest_tmp = temp_path(dir, MANIFEST_FILE);
        let mut writer = BufWriter::new(File::create(&manifest_tmp)?);
        serde_json::to_writer_pretty(&mut writer, &manifest)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        // Without a manifest the directory is unloadable until the new one lands
        let manifest_path = dir.join(MANIFEST_FILE);
        if manifest_path.exists() {
            std::fs::remove_file(&manifest_path)?;
        }
        std::fs::rename(&entries_tmp, dir.join(ENTRIES_FILE))?;
        std::fs::rename(&manifest_tmp, &manifest_path)?;

        tracing::info!(
            "Saved index with {} entries to {}",
            manifest.count,
            dir.display()
        );
        Ok(manifest)
    }

    /// Load an index from `dir`, failing closed on any incompatibility
    pub fn load(dir: &Path, expected: &LoadExpectations<'_>) -> Result<Self> {
        let manifest = read_manifest(dir)?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(Error::IncompatibleIndex(format!(
                "format version {} is not supported (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }
        if manifest.dimensions != expected.dimensions {
            return Err(Error::DimensionMismatch {
                expected: expected.dimensions,
                found: manifest.dimensions,
            });
        }
        if manifest.embedding_model != expected.embedding_model {
            return Err(Error::IncompatibleIndex(format!(
                "index was built with '{}' but the current model is '{}'",
                manifest.embedding_model, expected.embedding_model
            )));
        }

        let reader = BufReader::new(File::open(dir.join(ENTRIES_FILE))?);
        let entries: Vec<EmbeddedChunk> = serde_json::from_reader(reader)?;

        if entries.len() != manifest.count {
            return Err(Error::IncompatibleIndex(format!(
                "manifest lists {} entries but {} were found",
                manifest.count,
                entries.len()
            )));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != manifest.dimensions) {
            return Err(Error::IncompatibleIndex(format!(
                "entry {} has {} dimensions, manifest says {}",
                bad.chunk.id,
                bad.vector.len(),
                manifest.dimensions
            )));
        }

        let index = VectorIndex::from_embedded(entries, manifest.metric)?;
        tracing::info!(
            "Loaded index with {} entries from {}",
            index.len(),
            dir.display()
        );
        Ok(index)
    }
}

fn temp_path(dir: &Path, file: &str) -> std::path::PathBuf {
    dir.join(format!("{}.tmp", file))
}

/// Read only the manifest of a persisted index
pub fn read_manifest(dir: &Path) -> Result<IndexManifest> {
    let reader = BufReader::new(File::open(dir.join(MANIFEST_FILE))?);
    let manifest = serde_json::from_reader(reader)
        .map_err(|e| Error::IncompatibleIndex(format!("unreadable manifest: {}", e)))?;
    Ok(manifest)
}

/// True if `dir` looks like a saved index
pub fn exists(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file() && dir.join(ENTRIES_FILE).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use tempfile::TempDir;

    fn sample_index() -> VectorIndex {
        let entries = vec![
            EmbeddedChunk::new(Chunk::new("a.txt", "alpha".into(), 0, 0, 5), vec![1.0, 0.0, 0.0]),
            EmbeddedChunk::new(Chunk::new("b.txt", "beta".into(), 0, 0, 4), vec![0.6, 0.8, 0.0]),
            EmbeddedChunk::new(Chunk::new("c.txt", "gamma".into(), 0, 0, 5), vec![0.0, 0.0, 1.0]),
        ];
        VectorIndex::from_embedded(entries, DistanceMetric::Cosine).unwrap()
    }

    fn expect(dimensions: usize, model: &str) -> LoadExpectations<'_> {
        LoadExpectations {
            dimensions,
            embedding_model: model,
        }
    }

    #[test]
    fn test_save_load_same_search_results() {
        let dir = TempDir::new().unwrap();
        let index = sample_index();
        index.save(dir.path(), "test-model").unwrap();

        let loaded = VectorIndex::load(dir.path(), &expect(3, "test-model")).unwrap();
        let query = [0.9, 0.3, 0.1];

        let before: Vec<(String, f32)> = index
            .search(&query, 3)
            .unwrap()
            .iter()
            .map(|n| (n.entry.chunk.id.clone(), n.distance))
            .collect();
        let after: Vec<(String, f32)> = loaded
            .search(&query, 3)
            .unwrap()
            .iter()
            .map(|n| (n.entry.chunk.id.clone(), n.distance))
            .collect();

        assert_eq!(before, after);
        assert_eq!(loaded.metric(), DistanceMetric::Cosine);
    }

    #[test]
    fn test_dimension_mismatch_on_load() {
        let dir = TempDir::new().unwrap();
        sample_index().save(dir.path(), "test-model").unwrap();

        let result = VectorIndex::load(dir.path(), &expect(768, "test-model"));
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 768, found: 3 })
        ));
    }

    #[test]
    fn test_model_mismatch_fails_closed() {
        let dir = TempDir::new().unwrap();
        sample_index().save(dir.path(), "test-model").unwrap();

        let result = VectorIndex::load(dir.path(), &expect(3, "other-model"));
        assert!(matches!(result, Err(Error::IncompatibleIndex(_))));
    }

    #[test]
    fn test_future_version_fails_closed() {
        let dir = TempDir::new().unwrap();
        let mut manifest = sample_index().save(dir.path(), "test-model").unwrap();
        manifest.format_version = FORMAT_VERSION + 1;
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = VectorIndex::load(dir.path(), &expect(3, "test-model"));
        assert!(matches!(result, Err(Error::IncompatibleIndex(_))));
    }

    #[test]
    fn test_truncated_entries_detected() {
        let dir = TempDir::new().unwrap();
        let mut manifest = sample_index().save(dir.path(), "test-model").unwrap();
        manifest.count = 4;
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            serde_json::to_string(&manifest).unwrap(),
        )
        .unwrap();

        let result = VectorIndex::load(dir.path(), &expect(3, "test-model"));
        assert!(matches!(result, Err(Error::IncompatibleIndex(_))));
    }

    #[test]
    fn test_resave_replaces_previous_index() {
        let dir = TempDir::new().unwrap();
        sample_index().save(dir.path(), "test-model").unwrap();

        let mut grown = sample_index();
        grown
            .append(vec![EmbeddedChunk::new(
                Chunk::new("d.txt", "delta".into(), 0, 0, 5),
                vec![0.0, 1.0, 0.0],
            )])
            .unwrap();
        grown.save(dir.path(), "test-model").unwrap();

        let loaded = VectorIndex::load(dir.path(), &expect(3, "test-model")).unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.entries()[3].chunk.id, "d.txt#0");
        assert!(!temp_path(dir.path(), ENTRIES_FILE).exists());
        assert!(!temp_path(dir.path(), MANIFEST_FILE).exists());
    }

    #[test]
    fn test_entries_without_manifest_do_not_load() {
        let dir = TempDir::new().unwrap();
        sample_index().save(dir.path(), "test-model").unwrap();
        std::fs::remove_file(dir.path().join(MANIFEST_FILE)).unwrap();

        assert!(!exists(dir.path()));
        assert!(VectorIndex::load(dir.path(), &expect(3, "test-model")).is_err());
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(!exists(dir.path()));
        assert!(matches!(
            VectorIndex::load(dir.path(), &expect(3, "test-model")),
            Err(Error::Io(_))
        ));
    }
}
