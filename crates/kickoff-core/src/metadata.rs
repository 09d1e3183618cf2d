//! Positional metadata store
//!
//! Holds the text of every indexed document. Record `i` describes the same
//! document as vector `i` in the index; the store itself cannot check that,
//! so the retriever validates sizes when the two are paired.

use std::path::Path;

use crate::{KickoffError, Result};

/// Ordered, immutable sequence of document records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    records: Vec<String>,
}

impl MetadataStore {
    /// Create a store from records already in index order
    pub fn from_records(records: Vec<String>) -> Self {
        Self { records }
    }

    /// Load a JSON array of strings, preserving order
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| KickoffError::io(path, e))?;
        let store = Self::from_json(&content)?;

        tracing::info!(
            path = %path.display(),
            records = store.len(),
            "Loaded match metadata"
        );
        Ok(store)
    }

    /// Parse a JSON array of strings
    pub fn from_json(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| KickoffError::CorruptMetadata(format!("invalid JSON: {e}")))?;

        let items = value.as_array().ok_or_else(|| {
            KickoffError::CorruptMetadata("expected a JSON array of strings".to_string())
        })?;

        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    KickoffError::CorruptMetadata(format!("record {i} is not a string"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }

    /// Write the records as a JSON array, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| KickoffError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.records)
            .map_err(|e| KickoffError::Other(e.into()))?;
        std::fs::write(path, json).map_err(|e| KickoffError::io(path, e))?;

        tracing::info!(path = %path.display(), records = self.len(), "Saved match metadata");
        Ok(())
    }

    /// Record at `position`
    pub fn get(&self, position: usize) -> Result<&str> {
        self.records
            .get(position)
            .map(String::as_str)
            .ok_or(KickoffError::OutOfRange {
                position,
                len: self.records.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(String::as_str)
    }
}
