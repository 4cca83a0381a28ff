//! Chunk id to source path resolvers.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::ChunkPathResolver;

/// Resolves by substituting `[id]` in a filename template, e.g. `js/[id].chunk.js`.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    template: String,
}

impl TemplateResolver {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl ChunkPathResolver for TemplateResolver {
    fn resolve(&self, chunk_id: &str) -> Option<String> {
        Some(self.template.replace("[id]", chunk_id))
    }
}

/// Resolves from an explicit chunk id -> path table (a bundler's chunk manifest).
#[derive(Debug, Clone, Default)]
pub struct ManifestResolver {
    paths: HashMap<String, String>,
}

impl ManifestResolver {
    /// Parse a JSON object mapping chunk ids to paths.
    pub fn from_json(data: &str) -> Result<Self> {
        let paths: HashMap<String, String> =
            serde_json::from_str(data).context("chunk manifest must be a JSON object of strings")?;
        Ok(Self { paths })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("read chunk manifest {}", path.display()))?;
        Self::from_json(&data)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl ChunkPathResolver for ManifestResolver {
    fn resolve(&self, chunk_id: &str) -> Option<String> {
        self.paths.get(chunk_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_every_id_marker() {
        let r = TemplateResolver::new("js/[id]/[id].chunk.js");
        assert_eq!(r.resolve("42").as_deref(), Some("js/42/42.chunk.js"));
    }

    #[test]
    fn manifest_parses_json_and_misses_unknown_ids() {
        let r = ManifestResolver::from_json(r#"{"main": "js/main.3f2a.js", "7": "js/7.aa01.js"}"#)
            .unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r.resolve("7").as_deref(), Some("js/7.aa01.js"));
        assert!(r.resolve("8").is_none());
    }

    #[test]
    fn manifest_rejects_non_object() {
        assert!(ManifestResolver::from_json("[1, 2]").is_err());
    }

    #[test]
    fn manifest_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.json");
        fs::write(&path, r#"{"vendors": "vendors.js"}"#).unwrap();
        let r = ManifestResolver::from_path(&path).unwrap();
        assert_eq!(r.resolve("vendors").as_deref(), Some("vendors.js"));
    }
}
