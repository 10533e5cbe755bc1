// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh cache keyed by path. Owned by the caller and passed into sessions.

use super::mesh::Mesh;
use crate::error::AssetError;
use ahash::AHashMap;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct AssetCache {
    meshes: AHashMap<PathBuf, Arc<Mesh>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached mesh for `path`, loading it on first use
    pub fn load(&mut self, path: &Path) -> Result<Arc<Mesh>, AssetError> {
        if let Some(mesh) = self.meshes.get(path) {
            return Ok(Arc::clone(mesh));
        }

        info!("Loading mesh: {}", path.display());
        let mesh = Arc::new(Mesh::from_stl(path)?);
        self.meshes.insert(path.to_path_buf(), Arc::clone(&mesh));
        Ok(mesh)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.meshes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_asset_not_cached() {
        let mut cache = AssetCache::new();
        assert!(cache.load(Path::new("missing.stl")).is_err());
        assert!(cache.is_empty());
    }
}
