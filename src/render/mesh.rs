// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Triangle meshes loaded from STL and normalized to a unit bounding sphere

use crate::error::AssetError;
use nalgebra::Vector3;
use std::fs::File;
use std::path::Path;
use stl_io::read_stl;

/// Indexed triangle mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vector3<f32>>,
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    /// Load an STL file (binary or ASCII) and normalize it
    pub fn from_stl(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }

        let mesh_error = |source| AssetError::Mesh {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(mesh_error)?;
        let stl = read_stl(&mut file).map_err(mesh_error)?;

        if stl.vertices.is_empty() || stl.faces.is_empty() {
            return Err(AssetError::EmptyMesh(path.to_path_buf()));
        }

        let positions = stl
            .vertices
            .iter()
            .map(|v| Vector3::new(v[0], v[1], v[2]))
            .collect();
        let triangles = stl.faces.iter().map(|f| f.vertices).collect();

        let mut mesh = Self {
            positions,
            triangles,
        };
        mesh.normalize();
        Ok(mesh)
    }

    /// Build from an unindexed triangle soup
    pub fn from_triangles(triangles: &[[Vector3<f32>; 3]]) -> Self {
        let mut mesh = Self::default();
        for tri in triangles {
            let base = mesh.positions.len();
            mesh.positions.extend_from_slice(tri);
            mesh.triangles.push([base, base + 1, base + 2]);
        }
        mesh
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        let first = *self.positions.first()?;
        Some(self.positions.iter().fold((first, first), |(lo, hi), p| {
            (lo.inf(p), hi.sup(p))
        }))
    }

    /// Largest distance from the origin to any vertex
    pub fn bounding_radius(&self) -> f32 {
        self.positions
            .iter()
            .map(|p| p.norm())
            .fold(0.0, f32::max)
    }

    /// Center the bounding box on the origin and scale to a unit bounding radius
    pub fn normalize(&mut self) {
        let Some((lo, hi)) = self.bounds() else {
            return;
        };
        let center = (lo + hi) * 0.5;
        for p in &mut self.positions {
            *p -= center;
        }

        let radius = self.bounding_radius();
        if radius > f32::EPSILON {
            for p in &mut self.positions {
                *p /= radius;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn offset_triangle() -> Mesh {
        Mesh::from_triangles(&[[
            Vector3::new(10.0, 10.0, 10.0),
            Vector3::new(14.0, 10.0, 10.0),
            Vector3::new(10.0, 14.0, 10.0),
        ]])
    }

    #[test]
    fn test_normalize_unit_radius() {
        let mut mesh = offset_triangle();
        mesh.normalize();
        assert_relative_eq!(mesh.bounding_radius(), 1.0, epsilon = 1e-6);

        let (lo, hi) = mesh.bounds().unwrap();
        let center = (lo + hi) * 0.5;
        assert_relative_eq!(center.norm(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_file() {
        let err = Mesh::from_stl(Path::new("does/not/exist.stl")).unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn test_counts() {
        let mesh = offset_triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }
}
