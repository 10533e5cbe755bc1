// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Headless rasterizer backing the evaluation pipeline.
//!
//! Triangles are projected with the camera's view and projection matrices and
//! filled with edge functions against a depth buffer. The color phase gets
//! lambert shading plus the environment ambient. The silhouette phase shows
//! the extracted edge masks and the normal phase a normal visualization.

use super::environment::Environment;
use super::mesh::Mesh;
use crate::buffer::{ColorBuffer, DepthBuffer, Heatmap, NormalBuffer};
use crate::metrics::{extract_silhouette, SilhouetteThresholds};
use crate::pipeline::{Phase, RenderBackend, Variant};
use crate::sampling::CameraSample;
use crate::utils::triangle_normal;
use anyhow::{bail, Result};
use nalgebra::{Vector2, Vector3, Vector4};
use std::sync::Arc;

const ALBEDO: f32 = 0.8;
const DIFFUSE: f32 = 0.85;
const MIN_CLIP_W: f32 = 1e-4;
/// Frame panels: reference, candidate, heatmap
const PANELS: u32 = 3;

/// Offscreen buffers for one draw
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub color: ColorBuffer,
    pub normal: NormalBuffer,
    pub depth: DepthBuffer,
}

impl RenderTarget {
    fn cleared(width: u32, height: u32) -> Self {
        Self {
            color: ColorBuffer::new(width, height, 3),
            normal: NormalBuffer::new(width, height, 3),
            depth: DepthBuffer::filled(width, height, 1, 1.0),
        }
    }
}

pub struct SoftwareRenderer {
    width: u32,
    height: u32,
    reference: Arc<Mesh>,
    candidate: Arc<Mesh>,
    environment: Environment,
    thresholds: SilhouetteThresholds,
    panels: [Option<ColorBuffer>; 2],
    heatmap: Option<ColorBuffer>,
}

impl SoftwareRenderer {
    pub fn new(
        width: u32,
        height: u32,
        reference: Arc<Mesh>,
        candidate: Arc<Mesh>,
        environment: Environment,
    ) -> Self {
        Self {
            width,
            height,
            reference,
            candidate,
            environment,
            thresholds: SilhouetteThresholds::default(),
            panels: [None, None],
            heatmap: None,
        }
    }

    /// Thresholds for the masks shown during the silhouette phase
    pub fn with_thresholds(mut self, thresholds: SilhouetteThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    fn mesh(&self, variant: Variant) -> &Mesh {
        match variant {
            Variant::Reference => &self.reference,
            Variant::Candidate => &self.candidate,
        }
    }

    /// Draw `mesh` from `view` into a fresh target
    pub fn rasterize(&self, mesh: &Mesh, view: &CameraSample, phase: Phase) -> RenderTarget {
        let mut target = RenderTarget::cleared(self.width, self.height);
        let mvp = view.projection * view.view;
        let eye = view.position;
        let light_dir = (eye.normalize() + Vector3::y() * 0.5).normalize();

        for indices in &mesh.triangles {
            let world = indices.map(|i| mesh.positions[i]);
            let Some(mut normal) = triangle_normal(&world[0], &world[1], &world[2]) else {
                continue;
            };
            if normal.dot(&(eye - world[0])) < 0.0 {
                normal = -normal;
            }

            let Some(screen) = self.project(&mvp, &world) else {
                continue;
            };

            let color = match phase {
                Phase::ColorFidelity => self.shade(&normal, &light_dir),
                _ => encode_normal_color(&normal),
            };
            let encoded = normal.map(|c| c * 0.5 + 0.5);

            fill_triangle(&mut target, screen, &encoded, color);
        }

        target
    }

    /// Screen-space positions with NDC depth mapped to [0, 1]
    fn project(
        &self,
        mvp: &nalgebra::Matrix4<f32>,
        world: &[Vector3<f32>; 3],
    ) -> Option<[(Vector2<f32>, f32); 3]> {
        let mut out = [(Vector2::zeros(), 0.0); 3];
        for (slot, p) in out.iter_mut().zip(world.iter()) {
            let clip = mvp * Vector4::new(p.x, p.y, p.z, 1.0);
            if clip.w <= MIN_CLIP_W {
                return None;
            }
            let ndc = clip.xyz() / clip.w;
            *slot = (
                Vector2::new(
                    (ndc.x * 0.5 + 0.5) * self.width as f32,
                    (ndc.y * 0.5 + 0.5) * self.height as f32,
                ),
                ndc.z * 0.5 + 0.5,
            );
        }
        Some(out)
    }

    fn shade(&self, normal: &Vector3<f32>, light_dir: &Vector3<f32>) -> [u8; 3] {
        let diffuse = normal.dot(light_dir).max(0.0) * DIFFUSE;
        let ambient = self.environment.ambient;
        [0, 1, 2].map(|c| to_visible_byte(ALBEDO * (ambient[c] + diffuse)))
    }
}

impl RenderBackend for SoftwareRenderer {
    type Target = RenderTarget;

    fn render_variant(
        &mut self,
        view: &CameraSample,
        variant: Variant,
        phase: Phase,
    ) -> Result<RenderTarget> {
        if phase.is_finished() {
            bail!("nothing to render once evaluation has finished");
        }
        let target = self.rasterize(self.mesh(variant), view, phase);
        let slot = match variant {
            Variant::Reference => 0,
            Variant::Candidate => 1,
        };
        let panel = match phase {
            Phase::Silhouette => {
                extract_silhouette(&target.depth, &target.normal, self.thresholds)?.gray_to_rgb()
            }
            _ => target.color.clone(),
        };
        self.panels[slot] = Some(panel);
        Ok(target)
    }

    fn read_color(&mut self, target: &RenderTarget) -> Result<ColorBuffer> {
        Ok(target.color.clone())
    }

    fn read_normal(&mut self, target: &RenderTarget) -> Result<NormalBuffer> {
        Ok(target.normal.clone())
    }

    fn read_depth(&mut self, target: &RenderTarget) -> Result<DepthBuffer> {
        Ok(target.depth.clone())
    }

    fn present_heatmap(&mut self, heatmap: &Heatmap) {
        let rgb = match heatmap.channels() {
            4 => heatmap.rgba_to_rgb(),
            _ => heatmap.clone(),
        };
        self.heatmap = Some(rgb);
    }

    fn capture_frame(&mut self) -> Result<ColorBuffer> {
        let (w, h) = (self.width, self.height);
        let mut frame = ColorBuffer::new(w * PANELS, h, 3);
        let panels = [&self.panels[0], &self.panels[1], &self.heatmap];

        for (slot, panel) in panels.iter().enumerate() {
            let Some(panel) = panel else { continue };
            if panel.dimensions() != (w, h) || panel.channels() != 3 {
                continue;
            }
            let x_offset = slot as u32 * w;
            for y in 0..h {
                for x in 0..w {
                    frame.set(x_offset + x, y, panel.at(x, y));
                }
            }
        }

        Ok(frame)
    }
}

fn fill_triangle(
    target: &mut RenderTarget,
    points: [(Vector2<f32>, f32); 3],
    normal: &Vector3<f32>,
    color: [u8; 3],
) {
    let width = target.depth.width() as i32;
    let height = target.depth.height() as i32;
    let [(p0, z0), (p1, z1), (p2, z2)] = points;

    let min_x = p0.x.min(p1.x).min(p2.x).floor().max(0.0) as i32;
    let max_x = p0.x.max(p1.x).max(p2.x).ceil().min((width - 1) as f32) as i32;
    let min_y = p0.y.min(p1.y).min(p2.y).floor().max(0.0) as i32;
    let max_y = p0.y.max(p1.y).max(p2.y).ceil().min((height - 1) as f32) as i32;

    if min_x > max_x || min_y > max_y {
        return;
    }

    let area = edge(p0, p1, p2);
    if area.abs() < 1e-8 {
        return;
    }
    let inv_area = 1.0 / area;
    let normal = [normal.x, normal.y, normal.z];

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(p1, p2, p);
            let w1 = edge(p2, p0, p);
            let w2 = edge(p0, p1, p);

            let inside =
                (w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0) || (w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0);
            if !inside {
                continue;
            }

            let depth = (w0 * z0 + w1 * z1 + w2 * z2) * inv_area;
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }

            let (x, y) = (x as u32, y as u32);
            if depth < target.depth.at(x, y)[0] {
                target.depth.set(x, y, &[depth]);
                target.normal.set(x, y, &normal);
                target.color.set(x, y, &color);
            }
        }
    }
}

fn edge(a: Vector2<f32>, b: Vector2<f32>, p: Vector2<f32>) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

fn encode_normal_color(normal: &Vector3<f32>) -> [u8; 3] {
    [0, 1, 2].map(|c| to_visible_byte(normal[c] * 0.5 + 0.5))
}

/// Covered pixels never come out pure black
fn to_visible_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round().max(1.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::ViewSampler;

    fn quad() -> Arc<Mesh> {
        let a = Vector3::new(-0.5, -0.5, 0.0);
        let b = Vector3::new(0.5, -0.5, 0.0);
        let c = Vector3::new(0.5, 0.5, 0.0);
        let d = Vector3::new(-0.5, 0.5, 0.0);
        Arc::new(Mesh::from_triangles(&[[a, b, c], [a, c, d]]))
    }

    fn front_view() -> CameraSample {
        let sampler = ViewSampler::new(1, 3.0, 1.0);
        let position = Vector3::new(0.0, 0.0, 3.0);
        CameraSample {
            index: 0,
            position,
            view: crate::sampling::look_at_origin(&position),
            projection: sampler.projection(),
        }
    }

    fn renderer() -> SoftwareRenderer {
        SoftwareRenderer::new(32, 32, quad(), quad(), Environment::default())
    }

    #[test]
    fn test_center_covered_corner_cleared() {
        let mut r = renderer();
        let target = r
            .render_variant(&front_view(), Variant::Reference, Phase::ColorFidelity)
            .unwrap();

        assert!(target.color.at(16, 16).iter().any(|&c| c > 0));
        assert!(target.depth.at(16, 16)[0] < 1.0);
        assert_eq!(target.color.at(0, 0), &[0, 0, 0]);
        assert_eq!(target.depth.at(0, 0), &[1.0]);
        assert_eq!(target.normal.at(0, 0), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_normals_face_camera() {
        let mut r = renderer();
        let target = r
            .render_variant(&front_view(), Variant::Candidate, Phase::NormalFidelity)
            .unwrap();
        let n = target.normal.at(16, 16);
        assert!((n[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_capture_frame_composes_panels() {
        let mut r = renderer();
        let view = front_view();
        r.render_variant(&view, Variant::Reference, Phase::ColorFidelity)
            .unwrap();
        r.render_variant(&view, Variant::Candidate, Phase::ColorFidelity)
            .unwrap();
        r.present_heatmap(&Heatmap::filled(32, 32, 4, 255));

        let frame = r.capture_frame().unwrap();
        assert_eq!(frame.dimensions(), (96, 32));
        assert_eq!(frame.at(16, 16), frame.at(48, 16));
        assert_eq!(frame.at(80, 0), &[255, 255, 255]);
    }

    #[test]
    fn test_silhouette_panels_show_masks() {
        let mut r = renderer().with_thresholds(SilhouetteThresholds::default());
        let view = front_view();
        let target = r
            .render_variant(&view, Variant::Reference, Phase::Silhouette)
            .unwrap();
        r.render_variant(&view, Variant::Candidate, Phase::Silhouette)
            .unwrap();

        let mask =
            extract_silhouette(&target.depth, &target.normal, SilhouetteThresholds::default())
                .unwrap();
        assert!(mask.as_slice().contains(&255));

        let frame = r.capture_frame().unwrap();
        for y in 0..32 {
            for x in 0..32 {
                let v = mask.at(x, y)[0];
                assert_eq!(frame.at(x, y), &[v, v, v]);
                assert_eq!(frame.at(32 + x, y), &[v, v, v]);
            }
        }
        // Interior of the quad is flat, so it is not an edge
        assert_eq!(frame.at(16, 16), &[0, 0, 0]);
    }

    #[test]
    fn test_finished_phase_rejected() {
        let mut r = renderer();
        assert!(r
            .render_variant(&front_view(), Variant::Reference, Phase::Finished)
            .is_err());
    }
}
