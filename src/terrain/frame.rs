use bytemuck::{Pod, Zeroable};
use noise::NoiseFn;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::params::ParameterSet;
use crate::terrain::color_map::{ColorMapper, ContourBands};
use crate::terrain::grid::{GridVertex, TerrainGrid};
use crate::terrain::heightfield::HeightFieldSynthesizer;

/// GPU layout of one evaluated vertex. Matches `VertexInput` in
/// `assets/shaders/terrain.wgsl`.
///
/// `color` is the gradient only; contour bands are drawn per fragment
/// from the interpolated `elevation`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// `[x, displacement, z]`
    pub position: [f32; 3],
    /// Terraced elevation, also when the plane is flattened.
    pub elevation: f32,
    pub color: [f32; 4],
}

/// Everything the renderer needs to know about one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexSample {
    pub displacement: f32,
    /// Terraced elevation, fed to the color stage even when flattened.
    pub elevation: f32,
    pub color: [f32; 4],
}

pub fn evaluate_vertex<N: NoiseFn<f64, 3>>(
    synth: &HeightFieldSynthesizer<N>,
    params: &ParameterSet,
    x: f32,
    z: f32,
    t: f32,
) -> VertexSample {
    let elevation = synth.elevation(x, z, t, params);
    VertexSample {
        displacement: elevation.displacement,
        elevation: elevation.terraced,
        color: ColorMapper::shade(elevation.terraced, params),
    }
}

/// One evaluated pass over the grid.
#[derive(Debug, Clone, Default)]
pub struct TerrainFrame {
    pub time: f32,
    /// Parameter revision the frame was evaluated with.
    pub revision: u64,
    /// Banding the fragment stage applies on top of the vertex colors.
    pub contours: Option<ContourBands>,
    pub vertices: Vec<TerrainVertex>,
}

impl TerrainFrame {
    /// Raw bytes for a vertex buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

fn to_vertex<N: NoiseFn<f64, 3>>(
    synth: &HeightFieldSynthesizer<N>,
    params: &ParameterSet,
    v: &GridVertex,
    t: f32,
) -> TerrainVertex {
    let elevation = synth.elevation(v.local_x, v.local_z, t, params);
    TerrainVertex {
        position: [v.local_x, elevation.displacement, v.local_z],
        elevation: elevation.terraced,
        color: ColorMapper::gradient(elevation.terraced, params).with_alpha(1.0),
    }
}

/// Evaluate every grid vertex at time `t` against one parameter snapshot.
///
/// Runs on the rayon pool on native targets, sequentially on the web.
pub fn evaluate_frame<N: NoiseFn<f64, 3> + Sync>(
    synth: &HeightFieldSynthesizer<N>,
    grid: &TerrainGrid,
    params: &ParameterSet,
    t: f32,
    revision: u64,
) -> TerrainFrame {
    #[cfg(not(target_arch = "wasm32"))]
    let vertices = grid
        .vertices()
        .par_iter()
        .map(|v| to_vertex(synth, params, v, t))
        .collect();

    #[cfg(target_arch = "wasm32")]
    let vertices = grid
        .vertices()
        .iter()
        .map(|v| to_vertex(synth, params, v, t))
        .collect();

    TerrainFrame {
        time: t,
        revision,
        contours: ContourBands::from_params(params),
        vertices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::color_map::Rgb;
    use crate::terrain::heightfield::elevation;

    #[test]
    fn test_frame_matches_per_vertex_evaluation() {
        let synth = HeightFieldSynthesizer::classic();
        let params = ParameterSet::default();
        let grid = TerrainGrid::with_segments(6.0, 16);
        let frame = evaluate_frame(&synth, &grid, &params, 2.5, 4);

        assert_eq!(frame.vertices.len(), grid.vertices().len());
        assert_eq!(frame.revision, 4);
        for (out, v) in frame.vertices.iter().zip(grid.vertices()) {
            let e = elevation(v.local_x, v.local_z, 2.5, &params);
            assert_eq!(out.position, [v.local_x, e.displacement, v.local_z]);
            assert_eq!(out.elevation, e.terraced);
            assert_eq!(out.color, ColorMapper::shade(e.terraced, &params));
        }
        assert_eq!(frame.contours, None);
    }

    #[test]
    fn test_contours_are_left_to_the_fragment_stage() {
        let synth = HeightFieldSynthesizer::classic();
        let params = ParameterSet {
            line_color_mode: true,
            line_color: Rgb::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        let grid = TerrainGrid::with_segments(6.0, 16);
        let frame = evaluate_frame(&synth, &grid, &params, 1.0, 0);
        let bands = frame.contours.expect("line color mode is on");

        for out in &frame.vertices {
            let gradient = ColorMapper::gradient(out.elevation, &params);
            assert_eq!(out.color, gradient.with_alpha(1.0));
            assert_eq!(
                bands.apply(out.elevation, gradient).with_alpha(1.0),
                ColorMapper::shade(out.elevation, &params)
            );
        }
    }

    #[test]
    fn test_interpolated_gradient_matches_midpoint_shading() {
        let synth = HeightFieldSynthesizer::classic();
        let params = ParameterSet::default();
        let grid = TerrainGrid::with_segments(4.0, 8);
        let frame = evaluate_frame(&synth, &grid, &params, 0.0, 0);
        for pair in frame.vertices.windows(2) {
            let mid_elevation = (pair[0].elevation + pair[1].elevation) / 2.0;
            let expected = ColorMapper::gradient(mid_elevation, &params).to_array();
            for c in 0..3 {
                let interpolated = (pair[0].color[c] + pair[1].color[c]) / 2.0;
                assert!((interpolated - expected[c]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_parallel_evaluation_is_deterministic() {
        let synth = HeightFieldSynthesizer::classic();
        let params = ParameterSet::default();
        let grid = TerrainGrid::with_segments(10.0, 64);
        let a = evaluate_frame(&synth, &grid, &params, 1.0, 0);
        let b = evaluate_frame(&synth, &grid, &params, 1.0, 0);
        assert_eq!(a.vertices, b.vertices);
    }

    #[test]
    fn test_byte_view_covers_all_vertices() {
        let synth = HeightFieldSynthesizer::classic();
        let grid = TerrainGrid::with_segments(2.0, 4);
        let frame = evaluate_frame(&synth, &grid, &ParameterSet::default(), 0.0, 0);
        assert_eq!(frame.as_bytes().len(), 25 * std::mem::size_of::<TerrainVertex>());
        assert_eq!(std::mem::size_of::<TerrainVertex>(), 32);
    }

    #[test]
    fn test_flattened_frame_still_shades_by_elevation() {
        let synth = HeightFieldSynthesizer::classic();
        let params = ParameterSet {
            transform_to_2d: true,
            ..Default::default()
        };
        let grid = TerrainGrid::with_segments(10.0, 32);
        let frame = evaluate_frame(&synth, &grid, &params, 0.5, 0);
        assert!(frame.vertices.iter().all(|v| v.position[1] == 0.0));
        let first = frame.vertices[0].color;
        assert!(frame.vertices.iter().any(|v| v.color != first));
    }
}
