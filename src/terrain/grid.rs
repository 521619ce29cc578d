/// Quads per side of the terrain plane, independent of the map size.
pub const GRID_SEGMENTS: u32 = 256;

/// One vertex of the flat plane, before displacement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridVertex {
    pub local_x: f32,
    pub local_z: f32,
    pub uv: [f32; 2],
}

/// Flat square plane lying in XZ, centered on the origin.
///
/// Vertices are row-major, rows running from far (-z) to near (+z).
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    size: f32,
    segments: u32,
    vertices: Vec<GridVertex>,
    indices: Vec<u32>,
}

impl TerrainGrid {
    pub fn new(size: f32) -> Self {
        Self::with_segments(size, GRID_SEGMENTS)
    }

    pub fn with_segments(size: f32, segments: u32) -> Self {
        let segments = segments.max(1);
        let row = segments + 1;
        let half = size / 2.0;
        let cell = size / segments as f32;

        let mut vertices = Vec::with_capacity((row * row) as usize);
        for iz in 0..row {
            let local_z = iz as f32 * cell - half;
            for ix in 0..row {
                let local_x = ix as f32 * cell - half;
                vertices.push(GridVertex {
                    local_x,
                    local_z,
                    uv: [
                        ix as f32 / segments as f32,
                        1.0 - iz as f32 / segments as f32,
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
        for iz in 0..segments {
            for ix in 0..segments {
                let a = ix + row * iz;
                let b = ix + row * (iz + 1);
                let c = (ix + 1) + row * (iz + 1);
                let d = (ix + 1) + row * iz;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            size,
            segments,
            vertices,
            indices,
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn vertices(&self) -> &[GridVertex] {
        &self.vertices
    }

    /// Triangle list, two triangles per quad.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_and_index_counts() {
        let grid = TerrainGrid::new(10.0);
        assert_eq!(grid.vertices().len(), 257 * 257);
        assert_eq!(grid.indices().len(), 256 * 256 * 6);
        assert!(grid.indices().iter().all(|&i| (i as usize) < grid.vertices().len()));
    }

    #[test]
    fn test_resolution_ignores_map_size() {
        assert_eq!(
            TerrainGrid::new(1.0).vertices().len(),
            TerrainGrid::new(20.0).vertices().len()
        );
    }

    #[test]
    fn test_extent_and_uv_corners() {
        let grid = TerrainGrid::with_segments(4.0, 4);
        let first = grid.vertices()[0];
        let last = *grid.vertices().last().unwrap();
        assert_eq!((first.local_x, first.local_z), (-2.0, -2.0));
        assert_eq!((last.local_x, last.local_z), (2.0, 2.0));
        assert_eq!(first.uv, [0.0, 1.0]);
        assert_eq!(last.uv, [1.0, 0.0]);
    }

    #[test]
    fn test_first_quad_winding() {
        let grid = TerrainGrid::with_segments(2.0, 2);
        assert_eq!(&grid.indices()[..6], &[0, 3, 1, 3, 4, 1]);
    }

    #[test]
    fn test_zero_segments_is_clamped() {
        let grid = TerrainGrid::with_segments(1.0, 0);
        assert_eq!(grid.segments(), 1);
        assert_eq!(grid.vertices().len(), 4);
    }
}
