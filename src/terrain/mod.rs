// Terrain surface: noise, elevation, color and the evaluated mesh

pub mod color_map;
pub mod frame;
pub mod grid;
pub mod heightfield;
pub mod noise;

pub use color_map::{ColorMapper, Rgb};
pub use frame::{evaluate_frame, TerrainFrame, TerrainVertex};
pub use grid::{TerrainGrid, GRID_SEGMENTS};
pub use heightfield::{Elevation, HeightFieldSynthesizer};
pub use noise::{noise3, ClassicNoise};
