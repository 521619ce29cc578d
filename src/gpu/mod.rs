pub mod camera;
pub mod terrain_callback;
pub mod terrain_renderer;

pub use camera::Camera;
pub use terrain_callback::TerrainCallback;
pub use terrain_renderer::TerrainRenderer;
