#![warn(clippy::all, rust_2018_idioms)]

mod app;
pub mod clock;
pub mod error;
pub mod gpu;
pub mod params;
pub mod session;
pub mod terrain;

pub use app::TopographicApp;
pub use clock::{FrameClock, Tick};
pub use error::ParamError;
pub use params::{ParamKey, ParamValue, ParameterSet, ParameterStore, SchemaVersion};
pub use session::TerrainSession;
