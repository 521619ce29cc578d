use std::sync::Arc;

use rand::Rng;

use crate::clock::{FrameClock, Tick};
use crate::error::ParamError;
use crate::params::{ParamKey, ParamValue, ParameterSet, ParameterStore};
use crate::terrain::frame::{evaluate_frame, evaluate_vertex, TerrainFrame};
use crate::terrain::grid::TerrainGrid;
use crate::terrain::heightfield::HeightFieldSynthesizer;

/// One visualization session: live parameters, clock and plane mesh.
///
/// The UI writes parameters between frames; the render loop calls
/// [`TerrainSession::tick`] once per frame.
pub struct TerrainSession {
    store: ParameterStore,
    clock: FrameClock,
    grid: TerrainGrid,
    synth: HeightFieldSynthesizer,
}

impl Default for TerrainSession {
    fn default() -> Self {
        Self::new(ParameterSet::default())
    }
}

impl TerrainSession {
    pub fn new(params: ParameterSet) -> Self {
        let grid = TerrainGrid::new(params.map_size);
        Self {
            store: ParameterStore::new(params),
            clock: FrameClock::new(),
            grid,
            synth: HeightFieldSynthesizer::classic(),
        }
    }

    pub fn params(&self) -> &ParameterSet {
        self.store.params()
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn grid(&self) -> &TerrainGrid {
        &self.grid
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        self.store.set(key, value)
    }

    pub fn set_named(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        self.store.set_named(name, value)
    }

    pub fn set_color_hex(&mut self, key: ParamKey, hex: &str) -> Result<(), ParamError> {
        self.store.set_color_hex(key, hex)
    }

    pub fn update(&mut self, edit: impl FnOnce(&mut ParameterSet)) -> Result<(), ParamError> {
        self.store.update(edit)
    }

    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        self.store.randomize(rng);
    }

    /// Advance the clock and evaluate the whole grid against one
    /// parameter snapshot.
    pub fn tick(&mut self, tick: Tick) -> TerrainFrame {
        let t = self.clock.advance(tick);
        let params: Arc<ParameterSet> = self.store.snapshot();
        if params.map_size != self.grid.size() {
            log::debug!(
                "rebuilding {0}x{0} grid for map size {1}",
                self.grid.segments(),
                params.map_size
            );
            self.grid = TerrainGrid::with_segments(params.map_size, self.grid.segments());
        }
        evaluate_frame(&self.synth, &self.grid, &params, t, self.store.revision())
    }

    /// Terraced elevation at `(x, z)` for the current time and parameters.
    pub fn elevation_at(&self, x: f32, z: f32) -> f32 {
        evaluate_vertex(&self.synth, self.params(), x, z, self.clock.elapsed()).elevation
    }

    /// Surface color at `(x, z)` for the current time and parameters.
    pub fn color_at(&self, x: f32, z: f32) -> [f32; 4] {
        evaluate_vertex(&self.synth, self.params(), x, z, self.clock.elapsed()).color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::color_map::Rgb;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_tick_produces_full_grid() {
        let mut session = TerrainSession::default();
        let frame = session.tick(Tick::Absolute(0.5));
        assert_eq!(frame.vertices.len(), 257 * 257);
        assert_eq!(frame.time, 0.5);
        assert_eq!(session.clock().frame_count(), 1);
    }

    #[test]
    fn test_map_size_change_rebuilds_grid() {
        let mut session = TerrainSession::default();
        session.tick(Tick::Absolute(0.0));
        session.set(ParamKey::MapSize, 4.0).unwrap();
        let frame = session.tick(Tick::Delta(0.016));
        assert_eq!(session.grid().size(), 4.0);
        assert_eq!(frame.vertices[0].position[0], -2.0);
        assert_eq!(frame.vertices[0].position[2], -2.0);
    }

    #[test]
    fn test_frame_carries_parameter_revision() {
        let mut session = TerrainSession::default();
        assert_eq!(session.tick(Tick::Delta(0.1)).revision, 0);
        session.set_named("warping", 1.0).unwrap();
        session.randomize(&mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(session.tick(Tick::Delta(0.1)).revision, 2);
    }

    #[test]
    fn test_rejected_bulk_edit_leaves_frames_alone() {
        let mut session = TerrainSession::default();
        let before = session.tick(Tick::Absolute(1.0));
        assert!(session.update(|params| params.warping = f32::INFINITY).is_err());
        let after = session.tick(Tick::Absolute(1.0));
        assert_eq!(after.revision, before.revision);
        assert_eq!(after.vertices, before.vertices);
    }

    #[test]
    fn test_queries_follow_latest_parameters() {
        let mut session = TerrainSession::default();
        session.tick(Tick::Absolute(1.0));
        let before = session.elevation_at(0.3, -0.2);
        session.set(ParamKey::MaxElevation, 0.0).unwrap();
        session.set(ParamKey::RidgeHeight, 0.0).unwrap();
        session.set(ParamKey::Turbulence, 0.0).unwrap();
        assert_ne!(before, session.elevation_at(0.3, -0.2));
        assert_eq!(session.elevation_at(0.3, -0.2), 0.0);
    }

    #[test]
    fn test_color_query_matches_frame_vertex() {
        let mut session = TerrainSession::new(ParameterSet {
            line_color_mode: true,
            ..Default::default()
        });
        let frame = session.tick(Tick::Absolute(2.0));
        let bands = frame.contours.unwrap();
        for v in frame.vertices.iter().step_by(97) {
            let banded = bands.apply(v.elevation, Rgb::new(v.color[0], v.color[1], v.color[2]));
            assert_eq!(session.color_at(v.position[0], v.position[2]), banded.with_alpha(1.0));
            assert_eq!(session.elevation_at(v.position[0], v.position[2]), v.elevation);
        }
    }
}
