use noise::NoiseFn;

use crate::params::ParameterSet;
use crate::terrain::noise::{glsl_mod, lattice_coord, mix, saturate, ClassicNoise};

/// Spatial multiplier of the turbulence octave.
pub const TURBULENCE_FREQUENCY: f32 = 2.0;
/// Time multiplier of the turbulence octave.
pub const TURBULENCE_TIME_SCALE: f32 = 0.1;

/// Elevation of one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elevation {
    /// Sum of the noise, ridge and turbulence terms.
    pub raw: f32,
    /// `raw` after terracing. This is what the color stage sees.
    pub terraced: f32,
    /// Vertical offset applied to the mesh vertex.
    pub displacement: f32,
}

/// Quantize `raw` to multiples of `step`, blending back toward `raw` by
/// `smoothing` (0 = stepped, 1 = untouched).
///
/// A zero step, or one so small the quantization overflows, returns `raw`.
pub fn terrace(raw: f32, step: f32, smoothing: f32) -> f32 {
    if step == 0.0 {
        return raw;
    }
    let quantized = raw - glsl_mod(raw, step);
    let terraced = mix(quantized, raw, smoothing);
    if terraced.is_finite() {
        terraced
    } else {
        raw
    }
}

/// Combines the noise field with ridge, turbulence and terrace terms.
///
/// Pure per-vertex function: vertices may be evaluated in any order and
/// on any thread.
#[derive(Debug, Clone, Default)]
pub struct HeightFieldSynthesizer<N = ClassicNoise> {
    noise: N,
}

impl HeightFieldSynthesizer {
    /// Synthesizer over [`ClassicNoise`].
    pub fn classic() -> Self {
        Self {
            noise: ClassicNoise,
        }
    }
}

impl<N: NoiseFn<f64, 3>> HeightFieldSynthesizer<N> {
    pub fn new(noise: N) -> Self {
        Self { noise }
    }

    #[inline]
    fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        self.noise.get([x as f64, y as f64, z as f64]) as f32
    }

    /// Elevation before terracing.
    ///
    /// Finite inputs always give a finite result: overflowing noise
    /// coordinates wrap onto the lattice, and an overflowing sum saturates.
    pub fn raw_elevation(&self, x: f32, z: f32, t: f32, params: &ParameterSet) -> f32 {
        let caps = params.schema.capabilities();
        let (xw, zw, tw) = (x as f64, z as f64, t as f64);

        let base_noise = self.sample(
            lattice_coord(x * params.warping, || xw * params.warping as f64),
            lattice_coord(z * params.warping - t * params.speed, || {
                zw * params.warping as f64 - tw * params.speed as f64
            }),
            0.0,
        );

        let ridge_wave = if caps.ridges {
            let phase = (x + z) * params.ridge_frequency;
            if phase.is_finite() {
                phase.sin()
            } else {
                ((xw + zw) * params.ridge_frequency as f64).sin() as f32
            }
        } else {
            0.0
        };

        let turb_noise = if caps.turbulence {
            self.sample(
                lattice_coord(x * TURBULENCE_FREQUENCY, || xw * TURBULENCE_FREQUENCY as f64),
                lattice_coord(z * TURBULENCE_FREQUENCY, || zw * TURBULENCE_FREQUENCY as f64),
                lattice_coord(t * TURBULENCE_TIME_SCALE, || tw * TURBULENCE_TIME_SCALE as f64),
            )
        } else {
            0.0
        };

        let terms = [
            (base_noise, params.max_elevation),
            (ridge_wave, if caps.ridges { params.ridge_height } else { 0.0 }),
            (turb_noise, if caps.turbulence { params.turbulence } else { 0.0 }),
        ];
        let raw: f32 = terms.iter().map(|&(n, amplitude)| n * amplitude).sum();
        if raw.is_finite() {
            raw
        } else {
            saturate(terms.iter().map(|&(n, a)| n as f64 * a as f64).sum())
        }
    }

    pub fn elevation(&self, x: f32, z: f32, t: f32, params: &ParameterSet) -> Elevation {
        let caps = params.schema.capabilities();
        let raw = self.raw_elevation(x, z, t, params);
        let terraced = if caps.terraces {
            terrace(raw, params.terrace_step, params.terrace_smoothing)
        } else {
            raw
        };
        let displacement = if caps.flatten && params.transform_to_2d {
            0.0
        } else {
            terraced
        };
        Elevation {
            raw,
            terraced,
            displacement,
        }
    }
}

/// [`HeightFieldSynthesizer::elevation`] over the classic gradient noise.
pub fn elevation(x: f32, z: f32, t: f32, params: &ParameterSet) -> Elevation {
    HeightFieldSynthesizer::classic().elevation(x, z, t, params)
}
