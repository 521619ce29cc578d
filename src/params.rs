//! The live, mutable parameter set and the store that guards edits to it.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::terrain::color_map::Rgb;

/// Observed variants of the parameter schema.
///
/// Each later variant only adds terms; see [`Capabilities`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// Noise displacement and the two-color elevation gradient.
    V1,
    /// Adds ridges, terracing, contour lines and the 2D flatten switch.
    V2,
    /// Adds the turbulence octave.
    #[default]
    V3,
}

/// Which formula terms a schema variant enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub ridges: bool,
    pub terraces: bool,
    pub contours: bool,
    pub flatten: bool,
    pub turbulence: bool,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [SchemaVersion::V1, SchemaVersion::V2, SchemaVersion::V3];

    pub fn capabilities(self) -> Capabilities {
        let later = self != SchemaVersion::V1;
        Capabilities {
            ridges: later,
            terraces: later,
            contours: later,
            flatten: later,
            turbulence: self == SchemaVersion::V3,
        }
    }
}

/// Every tunable of the terrain, in one record.
///
/// Values are never clamped here; the synthesis and shading math copes
/// with anything finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterSet {
    pub schema: SchemaVersion,

    /// Plane extent. Grid resolution does not depend on it.
    pub map_size: f32,
    /// Scroll rate of the noise domain along the time axis.
    pub speed: f32,
    /// Reserved, consumed by no formula.
    pub general_topography: f32,
    pub max_elevation: f32,
    /// Spatial frequency applied before the noise lookup.
    pub warping: f32,
    pub ridge_frequency: f32,
    pub ridge_height: f32,
    pub turbulence: f32,
    pub terrace_step: f32,
    /// 0 = fully stepped, 1 = smooth.
    pub terrace_smoothing: f32,

    pub low_color: Rgb,
    pub high_color: Rgb,
    pub color_strength: f32,
    pub color_diffusion: f32,
    /// Reserved, consumed by no formula.
    pub elevation_color_mode: bool,

    pub line_color_mode: bool,
    pub line_color: Rgb,
    pub line_thickness: f32,
    pub line_height: f32,

    #[serde(rename = "transformTo2D")]
    pub transform_to_2d: bool,
    /// Only used by the renderer, as the clear color.
    pub background_color: Rgb,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            schema: SchemaVersion::default(),
            map_size: 10.0,
            speed: 0.75,
            general_topography: 0.42,
            max_elevation: 1.48,
            warping: 2.19,
            ridge_frequency: 6.0,
            ridge_height: 0.05,
            turbulence: 0.1,
            terrace_step: 0.1,
            terrace_smoothing: 0.5,
            low_color: Rgb::BLACK,
            high_color: Rgb::from_rgb8(0x7F, 0x7F, 0x7F),
            color_strength: 1.5,
            color_diffusion: 2.0,
            elevation_color_mode: true,
            line_color_mode: false,
            line_color: Rgb::WHITE,
            line_thickness: 0.05,
            line_height: 20.0,
            transform_to_2d: false,
            background_color: Rgb::BLACK,
        }
    }
}

/// Names every editable field of [`ParameterSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    MapSize,
    Speed,
    GeneralTopography,
    MaxElevation,
    Warping,
    RidgeFrequency,
    RidgeHeight,
    Turbulence,
    TerraceStep,
    TerraceSmoothing,
    LowColor,
    HighColor,
    ColorStrength,
    ColorDiffusion,
    ElevationColorMode,
    LineColorMode,
    LineColor,
    LineThickness,
    LineHeight,
    TransformTo2D,
    BackgroundColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Float,
    Bool,
    Color,
}

impl ParamKind {
    fn describe(self) -> &'static str {
        match self {
            ParamKind::Float => "numeric",
            ParamKind::Bool => "boolean",
            ParamKind::Color => "color",
        }
    }
}

impl ParamKey {
    pub const ALL: [ParamKey; 21] = [
        ParamKey::MapSize,
        ParamKey::Speed,
        ParamKey::GeneralTopography,
        ParamKey::MaxElevation,
        ParamKey::Warping,
        ParamKey::RidgeFrequency,
        ParamKey::RidgeHeight,
        ParamKey::Turbulence,
        ParamKey::TerraceStep,
        ParamKey::TerraceSmoothing,
        ParamKey::LowColor,
        ParamKey::HighColor,
        ParamKey::ColorStrength,
        ParamKey::ColorDiffusion,
        ParamKey::ElevationColorMode,
        ParamKey::LineColorMode,
        ParamKey::LineColor,
        ParamKey::LineThickness,
        ParamKey::LineHeight,
        ParamKey::TransformTo2D,
        ParamKey::BackgroundColor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamKey::MapSize => "mapSize",
            ParamKey::Speed => "speed",
            ParamKey::GeneralTopography => "generalTopography",
            ParamKey::MaxElevation => "maxElevation",
            ParamKey::Warping => "warping",
            ParamKey::RidgeFrequency => "ridgeFrequency",
            ParamKey::RidgeHeight => "ridgeHeight",
            ParamKey::Turbulence => "turbulence",
            ParamKey::TerraceStep => "terraceStep",
            ParamKey::TerraceSmoothing => "terraceSmoothing",
            ParamKey::LowColor => "lowColor",
            ParamKey::HighColor => "highColor",
            ParamKey::ColorStrength => "colorStrength",
            ParamKey::ColorDiffusion => "colorDiffusion",
            ParamKey::ElevationColorMode => "elevationColorMode",
            ParamKey::LineColorMode => "lineColorMode",
            ParamKey::LineColor => "lineColor",
            ParamKey::LineThickness => "lineThickness",
            ParamKey::LineHeight => "lineHeight",
            ParamKey::TransformTo2D => "transformTo2D",
            ParamKey::BackgroundColor => "backgroundColor",
        }
    }

    /// Human readable label for the control panel.
    pub fn label(self) -> &'static str {
        match self {
            ParamKey::MapSize => "Size of the map",
            ParamKey::Speed => "Speed",
            ParamKey::GeneralTopography => "General topography",
            ParamKey::MaxElevation => "Max. elevation",
            ParamKey::Warping => "Warping",
            ParamKey::RidgeFrequency => "Ridge frequency",
            ParamKey::RidgeHeight => "Ridge height",
            ParamKey::Turbulence => "Turbulence",
            ParamKey::TerraceStep => "Terrace step",
            ParamKey::TerraceSmoothing => "Terrace smoothing",
            ParamKey::LowColor => "Low elevation color",
            ParamKey::HighColor => "High elevation color",
            ParamKey::ColorStrength => "Elevation color strength",
            ParamKey::ColorDiffusion => "Elevation color diffusion",
            ParamKey::ElevationColorMode => "Activate elevation color mode",
            ParamKey::LineColorMode => "Activate line color mode",
            ParamKey::LineColor => "Line color",
            ParamKey::LineThickness => "Line thickness",
            ParamKey::LineHeight => "Line height",
            ParamKey::TransformTo2D => "Transform to 2D plane",
            ParamKey::BackgroundColor => "Background color",
        }
    }

    pub fn kind(self) -> ParamKind {
        match self {
            ParamKey::LowColor
            | ParamKey::HighColor
            | ParamKey::LineColor
            | ParamKey::BackgroundColor => ParamKind::Color,
            ParamKey::ElevationColorMode | ParamKey::LineColorMode | ParamKey::TransformTo2D => {
                ParamKind::Bool
            }
            _ => ParamKind::Float,
        }
    }

    /// Slider range and step for numeric parameters.
    pub fn ui_range(self) -> Option<(RangeInclusive<f32>, f64)> {
        let range = match self {
            ParamKey::MapSize => (1.0..=20.0, 0.1),
            ParamKey::Speed => (0.0..=1.0, 0.01),
            ParamKey::GeneralTopography => (0.0..=1.0, 0.01),
            ParamKey::MaxElevation => (0.0..=5.0, 0.01),
            ParamKey::Warping => (0.0..=3.0, 0.01),
            ParamKey::RidgeFrequency => (0.0..=20.0, 0.1),
            ParamKey::RidgeHeight => (0.0..=0.5, 0.005),
            ParamKey::Turbulence => (0.0..=1.0, 0.01),
            ParamKey::TerraceStep => (0.0..=0.5, 0.005),
            ParamKey::TerraceSmoothing => (0.0..=1.0, 0.01),
            ParamKey::ColorStrength => (0.0..=3.0, 0.01),
            ParamKey::ColorDiffusion => (0.0..=5.0, 0.01),
            ParamKey::LineThickness => (0.0..=0.2, 0.001),
            ParamKey::LineHeight => (1.0..=50.0, 0.1),
            _ => return None,
        };
        Some(range)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParamKey {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParamKey::ALL
            .into_iter()
            .find(|key| key.name() == s)
            .ok_or_else(|| ParamError::UnknownParameter(s.to_owned()))
    }
}

/// A value written to or read from a [`ParameterSet`] field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Bool(bool),
    Color(Rgb),
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v as f32)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Rgb> for ParamValue {
    fn from(v: Rgb) -> Self {
        ParamValue::Color(v)
    }
}

impl ParameterSet {
    fn float_mut(&mut self, key: ParamKey) -> Option<&mut f32> {
        let slot = match key {
            ParamKey::MapSize => &mut self.map_size,
            ParamKey::Speed => &mut self.speed,
            ParamKey::GeneralTopography => &mut self.general_topography,
            ParamKey::MaxElevation => &mut self.max_elevation,
            ParamKey::Warping => &mut self.warping,
            ParamKey::RidgeFrequency => &mut self.ridge_frequency,
            ParamKey::RidgeHeight => &mut self.ridge_height,
            ParamKey::Turbulence => &mut self.turbulence,
            ParamKey::TerraceStep => &mut self.terrace_step,
            ParamKey::TerraceSmoothing => &mut self.terrace_smoothing,
            ParamKey::ColorStrength => &mut self.color_strength,
            ParamKey::ColorDiffusion => &mut self.color_diffusion,
            ParamKey::LineThickness => &mut self.line_thickness,
            ParamKey::LineHeight => &mut self.line_height,
            _ => return None,
        };
        Some(slot)
    }

    fn bool_mut(&mut self, key: ParamKey) -> Option<&mut bool> {
        match key {
            ParamKey::ElevationColorMode => Some(&mut self.elevation_color_mode),
            ParamKey::LineColorMode => Some(&mut self.line_color_mode),
            ParamKey::TransformTo2D => Some(&mut self.transform_to_2d),
            _ => None,
        }
    }

    fn color_mut(&mut self, key: ParamKey) -> Option<&mut Rgb> {
        match key {
            ParamKey::LowColor => Some(&mut self.low_color),
            ParamKey::HighColor => Some(&mut self.high_color),
            ParamKey::LineColor => Some(&mut self.line_color),
            ParamKey::BackgroundColor => Some(&mut self.background_color),
            _ => None,
        }
    }

    pub fn get(&self, key: ParamKey) -> ParamValue {
        match key {
            ParamKey::MapSize => ParamValue::Float(self.map_size),
            ParamKey::Speed => ParamValue::Float(self.speed),
            ParamKey::GeneralTopography => ParamValue::Float(self.general_topography),
            ParamKey::MaxElevation => ParamValue::Float(self.max_elevation),
            ParamKey::Warping => ParamValue::Float(self.warping),
            ParamKey::RidgeFrequency => ParamValue::Float(self.ridge_frequency),
            ParamKey::RidgeHeight => ParamValue::Float(self.ridge_height),
            ParamKey::Turbulence => ParamValue::Float(self.turbulence),
            ParamKey::TerraceStep => ParamValue::Float(self.terrace_step),
            ParamKey::TerraceSmoothing => ParamValue::Float(self.terrace_smoothing),
            ParamKey::LowColor => ParamValue::Color(self.low_color),
            ParamKey::HighColor => ParamValue::Color(self.high_color),
            ParamKey::ColorStrength => ParamValue::Float(self.color_strength),
            ParamKey::ColorDiffusion => ParamValue::Float(self.color_diffusion),
            ParamKey::ElevationColorMode => ParamValue::Bool(self.elevation_color_mode),
            ParamKey::LineColorMode => ParamValue::Bool(self.line_color_mode),
            ParamKey::LineColor => ParamValue::Color(self.line_color),
            ParamKey::LineThickness => ParamValue::Float(self.line_thickness),
            ParamKey::LineHeight => ParamValue::Float(self.line_height),
            ParamKey::TransformTo2D => ParamValue::Bool(self.transform_to_2d),
            ParamKey::BackgroundColor => ParamValue::Color(self.background_color),
        }
    }

    /// Type-checked write of one field.
    pub fn set(&mut self, key: ParamKey, value: ParamValue) -> Result<(), ParamError> {
        let mismatch = || ParamError::TypeMismatch {
            key,
            expected: key.kind().describe(),
        };
        match value {
            ParamValue::Float(v) => {
                if !v.is_finite() {
                    return Err(ParamError::NonFinite { key, value: v });
                }
                *self.float_mut(key).ok_or_else(mismatch)? = v;
            }
            ParamValue::Bool(v) => *self.bool_mut(key).ok_or_else(mismatch)? = v,
            ParamValue::Color(v) => *self.color_mut(key).ok_or_else(mismatch)? = v,
        }
        Ok(())
    }

    /// First float field holding a NaN or an infinity.
    pub fn validate(&self) -> Result<(), ParamError> {
        for key in ParamKey::ALL {
            if let ParamValue::Float(value) = self.get(key) {
                if !value.is_finite() {
                    return Err(ParamError::NonFinite { key, value });
                }
            }
        }
        Ok(())
    }
}

/// Fields touched by [`randomize`] and their sampling bounds.
pub const RANDOMIZE_RANGES: [(ParamKey, f32, f32); 9] = [
    (ParamKey::GeneralTopography, 0.0, 1.0),
    (ParamKey::MaxElevation, 1.0, 4.0),
    (ParamKey::Warping, 0.0, 1.5),
    (ParamKey::RidgeFrequency, 1.0, 11.0),
    (ParamKey::RidgeHeight, 0.0, 0.2),
    (ParamKey::TerraceStep, 0.0, 0.2),
    (ParamKey::TerraceSmoothing, 0.0, 1.0),
    (ParamKey::LineThickness, 0.0, 0.1),
    (ParamKey::LineHeight, 10.0, 40.0),
];

/// Re-sample the fixed subset in [`RANDOMIZE_RANGES`], leaving every
/// other field untouched.
pub fn randomize<R: Rng>(params: &mut ParameterSet, rng: &mut R) {
    for (key, low, high) in RANDOMIZE_RANGES {
        if let Some(slot) = params.float_mut(key) {
            *slot = rng.random_range(low..high);
        }
    }
}

/// Owner of the live [`ParameterSet`].
///
/// Every write bumps a revision counter. Frames read through
/// [`ParameterStore::snapshot`], which only clones when something changed.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    params: ParameterSet,
    revision: u64,
    snapshot: Option<(u64, Arc<ParameterSet>)>,
}

impl ParameterStore {
    pub fn new(params: ParameterSet) -> Self {
        Self {
            params,
            revision: 0,
            snapshot: None,
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, key: ParamKey) -> ParamValue {
        self.params.get(key)
    }

    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        let value = value.into();
        if let Err(err) = self.params.set(key, value) {
            log::warn!("rejected update of {key}: {err}");
            return Err(err);
        }
        self.revision += 1;
        log::debug!("{key} = {value:?} (revision {})", self.revision);
        Ok(())
    }

    /// Same as [`ParameterStore::set`], addressing the field by its name.
    pub fn set_named(&mut self, name: &str, value: impl Into<ParamValue>) -> Result<(), ParamError> {
        let key: ParamKey = name.parse()?;
        self.set(key, value)
    }

    /// Parse a hex color and write it to a color field.
    pub fn set_color_hex(&mut self, key: ParamKey, hex: &str) -> Result<(), ParamError> {
        let color = Rgb::from_hex(hex)?;
        self.set(key, color)
    }

    /// Bulk edit. Counts as a single revision.
    ///
    /// The edit runs on a copy; if it leaves a non-finite float behind,
    /// nothing is committed.
    pub fn update(&mut self, edit: impl FnOnce(&mut ParameterSet)) -> Result<(), ParamError> {
        let mut next = self.params.clone();
        edit(&mut next);
        if let Err(err) = next.validate() {
            log::warn!("rejected bulk update: {err}");
            return Err(err);
        }
        self.params = next;
        self.revision += 1;
        log::debug!("bulk update (revision {})", self.revision);
        Ok(())
    }

    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        randomize(&mut self.params, rng);
        self.revision += 1;
        log::info!(
            "randomized terrain: elevation {:.2}, warping {:.2}, ridges {:.2}x{:.2}",
            self.params.max_elevation,
            self.params.warping,
            self.params.ridge_frequency,
            self.params.ridge_height
        );
    }

    /// Read-consistent view of the parameters for one frame.
    pub fn snapshot(&mut self) -> Arc<ParameterSet> {
        match &self.snapshot {
            Some((revision, params)) if *revision == self.revision => Arc::clone(params),
            _ => {
                let params = Arc::new(self.params.clone());
                self.snapshot = Some((self.revision, Arc::clone(&params)));
                params
            }
        }
    }
}
