use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::params::ParameterSet;
use crate::terrain::noise::{glsl_mod, mix, saturate, step};

/// Linear RGB color, each component nominally in [0.0, 1.0].
///
/// Serialized as a `#RRGGBB` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Parse `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB`.
    ///
    /// Channels map straight to `value / 255`, no color-space conversion.
    pub fn from_hex(text: &str) -> Result<Self, ParamError> {
        let invalid = || ParamError::InvalidColor(text.to_owned());
        let digits = text.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            6 => Ok(Self::from_rgb8(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let short = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::from_rgb8(short(0)?, short(1)?, short(2)?))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    pub fn to_rgb8(&self) -> [u8; 3] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Component-wise GLSL `mix`. `t` is not clamped.
    ///
    /// A component that overflows `f32` saturates instead of turning
    /// into an infinity or NaN.
    pub fn lerp(&self, other: Rgb, t: f32) -> Rgb {
        let channel = |a: f32, b: f32| {
            let v = mix(a, b, t);
            if v.is_finite() {
                v
            } else {
                saturate(a as f64 * (1.0 - t as f64) + b as f64 * t as f64)
            }
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }

    pub fn with_alpha(&self, a: f32) -> [f32; 4] {
        [self.r, self.g, self.b, a]
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(c: [u8; 3]) -> Self {
        Self::from_rgb8(c[0], c[1], c[2])
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

impl From<Rgb> for egui::Color32 {
    fn from(c: Rgb) -> Self {
        let [r, g, b] = c.to_rgb8();
        egui::Color32::from_rgb(r, g, b)
    }
}

/// Gradient mix factor `(elevation + colorDiffusion) * colorStrength`.
///
/// Deliberately unclamped: factors outside [0, 1] extrapolate past the
/// low/high endpoints exactly like a shader `mix` does. Only a product
/// that overflows `f32` is saturated.
pub fn mix_factor(elevation: f32, params: &ParameterSet) -> f32 {
    let factor = (elevation + params.color_diffusion) * params.color_strength;
    if factor.is_finite() {
        factor
    } else {
        saturate((elevation as f64 + params.color_diffusion as f64) * params.color_strength as f64)
    }
}

/// Contour band selector: 1 keeps the gradient color, 0 paints the line.
///
/// `None` when banding is undefined: zero thickness, or a phase that
/// overflowed out of [0, 1]. The fragment shader applies the same guard.
pub fn band_selector(elevation: f32, line_height: f32, line_thickness: f32) -> Option<f32> {
    if line_thickness == 0.0 {
        return None;
    }
    let phase = glsl_mod(elevation * line_height, line_thickness) / line_thickness;
    (0.0..=1.0).contains(&phase).then(|| step(0.5, phase))
}

/// Contour line settings for one frame. Only exists while banding is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourBands {
    pub color: Rgb,
    pub height: f32,
    pub thickness: f32,
}

impl ContourBands {
    /// `None` when the schema has no contours or line color mode is off.
    pub fn from_params(params: &ParameterSet) -> Option<Self> {
        (params.schema.capabilities().contours && params.line_color_mode).then(|| Self {
            color: params.line_color,
            height: params.line_height,
            thickness: params.line_thickness,
        })
    }

    /// Paint the line color over `base` where `elevation` falls on a band.
    pub fn apply(&self, elevation: f32, base: Rgb) -> Rgb {
        match band_selector(elevation, self.height, self.thickness) {
            Some(selector) => self.color.lerp(base, selector),
            None => base,
        }
    }
}

/// Maps an elevation to a surface color.
pub struct ColorMapper;

impl ColorMapper {
    /// Low-to-high elevation gradient, without contour bands.
    ///
    /// Affine in `elevation`, so interpolating vertex values across a
    /// triangle gives the same color as evaluating it per fragment.
    pub fn gradient(elevation: f32, params: &ParameterSet) -> Rgb {
        params
            .low_color
            .lerp(params.high_color, mix_factor(elevation, params))
    }

    /// Opaque RGBA color for `elevation` under the current parameters.
    pub fn shade(elevation: f32, params: &ParameterSet) -> [f32; 4] {
        let gradient = Self::gradient(elevation, params);
        let color = match ContourBands::from_params(params) {
            Some(bands) => bands.apply(elevation, gradient),
            None => gradient,
        };
        color.with_alpha(1.0)
    }
}

/// Shorthand for [`ColorMapper::shade`].
pub fn shade(elevation: f32, params: &ParameterSet) -> [f32; 4] {
    ColorMapper::shade(elevation, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SchemaVersion;

    fn gradient_params() -> ParameterSet {
        ParameterSet {
            low_color: Rgb::BLACK,
            high_color: Rgb::WHITE,
            color_strength: 1.0,
            color_diffusion: 0.0,
            line_color_mode: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Rgb::from_hex("#7F7F7F").unwrap().to_rgb8(), [127, 127, 127]);
        assert_eq!(Rgb::from_hex("ff0000").unwrap(), Rgb::new(1.0, 0.0, 0.0));
        assert_eq!(Rgb::from_hex("#0f0").unwrap(), Rgb::new(0.0, 1.0, 0.0));
        assert_eq!(Rgb::from_hex(" #000000 ").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_hex_parsing_rejects_garbage() {
        for bad in ["", "#", "#12345", "#GGGGGG", "#1234567", "red", "#+1+2+3"] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(ParamError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_hex_round_trip_of_defaults() {
        for hex in ["#000000", "#7F7F7F", "#FFFFFF", "#1A2B3C"] {
            assert_eq!(Rgb::from_hex(hex).unwrap().to_hex(), hex);
        }
    }

    #[test]
    fn test_picker_bytes_are_stored_channels() {
        for v in 0..=255_u8 {
            for picked in [[v, 0, 0], [0, v, 255 - v], [v, v, v]] {
                let stored = Rgb::from(picked);
                assert_eq!(stored.to_rgb8(), picked);
                assert_eq!(Rgb::from_hex(&stored.to_hex()).unwrap(), stored);
            }
        }
        // No gamma curve between the picker and the stored value.
        let grey = 128.0 / 255.0;
        assert_eq!(Rgb::from([128, 128, 128]), Rgb::new(grey, grey, grey));
    }

    #[test]
    fn test_gradient_endpoints() {
        let params = gradient_params();
        assert_eq!(shade(0.0, &params), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(shade(1.0, &params), [1.0, 1.0, 1.0, 1.0]);
        let mid = shade(0.5, &params);
        for c in &mid[..3] {
            assert!((c - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mix_factor_is_not_clamped() {
        let params = ParameterSet {
            low_color: Rgb::new(0.2, 0.2, 0.2),
            high_color: Rgb::new(0.4, 0.4, 0.4),
            ..gradient_params()
        };
        assert_eq!(mix_factor(3.0, &params), 3.0);
        let over = shade(3.0, &params);
        assert!((over[0] - 0.8).abs() < 1e-6, "extrapolated to {}", over[0]);
        let under = shade(-1.0, &params);
        assert!(under[0].abs() < 1e-6, "extrapolated to {}", under[0]);
    }

    #[test]
    fn test_mix_factor_grows_with_strength() {
        let mut params = gradient_params();
        params.color_diffusion = 2.0;
        for elevation in [-3.5_f32, -0.4, 0.0, 0.7, 1.9] {
            let mut previous = 0.0_f32;
            for i in 0..=30 {
                params.color_strength = i as f32 * 0.1;
                let factor = mix_factor(elevation, &params).abs();
                assert!(factor >= previous, "|mix| shrank at strength {}", params.color_strength);
                previous = factor;
            }
        }
    }

    #[test]
    fn test_contour_bands_alternate() {
        let params = ParameterSet {
            line_color_mode: true,
            line_color: Rgb::new(1.0, 0.0, 0.0),
            low_color: Rgb::new(0.0, 0.0, 1.0),
            high_color: Rgb::new(0.0, 0.0, 1.0),
            line_height: 1.0,
            line_thickness: 1.0,
            ..Default::default()
        };
        // phase 0.25 -> line color, phase 0.75 -> gradient
        assert_eq!(shade(0.25, &params), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(shade(0.75, &params), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(shade(1.25, &params), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(shade(-0.75, &params), [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_zero_thickness_returns_plain_gradient() {
        let mut params = gradient_params();
        params.line_color_mode = true;
        params.line_thickness = 0.0;
        params.line_color = Rgb::new(1.0, 0.0, 0.0);
        let plain = shade(0.3, &gradient_params());
        assert_eq!(shade(0.3, &params), plain);
        assert!(shade(0.3, &params).iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_negative_thickness_is_well_defined() {
        let params = ParameterSet {
            line_color_mode: true,
            line_thickness: -0.05,
            line_height: 20.0,
            color_strength: 40.0,
            ..Default::default()
        };
        for i in -50..50 {
            let color = shade(i as f32 * 0.037, &params);
            assert!(color.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_band_selector_guards_the_phase() {
        assert_eq!(band_selector(0.25, 1.0, 1.0), Some(0.0));
        assert_eq!(band_selector(0.75, 1.0, 1.0), Some(1.0));
        assert_eq!(band_selector(0.3, 20.0, 0.0), None);
        // elevation * height overflows, so the phase is NaN.
        assert_eq!(band_selector(3.0e38, 3.0e38, 0.05), None);
    }

    #[test]
    fn test_first_schema_ignores_contours() {
        let params = ParameterSet {
            schema: SchemaVersion::V1,
            line_color_mode: true,
            line_thickness: 1.0,
            line_height: 1.0,
            line_color: Rgb::new(1.0, 0.0, 0.0),
            ..gradient_params()
        };
        assert_eq!(shade(0.25, &params), [0.25, 0.25, 0.25, 1.0]);
    }

    #[test]
    fn test_overflowing_mix_factor_saturates() {
        let params = ParameterSet {
            color_strength: 3.0e38,
            color_diffusion: 3.0e38,
            ..Default::default()
        };
        assert_eq!(mix_factor(0.5, &params), f32::MAX);
        let color = shade(0.5, &params);
        assert!(color.iter().all(|c| c.is_finite()), "{color:?}");

        // The sum overflows but a zero strength still means no gradient.
        let flat = ParameterSet {
            color_strength: 0.0,
            color_diffusion: 3.0e38,
            ..Default::default()
        };
        assert_eq!(mix_factor(3.0e38, &flat), 0.0);
        assert_eq!(shade(3.0e38, &flat), flat.low_color.with_alpha(1.0));
    }

    #[test]
    fn test_lerp_saturates_instead_of_overflowing() {
        let huge = Rgb::new(3.0e38, -3.0e38, 0.5);
        let out = huge.lerp(Rgb::new(-3.0e38, 3.0e38, 0.5), 4.0);
        assert_eq!(out.r, -f32::MAX);
        assert_eq!(out.g, f32::MAX);
        assert_eq!(out.b, 0.5);
        let extreme = Rgb::BLACK.lerp(Rgb::WHITE, f32::MAX);
        assert_eq!(extreme, Rgb::new(f32::MAX, f32::MAX, f32::MAX));
    }

    #[test]
    fn test_contour_bands_follow_schema_and_mode() {
        let on = ParameterSet {
            line_color_mode: true,
            ..Default::default()
        };
        let bands = ContourBands::from_params(&on).unwrap();
        assert_eq!(bands.height, on.line_height);
        assert_eq!(bands.thickness, on.line_thickness);
        assert!(ContourBands::from_params(&ParameterSet::default()).is_none());
        assert!(ContourBands::from_params(&ParameterSet {
            schema: SchemaVersion::V1,
            ..on.clone()
        })
        .is_none());

        for i in -40..40 {
            let e = i as f32 * 0.0137;
            let expected = bands.apply(e, ColorMapper::gradient(e, &on)).with_alpha(1.0);
            assert_eq!(shade(e, &on), expected);
        }
    }
}
