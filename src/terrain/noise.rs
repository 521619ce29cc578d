//! Classic 3D gradient noise on a 289-periodic lattice.
//!
//! This is the permutation-polynomial formulation used by GPU shaders:
//! no lookup tables, every step is plain float arithmetic, so the CPU
//! result matches what a fragment of the same shader would produce.
//! Everything is evaluated in `f32` on purpose.

use noise::NoiseFn;

/// Lattice period. Hash inputs are reduced modulo this value.
pub const LATTICE_PERIOD: f32 = 289.0;

/// Output scale that brings the blended corner products to roughly [-1, 1].
pub const OUTPUT_SCALE: f32 = 2.2;

/// 2^24. From here on every `f32` is an integer and the hash polynomial
/// would overflow, so coordinates are first reduced onto one period.
const EXACT_INTEGER_LIMIT: f32 = 16_777_216.0;

/// Stateless classic gradient noise.
///
/// Implements [`NoiseFn`] so it can be dropped into `noise` combinators,
/// and so the heightfield can be driven by any other `NoiseFn` source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassicNoise;

impl ClassicNoise {
    #[inline]
    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        noise3(x, y, z)
    }
}

impl NoiseFn<f64, 3> for ClassicNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        noise3(point[0] as f32, point[1] as f32, point[2] as f32) as f64
    }
}

type Vec4 = [f32; 4];

/// GLSL `mod`: `x - y * floor(x / y)`, sign follows the divisor.
#[inline]
pub(crate) fn glsl_mod(x: f32, y: f32) -> f32 {
    x - y * (x / y).floor()
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// GLSL `step`: 0 when `x < edge`, otherwise 1.
#[inline]
pub(crate) fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

/// GLSL `mix`.
#[inline]
pub(crate) fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Clamp a wide intermediate back into the finite `f32` range.
#[inline]
pub(crate) fn saturate(v: f64) -> f32 {
    v.clamp(-(f32::MAX as f64), f32::MAX as f64) as f32
}

/// Noise coordinate that stays finite when the `f32` product overflows.
///
/// `narrow` is the coordinate as computed in `f32`. When it is not
/// finite, `wide` recomputes it in `f64` and the result is folded onto
/// one lattice period, which [`noise3`] cannot tell apart.
#[inline]
pub(crate) fn lattice_coord(narrow: f32, wide: impl FnOnce() -> f64) -> f32 {
    if narrow.is_finite() {
        narrow
    } else {
        wide().rem_euclid(LATTICE_PERIOD as f64) as f32
    }
}

/// Exact reduction of a huge (hence integral) coordinate onto `[0, 289)`.
#[inline]
fn reduce_coord(c: f32) -> f32 {
    if c.abs() < EXACT_INTEGER_LIMIT {
        c
    } else {
        (c as f64).rem_euclid(LATTICE_PERIOD as f64) as f32
    }
}

#[inline]
fn map4(v: Vec4, f: impl Fn(f32) -> f32) -> Vec4 {
    [f(v[0]), f(v[1]), f(v[2]), f(v[3])]
}

#[inline]
fn add4(a: Vec4, b: Vec4) -> Vec4 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
}

/// `mod(((x * 34) + 1) * x, 289)`
#[inline]
fn permute(x: f32) -> f32 {
    glsl_mod(((x * 34.0) + 1.0) * x, LATTICE_PERIOD)
}

/// First-order Taylor approximation of `1 / sqrt(r)` around r = 0.7.
#[inline]
#[allow(clippy::excessive_precision)]
fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_914_001_59 - 0.853_734_720_953_14 * r
}

/// Quintic fade `t^3 (t (6t - 15) + 10)`.
#[inline]
pub fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Gradients for the four xy corners of one z layer, normalized.
///
/// Corner order is (x0,y0), (x1,y0), (x0,y1), (x1,y1).
fn layer_gradients(hashed: Vec4) -> [[f32; 3]; 4] {
    let mut out = [[0.0; 3]; 4];
    for (corner, &h) in out.iter_mut().zip(hashed.iter()) {
        let gx = h / 7.0;
        let mut gy = fract(gx.floor() / 7.0) - 0.5;
        let mut gx = fract(gx);
        let gz = 0.5 - gx.abs() - gy.abs();
        let sz = step(gz, 0.0);
        gx -= sz * (step(0.0, gx) - 0.5);
        gy -= sz * (step(0.0, gy) - 0.5);

        let norm = taylor_inv_sqrt(dot([gx, gy, gz], [gx, gy, gz]));
        *corner = [gx * norm, gy * norm, gz * norm];
    }
    out
}

#[inline]
fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Classic gradient noise at `(x, y, z)`.
///
/// Deterministic and pure; periodic with period 289 on every axis and
/// zero on integer lattice points. Finite for every finite input.
pub fn noise3(x: f32, y: f32, z: f32) -> f32 {
    let (x, y, z) = (reduce_coord(x), reduce_coord(y), reduce_coord(z));
    let pi0 = [x.floor(), y.floor(), z.floor()];
    let pi1 = pi0.map(|c| c + 1.0);
    let pi0 = pi0.map(|c| glsl_mod(c, LATTICE_PERIOD));
    let pi1 = pi1.map(|c| glsl_mod(c, LATTICE_PERIOD));
    let pf0 = [fract(x), fract(y), fract(z)];
    let pf1 = pf0.map(|c| c - 1.0);

    let ix = [pi0[0], pi1[0], pi0[0], pi1[0]];
    let iy = [pi0[1], pi0[1], pi1[1], pi1[1]];
    let iz0 = [pi0[2]; 4];
    let iz1 = [pi1[2]; 4];

    let ixy = map4(add4(map4(ix, permute), iy), permute);
    let ixy0 = map4(add4(ixy, iz0), permute);
    let ixy1 = map4(add4(ixy, iz1), permute);

    let [g000, g100, g010, g110] = layer_gradients(ixy0);
    let [g001, g101, g011, g111] = layer_gradients(ixy1);

    let n000 = dot(g000, pf0);
    let n100 = dot(g100, [pf1[0], pf0[1], pf0[2]]);
    let n010 = dot(g010, [pf0[0], pf1[1], pf0[2]]);
    let n110 = dot(g110, [pf1[0], pf1[1], pf0[2]]);
    let n001 = dot(g001, [pf0[0], pf0[1], pf1[2]]);
    let n101 = dot(g101, [pf1[0], pf0[1], pf1[2]]);
    let n011 = dot(g011, [pf0[0], pf1[1], pf1[2]]);
    let n111 = dot(g111, pf1);

    let fade_xyz = pf0.map(fade);
    let n_z = [
        mix(n000, n001, fade_xyz[2]),
        mix(n100, n101, fade_xyz[2]),
        mix(n010, n011, fade_xyz[2]),
        mix(n110, n111, fade_xyz[2]),
    ];
    let n_yz = [
        mix(n_z[0], n_z[2], fade_xyz[1]),
        mix(n_z[1], n_z[3], fade_xyz[1]),
    ];
    let n_xyz = mix(n_yz[0], n_yz[1], fade_xyz[0]);
    OUTPUT_SCALE * n_xyz
}
