//! Text rendering parameters for the pixel shader's alpha correction.
//!
//! The coefficients reproduce the gamma correction DirectWrite applies to
//! grayscale and ClearType coverage, so glyph weight matches native text.

/// Alpha correction polynomials for gamma 1.0 through 2.2 in steps of 0.1.
/// Each row is pre-divided by 4.
const GAMMA_INCORRECT_TARGET_RATIOS: [[f32; 4]; 13] = [
    [0.0000 / 4.0, 0.0000 / 4.0, 0.0000 / 4.0, 0.0000 / 4.0],
    [0.0166 / 4.0, -0.0807 / 4.0, 0.2227 / 4.0, -0.0751 / 4.0],
    [0.0350 / 4.0, -0.1760 / 4.0, 0.4325 / 4.0, -0.1370 / 4.0],
    [0.0543 / 4.0, -0.2821 / 4.0, 0.6302 / 4.0, -0.1876 / 4.0],
    [0.0739 / 4.0, -0.3963 / 4.0, 0.8167 / 4.0, -0.2287 / 4.0],
    [0.0933 / 4.0, -0.5161 / 4.0, 0.9926 / 4.0, -0.2616 / 4.0],
    [0.1121 / 4.0, -0.6395 / 4.0, 1.1588 / 4.0, -0.2877 / 4.0],
    [0.1300 / 4.0, -0.7649 / 4.0, 1.3159 / 4.0, -0.3080 / 4.0],
    [0.1469 / 4.0, -0.8911 / 4.0, 1.4644 / 4.0, -0.3234 / 4.0],
    [0.1627 / 4.0, -1.0170 / 4.0, 1.6051 / 4.0, -0.3347 / 4.0],
    [0.1773 / 4.0, -1.1420 / 4.0, 1.7385 / 4.0, -0.3426 / 4.0],
    [0.1908 / 4.0, -1.2652 / 4.0, 1.8650 / 4.0, -0.3476 / 4.0],
    [0.2031 / 4.0, -1.3864 / 4.0, 1.9851 / 4.0, -0.3501 / 4.0],
];

/// Alpha correction coefficients for `gamma`, scaled for coverage values
/// and colors in `0..=1`.
///
/// Gamma is clamped to `1.0..=2.2` and rounded to the nearest table row.
pub fn gamma_ratios(gamma: f32) -> [f32; 4] {
    const NORM13: f32 = (0x10000 as f64 / (255.0 * 255.0) * 4.0) as f32;
    const NORM24: f32 = (0x100 as f64 / 255.0 * 4.0) as f32;

    let gamma = if gamma.is_finite() { gamma } else { 1.0 };
    let index = ((gamma.clamp(1.0, 2.2) * 10.0).round() as usize).saturating_sub(10);
    let ratios = GAMMA_INCORRECT_TARGET_RATIOS[index.min(GAMMA_INCORRECT_TARGET_RATIOS.len() - 1)];

    [
        NORM13 * ratios[0],
        NORM24 * ratios[1],
        NORM13 * ratios[2],
        NORM24 * ratios[3],
    ]
}
