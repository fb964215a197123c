//! CIE L*a*b* conversion for perceptual blending.
//!
//! sRGB (gamma) → linear RGB → XYZ (D65) → Lab, and back with gamma
//! re-encoding and channel clamping.
use serde::{Deserialize, Serialize};

use super::Rgba;

/// D65 reference white.
const XN: f64 = 0.95047;
const YN: f64 = 1.0;
const ZN: f64 = 1.08883;

const DELTA: f64 = 6.0 / 29.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

#[inline]
fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn f(t: f64) -> f64 {
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

#[inline]
fn f_inv(t: f64) -> f64 {
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// sRGB channels → XYZ (D65, Y of white = 1).
pub fn rgb_to_xyz(c: Rgba) -> [f64; 3] {
    let r = srgb_to_linear(c.r as f64 / 255.0);
    let g = srgb_to_linear(c.g as f64 / 255.0);
    let b = srgb_to_linear(c.b as f64 / 255.0);
    [
        0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b,
        0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b,
        0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b,
    ]
}

/// XYZ → sRGB channels, clamped to gamut.
pub fn xyz_to_rgb(xyz: [f64; 3], alpha: f64) -> Rgba {
    let [x, y, z] = xyz;
    let r = 3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z;
    let g = -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z;
    let b = 0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z;
    let ch = |v: f64| (linear_to_srgb(v.clamp(0.0, 1.0)) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba { r: ch(r), g: ch(g), b: ch(b), a: alpha }
}

impl Lab {
    pub fn from_rgba(c: Rgba) -> Self {
        let [x, y, z] = rgb_to_xyz(c);
        let (fx, fy, fz) = (f(x / XN), f(y / YN), f(z / ZN));
        Lab {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    pub fn to_rgba(self, alpha: f64) -> Rgba {
        let fy = (self.l + 16.0) / 116.0;
        let fx = fy + self.a / 500.0;
        let fz = fy - self.b / 200.0;
        xyz_to_rgb([XN * f_inv(fx), YN * f_inv(fy), ZN * f_inv(fz)], alpha)
    }

    pub fn lerp(self, to: Lab, t: f64) -> Lab {
        Lab {
            l: self.l + (to.l - self.l) * t,
            a: self.a + (to.a - self.a) * t,
            b: self.b + (to.b - self.b) * t,
        }
    }
}

/// Blend two colors through Lab; alpha interpolates linearly.
pub fn mix_perceptual(from: Rgba, to: Rgba, t: f64) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let alpha = from.a + (to.a - from.a) * t;
    Lab::from_rgba(from).lerp(Lab::from_rgba(to), t).to_rgba(alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn within_one(a: Rgba, b: Rgba) -> bool {
        (a.r as i16 - b.r as i16).abs() <= 1
            && (a.g as i16 - b.g as i16).abs() <= 1
            && (a.b as i16 - b.b as i16).abs() <= 1
    }

    #[test]
    fn roundtrip_sampled_colors_within_one() {
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        for _ in 0..2000 {
            let c = Rgba::rgb(rng.gen(), rng.gen(), rng.gen());
            let back = Lab::from_rgba(c).to_rgba(c.a);
            assert!(within_one(c, back), "{c:?} came back as {back:?}");
        }
    }

    #[test]
    fn roundtrip_gamut_corners() {
        for r in [0u8, 255] {
            for g in [0u8, 255] {
                for b in [0u8, 255] {
                    let c = Rgba::rgb(r, g, b);
                    assert!(within_one(c, Lab::from_rgba(c).to_rgba(1.0)));
                }
            }
        }
    }

    #[test]
    fn white_and_black_have_extreme_lightness() {
        let white = Lab::from_rgba(Rgba::rgb(255, 255, 255));
        let black = Lab::from_rgba(Rgba::rgb(0, 0, 0));
        assert!((white.l - 100.0).abs() < 0.01);
        assert!(white.a.abs() < 0.01 && white.b.abs() < 0.01);
        assert!(black.l.abs() < 0.01);
    }

    #[test]
    fn perceptual_mix_endpoints_and_midpoint() {
        let a = Rgba::rgb(20, 40, 200);
        let b = Rgba::rgb(240, 200, 10).with_alpha(0.5);
        assert!(within_one(mix_perceptual(a, b, 0.0), a));
        assert!(within_one(mix_perceptual(a, b, 1.0), b));
        let mid = mix_perceptual(a, b, 0.5);
        assert!((mid.a - 0.75).abs() < 1e-12);
        let l_mid = Lab::from_rgba(mid).l;
        let expected = (Lab::from_rgba(a).l + Lab::from_rgba(b).l) / 2.0;
        assert!((l_mid - expected).abs() < 1.5, "midpoint lightness {l_mid} vs {expected}");
    }

    #[test]
    fn out_of_gamut_lab_is_clamped() {
        let c = Lab { l: 50.0, a: 200.0, b: -200.0 }.to_rgba(1.0);
        // Any u8 result is in range by construction; just make sure it is not black.
        assert!(c.r as u16 + c.g as u16 + c.b as u16 > 0);
    }
}
