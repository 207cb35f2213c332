//! Color space math: sRGB <-> CIE Lab, perceptual distance, nearest color.
//!
//! Lab conversion goes through the `palette` crate with the D65 reference
//! white. The perceptual distance is the CIE94 graphic-arts formula
//! (`kL = kC = kH = 1`), which weights chroma and hue differences by the
//! chroma of the first color. It is asymmetric; callers always pass the
//! pixel first and the candidate palette color second.

use std::fmt;
use std::str::FromStr;

use palette::white_point::D65;
use palette::{FromColor, LinSrgb, Srgb};
use serde::{Deserialize, Serialize};

/// An opaque 8-bit sRGB color.
///
/// Serializes as a lowercase `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Red channel.
    #[must_use]
    pub const fn r(self) -> u8 {
        self.0[0]
    }

    /// Green channel.
    #[must_use]
    pub const fn g(self) -> u8 {
        self.0[1]
    }

    /// Blue channel.
    #[must_use]
    pub const fn b(self) -> u8 {
        self.0[2]
    }

    /// Pack into `0x00RRGGBB`.
    #[must_use]
    pub const fn packed(self) -> u32 {
        ((self.0[0] as u32) << 16) | ((self.0[1] as u32) << 8) | self.0[2] as u32
    }

    /// Inverse of [`packed`](Self::packed); the top byte is ignored.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_packed(value: u32) -> Self {
        Self([(value >> 16) as u8, (value >> 8) as u8, value as u8])
    }

    /// Lowercase `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }

    /// Parse `#rrggbb` or `rrggbb`, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] when the input is not six hex digits.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        Ok(Self([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
    }

    /// Convert to CIE Lab.
    #[must_use]
    pub fn to_lab(self) -> Lab {
        rgb_to_lab(self)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

/// A string that is not a `#rrggbb` color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a #rrggbb color: {0:?}")]
pub struct ColorParseError(pub String);

/// A CIE L\*a\*b\* color relative to the D65 white point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    /// Lightness, 0 to 100.
    pub l: f64,
    /// Green-red axis.
    pub a: f64,
    /// Blue-yellow axis.
    pub b: f64,
}

impl Lab {
    /// Create a Lab color.
    #[must_use]
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Chroma (distance from the neutral axis).
    #[must_use]
    pub fn chroma(self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Plain Euclidean (CIE76) distance, used for cluster grouping.
    #[must_use]
    pub fn euclidean(self, other: Self) -> f64 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl.mul_add(dl, da.mul_add(da, db * db)).sqrt()
    }

    /// Coordinates as an array, for spatial indexing.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }
}

/// Convert an sRGB color to Lab (D65).
#[must_use]
pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    let srgb: Srgb<f64> = Srgb::new(rgb.r(), rgb.g(), rgb.b()).into_format();
    let lab = palette::Lab::<D65, f64>::from_color(srgb.into_linear());
    Lab::new(lab.l, lab.a, lab.b)
}

/// Convert a Lab color back to 8-bit sRGB, clamping out-of-gamut values.
#[must_use]
pub fn lab_to_rgb(lab: Lab) -> Rgb {
    let linear = LinSrgb::<f64>::from_color(palette::Lab::<D65, f64>::new(lab.l, lab.a, lab.b));
    let srgb = Srgb::<f64>::from_linear(linear);
    Rgb([
        unit_to_u8(srgb.red),
        unit_to_u8(srgb.green),
        unit_to_u8(srgb.blue),
    ])
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// CIE94 color difference between `reference` and `sample`.
///
/// `dL^2 + (dC / Sc)^2 + (dH / Sh)^2` under a square root, with
/// `Sc = 1 + 0.045 * C1` and `Sh = 1 + 0.015 * C1` where `C1` is the
/// chroma of `reference`.
#[must_use]
pub fn delta_e(reference: Lab, sample: Lab) -> f64 {
    let delta_l = reference.l - sample.l;
    let delta_a = reference.a - sample.a;
    let delta_b = reference.b - sample.b;
    let c1 = reference.chroma();
    let c2 = sample.chroma();
    let delta_c = c1 - c2;
    let delta_h_sq = delta_c.mul_add(-delta_c, delta_a.mul_add(delta_a, delta_b * delta_b));
    let delta_h = delta_h_sq.max(0.0).sqrt();
    let sc = 0.045f64.mul_add(c1, 1.0);
    let sh = 0.015f64.mul_add(c1, 1.0);
    let dc = delta_c / sc;
    let dh = delta_h / sh;
    delta_l
        .mul_add(delta_l, dc.mul_add(dc, dh * dh))
        .max(0.0)
        .sqrt()
}

/// Index of the candidate nearest to `sample` by [`delta_e`].
///
/// Ties resolve to the lowest index. Returns `None` when `candidates`
/// is empty.
#[must_use]
pub fn nearest(sample: Lab, candidates: &[Lab]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &candidate) in candidates.iter().enumerate() {
        let d = delta_e(sample, candidate);
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}
