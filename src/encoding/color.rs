//! RGBA colors with CSS name/hex parsing and CIE Lab conversion.
//!
//! Lab conversion uses the D65 reference white and the sRGB matrices common
//! to web color-scale libraries, so interpolated swatches match what a
//! browser-based map would show for the same scale.

use crate::{MapError, Result};
use fxhash::FxHashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// D65 reference white
const XN: f64 = 0.950470;
const YN: f64 = 1.0;
const ZN: f64 = 1.088830;

const T0: f64 = 4.0 / 29.0;
const T1: f64 = 6.0 / 29.0;
const T2: f64 = 3.0 * T1 * T1;
const T3: f64 = T1 * T1 * T1;

static NAMED_COLORS: Lazy<FxHashMap<&'static str, [u8; 3]>> = Lazy::new(|| {
    [
        ("black", [0, 0, 0]),
        ("white", [255, 255, 255]),
        ("gray", [128, 128, 128]),
        ("grey", [128, 128, 128]),
        ("silver", [192, 192, 192]),
        ("red", [255, 0, 0]),
        ("darkred", [139, 0, 0]),
        ("maroon", [128, 0, 0]),
        ("orange", [255, 165, 0]),
        ("darkorange", [255, 140, 0]),
        ("orangered", [255, 69, 0]),
        ("gold", [255, 215, 0]),
        ("yellow", [255, 255, 0]),
        ("olive", [128, 128, 0]),
        ("lime", [0, 255, 0]),
        ("green", [0, 128, 0]),
        ("darkgreen", [0, 100, 0]),
        ("limegreen", [50, 205, 50]),
        ("yellowgreen", [154, 205, 50]),
        ("teal", [0, 128, 128]),
        ("cyan", [0, 255, 255]),
        ("aqua", [0, 255, 255]),
        ("blue", [0, 0, 255]),
        ("navy", [0, 0, 128]),
        ("steelblue", [70, 130, 180]),
        ("purple", [128, 0, 128]),
        ("magenta", [255, 0, 255]),
        ("fuchsia", [255, 0, 255]),
        ("pink", [255, 192, 203]),
        ("brown", [165, 42, 42]),
        ("tan", [210, 180, 140]),
    ]
    .into_iter()
    .collect()
});

/// An sRGB color with straight (unpremultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Applies an opacity in `[0, 1]` to the alpha channel
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.with_alpha(a)
    }

    /// Looks up a CSS color keyword
    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS
            .get(name.trim().to_ascii_lowercase().as_str())
            .map(|[r, g, b]| Self::rgb(*r, *g, *b))
    }

    /// Parses `#rgb`, `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || MapError::InvalidColor(hex.to_string());

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match digits.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (slot, ch) in rgb.iter_mut().zip(digits.chars()) {
                    let v = ch.to_digit(16).ok_or_else(invalid)? as u8;
                    *slot = v * 17;
                }
                Ok(Self::rgb(rgb[0], rgb[1], rgb[2]))
            }
            6 | 8 if digits.is_ascii() => {
                let r = channel(&digits[0..2])?;
                let g = channel(&digits[2..4])?;
                let b = channel(&digits[4..6])?;
                let a = if digits.len() == 8 {
                    channel(&digits[6..8])?
                } else {
                    255
                };
                Ok(Self::rgba(r, g, b, a))
            }
            _ => Err(invalid()),
        }
    }

    /// Lowercase `#rrggbb`; alpha is appended only when not opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// CIE L*a*b* coordinates of the color (alpha ignored)
    pub fn to_lab(&self) -> [f64; 3] {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);

        let x = xyz_to_lab((0.4124564 * r + 0.3575761 * g + 0.1804375 * b) / XN);
        let y = xyz_to_lab((0.2126729 * r + 0.7151522 * g + 0.0721750 * b) / YN);
        let z = xyz_to_lab((0.0193339 * r + 0.1191920 * g + 0.9503041 * b) / ZN);

        let l = 116.0 * y - 16.0;
        [l.max(0.0), 500.0 * (x - y), 200.0 * (y - z)]
    }

    /// Converts L*a*b* back to an opaque sRGB color, clipping out-of-gamut channels
    pub fn from_lab(lab: [f64; 3]) -> Self {
        let [l, a, b] = lab;
        let y = (l + 16.0) / 116.0;
        let x = y + a / 500.0;
        let z = y - b / 200.0;

        let x = XN * lab_to_xyz(x);
        let y = YN * lab_to_xyz(y);
        let z = ZN * lab_to_xyz(z);

        let r = linear_to_srgb(3.2404542 * x - 1.5371385 * y - 0.4985314 * z);
        let g = linear_to_srgb(-0.9692660 * x + 1.8760108 * y + 0.0415560 * z);
        let b = linear_to_srgb(0.0556434 * x - 0.2040259 * y + 1.0572252 * z);

        Self::rgb(clip_channel(r), clip_channel(g), clip_channel(b))
    }

    /// Straight per-channel interpolation
    pub fn lerp_rgb(&self, other: &Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| clip_channel(a as f64 + (b as f64 - a as f64) * t);
        Color::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }

    /// Perceptual interpolation through Lab space
    pub fn lerp_lab(&self, other: &Color, t: f64) -> Color {
        // Endpoints are returned as-is so anchors survive the Lab round trip
        if t <= 0.0 {
            return *self;
        }
        if t >= 1.0 {
            return *other;
        }
        let from = self.to_lab();
        let to = other.to_lab();
        let mixed = [
            from[0] + (to[0] - from[0]) * t,
            from[1] + (to[1] - from[1]) * t,
            from[2] + (to[2] - from[2]) * t,
        ];
        let alpha = clip_channel(self.a as f64 + (other.a as f64 - self.a as f64) * t);
        Color::from_lab(mixed).with_alpha(alpha)
    }
}

impl FromStr for Color {
    type Err = MapError;

    /// Accepts a CSS keyword or a hex string
    fn from_str(s: &str) -> Result<Self> {
        if s.trim_start().starts_with('#') {
            Self::from_hex(s)
        } else {
            Self::named(s).ok_or_else(|| MapError::InvalidColor(s.to_string()))
        }
    }
}

impl TryFrom<String> for Color {
    type Error = MapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(feature = "egui")]
impl From<Color> for egui::Color32 {
    fn from(color: Color) -> Self {
        egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

fn srgb_to_linear(channel: u8) -> f64 {
    let c = channel as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    255.0
        * if c <= 0.00304 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
}

fn xyz_to_lab(t: f64) -> f64 {
    if t > T3 {
        t.cbrt()
    } else {
        t / T2 + T0
    }
}

fn lab_to_xyz(t: f64) -> f64 {
    if t > T1 {
        t * t * t
    } else {
        T2 * (t - T0)
    }
}

fn clip_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
