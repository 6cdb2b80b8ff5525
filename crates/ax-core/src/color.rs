use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Couleur RGB normalisée, canaux dans [0.0, 1.0].
///
/// Sérialisée en TOML sous forme hexadécimale `#rrggbb`.
///
/// # Example
/// ```
/// use ax_core::color::Rgb;
/// let c: Rgb = "#ff8000".parse().unwrap();
/// assert_eq!(c.r, 1.0);
/// assert_eq!(c.b, 0.0);
/// assert_eq!(c.to_hex(), "#ff8000");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
}

/// Couleur RGBA normalisée, sortie du pass et des samplers.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Rgb {
    /// Black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    /// White.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    /// Build from normalized channels.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build from 8-bit channels.
    #[must_use]
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(unit(r), unit(g), unit(b))
    }

    /// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the string is not a valid hex color.
    ///
    /// # Example
    /// ```
    /// use ax_core::color::Rgb;
    /// assert_eq!(Rgb::from_hex("#fff").unwrap(), Rgb::WHITE);
    /// assert!(Rgb::from_hex("#12345").is_err());
    /// ```
    pub fn from_hex(hex: &str) -> Result<Self, CoreError> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || CoreError::Config(format!("couleur hex invalide : '{hex}'"));
        if !digits.is_ascii() {
            return Err(invalid());
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };

        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::from_u8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Format as `#rrggbb`.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b)
        )
    }

    /// Multiply every channel by `k`.
    #[inline(always)]
    #[must_use]
    pub fn scale(self, k: f32) -> Self {
        Self::new(self.r * k, self.g * k, self.b * k)
    }

    /// GLSL `mix`: `self * (1 - t) + other * t`, exact at both endpoints.
    #[inline(always)]
    #[must_use]
    pub fn mix(self, other: Self, t: f32) -> Self {
        let k = 1.0 - t;
        Self::new(
            self.r * k + other.r * t,
            self.g * k + other.g * t,
            self.b * k + other.b * t,
        )
    }

    /// Attach an alpha channel.
    #[inline(always)]
    #[must_use]
    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}

impl Rgba {
    /// Build from normalized channels.
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from an 8-bit RGBA texel.
    #[inline(always)]
    #[must_use]
    pub fn from_u8(px: [u8; 4]) -> Self {
        Self::new(unit(px[0]), unit(px[1]), unit(px[2]), unit(px[3]))
    }

    /// Quantize to an 8-bit RGBA texel (`round(clamp(v) * 255)`).
    #[inline(always)]
    #[must_use]
    pub fn to_u8(&self) -> [u8; 4] {
        [to_u8(self.r), to_u8(self.g), to_u8(self.b), to_u8(self.a)]
    }

    /// Drop alpha.
    #[inline(always)]
    #[must_use]
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Component-wise `a + (b - a) * t`.
    #[inline(always)]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

impl FromStr for Rgb {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[inline(always)]
fn unit(c: u8) -> f32 {
    f32::from(c) / 255.0
}

#[inline(always)]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
