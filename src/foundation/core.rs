use std::{fmt, str::FromStr};

use crate::foundation::error::{MemeError, MemeResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> MemeResult<Self> {
        if width == 0 || height == 0 {
            return Err(MemeError::validation("canvas width/height must be non-zero"));
        }
        Ok(Self { width, height })
    }

    pub fn center_x(self) -> f32 {
        self.width as f32 / 2.0
    }

    pub fn pixel_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
        }
    }
}

/// Vertical anchor of the caption block.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    #[default]
    Top,
    Center,
    Bottom,
}

impl FromStr for TextPosition {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "center" | "middle" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            other => Err(MemeError::validation(format!(
                "unknown text position \"{other}\" (expected top, center or bottom)"
            ))),
        }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
        })
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::opaque(255, 255, 255);
    pub const BLACK: Self = Self::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Rgba8 {
    type Err = MemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_color(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse `#RRGGBB`, `#RRGGBBAA` or one of a handful of CSS color names.
pub fn parse_color(s: &str) -> MemeResult<Rgba8> {
    let s = s.trim();
    let named = match s.to_ascii_lowercase().as_str() {
        "white" => Some(Rgba8::WHITE),
        "black" => Some(Rgba8::BLACK),
        "red" => Some(Rgba8::opaque(255, 0, 0)),
        "green" => Some(Rgba8::opaque(0, 128, 0)),
        "blue" => Some(Rgba8::opaque(0, 0, 255)),
        "yellow" => Some(Rgba8::opaque(255, 255, 0)),
        "orange" => Some(Rgba8::opaque(255, 165, 0)),
        "pink" => Some(Rgba8::opaque(255, 192, 203)),
        "purple" => Some(Rgba8::opaque(128, 0, 128)),
        "gray" | "grey" => Some(Rgba8::opaque(128, 128, 128)),
        _ => None,
    };
    if let Some(c) = named {
        return Ok(c);
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if !hex.is_ascii() {
        return Err(MemeError::validation(format!("invalid color \"{s}\"")));
    }

    fn hex_byte(pair: &str) -> MemeResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| MemeError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    match hex.len() {
        6 => Ok(Rgba8::opaque(
            hex_byte(&hex[0..2])?,
            hex_byte(&hex[2..4])?,
            hex_byte(&hex[4..6])?,
        )),
        8 => Ok(Rgba8 {
            r: hex_byte(&hex[0..2])?,
            g: hex_byte(&hex[2..4])?,
            b: hex_byte(&hex[4..6])?,
            a: hex_byte(&hex[6..8])?,
        }),
        _ => Err(MemeError::validation(
            "color must be a name or #RRGGBB / #RRGGBBAA (case-insensitive)",
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
