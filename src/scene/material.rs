// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Material configuration and per-mesh material instances

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid material configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterialError {
    #[error("invalid color '{0}', expected #rgb, #rrggbb or a color name")]
    InvalidColor(String),
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Which faces are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Material parameters supplied with a conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub color: String,
    pub opacity: f64,
    pub metalness: f64,
    pub roughness: f64,
    pub wireframe: bool,
    pub transparent: bool,
    pub side: Side,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            color: "#00ff88".to_string(),
            opacity: 1.0,
            metalness: 0.1,
            roughness: 0.8,
            wireframe: false,
            transparent: false,
            side: Side::Front,
        }
    }
}

/// Linear RGB color with components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("lime", 0x00ff00),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("pink", 0xffc0cb),
    ("brown", 0xa52a2a),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("silver", 0xc0c0c0),
    ("gold", 0xffd700),
    ("navy", 0x000080),
    ("teal", 0x008080),
    ("maroon", 0x800000),
    ("olive", 0x808000),
];

impl Color {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
        }
    }

    pub fn from_hex_u32(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f64 / 255.0,
            ((hex >> 8) & 0xff) as f64 / 255.0,
            (hex & 0xff) as f64 / 255.0,
        )
    }

    /// Parse `#rrggbb`, `#rgb` or a CSS color name
    pub fn parse(value: &str) -> Result<Self, MaterialError> {
        let value = value.trim();
        let invalid = || MaterialError::InvalidColor(value.to_string());

        if let Some(hex) = value.strip_prefix('#') {
            let expanded: String = match hex.len() {
                3 => hex.chars().flat_map(|c| [c, c]).collect(),
                6 => hex.to_string(),
                _ => return Err(invalid()),
            };
            let bits = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
            return Ok(Self::from_hex_u32(bits));
        }

        let lower = value.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, hex)| Self::from_hex_u32(*hex))
            .ok_or_else(invalid)
    }

    pub fn to_hex(&self) -> String {
        let channel = |c: f64| (c * 255.0).round() as u8;
        format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        )
    }
}

/// A material instance owned by exactly one mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f64,
    pub metalness: f64,
    pub roughness: f64,
    pub wireframe: bool,
    pub transparent: bool,
    pub side: Side,
    disposed: bool,
}

impl Material {
    pub fn from_config(config: &MaterialConfig) -> Result<Self, MaterialError> {
        let unit = |field: &'static str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(value)
            } else {
                Err(MaterialError::OutOfRange { field, value })
            }
        };

        let opacity = unit("opacity", config.opacity)?;
        Ok(Self {
            color: Color::parse(&config.color)?,
            opacity,
            metalness: unit("metalness", config.metalness)?,
            roughness: unit("roughness", config.roughness)?,
            wireframe: config.wireframe,
            transparent: config.transparent || opacity < 1.0,
            side: config.side,
            disposed: false,
        })
    }

    /// Override the opacity; anything below 1 renders transparent
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = self.transparent || self.opacity < 1.0;
    }

    /// The configuration this material would be rebuilt from
    pub fn descriptor(&self) -> MaterialConfig {
        MaterialConfig {
            color: self.color.to_hex(),
            opacity: self.opacity,
            metalness: self.metalness,
            roughness: self.roughness,
            wireframe: self.wireframe,
            transparent: self.transparent,
            side: self.side,
        }
    }

    /// Release the material. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::from_hex_u32(0x00ff88),
            opacity: 1.0,
            metalness: 0.1,
            roughness: 0.8,
            wireframe: false,
            transparent: false,
            side: Side::Front,
            disposed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_material() {
        let config = MaterialConfig::default();
        let material = Material::from_config(&config).unwrap();
        assert_eq!(material.descriptor(), config);
        assert_eq!(material, Material::default());
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!(Color::parse("#f00").unwrap(), Color::new(1.0, 0.0, 0.0));
        assert_eq!(Color::parse("Red").unwrap().to_hex(), "#ff0000");
        assert_eq!(Color::parse("#00FF88").unwrap().to_hex(), "#00ff88");
        assert!(matches!(
            Color::parse("#12345"),
            Err(MaterialError::InvalidColor(_))
        ));
        assert!(Color::parse("not-a-color").is_err());
    }

    #[test]
    fn test_partial_opacity_forces_transparency() {
        let config = MaterialConfig {
            opacity: 0.5,
            ..Default::default()
        };
        let material = Material::from_config(&config).unwrap();
        assert!(material.transparent);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let config = MaterialConfig {
            roughness: 1.5,
            ..Default::default()
        };
        assert_eq!(
            Material::from_config(&config),
            Err(MaterialError::OutOfRange {
                field: "roughness",
                value: 1.5
            })
        );
    }

    #[test]
    fn test_side_serializes_lowercase() {
        let json = serde_json::to_string(&Side::Double).unwrap();
        assert_eq!(json, "\"double\"");
    }
}
