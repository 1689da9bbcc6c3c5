use cubeview_scene::{Color, Scene};
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("invalid color '{input}': expected #rrggbb")]
    InvalidColor { input: String },
    #[error("no cube at index {index}")]
    CubeOutOfRange { index: usize },
}

/// A single editable scene field: how to read its current value and how to
/// write a new one. Widgets edit a copy of the read value and only call
/// `write` when the copy actually changed.
pub trait FieldBinding {
    type Value;

    /// Current value, or `None` if the bound object is gone.
    fn read(&self, scene: &Scene) -> Option<Self::Value>;

    /// Apply a new value. Implementations may clamp it into range.
    fn write(&self, scene: &mut Scene, value: Self::Value) -> Result<(), PanelError>;
}

/// Binds one cube's material color.
#[derive(Debug, Clone, Copy)]
pub struct ColorField {
    pub cube: usize,
}

impl FieldBinding for ColorField {
    type Value = Color;

    fn read(&self, scene: &Scene) -> Option<Color> {
        scene.cube(self.cube).map(|c| c.material.color)
    }

    fn write(&self, scene: &mut Scene, value: Color) -> Result<(), PanelError> {
        let cube = scene
            .cube_mut(self.cube)
            .ok_or(PanelError::CubeOutOfRange { index: self.cube })?;
        cube.material.color = value;
        Ok(())
    }
}

/// Binds one cube's X scale, clamped to `[min, max]` on write.
#[derive(Debug, Clone, Copy)]
pub struct ScaleXField {
    pub cube: usize,
    pub min: f32,
    pub max: f32,
}

impl ScaleXField {
    pub fn range(&self) -> RangeInclusive<f32> {
        self.min..=self.max
    }
}

impl FieldBinding for ScaleXField {
    type Value = f32;

    fn read(&self, scene: &Scene) -> Option<f32> {
        scene.cube(self.cube).map(|c| c.transform.scale.x)
    }

    fn write(&self, scene: &mut Scene, value: f32) -> Result<(), PanelError> {
        let cube = scene
            .cube_mut(self.cube)
            .ok_or(PanelError::CubeOutOfRange { index: self.cube })?;
        cube.transform.scale.x = value.clamp(self.min, self.max);
        Ok(())
    }
}

/// Parse a `#rrggbb` string (the leading `#` is optional, case is not
/// significant) into a color.
pub fn parse_hex(input: &str) -> Result<Color, PanelError> {
    let invalid = || PanelError::InvalidColor {
        input: input.to_owned(),
    };
    let trimmed = input.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
    Ok(Color::from_hex_rgb(value))
}

/// Format a color as lowercase `#rrggbb`.
pub fn format_hex(color: Color) -> String {
    let [r, g, b] = color.to_srgb_u8();
    format!("#{r:02x}{g:02x}{b:02x}")
}
