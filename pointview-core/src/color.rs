//! Per-point colour types

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A linear RGB colour with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Pod, Zeroable)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
#[repr(C)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Colours aligned one-to-one with a [`crate::PointBuffer`]
pub type ColorBuffer = Vec<Rgb>;

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// Whether every component is finite and inside `[0, 1]`
    pub fn is_normalized(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| c.is_finite() && (0.0..=1.0).contains(c))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(color: Rgb) -> Self {
        color.to_array()
    }
}

/// View a colour buffer as the flat `[r0, g0, b0, r1, ...]` slice a vertex
/// attribute upload expects
pub fn flat_colors(colors: &[Rgb]) -> &[f32] {
    bytemuck::cast_slice(colors)
}
