//! Pixel-space primitives shared by the tracker, resolver and crop step

use serde::{Deserialize, Serialize};

/// Inclusive per-channel bounds defining a color-match predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    #[serde(rename = "minR")]
    pub min_r: u8,
    #[serde(rename = "maxR")]
    pub max_r: u8,
    #[serde(rename = "minG")]
    pub min_g: u8,
    #[serde(rename = "maxG")]
    pub max_g: u8,
    #[serde(rename = "minB")]
    pub min_b: u8,
    #[serde(rename = "maxB")]
    pub max_b: u8,
}

impl Default for ColorRange {
    /// Near-white: every channel in 80..=255
    fn default() -> Self {
        Self {
            min_r: 80,
            max_r: 255,
            min_g: 80,
            max_g: 255,
            min_b: 80,
            max_b: 255,
        }
    }
}

impl ColorRange {
    /// True when the color lies inside the range on all three channels
    pub fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        (self.min_r..=self.max_r).contains(&r)
            && (self.min_g..=self.max_g).contains(&g)
            && (self.min_b..=self.max_b).contains(&b)
    }
}

/// Axis-aligned bounding box in pixel coordinates
///
/// `x`/`y` are signed because padding may push a synthesized region past the
/// top or left edge of the image; cropping clamps it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Label of the color that produced this box, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Inclusive point test against the box edges
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        let (x, y) = (x as i64, y as i64);
        self.x as i64 <= x && x <= self.right() && self.y as i64 <= y && y <= self.bottom()
    }

    /// One-sided containment: is `other`'s top-left corner inside this box?
    pub fn contains_corner_of(&self, other: &Rectangle) -> bool {
        self.contains_point(other.x, other.y)
    }

    pub fn intersects(&self, other: &Rectangle) -> bool {
        (self.x as i64) <= other.right()
            && (other.x as i64) <= self.right()
            && (self.y as i64) <= other.bottom()
            && (other.y as i64) <= self.bottom()
    }

    /// Smallest box covering both; keeps this box's color label
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rectangle {
            x,
            y,
            width: (right - x as i64) as u32,
            height: (bottom - y as i64) as u32,
            color: self.color.clone(),
        }
    }

    /// Clamp to an image of the given size, returning `None` when nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let x0 = (self.x as i64).clamp(0, width as i64);
        let y0 = (self.y as i64).clamp(0, height as i64);
        let x1 = self.right().clamp(0, width as i64);
        let y1 = self.bottom().clamp(0, height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
    }
}
