use super::RegionDetector;
use crate::geometry::{ColorRange, Rectangle};
use image::{GrayImage, Luma, RgbaImage};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::Deserialize;

/// Default label attached to boxes found by the color tracker
pub const DEFAULT_COLOR_LABEL: &str = "white";

/// Grouping parameters for the color tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerOptions {
    /// Both sides of a box must be at least this many pixels
    pub min_dimension: u32,
    /// A group needs at least this many matching pixels
    pub min_group_size: u32,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            min_dimension: 20,
            min_group_size: 30,
        }
    }
}

/// Per-component pixel count and extent
#[derive(Debug, Clone, Copy)]
struct ComponentStats {
    area: u32,
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl ComponentStats {
    fn new(x: u32, y: u32) -> Self {
        Self {
            area: 0,
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.area += 1;
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Groups 8-connected pixels matching a color range into bounding boxes
#[derive(Debug, Clone)]
pub struct ColorTracker {
    label: String,
    options: TrackerOptions,
}

impl Default for ColorTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COLOR_LABEL, TrackerOptions::default())
    }
}

impl ColorTracker {
    pub fn new(label: impl Into<String>, options: TrackerOptions) -> Self {
        Self {
            label: label.into(),
            options,
        }
    }

    fn mask(image: &RgbaImage, range: &ColorRange) -> GrayImage {
        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            if range.contains(r, g, b) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    /// Bounding stats per component, in raster order of each component's first pixel
    fn components(mask: &GrayImage) -> Vec<ComponentStats> {
        let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

        let mut stats: Vec<Option<ComponentStats>> = Vec::new();
        let mut order = Vec::new();
        for (x, y, pixel) in labels.enumerate_pixels() {
            let label = pixel.0[0] as usize;
            if label == 0 {
                continue;
            }
            if label >= stats.len() {
                stats.resize(label + 1, None);
            }
            let entry = stats[label].get_or_insert_with(|| {
                order.push(label);
                ComponentStats::new(x, y)
            });
            entry.add(x, y);
        }

        order.into_iter().filter_map(|label| stats[label]).collect()
    }
}

/// Merge intersecting boxes until no two intersect, keeping first-seen order
fn merge_intersecting(mut rects: Vec<Rectangle>) -> Vec<Rectangle> {
    loop {
        let mut merged: Vec<Rectangle> = Vec::with_capacity(rects.len());
        let mut changed = false;

        for rect in rects {
            match merged.iter_mut().find(|m| m.intersects(&rect)) {
                Some(existing) => {
                    *existing = existing.union(&rect);
                    changed = true;
                }
                None => merged.push(rect),
            }
        }

        if !changed {
            return merged;
        }
        rects = merged;
    }
}

impl RegionDetector for ColorTracker {
    fn detect(&self, image: &RgbaImage, range: &ColorRange) -> Vec<Rectangle> {
        if image.width() == 0 || image.height() == 0 {
            return Vec::new();
        }

        let mask = Self::mask(image, range);
        let rects: Vec<Rectangle> = Self::components(&mask)
            .into_iter()
            .filter(|c| c.area >= self.options.min_group_size)
            .filter(|c| {
                c.width() >= self.options.min_dimension && c.height() >= self.options.min_dimension
            })
            .map(|c| {
                Rectangle::new(c.min_x as i32, c.min_y as i32, c.width(), c.height())
                    .with_color(self.label.clone())
            })
            .collect();

        merge_intersecting(rects)
    }
}
