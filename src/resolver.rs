//! Inner-region resolution
//!
//! Finds two vertically aligned anchor boxes and synthesizes the region lying
//! horizontally between them, padded upward by a fixed margin.

use crate::geometry::Rectangle;

/// Vertical offsets are divided by this many pixels before comparing to the tolerance
pub const VERTICAL_SCALE_PX: f64 = 100.0;

/// Default alignment tolerance: anchors may differ by up to 20px in `y`
pub const DEFAULT_VERTICAL_TOLERANCE: f64 = 0.2;

/// Margin added around the synthesized region
pub const REGION_PADDING: i32 = 10;

/// Two boxes are aligned when `|dy| / VERTICAL_SCALE_PX <= tolerance`
///
/// The scale is absolute pixels, so the test does not adapt to image resolution.
fn aligned(a: &Rectangle, b: &Rectangle, tolerance: f64) -> bool {
    let dy = (a.y as f64 - b.y as f64).abs();
    dy / VERTICAL_SCALE_PX <= tolerance
}

fn same_origin(a: &Rectangle, b: &Rectangle) -> bool {
    a.x == b.x && a.y == b.y
}

/// Collect every box that found an aligned partner, in pairing order
///
/// Boxes are visited in order; each looks for the first other box that has a
/// different `x` and a different `y`, is not already paired, and is aligned
/// with it. Both are then appended. A box that was already taken as someone's
/// partner may still pair again, which appends it a second time.
pub fn pair_aligned(rects: &[Rectangle], tolerance: f64) -> Vec<Rectangle> {
    let mut paired: Vec<Rectangle> = Vec::new();

    for cur in rects {
        let partner = rects.iter().find(|r| {
            r.x != cur.x
                && r.y != cur.y
                && !paired.iter().any(|p| same_origin(p, r))
                && aligned(cur, r, tolerance)
        });

        if let Some(partner) = partner {
            tracing::debug!(
                "Paired box at ({}, {}) with box at ({}, {})",
                cur.x,
                cur.y,
                partner.x,
                partner.y
            );
            paired.push(cur.clone());
            paired.push(partner.clone());
        }
    }

    paired
}

/// Merge two anchors into the padded region between them
///
/// Horizontally the region spans the gap from the right edge of the left
/// anchor to the left edge of the right anchor (zero wide when they overlap).
/// Vertically it starts at the higher anchor and takes the taller height.
pub fn merge_between(a: &Rectangle, b: &Rectangle) -> Rectangle {
    let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };

    let x = left.right();
    let width = (right.x as i64 - x).max(0) as u32;
    let y = a.y.min(b.y);
    let height = a.height.max(b.height);

    Rectangle {
        x: x as i32,
        y: y - REGION_PADDING,
        width,
        height: height + REGION_PADDING as u32,
        color: left.color.clone(),
    }
}

/// Resolve the single region bracketed by two aligned anchors
///
/// Returns `None` unless pairing leaves exactly two boxes.
pub fn resolve_inner_region(rects: &[Rectangle], tolerance: f64) -> Option<Rectangle> {
    let paired = pair_aligned(rects, tolerance);

    match paired.as_slice() {
        [a, b] => {
            let region = merge_between(a, b);
            tracing::info!(
                "Resolved inner region x={} y={} {}x{}",
                region.x,
                region.y,
                region.width,
                region.height
            );
            Some(region)
        }
        _ => {
            tracing::info!(
                "No single inner region: {} boxes paired out of {}",
                paired.len(),
                rects.len()
            );
            None
        }
    }
}
