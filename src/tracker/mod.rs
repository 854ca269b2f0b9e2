//! Region tracking
//!
//! A detector turns one scan of a pixel buffer into zero or more boxes. A
//! [`TrackingPass`] accumulates boxes across scans, dropping any box whose
//! top-left corner falls inside an already-accepted one, and resolves on the
//! first scan that reports at least one box. Empty scans keep the pass pending.

pub mod color;

pub use color::{ColorTracker, TrackerOptions};

use crate::geometry::{ColorRange, Rectangle};
use image::RgbaImage;

/// Connected-region detection capability: pixels x color predicate -> boxes
pub trait RegionDetector: Send + Sync {
    /// Run one scan over the image, reporting every matching region
    fn detect(&self, image: &RgbaImage, range: &ColorRange) -> Vec<Rectangle>;
}

/// Outcome of feeding one scan event into a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// No non-empty scan seen yet
    Pending,
    /// A non-empty scan arrived; later events are ignored
    Resolved,
}

/// Accumulator for a single tracking pass
#[derive(Debug, Default)]
pub struct TrackingPass {
    rects: Vec<Rectangle>,
    resolved: bool,
}

impl TrackingPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PassState {
        if self.resolved {
            PassState::Resolved
        } else {
            PassState::Pending
        }
    }

    /// Feed one scan event into the pass
    pub fn observe(&mut self, boxes: Vec<Rectangle>) -> PassState {
        if self.resolved {
            return PassState::Resolved;
        }

        if boxes.is_empty() {
            tracing::debug!("Empty scan, tracking pass still pending");
            return PassState::Pending;
        }

        for rect in boxes {
            if self.rects.iter().any(|existing| existing.contains_corner_of(&rect)) {
                tracing::debug!(
                    "Dropping box at ({}, {}): corner inside an accepted box",
                    rect.x,
                    rect.y
                );
                continue;
            }
            self.rects.push(rect);
        }

        self.resolved = true;
        PassState::Resolved
    }

    /// Accepted boxes in discovery order
    pub fn rects(&self) -> &[Rectangle] {
        &self.rects
    }

    pub fn into_rects(self) -> Vec<Rectangle> {
        self.rects
    }

    /// Drive the pass over a stream of scan events until it resolves
    ///
    /// If the stream ends while the pass is still pending, the result is an
    /// empty list.
    pub fn run<I>(events: I) -> Vec<Rectangle>
    where
        I: IntoIterator<Item = Vec<Rectangle>>,
    {
        let mut pass = Self::new();
        for boxes in events {
            if pass.observe(boxes) == PassState::Resolved {
                return pass.into_rects();
            }
        }

        tracing::info!("Scan source exhausted without any region");
        Vec::new()
    }
}

/// Detect regions in a single still image
///
/// A still image is a one-scan source, so an image without matching regions
/// yields an empty list.
pub fn detect_regions(
    detector: &dyn RegionDetector,
    image: &RgbaImage,
    range: &ColorRange,
) -> Vec<Rectangle> {
    let boxes = detector.detect(image, range);
    tracing::debug!("Detector reported {} boxes", boxes.len());
    TrackingPass::run(std::iter::once(boxes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_first_scan_keeps_pass_pending() {
        let mut pass = TrackingPass::new();
        assert_eq!(pass.observe(vec![]), PassState::Pending);
        assert_eq!(pass.state(), PassState::Pending);

        let state = pass.observe(vec![Rectangle::new(1, 1, 5, 5)]);
        assert_eq!(state, PassState::Resolved);
        assert_eq!(pass.rects().len(), 1);
    }

    #[test]
    fn test_drops_box_with_corner_inside_accepted_box() {
        let mut pass = TrackingPass::new();
        pass.observe(vec![
            Rectangle::new(0, 0, 50, 50),
            Rectangle::new(10, 10, 100, 100),
            Rectangle::new(50, 50, 5, 5),
            Rectangle::new(60, 0, 10, 10),
        ]);

        assert_eq!(
            pass.into_rects(),
            vec![Rectangle::new(0, 0, 50, 50), Rectangle::new(60, 0, 10, 10)]
        );
    }

    #[test]
    fn test_partially_overlapping_box_is_admitted() {
        let mut pass = TrackingPass::new();
        pass.observe(vec![Rectangle::new(20, 20, 30, 30), Rectangle::new(10, 10, 30, 30)]);
        assert_eq!(pass.rects().len(), 2);
    }

    #[test]
    fn test_events_after_resolution_are_ignored() {
        let mut pass = TrackingPass::new();
        pass.observe(vec![Rectangle::new(0, 0, 10, 10)]);
        assert_eq!(pass.observe(vec![Rectangle::new(100, 100, 10, 10)]), PassState::Resolved);
        assert_eq!(pass.rects().len(), 1);
    }

    #[test]
    fn test_run_waits_for_first_non_empty_scan() {
        let events = vec![
            vec![],
            vec![],
            vec![Rectangle::new(5, 5, 10, 10)],
            vec![Rectangle::new(100, 100, 10, 10)],
        ];
        assert_eq!(TrackingPass::run(events), vec![Rectangle::new(5, 5, 10, 10)]);
    }

    #[test]
    fn test_run_with_only_empty_scans_returns_nothing() {
        let events: Vec<Vec<Rectangle>> = vec![vec![], vec![]];
        assert!(TrackingPass::run(events).is_empty());
    }

    #[test]
    fn test_accepted_corners_never_inside_each_other() {
        let boxes: Vec<Rectangle> = (0..40)
            .map(|i| Rectangle::new((i * 37) % 200, (i * 53) % 150, 10 + (i as u32 % 7) * 5, 12))
            .collect();
        let rects = TrackingPass::run(vec![boxes]);

        for (i, a) in rects.iter().enumerate() {
            for (j, b) in rects.iter().enumerate() {
                if i < j {
                    assert!(!a.contains_corner_of(b), "{:?} contains corner of {:?}", a, b);
                }
            }
        }
    }
}
