// SPDX-License-Identifier: PMPL-1.0-or-later
//! Axis-aligned rectangle shared by issue bounds, annotations, and text runs.
//!
//! Detection, deduplication, and link-text association all reason about the
//! same page coordinate space, so they share one rectangle type and one
//! overlap predicate.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether two rectangles overlap. Touching edges count as overlap;
    /// the test is the negation of axis disjointness.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x + self.width < other.x
            || other.x + other.width < self.x
            || self.y + self.height < other.y
            || other.y + other.height < self.y)
    }

    /// Smallest rectangle enclosing every rectangle in the iterator.
    /// Returns `None` for an empty iterator.
    pub fn enclosing<I: IntoIterator<Item = Rect>>(rects: I) -> Option<Rect> {
        let mut iter = rects.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x + first.width, first.y + first.height);

        for r in iter {
            min_x = min_x.min(r.x);
            min_y = min_y.min(r.y);
            max_x = max_x.max(r.x + r.width);
            max_y = max_y.max(r.y + r.height);
        }

        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }
}
