use crate::math::distance_2d::{closest_point_on_segment, point_to_segment_dist};
use crate::math::{Point2, Vector2};

/// A directed line segment, optionally tagged with the obstacle group it bounds.
///
/// Bisectors between two segments of the same group lie inside that obstacle
/// and are dropped from the roadmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Point2,
    pub end: Point2,
    pub group: Option<usize>,
}

impl LineSegment {
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self {
            start,
            end,
            group: None,
        }
    }

    /// Tags the segment with an obstacle group.
    #[must_use]
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn direction(&self) -> Vector2 {
        self.end - self.start
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Evaluates `start + t * (end - start)`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.start + self.direction() * t
    }

    #[must_use]
    pub fn midpoint(&self) -> Point2 {
        self.point_at(0.5)
    }

    #[must_use]
    pub fn distance_to(&self, p: &Point2) -> f64 {
        point_to_segment_dist(p, &self.start, &self.end)
    }

    #[must_use]
    pub fn closest_point(&self, p: &Point2) -> Point2 {
        closest_point_on_segment(p, &self.start, &self.end)
    }

    /// Returns the same segment with start and end swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            group: self.group,
        }
    }
}
