use crate::geometry::LineSegment;
use crate::math::Point2;

/// Line segments handed to the Voronoi construction.
#[derive(Debug, Clone, Default)]
pub struct SegmentArrangement {
    pub segments: Vec<LineSegment>,
    /// Half-open index range into `segments` per group.
    pub groups: Vec<(usize, usize)>,
    /// Closed outline of every contour, border edges included.
    pub polygons: Vec<Vec<Point2>>,
}

impl SegmentArrangement {
    /// Segments of group `group`.
    #[must_use]
    pub fn group(&self, group: usize) -> &[LineSegment] {
        self.groups
            .get(group)
            .map_or(&[], |&(start, end)| &self.segments[start..end])
    }
}

/// Converts closed contours in pixel coordinates into grouped line segments
/// and closes the grid of `width * height` cells with a frame.
///
/// Every contour is one group. Contour edges running along the grid border
/// are covered by the frame and left out of the segments, but the contours
/// themselves are kept whole as obstacle polygons. Each frame side is a group
/// of its own, so bisectors between opposite sides of an empty grid survive.
#[must_use]
pub fn arrange_segments(
    contours: &[Vec<Point2>],
    width: usize,
    height: usize,
    eps: f64,
) -> SegmentArrangement {
    #[allow(clippy::cast_precision_loss)]
    let (lo, hi) = (
        Point2::new(-0.5, -0.5),
        Point2::new(width as f64 - 0.5, height as f64 - 0.5),
    );
    let on_border = |a: &Point2, b: &Point2| {
        [lo.x, hi.x]
            .iter()
            .any(|x| (a.x - x).abs() <= eps && (b.x - x).abs() <= eps)
            || [lo.y, hi.y]
                .iter()
                .any(|y| (a.y - y).abs() <= eps && (b.y - y).abs() <= eps)
    };

    let mut out = SegmentArrangement::default();
    for contour in contours {
        let n = contour.len();
        if n < 2 {
            continue;
        }
        if n >= 3 {
            out.polygons.push(contour.clone());
        }
        let group = out.groups.len();
        let start = out.segments.len();
        for i in 0..n {
            let (a, b) = (contour[i], contour[(i + 1) % n]);
            if (b - a).norm() <= eps || on_border(&a, &b) {
                continue;
            }
            out.segments.push(LineSegment::new(a, b).with_group(group));
        }
        if out.segments.len() > start {
            out.groups.push((start, out.segments.len()));
        }
    }

    let frame = [
        lo,
        Point2::new(hi.x, lo.y),
        hi,
        Point2::new(lo.x, hi.y),
    ];
    for i in 0..4 {
        let group = out.groups.len();
        let start = out.segments.len();
        out.segments
            .push(LineSegment::new(frame[i], frame[(i + 1) % 4]).with_group(group));
        out.groups.push((start, start + 1));
    }

    tracing::debug!(
        segments = out.segments.len(),
        groups = out.groups.len(),
        "line segments arranged"
    );
    out
}
