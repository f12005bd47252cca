//! Boundary extraction of the colliding regions of a configuration space.
//!
//! Boundaries follow the cracks between cells, so every contour vertex is a
//! cell corner at half-integer pixel coordinates. Each boundary is traced
//! with the non-free region on its left: outer boundaries come out
//! counter-clockwise and boundaries of enclosed free areas clockwise.
//! Non-free cells touching only diagonally belong to separate regions.

use std::collections::HashMap;

use crate::math::contour_2d::{contour_self_intersects, simplify_contour};
use crate::math::polygon_2d::{convex_split, signed_area_2d};
use crate::math::Point2;

use super::config_space::ConfigSpace;

type Corner = (i64, i64);
type Step = (i64, i64);

/// One unit boundary edge between a non-free and a free cell.
#[derive(Debug, Clone, Copy)]
struct Crack {
    from: Corner,
    dir: Step,
}

impl Crack {
    fn to(self) -> Corner {
        (self.from.0 + self.dir.0, self.from.1 + self.dir.1)
    }
}

fn left(d: Step) -> Step {
    (-d.1, d.0)
}

fn right(d: Step) -> Step {
    (d.1, -d.0)
}

#[allow(clippy::cast_precision_loss)]
fn corner_point(c: Corner) -> Point2 {
    Point2::new(c.0 as f64 - 0.5, c.1 as f64 - 0.5)
}

fn cracks(space: &ConfigSpace) -> Vec<Crack> {
    let blocked = |x: i64, y: i64| space.cell_signed(x, y).is_some_and(|c| !c.is_free());
    let mut out = Vec::new();
    #[allow(clippy::cast_possible_wrap)]
    let (w, h) = (space.width() as i64, space.height() as i64);
    for y in 0..h {
        for x in 0..w {
            if !blocked(x, y) {
                continue;
            }
            if !blocked(x, y - 1) {
                out.push(Crack { from: (x, y), dir: (1, 0) });
            }
            if !blocked(x + 1, y) {
                out.push(Crack { from: (x + 1, y), dir: (0, 1) });
            }
            if !blocked(x, y + 1) {
                out.push(Crack { from: (x + 1, y + 1), dir: (-1, 0) });
            }
            if !blocked(x - 1, y) {
                out.push(Crack { from: (x, y + 1), dir: (0, -1) });
            }
        }
    }
    out
}

/// Traces the boundaries of all non-free regions as closed polygons in
/// pixel coordinates, without collinear vertices.
#[must_use]
pub fn trace_contours(space: &ConfigSpace) -> Vec<Vec<Point2>> {
    let cracks = cracks(space);
    let mut outgoing: HashMap<Corner, Vec<usize>> = HashMap::new();
    for (i, c) in cracks.iter().enumerate() {
        outgoing.entry(c.from).or_default().push(i);
    }

    // At a corner shared by two regions, turning left keeps them apart.
    let follow = |crack: Crack| -> Option<usize> {
        let candidates = outgoing.get(&crack.to())?;
        [left(crack.dir), crack.dir, right(crack.dir)]
            .into_iter()
            .find_map(|d| candidates.iter().copied().find(|&c| cracks[c].dir == d))
    };

    let mut used = vec![false; cracks.len()];
    let mut contours = Vec::new();
    for start in 0..cracks.len() {
        if used[start] {
            continue;
        }
        let mut steps: Vec<Crack> = Vec::new();
        let mut current = start;
        loop {
            used[current] = true;
            steps.push(cracks[current]);
            match follow(cracks[current]) {
                Some(next) if next != start && !used[next] => current = next,
                _ => break,
            }
        }

        let n = steps.len();
        let contour: Vec<Point2> = (0..n)
            .filter(|&i| steps[i].dir != steps[(i + n - 1) % n].dir)
            .map(|i| corner_point(steps[i].from))
            .collect();
        if contour.len() >= 3 {
            contours.push(contour);
        }
    }
    contours
}

/// Parameters of contour extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourParams {
    pub simplify: bool,
    /// Maximum extent of a removed staircase, in pixels.
    pub min_dist: f64,
    /// Turning angle below which a vertex is collinear, in radians.
    pub eps_angular: f64,
    /// Split outer boundaries into convex parts.
    pub convex_split: bool,
    pub eps: f64,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            simplify: true,
            min_dist: 3.0,
            eps_angular: 1e-3_f64.to_radians(),
            convex_split: false,
            eps: 1e-6,
        }
    }
}

/// Traced and post-processed boundaries.
#[derive(Debug, Clone, Default)]
pub struct Contours {
    /// Boundaries as traced.
    pub full: Vec<Vec<Point2>>,
    /// Simplified and optionally split boundaries used for line segments.
    pub simplified: Vec<Vec<Point2>>,
}

/// Extracts the obstacle boundaries of a configuration space.
#[derive(Debug, Clone, Default)]
pub struct ExtractContours {
    params: ContourParams,
}

impl ExtractContours {
    #[must_use]
    pub fn new(params: ContourParams) -> Self {
        Self { params }
    }

    /// Traces, simplifies and splits the boundaries.
    ///
    /// `progress` receives the completed fraction after each of the three
    /// passes; returning `false` stops and yields `None`.
    #[must_use]
    pub fn execute(
        &self,
        space: &ConfigSpace,
        progress: &mut dyn FnMut(f64) -> bool,
    ) -> Option<Contours> {
        if !progress(0.0) {
            return None;
        }
        let full = trace_contours(space);
        if !progress(1.0 / 3.0) {
            return None;
        }

        let mut simplified: Vec<Vec<Point2>> = full.iter().map(|c| self.simplify(c)).collect();
        if !progress(2.0 / 3.0) {
            return None;
        }

        if self.params.convex_split {
            simplified = simplified
                .into_iter()
                .flat_map(|c| {
                    // Enclosed free areas keep their boundary.
                    if signed_area_2d(&c) <= 0.0 {
                        return vec![c];
                    }
                    let parts = convex_split(&c, self.params.eps);
                    if parts.is_empty() {
                        vec![c]
                    } else {
                        parts
                    }
                })
                .collect();
        }
        if !progress(1.0) {
            return None;
        }

        tracing::debug!(
            contours = full.len(),
            polygons = simplified.len(),
            vertices = simplified.iter().map(Vec::len).sum::<usize>(),
            "wall contours extracted"
        );
        Some(Contours { full, simplified })
    }

    fn simplify(&self, contour: &[Point2]) -> Vec<Point2> {
        if !self.params.simplify {
            return contour.to_vec();
        }
        let mut out = contour.to_vec();
        simplify_contour(&mut out, self.params.min_dist, self.params.eps_angular);
        if out.len() < 3 || contour_self_intersects(&out) {
            tracing::warn!(
                vertices = contour.len(),
                "simplified contour is not simple, keeping the traced one"
            );
            return contour.to_vec();
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::point_in_polygon;
    use crate::math::Vector2;
    use crate::roadmap::config_space::Cell;

    fn space(width: usize, height: usize, blocked: &[(usize, usize)]) -> ConfigSpace {
        let mut s = ConfigSpace::filled(width, height, Point2::origin(), Vector2::new(1.0, 1.0), Cell::Free);
        for &(x, y) in blocked {
            s.set_cell(x, y, Cell::Colliding);
        }
        s
    }

    fn block(x0: usize, x1: usize, y0: usize, y1: usize) -> Vec<(usize, usize)> {
        (y0..y1).flat_map(|y| (x0..x1).map(move |x| (x, y))).collect()
    }

    #[test]
    fn rectangle_gives_one_counter_clockwise_contour() {
        let s = space(12, 10, &block(3, 7, 2, 5));
        let contours = trace_contours(&s);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.len(), 4);
        // 4 x 3 cells.
        assert!((signed_area_2d(c) - 12.0).abs() < 1e-12);
        assert!(c.contains(&Point2::new(2.5, 1.5)));
        assert!(c.contains(&Point2::new(6.5, 4.5)));
    }

    #[test]
    fn ring_has_outer_and_hole_boundary() {
        let mut cells = block(2, 8, 2, 8);
        cells.retain(|&(x, y)| !(4..6).contains(&x) || !(4..6).contains(&y));
        let s = space(10, 10, &cells);
        let contours = trace_contours(&s);
        assert_eq!(contours.len(), 2);
        let mut areas: Vec<f64> = contours.iter().map(|c| signed_area_2d(c)).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] + 4.0).abs() < 1e-12, "{areas:?}");
        assert!((areas[1] - 36.0).abs() < 1e-12, "{areas:?}");
    }

    #[test]
    fn diagonal_neighbours_are_separate_regions() {
        let s = space(6, 6, &[(2, 2), (3, 3)]);
        let contours = trace_contours(&s);
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| (signed_area_2d(c) - 1.0).abs() < 1e-12));
    }

    #[test]
    fn border_touching_region_is_closed() {
        let s = space(8, 8, &block(0, 3, 0, 8));
        let contours = trace_contours(&s);
        assert_eq!(contours.len(), 1);
        assert!((signed_area_2d(&contours[0]) - 24.0).abs() < 1e-12);
    }

    #[test]
    fn staircase_is_simplified() {
        // Lower-left triangle of a 12 x 12 block.
        let cells: Vec<(usize, usize)> = block(2, 14, 2, 14)
            .into_iter()
            .filter(|&(x, y)| x <= y)
            .collect();
        let s = space(16, 16, &cells);
        let contours = ExtractContours::default()
            .execute(&s, &mut |_| true)
            .unwrap();
        assert_eq!(contours.full.len(), 1);
        let (full, simple) = (&contours.full[0], &contours.simplified[0]);
        assert!(simple.len() < full.len(), "{} vs {}", simple.len(), full.len());
        assert!(!contour_self_intersects(simple));
        assert!(point_in_polygon(simple, &Point2::new(4.0, 10.0)));
    }

    #[test]
    fn convex_split_leaves_holes_alone() {
        let mut cells = block(2, 10, 2, 4);
        cells.extend(block(2, 4, 4, 10));
        let s = space(12, 12, &cells);
        let params = ContourParams {
            convex_split: true,
            ..ContourParams::default()
        };
        let contours = ExtractContours::new(params).execute(&s, &mut |_| true).unwrap();
        assert_eq!(contours.full.len(), 1);
        assert_eq!(contours.simplified.len(), 2);
        let total: f64 = contours.simplified.iter().map(|c| signed_area_2d(c)).sum();
        assert!((total - 28.0).abs() < 1e-9, "total={total}");
    }

    #[test]
    fn progress_can_stop_extraction() {
        let s = space(6, 6, &[(2, 2)]);
        let mut seen = Vec::new();
        let result = ExtractContours::default().execute(&s, &mut |f| {
            seen.push(f);
            f < 0.5
        });
        assert!(result.is_none());
        assert_eq!(seen.len(), 3);
    }
}
