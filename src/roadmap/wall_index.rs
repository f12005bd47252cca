use crate::math::Point2;

use super::config_space::{Cell, ConfigSpace};

/// Default bucket edge length, in pixels.
const BUCKET_SIZE: usize = 16;

/// Spatial index over wall pixels: non-free cells next to a free cell.
///
/// Wall pixels are bucketed on a uniform grid; nearest-wall queries scan
/// rings of buckets outwards from the query position.
#[derive(Debug, Clone)]
pub struct WallIndex {
    bucket_size: f64,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<Point2>>,
    len: usize,
}

impl WallIndex {
    /// Collects the wall pixels of a configuration space.
    #[must_use]
    pub fn build(space: &ConfigSpace) -> Self {
        let mut index = Self::empty(space.width(), space.height(), BUCKET_SIZE);
        for y in 0..space.height() {
            for x in 0..space.width() {
                if is_wall(space, x, y) {
                    #[allow(clippy::cast_precision_loss)]
                    let p = Point2::new(x as f64, y as f64);
                    index.insert(p);
                }
            }
        }
        tracing::debug!(walls = index.len, "wall index built");
        index
    }

    fn empty(width: usize, height: usize, bucket_size: usize) -> Self {
        let cols = width.div_ceil(bucket_size).max(1);
        let rows = height.div_ceil(bucket_size).max(1);
        #[allow(clippy::cast_precision_loss)]
        let bucket_size = bucket_size as f64;
        Self {
            bucket_size,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
            len: 0,
        }
    }

    fn bucket_of(&self, p: &Point2) -> (usize, usize) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let clamp = |v: f64, n: usize| -> usize {
            let b = (v / self.bucket_size).floor();
            if b <= 0.0 {
                0
            } else {
                (b as usize).min(n - 1)
            }
        };
        (clamp(p.x, self.cols), clamp(p.y, self.rows))
    }

    fn insert(&mut self, p: Point2) {
        let (bx, by) = self.bucket_of(&p);
        self.buckets[by * self.cols + bx].push(p);
        self.len += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Closest wall pixel to `p` and its distance, both in pixels.
    #[must_use]
    pub fn nearest(&self, p: &Point2) -> Option<(Point2, f64)> {
        if self.is_empty() {
            return None;
        }
        let (cx, cy) = self.bucket_of(p);
        let mut best: Option<(Point2, f64)> = None;
        let max_ring = self.cols.max(self.rows);

        for ring in 0..=max_ring {
            for (bx, by) in ring_buckets(cx, cy, ring, self.cols, self.rows) {
                for w in &self.buckets[by * self.cols + bx] {
                    let d = (w - p).norm();
                    if best.is_none_or(|(_, bd)| d < bd) {
                        best = Some((*w, d));
                    }
                }
            }
            // Unvisited buckets are at least `ring` buckets away.
            #[allow(clippy::cast_precision_loss)]
            let bound = ring as f64 * self.bucket_size;
            if best.is_some_and(|(_, bd)| bd <= bound) {
                break;
            }
        }
        best
    }
}

fn is_wall(space: &ConfigSpace, x: usize, y: usize) -> bool {
    if space.cell(x, y).is_none_or(Cell::is_free) {
        return false;
    }
    #[allow(clippy::cast_possible_wrap)]
    let (x, y) = (x as i64, y as i64);
    [(1, 0), (-1, 0), (0, 1), (0, -1)]
        .iter()
        .any(|(dx, dy)| space.cell_signed(x + dx, y + dy) == Some(Cell::Free))
}

/// Buckets at Chebyshev distance `ring` from `(cx, cy)`, clipped to the grid.
fn ring_buckets(
    cx: usize,
    cy: usize,
    ring: usize,
    cols: usize,
    rows: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let x0 = cx.saturating_sub(ring);
    let x1 = (cx + ring).min(cols - 1);
    let y0 = cy.saturating_sub(ring);
    let y1 = (cy + ring).min(rows - 1);
    (y0..=y1).flat_map(move |by| {
        (x0..=x1).filter_map(move |bx| {
            let on_ring = bx.abs_diff(cx) == ring || by.abs_diff(cy) == ring;
            on_ring.then_some((bx, by))
        })
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hull::tests::lcg_points;
    use crate::math::Vector2;

    fn space_with_block() -> ConfigSpace {
        let mut space = ConfigSpace::filled(
            60,
            40,
            Point2::origin(),
            Vector2::new(1.0, 1.0),
            Cell::Free,
        );
        for y in 10..20 {
            for x in 30..45 {
                space.set_cell(x, y, Cell::Colliding);
            }
        }
        space
    }

    #[test]
    fn only_boundary_pixels_are_walls() {
        let index = WallIndex::build(&space_with_block());
        // Perimeter of a 15 x 10 block.
        assert_eq!(index.len(), 2 * 15 + 2 * 8);
        let (w, d) = index.nearest(&Point2::new(37.0, 2.0)).unwrap();
        assert!((w - Point2::new(37.0, 10.0)).norm() < 1e-12);
        assert!((d - 8.0).abs() < 1e-12);
    }

    #[test]
    fn nearest_matches_brute_force() {
        let space = space_with_block();
        let index = WallIndex::build(&space);
        let mut walls = Vec::new();
        for y in 0..space.height() {
            for x in 0..space.width() {
                if is_wall(&space, x, y) {
                    walls.push(Point2::new(x as f64, y as f64));
                }
            }
        }
        for q in lcg_points(50, 5, 80.0) {
            let q = q + Vector2::new(-10.0, -20.0);
            let (_, d) = index.nearest(&q).unwrap();
            let brute = walls.iter().map(|w| (w - q).norm()).fold(f64::INFINITY, f64::min);
            assert!((d - brute).abs() < 1e-9, "q={q:?} d={d} brute={brute}");
        }
    }

    #[test]
    fn free_space_has_no_walls() {
        let space = ConfigSpace::filled(8, 8, Point2::origin(), Vector2::new(1.0, 1.0), Cell::Free);
        let index = WallIndex::build(&space);
        assert!(index.is_empty());
        assert!(index.nearest(&Point2::new(1.0, 1.0)).is_none());
    }
}
