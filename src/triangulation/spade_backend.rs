use std::collections::HashMap;

use spade::{DelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation as _};

use crate::error::{Result, VoronoiError};
use crate::math::Point2;

use super::Triangulation;

/// Delaunay triangulation backed by `spade` (exact orientation and in-circle predicates).
///
/// # Errors
///
/// Returns `VoronoiError::Backend` if `spade` rejects a point (NaN or out of range).
pub fn triangulate_spade(points: &[Point2]) -> Result<Triangulation> {
    let mut dt = DelaunayTriangulation::<SpadePoint2<f64>>::new();

    // spade vertex index -> first input index at that position
    let mut index_map: HashMap<usize, usize> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        let handle = dt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| VoronoiError::Backend(format!("spade insert: {e}")))?;
        index_map.entry(handle.index()).or_insert(i);
    }

    let mut triples = Vec::with_capacity(dt.num_inner_faces());
    for face in dt.inner_faces() {
        let mut triple = [0usize; 3];
        for (slot, vh) in face.vertices().iter().enumerate() {
            let idx = vh.fix().index();
            triple[slot] = index_map.get(&idx).copied().ok_or_else(|| {
                VoronoiError::Backend(format!("spade vertex {idx} has no input point"))
            })?;
        }
        triples.push(triple);
    }

    Ok(Triangulation::from_triangles(points.to_vec(), triples))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_map_to_first_occurrence() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 0.0),
        ];
        let tri = triangulate_spade(&pts).unwrap();
        assert_eq!(tri.triangles.len(), 1);
        assert!(!tri.triangles[0].vertices.contains(&3));
        assert!(tri.is_consistent());
    }

    #[test]
    fn nan_is_rejected() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(f64::NAN, 1.0),
        ];
        assert!(triangulate_spade(&pts).is_err());
    }
}
