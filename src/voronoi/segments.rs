//! Voronoi diagram of line segments.
//!
//! Every segment is represented by its two end points and by interior sample
//! points spaced at most `sample_step` apart. Each site remembers the feature
//! it came from: an end point (shared by all segments meeting there) or the
//! open segment. The Delaunay dual of the sites approximates the segment
//! diagram; dual edges between sites of one feature, or between a segment
//! and its own end point, are not bisectors and are dropped. The remaining
//! dual edges are merged into maximal chains with a single generating feature
//! pair; each chain becomes one straight or parabolic bisector between two
//! Voronoi vertices.
//!
//! Circumcentres of sample triangles are only close to the true vertices.
//! Every chain end is moved onto the point equidistant from the features of
//! its incident chains by a Gauss-Newton solve, so vertices and bisectors
//! are exact up to floating point.

use std::collections::{BTreeSet, HashMap, HashSet};

use nalgebra::{DMatrix, DVector};

use crate::error::{Result, VoronoiError};
use crate::geometry::{parabolic_bisector, polyline_length, BisectorKind, LineSegment};
use crate::graph::Graph;
use crate::math::polygon_2d::winding_number;
use crate::math::{points_equal, Point2, Vector2, Vector3, TOLERANCE};
use crate::triangulation::{Delaunay, DelaunayParams};

use super::{LinearBisector, ParabolicBisector, VoronoiBackend, VoronoiDiagram};

/// Parameters for [`SegmentVoronoi`].
#[derive(Debug, Clone, Copy)]
pub struct SegmentVoronoiParams {
    pub backend: VoronoiBackend,
    /// Maximum spacing of sample sites along a segment.
    pub sample_step: f64,
    /// Voronoi vertices closer than this are merged.
    pub vertex_eps: f64,
    /// Maximum spacing of parabolic bisector polyline vertices.
    pub parabola_step: f64,
    /// Drop bisectors between segments of the same group.
    pub group_lines: bool,
    /// Segment end points closer than this are one site.
    pub eps: f64,
}

impl Default for SegmentVoronoiParams {
    fn default() -> Self {
        Self {
            backend: VoronoiBackend::default(),
            sample_step: 2.0,
            vertex_eps: 1e-3,
            parabola_step: 1.0,
            group_lines: true,
            eps: 1e-6,
        }
    }
}

/// Generator of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Feature {
    /// Index into the distinct end points.
    Point(usize),
    /// Index into the input segments.
    Segment(usize),
}

type FeaturePair = (Feature, Feature);

const REFINE_ITERATIONS: usize = 32;
const REFINE_TOLERANCE: f64 = 1e-10;

fn feature_pair(a: Feature, b: Feature) -> FeaturePair {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn bisector_kind(pair: FeaturePair) -> BisectorKind {
    match pair {
        (Feature::Point(_), Feature::Point(_)) | (Feature::Segment(_), Feature::Segment(_)) => {
            BisectorKind::Linear
        }
        _ => BisectorKind::Parabolic,
    }
}

/// Deduplicates points on a uniform hash grid with cell size `eps`.
struct PointMerger {
    eps: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point2>,
}

impl PointMerger {
    fn new(eps: f64) -> Self {
        Self {
            eps: eps.max(f64::EPSILON),
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, p: &Point2) -> (i64, i64) {
        ((p.x / self.eps).floor() as i64, (p.y / self.eps).floor() as i64)
    }

    fn insert(&mut self, p: Point2) -> usize {
        let (cx, cy) = self.cell(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    if let Some(&i) = bucket
                        .iter()
                        .find(|&&i| points_equal(&self.points[i], &p, self.eps))
                    {
                        return i;
                    }
                }
            }
        }
        let index = self.points.len();
        self.points.push(p);
        self.cells.entry((cx, cy)).or_default().push(index);
        index
    }
}

/// Sample sites with their generating features.
struct Sites {
    positions: Vec<Point2>,
    features: Vec<Feature>,
    endpoints: Vec<Point2>,
    /// Segments incident to each end point.
    endpoint_segments: Vec<Vec<usize>>,
    /// Groups of the segments incident to each end point.
    endpoint_groups: Vec<BTreeSet<usize>>,
}

impl Sites {
    fn sample(segments: &[LineSegment], step: f64, eps: f64) -> Self {
        let mut merger = PointMerger::new(eps);
        let mut endpoint_segments: Vec<Vec<usize>> = Vec::new();
        let mut endpoint_groups: Vec<BTreeSet<usize>> = Vec::new();
        let mut positions = Vec::new();
        let mut features = Vec::new();

        for (s, seg) in segments.iter().enumerate() {
            for p in [seg.start, seg.end] {
                let e = merger.insert(p);
                if e == endpoint_segments.len() {
                    endpoint_segments.push(Vec::new());
                    endpoint_groups.push(BTreeSet::new());
                }
                if !endpoint_segments[e].contains(&s) {
                    endpoint_segments[e].push(s);
                }
                endpoint_groups[e].extend(seg.group);
            }

            let len = seg.length();
            if step > 0.0 && len > step {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let pieces = (len / step).ceil() as usize;
                for k in 1..pieces {
                    #[allow(clippy::cast_precision_loss)]
                    let t = k as f64 / pieces as f64;
                    positions.push(seg.point_at(t));
                    features.push(Feature::Segment(s));
                }
            }
        }

        for (e, p) in merger.points.iter().enumerate() {
            positions.push(*p);
            features.push(Feature::Point(e));
        }

        Self {
            positions,
            features,
            endpoints: merger.points,
            endpoint_segments,
            endpoint_groups,
        }
    }

    fn groups(&self, segments: &[LineSegment], f: Feature) -> BTreeSet<usize> {
        match f {
            Feature::Point(e) => self.endpoint_groups[e].clone(),
            Feature::Segment(s) => segments[s].group.into_iter().collect(),
        }
    }

    /// Whether the dual edge between sites of `a` and `b` is not a bisector.
    fn is_internal(
        &self,
        segments: &[LineSegment],
        a: Feature,
        b: Feature,
        group_lines: bool,
    ) -> bool {
        if a == b {
            return true;
        }
        match (a, b) {
            (Feature::Point(e), Feature::Segment(s)) | (Feature::Segment(s), Feature::Point(e))
                if self.endpoint_segments[e].contains(&s) =>
            {
                return true;
            }
            _ => {}
        }
        group_lines
            && !self
                .groups(segments, a)
                .is_disjoint(&self.groups(segments, b))
    }
}

/// One equation on a Voronoi vertex `p` with clearance `r`.
enum Constraint {
    /// `|p - point| = r`.
    Point(Point2),
    /// Distance to the supporting line of an open segment equals `r`.
    Line { origin: Point2, normal: Vector2 },
    /// `p` lies on the normal of a segment through its end point `origin`.
    Normal { origin: Point2, direction: Vector2 },
}

impl Constraint {
    /// Residual and its gradient with respect to `(x, y, r)`.
    fn evaluate(&self, p: &Point2, r: f64) -> (f64, [f64; 3]) {
        match self {
            Self::Point(q) => {
                let d = p - q;
                let len = d.norm();
                let g = if len > f64::EPSILON {
                    d / len
                } else {
                    Vector2::zeros()
                };
                (len - r, [g.x, g.y, -1.0])
            }
            Self::Line { origin, normal } => {
                let side = normal.dot(&(p - origin));
                let g = if side < 0.0 { -normal } else { *normal };
                (side.abs() - r, [g.x, g.y, -1.0])
            }
            Self::Normal { origin, direction } => (
                direction.dot(&(p - origin)),
                [direction.x, direction.y, 0.0],
            ),
        }
    }

    fn is_distance(&self) -> bool {
        !matches!(self, Self::Normal { .. })
    }
}

/// Moves the approximate vertex `guess` onto the point equidistant from
/// `features`. Returns `guess` when the features do not pin down such a
/// point within `max_shift` of it.
fn refine_vertex(
    segments: &[LineSegment],
    sites: &Sites,
    features: &BTreeSet<Feature>,
    guess: Point2,
    max_shift: f64,
) -> Point2 {
    let own_endpoint = |s: usize| {
        features.iter().find_map(|f| match f {
            Feature::Point(e) if sites.endpoint_segments[*e].contains(&s) => Some(*e),
            _ => None,
        })
    };
    let mut constraints = Vec::with_capacity(features.len());
    for &f in features {
        match f {
            Feature::Point(e) => constraints.push(Constraint::Point(sites.endpoints[e])),
            Feature::Segment(s) => {
                let seg = &segments[s];
                let len = seg.length();
                if len < TOLERANCE {
                    return guess;
                }
                let direction = seg.direction() / len;
                // Next to its own end point a segment only fixes the normal there.
                constraints.push(match own_endpoint(s) {
                    Some(e) => Constraint::Normal {
                        origin: sites.endpoints[e],
                        direction,
                    },
                    None => Constraint::Line {
                        origin: seg.start,
                        normal: Vector2::new(-direction.y, direction.x),
                    },
                });
            }
        }
    }
    let distances = constraints.iter().filter(|c| c.is_distance()).count();
    if distances < 2 {
        return guess;
    }

    #[allow(clippy::cast_precision_loss)]
    let r0 = constraints
        .iter()
        .filter(|c| c.is_distance())
        .map(|c| c.evaluate(&guess, 0.0).0)
        .sum::<f64>()
        / distances as f64;
    let mut x = Vector3::new(guess.x, guess.y, r0);
    let rows = constraints.len();
    for _ in 0..REFINE_ITERATIONS {
        let p = Point2::new(x.x, x.y);
        let mut jacobian = DMatrix::<f64>::zeros(rows, 3);
        let mut residual = DVector::<f64>::zeros(rows);
        for (i, c) in constraints.iter().enumerate() {
            let (f, g) = c.evaluate(&p, x.z);
            residual[i] = f;
            for (j, v) in g.into_iter().enumerate() {
                jacobian[(i, j)] = v;
            }
        }
        if residual.amax() <= REFINE_TOLERANCE * (1.0 + x.z.abs()) {
            return if (p - guess).norm() <= max_shift {
                p
            } else {
                guess
            };
        }
        let Ok(step) = jacobian.svd(true, true).solve(&(-residual), 1e-12) else {
            return guess;
        };
        x += Vector3::new(step[0], step[1], step[2]);
    }
    guess
}

/// Dual edge between two merged circumcentres, or towards infinity.
struct DualEdge {
    a: usize,
    b: Option<usize>,
    pair: FeaturePair,
    direction: Option<Vector2>,
}

/// Maximal run of dual edges with one feature pair.
struct Chain {
    start: usize,
    end: Option<usize>,
    pair: FeaturePair,
    direction: Option<Vector2>,
}

struct DualGraph {
    vertices: Vec<Point2>,
    edges: Vec<DualEdge>,
    adjacency: Vec<Vec<usize>>,
}

impl DualGraph {
    /// Generating features of the dual edges at `v`.
    fn features(&self, v: usize) -> BTreeSet<Feature> {
        self.adjacency[v]
            .iter()
            .flat_map(|&e| {
                let (a, b) = self.edges[e].pair;
                [a, b]
            })
            .collect()
    }

    fn is_junction(&self, v: usize) -> bool {
        match self.adjacency[v].as_slice() {
            [e0, e1] => self.edges[*e0].pair != self.edges[*e1].pair,
            _ => true,
        }
    }

    fn walk(&self, start: usize, first: usize, visited: &mut [bool]) -> Chain {
        let pair = self.edges[first].pair;
        let (mut current, mut e) = (start, first);
        loop {
            visited[e] = true;
            let edge = &self.edges[e];
            let next = if edge.a == current { edge.b } else { Some(edge.a) };
            let Some(w) = next else {
                return Chain {
                    start,
                    end: None,
                    pair,
                    direction: edge.direction,
                };
            };
            if w == start || self.is_junction(w) {
                return Chain {
                    start,
                    end: Some(w),
                    pair,
                    direction: None,
                };
            }
            let [e0, e1] = [self.adjacency[w][0], self.adjacency[w][1]];
            let other = if e0 == e { e1 } else { e0 };
            if visited[other] {
                return Chain {
                    start,
                    end: Some(w),
                    pair,
                    direction: None,
                };
            }
            (current, e) = (w, other);
        }
    }

    fn chains(&self) -> Vec<Chain> {
        let mut visited = vec![false; self.edges.len()];
        let mut chains = Vec::new();
        for v in 0..self.vertices.len() {
            if !self.is_junction(v) {
                continue;
            }
            for &e in &self.adjacency[v] {
                if !visited[e] {
                    chains.push(self.walk(v, e, &mut visited));
                }
            }
        }
        // Closed loops without any junction.
        for e in 0..self.edges.len() {
            if !visited[e] {
                chains.push(self.walk(self.edges[e].a, e, &mut visited));
            }
        }
        chains
    }
}

/// Region predicate: `true` if a point lies in forbidden space.
pub type RegionFn<'a> = &'a dyn Fn(&Point2) -> bool;

/// Computes the Voronoi diagram of a set of line segments.
#[derive(Debug, Clone, Default)]
pub struct SegmentVoronoi {
    params: SegmentVoronoiParams,
    polygons: Vec<Vec<Point2>>,
}

impl SegmentVoronoi {
    #[must_use]
    pub fn new(params: SegmentVoronoiParams) -> Self {
        Self {
            params,
            polygons: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_backend(mut self, backend: VoronoiBackend) -> Self {
        self.params.backend = backend;
        self
    }

    /// Closed obstacle outlines; vertices enclosed by any of them are dropped.
    #[must_use]
    pub fn with_polygons(mut self, polygons: Vec<Vec<Point2>>) -> Self {
        self.polygons = polygons;
        self
    }

    /// Builds the diagram of `segments`.
    ///
    /// Bisectors with an end vertex for which `region` returns `true`, or
    /// which lies inside one of the obstacle polygons, are dropped. Vertices
    /// left without graph edges are removed.
    ///
    /// # Errors
    ///
    /// - `VoronoiError::NoSites` for an empty segment list
    /// - triangulation errors for fewer than three sites or collinear sites
    /// - `VoronoiError::IndexOutOfRange` if vertex cleanup finds an inconsistent index
    pub fn execute(
        &self,
        segments: &[LineSegment],
        region: Option<RegionFn<'_>>,
    ) -> Result<VoronoiDiagram> {
        if segments.is_empty() {
            return Err(VoronoiError::NoSites.into());
        }
        let sites = Sites::sample(segments, self.params.sample_step, self.params.eps);
        let dual = self.dual_graph(segments, &sites)?;
        let chains = dual.chains();
        let positions = self.refine_chain_ends(segments, &sites, &dual, &chains);

        let forbidden = |p: &Point2| -> bool {
            region.is_some_and(|f| f(p))
                || self
                    .polygons
                    .iter()
                    .any(|poly| poly.len() >= 3 && winding_number(poly, p) != 0)
        };

        let far = 10.0
            * segments
                .iter()
                .map(LineSegment::length)
                .fold(1.0_f64, f64::max);

        let mut diagram = VoronoiDiagram::default();
        let mut table = VertexTable::new(self.params.vertex_eps);

        for chain in &chains {
            let pa = positions[chain.start];
            if forbidden(&pa) {
                continue;
            }
            match (chain.end, chain.direction) {
                (Some(end), _) => {
                    if end == chain.start {
                        continue;
                    }
                    let pb = positions[end];
                    if forbidden(&pb) {
                        continue;
                    }
                    let ia = table.intern(&mut diagram, pa)?;
                    let ib = table.intern(&mut diagram, pb)?;
                    // Both ends refined onto the same vertex.
                    if ia == ib {
                        continue;
                    }
                    let weight = self.add_bisector(&mut diagram, segments, &sites, chain.pair, ia, ib);
                    if diagram.graph.weight(ia, ib).is_none_or(|w| weight < w) {
                        diagram.graph.add_undirected_edge_by_index(ia, ib, weight)?;
                    }
                }
                (None, Some(direction)) => {
                    let ia = table.intern(&mut diagram, pa)?;
                    diagram.linear_edges.push(LinearBisector {
                        line: (pa, pa + direction * far),
                        vertices: [Some(ia), None],
                    });
                }
                (None, None) => {}
            }
        }

        let removed = diagram.remove_unconnected_vertices()?;
        tracing::debug!(
            segments = segments.len(),
            sites = sites.positions.len(),
            chains = chains.len(),
            vertices = diagram.vertices.len(),
            linear = diagram.linear_edges.len(),
            parabolic = diagram.parabolic_edges.len(),
            removed,
            "segment voronoi diagram"
        );
        Ok(diagram)
    }

    /// Exact position of every dual vertex that ends a chain; other vertices
    /// keep their circumcentre.
    fn refine_chain_ends(
        &self,
        segments: &[LineSegment],
        sites: &Sites,
        dual: &DualGraph,
        chains: &[Chain],
    ) -> Vec<Point2> {
        let max_shift = if self.params.sample_step > 0.0 {
            2.0 * self.params.sample_step
        } else {
            f64::INFINITY
        };
        let mut positions = dual.vertices.clone();
        let mut done = vec![false; positions.len()];
        let mut moved = 0usize;
        for v in chains.iter().flat_map(|c| [Some(c.start), c.end]).flatten() {
            if std::mem::replace(&mut done[v], true) {
                continue;
            }
            let exact = refine_vertex(segments, sites, &dual.features(v), positions[v], max_shift);
            if exact != positions[v] {
                moved += 1;
                positions[v] = exact;
            }
        }
        tracing::trace!(moved, "voronoi vertices refined");
        positions
    }

    fn dual_graph(&self, segments: &[LineSegment], sites: &Sites) -> Result<DualGraph> {
        let tri = Delaunay::new(DelaunayParams {
            backend: self.params.backend.into(),
            eps: self.params.eps,
        })
        .execute(&sites.positions)?;

        let mut merger = PointMerger::new(self.params.vertex_eps);
        let centres: Vec<Option<usize>> = (0..tri.triangles.len())
            .map(|t| tri.circumcentre(t).map(|c| merger.insert(c)))
            .collect();

        let mut edges = Vec::new();
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for (t, triangle) in tri.triangles.iter().enumerate() {
            let Some(va) = centres[t] else {
                continue;
            };
            for slot in 0..3 {
                let (a, b) = triangle.edge(slot);
                let (fa, fb) = (sites.features[a], sites.features[b]);
                if sites.is_internal(segments, fa, fb, self.params.group_lines) {
                    continue;
                }
                let pair = feature_pair(fa, fb);
                match triangle.neighbors[slot] {
                    Some(u) if t < u => {
                        let Some(vb) = centres[u] else {
                            continue;
                        };
                        if va != vb && seen.insert((va.min(vb), va.max(vb))) {
                            edges.push(DualEdge {
                                a: va,
                                b: Some(vb),
                                pair,
                                direction: None,
                            });
                        }
                    }
                    Some(_) => {}
                    None => {
                        let d = tri.points[b] - tri.points[a];
                        edges.push(DualEdge {
                            a: va,
                            b: None,
                            pair,
                            direction: Some(Vector2::new(d.y, -d.x).normalize()),
                        });
                    }
                }
            }
        }

        let mut adjacency = vec![Vec::new(); merger.points.len()];
        for (e, edge) in edges.iter().enumerate() {
            adjacency[edge.a].push(e);
            if let Some(b) = edge.b {
                adjacency[b].push(e);
            }
        }
        Ok(DualGraph {
            vertices: merger.points,
            edges,
            adjacency,
        })
    }

    /// Stores the bisector between final vertices `ia` and `ib`; returns its length.
    fn add_bisector(
        &self,
        diagram: &mut VoronoiDiagram,
        segments: &[LineSegment],
        sites: &Sites,
        pair: FeaturePair,
        ia: usize,
        ib: usize,
    ) -> f64 {
        let (pa, pb) = (diagram.vertices[ia], diagram.vertices[ib]);
        let parabola = match (bisector_kind(pair), pair) {
            (BisectorKind::Parabolic, (Feature::Point(e), Feature::Segment(s))) => {
                Some((sites.endpoints[e], segments[s]))
            }
            _ => None,
        };
        match parabola {
            Some((focus, directrix)) => {
                let points =
                    parabolic_bisector(&focus, &directrix, &pa, &pb, self.params.parabola_step);
                let len = polyline_length(&points);
                diagram.parabolic_edges.push(ParabolicBisector {
                    points,
                    vertices: [ia, ib],
                });
                len
            }
            None => {
                diagram.linear_edges.push(LinearBisector {
                    line: (pa, pb),
                    vertices: [Some(ia), Some(ib)],
                });
                (pb - pa).norm()
            }
        }
    }
}

/// Diagram vertices keyed by position; positions within `vertex_eps` share
/// one vertex.
struct VertexTable {
    merger: PointMerger,
    index: Vec<Option<usize>>,
}

impl VertexTable {
    fn new(eps: f64) -> Self {
        Self {
            merger: PointMerger::new(eps),
            index: Vec::new(),
        }
    }

    /// Diagram index of the vertex at `p`, adding it on first use.
    fn intern(&mut self, diagram: &mut VoronoiDiagram, p: Point2) -> Result<usize> {
        let key = self.merger.insert(p);
        if key == self.index.len() {
            self.index.push(None);
        }
        if let Some(i) = self.index[key] {
            return Ok(i);
        }
        let i = diagram.vertices.len();
        diagram.vertices.push(self.merger.points[key]);
        diagram.graph.add_vertex(&i.to_string())?;
        self.index[key] = Some(i);
        Ok(i)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn parallel(same_group: bool) -> Vec<LineSegment> {
        vec![
            LineSegment::new(Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)).with_group(0),
            LineSegment::new(Point2::new(0.0, 4.0), Point2::new(10.0, 4.0))
                .with_group(usize::from(!same_group)),
        ]
    }

    fn square(min: f64, max: f64, first_group: usize, one_group: bool) -> Vec<LineSegment> {
        let c = [
            Point2::new(min, min),
            Point2::new(max, min),
            Point2::new(max, max),
            Point2::new(min, max),
        ];
        (0..4)
            .map(|i| {
                let g = if one_group { first_group } else { first_group + i };
                LineSegment::new(c[i], c[(i + 1) % 4]).with_group(g)
            })
            .collect()
    }

    #[test]
    fn parallel_segments_give_midline() {
        for backend in [VoronoiBackend::Spade, VoronoiBackend::Incremental] {
            let d = SegmentVoronoi::default()
                .with_backend(backend)
                .execute(&parallel(false), None)
                .unwrap();
            assert_eq!(d.vertices.len(), 2, "{backend:?}");
            for v in &d.vertices {
                assert_abs_diff_eq!(v.y, 2.0, epsilon = 1e-6);
            }
            // The vertices sit where the end point bisectors take over.
            let w = d.graph.weight(0, 1).unwrap();
            assert_abs_diff_eq!(w, 10.0, epsilon = 1e-6);
            // Rays beyond both segment ends.
            assert_eq!(d.linear_edges.iter().filter(|e| !e.is_finite()).count(), 2);
        }
    }

    /// Sides of a scalene triangle, trimmed back from the corners, one group each.
    fn trimmed_triangle() -> Vec<LineSegment> {
        let c = [
            Point2::new(0.0, 0.0),
            Point2::new(24.0, 0.0),
            Point2::new(7.0, 15.0),
        ];
        (0..3)
            .map(|i| {
                let side = LineSegment::new(c[i], c[(i + 1) % 3]);
                LineSegment::new(side.point_at(0.1), side.point_at(0.9)).with_group(i)
            })
            .collect()
    }

    #[test]
    fn vertices_are_equidistant_from_their_generators() {
        let segments = trimmed_triangle();
        for backend in [VoronoiBackend::Spade, VoronoiBackend::Incremental] {
            let d = SegmentVoronoi::default()
                .with_backend(backend)
                .execute(&segments, None)
                .unwrap();
            assert!(!d.is_empty(), "{backend:?}");
            let mut junctions = 0;
            for (i, v) in d.vertices.iter().enumerate() {
                let mut dist: Vec<f64> = segments.iter().map(|s| s.distance_to(v)).collect();
                dist.sort_by(f64::total_cmp);
                assert_abs_diff_eq!(dist[0], dist[1], epsilon = 1e-6);
                if d.graph.out_edges(i).count() >= 3 {
                    junctions += 1;
                    assert_abs_diff_eq!(dist[0], dist[2], epsilon = 1e-6);
                }
            }
            // At least the vertex between all three sides.
            assert!(junctions >= 1, "{backend:?}");
        }
    }

    #[test]
    fn same_group_bisectors_are_dropped() {
        let d = SegmentVoronoi::default()
            .execute(&parallel(true), None)
            .unwrap();
        assert!(d.is_empty());
        assert!(d.linear_edges.is_empty());
    }

    #[test]
    fn region_function_drops_vertices() {
        let above = |p: &Point2| p.y > 1.0;
        let d = SegmentVoronoi::default()
            .execute(&parallel(false), Some(&above))
            .unwrap();
        assert!(d.is_empty());
    }

    #[test]
    fn point_and_segment_give_parabola() {
        let segments = [
            LineSegment::new(Point2::new(-10.0, 0.0), Point2::new(10.0, 0.0)).with_group(0),
            LineSegment::new(Point2::new(0.0, 4.0), Point2::new(0.5, 4.0)).with_group(1),
        ];
        let params = SegmentVoronoiParams {
            parabola_step: 0.25,
            ..SegmentVoronoiParams::default()
        };
        let d = SegmentVoronoi::new(params).execute(&segments, None).unwrap();
        assert!(!d.parabolic_edges.is_empty());

        let foci = [Point2::new(0.0, 4.0), Point2::new(0.5, 4.0)];
        for edge in &d.parabolic_edges {
            for q in &edge.points[1..edge.points.len() - 1] {
                let err = foci
                    .iter()
                    .map(|f| ((q - f).norm() - q.y.abs()).abs())
                    .fold(f64::INFINITY, f64::min);
                assert!(err < 1e-6, "q={q:?} err={err}");
            }
        }
    }

    #[test]
    fn obstacle_in_frame_keeps_vertices_outside() {
        let mut segments = square(0.0, 20.0, 1, false);
        segments.extend(square(8.0, 12.0, 0, true));
        let outline = vec![
            Point2::new(8.0, 8.0),
            Point2::new(12.0, 8.0),
            Point2::new(12.0, 12.0),
            Point2::new(8.0, 12.0),
        ];
        let d = SegmentVoronoi::default()
            .with_polygons(vec![outline])
            .execute(&segments, None)
            .unwrap();
        assert!(d.graph.num_edges() > 0);
        for v in &d.vertices {
            let inside = v.x > 8.0 && v.x < 12.0 && v.y > 8.0 && v.y < 12.0;
            assert!(!inside, "v={v:?}");
        }
    }

    #[test]
    fn empty_input_fails() {
        assert!(SegmentVoronoi::default().execute(&[], None).is_err());
    }
}
