use crate::error::{PipelineError, Result};
use crate::geometry::{polyline_between, polyline_closest};
use crate::graph::{dijkstra_from, Direction, Graph};
use crate::math::contour_2d::{remove_close_vertices, subdivide_lines};
use crate::math::distance_2d::nearest_point;
use crate::math::Point2;

use super::builder::{BuildStage, PathsBuilder};
use super::config::PathStrategy;
use super::config_space::{Cell, ConfigSpace};
use super::instrument::Instrument;

/// Result of a path query: roadmap vertices between a start and a target
/// configuration, all as `(a4, a2)` angles in degrees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InstrumentPath {
    /// `false` if start or target is blocked or no route connects them.
    pub ok: bool,
    pub start: Point2,
    pub target: Point2,
    /// Voronoi vertex indices along the route. The first and last bisector
    /// hold the roadmap points closest to `start` and `target`.
    pub voronoi_indices: Vec<usize>,
    /// Arc-length fraction along the first bisector where the path joins
    /// the roadmap.
    pub entry: f64,
    /// Arc-length fraction along the last bisector where the path leaves
    /// the roadmap.
    pub exit: f64,
}

impl InstrumentPath {
    fn unreachable(start: Point2, target: Point2) -> Self {
        Self {
            ok: false,
            start,
            target,
            ..Self::default()
        }
    }
}

/// Total angular length and estimated travel time of a path.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PathLength {
    /// Sum of the Euclidean segment lengths, in degrees.
    pub angular: f64,
    /// Seconds, with both axes moving simultaneously.
    pub time: f64,
}

impl PathLength {
    /// Measures `vertices` given the motor speeds of `[a4, a2]` in degrees
    /// per second. A non-positive speed makes any motion on that axis
    /// infinitely slow.
    #[must_use]
    pub fn measure(vertices: &[Point2], speeds: [f64; 2]) -> Self {
        let axis_time = |delta: f64, speed: f64| {
            if delta == 0.0 {
                0.0
            } else if speed > 0.0 {
                delta.abs() / speed
            } else {
                f64::INFINITY
            }
        };
        vertices
            .windows(2)
            .fold(Self::default(), |acc, pair| {
                let d = pair[1] - pair[0];
                Self {
                    angular: acc.angular + d.norm(),
                    time: acc.time + axis_time(d.x, speeds[0]).max(axis_time(d.y, speeds[1])),
                }
            })
    }
}

impl PathsBuilder {
    fn ready_space(&self) -> Result<&ConfigSpace> {
        match self.config_space() {
            Some(space) if self.is_ready() => Ok(space),
            _ => Err(PipelineError::InvalidState {
                required: BuildStage::Ready.name(),
                actual: self.stage().name(),
            }
            .into()),
        }
    }

    /// Searches the roadmap for a route from `start` to `target`.
    ///
    /// The route runs between the Voronoi vertices closest to both
    /// configurations in angle space. It joins and leaves the roadmap at the
    /// closest point of a bisector next to those vertices, adding that
    /// bisector to the route if it is not on it already. With [`PathStrategy::PenaliseWalls`] every edge weight is
    /// divided by the wall clearance of its end points, so routes through
    /// narrow passages cost more. An unreachable target is reported through
    /// [`InstrumentPath::ok`], not as an error.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` unless the mesh is ready.
    pub fn find_path(
        &self,
        start: Point2,
        target: Point2,
        strategy: PathStrategy,
    ) -> Result<InstrumentPath> {
        let space = self.ready_space()?;

        for (what, angle) in [("start", &start), ("target", &target)] {
            if space.cell_at_angle(angle) != Some(Cell::Free) {
                tracing::warn!(a4 = angle.x, a2 = angle.y, "{what} configuration is not free");
                return Ok(InstrumentPath::unreachable(start, target));
            }
        }

        let voronoi = self.voronoi();
        let angles: Vec<Point2> = voronoi
            .vertices
            .iter()
            .map(|v| space.pixel_to_angle(v))
            .collect();
        let (Some((from, _)), Some((to, _))) =
            (nearest_point(&angles, &start), nearest_point(&angles, &target))
        else {
            tracing::warn!("roadmap has no vertices");
            return Ok(InstrumentPath::unreachable(start, target));
        };

        let paths = match strategy {
            PathStrategy::Shortest => dijkstra_from(&voronoi.graph, from, None)?,
            PathStrategy::PenaliseWalls => {
                let clearance: Vec<f64> = voronoi
                    .vertices
                    .iter()
                    .map(|v| {
                        self.wall_index()
                            .and_then(|index| index.nearest(v))
                            .map_or(f64::INFINITY, |(_, d)| d)
                    })
                    .collect();
                let penalise = |a: usize, b: usize, w: f64| {
                    let c = clearance[a].min(clearance[b]);
                    if c.is_finite() {
                        w / c.max(1.0)
                    } else {
                        w
                    }
                };
                dijkstra_from(&voronoi.graph, from, Some(&penalise))?
            }
        };

        match paths.path_to(to) {
            Some(mut voronoi_indices) => {
                let (entry, exit) = self.attach_ends(
                    &mut voronoi_indices,
                    &space.angle_to_pixel(&start),
                    &space.angle_to_pixel(&target),
                );
                tracing::debug!(
                    vertices = voronoi_indices.len(),
                    entry,
                    exit,
                    ?strategy,
                    "path found"
                );
                Ok(InstrumentPath {
                    ok: true,
                    start,
                    target,
                    voronoi_indices,
                    entry,
                    exit,
                })
            }
            None => {
                tracing::info!(from, to, "no path between start and target");
                Ok(InstrumentPath::unreachable(start, target))
            }
        }
    }

    /// Picks where a route given by `indices` joins and leaves the roadmap,
    /// for `start` and `target` in pixels. A bisector at the first or last
    /// vertex that passes closer than the route's own end bisector is added
    /// to the route. Returns the arc-length fractions of both points.
    fn attach_ends(
        &self,
        indices: &mut Vec<usize>,
        start: &Point2,
        target: &Point2,
    ) -> (f64, f64) {
        if indices.len() < 2 {
            return (0.0, 1.0);
        }
        let voronoi = self.voronoi();
        let closest = |from: usize, to: usize, p: &Point2| {
            voronoi
                .bisector_points(from, to)
                .and_then(|points| polyline_closest(&points, p))
        };

        let (a, b) = (indices[0], indices[1]);
        let (mut entry, mut best) = closest(a, b, start).unwrap_or((0.0, f64::INFINITY));
        let mut before = None;
        for n in voronoi.graph.neighbours(a, Direction::Outgoing) {
            if indices.contains(&n) {
                continue;
            }
            if let Some((t, d)) = closest(n, a, start) {
                if d < best {
                    (entry, best, before) = (t, d, Some(n));
                }
            }
        }
        if let Some(n) = before {
            indices.insert(0, n);
        }

        let m = indices.len();
        let (a, b) = (indices[m - 2], indices[m - 1]);
        let (mut exit, mut best) = closest(a, b, target).unwrap_or((1.0, f64::INFINITY));
        let mut after = None;
        for n in voronoi.graph.neighbours(b, Direction::Outgoing) {
            if indices.contains(&n) {
                continue;
            }
            if let Some((t, d)) = closest(b, n, target) {
                if d < best {
                    (exit, best, after) = (t, d, Some(n));
                }
            }
        }
        if let Some(n) = after {
            indices.push(n);
        }
        (entry, exit)
    }

    /// Expands a path into the angle configurations to drive through.
    ///
    /// The list starts at the path's start, joins the roadmap at the path's
    /// entry point, follows the bisectors between consecutive roadmap
    /// vertices, leaves at the exit point and ends at its target. With `subdivide`
    /// no step exceeds the configured subdivision length. With `verify`,
    /// vertices the instrument reports as colliding or outside its limits
    /// are dropped.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` unless the mesh is ready.
    pub fn get_path_vertices(
        &self,
        path: &InstrumentPath,
        subdivide: bool,
        verify: Option<&dyn Instrument>,
    ) -> Result<Vec<Point2>> {
        let space = self.ready_space()?;
        if !path.ok {
            return Ok(Vec::new());
        }

        let voronoi = self.voronoi();
        let mut pixels: Vec<Point2> = Vec::new();
        let mut push = |p: Point2| {
            if pixels.last().is_none_or(|q| (q - p).norm() > self.config().eps) {
                pixels.push(p);
            }
        };
        match path.voronoi_indices.as_slice() {
            [] => {}
            [only] => {
                if let Some(v) = voronoi.vertices.get(*only) {
                    push(*v);
                }
            }
            indices => {
                let last = indices.len() - 2;
                for (k, pair) in indices.windows(2).enumerate() {
                    match voronoi.bisector_points(pair[0], pair[1]) {
                        Some(points) => {
                            let from = if k == 0 { path.entry } else { 0.0 };
                            let to = if k == last { path.exit } else { 1.0 };
                            polyline_between(&points, from, to)
                                .into_iter()
                                .for_each(&mut push);
                        }
                        None => {
                            if let Some(v) = voronoi.vertices.get(pair[1]) {
                                push(*v);
                            }
                        }
                    }
                }
            }
        }

        let mut vertices = Vec::with_capacity(pixels.len() + 2);
        vertices.push(path.start);
        vertices.extend(pixels.iter().map(|p| space.pixel_to_angle(p)));
        vertices.push(path.target);

        let config = self.config();
        if subdivide {
            vertices = subdivide_lines(&vertices, config.subdivision_len);
        }

        if let Some(instrument) = verify {
            let before = vertices.len();
            vertices.retain(|v| {
                instrument.within_limits(v.x, v.y) && !instrument.check_collision(v.x, v.y)
            });
            let dropped = before - vertices.len();
            if dropped > 0 {
                tracing::warn!(dropped, "path vertices fail verification");
            }
        }

        if config.remove_close_vertices {
            vertices = remove_close_vertices(&vertices, config.eps_angular);
        }
        Ok(vertices)
    }

    /// Finds a path and expands it, with the strategy, subdivision and
    /// verification settings of the configuration.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` unless the mesh is ready.
    pub fn plan_path(
        &self,
        start: Point2,
        target: Point2,
        instrument: &dyn Instrument,
    ) -> Result<(InstrumentPath, Vec<Point2>)> {
        let config = self.config();
        let path = self.find_path(start, target, config.path_strategy)?;
        let verify = config.verify_path.then_some(instrument);
        let vertices = self.get_path_vertices(&path, config.subdivide_path, verify)?;
        Ok((path, vertices))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::PathsError;
    use crate::roadmap::config::PathsConfig;
    use crate::roadmap::instrument::{InstrumentSnapshot, Obstacle};

    fn instrument() -> InstrumentSnapshot {
        let mut instr = InstrumentSnapshot::new((0.0, 40.0), (0.0, 30.0));
        instr.add_obstacle(Obstacle::rectangle(
            "block",
            Point2::new(15.0, 10.0),
            Point2::new(25.0, 20.0),
        ));
        instr
    }

    fn ready_builder(instr: &InstrumentSnapshot) -> PathsBuilder {
        let mut builder = PathsBuilder::new(PathsConfig::default().with_grid_step(1.0, 1.0));
        assert!(builder.calculate_mesh(instr).is_ready());
        builder
    }

    #[test]
    fn path_around_block_is_collision_free() {
        let instr = instrument();
        let builder = ready_builder(&instr);
        let start = Point2::new(5.0, 15.0);
        let target = Point2::new(35.0, 15.0);
        let path = builder.find_path(start, target, PathStrategy::Shortest).unwrap();
        assert!(path.ok);
        assert!(!path.voronoi_indices.is_empty());

        let vertices = builder.get_path_vertices(&path, true, Some(&instr)).unwrap();
        assert_eq!(vertices.first(), Some(&start));
        assert_eq!(vertices.last(), Some(&target));
        assert!(vertices.iter().all(|v| !instr.check_collision(v.x, v.y)));
        assert!(vertices
            .windows(2)
            .all(|w| (w[1] - w[0]).norm() <= builder.config().subdivision_len + 1e-2));

        let length = PathLength::measure(&vertices, [1.0, 1.0]);
        assert!(length.angular > 30.0);
    }

    #[test]
    fn route_joins_roadmap_at_closest_point() {
        let instr = instrument();
        let builder = ready_builder(&instr);
        let space = builder.config_space().unwrap();
        let start = Point2::new(5.0, 15.0);
        let path = builder
            .find_path(start, Point2::new(35.0, 15.0), PathStrategy::Shortest)
            .unwrap();
        assert!(path.ok);
        assert!((0.0..=1.0).contains(&path.entry));
        assert!((0.0..=1.0).contains(&path.exit));

        // Left of the block the roadmap runs vertically at a4 = 7, well
        // away from its end vertices.
        let nearest_vertex = builder
            .voronoi()
            .vertices
            .iter()
            .map(|v| (space.pixel_to_angle(v) - start).norm())
            .fold(f64::INFINITY, f64::min);
        let vertices = builder.get_path_vertices(&path, false, None).unwrap();
        let joined = (vertices[1] - start).norm();
        assert!(
            joined < nearest_vertex - 1.0,
            "joined at {joined}, nearest vertex at {nearest_vertex}"
        );
        assert!(vertices[..2].iter().all(|v| !instr.check_collision(v.x, v.y)));
    }

    #[test]
    fn penalised_search_also_succeeds() {
        let instr = instrument();
        let builder = ready_builder(&instr);
        let path = builder
            .find_path(Point2::new(5.0, 5.0), Point2::new(35.0, 25.0), PathStrategy::PenaliseWalls)
            .unwrap();
        assert!(path.ok);
        let vertices = builder.get_path_vertices(&path, false, None).unwrap();
        assert!(vertices.len() >= 2);
    }

    #[test]
    fn blocked_start_is_not_ok() {
        let instr = instrument();
        let builder = ready_builder(&instr);
        let path = builder
            .find_path(Point2::new(20.0, 15.0), Point2::new(35.0, 25.0), PathStrategy::Shortest)
            .unwrap();
        assert!(!path.ok);
        assert!(builder.get_path_vertices(&path, true, None).unwrap().is_empty());
    }

    #[test]
    fn query_requires_ready_mesh() {
        let builder = PathsBuilder::default();
        let err = builder
            .find_path(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0), PathStrategy::Shortest)
            .unwrap_err();
        assert!(matches!(
            err,
            PathsError::Pipeline(PipelineError::InvalidState { .. })
        ));
    }

    #[test]
    fn path_length_uses_slowest_axis() {
        let vertices = [Point2::new(0.0, 0.0), Point2::new(3.0, 4.0), Point2::new(3.0, 0.0)];
        let length = PathLength::measure(&vertices, [1.0, 2.0]);
        assert_abs_diff_eq!(length.angular, 9.0, epsilon = 1e-12);
        // max(3/1, 4/2) + 4/2
        assert_abs_diff_eq!(length.time, 5.0, epsilon = 1e-12);
        assert_eq!(PathLength::measure(&vertices[..1], [1.0, 1.0]), PathLength::default());
    }

    #[test]
    fn planned_path_uses_configured_settings() {
        let instr = instrument();
        let mut builder = PathsBuilder::new(
            PathsConfig::default()
                .with_grid_step(1.0, 1.0)
                .with_subdivision(false, 0.1),
        );
        assert!(builder.calculate_mesh(&instr).is_ready());
        let (path, coarse) = builder
            .plan_path(Point2::new(5.0, 5.0), Point2::new(35.0, 25.0), &instr)
            .unwrap();
        assert!(path.ok);
        let fine = builder.get_path_vertices(&path, true, Some(&instr)).unwrap();
        assert!(coarse.len() < fine.len());
    }
}
