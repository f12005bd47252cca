use crate::voronoi::VoronoiBackend;

/// Edge-weight shaping used by path searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStrategy {
    /// Raw bisector length.
    #[default]
    Shortest,
    /// Bisector length divided by the wall clearance of its end vertices.
    PenaliseWalls,
}

/// Tuning parameters of the roadmap pipeline and of path queries.
///
/// Angles are in degrees; grid distances are in pixels (cells).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathsConfig {
    /// General numeric tolerance.
    pub eps: f64,
    /// Angular tolerance for contour simplification, in degrees.
    pub eps_angular: f64,
    /// Voronoi vertices closer than this (pixels) are merged.
    pub voronoi_vertex_eps: f64,
    pub simplify_contour: bool,
    /// Maximum extent of a staircase removed during simplification, in pixels.
    pub simplify_mindist: f64,
    /// Split contours into convex parts before building line segments.
    pub convex_split: bool,
    pub voronoi_backend: VoronoiBackend,
    /// Site spacing along contour segments, in pixels.
    pub segment_sample_step: f64,
    /// Filter Voronoi vertices against the configuration space grid instead
    /// of the contour polygons.
    pub use_region_function: bool,
    pub subdivide_path: bool,
    /// Maximum distance between path vertices after subdivision, in degrees.
    pub subdivision_len: f64,
    /// Check every path vertex against the collision predicate.
    pub verify_path: bool,
    pub remove_close_vertices: bool,
    pub path_strategy: PathStrategy,
    /// Grid cells added beyond the axis limits on every side.
    pub grid_padding: usize,
    /// Evaluate grid rows on the rayon thread pool.
    pub parallel_grid: bool,
    /// Grid resolution along the two axes, in degrees per cell.
    pub grid_step: [f64; 2],
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            eps_angular: 1e-3,
            voronoi_vertex_eps: 1e-3,
            simplify_contour: true,
            simplify_mindist: 3.0,
            convex_split: false,
            voronoi_backend: VoronoiBackend::Spade,
            segment_sample_step: 2.0,
            use_region_function: true,
            subdivide_path: true,
            subdivision_len: 0.1,
            verify_path: true,
            remove_close_vertices: true,
            path_strategy: PathStrategy::Shortest,
            grid_padding: 0,
            parallel_grid: true,
            grid_step: [0.5, 0.5],
        }
    }
}

impl PathsConfig {
    #[must_use]
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    #[must_use]
    pub fn with_eps_angular(mut self, eps_angular: f64) -> Self {
        self.eps_angular = eps_angular;
        self
    }

    #[must_use]
    pub fn with_voronoi_vertex_eps(mut self, eps: f64) -> Self {
        self.voronoi_vertex_eps = eps;
        self
    }

    #[must_use]
    pub fn with_simplify_contour(mut self, simplify: bool, min_dist: f64) -> Self {
        self.simplify_contour = simplify;
        self.simplify_mindist = min_dist;
        self
    }

    #[must_use]
    pub fn with_convex_split(mut self, split: bool) -> Self {
        self.convex_split = split;
        self
    }

    #[must_use]
    pub fn with_voronoi_backend(mut self, backend: VoronoiBackend) -> Self {
        self.voronoi_backend = backend;
        self
    }

    #[must_use]
    pub fn with_segment_sample_step(mut self, step: f64) -> Self {
        self.segment_sample_step = step;
        self
    }

    #[must_use]
    pub fn with_region_function(mut self, use_region_function: bool) -> Self {
        self.use_region_function = use_region_function;
        self
    }

    #[must_use]
    pub fn with_subdivision(mut self, subdivide: bool, max_len: f64) -> Self {
        self.subdivide_path = subdivide;
        self.subdivision_len = max_len;
        self
    }

    #[must_use]
    pub fn with_verify_path(mut self, verify: bool) -> Self {
        self.verify_path = verify;
        self
    }

    #[must_use]
    pub fn with_remove_close_vertices(mut self, remove: bool) -> Self {
        self.remove_close_vertices = remove;
        self
    }

    #[must_use]
    pub fn with_path_strategy(mut self, strategy: PathStrategy) -> Self {
        self.path_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_grid_padding(mut self, padding: usize) -> Self {
        self.grid_padding = padding;
        self
    }

    #[must_use]
    pub fn with_parallel_grid(mut self, parallel: bool) -> Self {
        self.parallel_grid = parallel;
        self
    }

    #[must_use]
    pub fn with_grid_step(mut self, step_a: f64, step_b: f64) -> Self {
        self.grid_step = [step_a, step_b];
        self
    }
}
