//! Staged roadmap construction.
//!
//! `Idle -> ConfigSpaceCalculated -> WallIndexBuilt -> ContoursExtracted ->
//! SegmentsExtracted -> VoronoiBuilt -> Ready`. Every stage needs the
//! products of the previous one; re-running a stage discards the products
//! of all later ones. A failed or cancelled stage leaves the builder `Idle`.

use std::fmt;

use crate::error::{PathsError, PipelineError, Result};
use crate::geometry::LineSegment;
use crate::graph::Graph;
use crate::math::Point2;
use crate::voronoi::segments::RegionFn;
use crate::voronoi::{SegmentVoronoi, SegmentVoronoiParams, VoronoiDiagram};

use super::config::PathsConfig;
use super::config_space::{ConfigSpace, ConfigSpaceParams, SampleConfigSpace};
use super::contours::{ContourParams, Contours, ExtractContours};
use super::instrument::Instrument;
use super::observer::{CancellationToken, PipelineObserver};
use super::segments::{arrange_segments, SegmentArrangement};
use super::wall_index::WallIndex;

/// Pipeline state; each value names the last completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BuildStage {
    #[default]
    Idle,
    ConfigSpaceCalculated,
    WallIndexBuilt,
    ContoursExtracted,
    SegmentsExtracted,
    VoronoiBuilt,
    Ready,
}

impl BuildStage {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ConfigSpaceCalculated => "configuration space",
            Self::WallIndexBuilt => "wall index",
            Self::ContoursExtracted => "wall contours",
            Self::SegmentsExtracted => "line segments",
            Self::VoronoiBuilt => "voronoi diagram",
            Self::Ready => "ready",
        }
    }

    fn message(self) -> &'static str {
        match self {
            Self::ConfigSpaceCalculated => "Calculating configuration space.",
            Self::WallIndexBuilt => "Building wall index.",
            Self::ContoursExtracted => "Calculating wall contours.",
            Self::SegmentsExtracted => "Calculating line segments.",
            Self::VoronoiBuilt => "Calculating Voronoi regions.",
            Self::Idle | Self::Ready => "",
        }
    }

    /// Share of the overall progress covered by this stage.
    fn window(self) -> (f64, f64) {
        match self {
            Self::ConfigSpaceCalculated => (0.0, 0.5),
            Self::WallIndexBuilt => (0.5, 0.55),
            Self::ContoursExtracted => (0.55, 0.7),
            Self::SegmentsExtracted => (0.7, 0.75),
            Self::VoronoiBuilt => (0.75, 1.0),
            Self::Idle => (0.0, 0.0),
            Self::Ready => (1.0, 1.0),
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a full mesh calculation.
#[derive(Debug)]
pub enum PipelineStatus {
    Ready,
    /// Cancelled through the token or by the observer.
    Aborted,
    Failed(PathsError),
}

impl PipelineStatus {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Forwards stage-local progress to the observer as overall progress.
struct Reporter<'a> {
    observer: Option<&'a mut (dyn PipelineObserver + 'static)>,
    cancel: &'a CancellationToken,
    stage: BuildStage,
}

impl<'a> Reporter<'a> {
    fn new(
        observer: Option<&'a mut (dyn PipelineObserver + 'static)>,
        cancel: &'a CancellationToken,
        stage: BuildStage,
    ) -> Self {
        Self {
            observer,
            cancel,
            stage,
        }
    }

    fn report(&mut self, started: bool, finished: bool, local: f64) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let (lo, hi) = self.stage.window();
        let fraction = lo + (hi - lo) * local.clamp(0.0, 1.0);
        let message = self.stage.message();
        let go = self
            .observer
            .as_mut()
            .is_none_or(|o| o.progress(started, finished, fraction, message));
        if !go {
            self.cancel.cancel();
        }
        go
    }

    /// Runs `work` between a start and a finish report.
    fn run<T>(
        &mut self,
        work: impl FnOnce(&mut dyn FnMut(f64) -> bool) -> Result<Option<T>>,
    ) -> Result<Option<T>> {
        if !self.report(true, false, 0.0) {
            return Ok(None);
        }
        let result = work(&mut |f: f64| self.report(false, false, f))?;
        Ok(result.filter(|_| self.report(false, true, 1.0)))
    }
}

/// Builds the roadmap of an instrument's configuration space and answers
/// path queries on it.
pub struct PathsBuilder {
    config: PathsConfig,
    stage: BuildStage,
    cancel: CancellationToken,
    observer: Option<Box<dyn PipelineObserver>>,
    config_space: Option<ConfigSpace>,
    wall_index: Option<WallIndex>,
    contours: Contours,
    arrangement: SegmentArrangement,
    voronoi: VoronoiDiagram,
}

impl Default for PathsBuilder {
    fn default() -> Self {
        Self::new(PathsConfig::default())
    }
}

impl fmt::Debug for PathsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathsBuilder")
            .field("config", &self.config)
            .field("stage", &self.stage)
            .field("contours", &self.contours.simplified.len())
            .field("segments", &self.arrangement.segments.len())
            .field("voronoi_vertices", &self.voronoi.vertices.len())
            .finish_non_exhaustive()
    }
}

impl PathsBuilder {
    #[must_use]
    pub fn new(config: PathsConfig) -> Self {
        Self {
            config,
            stage: BuildStage::Idle,
            cancel: CancellationToken::new(),
            observer: None,
            config_space: None,
            wall_index: None,
            contours: Contours::default(),
            arrangement: SegmentArrangement::default(),
            voronoi: VoronoiDiagram::default(),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_observer(&mut self, observer: Option<Box<dyn PipelineObserver>>) {
        self.observer = observer;
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn PipelineObserver>> {
        self.observer.take()
    }

    #[must_use]
    pub fn config(&self) -> &PathsConfig {
        &self.config
    }

    /// Replaces the configuration and invalidates the mesh.
    pub fn set_config(&mut self, config: PathsConfig) {
        self.config = config;
        self.invalidate();
    }

    #[must_use]
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.stage == BuildStage::Ready
    }

    /// Token checked between and within stages; cancelling it aborts the
    /// running calculation.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn config_space(&self) -> Option<&ConfigSpace> {
        self.config_space.as_ref()
    }

    #[must_use]
    pub fn wall_index(&self) -> Option<&WallIndex> {
        self.wall_index.as_ref()
    }

    /// Simplified obstacle contours in pixel coordinates.
    #[must_use]
    pub fn contours(&self) -> &[Vec<Point2>] {
        &self.contours.simplified
    }

    /// Obstacle contours as traced from the grid.
    #[must_use]
    pub fn full_contours(&self) -> &[Vec<Point2>] {
        &self.contours.full
    }

    #[must_use]
    pub fn line_segments(&self) -> &[LineSegment] {
        &self.arrangement.segments
    }

    /// Index ranges into [`line_segments`](Self::line_segments), one per group.
    #[must_use]
    pub fn line_segment_groups(&self) -> &[(usize, usize)] {
        &self.arrangement.groups
    }

    /// The roadmap in pixel coordinates.
    #[must_use]
    pub fn voronoi(&self) -> &VoronoiDiagram {
        &self.voronoi
    }

    /// Drops all products and notifies the observer. Call whenever the
    /// instrument geometry changes.
    pub fn invalidate(&mut self) {
        self.clear_after(BuildStage::Idle);
        self.stage = BuildStage::Idle;
        if let Some(observer) = self.observer.as_mut() {
            observer.mesh_invalidated();
        }
    }

    fn clear_after(&mut self, stage: BuildStage) {
        if stage < BuildStage::ConfigSpaceCalculated {
            self.config_space = None;
        }
        if stage < BuildStage::WallIndexBuilt {
            self.wall_index = None;
        }
        if stage < BuildStage::ContoursExtracted {
            self.contours = Contours::default();
        }
        if stage < BuildStage::SegmentsExtracted {
            self.arrangement = SegmentArrangement::default();
        }
        if stage < BuildStage::VoronoiBuilt {
            self.voronoi = VoronoiDiagram::default();
        }
    }

    /// Checks that `previous` has completed and discards everything after it.
    fn enter(&mut self, previous: BuildStage) -> Result<()> {
        if self.stage < previous {
            return Err(PipelineError::InvalidState {
                required: previous.name(),
                actual: self.stage.name(),
            }
            .into());
        }
        if self.stage == BuildStage::Ready {
            if let Some(observer) = self.observer.as_mut() {
                observer.mesh_invalidated();
            }
        }
        self.clear_after(previous);
        self.stage = previous;
        Ok(())
    }

    /// Resolves a stage outcome: cancellation and failure reset to `Idle`.
    fn settle<T>(&mut self, stage: BuildStage, outcome: Result<Option<T>>) -> Result<Option<T>> {
        match outcome {
            Ok(Some(value)) => {
                self.stage = stage;
                Ok(Some(value))
            }
            Ok(None) => {
                tracing::info!(stage = stage.name(), "mesh calculation aborted");
                self.clear_after(BuildStage::Idle);
                self.stage = BuildStage::Idle;
                self.cancel.reset();
                Ok(None)
            }
            Err(e) => {
                tracing::error!(stage = stage.name(), error = %e, "mesh calculation failed");
                self.clear_after(BuildStage::Idle);
                self.stage = BuildStage::Idle;
                Err(PipelineError::StageFailed {
                    stage: stage.name(),
                    message: e.to_string(),
                }
                .into())
            }
        }
    }

    fn missing(&self, product: BuildStage) -> PathsError {
        PipelineError::InvalidState {
            required: product.name(),
            actual: self.stage.name(),
        }
        .into()
    }

    /// Samples the instrument's collision predicate on the angular grid.
    ///
    /// Returns `Ok(false)` if the calculation was cancelled.
    ///
    /// # Errors
    ///
    /// `PipelineError::StageFailed` for an invalid grid layout.
    pub fn calculate_config_space<I: Instrument + ?Sized>(&mut self, instrument: &I) -> Result<bool> {
        self.enter(BuildStage::Idle)?;
        let stage = BuildStage::ConfigSpaceCalculated;
        let params = ConfigSpaceParams {
            step: self.config.grid_step,
            padding: self.config.grid_padding,
            parallel: self.config.parallel_grid,
        };
        let mut reporter = Reporter::new(self.observer.as_deref_mut(), &self.cancel, stage);
        let outcome =
            reporter.run(|progress| SampleConfigSpace::new(params).execute(instrument, progress));
        let space = self.settle(stage, outcome)?;
        let done = space.is_some();
        self.config_space = space;
        Ok(done)
    }

    /// Indexes the wall pixels for clearance queries.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` without a configuration space.
    pub fn calculate_wall_index(&mut self) -> Result<bool> {
        self.enter(BuildStage::ConfigSpaceCalculated)?;
        let stage = BuildStage::WallIndexBuilt;
        let space = self
            .config_space
            .as_ref()
            .ok_or_else(|| self.missing(BuildStage::ConfigSpaceCalculated))?;
        let mut reporter = Reporter::new(self.observer.as_deref_mut(), &self.cancel, stage);
        let outcome = reporter.run(|_| Ok(Some(WallIndex::build(space))));
        let index = self.settle(stage, outcome)?;
        let done = index.is_some();
        self.wall_index = index;
        Ok(done)
    }

    /// Traces and simplifies the obstacle boundaries.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` before the wall index is built.
    pub fn calculate_wall_contours(&mut self) -> Result<bool> {
        self.enter(BuildStage::WallIndexBuilt)?;
        let stage = BuildStage::ContoursExtracted;
        let space = self
            .config_space
            .as_ref()
            .ok_or_else(|| self.missing(BuildStage::ConfigSpaceCalculated))?;
        let params = ContourParams {
            simplify: self.config.simplify_contour,
            min_dist: self.config.simplify_mindist,
            eps_angular: self.config.eps_angular.to_radians(),
            convex_split: self.config.convex_split,
            eps: self.config.eps,
        };
        let mut reporter = Reporter::new(self.observer.as_deref_mut(), &self.cancel, stage);
        let outcome =
            reporter.run(|progress| Ok(ExtractContours::new(params).execute(space, progress)));
        let contours = self.settle(stage, outcome)?;
        let done = contours.is_some();
        self.contours = contours.unwrap_or_default();
        Ok(done)
    }

    /// Turns the contours into grouped line segments.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` before the contours are extracted.
    pub fn calculate_line_segments(&mut self) -> Result<bool> {
        self.enter(BuildStage::ContoursExtracted)?;
        let stage = BuildStage::SegmentsExtracted;
        let space = self
            .config_space
            .as_ref()
            .ok_or_else(|| self.missing(BuildStage::ConfigSpaceCalculated))?;
        let contours = &self.contours.simplified;
        let eps = self.config.eps;
        let mut reporter = Reporter::new(self.observer.as_deref_mut(), &self.cancel, stage);
        let outcome = reporter.run(|_| {
            Ok(Some(arrange_segments(
                contours,
                space.width(),
                space.height(),
                eps,
            )))
        });
        let arrangement = self.settle(stage, outcome)?;
        let done = arrangement.is_some();
        self.arrangement = arrangement.unwrap_or_default();
        Ok(done)
    }

    /// Builds the Voronoi diagram of the line segments and keeps the part
    /// lying in free space as the roadmap.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` before the segments exist, and
    /// `PipelineError::StageFailed` if the diagram cannot be built.
    pub fn calculate_voronoi(&mut self) -> Result<bool> {
        self.enter(BuildStage::SegmentsExtracted)?;
        let stage = BuildStage::VoronoiBuilt;
        let space = self
            .config_space
            .as_ref()
            .ok_or_else(|| self.missing(BuildStage::ConfigSpaceCalculated))?;
        let params = SegmentVoronoiParams {
            backend: self.config.voronoi_backend,
            sample_step: self.config.segment_sample_step,
            vertex_eps: self.config.voronoi_vertex_eps,
            group_lines: true,
            eps: self.config.eps,
            ..SegmentVoronoiParams::default()
        };
        let use_region = self.config.use_region_function;
        let polygons = if use_region {
            Vec::new()
        } else {
            self.arrangement.polygons.clone()
        };
        let segments = &self.arrangement.segments;
        let mut reporter = Reporter::new(self.observer.as_deref_mut(), &self.cancel, stage);
        let outcome = reporter.run(|_| {
            let in_obstacle = |p: &Point2| space.is_forbidden(p);
            let region: Option<RegionFn<'_>> = if use_region {
                Some(&in_obstacle)
            } else {
                None
            };
            SegmentVoronoi::new(params)
                .with_polygons(polygons)
                .execute(segments, region)
                .map(Some)
        });
        let diagram = self.settle(stage, outcome)?;
        let done = diagram.is_some();
        self.voronoi = diagram.unwrap_or_default();
        Ok(done)
    }

    /// Marks the roadmap as usable and notifies the observer.
    ///
    /// # Errors
    ///
    /// `PipelineError::InvalidState` before the Voronoi diagram is built.
    pub fn finish_mesh(&mut self) -> Result<bool> {
        if self.stage < BuildStage::VoronoiBuilt {
            return Err(self.missing(BuildStage::VoronoiBuilt));
        }
        if self.cancel.is_cancelled() {
            return self.settle::<()>(BuildStage::Ready, Ok(None)).map(|_| false);
        }
        self.stage = BuildStage::Ready;
        tracing::info!(
            vertices = self.voronoi.vertices.len(),
            edges = self.voronoi.graph.num_edges(),
            "path mesh ready"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer.mesh_ready();
        }
        Ok(true)
    }

    /// Runs all stages in order.
    pub fn calculate_mesh<I: Instrument + ?Sized>(&mut self, instrument: &I) -> PipelineStatus {
        self.invalidate();
        tracing::info!("mesh calculation started");
        let outcome = self.run_stages(instrument);
        match outcome {
            Ok(true) => PipelineStatus::Ready,
            Ok(false) => PipelineStatus::Aborted,
            Err(e) => PipelineStatus::Failed(e),
        }
    }

    fn run_stages<I: Instrument + ?Sized>(&mut self, instrument: &I) -> Result<bool> {
        Ok(self.calculate_config_space(instrument)?
            && self.calculate_wall_index()?
            && self.calculate_wall_contours()?
            && self.calculate_line_segments()?
            && self.calculate_voronoi()?
            && self.finish_mesh()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::roadmap::instrument::{InstrumentSnapshot, Obstacle};

    #[derive(Default)]
    struct Log {
        fractions: Vec<f64>,
        messages: Vec<String>,
        invalidated: usize,
        ready: usize,
    }

    struct Recorder {
        log: Arc<Mutex<Log>>,
        stop_at: Option<&'static str>,
    }

    impl PipelineObserver for Recorder {
        fn progress(&mut self, _: bool, _: bool, fraction: f64, message: &str) -> bool {
            let mut log = self.log.lock().unwrap();
            log.fractions.push(fraction);
            log.messages.push(message.to_owned());
            self.stop_at != Some(message)
        }

        fn mesh_invalidated(&mut self) {
            self.log.lock().unwrap().invalidated += 1;
        }

        fn mesh_ready(&mut self) {
            self.log.lock().unwrap().ready += 1;
        }
    }

    fn recorder(stop_at: Option<&'static str>) -> (Box<dyn PipelineObserver>, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let observer = Recorder {
            log: Arc::clone(&log),
            stop_at,
        };
        (Box::new(observer), log)
    }

    fn instrument() -> InstrumentSnapshot {
        let mut instr = InstrumentSnapshot::new((0.0, 40.0), (0.0, 30.0));
        instr.add_obstacle(Obstacle::rectangle(
            "block",
            Point2::new(15.0, 10.0),
            Point2::new(25.0, 20.0),
        ));
        instr
    }

    fn config() -> PathsConfig {
        PathsConfig::default().with_grid_step(1.0, 1.0)
    }

    #[test]
    fn full_pipeline_reaches_ready() {
        let (observer, log) = recorder(None);
        let mut builder = PathsBuilder::new(config()).with_observer(observer);
        let status = builder.calculate_mesh(&instrument());
        assert!(status.is_ready(), "{status:?}");
        assert_eq!(builder.stage(), BuildStage::Ready);

        let space = builder.config_space().unwrap();
        assert_eq!((space.width(), space.height()), (41, 31));
        assert_eq!(builder.full_contours().len(), 1);
        // Obstacle group plus four frame sides.
        assert_eq!(builder.line_segment_groups().len(), 5);
        let voronoi = builder.voronoi();
        assert!(!voronoi.is_empty());
        assert!(voronoi.graph.num_edges() > 0);
        assert!(voronoi.vertices.iter().all(|v| !space.is_forbidden(v)));

        let log = log.lock().unwrap();
        assert_eq!(log.ready, 1);
        assert_eq!(log.invalidated, 1);
        assert!(log.fractions.windows(2).all(|w| w[0] <= w[1]));
        assert!((log.fractions.last().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn observer_vote_aborts_to_idle() {
        let (observer, log) = recorder(Some(BuildStage::ContoursExtracted.message()));
        let mut builder = PathsBuilder::new(config()).with_observer(observer);
        let status = builder.calculate_mesh(&instrument());
        assert!(matches!(status, PipelineStatus::Aborted));
        assert_eq!(builder.stage(), BuildStage::Idle);
        assert!(builder.config_space().is_none());
        assert!(builder.voronoi().is_empty());
        assert_eq!(log.lock().unwrap().ready, 0);
        // The token is cleared again for the next run.
        assert!(!builder.cancellation_token().is_cancelled());
        builder.set_observer(None);
        assert!(builder.calculate_mesh(&instrument()).is_ready());
    }

    #[test]
    fn cancelled_token_aborts_before_first_stage() {
        let mut builder = PathsBuilder::new(config());
        builder.cancellation_token().cancel();
        let status = builder.calculate_mesh(&instrument());
        assert!(matches!(status, PipelineStatus::Aborted));
        assert_eq!(builder.stage(), BuildStage::Idle);
    }

    #[test]
    fn stages_must_run_in_order() {
        let mut builder = PathsBuilder::new(config());
        let err = builder.calculate_wall_contours().unwrap_err();
        assert!(matches!(
            err,
            PathsError::Pipeline(PipelineError::InvalidState { .. })
        ));
        assert!(builder.calculate_config_space(&instrument()).unwrap());
        assert!(builder.calculate_wall_index().unwrap());
        assert_eq!(builder.stage(), BuildStage::WallIndexBuilt);
        assert!(builder.calculate_voronoi().is_err());
        // The rejected call leaves the completed stages alone.
        assert_eq!(builder.stage(), BuildStage::WallIndexBuilt);
    }

    #[test]
    fn rerunning_a_stage_discards_later_products() {
        let mut builder = PathsBuilder::new(config());
        assert!(builder.calculate_mesh(&instrument()).is_ready());
        assert!(builder.calculate_wall_contours().unwrap());
        assert_eq!(builder.stage(), BuildStage::ContoursExtracted);
        assert!(builder.line_segments().is_empty());
        assert!(builder.voronoi().is_empty());
    }

    #[test]
    fn invalid_grid_fails_and_resets() {
        let mut builder = PathsBuilder::new(PathsConfig::default().with_grid_step(-1.0, 1.0));
        let status = builder.calculate_mesh(&instrument());
        match status {
            PipelineStatus::Failed(PathsError::Pipeline(PipelineError::StageFailed {
                stage, ..
            })) => assert_eq!(stage, "configuration space"),
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(builder.stage(), BuildStage::Idle);
    }
}
