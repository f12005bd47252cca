//! Discretized configuration space.
//!
//! Pixel `(x, y)` holds the state of the configuration
//! `origin + (x * step_a4, y * step_a2)`. Pixel coordinates are continuous:
//! the cell of a pixel position is found by rounding.

use rayon::prelude::*;

use crate::error::{GeometryError, Result};
use crate::math::{Point2, Vector2};

use super::instrument::{Axis, Instrument};

/// Number of progress reports while sampling the grid.
const PROGRESS_BANDS: usize = 25;

/// Largest accepted grid extent along one axis.
const MAX_GRID_DIM: usize = 1 << 14;

/// State of one configuration space cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Free,
    Colliding,
    /// Outside the angular limits, only present in the padding.
    OutOfLimits,
}

impl Cell {
    #[must_use]
    pub fn is_free(self) -> bool {
        self == Self::Free
    }
}

/// Collision grid over the two instrument angles.
#[derive(Debug, Clone)]
pub struct ConfigSpace {
    width: usize,
    height: usize,
    origin: Point2,
    step: Vector2,
    cells: Vec<Cell>,
}

impl ConfigSpace {
    /// Grid of `width * height` cells in the given state.
    #[must_use]
    pub fn filled(width: usize, height: usize, origin: Point2, step: Vector2, cell: Cell) -> Self {
        Self {
            width,
            height,
            origin,
            step,
            cells: vec![cell; width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Angles of pixel `(0, 0)`.
    #[must_use]
    pub fn origin(&self) -> Point2 {
        self.origin
    }

    /// Angular size of one cell.
    #[must_use]
    pub fn step(&self) -> Vector2 {
        self.step
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<Cell> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    /// Cell state with out-of-grid positions reported as `None`.
    #[must_use]
    pub fn cell_signed(&self, x: i64, y: i64) -> Option<Cell> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.cell(x, y)
    }

    #[must_use]
    pub fn pixel_to_angle(&self, pixel: &Point2) -> Point2 {
        self.origin + pixel.coords.component_mul(&self.step)
    }

    #[must_use]
    pub fn angle_to_pixel(&self, angle: &Point2) -> Point2 {
        Point2::from((angle - self.origin).component_div(&self.step))
    }

    /// Cell containing a (continuous) pixel position.
    #[must_use]
    pub fn cell_at_pixel(&self, pixel: &Point2) -> Option<Cell> {
        if !pixel.x.is_finite() || !pixel.y.is_finite() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = (pixel.x.round() as i64, pixel.y.round() as i64);
        self.cell_signed(x, y)
    }

    #[must_use]
    pub fn cell_at_angle(&self, angle: &Point2) -> Option<Cell> {
        self.cell_at_pixel(&self.angle_to_pixel(angle))
    }

    /// Whether a pixel position lies outside the grid or in a non-free cell.
    #[must_use]
    pub fn is_forbidden(&self, pixel: &Point2) -> bool {
        !self.cell_at_pixel(pixel).is_some_and(Cell::is_free)
    }

    #[must_use]
    pub fn num_colliding(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_free()).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }
}

/// Grid resolution and layout for [`SampleConfigSpace`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigSpaceParams {
    /// Degrees per cell along `a4` and `a2`.
    pub step: [f64; 2],
    /// Cells added beyond the limits on every side.
    pub padding: usize,
    pub parallel: bool,
}

impl Default for ConfigSpaceParams {
    fn default() -> Self {
        Self {
            step: [0.5, 0.5],
            padding: 0,
            parallel: true,
        }
    }
}

/// Evaluates an instrument's collision predicate on every grid cell.
#[derive(Debug, Clone, Default)]
pub struct SampleConfigSpace {
    params: ConfigSpaceParams,
}

struct Layout {
    origin: Point2,
    step: Vector2,
    lower: Point2,
    upper: Point2,
    width: usize,
    height: usize,
}

impl SampleConfigSpace {
    #[must_use]
    pub fn new(params: ConfigSpaceParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.params.parallel = parallel;
        self
    }

    /// Samples the grid row by row.
    ///
    /// `progress` is called with the completed fraction after every band of
    /// rows; returning `false` stops the evaluation and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::InvalidParameter` for non-positive steps,
    /// inverted or non-finite limits, or an oversized grid.
    pub fn execute<I: Instrument + ?Sized>(
        &self,
        instrument: &I,
        progress: &mut dyn FnMut(f64) -> bool,
    ) -> Result<Option<ConfigSpace>> {
        let layout = self.layout(instrument)?;
        let width = layout.width;
        let mut space = ConfigSpace::filled(
            width,
            layout.height,
            layout.origin,
            layout.step,
            Cell::Free,
        );

        let band_rows = layout.height.div_ceil(PROGRESS_BANDS).max(1);
        for (band, chunk) in space.cells.chunks_mut(band_rows * width).enumerate() {
            let first_row = band * band_rows;
            let fill = |(i, row): (usize, &mut [Cell])| {
                fill_row(row, first_row + i, &layout, instrument);
            };
            if self.params.parallel {
                chunk.par_chunks_mut(width).enumerate().for_each(fill);
            } else {
                chunk.chunks_mut(width).enumerate().for_each(fill);
            }

            #[allow(clippy::cast_precision_loss)]
            let done = ((first_row + band_rows).min(layout.height)) as f64 / layout.height as f64;
            if !progress(done) {
                tracing::debug!(rows = first_row + band_rows, "grid sampling stopped");
                return Ok(None);
            }
        }

        tracing::debug!(
            width = space.width,
            height = space.height,
            colliding = space.num_colliding(),
            "configuration space sampled"
        );
        Ok(Some(space))
    }

    fn layout<I: Instrument + ?Sized>(&self, instrument: &I) -> Result<Layout> {
        let lower = Point2::new(
            instrument.lower_limit(Axis::Sample),
            instrument.lower_limit(Axis::Monochromator),
        );
        let upper = Point2::new(
            instrument.upper_limit(Axis::Sample),
            instrument.upper_limit(Axis::Monochromator),
        );
        let step = Vector2::new(self.params.step[0], self.params.step[1]);

        let width = axis_cells(lower.x, upper.x, step.x, self.params.padding)?;
        let height = axis_cells(lower.y, upper.y, step.y, self.params.padding)?;

        #[allow(clippy::cast_precision_loss)]
        let pad = self.params.padding as f64;
        Ok(Layout {
            origin: lower - step * pad,
            step,
            lower,
            upper,
            width,
            height,
        })
    }
}

fn axis_cells(lower: f64, upper: f64, step: f64, padding: usize) -> Result<usize> {
    if !(step.is_finite() && step > 0.0) {
        return Err(GeometryError::InvalidParameter(format!("grid step {step}")).into());
    }
    if !(lower.is_finite() && upper.is_finite() && lower <= upper) {
        return Err(
            GeometryError::InvalidParameter(format!("angular limits [{lower}, {upper}]")).into(),
        );
    }
    let span = (upper - lower) / step;
    #[allow(clippy::cast_precision_loss)]
    let max_span = MAX_GRID_DIM as f64;
    if span >= max_span {
        return Err(GeometryError::InvalidParameter(format!(
            "grid of {span:.0} cells per axis is too large"
        ))
        .into());
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cells = (span + 1e-9).floor() as usize + 1;
    Ok(cells + 2 * padding)
}

fn fill_row<I: Instrument + ?Sized>(row: &mut [Cell], y: usize, layout: &Layout, instrument: &I) {
    let tol = 1e-9 * layout.step.x.max(layout.step.y);
    #[allow(clippy::cast_precision_loss)]
    let a2 = layout.origin.y + y as f64 * layout.step.y;
    let a2_inside = a2 >= layout.lower.y - tol && a2 <= layout.upper.y + tol;
    for (x, cell) in row.iter_mut().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let a4 = layout.origin.x + x as f64 * layout.step.x;
        let inside = a2_inside && a4 >= layout.lower.x - tol && a4 <= layout.upper.x + tol;
        *cell = if !inside {
            Cell::OutOfLimits
        } else if instrument.check_collision(a4, a2) {
            Cell::Colliding
        } else {
            Cell::Free
        };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::roadmap::instrument::{InstrumentSnapshot, Obstacle};

    fn instrument() -> InstrumentSnapshot {
        let mut instr = InstrumentSnapshot::new((0.0, 20.0), (0.0, 10.0));
        instr.add_obstacle(Obstacle::rectangle(
            "block",
            Point2::new(4.5, 2.5),
            Point2::new(8.5, 6.5),
        ));
        instr
    }

    #[test]
    fn grid_marks_obstacle_cells() {
        let params = ConfigSpaceParams {
            step: [1.0, 1.0],
            ..ConfigSpaceParams::default()
        };
        let space = SampleConfigSpace::new(params)
            .execute(&instrument(), &mut |_| true)
            .unwrap()
            .unwrap();
        assert_eq!(space.width(), 21);
        assert_eq!(space.height(), 11);
        // Cells 5..=8 x 3..=6 lie inside the rectangle.
        assert_eq!(space.num_colliding(), 16);
        assert_eq!(space.cell(6, 4), Some(Cell::Colliding));
        assert_eq!(space.cell(2, 2), Some(Cell::Free));
        assert!(space.is_forbidden(&Point2::new(5.2, 3.4)));
        assert!(space.is_forbidden(&Point2::new(-1.0, 0.0)));
    }

    #[test]
    fn serial_and_parallel_agree() {
        let params = ConfigSpaceParams {
            step: [0.5, 0.25],
            ..ConfigSpaceParams::default()
        };
        let a = SampleConfigSpace::new(params)
            .execute(&instrument(), &mut |_| true)
            .unwrap()
            .unwrap();
        let b = SampleConfigSpace::new(params)
            .with_parallel(false)
            .execute(&instrument(), &mut |_| true)
            .unwrap()
            .unwrap();
        assert!(a.rows().zip(b.rows()).all(|(ra, rb)| ra == rb));
    }

    #[test]
    fn padding_is_out_of_limits() {
        let params = ConfigSpaceParams {
            step: [1.0, 1.0],
            padding: 2,
            parallel: false,
        };
        let space = SampleConfigSpace::new(params)
            .execute(&instrument(), &mut |_| true)
            .unwrap()
            .unwrap();
        assert_eq!(space.width(), 25);
        assert_eq!(space.cell(0, 5), Some(Cell::OutOfLimits));
        assert_eq!(space.cell(2, 2), Some(Cell::Free));
        let origin = space.pixel_to_angle(&Point2::new(2.0, 2.0));
        assert!(origin.coords.norm() < 1e-12);
    }

    #[test]
    fn pixel_angle_conversion_inverts() {
        let space = ConfigSpace::filled(
            10,
            10,
            Point2::new(-5.0, 20.0),
            Vector2::new(0.5, 2.0),
            Cell::Free,
        );
        let a = Point2::new(-3.25, 31.0);
        let p = space.angle_to_pixel(&a);
        assert!((p - Point2::new(3.5, 5.5)).norm() < 1e-12);
        assert!((space.pixel_to_angle(&p) - a).norm() < 1e-12);
    }

    #[test]
    fn progress_can_stop_sampling() {
        let mut calls = 0;
        let result = SampleConfigSpace::default()
            .execute(&instrument(), &mut |f| {
                calls += 1;
                f < 0.2
            })
            .unwrap();
        assert!(result.is_none());
        assert!(calls >= 1);
    }

    #[test]
    fn invalid_step_is_rejected() {
        let params = ConfigSpaceParams {
            step: [0.0, 1.0],
            ..ConfigSpaceParams::default()
        };
        assert!(SampleConfigSpace::new(params)
            .execute(&instrument(), &mut |_| true)
            .is_err());
    }
}
