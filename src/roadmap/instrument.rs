use slotmap::SlotMap;

use crate::math::polygon_2d::point_in_polygon;
use crate::math::Point2;

/// The two controlled instrument axes spanning the configuration space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Sample scattering angle (`a4`), the horizontal grid axis.
    Sample,
    /// Monochromator scattering angle (`a2`), the vertical grid axis.
    Monochromator,
}

/// Collision model of a two-axis instrument.
///
/// Angles are in degrees. Implementations are queried from several threads
/// while the configuration space is evaluated, and must not change while a
/// mesh calculation runs.
pub trait Instrument: Sync {
    /// Whether the instrument collides with itself or its surroundings at
    /// the configuration `(a4, a2)`.
    fn check_collision(&self, a4: f64, a2: f64) -> bool;

    fn lower_limit(&self, axis: Axis) -> f64;

    fn upper_limit(&self, axis: Axis) -> f64;

    /// Whether `(a4, a2)` lies within the angular limits of both axes.
    fn within_limits(&self, a4: f64, a2: f64) -> bool {
        (self.lower_limit(Axis::Sample)..=self.upper_limit(Axis::Sample)).contains(&a4)
            && (self.lower_limit(Axis::Monochromator)..=self.upper_limit(Axis::Monochromator))
                .contains(&a2)
    }
}

slotmap::new_key_type! {
    /// Stable identifier of an obstacle in an [`InstrumentSnapshot`].
    pub struct ObstacleId;
}

/// Forbidden region of the configuration space.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub name: String,
    /// Closed polygon in `(a4, a2)` angles.
    pub polygon: Vec<Point2>,
}

impl Obstacle {
    #[must_use]
    pub fn new(name: impl Into<String>, polygon: Vec<Point2>) -> Self {
        Self {
            name: name.into(),
            polygon,
        }
    }

    /// Axis-aligned rectangle spanning the two corners.
    #[must_use]
    pub fn rectangle(name: impl Into<String>, min: Point2, max: Point2) -> Self {
        Self::new(
            name,
            vec![
                min,
                Point2::new(max.x, min.y),
                max,
                Point2::new(min.x, max.y),
            ],
        )
    }

    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        point_in_polygon(&self.polygon, p)
    }
}

/// In-memory instrument: axis limits plus obstacle polygons drawn directly
/// in configuration space.
#[derive(Debug, Clone)]
pub struct InstrumentSnapshot {
    limits: [(f64, f64); 2],
    obstacles: SlotMap<ObstacleId, Obstacle>,
}

impl InstrumentSnapshot {
    /// Creates an instrument without obstacles.
    #[must_use]
    pub fn new(sample_limits: (f64, f64), mono_limits: (f64, f64)) -> Self {
        Self {
            limits: [sample_limits, mono_limits],
            obstacles: SlotMap::with_key(),
        }
    }

    pub fn set_limits(&mut self, axis: Axis, lower: f64, upper: f64) {
        self.limits[axis_slot(axis)] = (lower, upper);
    }

    /// Inserts an obstacle and returns its ID.
    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> ObstacleId {
        self.obstacles.insert(obstacle)
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Option<Obstacle> {
        self.obstacles.remove(id)
    }

    #[must_use]
    pub fn obstacle(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(id)
    }

    pub fn obstacle_mut(&mut self, id: ObstacleId) -> Option<&mut Obstacle> {
        self.obstacles.get_mut(id)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = (ObstacleId, &Obstacle)> {
        self.obstacles.iter()
    }

    #[must_use]
    pub fn num_obstacles(&self) -> usize {
        self.obstacles.len()
    }
}

fn axis_slot(axis: Axis) -> usize {
    match axis {
        Axis::Sample => 0,
        Axis::Monochromator => 1,
    }
}

impl Instrument for InstrumentSnapshot {
    fn check_collision(&self, a4: f64, a2: f64) -> bool {
        let p = Point2::new(a4, a2);
        self.obstacles.values().any(|o| o.contains(&p))
    }

    fn lower_limit(&self, axis: Axis) -> f64 {
        self.limits[axis_slot(axis)].0
    }

    fn upper_limit(&self, axis: Axis) -> f64 {
        self.limits[axis_slot(axis)].1
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn obstacles_keep_ids_across_removal() {
        let mut instr = InstrumentSnapshot::new((0.0, 100.0), (0.0, 50.0));
        let a = instr.add_obstacle(Obstacle::rectangle(
            "a",
            Point2::new(10.0, 10.0),
            Point2::new(20.0, 20.0),
        ));
        let b = instr.add_obstacle(Obstacle::rectangle(
            "b",
            Point2::new(50.0, 10.0),
            Point2::new(60.0, 20.0),
        ));
        assert!(instr.check_collision(15.0, 15.0));
        assert!(instr.remove_obstacle(a).is_some());
        assert!(!instr.check_collision(15.0, 15.0));
        assert_eq!(instr.obstacle(b).unwrap().name, "b");
        assert!(instr.obstacle(a).is_none());
        assert_eq!(instr.num_obstacles(), 1);
    }

    #[test]
    fn limits_per_axis() {
        let mut instr = InstrumentSnapshot::new((0.0, 100.0), (0.0, 50.0));
        instr.set_limits(Axis::Monochromator, 10.0, 40.0);
        assert!(instr.within_limits(100.0, 10.0));
        assert!(!instr.within_limits(50.0, 45.0));
        assert!((instr.upper_limit(Axis::Sample) - 100.0).abs() < f64::EPSILON);
    }
}
