pub mod error;
pub mod geometry;
pub mod graph;
pub mod hull;
pub mod math;
pub mod roadmap;
pub mod triangulation;
pub mod voronoi;

pub use error::{PathsError, Result};
