pub mod bisector;
pub mod segment;

pub use bisector::{
    parabolic_bisector, polyline_between, polyline_closest, polyline_length, BisectorKind,
};
pub use segment::LineSegment;
