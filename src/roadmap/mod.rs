//! Roadmap construction and path planning in the `(a4, a2)` angle space of
//! a triple-axis instrument.
//!
//! The configuration space is sampled on a grid, the boundaries of its
//! colliding regions are turned into line segments, and the Voronoi diagram
//! of those segments serves as the roadmap searched by [`PathsBuilder::find_path`].
//! Grid, contours, segments and the diagram use pixel coordinates; paths
//! and instrument queries use angles in degrees.

pub mod builder;
pub mod config;
pub mod config_space;
pub mod contours;
pub mod export;
pub mod instrument;
pub mod observer;
pub mod path;
pub mod segments;
pub mod task;
pub mod wall_index;

pub use builder::{BuildStage, PathsBuilder, PipelineStatus};
pub use config::{PathStrategy, PathsConfig};
pub use config_space::{Cell, ConfigSpace};
pub use export::{
    read_raw_path, read_raw_path_file, ExportSettings, NicosExporter, NomadExporter,
    PathsExporter, RawExporter,
};
pub use instrument::{Axis, Instrument, InstrumentSnapshot, Obstacle, ObstacleId};
pub use observer::{BuildProgress, CancellationToken, ChannelObserver, MeshEvent, PipelineObserver};
pub use path::{InstrumentPath, PathLength};
pub use task::MeshTask;
