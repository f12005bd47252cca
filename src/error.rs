use thiserror::Error;

/// Top-level error type for the path-planning engine.
#[derive(Debug, Error)]
pub enum PathsError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Voronoi(#[from] VoronoiError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("not enough points: need at least {required}, got {actual}")]
    NotEnoughPoints { required: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors related to graph containers and searches.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("vertex not found: {0}")]
    VertexNotFound(String),

    #[error("duplicate vertex: {0}")]
    DuplicateVertex(String),

    #[error("vertex index {index} out of range (vertex count {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("graph contains a negative cycle")]
    NegativeCycle,
}

/// Errors raised while building Voronoi diagrams.
#[derive(Debug, Error)]
pub enum VoronoiError {
    #[error("triangulation backend failed: {0}")]
    Backend(String),

    #[error("vertex index {index} out of range (vertex count {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no sites to build a diagram from")]
    NoSites,
}

/// Errors raised by the roadmap pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed: {message}")]
    StageFailed {
        stage: &'static str,
        message: String,
    },

    #[error("pipeline stage requires {required}, but the builder is in state {actual}")]
    InvalidState {
        required: &'static str,
        actual: &'static str,
    },

    #[error("background task panicked")]
    TaskPanicked,
}

/// Errors raised while exporting or importing paths.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("path is not valid, nothing to export")]
    InvalidPath,

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Convenience type alias for results using [`PathsError`].
pub type Result<T> = std::result::Result<T, PathsError>;
