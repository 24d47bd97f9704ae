use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for one sample calculation.
///
/// Every variant is fatal for the sample: the caller receives it as a failed
/// sample and nothing downstream substitutes a default result.
#[derive(Debug, Error)]
pub enum FlowMcError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Convergence(#[from] ConvergenceFailure),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FlowMcError {
    /// Wraps an I/O error together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while constructing the geometric domain.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("boundary region {region} matched no boundary curve")]
    NoRegionMatch { region: String },

    #[error("boundary curve matched both {first} and {second}")]
    AmbiguousRegion { first: String, second: String },

    #[error("{count} boundary curve(s) of the domain carry no region tag")]
    UntaggedBoundary { count: usize },
}

/// Errors related to entity lookups in the geometric model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("shape is not a curve")]
    NotACurve,

    #[error("shape is not a surface")]
    NotASurface,
}

/// Errors related to modelling operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Errors raised by mesh generation, mesh I/O and healing.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("meshing produced an empty region: {0}")]
    EmptyRegion(String),

    #[error("invalid mesh size policy: {0}")]
    InvalidSizePolicy(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("malformed mesh file at line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("unsupported element type {0}")]
    UnsupportedElement(u32),
}

/// Errors raised while invoking the external solver.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver input template not found: {0}")]
    TemplateMissing(PathBuf),

    #[error("failed to start solver {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("solver phase {phase} exited with status {code:?}")]
    ExitStatus { phase: String, code: Option<i32> },

    #[error("solver phase {phase} exceeded its time limit of {seconds} s")]
    Timeout { phase: String, seconds: u64 },

    #[error("no solver parameters for phase {0}")]
    UnknownPhase(String),
}

/// The solver ran but reported a negative convergence reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("solver failed to converge: reason {code} at {}:{line}", log.display())]
pub struct ConvergenceFailure {
    pub log: PathBuf,
    pub line: usize,
    pub code: i64,
}

/// Errors raised while validating extracted results.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("series has {actual} samples, time axis has {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("series contains a non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("series {bound} {value} lies outside [{min}, {max}]")]
    OutOfRange {
        bound: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("result files missing: {0:?}")]
    MissingResults(Vec<PathBuf>),

    #[error("quantity {quantity} not available for point {point}")]
    MissingQuantity { quantity: String, point: String },
}

/// Errors related to the sample configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot parse configuration: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Convenience type alias for results using [`FlowMcError`].
pub type Result<T> = std::result::Result<T, FlowMcError>;
