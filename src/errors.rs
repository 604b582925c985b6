//! Error types produced while loading configurations and solving mooring lines.

use std::path::PathBuf;

use thiserror::Error;

/// Error returned when a configuration cannot be loaded or fails validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when the configuration file does not exist.
    #[error("File '{}' not found", path.display())]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },
    /// Returned when the configuration file exists but cannot be read.
    #[error("Unable to read `{}`", path.display())]
    Read {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the contents are not a valid configuration document.
    #[error("Unable to load data from `{origin}`")]
    Parse {
        /// File path, or `<memory>` for documents parsed from a string.
        origin: String,
        /// Underlying TOML failure.
        #[source]
        source: Box<toml::de::Error>,
    },
    /// Returned when a segment refers to a line type that is not defined.
    #[error("line '{line}' segment {segment} references unknown line type '{line_type}'")]
    UnknownLineType {
        /// Name of the offending line.
        line: String,
        /// Zero-based index of the offending segment.
        segment: usize,
        /// The undefined line type name.
        line_type: String,
    },
    /// Returned when a numeric field holds a value that is not physically meaningful.
    #[error("{field} has invalid value {value}")]
    InvalidValue {
        /// Dotted path of the field, e.g. `line_types.chain.diameter`.
        field: String,
        /// Rejected value.
        value: f64,
    },
}

/// Error returned when a line cannot be discretized into elements.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    /// Returned when a line has no segments.
    #[error("line has no segments")]
    EmptyLine,
    /// Returned when a segment asks for zero or a negative number of elements.
    #[error("segment {segment} has invalid element count {num_elements}")]
    InvalidDiscretization {
        /// Zero-based index of the segment.
        segment: usize,
        /// Rejected element count.
        num_elements: i32,
    },
    /// Returned when a segment has no length.
    #[error("segment {segment} has non-positive length {length}")]
    ZeroLengthSegment {
        /// Zero-based index of the segment.
        segment: usize,
        /// Rejected length.
        length: f64,
    },
    /// Returned when a line type is absent from the material catalog.
    #[error("unknown line type '{0}'")]
    UnknownLineType(String),
    /// Returned when a line type has no axial stiffness.
    #[error("line type '{line_type}' has non-positive axial stiffness {axial_stiffness}")]
    NonPositiveStiffness {
        /// Name of the line type.
        line_type: String,
        /// Derived axial stiffness.
        axial_stiffness: f64,
    },
}

/// Error returned when the shooting solver cannot find an equilibrium.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SolveError {
    /// Returned when the iteration budget is exhausted.
    #[error("no equilibrium after {iterations} iterations (residual {residual:.3e})")]
    DidNotConverge {
        /// Number of iterations performed.
        iterations: usize,
        /// Largest residual component at the last iterate.
        residual: f64,
    },
    /// Returned when the end-point sensitivity matrix cannot be inverted.
    #[error("end-point Jacobian is singular at iteration {iteration}")]
    SingularJacobian {
        /// Iteration at which the matrix was singular.
        iteration: usize,
    },
    /// Returned when the integrator produces NaN or infinite values.
    #[error("integration produced non-finite values at iteration {iteration}")]
    NonFiniteState {
        /// Iteration at which the failure happened.
        iteration: usize,
    },
    /// Returned when a node of the converged profile has negative tension.
    #[error("node {node} carries non-physical tension {tension:.6e}")]
    NonPhysicalTension {
        /// Zero-based index of the node, counted from the bottom.
        node: usize,
        /// Tension at the node.
        tension: f64,
    },
}

/// Error returned for a single line of a mooring system.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LineError {
    /// Returned when the requested line is not part of the configuration.
    #[error("line '{0}' does not exist in this configuration")]
    UnknownLine(String),
    /// Returned when the line cannot be meshed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// Returned when the line cannot be brought into equilibrium.
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// Error returned by [`MooringSystem`](crate::MooringSystem) operations.
#[derive(Debug, Error)]
pub enum SystemError {
    /// Returned when the configuration cannot be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Returned by the fail policy when at least one line has no solution.
    #[error("line '{line}' failed ({failures} failing line(s) in total): {source}")]
    LineFailed {
        /// First failing line in configuration order.
        line: String,
        /// Number of lines that failed.
        failures: usize,
        /// Failure of `line`.
        #[source]
        source: LineError,
    },
}
