use thiserror::Error;

/// Error types for the holofit library.
#[derive(Error, Debug)]
pub enum HoloFitError {
    /// A parameter was declared without enough information to fit it.
    #[error("Invalid parameter specification: {0}")]
    InvalidParameterSpecification(String),

    /// A scatterer was given arguments that cannot be interpreted.
    #[error("Invalid scatterer: {0}")]
    InvalidScatterer(String),

    /// A scatterer primitive was constructed with unphysical values.
    #[error("Error defining scatterer: {0}")]
    ScattererDefinition(String),

    /// A scattering theory cannot compute a hologram for the given scatterer.
    #[error("Unrealizable scatterer: {0}")]
    UnrealizableScatterer(String),

    /// A scattering theory does not know how to handle this kind of scatterer.
    #[error("Theory not compatible: {0}")]
    TheoryNotCompatible(String),

    /// A scatterer-construction argument has no matching model parameter.
    #[error("No parameter named '{0}' to supply the scatterer builder")]
    MissingParameter(String),

    /// Error indicating a mismatch in array dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error during residual or hologram evaluation.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for holofit operations.
pub type Result<T> = std::result::Result<T, HoloFitError>;
