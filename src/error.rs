use thiserror::Error;

/// Error types for the looper-rs library.
#[derive(Error, Debug)]
pub enum LooperError {
    /// Malformed axis specification, bad vector index or unsupported scale.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The swept function failed at a specific grid coordinate.
    #[error("Evaluation failed at coordinate {coordinate:?}: {source}")]
    Evaluation {
        /// Axis values of the failing grid point, outermost axis first.
        coordinate: Vec<f64>,
        /// Error returned by the swept function.
        #[source]
        source: Box<LooperError>,
    },

    /// Evaluations within one sweep produced outputs of different shapes.
    #[error("Shape error: {0}")]
    Shape(String),

    /// Cache I/O, decode or version failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Missing parameter or parameter of the wrong kind.
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Error raised by a user-supplied function.
    #[error("Function error: {0}")]
    Function(String),

    /// The sweep was interrupted before every grid point was evaluated.
    #[error("Sweep interrupted")]
    Interrupted,

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for looper-rs operations.
pub type Result<T> = std::result::Result<T, LooperError>;

/// Conversions so swept functions can fail with a plain message.
impl From<String> for LooperError {
    fn from(s: String) -> Self {
        LooperError::Function(s)
    }
}

impl From<&str> for LooperError {
    fn from(s: &str) -> Self {
        LooperError::Function(s.to_string())
    }
}

impl LooperError {
    /// Whether this error came from the configuration rather than a running sweep.
    pub fn is_config(&self) -> bool {
        matches!(self, LooperError::Config(_))
    }
}
