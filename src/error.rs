use thiserror::Error;

/// Raised when a frame does not carry the detector's fixed keypoint layout.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GestureError {
    #[error("invalid landmark frame: expected {expected} points but got {actual}")]
    InvalidInput { expected: usize, actual: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("thresholds overlap: select_below ({select_below}) must be lower than place_above ({place_above})")]
    OverlappingThresholds { select_below: f64, place_above: f64 },

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("config i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config json failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("export json failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("export csv failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum FrameParseError {
    #[error("line {line}: malformed landmark record: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: {source}")]
    Shape {
        line: usize,
        #[source]
        source: GestureError,
    },
}

pub type Result<T, E = GestureError> = std::result::Result<T, E>;
