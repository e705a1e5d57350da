use mezo_core::EngineError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum RasterError {
    /// A pixmap of this size could not be allocated.
    Allocation { width: u32, height: u32 },
    /// Two rasters that must line up have different dimensions.
    SizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    /// A circle could not be turned into a path (non-finite geometry).
    Shape(String),
    Decode(String),
    Encode(String),
    Io(String),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::Allocation { width, height } => {
                write!(f, "cannot allocate {width}x{height} raster")
            }
            RasterError::SizeMismatch { expected, found } => write!(
                f,
                "raster is {}x{}, expected {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            RasterError::Shape(msg) => write!(f, "bad shape: {msg}"),
            RasterError::Decode(msg) => write!(f, "decode failed: {msg}"),
            RasterError::Encode(msg) => write!(f, "encode failed: {msg}"),
            RasterError::Io(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RasterError {}

impl From<RasterError> for EngineError {
    fn from(err: RasterError) -> Self {
        EngineError::Raster(err.to_string())
    }
}
