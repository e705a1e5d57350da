pub mod config;
pub mod error;
pub mod gesture;
pub mod id;
pub mod model;
pub mod overlap;
pub mod stats;
pub mod store;
pub mod viewport;

pub use config::{ChromeInsets, EditorConfig, MezoStyle, ViewportConfig};
pub use error::{EngineError, EngineResult};
pub use gesture::{Gesture, GestureOutcome};
pub use id::{ImageId, MezoId};
pub use model::*;
pub use overlap::{OverlapSet, overlap_closure};
pub use stats::{AnalysisSummary, MezoRow};
pub use store::{AnnotationStore, FileRecordStore, MemoryRecordStore, RecordStore};
pub use viewport::{Margin, ViewportState, viewer_size_for};

// Geometry types used across the public API.
pub use kurbo::{Point, Rect, Size, Vec2};
