pub mod history;
pub mod input;
pub mod oracle;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use history::{UndoAction, UndoEntry, UndoHistory};
pub use input::InputEvent;
pub use oracle::{BinaryMask, ColorThresholdOracle, SegmentationOracle, circle_from_mask};
pub use session::{
    ClickOutcome, Document, EditorSession, ImageSource, InputOutcome, UndoReport,
};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{EscapeOutcome, ToolAction, ToolKind, ToolState};
