//! Replay scripts: a JSON array of steps fed to an `EditorSession`.
//!
//! A step is either a raw host event (tagged by `type`, see `InputEvent`)
//! or a session command tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "tool", "tool": "manual"},
//!   {"op": "click", "x": 100, "y": 100},
//!   {"op": "click", "x": 110, "y": 100},
//!   {"type": "key", "key": "z", "ctrl": true},
//!   {"op": "porosity", "value": 0.12}
//! ]
//! ```

use anyhow::{Context, Result};
use mezo_core::{MezoId, Point, RecordStore};
use mezo_editor::{EditorSession, InputEvent, SegmentationOracle, ToolKind};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Event(InputEvent),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Tool { tool: ToolName },
    /// Click on an image pixel, bypassing the viewport.
    Click { x: f64, y: f64 },
    Remove { id: u64 },
    Undo,
    Escape,
    ResetViewer,
    Porosity { value: f64 },
    Scale { px: f64, mkm: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    Magic,
    Manual,
    Remove,
}

impl From<ToolName> for ToolKind {
    fn from(name: ToolName) -> Self {
        match name {
            ToolName::Magic => ToolKind::MagicSelect,
            ToolName::Manual => ToolKind::ManualSelect,
            ToolName::Remove => ToolKind::Remove,
        }
    }
}

pub fn load(path: &Path) -> Result<Vec<Step>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read script {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid script {}", path.display()))
}

pub fn parse(text: &str) -> Result<Vec<Step>> {
    Ok(serde_json::from_str(text)?)
}

/// Run every step in order. Rejected steps (degenerate circles, clicks the
/// oracle cannot segment) are logged and skipped; the replay goes on.
pub fn run<S: RecordStore, O: SegmentationOracle>(
    session: &mut EditorSession<S, O>,
    steps: &[Step],
) -> Result<()> {
    for (i, step) in steps.iter().enumerate() {
        let result = match step {
            Step::Event(event) => session.handle_input(event).map(|o| format!("{o:?}")),
            Step::Command(command) => apply(session, command),
        };
        match result {
            Ok(outcome) => log::debug!("step {}: {outcome}", i + 1),
            Err(e) => log::warn!("step {} rejected: {e}", i + 1),
        }
    }
    Ok(())
}

fn apply<S: RecordStore, O: SegmentationOracle>(
    session: &mut EditorSession<S, O>,
    command: &Command,
) -> mezo_core::EngineResult<String> {
    match command {
        Command::Tool { tool } => session.select_tool((*tool).into()).map(|()| format!("tool {tool:?}")),
        Command::Click { x, y } => session.click(Point::new(*x, *y)).map(|o| format!("{o:?}")),
        Command::Remove { id } => session.remove(MezoId(*id)).map(|m| format!("removed {}", m.id)),
        Command::Undo => session.undo().map(|r| format!("{r:?}")),
        Command::Escape => session.escape().map(|o| format!("{o:?}")),
        Command::ResetViewer => session.reset_viewer().map(|()| "viewer reset".to_string()),
        Command::Porosity { value } => session.set_porosity(*value).map(|()| format!("porosity {value}")),
        Command::Scale { px, mkm } => session
            .set_scale_factor(*px, *mkm)
            .map(|()| format!("scale {px} px = {mkm} µm")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_events_and_commands() {
        let steps = parse(
            r#"[
                {"op": "tool", "tool": "manual"},
                {"type": "gesture_start", "x": 10, "y": 20},
                {"type": "gesture_end"},
                {"op": "click", "x": 1.5, "y": 2},
                {"op": "undo"},
                {"op": "scale", "px": 100, "mkm": 50}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Command(Command::Tool {
                    tool: ToolName::Manual
                }),
                Step::Event(InputEvent::GestureStart { x: 10.0, y: 20.0 }),
                Step::Event(InputEvent::GestureEnd),
                Step::Command(Command::Click { x: 1.5, y: 2.0 }),
                Step::Command(Command::Undo),
                Step::Command(Command::Scale {
                    px: 100.0,
                    mkm: 50.0
                }),
            ]
        );
    }

    #[test]
    fn unknown_op_is_rejected() {
        assert!(parse(r#"[{"op": "explode"}]"#).is_err());
    }
}
