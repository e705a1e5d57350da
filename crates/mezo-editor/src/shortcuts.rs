//! Keyboard shortcut mapping.
//!
//! Digits pick a tool, Escape backs out, ⌘/Ctrl+Z undoes and ⌘/Ctrl+0 puts
//! the viewer back to fit-to-window.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    ToolMagicSelect,
    ToolManualSelect,
    ToolRemove,
    /// Drop a pending manual center, or clear the tool.
    Cancel,
    Undo,
    ResetViewer,
}

/// Resolves key events into shortcut actions.
///
/// On macOS `meta` is ⌘; elsewhere `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the toolkit's key name (e.g. `"z"`, `"Escape"`).
    /// Returns `None` if the combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd {
            return match key {
                "z" | "Z" if !shift => Some(ShortcutAction::Undo),
                "0" => Some(ShortcutAction::ResetViewer),
                _ => None,
            };
        }

        match key {
            "1" => Some(ShortcutAction::ToolMagicSelect),
            "2" => Some(ShortcutAction::ToolManualSelect),
            "3" => Some(ShortcutAction::ToolRemove),
            "Escape" => Some(ShortcutAction::Cancel),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tool_digits() {
        assert_eq!(
            ShortcutMap::resolve("1", false, false, false, false),
            Some(ShortcutAction::ToolMagicSelect)
        );
        assert_eq!(
            ShortcutMap::resolve("2", false, false, false, false),
            Some(ShortcutAction::ToolManualSelect)
        );
        assert_eq!(
            ShortcutMap::resolve("3", false, false, false, false),
            Some(ShortcutAction::ToolRemove)
        );
    }

    #[test]
    fn resolve_undo_either_modifier() {
        assert_eq!(
            ShortcutMap::resolve("z", true, false, false, false),
            Some(ShortcutAction::Undo)
        );
        assert_eq!(
            ShortcutMap::resolve("Z", false, false, false, true),
            Some(ShortcutAction::Undo)
        );
        // Plain z and shift+cmd+z (redo elsewhere) are unbound.
        assert_eq!(ShortcutMap::resolve("z", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("z", true, true, false, false), None);
    }

    #[test]
    fn resolve_reset_and_escape() {
        assert_eq!(
            ShortcutMap::resolve("0", false, false, false, true),
            Some(ShortcutAction::ResetViewer)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::Cancel)
        );
    }

    #[test]
    fn digits_with_cmd_are_not_tools() {
        assert_eq!(ShortcutMap::resolve("1", true, false, false, false), None);
    }

    #[test]
    fn resolve_unknown_key() {
        assert_eq!(ShortcutMap::resolve("q", false, false, false, false), None);
    }
}
