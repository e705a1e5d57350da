//! Tool state machine.
//!
//! The active tool decides what a click on the image means. `ToolState`
//! only interprets clicks; the session carries out the resulting
//! `ToolAction` against the store and the mask.

use kurbo::Point;

/// Tools the user can pick (toolbar or shortcut).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    MagicSelect,
    ManualSelect,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    MagicSelect,
    /// `pending` holds the center while awaiting the radius click.
    ManualSelect { pending: Option<Point> },
    RemoveTool,
}

/// What a click asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolAction {
    /// No tool: report the pixel.
    Inspect(Point),
    /// Ask the segmentation oracle for the region at this pixel.
    Segment(Point),
    /// Manual center recorded; show the marker.
    PlaceCenter(Point),
    CreateCircle { center: Point, diameter: f64 },
    RemoveAt(Point),
    /// Click landed outside the image where the tool needs a pixel.
    OutsideImage(Point),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeOutcome {
    CenterDropped,
    ToolCleared,
}

impl ToolState {
    /// Fresh state for a picked tool; nothing pending.
    pub fn select(kind: ToolKind) -> Self {
        match kind {
            ToolKind::MagicSelect => ToolState::MagicSelect,
            ToolKind::ManualSelect => ToolState::ManualSelect { pending: None },
            ToolKind::Remove => ToolState::RemoveTool,
        }
    }

    pub fn kind(&self) -> Option<ToolKind> {
        match self {
            ToolState::Idle => None,
            ToolState::MagicSelect => Some(ToolKind::MagicSelect),
            ToolState::ManualSelect { .. } => Some(ToolKind::ManualSelect),
            ToolState::RemoveTool => Some(ToolKind::Remove),
        }
    }

    pub fn pending_center(&self) -> Option<Point> {
        match self {
            ToolState::ManualSelect { pending } => *pending,
            _ => None,
        }
    }

    pub fn escape(&mut self) -> EscapeOutcome {
        match self {
            ToolState::ManualSelect { pending } if pending.is_some() => {
                *pending = None;
                EscapeOutcome::CenterDropped
            }
            _ => {
                *self = ToolState::Idle;
                EscapeOutcome::ToolCleared
            }
        }
    }

    /// Interpret a click at image pixel `point`. `inside` tells whether the
    /// pixel lies on the image.
    pub fn handle_click(&mut self, point: Point, inside: bool) -> ToolAction {
        match self {
            ToolState::Idle => ToolAction::Inspect(point),
            ToolState::MagicSelect if !inside => ToolAction::OutsideImage(point),
            ToolState::MagicSelect => ToolAction::Segment(point),
            ToolState::ManualSelect { pending } => match pending.take() {
                Some(center) => ToolAction::CreateCircle {
                    center,
                    diameter: 2.0 * center.distance(point),
                },
                None if !inside => ToolAction::OutsideImage(point),
                None => {
                    *pending = Some(point);
                    ToolAction::PlaceCenter(point)
                }
            },
            ToolState::RemoveTool => ToolAction::RemoveAt(point),
        }
    }

    /// Hint for the status bar.
    pub fn prompt(&self) -> &'static str {
        match self {
            ToolState::Idle => "Select a tool.",
            ToolState::MagicSelect => "Click on a mezophase to select it.",
            ToolState::ManualSelect { pending: None } => "Click on the center of mezophase.",
            ToolState::ManualSelect { pending: Some(_) } => {
                "Click on the outer point of the mezophase to set the diameter."
            }
            ToolState::RemoveTool => "Click on a mezophase to remove it.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_select_two_clicks() {
        let mut tool = ToolState::select(ToolKind::ManualSelect);
        assert_eq!(
            tool.handle_click(Point::new(100.0, 100.0), true),
            ToolAction::PlaceCenter(Point::new(100.0, 100.0))
        );
        assert_eq!(tool.pending_center(), Some(Point::new(100.0, 100.0)));
        assert_eq!(
            tool.handle_click(Point::new(110.0, 100.0), true),
            ToolAction::CreateCircle {
                center: Point::new(100.0, 100.0),
                diameter: 20.0
            }
        );
        assert_eq!(tool, ToolState::ManualSelect { pending: None });
    }

    #[test]
    fn radius_click_may_leave_the_image() {
        let mut tool = ToolState::select(ToolKind::ManualSelect);
        tool.handle_click(Point::new(2.0, 2.0), true);
        assert!(matches!(
            tool.handle_click(Point::new(-8.0, 2.0), false),
            ToolAction::CreateCircle { .. }
        ));
    }

    #[test]
    fn outside_clicks_are_reported() {
        let mut magic = ToolState::MagicSelect;
        let p = Point::new(-1.0, 5.0);
        assert_eq!(magic.handle_click(p, false), ToolAction::OutsideImage(p));

        let mut manual = ToolState::select(ToolKind::ManualSelect);
        assert_eq!(manual.handle_click(p, false), ToolAction::OutsideImage(p));
        assert_eq!(manual.pending_center(), None);
    }

    #[test]
    fn escape_drops_center_then_tool() {
        let mut tool = ToolState::select(ToolKind::ManualSelect);
        tool.handle_click(Point::new(1.0, 1.0), true);
        assert_eq!(tool.escape(), EscapeOutcome::CenterDropped);
        assert_eq!(tool, ToolState::ManualSelect { pending: None });
        assert_eq!(tool.escape(), EscapeOutcome::ToolCleared);
        assert_eq!(tool, ToolState::Idle);
        assert_eq!(tool.escape(), EscapeOutcome::ToolCleared);
    }

    #[test]
    fn idle_and_remove_clicks() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(ToolState::Idle.handle_click(p, true), ToolAction::Inspect(p));
        assert_eq!(ToolState::RemoveTool.handle_click(p, false), ToolAction::RemoveAt(p));
    }

    #[test]
    fn kind_round_trips() {
        for kind in [ToolKind::MagicSelect, ToolKind::ManualSelect, ToolKind::Remove] {
            assert_eq!(ToolState::select(kind).kind(), Some(kind));
        }
        assert_eq!(ToolState::Idle.kind(), None);
    }
}
