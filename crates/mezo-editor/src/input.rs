//! Input abstraction layer.
//!
//! Host toolkits translate their pointer, wheel and keyboard callbacks into
//! `InputEvent`s. Positions are viewport-local pixels.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Pointer pressed or pinch started.
    GestureStart { x: f64, y: f64 },
    /// Pointer moved (`scale == 1`) or pinch/zoom step (`scale != 1`).
    GestureUpdate {
        x: f64,
        y: f64,
        #[serde(default = "unit_scale")]
        scale: f64,
    },
    /// Pointer released or pinch ended.
    GestureEnd,
    /// One mouse-wheel notch: a complete zoom gesture about `(x, y)`.
    Wheel { x: f64, y: f64, zoom: f64 },
    Key {
        key: String,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        alt: bool,
        #[serde(default)]
        meta: bool,
    },
    /// The host window was resized; chrome insets are not yet removed.
    WindowResized { width: f64, height: f64 },
}

fn unit_scale() -> f64 {
    1.0
}

impl InputEvent {
    pub fn key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    pub fn ctrl_key(key: &str) -> Self {
        Self::Key {
            key: key.to_string(),
            ctrl: true,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::GestureStart { x, y }
            | Self::GestureUpdate { x, y, .. }
            | Self::Wheel { x, y, .. } => Some((*x, *y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_scale_defaults_to_pan() {
        let event: InputEvent =
            serde_json::from_str(r#"{"type":"gesture_update","x":3,"y":4}"#).unwrap();
        assert_eq!(
            event,
            InputEvent::GestureUpdate {
                x: 3.0,
                y: 4.0,
                scale: 1.0
            }
        );
        assert_eq!(event.position(), Some((3.0, 4.0)));
    }

    #[test]
    fn key_modifiers_default_off() {
        let event: InputEvent = serde_json::from_str(r#"{"type":"key","key":"z","ctrl":true}"#).unwrap();
        assert_eq!(event, InputEvent::ctrl_key("z"));
        assert_eq!(event.position(), None);
    }
}
