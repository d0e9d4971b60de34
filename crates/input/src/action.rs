use glam::Vec3;
use std::f32::consts::FRAC_PI_2;
use std::f32::consts::PI;
use wingspan_common::{EntityTransform, Orientation};

/// Distance moved per key-down event.
pub const STEP: f32 = 0.1;

/// Keys the controller distinguishes. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Other,
}

impl Key {
    /// Key for a DOM-style name (`ArrowUp`) or a short alias (`up`).
    /// Unknown names map to `Other`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "arrowup" | "up" => Key::ArrowUp,
            "arrowdown" | "down" => Key::ArrowDown,
            "arrowleft" | "left" => Key::ArrowLeft,
            "arrowright" | "right" => Key::ArrowRight,
            _ => Key::Other,
        }
    }
}

/// What a keyboard event does to an entity transform.
///
/// Windowing layers translate raw events into keys, keys into actions; the
/// controller only ever applies actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Move by a delta and snap to a fixed orientation.
    Nudge {
        delta: Vec3,
        orientation: Orientation,
    },
    /// Return to the neutral forward-facing orientation.
    ResetOrientation,
}

impl Action {
    /// Action bound to a key-down, if the key is bound at all.
    pub fn for_key_down(key: Key) -> Option<Self> {
        let (delta, orientation) = match key {
            Key::ArrowUp => (Vec3::new(0.0, STEP, 0.0), Orientation::new(-0.2, PI, 0.0)),
            Key::ArrowDown => (Vec3::new(0.0, -STEP, 0.0), Orientation::new(0.2, PI, 0.0)),
            Key::ArrowLeft => (
                Vec3::new(-STEP, 0.0, 0.0),
                Orientation::new(0.0, FRAC_PI_2, 0.2),
            ),
            Key::ArrowRight => (
                Vec3::new(STEP, 0.0, 0.0),
                Orientation::new(0.0, -FRAC_PI_2, -0.2),
            ),
            Key::Other => return None,
        };
        Some(Self::Nudge { delta, orientation })
    }

    /// Every key-up resets, whichever key was released.
    pub fn for_key_up(_key: Key) -> Self {
        Self::ResetOrientation
    }

    pub fn apply(&self, transform: &mut EntityTransform) {
        match *self {
            Self::Nudge { delta, orientation } => {
                transform.position += delta;
                transform.orientation = orientation;
            }
            Self::ResetOrientation => {
                transform.orientation = Orientation::FORWARD;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_moves_y_and_pitches_down() {
        let mut t = EntityTransform::default();
        Action::for_key_down(Key::ArrowUp).unwrap().apply(&mut t);
        assert!((t.position.y - 0.1).abs() < 1e-6);
        assert_eq!(t.orientation, Orientation::new(-0.2, PI, 0.0));
    }

    #[test]
    fn down_moves_negative_y() {
        let mut t = EntityTransform::default();
        Action::for_key_down(Key::ArrowDown).unwrap().apply(&mut t);
        assert!((t.position.y + 0.1).abs() < 1e-6);
        assert_eq!(t.orientation, Orientation::new(0.2, PI, 0.0));
    }

    #[test]
    fn left_and_right_turn_sideways() {
        let mut t = EntityTransform::default();
        Action::for_key_down(Key::ArrowLeft).unwrap().apply(&mut t);
        assert!((t.position.x + 0.1).abs() < 1e-6);
        assert_eq!(t.orientation, Orientation::new(0.0, FRAC_PI_2, 0.2));

        Action::for_key_down(Key::ArrowRight).unwrap().apply(&mut t);
        assert!(t.position.x.abs() < 1e-6);
        assert_eq!(t.orientation, Orientation::new(0.0, -FRAC_PI_2, -0.2));
    }

    #[test]
    fn key_names() {
        assert_eq!(Key::from_name("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::from_name(" left "), Key::ArrowLeft);
        assert_eq!(Key::from_name("space"), Key::Other);
    }

    #[test]
    fn unbound_key_has_no_action() {
        assert_eq!(Action::for_key_down(Key::Other), None);
    }

    #[test]
    fn key_up_resets_regardless_of_key() {
        for key in [Key::ArrowUp, Key::ArrowLeft, Key::Other] {
            let mut t = EntityTransform::new(Vec3::ONE, Orientation::new(0.2, 0.0, -0.2));
            Action::for_key_up(key).apply(&mut t);
            assert_eq!(t.orientation, Orientation::FORWARD);
            assert_eq!(t.position, Vec3::ONE);
        }
    }

    #[test]
    fn orientation_is_overwritten_not_accumulated() {
        let mut t = EntityTransform::default();
        for _ in 0..25 {
            Action::for_key_down(Key::ArrowUp).unwrap().apply(&mut t);
        }
        assert_eq!(t.orientation, Orientation::new(-0.2, PI, 0.0));
        assert!((t.position.y - 2.5).abs() < 1e-4);
    }
}
