use crate::action::Action;
use crate::keyboard::{KeyEventKind, KeyboardHub, ListenerId};
use std::cell::RefCell;
use std::rc::Rc;
use wingspan_common::EntityTransform;

/// Arrow-key controller bound to one entity transform.
///
/// Registers one key-down and one key-up listener on attach and removes
/// both on [`detach`](Self::detach) or drop.
pub struct InputController {
    hub: KeyboardHub,
    down: Option<ListenerId>,
    up: Option<ListenerId>,
}

impl InputController {
    pub fn attach(hub: &KeyboardHub, transform: Rc<RefCell<EntityTransform>>) -> Self {
        let down = {
            let transform = Rc::clone(&transform);
            hub.add_listener(KeyEventKind::Down, move |event| {
                if let Some(action) = Action::for_key_down(event.key) {
                    action.apply(&mut transform.borrow_mut());
                }
            })
        };
        let up = hub.add_listener(KeyEventKind::Up, move |event| {
            Action::for_key_up(event.key).apply(&mut transform.borrow_mut());
        });
        tracing::debug!("input controller attached");
        Self {
            hub: hub.clone(),
            down: Some(down),
            up: Some(up),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.down.is_some() || self.up.is_some()
    }

    /// Remove both listeners. Calling it twice is harmless.
    pub fn detach(&mut self) {
        let mut removed = false;
        for id in [self.down.take(), self.up.take()].into_iter().flatten() {
            removed |= self.hub.remove_listener(id);
        }
        if removed {
            tracing::debug!("input controller detached");
        }
    }
}

impl Drop for InputController {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Key;
    use crate::keyboard::KeyEvent;
    use glam::Vec3;
    use std::f32::consts::PI;
    use wingspan_common::Orientation;

    fn setup() -> (KeyboardHub, Rc<RefCell<EntityTransform>>, InputController) {
        let hub = KeyboardHub::new();
        let transform = Rc::new(RefCell::new(EntityTransform::new(
            Vec3::new(0.0, 2.0, 0.0),
            Orientation::FORWARD,
        )));
        let controller = InputController::attach(&hub, Rc::clone(&transform));
        (hub, transform, controller)
    }

    #[test]
    fn attach_registers_two_listeners() {
        let (hub, _t, controller) = setup();
        assert_eq!(hub.listener_count(), 2);
        assert!(controller.is_attached());
    }

    #[test]
    fn key_sequence_moves_by_fixed_steps() {
        let (hub, t, _controller) = setup();
        hub.dispatch(KeyEvent::down(Key::ArrowUp));
        hub.dispatch(KeyEvent::down(Key::ArrowUp));
        hub.dispatch(KeyEvent::down(Key::ArrowRight));
        let state = *t.borrow();
        assert!((state.position.y - 2.2).abs() < 1e-5);
        assert!((state.position.x - 0.1).abs() < 1e-6);
        assert_eq!(state.orientation, Orientation::new(0.0, -PI / 2.0, -0.2));
    }

    #[test]
    fn repeats_apply_the_step_again() {
        let (hub, t, _controller) = setup();
        let repeat = KeyEvent {
            repeat: true,
            ..KeyEvent::down(Key::ArrowLeft)
        };
        hub.dispatch(KeyEvent::down(Key::ArrowLeft));
        hub.dispatch(repeat);
        hub.dispatch(repeat);
        assert!((t.borrow().position.x + 0.3).abs() < 1e-5);
    }

    #[test]
    fn any_key_up_resets_orientation() {
        let (hub, t, _controller) = setup();
        hub.dispatch(KeyEvent::down(Key::ArrowDown));
        hub.dispatch(KeyEvent::up(Key::Other));
        let state = *t.borrow();
        assert_eq!(state.orientation, Orientation::new(0.0, PI, 0.0));
        assert!((state.position.y - 1.9).abs() < 1e-5);
    }

    #[test]
    fn detached_controller_ignores_events() {
        let (hub, t, mut controller) = setup();
        controller.detach();
        let before = *t.borrow();
        hub.dispatch(KeyEvent::down(Key::ArrowUp));
        hub.dispatch(KeyEvent::up(Key::ArrowUp));
        assert_eq!(*t.borrow(), before);
        assert_eq!(hub.listener_count(), 0);
        assert!(!controller.is_attached());
        controller.detach();
    }

    #[test]
    fn drop_removes_listeners() {
        let (hub, t, controller) = setup();
        drop(controller);
        assert_eq!(hub.listener_count(), 0);
        hub.dispatch(KeyEvent::down(Key::ArrowRight));
        assert_eq!(t.borrow().position, Vec3::new(0.0, 2.0, 0.0));
    }
}
