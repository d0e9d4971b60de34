use crate::action::Key;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Down,
    Up,
}

/// A keyboard event as delivered by the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub kind: KeyEventKind,
    /// OS auto-repeat. Repeats are delivered like any other key-down.
    pub repeat: bool,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Down,
            repeat: false,
        }
    }

    pub fn up(key: Key) -> Self {
        Self {
            key,
            kind: KeyEventKind::Up,
            repeat: false,
        }
    }
}

/// Handle returned by [`KeyboardHub::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&KeyEvent)>;

#[derive(Default)]
struct Registry {
    listeners: RefCell<BTreeMap<ListenerId, (KeyEventKind, Listener)>>,
    next_id: Cell<u64>,
}

/// Window-level keyboard event dispatcher.
///
/// Clones share the same listener registry. Listeners run in registration
/// order and may add or remove listeners while being dispatched to; such
/// changes take effect from the next event.
#[derive(Clone, Default)]
pub struct KeyboardHub {
    registry: Rc<Registry>,
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &self,
        kind: KeyEventKind,
        listener: impl Fn(&KeyEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.registry.next_id.get());
        self.registry.next_id.set(id.0 + 1);
        self.registry
            .listeners
            .borrow_mut()
            .insert(id, (kind, Rc::new(listener)));
        tracing::debug!(?kind, id = id.0, "key listener added");
        id
    }

    /// Returns false when the id was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.registry.listeners.borrow_mut().remove(&id).is_some();
        if removed {
            tracing::debug!(id = id.0, "key listener removed");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.registry.listeners.borrow().len()
    }

    /// Deliver an event to every listener registered for its kind.
    pub fn dispatch(&self, event: KeyEvent) {
        let targets: Vec<Listener> = self
            .registry
            .listeners
            .borrow()
            .values()
            .filter(|(kind, _)| *kind == event.kind)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in targets {
            listener(&event);
        }
    }
}
