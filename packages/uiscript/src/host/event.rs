//! Events and listeners.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::element::Element;
use super::variant::Variant;

/// Receives events dispatched at an element.
pub trait EventListener {
    fn process_event(&self, event: &Event);

    /// Called when the listener is removed from `element`.
    fn on_detach(&self, _element: &Element) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Target,
    Bubble,
}

struct EventData {
    event_type: String,
    target: Element,
    current: Element,
    phase: EventPhase,
    parameters: BTreeMap<String, Variant>,
    interruptible: bool,
    stopped: bool,
}

/// An event in flight. Clones share state, so a listener stopping
/// propagation is visible to the dispatcher.
#[derive(Clone)]
pub struct Event(Rc<RefCell<EventData>>);

impl Event {
    pub fn new(
        event_type: &str,
        target: &Element,
        parameters: BTreeMap<String, Variant>,
        interruptible: bool,
    ) -> Self {
        Event(Rc::new(RefCell::new(EventData {
            event_type: event_type.to_string(),
            target: target.clone(),
            current: target.clone(),
            phase: EventPhase::Target,
            parameters,
            interruptible,
            stopped: false,
        })))
    }

    pub(crate) fn enter(&self, element: &Element, phase: EventPhase) {
        let mut data = self.0.borrow_mut();
        data.current = element.clone();
        data.phase = phase;
    }

    pub fn event_type(&self) -> String {
        self.0.borrow().event_type.clone()
    }

    pub fn target_element(&self) -> Element {
        self.0.borrow().target.clone()
    }

    pub fn current_element(&self) -> Element {
        self.0.borrow().current.clone()
    }

    pub fn phase(&self) -> EventPhase {
        self.0.borrow().phase
    }

    pub fn parameter(&self, name: &str) -> Option<Variant> {
        self.0.borrow().parameters.get(name).cloned()
    }

    pub fn parameters(&self) -> BTreeMap<String, Variant> {
        self.0.borrow().parameters.clone()
    }

    pub fn set_parameter(&self, name: &str, value: Variant) {
        self.0
            .borrow_mut()
            .parameters
            .insert(name.to_string(), value);
    }

    pub fn is_interruptible(&self) -> bool {
        self.0.borrow().interruptible
    }

    /// Request that bubbling stop after the current element. Ignored for
    /// non-interruptible events.
    pub fn stop_propagation(&self) {
        let mut data = self.0.borrow_mut();
        if data.interruptible {
            data.stopped = true;
        }
    }

    pub fn is_propagating(&self) -> bool {
        !self.0.borrow().stopped
    }

    pub fn ptr_eq(&self, other: &Event) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Event")
            .field("type", &data.event_type)
            .field("phase", &data.phase)
            .field("parameters", &data.parameters)
            .finish()
    }
}
