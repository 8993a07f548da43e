//! Script event listeners.
//!
//! A listener holds a function reference and runs it through the call
//! protocol with `(event, element, document)` for every event it receives.
//! Inline handlers (`onclick="..."`) are compiled into such a function by
//! wrapping the code in a closure with those three parameters.

use std::rc::{Rc, Weak};

use rhai::Dynamic;

use crate::bridge::ScriptBridge;
use crate::element_rhai::element_to_dynamic;
use crate::error::BridgeError;
use crate::host::{Element, Event, EventListener, EventListenerInstancer};
use crate::references::FunctionReference;
use crate::script_diagnostics::ScriptPhase;

pub struct ScriptEventListener {
    bridge: Weak<ScriptBridge>,
    reference: FunctionReference,
}

impl ScriptEventListener {
    /// Takes ownership of `reference`; it is released when the listener
    /// is dropped.
    pub fn new(bridge: &Rc<ScriptBridge>, reference: FunctionReference) -> Self {
        Self {
            bridge: Rc::downgrade(bridge),
            reference,
        }
    }

    pub fn reference(&self) -> FunctionReference {
        self.reference
    }

    fn invoke(&self, bridge: &ScriptBridge, event: &Event, element: &Element) {
        if !bridge.begin_call(self.reference) {
            return;
        }
        let document = element
            .owner_document()
            .map(Dynamic::from)
            .unwrap_or(Dynamic::UNIT);
        bridge.push_argument(Dynamic::from(event.clone()));
        bridge.push_argument(element_to_dynamic(Some(element.clone())));
        bridge.push_argument(document);
        if bridge.execute_call(3, 0) {
            bridge.end_call(0);
        }
    }
}

impl EventListener for ScriptEventListener {
    fn process_event(&self, event: &Event) {
        let Some(bridge) = self.bridge.upgrade() else {
            return;
        };
        if !bridge.is_running() {
            bridge.report(ScriptPhase::Call, &BridgeError::NotRunning);
            return;
        }

        let element = event.current_element();
        match element.owner_document() {
            Some(document) => {
                bridge.run_in_document(&document, || self.invoke(&bridge, event, &element))
            }
            None => self.invoke(&bridge, event, &element),
        }
    }
}

impl Drop for ScriptEventListener {
    fn drop(&mut self) {
        if !self.reference.is_valid() {
            return;
        }
        if let Some(bridge) = self.bridge.upgrade() {
            bridge.release_reference(self.reference);
        }
    }
}

/// Compile inline handler code attached to `element` into a listener.
/// Failures are reported and give `None`.
pub fn listener_from_code(
    bridge: &Rc<ScriptBridge>,
    code: &str,
    element: &Element,
) -> Option<Rc<dyn EventListener>> {
    let wrapped = format!("|event, element, document| {{\n{code}\n}}");
    let chunk = match element.id() {
        id if id.is_empty() => format!("<{}> handler", element.tag_name()),
        id => format!("<{}#{}> handler", element.tag_name(), id),
    };

    if !bridge.load_string(&wrapped, &chunk) || !bridge.execute_call(0, 1) {
        return None;
    }
    match bridge.take_reference() {
        Ok(reference) if reference.is_valid() => {
            Some(Rc::new(ScriptEventListener::new(bridge, reference)))
        }
        Ok(_) => {
            log::warn!("Handler '{}' did not produce a function", chunk);
            None
        }
        Err(err) => {
            bridge.report(ScriptPhase::Compile, &err);
            None
        }
    }
}

/// Registered with the host factory: turns inline handler code into
/// script listeners.
pub struct ScriptEventListenerInstancer {
    bridge: Weak<ScriptBridge>,
}

impl ScriptEventListenerInstancer {
    pub fn new(bridge: &Rc<ScriptBridge>) -> Self {
        Self {
            bridge: Rc::downgrade(bridge),
        }
    }
}

impl EventListenerInstancer for ScriptEventListenerInstancer {
    fn instance_event_listener(&self, code: &str, element: &Element) -> Option<Rc<dyn EventListener>> {
        let bridge = self.bridge.upgrade()?;
        listener_from_code(&bridge, code, element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Core, Document, Variant};

    fn running_bridge() -> Rc<ScriptBridge> {
        let bridge = ScriptBridge::with_default_bindings(&Core::new());
        bridge.startup();
        bridge
    }

    #[test]
    fn test_code_listener_receives_arguments() {
        let bridge = running_bridge();
        let document = Document::new("body");
        let button = Element::new("button");
        button.set_id("go");
        document.append_child(&button);

        let listener = listener_from_code(
            &bridge,
            r#"element.set_attribute("clicked", event.event_type + "@" + document.tag_name);"#,
            &button,
        )
        .unwrap();
        button.add_event_listener("click", listener);
        assert_eq!(bridge.num_references(), 1);

        assert!(button.dispatch_event("click", Default::default(), true));
        assert_eq!(button.attribute("clicked"), Some(Variant::from("click@body")));
        assert_eq!(bridge.stack_depth(), 0);
        assert!(bridge.take_diagnostics().is_empty());
    }

    #[test]
    fn test_bad_code_gives_no_listener() {
        let bridge = running_bridge();
        let element = Element::new("div");
        assert!(listener_from_code(&bridge, "let = ;", &element).is_none());
        let diagnostics = bridge.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].phase, ScriptPhase::Compile);
        assert_eq!(bridge.stack_depth(), 0);
        assert_eq!(bridge.num_references(), 0);
    }

    #[test]
    fn test_listener_errors_are_reported() {
        let bridge = running_bridge();
        let element = Element::new("div");
        let listener = listener_from_code(&bridge, r#"throw "bad handler";"#, &element).unwrap();
        element.add_event_listener("click", listener);

        element.dispatch_event("click", Default::default(), false);
        element.dispatch_event("click", Default::default(), false);
        assert_eq!(bridge.take_diagnostics().len(), 2);
        assert_eq!(bridge.stack_depth(), 0);
    }

    #[test]
    fn test_drop_releases_reference() {
        let bridge = running_bridge();
        let element = Element::new("div");
        let listener = listener_from_code(&bridge, "", &element).unwrap();
        element.add_event_listener("click", listener.clone());
        assert_eq!(bridge.num_references(), 1);

        assert!(element.remove_event_listener("click", &listener));
        drop(listener);
        assert_eq!(bridge.num_references(), 0);
    }

    #[test]
    fn test_after_shutdown() {
        let bridge = running_bridge();
        let element = Element::new("div");
        let listener = listener_from_code(&bridge, "", &element).unwrap();
        element.add_event_listener("click", listener);
        bridge.shutdown();

        element.dispatch_event("click", Default::default(), false);
        let diagnostics = bridge.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("not running"));
    }
}
