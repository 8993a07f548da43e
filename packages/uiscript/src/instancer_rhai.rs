//! Script-defined element instancers.
//!
//! `ElementInstancer(fn)` wraps a script function taking the tag name and
//! returning an element. Registered with `rocket.register_tag`, the host
//! factory calls it for every element of that tag.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rhai::{Dynamic, Engine, EvalAltResult, FnPtr};

use crate::bindings::BindingContext;
use crate::bridge::ScriptBridge;
use crate::function::ScriptFunction;
use crate::host::{Document, Element, ElementInstancer};
use crate::references::FunctionReference;
use crate::script_diagnostics::ScriptPhase;

struct InstancerState {
    bridge: Weak<ScriptBridge>,
    reference: FunctionReference,
}

impl InstancerState {
    fn release(&mut self) {
        let reference = std::mem::replace(&mut self.reference, FunctionReference::NONE);
        if reference.is_valid() {
            if let Some(bridge) = self.bridge.upgrade() {
                bridge.release_reference(reference);
            }
        }
    }
}

impl Drop for InstancerState {
    fn drop(&mut self) {
        self.release();
    }
}

/// Shared handle: the script value and the factory registration are the
/// same instancer, so reassigning `instance_element` affects both.
#[derive(Clone)]
pub struct ScriptElementInstancer(Rc<RefCell<InstancerState>>);

impl ScriptElementInstancer {
    pub fn new(bridge: &Rc<ScriptBridge>) -> Self {
        ScriptElementInstancer(Rc::new(RefCell::new(InstancerState {
            bridge: Rc::downgrade(bridge),
            reference: FunctionReference::NONE,
        })))
    }

    pub fn with_function(bridge: &Rc<ScriptBridge>, function: FnPtr) -> Self {
        let instancer = Self::new(bridge);
        instancer.set_function(bridge, function);
        instancer
    }

    pub fn reference(&self) -> FunctionReference {
        self.0.borrow().reference
    }

    fn set_function(&self, bridge: &Rc<ScriptBridge>, function: FnPtr) {
        let reference = bridge.reference_pointer(function);
        let mut state = self.0.borrow_mut();
        state.release();
        state.reference = reference;
    }

    fn function(&self) -> Dynamic {
        let state = self.0.borrow();
        let function = state
            .bridge
            .upgrade()
            .and_then(|bridge| bridge.function(state.reference));
        match function {
            Some(ScriptFunction::Pointer { fn_ptr, .. }) => Dynamic::from(fn_ptr),
            _ => Dynamic::UNIT,
        }
    }
}

impl ElementInstancer for ScriptElementInstancer {
    fn instance_element(&self, _parent: Option<&Element>, tag: &str) -> Option<Element> {
        let (bridge, reference) = {
            let state = self.0.borrow();
            (state.bridge.upgrade()?, state.reference)
        };
        if !reference.is_valid() {
            log::warn!("Instancer for <{}> has no function", tag);
            return None;
        }

        let values = match bridge.call(reference, vec![Dynamic::from(tag.to_string())]) {
            Ok(values) => values,
            Err(err) => {
                bridge.report(ScriptPhase::Call, &err);
                return None;
            }
        };
        let value = values.into_iter().next().unwrap_or(Dynamic::UNIT);
        if value.is::<Element>() {
            return value.try_cast::<Element>();
        }
        if value.is::<Document>() {
            return value.try_cast::<Document>().map(|d| d.as_element().clone());
        }
        log::warn!(
            "Instancer for <{}> returned {} instead of an element",
            tag,
            value.type_name()
        );
        None
    }
}

pub fn register_element_instancer(engine: &mut Engine, ctx: &mut BindingContext) {
    engine.register_type_with_name::<ScriptElementInstancer>("ElementInstancer");

    let weak = ctx.bridge();
    engine.register_fn("ElementInstancer", move || -> Result<ScriptElementInstancer, Box<EvalAltResult>> {
        let bridge = weak.upgrade().ok_or("script runtime is no longer available")?;
        Ok(ScriptElementInstancer::new(&bridge))
    });
    let weak = ctx.bridge();
    engine.register_fn(
        "ElementInstancer",
        move |function: FnPtr| -> Result<ScriptElementInstancer, Box<EvalAltResult>> {
            let bridge = weak.upgrade().ok_or("script runtime is no longer available")?;
            Ok(ScriptElementInstancer::with_function(&bridge, function))
        },
    );

    engine.register_get("instance_element", |i: &mut ScriptElementInstancer| i.function());
    let weak = ctx.bridge();
    engine.register_set(
        "instance_element",
        move |i: &mut ScriptElementInstancer, function: FnPtr| -> Result<(), Box<EvalAltResult>> {
            let bridge = weak.upgrade().ok_or("script runtime is no longer available")?;
            i.set_function(&bridge, function);
            Ok(())
        },
    );
    engine.register_fn("to_string", |i: &mut ScriptElementInstancer| {
        format!("ElementInstancer({})", i.reference())
    });
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;
    use crate::host::Core;

    struct PlainInstancer;

    impl ElementInstancer for PlainInstancer {
        fn instance_element(&self, _parent: Option<&Element>, tag: &str) -> Option<Element> {
            Some(Element::new(tag))
        }
    }

    #[test]
    fn test_script_tag_instancer() {
        let core = Core::new();
        let bridge = ScriptBridge::with_default_bindings(&core);
        bridge.startup();
        let context = core.create_context("main", IVec2::ZERO).unwrap();
        let document = context.create_document("body").unwrap();

        bridge
            .eval(
                r#"
                rocket.register_tag("badge", ElementInstancer(|tag| {
                    let badge = Element(tag);
                    badge.set_class("badge", true);
                    badge
                }));
                "#,
                "instancer",
            )
            .unwrap();

        let badge = document.create_element("badge");
        assert_eq!(badge.tag_name(), "badge");
        assert!(badge.is_class_set("badge"));
        assert_eq!(bridge.num_references(), 1);

        // Replacing the registration releases the script function.
        core.register_element_instancer("badge", Rc::new(PlainInstancer));
        assert_eq!(bridge.num_references(), 0);
    }

    #[test]
    fn test_reassign_and_bad_results() {
        let core = Core::new();
        let bridge = ScriptBridge::with_default_bindings(&core);
        bridge.startup();

        let instancer: ScriptElementInstancer = bridge
            .eval(
                r#"
                let i = ElementInstancer();
                i.instance_element = |tag| 42;
                i
                "#,
                "instancer",
            )
            .unwrap()
            .cast();
        assert!(instancer.instance_element(None, "odd").is_none());
        assert!(bridge.take_diagnostics().is_empty());

        let failing: ScriptElementInstancer = bridge
            .eval(r#"ElementInstancer(|tag| { throw "no " + tag; })"#, "instancer")
            .unwrap()
            .cast();
        assert!(failing.instance_element(None, "panel").is_none());
        let diagnostics = bridge.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("no panel"));

        drop(instancer);
        drop(failing);
        assert_eq!(bridge.num_references(), 0);
    }
}
