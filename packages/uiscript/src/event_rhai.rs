//! Rhai registration for `Event`.
//!
//! Listeners receive the event as their first argument.
//!
//! # Example (Rhai)
//! ```rhai
//! document.add_event_listener("submit", |event, element, document| {
//!     if event.parameters["value"] == "" {
//!         event.stop_propagation();
//!     }
//! });
//! ```

use rhai::Engine;

use crate::bindings::BindingContext;
use crate::element_rhai::element_to_dynamic;
use crate::host::{Event, EventPhase};
use crate::proxy_rhai::EventParametersProxy;

fn phase_name(phase: EventPhase) -> &'static str {
    match phase {
        EventPhase::Target => "target",
        EventPhase::Bubble => "bubble",
    }
}

pub fn register_event(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<Event>("Event");

    engine.register_get("event_type", |e: &mut Event| e.event_type());
    engine.register_get("target_element", |e: &mut Event| {
        element_to_dynamic(Some(e.target_element()))
    });
    engine.register_get("current_element", |e: &mut Event| {
        element_to_dynamic(Some(e.current_element()))
    });
    engine.register_get("parameters", |e: &mut Event| EventParametersProxy(e.clone()));
    engine.register_get("phase", |e: &mut Event| phase_name(e.phase()).to_string());
    engine.register_get("interruptible", |e: &mut Event| e.is_interruptible());
    engine.register_get("propagating", |e: &mut Event| e.is_propagating());

    // Ignored for events that are not interruptible.
    engine.register_fn("stop_propagation", |e: &mut Event| e.stop_propagation());

    engine.register_fn("==", |a: Event, b: Event| a.ptr_eq(&b));
    engine.register_fn("!=", |a: Event, b: Event| !a.ptr_eq(&b));
    engine.register_fn("to_string", |e: &mut Event| format!("Event({})", e.event_type()));
    engine.register_fn("to_debug", |e: &mut Event| format!("{e:?}"));
}
