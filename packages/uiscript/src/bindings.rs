//! Type binding table.
//!
//! Each exposed host type supplies a [`TypeBinding`] descriptor. The bridge
//! receives the list at construction and registers every entry, in order,
//! when the runtime starts.

use std::collections::HashMap;
use std::rc::Weak;

use rhai::{Dynamic, Engine};

use crate::bridge::ScriptBridge;
use crate::host::Core;
use crate::{
    colour_rhai, context_rhai, element_rhai, event_rhai, instancer_rhai, proxy_rhai, rocket_rhai,
    script_log, vector_rhai,
};

pub type RegisterFn = fn(&mut Engine, &mut BindingContext);

/// Describes how one host type is exposed to scripts.
#[derive(Clone, Copy)]
pub struct TypeBinding {
    /// Script-visible type (or global) name.
    pub name: &'static str,
    /// Type whose members this one also exposes.
    pub parent: Option<&'static str>,
    pub register: RegisterFn,
}

impl TypeBinding {
    pub const fn new(name: &'static str, register: RegisterFn) -> Self {
        Self {
            name,
            parent: None,
            register,
        }
    }

    pub const fn with_parent(mut self, parent: &'static str) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl std::fmt::Debug for TypeBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeBinding")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .finish()
    }
}

/// What a binding may use while registering: the host core, a handle back
/// to the bridge, and a place to declare global variables.
pub struct BindingContext {
    core: Core,
    bridge: Weak<ScriptBridge>,
    globals: HashMap<String, Dynamic>,
}

impl BindingContext {
    pub(crate) fn new(core: Core, bridge: Weak<ScriptBridge>) -> Self {
        Self {
            core,
            bridge,
            globals: HashMap::new(),
        }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn bridge(&self) -> Weak<ScriptBridge> {
        self.bridge.clone()
    }

    /// Declare a global pushed into the scope of every chunk the bridge
    /// runs. Closures capture it like any other variable; named `fn`
    /// definitions do not see it. Later declarations replace earlier ones.
    pub fn define_global(&mut self, name: &str, value: impl Clone + 'static) {
        self.globals.insert(name.to_string(), Dynamic::from(value));
    }

    pub(crate) fn into_globals(self) -> HashMap<String, Dynamic> {
        self.globals
    }
}

/// The standard GUI surface, in registration order.
pub fn default_bindings() -> Vec<TypeBinding> {
    vec![
        TypeBinding::new("Vector2i", vector_rhai::register_vector2i),
        TypeBinding::new("Vector2f", vector_rhai::register_vector2f),
        TypeBinding::new("Colourf", colour_rhai::register_colourf),
        TypeBinding::new("Colourb", colour_rhai::register_colourb),
        TypeBinding::new("Log", script_log::register_log_api),
        TypeBinding::new("ElementStyle", element_rhai::register_element_style),
        TypeBinding::new("Element", element_rhai::register_element),
        TypeBinding::new("Document", element_rhai::register_document).with_parent("Element"),
        TypeBinding::new("Event", event_rhai::register_event),
        TypeBinding::new("Context", context_rhai::register_context),
        TypeBinding::new("rocket", rocket_rhai::register_rocket),
        TypeBinding::new("ElementInstancer", instancer_rhai::register_element_instancer),
        TypeBinding::new("ContextDocumentsProxy", proxy_rhai::register_context_documents),
        TypeBinding::new("EventParametersProxy", proxy_rhai::register_event_parameters),
        TypeBinding::new("ElementAttributesProxy", proxy_rhai::register_element_attributes),
    ]
}
