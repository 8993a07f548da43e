//! Minimal GUI host the script bridge plugs into: element tree, documents,
//! events, contexts, instancer factory and plugin registry.

pub mod colour;
pub mod context;
pub mod core;
pub mod document;
pub mod element;
pub mod event;
pub mod factory;
pub mod plugin;
pub mod variant;

pub use self::colour::{Colourb, Colourf};
pub use self::context::Context;
pub use self::core::{Core, WeakCore};
pub use self::document::{Document, DocumentScriptHost, ScriptSource};
pub use self::element::Element;
pub use self::event::{Event, EventListener, EventPhase};
pub use self::factory::{ElementInstancer, EventListenerInstancer, Factory};
pub use self::plugin::{EventClasses, Plugin};
pub use self::variant::Variant;
