pub mod host;

pub mod bridge;
pub mod bindings;
pub mod config;
pub mod error;
pub mod function;
pub mod references;
pub mod value_stack;
pub mod script_log;
pub mod script_diagnostics;

// Script-facing type bindings
pub mod vector_rhai;
pub mod colour_rhai;
pub mod variant_rhai;
pub mod element_rhai;
pub mod event_rhai;
pub mod context_rhai;
pub mod rocket_rhai;
pub mod instancer_rhai;
pub mod proxy_rhai;

// Host integration
pub mod event_listener;
pub mod document_instancer;
pub mod plugin;

pub mod cli;

pub use bindings::{default_bindings, BindingContext, TypeBinding};
pub use bridge::ScriptBridge;
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use plugin::ScriptPlugin;
pub use references::FunctionReference;
pub use script_diagnostics::{ScriptDiagnostic, ScriptDiagnosticKind, ScriptPhase};
