//! Host plugin that owns the script bridge.

use std::rc::Rc;

use crate::bindings::default_bindings;
use crate::bridge::ScriptBridge;
use crate::config::BridgeConfig;
use crate::document_instancer::ScriptDocumentInstancer;
use crate::event_listener::ScriptEventListenerInstancer;
use crate::host::{Core, EventClasses, Plugin};

/// Tag whose documents get script hosts.
pub const DOCUMENT_TAG: &str = "body";

pub struct ScriptPlugin {
    bridge: Rc<ScriptBridge>,
}

impl ScriptPlugin {
    pub fn new(core: &Core, config: BridgeConfig) -> Self {
        Self {
            bridge: ScriptBridge::new(core, config, default_bindings()),
        }
    }

    /// Register a script plugin with `core` and return its bridge. The
    /// runtime starts when the core initialises, or right away if it
    /// already has.
    pub fn initialise(core: &Core, config: BridgeConfig) -> Rc<ScriptBridge> {
        let plugin = Self::new(core, config);
        let bridge = plugin.bridge.clone();
        core.register_plugin(Box::new(plugin));
        bridge
    }

    pub fn bridge(&self) -> &Rc<ScriptBridge> {
        &self.bridge
    }
}

impl Plugin for ScriptPlugin {
    fn event_classes(&self) -> EventClasses {
        EventClasses::BASIC
    }

    fn on_initialise(&mut self, core: &Core) {
        self.bridge.startup();
        core.register_element_instancer(
            DOCUMENT_TAG,
            Rc::new(ScriptDocumentInstancer::new(&self.bridge)),
        );
        core.register_event_listener_instancer(Rc::new(ScriptEventListenerInstancer::new(
            &self.bridge,
        )));
    }

    // The runtime stays open; `ScriptBridge::shutdown` closes it.
    fn on_shutdown(&mut self, _core: &Core) {
        log::debug!("Script plugin shut down");
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;
    use crate::host::{ScriptSource, Variant};

    #[test]
    fn test_initialise_starts_runtime() {
        let core = Core::new();
        let bridge = ScriptPlugin::initialise(&core, BridgeConfig::default());
        assert!(!bridge.is_running());

        core.initialise();
        assert!(bridge.is_running());
        assert!(core.factory().event_listener_instancer().is_some());

        let context = core.create_context("main", IVec2::new(640, 480)).unwrap();
        let document = context.create_document(DOCUMENT_TAG).unwrap();
        document.load_script(&ScriptSource::Inline {
            code: r#"document.set_attribute("ready", 1);"#.to_string(),
            name: "main.rml".to_string(),
        });
        assert_eq!(document.attribute("ready"), Some(Variant::Int(1)));

        core.shutdown();
        assert!(bridge.is_running());
        bridge.shutdown();
        assert!(!bridge.is_running());
    }

    #[test]
    fn test_late_registration() {
        let core = Core::new();
        core.initialise();
        let bridge = ScriptPlugin::initialise(&core, BridgeConfig::default());
        assert!(bridge.is_running());
        assert_eq!(
            ScriptPlugin::new(&core, BridgeConfig::default()).event_classes(),
            EventClasses::BASIC
        );
    }
}
