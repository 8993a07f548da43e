//! Documents whose scripts run in the bridge.

use std::path::Path;
use std::rc::{Rc, Weak};

use crate::bridge::ScriptBridge;
use crate::host::{Document, DocumentScriptHost, Element, ElementInstancer};

/// Runs a document's scripts with `document` bound to that document.
struct ScriptDocumentHost {
    bridge: Weak<ScriptBridge>,
}

impl DocumentScriptHost for ScriptDocumentHost {
    fn load_inline_script(&self, document: &Document, code: &str, source_name: &str) {
        let Some(bridge) = self.bridge.upgrade() else {
            log::warn!("Inline script '{}' ignored: script runtime is gone", source_name);
            return;
        };
        bridge.run_in_document(document, || bridge.do_string(code, source_name));
    }

    fn load_external_script(&self, document: &Document, path: &Path) {
        let Some(bridge) = self.bridge.upgrade() else {
            log::warn!("Script '{}' ignored: script runtime is gone", path.display());
            return;
        };
        bridge.run_in_document(document, || bridge.load_file(path));
    }
}

/// Element instancer producing script-enabled documents.
pub struct ScriptDocumentInstancer {
    bridge: Weak<ScriptBridge>,
}

impl ScriptDocumentInstancer {
    pub fn new(bridge: &Rc<ScriptBridge>) -> Self {
        Self {
            bridge: Rc::downgrade(bridge),
        }
    }
}

impl ElementInstancer for ScriptDocumentInstancer {
    fn instance_element(&self, _parent: Option<&Element>, tag: &str) -> Option<Element> {
        let host = Rc::new(ScriptDocumentHost {
            bridge: self.bridge.clone(),
        });
        let document = Document::with_script_host(tag, host);
        Some(document.as_element().clone())
    }
}
