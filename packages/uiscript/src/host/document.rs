//! Documents: root elements owned by a context.

use std::cell::RefCell;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use super::context::{Context, ContextData};
use super::element::Element;

/// Where a document script comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Script text embedded in the document. `name` tags diagnostics.
    Inline { code: String, name: String },
    /// Script file referenced by the document.
    File(PathBuf),
}

/// Runs the scripts a document carries.
pub trait DocumentScriptHost {
    fn load_inline_script(&self, document: &Document, code: &str, source_name: &str);
    fn load_external_script(&self, document: &Document, path: &Path);
}

pub(crate) struct DocumentData {
    pub(crate) title: String,
    pub(crate) shown: bool,
    pub(crate) context: Weak<RefCell<ContextData>>,
    pub(crate) scripts: Option<Rc<dyn DocumentScriptHost>>,
}

/// An element that roots a document. Dereferences to [`Element`].
#[derive(Clone, PartialEq)]
pub struct Document(pub(crate) Element);

impl Document {
    pub fn new(tag: &str) -> Self {
        Self::build(tag, None)
    }

    /// A document whose scripts are run by `host`.
    pub fn with_script_host(tag: &str, host: Rc<dyn DocumentScriptHost>) -> Self {
        Self::build(tag, Some(host))
    }

    fn build(tag: &str, scripts: Option<Rc<dyn DocumentScriptHost>>) -> Self {
        let data = DocumentData {
            title: String::new(),
            shown: false,
            context: Weak::new(),
            scripts,
        };
        Document(Element::with_document_data(tag, Some(data)))
    }

    /// View an element as a document, if it is one.
    pub fn from_element(element: &Element) -> Option<Document> {
        element.is_document().then(|| Document(element.clone()))
    }

    pub fn as_element(&self) -> &Element {
        &self.0
    }

    fn with_data<R>(&self, f: impl FnOnce(&mut DocumentData) -> R) -> Option<R> {
        self.0 .0.borrow_mut().document.as_mut().map(f)
    }

    pub fn title(&self) -> String {
        self.with_data(|d| d.title.clone()).unwrap_or_default()
    }

    pub fn set_title(&self, title: &str) {
        self.with_data(|d| d.title = title.to_string());
    }

    pub fn is_shown(&self) -> bool {
        self.with_data(|d| d.shown).unwrap_or(false)
    }

    pub fn show(&self) {
        self.with_data(|d| d.shown = true);
    }

    pub fn hide(&self) {
        self.with_data(|d| d.shown = false);
    }

    pub fn context(&self) -> Option<Context> {
        self.with_data(|d| d.context.upgrade())
            .flatten()
            .map(Context)
    }

    pub(crate) fn attach_context(&self, context: &Context) {
        let weak = Rc::downgrade(&context.0);
        self.with_data(|d| d.context = weak);
    }

    pub(crate) fn detach_context(&self) {
        self.with_data(|d| d.context = Weak::new());
    }

    /// Unload this document from its context.
    pub fn close(&self) -> bool {
        match self.context() {
            Some(context) => context.unload_document(self),
            None => false,
        }
    }

    /// Instance a new element owned by this document. It is not attached
    /// to the tree until appended somewhere.
    pub fn create_element(&self, tag: &str) -> Element {
        let core = self.context().and_then(|c| c.core());
        let element = core
            .and_then(|core| core.instance_element(Some(&self.0), tag))
            .unwrap_or_else(|| Element::new(tag));
        element.set_owner(self);
        element
    }

    pub fn create_text_node(&self, text: &str) -> Element {
        let element = Element::new("#text");
        element.set_inner_rml(text);
        element.set_owner(self);
        element
    }

    /// Hand a script to the document's script host.
    pub fn load_script(&self, source: &ScriptSource) {
        let host = self.with_data(|d| d.scripts.clone()).flatten();
        let Some(host) = host else {
            log::warn!("Document <{}> has no script host; script ignored", self.tag_name());
            return;
        };
        match source {
            ScriptSource::Inline { code, name } => host.load_inline_script(self, code, name),
            ScriptSource::File(path) => host.load_external_script(self, path),
        }
    }
}

impl Deref for Document {
    type Target = Element;

    fn deref(&self) -> &Element {
        &self.0
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Document").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingHost {
        loaded: RefCell<Vec<String>>,
    }

    impl DocumentScriptHost for RecordingHost {
        fn load_inline_script(&self, document: &Document, code: &str, source_name: &str) {
            self.loaded
                .borrow_mut()
                .push(format!("{}:{}:{}", document.title(), source_name, code));
        }

        fn load_external_script(&self, _document: &Document, path: &Path) {
            self.loaded.borrow_mut().push(path.display().to_string());
        }
    }

    #[test]
    fn test_document_is_an_element() {
        let doc = Document::new("body");
        assert!(doc.is_document());
        assert_eq!(doc.tag_name(), "body");
        assert!(Document::from_element(doc.as_element()).is_some());
        assert!(Document::from_element(&Element::new("div")).is_none());
    }

    #[test]
    fn test_owner_document() {
        let doc = Document::new("body");
        let detached = doc.create_element("div");
        assert_eq!(detached.owner_document(), Some(doc.clone()));

        let nested = Element::new("span");
        detached.append_child(&nested);
        doc.append_child(&detached);
        assert_eq!(nested.owner_document(), Some(doc.clone()));

        let text = doc.create_text_node("hi");
        assert_eq!(text.inner_rml(), "hi");
        assert_eq!(text.tag_name(), "#text");
    }

    #[test]
    fn test_load_script_goes_to_host() {
        let host = Rc::new(RecordingHost::default());
        let doc = Document::with_script_host("body", host.clone());
        doc.set_title("main");
        doc.load_script(&ScriptSource::Inline {
            code: "1".into(),
            name: "inline".into(),
        });
        doc.load_script(&ScriptSource::File(PathBuf::from("ui.rhai")));
        assert_eq!(*host.loaded.borrow(), vec!["main:inline:1".to_string(), "ui.rhai".to_string()]);
    }

    #[test]
    fn test_visibility() {
        let doc = Document::new("body");
        assert!(!doc.is_shown());
        doc.show();
        assert!(doc.is_shown());
        doc.hide();
        assert!(!doc.is_shown());
    }
}
