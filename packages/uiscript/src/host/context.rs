//! Contexts: named roots that own an ordered set of documents.

use std::cell::RefCell;
use std::rc::Rc;

use glam::IVec2;

use super::core::{Core, WeakCore};
use super::document::Document;

pub(crate) struct ContextData {
    pub(crate) name: String,
    pub(crate) dimensions: IVec2,
    pub(crate) documents: Vec<Document>,
    pub(crate) core: WeakCore,
}

#[derive(Clone)]
pub struct Context(pub(crate) Rc<RefCell<ContextData>>);

impl Context {
    pub(crate) fn new(name: &str, dimensions: IVec2, core: WeakCore) -> Self {
        Context(Rc::new(RefCell::new(ContextData {
            name: name.to_string(),
            dimensions,
            documents: Vec::new(),
            core,
        })))
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn dimensions(&self) -> IVec2 {
        self.0.borrow().dimensions
    }

    pub fn set_dimensions(&self, dimensions: IVec2) {
        self.0.borrow_mut().dimensions = dimensions;
    }

    pub(crate) fn core(&self) -> Option<Core> {
        self.0.borrow().core.upgrade()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.0.borrow().documents.clone()
    }

    pub fn num_documents(&self) -> usize {
        self.0.borrow().documents.len()
    }

    pub fn document_at(&self, index: usize) -> Option<Document> {
        self.0.borrow().documents.get(index).cloned()
    }

    /// Look a document up by its element id.
    pub fn get_document(&self, id: &str) -> Option<Document> {
        self.documents().into_iter().find(|d| d.id() == id)
    }

    /// Create an empty document through the core's factory and add it to
    /// this context. Returns `None` if the instancer for `tag` does not
    /// produce a document.
    pub fn create_document(&self, tag: &str) -> Option<Document> {
        let core = self.core();
        let document = match &core {
            Some(core) => {
                let element = core.instance_element(None, tag)?;
                let Some(document) = Document::from_element(&element) else {
                    log::warn!("Instancer for <{}> did not produce a document", tag);
                    return None;
                };
                document
            }
            None => Document::new(tag),
        };

        document.attach_context(self);
        self.0.borrow_mut().documents.push(document.clone());
        if let Some(core) = core {
            core.notify_document_load(&document);
        }
        Some(document)
    }

    pub fn unload_document(&self, document: &Document) -> bool {
        let removed = {
            let mut data = self.0.borrow_mut();
            let before = data.documents.len();
            data.documents.retain(|d| d != document);
            data.documents.len() != before
        };
        if removed {
            document.detach_context();
            if let Some(core) = self.core() {
                core.notify_document_unload(document);
            }
        }
        removed
    }

    pub fn unload_all_documents(&self) {
        for document in self.documents() {
            self.unload_document(&document);
        }
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Context")
            .field("name", &data.name)
            .field("dimensions", &data.dimensions)
            .field("documents", &data.documents.len())
            .finish()
    }
}
