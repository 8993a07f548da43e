//! Rhai registration for `Context`.

use glam::IVec2;
use rhai::{Dynamic, Engine};

use crate::bindings::BindingContext;
use crate::host::{Context, Document};
use crate::proxy_rhai::ContextDocumentsProxy;

/// Tag used by `context.create_document()` without arguments.
const DEFAULT_DOCUMENT_TAG: &str = "body";

fn create_document(context: &Context, tag: &str) -> Dynamic {
    match context.create_document(tag) {
        Some(document) => Dynamic::from(document),
        None => Dynamic::UNIT,
    }
}

pub fn register_context(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<Context>("Context");

    engine.register_get("name", |c: &mut Context| c.name());
    engine.register_get_set(
        "dimensions",
        |c: &mut Context| c.dimensions(),
        |c: &mut Context, dimensions: IVec2| c.set_dimensions(dimensions),
    );
    engine.register_get("documents", |c: &mut Context| ContextDocumentsProxy(c.clone()));

    engine.register_fn("create_document", |c: &mut Context| {
        create_document(c, DEFAULT_DOCUMENT_TAG)
    });
    engine.register_fn("create_document", |c: &mut Context, tag: &str| create_document(c, tag));
    engine.register_fn("get_document", |c: &mut Context, id: &str| match c.get_document(id) {
        Some(document) => Dynamic::from(document),
        None => Dynamic::UNIT,
    });
    engine.register_fn("unload_document", |c: &mut Context, document: Document| {
        c.unload_document(&document)
    });
    engine.register_fn("unload_all_documents", |c: &mut Context| c.unload_all_documents());

    engine.register_fn("==", |a: Context, b: Context| a.ptr_eq(&b));
    engine.register_fn("!=", |a: Context, b: Context| !a.ptr_eq(&b));
    engine.register_fn("to_string", |c: &mut Context| format!("Context({})", c.name()));
    engine.register_fn("to_debug", |c: &mut Context| format!("{c:?}"));
}
