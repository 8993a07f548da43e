//! Collection proxies: live, indexable views over host collections.
//!
//! A proxy holds a handle to its owner and reads through on every access,
//! so it never goes stale.

use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, INT};

use crate::bindings::BindingContext;
use crate::host::{Context, Document, Element, Event};
use crate::variant_rhai::{expect_variant, parameters_to_map, variant_to_dynamic};

/// `context.documents`: documents by id or by position.
#[derive(Clone)]
pub struct ContextDocumentsProxy(pub(crate) Context);

/// `event.parameters`: read-only event parameters.
#[derive(Clone)]
pub struct EventParametersProxy(pub(crate) Event);

/// `element.attributes`: read-write element attributes.
#[derive(Clone)]
pub struct ElementAttributesProxy(pub(crate) Element);

impl IntoIterator for ContextDocumentsProxy {
    type Item = Document;
    type IntoIter = std::vec::IntoIter<Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.documents().into_iter()
    }
}

fn document_or_unit(document: Option<Document>) -> Dynamic {
    document.map(Dynamic::from).unwrap_or(Dynamic::UNIT)
}

pub fn register_context_documents(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<ContextDocumentsProxy>("ContextDocumentsProxy");

    engine.register_indexer_get(|p: &mut ContextDocumentsProxy, id: ImmutableString| {
        document_or_unit(p.0.get_document(&id))
    });
    // Negative or out of range positions give `()`.
    engine.register_indexer_get(|p: &mut ContextDocumentsProxy, index: INT| {
        let document = usize::try_from(index).ok().and_then(|i| p.0.document_at(i));
        document_or_unit(document)
    });
    engine.register_fn("len", |p: &mut ContextDocumentsProxy| p.0.num_documents() as INT);
    engine.register_fn("contains", |p: &mut ContextDocumentsProxy, id: &str| {
        p.0.get_document(id).is_some()
    });
    engine.register_fn("keys", |p: &mut ContextDocumentsProxy| -> Array {
        p.0.documents().iter().map(|d| Dynamic::from(d.id())).collect()
    });
    engine.register_iterator::<ContextDocumentsProxy>();
    engine.register_fn("to_string", |p: &mut ContextDocumentsProxy| {
        format!("ContextDocumentsProxy({} documents)", p.0.num_documents())
    });
}

pub fn register_event_parameters(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<EventParametersProxy>("EventParametersProxy");

    engine.register_indexer_get(|p: &mut EventParametersProxy, name: ImmutableString| {
        p.0.parameter(&name)
            .map(|v| variant_to_dynamic(&v))
            .unwrap_or(Dynamic::UNIT)
    });
    engine.register_indexer_set(
        |_: &mut EventParametersProxy, name: ImmutableString, _: Dynamic| -> Result<(), Box<EvalAltResult>> {
            Err(format!("event parameter '{name}' is read-only").into())
        },
    );
    engine.register_fn("len", |p: &mut EventParametersProxy| p.0.parameters().len() as INT);
    engine.register_fn("contains", |p: &mut EventParametersProxy, name: &str| {
        p.0.parameter(name).is_some()
    });
    engine.register_fn("keys", |p: &mut EventParametersProxy| -> Array {
        p.0.parameters().into_keys().map(Dynamic::from).collect()
    });
    engine.register_fn("to_map", |p: &mut EventParametersProxy| -> Map {
        parameters_to_map(&p.0.parameters())
    });
    engine.register_fn("to_string", |p: &mut EventParametersProxy| {
        format!("EventParametersProxy({} parameters)", p.0.parameters().len())
    });
}

pub fn register_element_attributes(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<ElementAttributesProxy>("ElementAttributesProxy");

    engine.register_indexer_get(|p: &mut ElementAttributesProxy, name: ImmutableString| {
        p.0.attribute(&name)
            .map(|v| variant_to_dynamic(&v))
            .unwrap_or(Dynamic::UNIT)
    });
    // Assigning `()` removes the attribute.
    engine.register_indexer_set(
        |p: &mut ElementAttributesProxy, name: ImmutableString, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            if value.is_unit() {
                p.0.remove_attribute(&name);
                return Ok(());
            }
            let value = expect_variant(value, &format!("attribute '{name}'"))?;
            p.0.set_attribute(&name, value);
            Ok(())
        },
    );
    engine.register_fn("len", |p: &mut ElementAttributesProxy| p.0.num_attributes() as INT);
    engine.register_fn("contains", |p: &mut ElementAttributesProxy, name: &str| {
        p.0.has_attribute(name)
    });
    engine.register_fn("remove", |p: &mut ElementAttributesProxy, name: &str| {
        p.0.remove_attribute(name)
    });
    engine.register_fn("keys", |p: &mut ElementAttributesProxy| -> Array {
        p.0.attribute_names().into_iter().map(Dynamic::from).collect()
    });
    engine.register_fn("to_string", |p: &mut ElementAttributesProxy| {
        format!("ElementAttributesProxy({} attributes)", p.0.num_attributes())
    });
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;
    use crate::bridge::ScriptBridge;
    use crate::host::{Core, Variant};

    #[test]
    fn test_documents_proxy() {
        let core = Core::new();
        let bridge = ScriptBridge::with_default_bindings(&core);
        bridge.startup();
        let context = core.create_context("main", IVec2::new(800, 600)).unwrap();
        for id in ["first", "second"] {
            context.create_document("body").unwrap().set_id(id);
        }

        let found: Dynamic = bridge
            .eval(
                r#"
                let docs = rocket.get_context("main").documents;
                let ids = [];
                for doc in docs { ids.push(doc.id); }
                [docs.len(), docs["second"].id, docs[0].id, docs[5], docs.contains("first"), ids]
                "#,
                "proxy",
            )
            .unwrap();
        let found = found.into_array().unwrap();
        assert_eq!(found[0].as_int().unwrap(), 2);
        assert_eq!(found[1].clone().into_string().unwrap(), "second");
        assert_eq!(found[2].clone().into_string().unwrap(), "first");
        assert!(found[3].is_unit());
        assert!(found[4].as_bool().unwrap());
        assert_eq!(found[5].clone().into_array().unwrap().len(), 2);
    }

    #[test]
    fn test_attribute_proxy_writes_through() {
        let bridge = ScriptBridge::with_default_bindings(&Core::new());
        bridge.startup();
        let element = Element::new("input");
        element.set_attribute("value", Variant::from("a"));
        let proxy = ElementAttributesProxy(element.clone());

        let engine = bridge.engine().unwrap();
        let mut scope = rhai::Scope::new();
        scope.push("attrs", proxy);
        engine
            .run_with_scope(
                &mut scope,
                r#"attrs["value"] = "b"; attrs["size"] = 3; attrs.remove("missing"); attrs["value"] += "!";"#,
            )
            .unwrap();
        assert_eq!(element.attribute("value"), Some(Variant::from("b!")));
        assert_eq!(element.attribute("size"), Some(Variant::Int(3)));

        engine.run_with_scope(&mut scope, r#"attrs["size"] = ();"#).unwrap();
        assert!(!element.has_attribute("size"));
    }

    #[test]
    fn test_event_parameters_are_read_only() {
        let bridge = ScriptBridge::with_default_bindings(&Core::new());
        bridge.startup();
        let target = Element::new("button");
        let params = [("key".to_string(), Variant::Int(13))].into_iter().collect();
        let event = Event::new("keydown", &target, params, true);

        let engine = bridge.engine().unwrap();
        let mut scope = rhai::Scope::new();
        scope.push("params", EventParametersProxy(event));
        let key: i64 = engine.eval_with_scope(&mut scope, r#"params["key"]"#).unwrap();
        assert_eq!(key, 13);
        assert!(engine.run_with_scope(&mut scope, r#"params["key"] = 1;"#).is_err());
        let keys: rhai::Array = engine.eval_with_scope(&mut scope, "params.keys()").unwrap();
        assert_eq!(keys.len(), 1);
    }
}
