//! Rhai registration for `Element`, `Document` and `ElementStyle`.
//!
//! `Document` specialises `Element`: every element member is registered for
//! both types through [`ElementLike`], then the document-only members are
//! added on top. Both types are shared handles, so a value held by a script
//! always observes the live tree.
//!
//! # Example (Rhai)
//! ```rhai
//! let button = document.create_element("button");
//! button.id = "ok";
//! button.set_attribute("onclick", "log.info(event.event_type);");
//! button.style["width"] = "120px";
//! document.append_child(button);
//! ```

use std::rc::{Rc, Weak};

use glam::Vec2;
use rhai::{Array, Dynamic, Engine, EvalAltResult, FnPtr, ImmutableString, Map, INT};

use crate::bindings::BindingContext;
use crate::bridge::ScriptBridge;
use crate::event_listener::{listener_from_code, ScriptEventListener};
use crate::host::{Document, Element};
use crate::proxy_rhai::ElementAttributesProxy;
use crate::variant_rhai::{expect_variant, map_to_parameters, variant_to_dynamic};

/// Script view of an element's inline style: `element.style["color"]`, or
/// `element.style.color` through the indexer fallback.
#[derive(Clone)]
pub struct ElementStyle(pub(crate) Element);

/// Anything scripts can treat as an element.
pub trait ElementLike: Clone + 'static {
    fn element(&self) -> &Element;
}

impl ElementLike for Element {
    fn element(&self) -> &Element {
        self
    }
}

impl ElementLike for Document {
    fn element(&self) -> &Element {
        self.as_element()
    }
}

/// Documents go to scripts as `Document`, everything else as `Element`.
pub fn element_to_dynamic(element: Option<Element>) -> Dynamic {
    match element {
        None => Dynamic::UNIT,
        Some(element) => match Document::from_element(&element) {
            Some(document) => Dynamic::from(document),
            None => Dynamic::from(element),
        },
    }
}

fn elements_to_array(elements: Vec<Element>) -> Array {
    elements.into_iter().map(|e| element_to_dynamic(Some(e))).collect()
}

fn upgrade(bridge: &Weak<ScriptBridge>) -> Result<Rc<ScriptBridge>, Box<EvalAltResult>> {
    bridge
        .upgrade()
        .ok_or_else(|| "script runtime is no longer available".into())
}

pub fn register_element_style(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<ElementStyle>("ElementStyle");

    engine.register_indexer_get(|s: &mut ElementStyle, name: ImmutableString| -> Dynamic {
        match s.0.style_property(&name) {
            Some(value) => Dynamic::from(value),
            None => Dynamic::UNIT,
        }
    });
    // Assigning `()` clears the property; other values are stored as markup text.
    engine.register_indexer_set(
        |s: &mut ElementStyle, name: ImmutableString, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            if value.is_unit() {
                s.0.remove_style_property(&name);
                return Ok(());
            }
            let what = format!("style property '{name}'");
            let value = expect_variant(value, &what)?;
            s.0.set_style_property(&name, &value.to_markup_string());
            Ok(())
        },
    );
    engine.register_fn("remove", |s: &mut ElementStyle, name: &str| {
        s.0.remove_style_property(name)
    });
    engine.register_fn("contains", |s: &mut ElementStyle, name: &str| {
        s.0.style_property(name).is_some()
    });
    engine.register_fn("keys", |s: &mut ElementStyle| -> Array {
        s.0.style_properties().into_keys().map(Dynamic::from).collect()
    });
    engine.register_fn("len", |s: &mut ElementStyle| s.0.style_properties().len() as INT);
    engine.register_fn("to_string", |s: &mut ElementStyle| {
        let properties: Vec<String> = s
            .0
            .style_properties()
            .into_iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect();
        properties.join(" ")
    });
}

pub fn register_element(engine: &mut Engine, ctx: &mut BindingContext) {
    engine.register_type_with_name::<Element>("Element");

    // Detached element with no owner document. Prefer `document.create_element`.
    engine.register_fn("Element", |tag: &str| Element::new(tag));

    register_element_api::<Element>(engine, ctx.bridge());
}

pub fn register_document(engine: &mut Engine, ctx: &mut BindingContext) {
    engine.register_type_with_name::<Document>("Document");

    register_element_api::<Document>(engine, ctx.bridge());

    engine.register_get_set(
        "title",
        |d: &mut Document| d.title(),
        |d: &mut Document, title: String| d.set_title(&title),
    );
    engine.register_get("context", |d: &mut Document| match d.context() {
        Some(context) => Dynamic::from(context),
        None => Dynamic::UNIT,
    });
    engine.register_get("visible", |d: &mut Document| d.is_shown());
    engine.register_fn("show", |d: &mut Document| d.show());
    engine.register_fn("hide", |d: &mut Document| d.hide());
    engine.register_fn("close", |d: &mut Document| d.close());
    engine.register_fn("create_element", |d: &mut Document, tag: &str| {
        element_to_dynamic(Some(d.create_element(tag)))
    });
    engine.register_fn("create_text_node", |d: &mut Document, text: &str| {
        d.create_text_node(text)
    });
    engine.register_fn("as_element", |d: &mut Document| d.as_element().clone());
}

/// Register every element member for `T`.
fn register_element_api<T: ElementLike>(engine: &mut Engine, bridge: Weak<ScriptBridge>) {
    // === Identity ===
    engine.register_get("tag_name", |e: &mut T| e.element().tag_name());
    engine.register_get_set(
        "id",
        |e: &mut T| e.element().id(),
        |e: &mut T, id: String| e.element().set_id(&id),
    );
    engine.register_get_set(
        "class_name",
        |e: &mut T| e.element().class_names(),
        |e: &mut T, names: String| e.element().set_class_names(&names),
    );
    engine.register_get_set(
        "inner_rml",
        |e: &mut T| e.element().inner_rml(),
        |e: &mut T, rml: String| e.element().set_inner_rml(&rml),
    );
    engine.register_fn("set_class", |e: &mut T, name: &str, active: bool| {
        e.element().set_class(name, active)
    });
    engine.register_fn("is_class_set", |e: &mut T, name: &str| e.element().is_class_set(name));

    // === Geometry ===
    engine.register_get_set(
        "offset",
        |e: &mut T| e.element().offset(),
        |e: &mut T, offset: Vec2| e.element().set_offset(offset),
    );
    engine.register_get_set(
        "size",
        |e: &mut T| e.element().size(),
        |e: &mut T, size: Vec2| e.element().set_size(size),
    );

    // === Attributes and style ===
    // The setters only matter when a proxy of another element is assigned;
    // proxies of this element already write through.
    engine.register_get_set(
        "attributes",
        |e: &mut T| ElementAttributesProxy(e.element().clone()),
        |e: &mut T, proxy: ElementAttributesProxy| {
            if !proxy.0.ptr_eq(e.element()) {
                for (name, value) in proxy.0.attributes() {
                    e.element().set_attribute(&name, value);
                }
            }
        },
    );
    engine.register_get_set(
        "style",
        |e: &mut T| ElementStyle(e.element().clone()),
        |e: &mut T, style: ElementStyle| {
            if !style.0.ptr_eq(e.element()) {
                for (name, value) in style.0.style_properties() {
                    e.element().set_style_property(&name, &value);
                }
            }
        },
    );
    engine.register_fn("get_attribute", |e: &mut T, name: &str| {
        e.element()
            .attribute(name)
            .map(|v| variant_to_dynamic(&v))
            .unwrap_or(Dynamic::UNIT)
    });
    engine.register_fn("get_attribute", |e: &mut T, name: &str, default: Dynamic| {
        e.element()
            .attribute(name)
            .map(|v| variant_to_dynamic(&v))
            .unwrap_or(default)
    });
    engine.register_fn(
        "set_attribute",
        |e: &mut T, name: &str, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let value = expect_variant(value, &format!("attribute '{name}'"))?;
            e.element().set_attribute(name, value);
            Ok(())
        },
    );
    engine.register_fn("has_attribute", |e: &mut T, name: &str| e.element().has_attribute(name));
    engine.register_fn("remove_attribute", |e: &mut T, name: &str| {
        e.element().remove_attribute(name)
    });

    // === Tree ===
    engine.register_get("parent_node", |e: &mut T| element_to_dynamic(e.element().parent()));
    engine.register_get("first_child", |e: &mut T| element_to_dynamic(e.element().first_child()));
    engine.register_get("last_child", |e: &mut T| element_to_dynamic(e.element().last_child()));
    engine.register_get("next_sibling", |e: &mut T| {
        element_to_dynamic(e.element().next_sibling())
    });
    engine.register_get("previous_sibling", |e: &mut T| {
        element_to_dynamic(e.element().previous_sibling())
    });
    engine.register_get("child_nodes", |e: &mut T| elements_to_array(e.element().children()));
    engine.register_get("owner_document", |e: &mut T| match e.element().owner_document() {
        Some(document) => Dynamic::from(document),
        None => Dynamic::UNIT,
    });
    engine.register_fn("has_child_nodes", |e: &mut T| e.element().has_child_nodes());
    engine.register_fn("append_child", |e: &mut T, child: Element| e.element().append_child(&child));
    engine.register_fn("remove_child", |e: &mut T, child: Element| e.element().remove_child(&child));
    engine.register_fn("get_element_by_id", |e: &mut T, id: &str| {
        element_to_dynamic(e.element().get_element_by_id(id))
    });
    engine.register_fn("get_elements_by_tag_name", |e: &mut T, tag: &str| {
        elements_to_array(e.element().get_elements_by_tag_name(tag))
    });

    // === Events ===
    let weak = bridge.clone();
    engine.register_fn(
        "add_event_listener",
        move |e: &mut T, event: &str, listener: FnPtr| -> Result<(), Box<EvalAltResult>> {
            let bridge = upgrade(&weak)?;
            let reference = bridge.reference_pointer(listener);
            let listener = Rc::new(ScriptEventListener::new(&bridge, reference));
            e.element().add_event_listener(event, listener);
            Ok(())
        },
    );
    let weak = bridge;
    engine.register_fn(
        "add_event_listener",
        move |e: &mut T, event: &str, code: &str| -> Result<bool, Box<EvalAltResult>> {
            let bridge = upgrade(&weak)?;
            match listener_from_code(&bridge, code, e.element()) {
                Some(listener) => {
                    e.element().add_event_listener(event, listener);
                    Ok(true)
                }
                None => Ok(false),
            }
        },
    );
    engine.register_fn("dispatch_event", |e: &mut T, event: &str| {
        e.element().dispatch_event(event, Default::default(), false)
    });
    engine.register_fn(
        "dispatch_event",
        |e: &mut T, event: &str, parameters: Map| -> Result<bool, Box<EvalAltResult>> {
            let parameters = map_to_parameters(parameters)?;
            Ok(e.element().dispatch_event(event, parameters, false))
        },
    );
    engine.register_fn(
        "dispatch_event",
        |e: &mut T, event: &str, parameters: Map, interruptible: bool| -> Result<bool, Box<EvalAltResult>> {
            let parameters = map_to_parameters(parameters)?;
            Ok(e.element().dispatch_event(event, parameters, interruptible))
        },
    );

    // === Comparison and display ===
    engine.register_fn("==", |a: T, b: T| a.element().ptr_eq(b.element()));
    engine.register_fn("!=", |a: T, b: T| !a.element().ptr_eq(b.element()));
    engine.register_fn("to_string", |e: &mut T| describe(e.element()));
    engine.register_fn("to_debug", |e: &mut T| describe(e.element()));
}

fn describe(element: &Element) -> String {
    let id = element.id();
    if id.is_empty() {
        format!("<{}>", element.tag_name())
    } else {
        format!("<{} id=\"{}\">", element.tag_name(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Core, Variant};

    fn bridge_in_document() -> (Rc<ScriptBridge>, Document) {
        let bridge = ScriptBridge::with_default_bindings(&Core::new());
        bridge.startup();
        let document = Document::new("body");
        (bridge, document)
    }

    fn run(bridge: &ScriptBridge, document: &Document, code: &str) -> Dynamic {
        bridge
            .run_in_document(document, || bridge.eval(code, "element test"))
            .unwrap()
    }

    #[test]
    fn test_build_tree_from_script() {
        let (bridge, document) = bridge_in_document();
        run(
            &bridge,
            &document,
            r#"
            let list = document.create_element("ul");
            list.id = "menu";
            for label in ["New", "Open"] {
                let item = document.create_element("li");
                item.inner_rml = label;
                list.append_child(item);
            }
            document.append_child(list);
            "#,
        );

        let menu = document.get_element_by_id("menu").unwrap();
        assert_eq!(menu.num_children(), 2);
        assert_eq!(menu.children()[1].inner_rml(), "Open");
        assert_eq!(menu.owner_document(), Some(document.clone()));
    }

    #[test]
    fn test_navigation_returns_documents_as_documents() {
        let (bridge, document) = bridge_in_document();
        let div = document.create_element("div");
        document.append_child(&div);
        div.set_id("inner");

        let kind = run(
            &bridge,
            &document,
            r#"type_of(document.get_element_by_id("inner").parent_node)"#,
        );
        assert_eq!(kind.into_string().unwrap(), "Document");

        let missing = run(&bridge, &document, "document.first_child.next_sibling");
        assert!(missing.is_unit());

        let unnamed = run(&bridge, &document, r#"document.get_element_by_id("")"#);
        assert!(unnamed.is_unit());
    }

    #[test]
    fn test_attributes_and_classes() {
        let (bridge, document) = bridge_in_document();
        run(
            &bridge,
            &document,
            r#"
            document.set_attribute("width", 40);
            document.attributes["label"] = "Save";
            document.set_class("active", true);
            document.set_class("hidden", true);
            document.set_class("hidden", false);
            "#,
        );
        assert_eq!(document.attribute("width"), Some(Variant::Int(40)));
        assert_eq!(document.attribute("label"), Some(Variant::String("Save".into())));
        assert_eq!(document.class_names(), "active");

        let fallback = run(&bridge, &document, r#"document.get_attribute("missing", 7)"#);
        assert_eq!(fallback.as_int().unwrap(), 7);
        assert!(bridge
            .run_in_document(&document, || bridge.eval("document.set_attribute(\"x\", [1])", "bad"))
            .is_err());
    }

    #[test]
    fn test_style_access() {
        let (bridge, document) = bridge_in_document();
        run(
            &bridge,
            &document,
            r#"
            document.style["color"] = "red";
            document.style.width = 120;
            document.style.height = "auto";
            document.style.height = ();
            "#,
        );
        assert_eq!(document.style_property("color").as_deref(), Some("red"));
        assert_eq!(document.style_property("width").as_deref(), Some("120"));
        assert_eq!(document.style_property("height"), None);
    }

    #[test]
    fn test_function_listener_runs_per_dispatch() {
        let (bridge, document) = bridge_in_document();
        run(
            &bridge,
            &document,
            r#"
            document.add_event_listener("click", |event, element, doc| {
                let count = element.get_attribute("clicks", 0);
                element.set_attribute("clicks", count + event.parameters["step"]);
            });
            "#,
        );
        for _ in 0..2 {
            let params = [("step".to_string(), Variant::Int(2))].into_iter().collect();
            document.dispatch_event("click", params, false);
        }
        assert_eq!(document.attribute("clicks"), Some(Variant::Int(4)));
        assert!(bridge.take_diagnostics().is_empty());
    }

    #[test]
    fn test_document_members() {
        let (bridge, document) = bridge_in_document();
        let visible = run(
            &bridge,
            &document,
            r#"document.title = "Options"; document.show(); document.visible"#,
        );
        assert!(visible.as_bool().unwrap());
        assert_eq!(document.title(), "Options");
        let same = run(&bridge, &document, "document == document.as_element().owner_document");
        assert!(same.as_bool().unwrap());
    }
}
