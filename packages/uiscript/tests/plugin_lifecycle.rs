//! End-to-end: the script plugin inside a host core.

use std::io::Write;
use std::rc::Rc;

use glam::IVec2;
use uiscript::host::{Context, Core, Document, ScriptSource, Variant};
use uiscript::{BridgeConfig, ScriptBridge, ScriptDiagnosticKind, ScriptPlugin};

fn host() -> (Core, Rc<ScriptBridge>, Context, Document) {
    let core = Core::new();
    let bridge = ScriptPlugin::initialise(&core, BridgeConfig::default());
    core.initialise();
    let context = core.create_context("main", IVec2::new(800, 600)).unwrap();
    let document = context.create_document("body").unwrap();
    (core, bridge, context, document)
}

fn inline(document: &Document, code: &str) {
    document.load_script(&ScriptSource::Inline {
        code: code.to_string(),
        name: "inline".to_string(),
    });
}

#[test]
fn test_inline_handlers_from_markup_attributes() {
    let (_core, bridge, _context, document) = host();
    inline(
        &document,
        r#"
        let button = document.create_element("button");
        button.id = "save";
        document.append_child(button);
        "#,
    );
    let button = document.get_element_by_id("save").unwrap();

    // What the markup parser would do for `onclick="..."`.
    button.set_attribute(
        "onclick",
        Variant::from(r#"document.set_attribute("saved_by", element.id + ":" + event.parameters["button"]);"#),
    );
    let params = [("button".to_string(), Variant::Int(0))].into_iter().collect();
    assert!(button.dispatch_event("click", params, true));
    assert_eq!(document.attribute("saved_by"), Some(Variant::from("save:0")));

    // Replacing the handler releases the old one.
    let before = bridge.num_references();
    button.set_attribute("onclick", Variant::from("let unused = 1;"));
    assert_eq!(bridge.num_references(), before);
    button.remove_attribute("onclick");
    assert_eq!(bridge.num_references(), before - 1);

    assert!(bridge.take_diagnostics().is_empty());
    assert_eq!(bridge.stack_depth(), 0);
}

#[test]
fn test_listener_runs_once_per_dispatch() {
    let (_core, bridge, _context, document) = host();
    inline(
        &document,
        r#"
        document.add_event_listener("tick", |event, element, document| {
            document.set_attribute("ticks", document.get_attribute("ticks", 0) + 1);
        });
        "#,
    );
    for _ in 0..3 {
        document.dispatch_event("tick", Default::default(), false);
    }
    assert_eq!(document.attribute("ticks"), Some(Variant::Int(3)));
    assert!(bridge.take_diagnostics().is_empty());
}

#[test]
fn test_script_tag_instancer_used_by_factory() {
    let (core, bridge, context, document) = host();
    inline(
        &document,
        r#"
        rocket.register_tag("slider", ElementInstancer(|tag| {
            let slider = Element(tag);
            slider.set_attribute("min", 0);
            slider.set_attribute("max", 100);
            slider
        }));
        "#,
    );

    let other = context.create_document("body").unwrap();
    let slider = other.create_element("slider");
    assert_eq!(slider.attribute("max"), Some(Variant::Int(100)));
    assert_eq!(slider.owner_document(), Some(other));
    assert!(core.factory().registered_tags().contains(&"slider".to_string()));
    assert!(bridge.take_diagnostics().is_empty());
}

#[test]
fn test_external_scripts_and_errors() {
    let (_core, bridge, _context, document) = host();

    let mut good = tempfile::Builder::new().suffix(".rhai").tempfile().unwrap();
    writeln!(good, r#"document.title = "From file";"#).unwrap();
    document.load_script(&ScriptSource::File(good.path().to_path_buf()));
    assert_eq!(document.title(), "From file");

    let mut bad = tempfile::Builder::new().suffix(".rhai").tempfile().unwrap();
    writeln!(bad, "let x = ;").unwrap();
    document.load_script(&ScriptSource::File(bad.path().to_path_buf()));
    inline(&document, r#"throw "boom";"#);

    let diagnostics = bridge.take_diagnostics();
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].kind, ScriptDiagnosticKind::ParseError);
    assert!(diagnostics[1].message.contains("boom"));
}

#[test]
fn test_core_shutdown_keeps_runtime_open() {
    let (core, bridge, _context, _document) = host();
    core.shutdown();
    assert!(bridge.is_running());
    assert!(bridge.do_string("let still = 1;", "after core shutdown"));

    bridge.shutdown();
    assert!(!bridge.do_string("let gone = 1;", "after bridge shutdown"));
    let diagnostics = bridge.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, ScriptDiagnosticKind::HostError);
}

#[test]
fn test_two_hosts_do_not_share_state() {
    let (_core_a, bridge_a, _ctx_a, doc_a) = host();
    let (_core_b, bridge_b, _ctx_b, doc_b) = host();

    inline(&doc_a, r#"rocket.create_context("only_in_a", Vector2i(1, 1));"#);
    inline(
        &doc_b,
        r#"if type_of(rocket.get_context("only_in_a")) != "()" { throw "leaked"; }"#,
    );
    assert!(bridge_a.take_diagnostics().is_empty());
    assert!(bridge_b.take_diagnostics().is_empty());
}
