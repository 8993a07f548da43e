//! The `rocket` global: script access to the host core.
//!
//! # Example (Rhai)
//! ```rhai
//! let main = rocket.create_context("main", Vector2i(1024, 768));
//! rocket.register_tag("badge", ElementInstancer(|tag| {
//!     let badge = Element(tag);
//!     badge.set_class("badge", true);
//!     badge
//! }));
//! ```

use std::rc::Rc;

use glam::IVec2;
use rhai::{Array, Dynamic, Engine, EvalAltResult};

use crate::bindings::BindingContext;
use crate::element_rhai::element_to_dynamic;
use crate::host::{Core, Element, WeakCore};
use crate::instancer_rhai::ScriptElementInstancer;

/// Holds the core weakly: the core owns the plugin that owns the runtime.
#[derive(Clone)]
pub struct RocketFacade {
    core: WeakCore,
}

impl RocketFacade {
    pub fn new(core: &Core) -> Self {
        Self {
            core: core.downgrade(),
        }
    }

    fn core(&self) -> Result<Core, Box<EvalAltResult>> {
        self.core
            .upgrade()
            .ok_or_else(|| "the GUI core has been destroyed".into())
    }
}

pub fn register_rocket(engine: &mut Engine, ctx: &mut BindingContext) {
    engine.register_type_with_name::<RocketFacade>("Rocket");

    engine.register_get("contexts", |r: &mut RocketFacade| -> Result<Array, Box<EvalAltResult>> {
        Ok(r.core()?.contexts().into_iter().map(Dynamic::from).collect())
    });
    engine.register_fn(
        "get_context",
        |r: &mut RocketFacade, name: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            Ok(r.core()?
                .get_context(name)
                .map(Dynamic::from)
                .unwrap_or(Dynamic::UNIT))
        },
    );
    // `()` if the name is already taken.
    engine.register_fn(
        "create_context",
        |r: &mut RocketFacade, name: &str, dimensions: IVec2| -> Result<Dynamic, Box<EvalAltResult>> {
            Ok(r.core()?
                .create_context(name, dimensions)
                .map(Dynamic::from)
                .unwrap_or(Dynamic::UNIT))
        },
    );
    engine.register_fn(
        "register_tag",
        |r: &mut RocketFacade, tag: &str, instancer: ScriptElementInstancer| -> Result<(), Box<EvalAltResult>> {
            r.core()?.register_element_instancer(tag, Rc::new(instancer));
            Ok(())
        },
    );
    // Elements made here have no owner document.
    engine.register_fn(
        "create_element",
        |r: &mut RocketFacade, tag: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            let element = r
                .core()?
                .instance_element(None, tag)
                .unwrap_or_else(|| Element::new(tag));
            Ok(element_to_dynamic(Some(element)))
        },
    );
    engine.register_get("tags", |r: &mut RocketFacade| -> Result<Array, Box<EvalAltResult>> {
        let tags = r.core()?.factory().registered_tags();
        Ok(tags.into_iter().map(Dynamic::from).collect())
    });
    engine.register_get("version", |_: &mut RocketFacade| {
        env!("CARGO_PKG_VERSION").to_string()
    });
    engine.register_fn("to_string", |_: &mut RocketFacade| "rocket".to_string());

    let facade = RocketFacade::new(ctx.core());
    ctx.define_global("rocket", facade);
}
