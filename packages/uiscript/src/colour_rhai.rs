//! Rhai registration for `Colourb` (byte channels) and `Colourf` (float
//! channels).

use rhai::{Dynamic, Engine, EvalAltResult, FLOAT, INT};

use crate::bindings::BindingContext;
use crate::host::{Colourb, Colourf};
use crate::vector_rhai::number_arg;

pub fn register_colourb(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<Colourb>("Colourb");

    // Channels outside 0..=255 are clamped.
    engine.register_fn("Colourb", |r: INT, g: INT, b: INT| Colourb::from_ints(r, g, b, 255));
    engine.register_fn("Colourb", |r: INT, g: INT, b: INT, a: INT| {
        Colourb::from_ints(r, g, b, a)
    });

    engine.register_get_set(
        "red",
        |c: &mut Colourb| c.r as INT,
        |c: &mut Colourb, v: INT| c.r = v.clamp(0, 255) as u8,
    );
    engine.register_get_set(
        "green",
        |c: &mut Colourb| c.g as INT,
        |c: &mut Colourb, v: INT| c.g = v.clamp(0, 255) as u8,
    );
    engine.register_get_set(
        "blue",
        |c: &mut Colourb| c.b as INT,
        |c: &mut Colourb, v: INT| c.b = v.clamp(0, 255) as u8,
    );
    engine.register_get_set(
        "alpha",
        |c: &mut Colourb| c.a as INT,
        |c: &mut Colourb, v: INT| c.a = v.clamp(0, 255) as u8,
    );
    engine.register_get("rgba", |c: &mut Colourb| -> rhai::Array {
        [c.r, c.g, c.b, c.a]
            .into_iter()
            .map(|v| Dynamic::from(v as INT))
            .collect()
    });

    engine.register_fn("+", |a: Colourb, b: Colourb| a.saturating_add(b));
    engine.register_fn("*", |c: Colourb, factor: FLOAT| c.scale(factor));
    engine.register_fn("*", |c: Colourb, factor: INT| c.scale(factor as f32));
    engine.register_fn("==", |a: Colourb, b: Colourb| a == b);
    engine.register_fn("!=", |a: Colourb, b: Colourb| a != b);

    engine.register_fn("to_colourf", |c: &mut Colourb| c.to_colourf());
    engine.register_fn("to_string", |c: &mut Colourb| c.to_string());
    engine.register_fn("to_debug", |c: &mut Colourb| c.to_string());
}

pub fn register_colourf(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<Colourf>("Colourf");

    engine.register_fn(
        "Colourf",
        |r: Dynamic, g: Dynamic, b: Dynamic, a: Dynamic| -> Result<Colourf, Box<EvalAltResult>> {
            Ok(Colourf::new(
                number_arg(&r, "red")?,
                number_arg(&g, "green")?,
                number_arg(&b, "blue")?,
                number_arg(&a, "alpha")?,
            ))
        },
    );

    engine.register_get("red", |c: &mut Colourf| c.r);
    engine.register_set("red", |c: &mut Colourf, v: Dynamic| -> Result<(), Box<EvalAltResult>> {
        c.r = number_arg(&v, "red")?;
        Ok(())
    });
    engine.register_get("green", |c: &mut Colourf| c.g);
    engine.register_set("green", |c: &mut Colourf, v: Dynamic| -> Result<(), Box<EvalAltResult>> {
        c.g = number_arg(&v, "green")?;
        Ok(())
    });
    engine.register_get("blue", |c: &mut Colourf| c.b);
    engine.register_set("blue", |c: &mut Colourf, v: Dynamic| -> Result<(), Box<EvalAltResult>> {
        c.b = number_arg(&v, "blue")?;
        Ok(())
    });
    engine.register_get("alpha", |c: &mut Colourf| c.a);
    engine.register_set("alpha", |c: &mut Colourf, v: Dynamic| -> Result<(), Box<EvalAltResult>> {
        c.a = number_arg(&v, "alpha")?;
        Ok(())
    });

    engine.register_fn("+", |a: Colourf, b: Colourf| {
        Colourf::new(a.r + b.r, a.g + b.g, a.b + b.b, a.a + b.a)
    });
    engine.register_fn("*", |c: Colourf, f: FLOAT| Colourf::new(c.r * f, c.g * f, c.b * f, c.a * f));
    engine.register_fn("==", |a: Colourf, b: Colourf| a == b);
    engine.register_fn("!=", |a: Colourf, b: Colourf| a != b);

    engine.register_fn("to_colourb", |c: &mut Colourf| c.to_colourb());
    engine.register_fn("to_string", |c: &mut Colourf| c.to_string());
    engine.register_fn("to_debug", |c: &mut Colourf| c.to_string());
}

#[cfg(test)]
mod tests {
    use std::rc::Weak;

    use super::*;
    use crate::host::Core;

    fn engine() -> Engine {
        let mut engine = Engine::new();
        let mut ctx = BindingContext::new(Core::new(), Weak::new());
        register_colourf(&mut engine, &mut ctx);
        register_colourb(&mut engine, &mut ctx);
        engine
    }

    #[test]
    fn test_colourb_channels_clamp() {
        let engine = engine();
        let c: Colourb = engine
            .eval("let c = Colourb(300, 10, -5); c.alpha = 128; c.green += 5; c")
            .unwrap();
        assert_eq!(c, Colourb::new(255, 15, 0, 128));
    }

    #[test]
    fn test_colourb_operators() {
        let engine = engine();
        let c: Colourb = engine
            .eval("Colourb(200, 0, 0, 255) + Colourb(100, 20, 0, 0)")
            .unwrap();
        assert_eq!(c, Colourb::new(255, 20, 0, 255));
        let half: Colourb = engine.eval("Colourb(100, 50, 0, 200) * 0.5").unwrap();
        assert_eq!(half, Colourb::new(50, 25, 0, 100));
    }

    #[test]
    fn test_conversion_between_colour_types() {
        let engine = engine();
        let c: Colourb = engine
            .eval("Colourf(1, 0.5, 0, 1).to_colourb()")
            .unwrap();
        assert_eq!(c, Colourb::new(255, 128, 0, 255));
        let same: bool = engine
            .eval("Colourb(10, 20, 30, 40).to_colourf().to_colourb() == Colourb(10, 20, 30, 40)")
            .unwrap();
        assert!(same);
    }
}
