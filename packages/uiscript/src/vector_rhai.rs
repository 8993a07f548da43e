//! Rhai registration for the `Vector2i` and `Vector2f` value types.
//!
//! Both map directly onto glam's `IVec2` and `Vec2`. Script integers are
//! `i64` and script floats `f32`; components are converted on the way in.

use glam::{IVec2, Vec2};
use rhai::{Dynamic, Engine, EvalAltResult, FLOAT, INT};

use crate::bindings::BindingContext;

/// Accept either a script float or a script integer.
pub(crate) fn number_arg(value: &Dynamic, what: &str) -> Result<f32, Box<EvalAltResult>> {
    if let Ok(f) = value.as_float() {
        return Ok(f);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("{what} must be a number, not {}", value.type_name()).into())
}

/// Narrow a script integer to a `Vector2i` component.
fn component(value: INT, what: &str) -> Result<i32, Box<EvalAltResult>> {
    i32::try_from(value).map_err(|_| -> Box<EvalAltResult> {
        format!("Vector2i {what} out of range: {value}").into()
    })
}

fn checked(x: Option<i32>, y: Option<i32>) -> Result<IVec2, Box<EvalAltResult>> {
    match (x, y) {
        (Some(x), Some(y)) => Ok(IVec2::new(x, y)),
        _ => Err("Vector2i overflow".into()),
    }
}

pub fn register_vector2i(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<IVec2>("Vector2i");

    engine.register_fn(
        "Vector2i",
        |x: INT, y: INT| -> Result<IVec2, Box<EvalAltResult>> {
            Ok(IVec2::new(component(x, "x")?, component(y, "y")?))
        },
    );

    engine.register_get("x", |v: &mut IVec2| v.x as INT);
    engine.register_set("x", |v: &mut IVec2, x: INT| -> Result<(), Box<EvalAltResult>> {
        v.x = component(x, "x")?;
        Ok(())
    });
    engine.register_get("y", |v: &mut IVec2| v.y as INT);
    engine.register_set("y", |v: &mut IVec2, y: INT| -> Result<(), Box<EvalAltResult>> {
        v.y = component(y, "y")?;
        Ok(())
    });

    // === Operators ===
    // Checked like script integers: overflow is a script error.
    engine.register_fn("+", |a: IVec2, b: IVec2| {
        checked(a.x.checked_add(b.x), a.y.checked_add(b.y))
    });
    engine.register_fn("-", |a: IVec2, b: IVec2| {
        checked(a.x.checked_sub(b.x), a.y.checked_sub(b.y))
    });
    engine.register_fn("-", |a: IVec2| checked(a.x.checked_neg(), a.y.checked_neg()));
    engine.register_fn("*", |a: IVec2, s: INT| -> Result<IVec2, Box<EvalAltResult>> {
        let s = component(s, "scale")?;
        checked(a.x.checked_mul(s), a.y.checked_mul(s))
    });
    engine.register_fn("/", |a: IVec2, s: INT| -> Result<IVec2, Box<EvalAltResult>> {
        if s == 0 {
            return Err("Vector2i division by zero".into());
        }
        let s = component(s, "divisor")?;
        checked(a.x.checked_div(s), a.y.checked_div(s))
    });
    engine.register_fn("==", |a: IVec2, b: IVec2| a == b);
    engine.register_fn("!=", |a: IVec2, b: IVec2| a != b);

    engine.register_fn("magnitude", |v: &mut IVec2| v.as_vec2().length() as FLOAT);
    engine.register_fn("to_vector2f", |v: &mut IVec2| v.as_vec2());

    engine.register_fn("to_string", |v: &mut IVec2| format!("Vector2i({}, {})", v.x, v.y));
    engine.register_fn("to_debug", |v: &mut IVec2| format!("Vector2i({}, {})", v.x, v.y));
}

pub fn register_vector2f(engine: &mut Engine, _ctx: &mut BindingContext) {
    engine.register_type_with_name::<Vec2>("Vector2f");

    engine.register_fn(
        "Vector2f",
        |x: Dynamic, y: Dynamic| -> Result<Vec2, Box<EvalAltResult>> {
            Ok(Vec2::new(number_arg(&x, "x")?, number_arg(&y, "y")?))
        },
    );

    // Setters take any number, so the getter/setter pair is registered apart.
    engine.register_get("x", |v: &mut Vec2| v.x);
    engine.register_set("x", |v: &mut Vec2, x: Dynamic| -> Result<(), Box<EvalAltResult>> {
        v.x = number_arg(&x, "x")?;
        Ok(())
    });
    engine.register_get("y", |v: &mut Vec2| v.y);
    engine.register_set("y", |v: &mut Vec2, y: Dynamic| -> Result<(), Box<EvalAltResult>> {
        v.y = number_arg(&y, "y")?;
        Ok(())
    });

    // === Operators ===
    engine.register_fn("+", |a: Vec2, b: Vec2| a + b);
    engine.register_fn("-", |a: Vec2, b: Vec2| a - b);
    engine.register_fn("-", |a: Vec2| -a);
    engine.register_fn("*", |a: Vec2, s: FLOAT| a * s);
    engine.register_fn("*", |a: Vec2, s: INT| a * s as f32);
    engine.register_fn("/", |a: Vec2, s: FLOAT| a / s);
    engine.register_fn("/", |a: Vec2, s: INT| a / s as f32);
    engine.register_fn("==", |a: Vec2, b: Vec2| a == b);
    engine.register_fn("!=", |a: Vec2, b: Vec2| a != b);

    engine.register_fn("dot", |a: &mut Vec2, b: Vec2| a.dot(b));
    engine.register_fn("magnitude", |v: &mut Vec2| v.length());
    // Zero vectors stay zero rather than turning into NaN.
    engine.register_fn("normalise", |v: &mut Vec2| v.normalize_or_zero());
    // Counter-clockwise, in radians.
    engine.register_fn("rotate", |v: &mut Vec2, radians: FLOAT| Vec2::from_angle(radians).rotate(*v));
    engine.register_fn("to_vector2i", |v: &mut Vec2| v.round().as_ivec2());

    engine.register_fn("to_string", |v: &mut Vec2| format!("Vector2f({}, {})", v.x, v.y));
    engine.register_fn("to_debug", |v: &mut Vec2| format!("Vector2f({}, {})", v.x, v.y));
}
