//! Loosely typed values stored in element attributes and event parameters.

use glam::{IVec2, Vec2};
use serde::Serialize;

use super::colour::{Colourb, Colourf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Variant {
    Int(i64),
    Float(f32),
    Bool(bool),
    String(String),
    Vector2i(IVec2),
    Vector2f(Vec2),
    Colourb(Colourb),
    Colourf(Colourf),
}

impl Variant {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value the way it would appear in markup.
    pub fn to_markup_string(&self) -> String {
        match self {
            Variant::Int(i) => i.to_string(),
            Variant::Float(f) => f.to_string(),
            Variant::Bool(b) => b.to_string(),
            Variant::String(s) => s.clone(),
            Variant::Vector2i(v) => format!("{}, {}", v.x, v.y),
            Variant::Vector2f(v) => format!("{}, {}", v.x, v.y),
            Variant::Colourb(c) => format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            Variant::Colourf(c) => {
                let c = c.to_colourb();
                format!("rgba({}, {}, {}, {})", c.r, c.g, c.b, c.a)
            }
        }
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Variant::Float(value)
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<IVec2> for Variant {
    fn from(value: IVec2) -> Self {
        Variant::Vector2i(value)
    }
}

impl From<Vec2> for Variant {
    fn from(value: Vec2) -> Self {
        Variant::Vector2f(value)
    }
}

impl From<Colourb> for Variant {
    fn from(value: Colourb) -> Self {
        Variant::Colourb(value)
    }
}

impl From<Colourf> for Variant {
    fn from(value: Colourf) -> Self {
        Variant::Colourf(value)
    }
}
