//! Conversions between script values and host `Variant`s.

use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use rhai::{Dynamic, EvalAltResult, Map};

use crate::host::{Colourb, Colourf, Variant};

pub fn variant_to_dynamic(value: &Variant) -> Dynamic {
    match value {
        Variant::Int(i) => Dynamic::from(*i),
        Variant::Float(f) => Dynamic::from(*f),
        Variant::Bool(b) => Dynamic::from(*b),
        Variant::String(s) => Dynamic::from(s.clone()),
        Variant::Vector2i(v) => Dynamic::from(*v),
        Variant::Vector2f(v) => Dynamic::from(*v),
        Variant::Colourb(c) => Dynamic::from(*c),
        Variant::Colourf(c) => Dynamic::from(*c),
    }
}

/// Convert a script value, or `None` if it has no host representation.
pub fn dynamic_to_variant(value: Dynamic) -> Option<Variant> {
    if value.is_string() {
        return value.into_string().ok().map(Variant::String);
    }
    if let Ok(i) = value.as_int() {
        return Some(Variant::Int(i));
    }
    if let Ok(f) = value.as_float() {
        return Some(Variant::Float(f));
    }
    if let Ok(b) = value.as_bool() {
        return Some(Variant::Bool(b));
    }
    if value.is::<IVec2>() {
        return value.try_cast::<IVec2>().map(Variant::Vector2i);
    }
    if value.is::<Vec2>() {
        return value.try_cast::<Vec2>().map(Variant::Vector2f);
    }
    if value.is::<Colourb>() {
        return value.try_cast::<Colourb>().map(Variant::Colourb);
    }
    if value.is::<Colourf>() {
        return value.try_cast::<Colourf>().map(Variant::Colourf);
    }
    None
}

/// Like [`dynamic_to_variant`], but a script error naming `what` on failure.
pub fn expect_variant(value: Dynamic, what: &str) -> Result<Variant, Box<EvalAltResult>> {
    let type_name = value.type_name();
    dynamic_to_variant(value)
        .ok_or_else(|| format!("{what} cannot hold a value of type {type_name}").into())
}

pub fn map_to_parameters(map: Map) -> Result<BTreeMap<String, Variant>, Box<EvalAltResult>> {
    map.into_iter()
        .map(|(key, value)| {
            let what = format!("event parameter '{key}'");
            Ok((key.to_string(), expect_variant(value, &what)?))
        })
        .collect()
}

pub fn parameters_to_map(parameters: &BTreeMap<String, Variant>) -> Map {
    let mut map = Map::new();
    for (key, value) in parameters {
        map.insert(key.as_str().into(), variant_to_dynamic(value));
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_values_keep_their_kind() {
        assert_eq!(dynamic_to_variant(Dynamic::from(7_i64)), Some(Variant::Int(7)));
        assert_eq!(dynamic_to_variant(Dynamic::from(0.25_f32)), Some(Variant::Float(0.25)));
        assert_eq!(
            dynamic_to_variant(Dynamic::from(Vec2::new(1.0, 2.0))),
            Some(Variant::Vector2f(Vec2::new(1.0, 2.0)))
        );
        assert_eq!(
            dynamic_to_variant(Dynamic::from("click")),
            Some(Variant::String("click".into()))
        );
    }

    #[test]
    fn test_unsupported_values() {
        assert_eq!(dynamic_to_variant(Dynamic::UNIT), None);
        assert!(expect_variant(Dynamic::from(rhai::Array::new()), "attribute").is_err());

        let mut map = Map::new();
        map.insert("button".into(), Dynamic::from(1_i64));
        map.insert("nested".into(), Dynamic::from(Map::new()));
        let err = map_to_parameters(map).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }
}
