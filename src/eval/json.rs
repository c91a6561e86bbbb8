//! The JSON/YAML bridge (§4.8): converts between Zen `Value`s and
//! `serde_json`'s tree, and reads `loadJsonFile`/`loadYamlFile` targets off
//! disk under a size cap. `IoError` is the single `thiserror` type at this
//! boundary; the evaluator/builtins turn it into a first-class Zen `Error`
//! the moment it would otherwise cross into AST evaluation.

use serde::Serialize;

use crate::common::{ordered_map::OrderedMap, value::{Value, ValueRef}};

pub const MAX_FILE_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("could not access '{path}': {source}")]
    Access { path: String, #[source] source: std::io::Error },

    #[error("file '{path}' exceeds the {max} byte size cap")]
    TooLarge { path: String, max: u64 },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(String),

    #[error("NaN/Infinity cannot be represented in JSON")]
    NonFiniteNumber,

    #[error("a value of kind '{0}' cannot be represented in JSON")]
    NotJsonRepresentable(&'static str),
}

fn read_capped(path: &str) -> Result<String, IoError> {
    let metadata = std::fs::metadata(path).map_err(|source| IoError::Access { path: path.to_string(), source })?;
    if metadata.len() > MAX_FILE_BYTES {
        return Err(IoError::TooLarge { path: path.to_string(), max: MAX_FILE_BYTES });
    }
    std::fs::read_to_string(path).map_err(|source| IoError::Access { path: path.to_string(), source })
}

fn json_to_value(j: serde_json::Value) -> ValueRef {
    match j {
        serde_json::Value::Null => Value::new_null(),
        serde_json::Value::Bool(b) => Value::new_boolean(b),
        serde_json::Value::Number(n) => Value::new_number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::new_string(s),
        serde_json::Value::Array(items) => Value::new_array(items.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => {
            let mut entries = OrderedMap::new();
            for (k, v) in map {
                entries.set(&k, json_to_value(v));
            }
            Value::new_object(entries)
        }
    }
}

fn value_to_json(v: &ValueRef) -> Result<serde_json::Value, IoError> {
    use serde_json::Value as J;
    match &*v.borrow() {
        Value::Null => Ok(J::Null),
        Value::Boolean(b) => Ok(J::Bool(*b)),
        Value::Number(n) => serde_json::Number::from_f64(*n).map(J::Number).ok_or(IoError::NonFiniteNumber),
        Value::String(s) => Ok(J::String(s.clone())),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.borrow().len());
            for item in items.borrow().iter() {
                out.push(value_to_json(item)?);
            }
            Ok(J::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (k, val) in map.borrow().iter() {
                out.insert(k.clone(), value_to_json(val)?);
            }
            Ok(J::Object(out))
        }
        Value::Function(_) => Err(IoError::NotJsonRepresentable("function")),
        Value::Error(_) => Err(IoError::NotJsonRepresentable("error")),
        Value::Class(_) => Err(IoError::NotJsonRepresentable("class")),
        Value::Instance(_) => Err(IoError::NotJsonRepresentable("instance")),
    }
}

pub fn parse(s: &str) -> Result<ValueRef, IoError> {
    let json: serde_json::Value = serde_json::from_str(s)?;
    Ok(json_to_value(json))
}

pub fn stringify(v: &ValueRef) -> Result<String, IoError> {
    Ok(serde_json::to_string(&value_to_json(v)?)?)
}

pub fn pretty(v: &ValueRef, indent: usize) -> Result<String, IoError> {
    let json = value_to_json(v)?;
    let spaces = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&spaces);
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    json.serialize(&mut ser)?;
    Ok(String::from_utf8(buf).expect("serde_json always emits valid UTF-8"))
}

pub fn load_json_file(path: &str) -> Result<ValueRef, IoError> {
    parse(&read_capped(path)?)
}

/// Only a flat `key: value` mapping of scalars is supported (Open Question
/// iii). Nested mappings/sequences, multi-document files, and anchors all
/// produce an `IoError::Yaml`, not a silently-flattened value.
pub fn load_yaml_file(path: &str) -> Result<ValueRef, IoError> {
    let text = read_capped(path)?;
    let parsed: serde_yaml::Value = serde_yaml::from_str(&text).map_err(|e| IoError::Yaml(e.to_string()))?;
    let mapping = parsed
        .as_mapping()
        .ok_or_else(|| IoError::Yaml("expected a flat key: value mapping".to_string()))?;

    let mut entries = OrderedMap::new();
    for (k, v) in mapping {
        let key = k.as_str().ok_or_else(|| IoError::Yaml("mapping keys must be strings".to_string()))?;
        entries.set(key, yaml_scalar_to_value(v)?);
    }
    Ok(Value::new_object(entries))
}

fn yaml_scalar_to_value(v: &serde_yaml::Value) -> Result<ValueRef, IoError> {
    match v {
        serde_yaml::Value::Null => Ok(Value::new_null()),
        serde_yaml::Value::Bool(b) => Ok(Value::new_boolean(*b)),
        serde_yaml::Value::Number(n) => Ok(Value::new_number(n.as_f64().unwrap_or(f64::NAN))),
        serde_yaml::Value::String(s) => Ok(Value::new_string(s.clone())),
        _ => Err(IoError::Yaml("nested mappings/sequences are not supported".to_string())),
    }
}

/// Used by `FilePut`: always writes the result back as pretty JSON,
/// regardless of the target's extension (see DESIGN.md).
pub fn write_json_file(path: &str, value: &ValueRef) -> Result<(), IoError> {
    let json = value_to_json(value)?;
    let text = serde_json::to_string_pretty(&json)?;
    std::fs::write(path, text).map_err(|source| IoError::Access { path: path.to_string(), source })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_an_object_through_parse_and_stringify() {
        let parsed = parse(r#"{"a": 1, "b": [true, null]}"#).unwrap();
        assert_eq!(stringify(&parsed).unwrap(), r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn object_keys_preserve_source_order() {
        let parsed = parse(r#"{"z": 1, "a": 2}"#).unwrap();
        match &*parsed.borrow() {
            Value::Object(map) => {
                assert_eq!(map.borrow().keys().collect::<Vec<_>>(), vec!["z", "a"]);
            }
            other => panic!("expected an object, got {:?}", other),
        }
    }

    #[test]
    fn pretty_indents_by_the_requested_width() {
        let parsed = parse(r#"{"a": 1}"#).unwrap();
        assert_eq!(pretty(&parsed, 2).unwrap(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn functions_are_not_json_representable() {
        use crate::common::closure::Closure;
        use crate::common::span::{Span, Spanned};
        use crate::compiler::ast::AST;
        use crate::construct::scope::Scope;

        let body = Spanned::new(AST::compound(vec![]), Span::empty());
        let closure = Closure::new(None, vec![], body, Scope::global());
        let func = Value::new_function(closure);
        assert!(matches!(stringify(&func), Err(IoError::NotJsonRepresentable("function"))));
    }
}
