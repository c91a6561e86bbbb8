//! Backs the `@path` file-reference syntax (`FileReference`/`FileGet`/
//! `FilePut`): reads a JSON or YAML document off disk, optionally walking a
//! dotted property path into it, or writes a dotted path's worth of a value
//! back out. Delegates the actual parsing/serialization to `eval::json`;
//! this module is just the property-path plumbing plus turning an `IoError`
//! into a first-class Zen `Error` at the boundary.

use crate::{
    common::value::{Value, ValueRef},
    eval::json,
    operators::error_code,
};

fn load(path: &str) -> Result<ValueRef, ValueRef> {
    let is_yaml = path.ends_with(".yaml") || path.ends_with(".yml");
    let result = if is_yaml { json::load_yaml_file(path) } else { json::load_json_file(path) };
    result.map_err(|e| Value::new_error(e.to_string(), Some(error_code::IO_ERROR)))
}

/// Reads `path`, then walks `property_path` into the loaded document. An
/// empty `property_path` returns the whole document.
pub fn get(path: &str, property_path: &[String]) -> ValueRef {
    let document = match load(path) {
        Ok(document) => document,
        Err(err) => return err,
    };
    if property_path.is_empty() {
        return document;
    }
    let segments: Vec<&str> = property_path.iter().map(String::as_str).collect();
    document.borrow().object_get_path(&segments).unwrap_or_else(Value::new_null)
}

/// Loads `path` (or starts from an empty object if it doesn't exist yet),
/// sets `value` at `property_path`, and writes the result back as JSON.
pub fn put(path: &str, property_path: &[String], value: ValueRef) -> ValueRef {
    let document = match load(path) {
        Ok(document) => document,
        Err(_) if !std::path::Path::new(path).exists() => Value::new_object(Default::default()),
        Err(err) => return err,
    };

    if property_path.is_empty() {
        if let Err(e) = json::write_json_file(path, &value) {
            return Value::new_error(e.to_string(), Some(error_code::IO_ERROR));
        }
        return value;
    }

    let segments: Vec<&str> = property_path.iter().map(String::as_str).collect();
    if document.borrow().object_set_path(&segments, value.clone()).is_err() {
        return Value::new_error(format!("cannot set '{}': an intermediate segment is not an object", property_path.join(".")), Some(error_code::TYPE_ERROR));
    }

    if let Err(e) = json::write_json_file(path, &document) {
        return Value::new_error(e.to_string(), Some(error_code::IO_ERROR));
    }
    value
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_a_dotted_path_through_a_temp_file() {
        let dir = std::env::temp_dir().join(format!("zen-fileref-test-{}", std::process::id()));
        let path = dir.with_extension("json");
        let _ = std::fs::remove_file(&path);

        let path_str = path.to_str().unwrap();
        let written = put(path_str, &["a".to_string(), "b".to_string()], Value::new_number(9.0));
        assert_eq!(written.borrow().to_string(), "9");

        let read = get(path_str, &["a".to_string(), "b".to_string()]);
        assert_eq!(read.borrow().to_string(), "9");

        let _ = std::fs::remove_file(&path);
    }
}
