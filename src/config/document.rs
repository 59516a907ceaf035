//! Untyped YAML document kept next to the typed [`Configuration`]
//!
//! Saving goes through the document rather than serializing the typed record
//! directly, so keys that the application does not model are written back
//! untouched.

use serde_yaml::{Mapping, Value};

use super::fields::{self, FieldDescriptor};
use super::schema::Configuration;

/// Set `section.key` in `doc`, creating the section mapping when needed
pub fn set_key(doc: &mut Value, section: &str, key: &str, value: Value) {
    if !doc.is_mapping() {
        *doc = Value::Mapping(Mapping::new());
    }
    let Value::Mapping(root) = doc else {
        return;
    };

    if !matches!(root.get(section), Some(Value::Mapping(_))) {
        root.insert(Value::String(section.to_string()), Value::Mapping(Mapping::new()));
    }
    if let Some(Value::Mapping(entries)) = root.get_mut(section) {
        entries.insert(Value::String(key.to_string()), value);
    }
}

/// Read `section.key` from `doc`
pub fn get_key<'a>(doc: &'a Value, section: &str, key: &str) -> Option<&'a Value> {
    doc.get(section).and_then(|s| s.get(key))
}

/// Copy every writable field of `config` into `doc`
///
/// Sections absent from `config` (an unset `mysql`) are left as they are in
/// the document.
pub fn merge_owned(doc: &mut Value, config: &Configuration) {
    for field in fields::writable_fields() {
        write_field(doc, config, field);
    }
}

fn write_field(doc: &mut Value, config: &Configuration, field: &FieldDescriptor) {
    if let Some(value) = field.get(config) {
        set_key(doc, field.section.key(), field.key, value.to_yaml());
    }
}
