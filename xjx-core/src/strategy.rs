//! Strategy resolver
//!
//! Pure decision functions shared by the codecs. Each is total over its
//! input: they answer questions, they never fail.

use serde_json::{Map, Value};

use crate::config::{ArrayStrategy, AttributeStrategy, Config, EmptyElementStrategy};

/// Null, the empty string, and containers holding only empty values
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_empty),
        Value::Object(map) => map.values().all(is_empty),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Whether `count` same-named children of `parent` are emitted as an array
pub fn should_be_array(parent: &str, count: usize, config: &Config) -> bool {
    if config.arrays.is_forced(parent) {
        return true;
    }
    match config.strategies.array {
        ArrayStrategy::Always => true,
        ArrayStrategy::Never => false,
        ArrayStrategy::Multiple => count > 1,
    }
}

/// Split `prefix:local`; a key without a colon has no prefix
pub fn parse_qualified_name(key: &str) -> (Option<&str>, &str) {
    match key.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => (Some(prefix), local),
        _ => (None, key),
    }
}

/// Whether `name` can be written as an element name: an XML name with at
/// most one prefix separator
pub fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | ':' | '\u{B7}'))
        && name.matches(':').count() <= 1
        && !name.ends_with(':')
}

/// Key for an element in structured data
pub fn resolve_element_name(local: &str, prefix: Option<&str>, config: &Config) -> String {
    qualify(local, prefix, config.preserve.prefixed_names)
}

/// Key for an attribute in structured data
pub fn resolve_attribute_name(local: &str, prefix: Option<&str>, config: &Config) -> String {
    qualify(local, prefix, config.preserve.prefixed_names)
}

fn qualify(local: &str, prefix: Option<&str>, keep_prefix: bool) -> String {
    match prefix {
        Some(p) if keep_prefix => format!("{}:{}", p, local),
        _ => local.to_string(),
    }
}

/// If `key` (holding `value`) names an attribute under the same-level
/// attribute strategies, return the attribute name.
///
/// `merge` treats any scalar as an attribute. That is lossy for scalar
/// child elements and kept deliberately.
pub fn attribute_name<'a>(key: &'a str, value: &Value, config: &Config) -> Option<&'a str> {
    match config.strategies.attribute {
        AttributeStrategy::Property => None,
        AttributeStrategy::Prefix => {
            let prefix = config.properties.attribute_prefix.as_str();
            if prefix.is_empty() {
                return None;
            }
            key.strip_prefix(prefix).filter(|name| !name.is_empty())
        }
        AttributeStrategy::Merge => {
            let scalar = !matches!(value, Value::Object(_) | Value::Array(_));
            (scalar && !config.properties.is_reserved(key)).then_some(key)
        }
    }
}

/// Representation of an element with no attributes and no content.
/// `None` means the element is left out.
pub fn empty_element_value(config: &Config) -> Option<Value> {
    match config.strategies.empty_element {
        EmptyElementStrategy::Object => Some(Value::Object(Map::new())),
        EmptyElementStrategy::Null => Some(Value::Null),
        EmptyElementStrategy::String => Some(Value::String(String::new())),
        EmptyElementStrategy::Remove => None,
    }
}

/// Recursively drop empty values. An object carrying non-empty metadata
/// (attributes or namespace keys) is kept as is, because it stands for a
/// real element even when its content is empty.
pub fn compact(value: &Value, config: &Config) -> Option<Value> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                if is_metadata_key(key, config) {
                    if !is_absent(child) {
                        out.insert(key.clone(), child.clone());
                    }
                } else if let Some(c) = compact(child, config) {
                    out.insert(key.clone(), c);
                }
            }
            (!out.is_empty()).then_some(Value::Object(out))
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items.iter().filter_map(|item| compact(item, config)).collect();
            (!kept.is_empty()).then_some(Value::Array(kept))
        }
        scalar => (!is_empty(scalar)).then(|| scalar.clone()),
    }
}

/// Metadata counts as present even when it only holds empty strings,
/// e.g. `{"flag": ""}` as an attribute set.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn is_metadata_key(key: &str, config: &Config) -> bool {
    let names = &config.properties;
    key == names.attributes || key == names.namespace || key == names.namespaces || key == names.prefix
}
