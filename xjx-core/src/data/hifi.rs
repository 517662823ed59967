//! High-fidelity structured-data codec
//!
//! Every node is encoded with its kind made explicit through the configured
//! property names, so decoding restores the tree exactly: names, prefixes,
//! namespaces, declarations, attribute order and the interleaving of text,
//! CDATA, comments and instructions.
//!
//! Encoded forms (default property names):
//!
//! | node        | encoding                                              |
//! |-------------|-------------------------------------------------------|
//! | Collection  | `{name: [item, ...]}`                                 |
//! | Record      | `{name: {$ns?, $pre?, $xmlns?, $attr?, $val?, $children?}}` |
//! | Field       | `{$field: name, $val: v, $pre?, $ns?}`                |
//! | Value       | `{$val: v}`                                           |
//! | Data        | `{$cdata: text}`                                      |
//! | Comment     | `{$cmnt: text}`                                       |
//! | Instruction | `{$pi: data or null, $trgt: target}`                  |
//!
//! Attributes are `[{name: {$val: v, $pre?, $ns?}}, ...]` and namespace
//! declarations `{prefix: uri}` with `""` standing for the default namespace.

use serde_json::{Map, Value};

use crate::config::{Config, PropertyNames};
use crate::error::{Result, XjxError};
use crate::node::{Attribute, Body, Field, Instruction, NamespaceDecl, Node, Primitive, Record};
use crate::traverse::{traverse, Order, TraversalContext, Visitor};

/// Encode a tree losslessly
pub fn tree_to_data_hifi(node: &Node, config: &Config) -> Value {
    traverse(node, &mut Encoder { names: &config.properties }, Order::Post)
}

struct Encoder<'c> {
    names: &'c PropertyNames,
}

impl Visitor for Encoder<'_> {
    type Output = Value;

    fn visit(&mut self, node: &Node, _ctx: &TraversalContext<'_>) -> Value {
        let names = self.names;
        let mut map = Map::new();
        match node {
            Node::Value(value) => {
                map.insert(names.value.clone(), value.to_json());
            }
            Node::Data(text) => {
                map.insert(names.cdata.clone(), Value::String(text.clone()));
            }
            Node::Comment(text) => {
                map.insert(names.comment.clone(), Value::String(text.clone()));
            }
            Node::Instruction(pi) => {
                let data = pi.data.clone().map(Value::String).unwrap_or(Value::Null);
                map.insert(names.instruction.clone(), data);
                map.insert(names.target.clone(), Value::String(pi.target.clone()));
            }
            Node::Field(field) => {
                map.insert(names.field.clone(), Value::String(field.name.clone()));
                map.insert(names.value.clone(), field.value.to_json());
                insert_qualifiers(&mut map, names, field.label.as_deref(), field.namespace.as_deref());
            }
            // Containers are encoded once their children are
            Node::Record(_) | Node::Collection(_) => return Value::Null,
        }
        Value::Object(map)
    }

    fn combine(&mut self, node: &Node, _ctx: &TraversalContext<'_>, own: Value, children: Vec<Value>) -> Value {
        match node {
            Node::Collection(c) => entry(&c.name, Value::Array(children)),
            Node::Record(record) => entry(&record.name, self.record_body(record, children)),
            _ => own,
        }
    }
}

impl Encoder<'_> {
    fn record_body(&self, record: &Record, children: Vec<Value>) -> Value {
        let names = self.names;
        let mut map = Map::new();

        insert_qualifiers(&mut map, names, record.label.as_deref(), record.namespace.as_deref());

        if !record.namespaces.is_empty() {
            let declarations: Map<String, Value> = record
                .namespaces
                .iter()
                .map(|decl| (decl.prefix.clone().unwrap_or_default(), Value::String(decl.uri.clone())))
                .collect();
            map.insert(names.namespaces.clone(), Value::Object(declarations));
        }

        if !record.attributes.is_empty() {
            let attributes = record
                .attributes
                .iter()
                .map(|attr| {
                    let mut slot = Map::new();
                    slot.insert(names.value.clone(), attr.value.to_json());
                    insert_qualifiers(&mut slot, names, attr.label.as_deref(), attr.namespace.as_deref());
                    entry(&attr.name, Value::Object(slot))
                })
                .collect();
            map.insert(names.attributes.clone(), Value::Array(attributes));
        }

        match &record.body {
            Body::Text(value) => {
                map.insert(names.value.clone(), value.to_json());
            }
            Body::Children(_) if !children.is_empty() => {
                map.insert(names.children.clone(), Value::Array(children));
            }
            Body::Children(_) => {}
        }

        Value::Object(map)
    }
}

fn insert_qualifiers(map: &mut Map<String, Value>, names: &PropertyNames, label: Option<&str>, namespace: Option<&str>) {
    if let Some(ns) = namespace {
        map.insert(names.namespace.clone(), Value::String(ns.to_string()));
    }
    if let Some(prefix) = label {
        map.insert(names.prefix.clone(), Value::String(prefix.to_string()));
    }
}

fn entry(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Decode a value produced by [`tree_to_data_hifi`]
pub fn data_to_tree_hifi(value: &Value, config: &Config) -> Result<Node> {
    Decoder { names: &config.properties }.node(value)
}

struct Decoder<'c> {
    names: &'c PropertyNames,
}

impl Decoder<'_> {
    fn node(&self, value: &Value) -> Result<Node> {
        let names = self.names;
        let Value::Object(map) = value else {
            return Err(XjxError::validation(format!("expected an encoded node object, found {}", value)));
        };

        if let Some(name) = map.get(&names.field) {
            let value = map
                .get(&names.value)
                .ok_or_else(|| XjxError::validation_at("field without a value", names.field.as_str()))?;
            return Ok(Node::Field(Field {
                name: string_at(name, &names.field)?,
                namespace: optional_string(map, &names.namespace)?,
                label: optional_string(map, &names.prefix)?,
                value: scalar_at(value, &names.value)?,
            }));
        }
        if let Some(data) = map.get(&names.instruction) {
            let target = map
                .get(&names.target)
                .ok_or_else(|| XjxError::validation_at("instruction without a target", names.target.as_str()))?;
            let data = match data {
                Value::Null => None,
                other => Some(string_at(other, &names.instruction)?),
            };
            return Ok(Node::Instruction(Instruction { target: string_at(target, &names.target)?, data }));
        }
        if let Some(value) = map.get(&names.value) {
            return Ok(Node::Value(scalar_at(value, &names.value)?));
        }
        if let Some(text) = map.get(&names.cdata) {
            return Ok(Node::Data(string_at(text, &names.cdata)?));
        }
        if let Some(text) = map.get(&names.comment) {
            return Ok(Node::Comment(string_at(text, &names.comment)?));
        }

        let mut entries = map.iter();
        let (name, body) = match (entries.next(), entries.next()) {
            (Some(only), None) => only,
            _ => {
                return Err(XjxError::validation(format!(
                    "an encoded element has exactly one key, found {}",
                    map.len()
                )));
            }
        };

        match body {
            Value::Array(items) => {
                let children = items.iter().map(|item| self.node(item)).collect::<Result<Vec<_>>>()?;
                Ok(Node::collection(name, children))
            }
            Value::Object(fields) => self.record(name, fields).map(Node::Record),
            _ => Err(XjxError::validation_at("element body must be an object or an array", name.as_str())),
        }
    }

    fn record(&self, name: &str, fields: &Map<String, Value>) -> Result<Record> {
        let names = self.names;
        let mut record = Record::new(name);
        record.namespace = optional_string(fields, &names.namespace)?;
        record.label = optional_string(fields, &names.prefix)?;

        if let Some(declarations) = fields.get(&names.namespaces) {
            let Value::Object(declarations) = declarations else {
                return Err(XjxError::validation_at("namespace declarations must be an object", names.namespaces.as_str()));
            };
            for (prefix, uri) in declarations {
                let prefix = (!prefix.is_empty()).then_some(prefix.as_str());
                record.namespaces.push(NamespaceDecl::new(prefix, &string_at(uri, &names.namespaces)?));
            }
        }

        if let Some(attributes) = fields.get(&names.attributes) {
            let Value::Array(attributes) = attributes else {
                return Err(XjxError::validation_at("attributes must be an array", names.attributes.as_str()));
            };
            for attribute in attributes {
                record.attributes.push(self.attribute(attribute)?);
            }
        }

        match (fields.get(&names.value), fields.get(&names.children)) {
            (Some(_), Some(_)) => {
                return Err(XjxError::validation_at("an element cannot hold both text and children", name));
            }
            (Some(text), None) => record.body = Body::Text(scalar_at(text, &names.value)?),
            (None, Some(Value::Array(items))) => {
                let children = items.iter().map(|item| self.node(item)).collect::<Result<Vec<_>>>()?;
                record.set_children(children);
            }
            (None, Some(_)) => {
                return Err(XjxError::validation_at("children must be an array", names.children.as_str()));
            }
            (None, None) => {}
        }

        Ok(record)
    }

    fn attribute(&self, value: &Value) -> Result<Attribute> {
        let names = self.names;
        let slot = match value {
            Value::Object(map) if map.len() == 1 => map.iter().next(),
            _ => None,
        };
        let Some((name, Value::Object(fields))) = slot else {
            return Err(XjxError::validation_at("each attribute is a single-key object", names.attributes.as_str()));
        };
        let value = fields
            .get(&names.value)
            .ok_or_else(|| XjxError::validation_at("attribute without a value", name.as_str()))?;
        Ok(Attribute {
            name: name.clone(),
            namespace: optional_string(fields, &names.namespace)?,
            label: optional_string(fields, &names.prefix)?,
            value: scalar_at(value, &names.value)?,
        })
    }
}

fn string_at(value: &Value, key: &str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| XjxError::validation_at("expected a string", key))
}

fn optional_string(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    map.get(key).map(|value| string_at(value, key)).transpose()
}

fn scalar_at(value: &Value, key: &str) -> Result<Primitive> {
    Primitive::from_json(value).ok_or_else(|| XjxError::validation_at("expected a scalar value", key))
}
