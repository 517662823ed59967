//! Standard structured-data codec
//!
//! The ergonomic, strategy-driven mapping between trees and plain JSON
//! values. It is lossy on purpose: comments and processing instructions are
//! dropped, and the configured strategies decide how attributes, text,
//! repetition, emptiness and mixed content are shaped.

use serde_json::{Map, Value};
use tracing::trace;

use crate::config::{AttributeStrategy, Config, MixedContentStrategy, TextStrategy};
use crate::context::ConversionContext;
use crate::error::{Result, XjxError};
use crate::node::{Attribute, NamespaceDecl, Node, Primitive, Record, DOCUMENT_NAME};
use crate::strategy::{
    attribute_name, empty_element_value, is_element_name, parse_qualified_name,
    resolve_attribute_name, resolve_element_name, should_be_array,
};
use crate::traverse::{traverse, Order, TraversalContext, Visitor};

/// Name given to the root of a tree built from a top-level array
pub const ARRAY_ROOT_NAME: &str = "array";
/// Name given to the root of a tree built from a top-level scalar
pub const SCALAR_ROOT_NAME: &str = "value";

/// Convert a tree to a plain JSON value.
///
/// A document or record becomes a single-key object; a non-document
/// collection becomes a bare array.
pub fn tree_to_data(node: &Node, config: &Config) -> Result<Value> {
    let piece = traverse(node, &mut Encoder { config }, Order::Post);

    match (node, piece) {
        (Node::Collection(c), Piece::Element { value, .. }) if c.name != DOCUMENT_NAME => {
            Ok(value.unwrap_or(Value::Array(Vec::new())))
        }
        (_, Piece::Element { key, value }) => {
            // The root element is never removed
            let mut map = Map::new();
            map.insert(key, value.unwrap_or_else(|| Value::Object(Map::new())));
            Ok(Value::Object(map))
        }
        (_, Piece::Text(value)) => Ok(value),
        (_, Piece::Skip) => Err(XjxError::validation("tree has no element to convert")),
    }
}

/// What a node contributes to its parent's value
enum Piece {
    /// Element-like child; `None` when the empty-element strategy removed it
    Element { key: String, value: Option<Value> },
    Text(Value),
    Skip,
}

struct Encoder<'c> {
    config: &'c Config,
}

impl Visitor for Encoder<'_> {
    type Output = Piece;

    fn visit(&mut self, node: &Node, _ctx: &TraversalContext<'_>) -> Piece {
        match node {
            Node::Value(value) => Piece::Text(value.to_json()),
            Node::Data(text) => Piece::Text(Value::String(text.clone())),
            Node::Field(field) => Piece::Element {
                key: resolve_element_name(&field.name, field.label.as_deref(), self.config),
                value: Some(field.value.to_json()),
            },
            // Containers are built in `combine`; comments and instructions
            // have no place in plain data
            _ => Piece::Skip,
        }
    }

    fn combine(
        &mut self,
        node: &Node,
        ctx: &TraversalContext<'_>,
        own: Piece,
        children: Vec<Piece>,
    ) -> Piece {
        match node {
            Node::Record(record) => Piece::Element {
                key: resolve_element_name(&record.name, record.label.as_deref(), self.config),
                value: self.record_value(record, ctx, children),
            },
            Node::Collection(c) if c.name == DOCUMENT_NAME => children
                .into_iter()
                .find(|piece| matches!(piece, Piece::Element { .. }))
                .unwrap_or(Piece::Skip),
            Node::Collection(c) => {
                let item_name = self.config.arrays.item_name_for(&c.name);
                let items = children
                    .into_iter()
                    .filter_map(|piece| match piece {
                        Piece::Element { key, value: Some(v) } if key == item_name => Some(v),
                        Piece::Element { key, value: Some(v) } => Some(single_entry(key, v)),
                        Piece::Text(v) => Some(v),
                        _ => None,
                    })
                    .collect();
                Piece::Element { key: c.name.clone(), value: Some(Value::Array(items)) }
            }
            _ => own,
        }
    }
}

impl Encoder<'_> {
    fn record_value(&self, record: &Record, ctx: &TraversalContext<'_>, children: Vec<Piece>) -> Option<Value> {
        let config = self.config;
        let names = &config.properties;

        let mut map = Map::new();

        if config.preserve.namespaces {
            if let Some(ns) = &record.namespace {
                let inherited = ctx.parent.and_then(Node::namespace);
                if inherited != Some(ns.as_str()) {
                    map.insert(names.namespace.clone(), Value::String(ns.clone()));
                }
            }
        }

        // Kept prefixes need their bindings to be read back
        if config.preserve.namespaces && config.preserve.prefixed_names {
            let declared: Map<String, Value> = record
                .namespaces
                .iter()
                .filter_map(|decl| Some((decl.prefix.clone()?, Value::String(decl.uri.clone()))))
                .collect();
            if !declared.is_empty() {
                map.insert(names.namespaces.clone(), Value::Object(declared));
            }
        }

        if config.preserve.attributes && !record.attributes.is_empty() {
            self.insert_attributes(record, &mut map);
        }
        let has_metadata = !map.is_empty();

        let has_content = record.text().is_some() || !record.children().is_empty();
        if !has_content && !has_metadata {
            return empty_element_value(config);
        }

        let mut texts: Vec<Value> = Vec::new();
        let mut ordered: Vec<Piece> = Vec::new();
        if let Some(text) = record.text() {
            texts.push(text.to_json());
        }
        for piece in children {
            match piece {
                Piece::Text(value) => {
                    texts.push(value.clone());
                    ordered.push(Piece::Text(value));
                }
                element @ Piece::Element { .. } => ordered.push(element),
                Piece::Skip => {}
            }
        }

        let text_present = texts.iter().any(|t| !is_blank(t));
        let elements_present = ordered.iter().any(|p| matches!(p, Piece::Element { .. }));

        let (use_text, use_elements) = match (text_present, elements_present) {
            (true, true) => match config.strategies.mixed_content {
                MixedContentStrategy::Preserve => {
                    let items = ordered
                        .into_iter()
                        .filter_map(|piece| match piece {
                            Piece::Text(v) => Some(v),
                            Piece::Element { key, value: Some(v) } => Some(single_entry(key, v)),
                            _ => None,
                        })
                        .collect();
                    map.insert(names.children.clone(), Value::Array(items));
                    return Some(Value::Object(map));
                }
                MixedContentStrategy::PrioritizeText => (true, false),
                MixedContentStrategy::PrioritizeElements => (false, true),
            },
            other => other,
        };

        if use_text {
            let text = join_text(texts);
            if config.strategies.text == TextStrategy::Direct && !has_metadata {
                return Some(text);
            }
            map.insert(names.value.clone(), text);
        }

        if use_elements {
            let groups = group_elements(ordered);

            if !use_text && !has_metadata {
                if let Some(item) = config.arrays.item_names.get(&record.name) {
                    if groups.len() == 1 && groups[0].0 == *item {
                        let (_, _, values) = groups.into_iter().next()?;
                        return Some(Value::Array(values));
                    }
                }
            }

            for (key, count, mut values) in groups {
                if values.is_empty() {
                    continue;
                }
                let value = if should_be_array(&record.name, count, config) {
                    Value::Array(values)
                } else {
                    // Later siblings win when repetition is not an array
                    values.pop()?
                };
                map.insert(key, value);
            }
        }

        if map.is_empty() && !use_elements {
            return empty_element_value(config);
        }
        Some(Value::Object(map))
    }

    fn insert_attributes(&self, record: &Record, map: &mut Map<String, Value>) {
        let config = self.config;
        let attributes = record.attributes.iter().map(|a| {
            (resolve_attribute_name(&a.name, a.label.as_deref(), config), a.value.to_json())
        });

        match config.strategies.attribute {
            AttributeStrategy::Property => {
                map.insert(config.properties.attributes.clone(), Value::Object(attributes.collect()));
            }
            AttributeStrategy::Prefix => {
                for (name, value) in attributes {
                    map.insert(format!("{}{}", config.properties.attribute_prefix, name), value);
                }
            }
            AttributeStrategy::Merge => {
                for (name, value) in attributes {
                    map.insert(name, value);
                }
            }
        }
    }
}

/// Element pieces grouped by key in first-seen order:
/// key, occurrence count, kept values
fn group_elements(pieces: Vec<Piece>) -> Vec<(String, usize, Vec<Value>)> {
    let mut groups: Vec<(String, usize, Vec<Value>)> = Vec::new();
    for piece in pieces {
        let Piece::Element { key, value } = piece else {
            continue;
        };
        let index = match groups.iter().position(|(k, _, _)| *k == key) {
            Some(index) => index,
            None => {
                groups.push((key, 0, Vec::new()));
                groups.len() - 1
            }
        };
        let group = &mut groups[index];
        group.1 += 1;
        if let Some(value) = value {
            group.2.push(value);
        }
    }
    groups
}

fn single_entry(key: String, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key, value);
    Value::Object(map)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim().is_empty(),
        Value::Null => true,
        _ => false,
    }
}

/// One text segment keeps its JSON type; several are concatenated
fn join_text(mut texts: Vec<Value>) -> Value {
    if texts.len() == 1 {
        return texts.remove(0);
    }
    let joined: String = texts
        .iter()
        .map(|t| match t {
            Value::String(s) => s.clone(),
            other => Primitive::from_json(other).map(|p| p.to_string()).unwrap_or_default(),
        })
        .collect();
    Value::String(joined)
}

/// Convert a plain JSON value to a tree.
///
/// An object must have exactly one key, which names the root record and
/// must be a plain element name rather than a reserved property. An
/// array becomes an `array` collection of items; a scalar becomes a `value`
/// record holding it.
pub fn data_to_tree(value: &Value, config: &Config) -> Result<Node> {
    let mut ctx = ConversionContext::new();
    let decoder = Decoder { config };

    match value {
        Value::Object(map) => {
            let mut entries = map.iter();
            match (entries.next(), entries.next()) {
                (Some((key, inner)), None) => {
                    if config.properties.is_reserved(key) || !is_element_name(key) {
                        return Err(XjxError::validation_at(
                            format!("'{}' cannot name the root element", key),
                            key.as_str(),
                        ));
                    }
                    decoder.root(key, inner, &mut ctx)
                }
                (None, _) => Err(XjxError::validation("root object has no key; expected exactly one")),
                (Some(_), Some((extra, _))) => Err(XjxError::validation_at(
                    format!("root object has {} keys; expected exactly one", map.len()),
                    extra.as_str(),
                )),
            }
        }
        Value::Array(items) => {
            let children = decoder.items(ARRAY_ROOT_NAME, items, &mut ctx)?;
            Ok(Node::collection(ARRAY_ROOT_NAME, children))
        }
        scalar => {
            let mut record = Record::new(SCALAR_ROOT_NAME);
            if !scalar.is_null() {
                record.set_text(to_primitive(scalar));
            }
            Ok(record.into())
        }
    }
}

struct Decoder<'c> {
    config: &'c Config,
}

impl Decoder<'_> {
    fn root(&self, key: &str, value: &Value, ctx: &mut ConversionContext) -> Result<Node> {
        match value {
            // A top-level array cannot repeat the root, so it is wrapped
            Value::Array(items) => {
                let item_name = self.config.arrays.item_name_for(key).to_string();
                let (prefix, local) = parse_qualified_name(key);
                let mut record = Record::new(local);
                record.label = prefix.map(str::to_string);
                record.namespace = ctx.resolve(prefix).map(str::to_string);
                record.set_children(self.items(&item_name, items, ctx)?);
                Ok(record.into())
            }
            other => self.element(key, other, 0, ctx),
        }
    }

    /// Array items under `item_name`: a single-key object names its own
    /// element, anything else is an `item_name` element
    fn items(&self, item_name: &str, items: &[Value], ctx: &mut ConversionContext) -> Result<Vec<Node>> {
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let node = match item {
                Value::Object(map) if map.len() == 1 => {
                    let (key, inner) = map.iter().next().ok_or_else(|| XjxError::processing("empty item"))?;
                    if self.is_plain_key(key, inner) {
                        self.element(key, inner, index, ctx)?
                    } else {
                        self.element(item_name, item, index, ctx)?
                    }
                }
                _ => self.element(item_name, item, index, ctx)?,
            };
            out.push(node);
        }
        Ok(out)
    }

    /// A key that names a child element rather than metadata or an attribute
    fn is_plain_key(&self, key: &str, value: &Value) -> bool {
        !self.config.properties.is_reserved(key) && attribute_name(key, value, self.config).is_none()
    }

    /// One property of an object, appended to `out`. Arrays repeat the
    /// element under the key itself, so `{"user": [..]}` reads back as
    /// sibling `user` elements. Only a key with a configured item name is
    /// wrapped, with the items named by it; the default item name is for
    /// items that have no key of their own (top-level and nested arrays).
    fn property(&self, key: &str, value: &Value, out: &mut Vec<Node>, ctx: &mut ConversionContext) -> Result<()> {
        match value {
            Value::Array(items) => match self.config.arrays.item_names.get(key) {
                Some(item_name) => {
                    let (prefix, local) = parse_qualified_name(key);
                    let mut wrapper = Record::new(local);
                    wrapper.label = prefix.map(str::to_string);
                    wrapper.namespace = ctx.resolve(prefix).map(str::to_string);
                    let index = out.len();
                    let children = ctx.descend(index, &[], |ctx| self.items(item_name, items, ctx))?;
                    wrapper.set_children(children);
                    out.push(wrapper.into());
                }
                None => {
                    for item in items {
                        let node = self.element(key, item, out.len(), ctx)?;
                        out.push(node);
                    }
                }
            },
            other => {
                let node = self.element(key, other, out.len(), ctx)?;
                out.push(node);
            }
        }
        Ok(())
    }

    fn element(&self, key: &str, value: &Value, index: usize, ctx: &mut ConversionContext) -> Result<Node> {
        let names = &self.config.properties;
        let (prefix, local) = parse_qualified_name(key);

        let mut decls: Vec<NamespaceDecl> = Vec::new();
        let mut bindings: Vec<NamespaceDecl> = Vec::new();
        if let Value::Object(map) = value {
            if let Some(declared) = map.get(&names.namespaces) {
                let Value::Object(declared) = declared else {
                    return Err(XjxError::validation_at(
                        "namespace declarations must be an object",
                        names.namespaces.as_str(),
                    ));
                };
                for (bound, uri) in declared {
                    let uri = uri.as_str().ok_or_else(|| {
                        XjxError::validation_at("namespace URI must be a string", bound.as_str())
                    })?;
                    bindings.push(NamespaceDecl::new(Some(bound), uri));
                }
            }
            decls.extend(bindings.iter().cloned());
            if let Some(uri) = map.get(&names.namespace).and_then(Value::as_str) {
                decls.push(NamespaceDecl::new(prefix, uri));
            }
        }

        ctx.descend(index, &decls, |ctx| -> Result<Node> {
            let mut record = Record::new(local);
            record.namespaces = bindings;
            record.label = prefix.map(str::to_string);
            record.namespace = ctx.resolve(prefix).map(str::to_string);

            match value {
                Value::Object(map) => self.fill(&mut record, map, ctx)?,
                Value::Array(items) => {
                    let item_name = self.config.arrays.item_name_for(key).to_string();
                    record.set_children(self.items(&item_name, items, ctx)?);
                }
                Value::Null => {}
                scalar => record.set_text(to_primitive(scalar)),
            }

            trace!(name = %record.name, depth = ctx.depth(), "built record");
            Ok(record.into())
        })
    }

    fn fill(&self, record: &mut Record, map: &Map<String, Value>, ctx: &mut ConversionContext) -> Result<()> {
        let names = &self.config.properties;
        let mut text: Option<Primitive> = None;
        let mut children: Vec<Node> = Vec::new();

        for (key, value) in map {
            if *key == names.attributes {
                let Value::Object(attributes) = value else {
                    return Err(XjxError::validation_at("attributes must be an object", key.as_str()));
                };
                for (name, attr_value) in attributes {
                    record.attributes.push(self.attribute(name, attr_value, ctx));
                }
            } else if *key == names.value {
                text = Some(to_primitive(value));
            } else if *key == names.children {
                let Value::Array(items) = value else {
                    return Err(XjxError::validation_at("ordered children must be an array", key.as_str()));
                };
                for item in items {
                    match item {
                        Value::Object(entry) if entry.len() == 1 => {
                            for (child_key, child_value) in entry {
                                self.property(child_key, child_value, &mut children, ctx)?;
                            }
                        }
                        Value::Object(_) | Value::Array(_) => {
                            return Err(XjxError::validation_at(
                                "ordered children must be text or single-key objects",
                                key.as_str(),
                            ));
                        }
                        scalar => children.push(Node::Value(to_primitive(scalar))),
                    }
                }
            } else if names.is_reserved(key) {
                // Namespace metadata was consumed by the caller
            } else if let Some(name) = attribute_name(key, value, self.config) {
                record.attributes.push(self.attribute(name, value, ctx));
            } else {
                self.property(key, value, &mut children, ctx)?;
            }
        }

        match (text, children.is_empty()) {
            (Some(text), true) => record.set_text(text),
            (Some(text), false) => {
                children.insert(0, Node::Value(text));
                record.set_children(children);
            }
            (None, _) => record.set_children(children),
        }
        Ok(())
    }

    fn attribute(&self, name: &str, value: &Value, ctx: &ConversionContext) -> Attribute {
        let (prefix, local) = parse_qualified_name(name);
        let mut attribute = Attribute::new(local, to_primitive(value));
        attribute.label = prefix.map(str::to_string);
        attribute.namespace = prefix.and_then(|p| ctx.resolve(Some(p))).map(str::to_string);
        attribute
    }
}

/// Scalars map directly; nested containers are kept as their JSON text
fn to_primitive(value: &Value) -> Primitive {
    Primitive::from_json(value).unwrap_or_else(|| Primitive::String(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ArrayStrategy, EmptyElementStrategy};
    use crate::markup::parse_markup_to_tree;
    use serde_json::json;

    fn xml_to_data(xml: &str, config: &Config) -> Value {
        let tree = parse_markup_to_tree(xml, config).unwrap();
        tree_to_data(&tree, config).unwrap()
    }

    #[test]
    fn test_attributes_and_text() {
        let value = xml_to_data(r#"<user id="1"><name>John</name></user>"#, &Config::default());
        assert_eq!(value, json!({"user": {"$attr": {"id": "1"}, "name": "John"}}));

        let prefixed = Config::default().with_attribute_strategy(AttributeStrategy::Prefix);
        let value = xml_to_data(r#"<user id="1">John</user>"#, &prefixed);
        assert_eq!(value, json!({"user": {"@id": "1", "$val": "John"}}));

        let merged = Config::default().with_attribute_strategy(AttributeStrategy::Merge);
        let value = xml_to_data(r#"<user id="1"><name>John</name></user>"#, &merged);
        assert_eq!(value, json!({"user": {"id": "1", "name": "John"}}));
    }

    #[test]
    fn test_text_property_strategy() {
        let config = Config::default().with_text_strategy(TextStrategy::Property);
        let value = xml_to_data("<a><b>x</b></a>", &config);
        assert_eq!(value, json!({"a": {"b": {"$val": "x"}}}));
    }

    #[test]
    fn test_repeated_children() {
        let xml = "<r><i>1</i><i>2</i><j>3</j></r>";
        assert_eq!(xml_to_data(xml, &Config::default()), json!({"r": {"i": ["1", "2"], "j": "3"}}));

        let always = Config::default().with_array_strategy(ArrayStrategy::Always);
        assert_eq!(xml_to_data(xml, &always), json!({"r": {"i": ["1", "2"], "j": ["3"]}}));

        let never = Config::default().with_array_strategy(ArrayStrategy::Never);
        assert_eq!(xml_to_data(xml, &never), json!({"r": {"i": "2", "j": "3"}}));
    }

    #[test]
    fn test_namespace_metadata_only_where_it_changes() {
        let value = xml_to_data(r#"<a xmlns="urn:a"><b>1</b><c xmlns="urn:c">2</c></a>"#, &Config::default());
        assert_eq!(value, json!({"a": {"$ns": "urn:a", "b": "1", "c": {"$ns": "urn:c", "$val": "2"}}}));
    }

    #[test]
    fn test_empty_root_survives_remove() {
        let config = Config::default().with_empty_element_strategy(EmptyElementStrategy::Remove);
        assert_eq!(xml_to_data("<root/>", &config), json!({"root": {}}));
    }

    #[test]
    fn test_data_root_validation() {
        let config = Config::default();
        let err = data_to_tree(&json!({"a": 1, "b": 2}), &config).unwrap_err();
        assert!(matches!(err, XjxError::Validation { key: Some(k), .. } if k == "b"));
        assert!(data_to_tree(&json!({}), &config).is_err());

        let err = data_to_tree(&json!({"$val": "x"}), &config).unwrap_err();
        assert!(matches!(err, XjxError::Validation { key: Some(k), .. } if k == "$val"));
        let err = data_to_tree(&json!({"2nd": {}}), &config).unwrap_err();
        assert!(matches!(err, XjxError::Validation { key: Some(k), .. } if k == "2nd"));
    }

    #[test]
    fn test_nested_arrays_use_the_item_name() {
        let config = Config::default();
        let tree = data_to_tree(&json!({"root": {"list": [[1, 2], 3]}}), &config).unwrap();
        let lists = tree.children();
        assert_eq!(lists.len(), 2);
        let names: Vec<&str> = lists[0].children().iter().map(Node::name).collect();
        assert_eq!(names, ["item", "item"]);
        assert_eq!(lists[1].as_record().unwrap().text(), Some(&Primitive::from(3i64)));

        let config = config.with_item_name("list", "n");
        let tree = data_to_tree(&json!({"list": [[1, 2]]}), &config).unwrap();
        let inner = &tree.children()[0];
        assert_eq!(inner.name(), "n");
        assert_eq!(inner.children()[0].name(), "item");
    }

    #[test]
    fn test_data_to_tree_shapes() {
        let config = Config::default();
        let tree = data_to_tree(&json!({"users": {"user": [{"name": "a"}, {"name": "b"}]}}), &config).unwrap();
        let users = tree.as_record().unwrap();
        assert_eq!(users.children().len(), 2);
        assert!(users.children().iter().all(|c| c.name() == "user"));

        let tree = data_to_tree(&json!([1, {"x": 2}, {"y": 3, "z": 4}]), &config).unwrap();
        let names: Vec<&str> = tree.children().iter().map(Node::name).collect();
        assert_eq!(tree.name(), "array");
        assert_eq!(names, ["item", "x", "item"]);

        let tree = data_to_tree(&json!(42), &config).unwrap();
        assert_eq!(tree.as_record().unwrap().text(), Some(&Primitive::from(42i64)));
    }

    #[test]
    fn test_item_name_override_wraps_and_unwraps() {
        let config = Config::default().with_item_name("users", "user");
        let input = json!({"root": {"users": [{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]}});
        let tree = data_to_tree(&input, &config).unwrap();
        let users = &tree.children()[0];
        assert_eq!(users.name(), "users");
        assert_eq!(users.children().len(), 2);
        assert_eq!(users.children()[0].name(), "user");

        let back = tree_to_data(&tree, &config).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_attributes_read_back_per_strategy() {
        let prefixed = Config::default().with_attribute_strategy(AttributeStrategy::Prefix);
        let tree = data_to_tree(&json!({"user": {"@id": "1", "name": "x"}}), &prefixed).unwrap();
        let user = tree.as_record().unwrap();
        assert_eq!(user.attribute("id"), Some(&Primitive::from("1")));
        assert_eq!(user.children().len(), 1);

        let merged = Config::default().with_attribute_strategy(AttributeStrategy::Merge);
        let tree = data_to_tree(&json!({"user": {"id": 1, "tags": {"t": "a"}}}), &merged).unwrap();
        let user = tree.as_record().unwrap();
        assert_eq!(user.attribute("id"), Some(&Primitive::from(1i64)));
        assert_eq!(user.children()[0].name(), "tags");
    }

    #[test]
    fn test_ordered_children_round_trip() {
        let config = Config::default();
        let input = json!({"p": {"$children": ["Hello ", {"b": "world"}, "!"]}});
        let tree = data_to_tree(&input, &config).unwrap();
        assert_eq!(tree.children().len(), 3);
        assert_eq!(tree_to_data(&tree, &config).unwrap(), input);
    }

    #[test]
    fn test_namespace_inherits_through_scope() {
        let config = Config::default();
        let tree = data_to_tree(&json!({"a": {"$ns": "urn:a", "b": "1"}}), &config).unwrap();
        assert_eq!(tree.namespace(), Some("urn:a"));
        assert_eq!(tree.children()[0].namespace(), Some("urn:a"));
    }
}
