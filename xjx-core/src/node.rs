//! Neutral intermediate tree shared by the markup and structured-data codecs
//!
//! Each node kind is its own variant, so the value/children split is enforced
//! by the types:
//! - `Collection` and `Record` own children
//! - `Value`, `Field`, `Comment`, `Instruction`, `Data` carry a payload
//! - attributes live on their `Record`, separate from content
//!
//! A `Record` body is either a list of children or a single text value, never
//! both. Nodes hold no parent pointer: ancestry is the path of child indices
//! from the root, supplied by the traversal engine, and a detached subtree is
//! just an owned value.

use serde_json::{Number, Value as JsonValue};
use std::fmt;

/// Sequence of child indices leading from a root to a node
pub type NodePath = Vec<usize>;

/// Scalar payload of a node
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Primitive {
    /// Convert a JSON scalar; objects and arrays yield `None`
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(Primitive::Null),
            JsonValue::Bool(b) => Some(Primitive::Bool(*b)),
            JsonValue::Number(n) => Some(Primitive::Number(n.clone())),
            JsonValue::String(s) => Some(Primitive::String(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Primitive::Null => JsonValue::Null,
            Primitive::Bool(b) => JsonValue::Bool(*b),
            Primitive::Number(n) => JsonValue::Number(n.clone()),
            Primitive::String(s) => JsonValue::String(s.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Primitive::String(s) => Some(s),
            _ => None,
        }
    }

    /// True for null and the empty string
    pub fn is_empty(&self) -> bool {
        match self {
            Primitive::Null => true,
            Primitive::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Text form used when a primitive is written into markup
impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Null => Ok(()),
            Primitive::Bool(b) => write!(f, "{}", b),
            Primitive::Number(n) => write!(f, "{}", n),
            Primitive::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Primitive::String(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Primitive::String(s)
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Primitive::Bool(b)
    }
}

impl From<i64> for Primitive {
    fn from(n: i64) -> Self {
        Primitive::Number(n.into())
    }
}

impl From<f64> for Primitive {
    /// Non-finite floats have no JSON form and become `Null`
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Primitive::Number).unwrap_or(Primitive::Null)
    }
}

/// Discriminant of a node, including the attribute kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Collection,
    Record,
    Field,
    Value,
    Attributes,
    Comment,
    Instruction,
    Data,
}

/// Namespace declaration recorded on the record that declared it
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// `None` for the default namespace (`xmlns="..."`)
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn new(prefix: Option<&str>, uri: &str) -> Self {
        NamespaceDecl { prefix: prefix.map(str::to_string), uri: uri.to_string() }
    }
}

/// Metadata slot of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    /// Namespace prefix
    pub label: Option<String>,
    pub value: Primitive,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<Primitive>) -> Self {
        Attribute { name: name.to_string(), namespace: None, label: None, value: value.into() }
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::Attributes
    }
}

/// Ordered container (document, array)
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub children: Vec<Node>,
}

/// Content of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Children(Vec<Node>),
    /// A single text child collapsed into the record itself
    Text(Primitive),
}

/// Structured item (element, object)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub namespace: Option<String>,
    /// Namespace prefix
    pub label: Option<String>,
    /// Declarations made on this record, in source order
    pub namespaces: Vec<NamespaceDecl>,
    pub attributes: Vec<Attribute>,
    pub body: Body,
}

impl Record {
    pub fn new(name: &str) -> Self {
        Record {
            name: name.to_string(),
            namespace: None,
            label: None,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            body: Body::Children(Vec::new()),
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.body {
            Body::Children(children) => children,
            Body::Text(_) => &[],
        }
    }

    /// The collapsed text value, if the body is text
    pub fn text(&self) -> Option<&Primitive> {
        match &self.body {
            Body::Text(value) => Some(value),
            Body::Children(_) => None,
        }
    }

    /// Append a child. A collapsed text body is first expanded into a
    /// leading `Value` child so both survive.
    pub fn push_child(&mut self, child: Node) {
        match &mut self.body {
            Body::Children(children) => children.push(child),
            Body::Text(value) => {
                let text = std::mem::replace(value, Primitive::Null);
                self.body = Body::Children(vec![Node::Value(text), child]);
            }
        }
    }

    pub fn set_children(&mut self, children: Vec<Node>) {
        self.body = Body::Children(children);
    }

    /// Replace the body with a single text value, dropping any children
    pub fn set_text(&mut self, value: impl Into<Primitive>) {
        self.body = Body::Text(value.into());
    }

    /// Remove and return the children, leaving an empty body.
    /// A text body is returned as a single `Value` child.
    pub fn take_children(&mut self) -> Vec<Node> {
        match std::mem::replace(&mut self.body, Body::Children(Vec::new())) {
            Body::Children(children) => children,
            Body::Text(value) => vec![Node::Value(value)],
        }
    }

    /// No attributes, no text and no children
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
            && match &self.body {
                Body::Children(children) => children.is_empty(),
                Body::Text(_) => false,
            }
    }

    pub fn attribute(&self, name: &str) -> Option<&Primitive> {
        self.attributes.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<Primitive>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn with_namespace(mut self, uri: &str) -> Self {
        self.namespace = Some(uri.to_string());
        self
    }

    pub fn with_label(mut self, prefix: &str) -> Self {
        self.label = Some(prefix.to_string());
        self
    }

    pub fn with_text(mut self, value: impl Into<Primitive>) -> Self {
        self.set_text(value);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.push_child(child.into());
        self
    }
}

/// Named scalar slot
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub namespace: Option<String>,
    pub label: Option<String>,
    pub value: Primitive,
}

/// Processing instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub target: String,
    pub data: Option<String>,
}

/// A node of the intermediate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Collection(Collection),
    Record(Record),
    Field(Field),
    /// Standalone primitive (text content)
    Value(Primitive),
    Comment(String),
    Instruction(Instruction),
    /// Raw embedded payload (CDATA)
    Data(String),
}

impl From<Record> for Node {
    fn from(record: Record) -> Self {
        Node::Record(record)
    }
}

impl From<Collection> for Node {
    fn from(collection: Collection) -> Self {
        Node::Collection(collection)
    }
}

/// Names reported for kinds that have no name of their own
pub const TEXT_NAME: &str = "#text";
pub const COMMENT_NAME: &str = "#comment";
pub const DATA_NAME: &str = "#cdata";
pub const DOCUMENT_NAME: &str = "#document";

impl Node {
    pub fn record(name: &str) -> Record {
        Record::new(name)
    }

    pub fn collection(name: &str, children: Vec<Node>) -> Node {
        Node::Collection(Collection { name: name.to_string(), children })
    }

    pub fn document(children: Vec<Node>) -> Node {
        Node::collection(DOCUMENT_NAME, children)
    }

    pub fn text(value: impl Into<Primitive>) -> Node {
        Node::Value(value.into())
    }

    pub fn field(name: &str, value: impl Into<Primitive>) -> Node {
        Node::Field(Field { name: name.to_string(), namespace: None, label: None, value: value.into() })
    }

    pub fn comment(text: &str) -> Node {
        Node::Comment(text.to_string())
    }

    pub fn instruction(target: &str, data: Option<&str>) -> Node {
        Node::Instruction(Instruction { target: target.to_string(), data: data.map(str::to_string) })
    }

    pub fn data(text: &str) -> Node {
        Node::Data(text.to_string())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Collection(_) => NodeKind::Collection,
            Node::Record(_) => NodeKind::Record,
            Node::Field(_) => NodeKind::Field,
            Node::Value(_) => NodeKind::Value,
            Node::Comment(_) => NodeKind::Comment,
            Node::Instruction(_) => NodeKind::Instruction,
            Node::Data(_) => NodeKind::Data,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Collection(c) => &c.name,
            Node::Record(r) => &r.name,
            Node::Field(f) => &f.name,
            Node::Value(_) => TEXT_NAME,
            Node::Comment(_) => COMMENT_NAME,
            Node::Instruction(pi) => &pi.target,
            Node::Data(_) => DATA_NAME,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Node::Record(r) => r.namespace.as_deref(),
            Node::Field(f) => f.namespace.as_deref(),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Node::Record(r) => r.label.as_deref(),
            Node::Field(f) => f.label.as_deref(),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Collection(c) => &c.children,
            Node::Record(r) => r.children(),
            _ => &[],
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Node::Record(r) => &r.attributes,
            _ => &[],
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut Record> {
        match self {
            Node::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Append a child, transferring ownership. Returns `false` (and drops
    /// nothing but the argument) when this kind cannot hold children.
    pub fn add_child(&mut self, child: Node) -> bool {
        match self {
            Node::Collection(c) => {
                c.children.push(child);
                true
            }
            Node::Record(r) => {
                r.push_child(child);
                true
            }
            _ => false,
        }
    }

    /// Replace the children of a container. Returns `false` for leaves.
    pub fn set_children(&mut self, children: Vec<Node>) -> bool {
        match self {
            Node::Collection(c) => {
                c.children = children;
                true
            }
            Node::Record(r) => {
                r.set_children(children);
                true
            }
            _ => false,
        }
    }

    /// Copy of the scalar fields only: children and attributes are dropped.
    pub fn shallow_clone(&self) -> Node {
        match self {
            Node::Collection(c) => Node::collection(&c.name, Vec::new()),
            Node::Record(r) => Node::Record(Record {
                name: r.name.clone(),
                namespace: r.namespace.clone(),
                label: r.label.clone(),
                namespaces: r.namespaces.clone(),
                attributes: Vec::new(),
                body: match &r.body {
                    Body::Text(value) => Body::Text(value.clone()),
                    Body::Children(_) => Body::Children(Vec::new()),
                },
            }),
            leaf => leaf.clone(),
        }
    }

    /// Resolve a path of child indices from this node
    pub fn at(&self, path: &[usize]) -> Option<&Node> {
        path.iter().try_fold(self, |node, &index| node.children().get(index))
    }

    pub fn at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &index in path {
            node = match node {
                Node::Collection(c) => c.children.get_mut(index)?,
                Node::Record(r) => match &mut r.body {
                    Body::Children(children) => children.get_mut(index)?,
                    Body::Text(_) => return None,
                },
                _ => return None,
            };
        }
        Some(node)
    }

    /// First record among this collection's children (the document element)
    pub fn root_record(&self) -> Option<&Record> {
        match self {
            Node::Record(r) => Some(r),
            Node::Collection(c) => c.children.iter().find_map(Node::as_record),
            _ => None,
        }
    }
}

/// When a subtree crosses an ownership boundary it is cloned under one of
/// these policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClonePolicy {
    /// Adopting caller-supplied input into a new tree: deep clone
    Branch,
    /// Before in-place mutation by a transform: deep clone
    Transform,
    /// Exposing an internal node to a caller: shallow clone; ancestry is
    /// reported separately as a path
    Output,
}

impl ClonePolicy {
    pub fn apply(self, node: &Node) -> Node {
        match self {
            ClonePolicy::Branch | ClonePolicy::Transform => node.clone(),
            ClonePolicy::Output => node.shallow_clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Node {
        Node::document(vec![
            Node::comment("head"),
            Node::record("root")
                .with_attribute("id", "1")
                .with_child(Node::record("a").with_text("x"))
                .with_child(Node::record("b").with_child(Node::text("y")))
                .into(),
        ])
    }

    #[test]
    fn test_kinds_and_names() {
        assert_eq!(Node::text("x").kind(), NodeKind::Value);
        assert_eq!(Node::text("x").name(), TEXT_NAME);
        assert_eq!(Node::instruction("php", None).name(), "php");
        assert_eq!(Attribute::new("id", "1").kind(), NodeKind::Attributes);
        assert_eq!(sample().kind(), NodeKind::Collection);
    }

    #[test]
    fn test_push_child_expands_text_body() {
        let mut record = Node::record("p").with_text("Hello ");
        record.push_child(Node::record("b").with_text("world").into());
        assert_eq!(record.text(), None);
        assert_eq!(record.children().len(), 2);
        assert_eq!(record.children()[0], Node::text("Hello "));
    }

    #[test]
    fn test_add_child_rejected_on_leaf() {
        let mut leaf = Node::text("x");
        assert!(!leaf.add_child(Node::text("y")));
        let mut record: Node = Node::record("r").into();
        assert!(record.add_child(Node::text("y")));
        assert_eq!(record.children().len(), 1);
    }

    #[test]
    fn test_shallow_clone_drops_children_and_attributes() {
        let tree = sample();
        let root = tree.at(&[1]).unwrap();
        let copy = root.shallow_clone();
        assert_eq!(copy.name(), "root");
        assert!(copy.children().is_empty());
        assert!(copy.attributes().is_empty());

        let leaf = tree.at(&[1, 0]).unwrap().shallow_clone();
        assert_eq!(leaf.as_record().unwrap().text(), Some(&Primitive::from("x")));
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let tree = sample();
        let mut copy = ClonePolicy::Transform.apply(&tree);
        copy.at_mut(&[1, 0]).unwrap().as_record_mut().unwrap().set_text("changed");
        assert_ne!(copy, tree);
        assert_eq!(
            tree.at(&[1, 0]).unwrap().as_record().unwrap().text(),
            Some(&Primitive::from("x"))
        );
    }

    #[test]
    fn test_at_resolves_paths() {
        let tree = sample();
        assert_eq!(tree.at(&[]).unwrap(), &tree);
        assert_eq!(tree.at(&[1, 1, 0]).unwrap(), &Node::text("y"));
        assert!(tree.at(&[1, 5]).is_none());
        assert!(tree.at(&[1, 0, 0]).is_none());
    }

    #[test]
    fn test_record_is_empty() {
        assert!(Node::record("flag").is_empty());
        assert!(!Node::record("flag").with_attribute("on", true).is_empty());
        assert!(!Node::record("flag").with_text("").is_empty());
    }

    #[test]
    fn test_primitive_display_and_json() {
        assert_eq!(Primitive::Null.to_string(), "");
        assert_eq!(Primitive::from(3i64).to_string(), "3");
        assert_eq!(Primitive::from(true).to_json(), JsonValue::Bool(true));
        assert_eq!(Primitive::from(f64::NAN), Primitive::Null);
        assert_eq!(Primitive::from_json(&serde_json::json!([1])), None);
    }

    #[test]
    fn test_root_record() {
        assert_eq!(sample().root_record().unwrap().name, "root");
        assert!(Node::text("x").root_record().is_none());
    }
}
