//! Markup document handle
//!
//! A syntactic view of a markup document: qualified names are split into
//! prefix and local name, but prefixes are not resolved to URIs and `xmlns`
//! declarations stay in the attribute list as written.

use crate::strategy::parse_qualified_name;

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupAttribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub value: String,
}

impl MarkupAttribute {
    pub fn new(qualified_name: &str, value: &str) -> Self {
        let (prefix, local) = parse_qualified_name(qualified_name);
        MarkupAttribute {
            prefix: prefix.map(str::to_string),
            local_name: local.to_string(),
            value: value.to_string(),
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }

    /// The prefix this attribute declares, if it is `xmlns` or `xmlns:p`.
    /// `Some(None)` is the default namespace.
    pub fn declared_prefix(&self) -> Option<Option<&str>> {
        match self.prefix.as_deref() {
            Some("xmlns") => Some(Some(self.local_name.as_str())),
            None if self.local_name == "xmlns" => Some(None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupElement {
    pub prefix: Option<String>,
    pub local_name: String,
    pub attributes: Vec<MarkupAttribute>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    pub fn new(qualified_name: &str) -> Self {
        let (prefix, local) = parse_qualified_name(qualified_name);
        MarkupElement {
            prefix: prefix.map(str::to_string),
            local_name: local.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified(self.prefix.as_deref(), &self.local_name)
    }

    pub fn attribute(&self, qualified_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.qualified_name() == qualified_name)
            .map(|a| a.value.as_str())
    }

    pub fn with_attribute(mut self, qualified_name: &str, value: &str) -> Self {
        self.attributes.push(MarkupAttribute::new(qualified_name, value));
        self
    }

    pub fn with_child(mut self, child: MarkupNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { target: String, data: Option<String> },
}

impl MarkupNode {
    pub fn element(qualified_name: &str) -> MarkupElement {
        MarkupElement::new(qualified_name)
    }

    pub fn text(text: &str) -> Self {
        MarkupNode::Text(text.to_string())
    }

    pub fn cdata(text: &str) -> Self {
        MarkupNode::CData(text.to_string())
    }

    pub fn comment(text: &str) -> Self {
        MarkupNode::Comment(text.to_string())
    }

    pub fn processing_instruction(target: &str, data: Option<&str>) -> Self {
        MarkupNode::ProcessingInstruction { target: target.to_string(), data: data.map(str::to_string) }
    }
}

impl From<MarkupElement> for MarkupNode {
    fn from(element: MarkupElement) -> Self {
        MarkupNode::Element(element)
    }
}

/// A parsed or constructed document: exactly one root element, possibly
/// surrounded by comments and processing instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupDocument {
    /// Whether the text carried (or should carry) an `<?xml ...?>` declaration
    pub declaration: bool,
    pub children: Vec<MarkupNode>,
}

impl MarkupDocument {
    pub fn new(root: MarkupElement) -> Self {
        MarkupDocument { declaration: false, children: vec![MarkupNode::Element(root)] }
    }

    pub fn root(&self) -> Option<&MarkupElement> {
        self.children.iter().find_map(|child| match child {
            MarkupNode::Element(e) => Some(e),
            _ => None,
        })
    }
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{}:{}", p, local),
        None => local.to_string(),
    }
}
