//! Markup codec: document handle to tree and back

use tracing::trace;

use super::document::{MarkupAttribute, MarkupDocument, MarkupElement, MarkupNode};
use super::reader;
use super::writer::{self, SerializeOptions};
use crate::config::Config;
use crate::context::ConversionContext;
use crate::error::{Result, XjxError};
use crate::node::{Attribute, Body, NamespaceDecl, Node, Primitive, Record, DOCUMENT_NAME};
use crate::traverse::{traverse, Order, Phase, TraversalContext, Visitor};

/// Parse markup text and convert it to a tree rooted at a `#document`
/// collection.
pub fn parse_markup_to_tree(text: &str, config: &Config) -> Result<Node> {
    let document = reader::parse(text)?;
    Ok(document_to_tree(&document, config))
}

/// Convert a parsed document handle to a tree
pub fn document_to_tree(document: &MarkupDocument, config: &Config) -> Node {
    let mut ctx = ConversionContext::new();
    let children = convert_children(&document.children, config, &mut ctx);
    Node::document(children)
}

fn convert_children(nodes: &[MarkupNode], config: &Config, ctx: &mut ConversionContext) -> Vec<Node> {
    let preserve = &config.preserve;
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        match node {
            MarkupNode::Element(element) => {
                let index = out.len();
                out.push(convert_element(element, index, config, ctx));
            }
            MarkupNode::Text(text) if preserve.text => {
                if preserve.whitespace || !text.trim().is_empty() {
                    out.push(Node::text(text.as_str()));
                }
            }
            MarkupNode::CData(text) if preserve.cdata => out.push(Node::data(text)),
            MarkupNode::Comment(text) if preserve.comments => out.push(Node::comment(text)),
            MarkupNode::ProcessingInstruction { target, data } if preserve.instructions => {
                out.push(Node::instruction(target, data.as_deref()));
            }
            _ => {}
        }
    }

    out
}

fn convert_element(
    element: &MarkupElement,
    index: usize,
    config: &Config,
    ctx: &mut ConversionContext,
) -> Node {
    let declarations: Vec<NamespaceDecl> = element
        .attributes
        .iter()
        .filter_map(|attr| attr.declared_prefix().map(|prefix| NamespaceDecl::new(prefix, &attr.value)))
        .collect();

    ctx.descend(index, &declarations, |ctx| {
        let keep_namespaces = config.preserve.namespaces;
        let mut record = Record::new(&element.local_name);

        if keep_namespaces {
            record.label = element.prefix.clone();
            record.namespace = ctx.resolve(element.prefix.as_deref()).map(str::to_string);
            record.namespaces = declarations.clone();
        }

        if config.preserve.attributes {
            for attr in element.attributes.iter().filter(|a| a.declared_prefix().is_none()) {
                let mut attribute = Attribute::new(&attr.local_name, attr.value.as_str());
                if keep_namespaces {
                    // Unprefixed attributes are in no namespace
                    attribute.namespace = attr
                        .prefix
                        .as_deref()
                        .and_then(|p| ctx.resolve(Some(p)))
                        .map(str::to_string);
                    attribute.label = attr.prefix.clone();
                }
                record.attributes.push(attribute);
            }
        }

        let children = convert_children(&element.children, config, ctx);
        record.body = collapse(children, config);
        trace!(name = %record.name, depth = ctx.depth(), "converted element");
        Node::Record(record)
    })
}

/// A lone text child becomes the record's own value
fn collapse(children: Vec<Node>, config: &Config) -> Body {
    if let [Node::Value(Primitive::String(text))] = children.as_slice() {
        let text = if config.preserve.whitespace { text.clone() } else { text.trim().to_string() };
        return Body::Text(Primitive::String(text));
    }
    Body::Children(children)
}

/// Convert a tree to a document handle.
///
/// Accepts a `#document` collection, any other collection (rendered as an
/// element of that name) or a record. Namespace declarations missing from
/// the tree are added where a prefix or default namespace is first used.
pub fn tree_to_markup(node: &Node, config: &Config) -> Result<MarkupDocument> {
    let mut builder = MarkupBuilder {
        config,
        ctx: ConversionContext::new(),
        stack: Vec::new(),
        top: Vec::new(),
        error: None,
    };
    traverse(node, &mut builder, Order::Both);

    if let Some(err) = builder.error {
        return Err(err);
    }

    let roots = builder.top.iter().filter(|n| matches!(n, MarkupNode::Element(_))).count();
    if roots != 1 {
        return Err(XjxError::validation(format!(
            "markup needs exactly one root element, the tree has {}",
            roots
        )));
    }

    let is_document = matches!(node, Node::Collection(c) if c.name == DOCUMENT_NAME);
    Ok(MarkupDocument {
        declaration: config.format.declaration.unwrap_or(is_document),
        children: builder.top,
    })
}

/// Convert a tree straight to markup text
pub fn tree_to_markup_string(node: &Node, config: &Config) -> Result<String> {
    let document = tree_to_markup(node, config)?;
    let options = SerializeOptions::new()
        .with_indent(config.format.indent)
        .with_declaration(document.declaration);
    Ok(writer::serialize(&document, &options))
}

struct MarkupBuilder<'c> {
    config: &'c Config,
    ctx: ConversionContext,
    /// Elements opened on the way down, closed on the way up
    stack: Vec<MarkupElement>,
    /// Nodes outside any element
    top: Vec<MarkupNode>,
    error: Option<XjxError>,
}

impl MarkupBuilder<'_> {
    fn emit(&mut self, node: MarkupNode) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.top.push(node),
        }
    }

    fn open_record(&mut self, record: &Record, index: usize) -> Result<()> {
        let config = self.config;
        let keep_namespaces = config.preserve.namespaces;

        let mut declarations = if keep_namespaces { record.namespaces.clone() } else { Vec::new() };
        if keep_namespaces {
            let qualified = std::iter::once((record.label.as_deref(), record.namespace.as_deref())).chain(
                record
                    .attributes
                    .iter()
                    .filter(|a| a.label.is_some())
                    .map(|a| (a.label.as_deref(), a.namespace.as_deref())),
            );
            for (prefix, namespace) in qualified {
                let scope = declarations.clone();
                let needed = self.ctx.with_scope(&scope, |ctx| missing_declaration(ctx, prefix, namespace))?;
                declarations.extend(needed);
            }
        }

        let label = if keep_namespaces { record.label.as_deref() } else { None };
        let mut element = MarkupElement {
            prefix: label.map(str::to_string),
            local_name: record.name.clone(),
            attributes: Vec::new(),
            children: Vec::new(),
        };

        for decl in &declarations {
            let name = match &decl.prefix {
                Some(prefix) => format!("xmlns:{}", prefix),
                None => "xmlns".to_string(),
            };
            element.attributes.push(MarkupAttribute::new(&name, &decl.uri));
        }

        if config.preserve.attributes {
            for attribute in &record.attributes {
                element.attributes.push(MarkupAttribute {
                    prefix: if keep_namespaces { attribute.label.clone() } else { None },
                    local_name: attribute.name.clone(),
                    value: attribute.value.to_string(),
                });
            }
        }

        if let Body::Text(value) = &record.body {
            let text = value.to_string();
            if config.preserve.text && !text.is_empty() {
                element.children.push(MarkupNode::Text(text));
            }
        }

        self.ctx.enter(index, &declarations);
        self.stack.push(element);
        Ok(())
    }

    fn close(&mut self) {
        self.ctx.leave();
        if let Some(element) = self.stack.pop() {
            self.emit(MarkupNode::Element(element));
        }
    }
}

/// The declaration needed for `prefix` to resolve to `namespace`, if the
/// current scope does not already provide it. A prefix with neither a URI
/// nor a binding in scope cannot be written.
fn missing_declaration(
    ctx: &ConversionContext,
    prefix: Option<&str>,
    namespace: Option<&str>,
) -> Result<Option<NamespaceDecl>> {
    Ok(match (prefix, namespace) {
        (Some("xml"), _) => None,
        (prefix, Some(uri)) if !ctx.is_bound(prefix, uri) => Some(NamespaceDecl::new(prefix, uri)),
        (Some(p), None) if ctx.resolve(Some(p)).is_none() => {
            return Err(XjxError::validation_at(format!("prefix '{}' is not bound to a namespace", p), p));
        }
        // An unqualified name under an inherited default namespace
        (None, None) if ctx.resolve(None).is_some() => Some(NamespaceDecl::new(None, "")),
        _ => None,
    })
}

impl Visitor for MarkupBuilder<'_> {
    type Output = ();

    fn visit(&mut self, node: &Node, ctx: &TraversalContext<'_>) {
        if self.error.is_some() {
            return;
        }
        let index = ctx.path.last().copied().unwrap_or(0);
        let config = self.config;
        let preserve = &config.preserve;

        match (node, ctx.phase) {
            (Node::Collection(c), Phase::Enter) => {
                // The document collection is transparent
                if !(ctx.is_root() && c.name == DOCUMENT_NAME) {
                    self.ctx.enter(index, &[]);
                    self.stack.push(MarkupElement::new(&c.name));
                }
            }
            (Node::Collection(c), Phase::Exit) => {
                if !(ctx.is_root() && c.name == DOCUMENT_NAME) {
                    self.close();
                }
            }
            (Node::Record(record), Phase::Enter) => {
                if let Err(err) = self.open_record(record, index) {
                    self.error = Some(err);
                }
            }
            (Node::Record(_), Phase::Exit) => self.close(),
            (_, Phase::Exit) => {}
            (Node::Field(field), Phase::Enter) => {
                let mut element = MarkupElement::new(&field.name);
                if preserve.namespaces {
                    element.prefix = field.label.clone();
                    match missing_declaration(&self.ctx, field.label.as_deref(), field.namespace.as_deref()) {
                        Ok(Some(decl)) => {
                            let name = decl.prefix.map_or("xmlns".to_string(), |p| format!("xmlns:{}", p));
                            element.attributes.push(MarkupAttribute::new(&name, &decl.uri));
                        }
                        Ok(None) => {}
                        Err(err) => {
                            self.error = Some(err);
                            return;
                        }
                    }
                }
                let text = field.value.to_string();
                if preserve.text && !text.is_empty() {
                    element.children.push(MarkupNode::Text(text));
                }
                self.emit(MarkupNode::Element(element));
            }
            (Node::Value(value), Phase::Enter) => {
                if !preserve.text {
                    return;
                }
                if self.stack.is_empty() {
                    self.error = Some(XjxError::validation("text cannot sit outside the root element"));
                    return;
                }
                self.emit(MarkupNode::Text(value.to_string()));
            }
            (Node::Data(text), Phase::Enter) => {
                if !preserve.cdata {
                    return;
                }
                if self.stack.is_empty() {
                    self.error = Some(XjxError::validation("CDATA cannot sit outside the root element"));
                    return;
                }
                self.emit(MarkupNode::CData(text.clone()));
            }
            (Node::Comment(text), Phase::Enter) => {
                if preserve.comments {
                    self.emit(MarkupNode::Comment(text.clone()));
                }
            }
            (Node::Instruction(pi), Phase::Enter) => {
                if preserve.instructions {
                    self.emit(MarkupNode::ProcessingInstruction {
                        target: pi.target.clone(),
                        data: pi.data.clone(),
                    });
                }
            }
        }
    }
}
