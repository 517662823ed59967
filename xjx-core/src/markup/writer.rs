//! Document handle to markup text

use quick_xml::escape::{escape, partial_escape};

use super::document::{MarkupDocument, MarkupElement, MarkupNode};

/// Options for markup rendering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializeOptions {
    /// Indent width; `None` renders everything on one line
    pub indent: Option<usize>,
    /// Emit the `<?xml ...?>` declaration
    pub declaration: bool,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }
}

/// Render a whole document
pub fn serialize(document: &MarkupDocument, options: &SerializeOptions) -> String {
    let mut output = String::new();
    let pretty = options.indent.is_some();

    if options.declaration {
        output.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        if pretty {
            output.push('\n');
        }
    }

    for child in &document.children {
        render_node(child, options, 0, &mut output);
        if pretty {
            output.push('\n');
        }
    }

    output
}

/// Render a single element and its subtree
pub fn serialize_element(element: &MarkupElement, options: &SerializeOptions) -> String {
    let mut output = String::new();
    render_element(element, options, 0, &mut output);
    output
}

fn render_node(node: &MarkupNode, options: &SerializeOptions, depth: usize, output: &mut String) {
    match node {
        MarkupNode::Element(element) => render_element(element, options, depth, output),
        MarkupNode::Text(text) => output.push_str(&partial_escape(text.as_str())),
        MarkupNode::CData(text) => {
            // A literal `]]>` has to be split across two sections
            output.push_str("<![CDATA[");
            output.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            output.push_str("]]>");
        }
        MarkupNode::Comment(text) => {
            output.push_str("<!--");
            output.push_str(text);
            output.push_str("-->");
        }
        MarkupNode::ProcessingInstruction { target, data } => {
            output.push_str("<?");
            output.push_str(target);
            if let Some(data) = data {
                output.push(' ');
                output.push_str(data);
            }
            output.push_str("?>");
        }
    }
}

fn render_element(element: &MarkupElement, options: &SerializeOptions, depth: usize, output: &mut String) {
    let name = element.qualified_name();

    output.push('<');
    output.push_str(&name);
    for attr in &element.attributes {
        output.push(' ');
        output.push_str(&attr.qualified_name());
        output.push_str("=\"");
        output.push_str(&escape(attr.value.as_str()));
        output.push('"');
    }

    if element.children.is_empty() {
        output.push_str("/>");
        return;
    }
    output.push('>');

    // Text content is significant, so mixed and text-only elements are
    // never re-indented
    let has_text = element
        .children
        .iter()
        .any(|child| matches!(child, MarkupNode::Text(_) | MarkupNode::CData(_)));

    match options.indent {
        Some(width) if !has_text => {
            let child_indent = " ".repeat(width * (depth + 1));
            for child in &element.children {
                output.push('\n');
                output.push_str(&child_indent);
                render_node(child, options, depth + 1, output);
            }
            output.push('\n');
            output.push_str(&" ".repeat(width * depth));
        }
        _ => {
            for child in &element.children {
                render_node(child, options, depth + 1, output);
            }
        }
    }

    output.push_str("</");
    output.push_str(&name);
    output.push('>');
}
