//! Markup text to document handle, driven by the quick-xml event reader

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::document::{MarkupAttribute, MarkupDocument, MarkupElement, MarkupNode};
use crate::error::{Result, XjxError};

/// Parse markup text into a document handle.
///
/// The whole input is read before anything is returned; malformed input
/// yields a `Parse` error and no document.
pub fn parse(text: &str) -> Result<MarkupDocument> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<MarkupElement> = Vec::new();
    let mut document = MarkupDocument { declaration: false, children: Vec::new() };
    let mut has_root = false;

    loop {
        let position = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| XjxError::parse(e.to_string(), text, position))?;

        match event {
            Event::Start(e) => {
                let element = read_element(&e, text, position)?;
                if stack.is_empty() && has_root {
                    return Err(XjxError::parse("more than one root element", text, position));
                }
                stack.push(element);
            }
            Event::Empty(e) => {
                let element = read_element(&e, text, position)?;
                attach(&mut stack, &mut document, &mut has_root, MarkupNode::Element(element))
                    .map_err(|message| XjxError::parse(message, text, position))?;
            }
            Event::End(e) => {
                let element = stack.pop().ok_or_else(|| {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    XjxError::parse(format!("unexpected closing tag </{}>", name), text, position)
                })?;
                attach(&mut stack, &mut document, &mut has_root, MarkupNode::Element(element))
                    .map_err(|message| XjxError::parse(message, text, position))?;
            }
            Event::Text(e) => {
                let content = e
                    .unescape()
                    .map_err(|err| XjxError::parse(err.to_string(), text, position))?;
                match stack.last_mut() {
                    Some(parent) => push_text(parent, &content),
                    None if content.trim().is_empty() => {}
                    None => {
                        return Err(XjxError::parse("text outside the root element", text, position));
                    }
                }
            }
            Event::CData(e) => {
                let content = String::from_utf8_lossy(&e).to_string();
                match stack.last_mut() {
                    Some(parent) => parent.children.push(MarkupNode::CData(content)),
                    None => {
                        return Err(XjxError::parse("CDATA outside the root element", text, position));
                    }
                }
            }
            Event::Comment(e) => {
                let content = String::from_utf8_lossy(&e).to_string();
                attach(&mut stack, &mut document, &mut has_root, MarkupNode::Comment(content))
                    .map_err(|message| XjxError::parse(message, text, position))?;
            }
            Event::PI(e) => {
                let target = String::from_utf8_lossy(e.target()).to_string();
                let content = String::from_utf8_lossy(e.content()).trim().to_string();
                let data = (!content.is_empty()).then_some(content);
                let node = MarkupNode::ProcessingInstruction { target, data };
                attach(&mut stack, &mut document, &mut has_root, node)
                    .map_err(|message| XjxError::parse(message, text, position))?;
            }
            Event::Decl(_) => document.declaration = true,
            Event::Eof => break,
            // Doctype declarations carry nothing the tree keeps
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        let end = reader.buffer_position() as usize;
        return Err(XjxError::parse(format!("unclosed tag <{}>", open.qualified_name()), text, end));
    }
    if !has_root {
        return Err(XjxError::parse("no root element", text, 0));
    }

    Ok(document)
}

fn read_element(start: &BytesStart, text: &str, position: usize) -> Result<MarkupElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = MarkupElement::new(&name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| XjxError::parse(e.to_string(), text, position))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| XjxError::parse(e.to_string(), text, position))?;
        element.attributes.push(MarkupAttribute::new(&key, &value));
    }

    Ok(element)
}

/// Append a finished node to the open element, or to the document when no
/// element is open.
fn attach(
    stack: &mut [MarkupElement],
    document: &mut MarkupDocument,
    has_root: &mut bool,
    node: MarkupNode,
) -> std::result::Result<(), &'static str> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return Ok(());
    }
    if let MarkupNode::Element(_) = node {
        if *has_root {
            return Err("more than one root element");
        }
        *has_root = true;
    }
    document.children.push(node);
    Ok(())
}

/// Adjacent text runs are merged into one node
fn push_text(parent: &mut MarkupElement, content: &str) {
    if let Some(MarkupNode::Text(previous)) = parent.children.last_mut() {
        previous.push_str(content);
    } else {
        parent.children.push(MarkupNode::Text(content.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements_and_attributes() {
        let doc = parse(r#"<users><user id="1" name="a &amp; b"/></users>"#).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.local_name, "users");
        let MarkupNode::Element(user) = &root.children[0] else {
            panic!("expected element");
        };
        assert_eq!(user.attribute("id"), Some("1"));
        assert_eq!(user.attribute("name"), Some("a & b"));
    }

    #[test]
    fn test_parse_keeps_node_kinds_in_order() {
        let doc = parse("<?xml version=\"1.0\"?><!--head--><p>Hi <![CDATA[<raw>]]><?php echo 1; ?></p>").unwrap();
        assert!(doc.declaration);
        assert_eq!(doc.children[0], MarkupNode::comment("head"));
        let root = doc.root().unwrap();
        assert_eq!(root.children[0], MarkupNode::text("Hi "));
        assert_eq!(root.children[1], MarkupNode::cdata("<raw>"));
        assert_eq!(root.children[2], MarkupNode::processing_instruction("php", Some("echo 1;")));
    }

    #[test]
    fn test_prefixes_stay_syntactic() {
        let doc = parse(r#"<s:Envelope xmlns:s="urn:soap"><s:Body/></s:Envelope>"#).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.prefix.as_deref(), Some("s"));
        assert_eq!(root.attributes[0].declared_prefix(), Some(Some("s")));
    }

    #[test]
    fn test_malformed_input_is_a_parse_error() {
        for input in ["<a><b></a>", "<a>", "", "<a/><b/>", "text<a/>", "<a x=\"1\" x=\"2\"/>"] {
            let err = parse(input).unwrap_err();
            assert!(matches!(err, XjxError::Parse { .. }), "input {input:?} gave {err:?}");
        }
    }
}
