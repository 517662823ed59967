//! Markup side of the converter
//!
//! `document`, `reader` and `writer` form the document-handle layer over
//! quick-xml. `codec` maps handles to trees and back.

pub mod codec;
pub mod document;
pub mod reader;
pub mod writer;

pub use codec::{document_to_tree, parse_markup_to_tree, tree_to_markup, tree_to_markup_string};
pub use document::{MarkupAttribute, MarkupDocument, MarkupElement, MarkupNode};
pub use reader::parse;
pub use writer::{serialize, serialize_element, SerializeOptions};
