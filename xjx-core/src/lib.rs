//! xjx-core: markup/structured-data conversion through a neutral tree
//!
//! This library provides:
//! - A neutral node tree shared by every codec
//! - Markup parsing and serialization with namespace scoping
//! - Standard (strategy-driven) and high-fidelity (lossless) JSON codecs
//! - A single traversal engine with collect, filter, reduce and transform
//! - A pipeline executor with validation, recovery and failure-tolerant hooks

pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod markup;
pub mod node;
pub mod pipeline;
pub mod stages;
pub mod strategy;
pub mod transforms;
pub mod traverse;

pub use config::{
    ArrayStrategy, AttributeStrategy, Config, ConfigOverride, EmptyElementStrategy,
    MixedContentStrategy, PropertyNames, TextStrategy,
};
pub use error::{Result, XjxError};
pub use node::{Attribute, Body, ClonePolicy, Collection, Field, Instruction, NamespaceDecl, Node, NodeKind, Primitive, Record};
pub use pipeline::{Hooks, Pipeline, Stage};
pub use stages::{
    CompactOutput, DataOutput, DataSource, FilterStage, MapStage, MarkupOutput, MarkupSource, TransformStage,
};
pub use transforms::{BooleanTransform, NumberTransform, RegexTransform, ValueTransform};
pub use traverse::{collect, filter, reduce, transform, traverse, Order, TransformAction, TraversalContext, Visitor};

use serde_json::Value;

/// Parse markup text into a tree
pub fn xml_to_tree(text: &str, config: &Config) -> Result<Node> {
    Pipeline::new(config.clone()).execute_source(&MarkupSource, text.to_string(), Hooks::new())
}

/// Serialize a tree as markup text
pub fn tree_to_xml(node: &Node, config: &Config) -> Result<String> {
    Pipeline::new(config.clone()).execute_output(&MarkupOutput, node, Hooks::new())
}

/// Convert markup text to JSON, standard or high-fidelity per `config`
pub fn xml_to_json(text: &str, config: &Config) -> Result<Value> {
    let pipeline = Pipeline::new(config.clone());
    let tree = pipeline.execute_source(&MarkupSource, text.to_string(), Hooks::new())?;
    pipeline.execute_output(&DataOutput, &tree, Hooks::new())
}

/// Convert JSON to markup text, reading it as standard or high-fidelity
/// data per `config`
pub fn json_to_xml(value: &Value, config: &Config) -> Result<String> {
    let pipeline = Pipeline::new(config.clone());
    let tree = pipeline.execute_source(&DataSource, value.clone(), Hooks::new())?;
    pipeline.execute_output(&MarkupOutput, &tree, Hooks::new())
}
