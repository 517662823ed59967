//! Structured-data side of the converter
//!
//! Two codecs share the tree: `standard` produces the idiomatic JSON shape
//! driven by the configured strategies, `hifi` a lossless encoding that
//! makes every node kind explicit.

pub mod hifi;
pub mod standard;

use serde_json::Value;

use crate::config::Config;
use crate::error::Result;
use crate::node::Node;

pub use hifi::{data_to_tree_hifi, tree_to_data_hifi};

/// Encode a tree with the codec selected by `config.high_fidelity`
pub fn tree_to_data(node: &Node, config: &Config) -> Result<Value> {
    if config.high_fidelity {
        Ok(hifi::tree_to_data_hifi(node, config))
    } else {
        standard::tree_to_data(node, config)
    }
}

/// Decode data with the codec selected by `config.high_fidelity`
pub fn data_to_tree(value: &Value, config: &Config) -> Result<Node> {
    if config.high_fidelity {
        hifi::data_to_tree_hifi(value, config)
    } else {
        standard::data_to_tree(value, config)
    }
}
