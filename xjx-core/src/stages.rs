//! Concrete stages run through the [`Pipeline`](crate::pipeline::Pipeline)

use serde_json::{Map, Value};

use crate::config::Config;
use crate::data::{self, standard};
use crate::error::{Result, XjxError};
use crate::markup;
use crate::node::Node;
use crate::pipeline::Stage;
use crate::strategy;
use crate::transforms::{self, ValueTransform};
use crate::traverse::{self, TransformAction, TraversalContext};

/// Markup text to tree
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupSource;

impl Stage for MarkupSource {
    type Input = String;
    type Output = Node;

    fn name(&self) -> &str {
        "markup-source"
    }

    fn validate(&self, input: &String, _config: &Config) -> Result<()> {
        if input.trim().is_empty() {
            return Err(XjxError::validation("markup input is empty"));
        }
        Ok(())
    }

    fn execute(&self, input: &String, config: &Config) -> Result<Node> {
        markup::parse_markup_to_tree(input, config)
    }
}

/// Structured data to tree, standard or high-fidelity per the config
#[derive(Debug, Clone, Copy, Default)]
pub struct DataSource;

impl Stage for DataSource {
    type Input = Value;
    type Output = Node;

    fn name(&self) -> &str {
        "data-source"
    }

    fn execute(&self, input: &Value, config: &Config) -> Result<Node> {
        data::data_to_tree(input, config)
    }
}

/// Tree to markup text
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupOutput;

impl Stage for MarkupOutput {
    type Input = Node;
    type Output = String;

    fn name(&self) -> &str {
        "markup-output"
    }

    fn execute(&self, input: &Node, config: &Config) -> Result<String> {
        markup::tree_to_markup_string(input, config)
    }
}

/// Tree to structured data, standard or high-fidelity per the config
#[derive(Debug, Clone, Copy, Default)]
pub struct DataOutput;

impl Stage for DataOutput {
    type Input = Node;
    type Output = Value;

    fn name(&self) -> &str {
        "data-output"
    }

    fn execute(&self, input: &Node, config: &Config) -> Result<Value> {
        data::tree_to_data(input, config)
    }
}

/// Standard structured data with empty values pruned
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactOutput;

impl Stage for CompactOutput {
    type Input = Node;
    type Output = Value;

    fn name(&self) -> &str {
        "compact-output"
    }

    fn execute(&self, input: &Node, config: &Config) -> Result<Value> {
        let value = standard::tree_to_data(input, config)?;
        Ok(strategy::compact(&value, config).unwrap_or_else(|| Value::Object(Map::new())))
    }
}

/// Keep matching nodes and their ancestors
pub struct FilterStage<F> {
    name: String,
    predicate: F,
}

impl<F> FilterStage<F>
where
    F: Fn(&Node, &TraversalContext<'_>) -> bool,
{
    pub fn new(name: &str, predicate: F) -> Self {
        FilterStage { name: name.to_string(), predicate }
    }
}

impl<F> Stage for FilterStage<F>
where
    F: Fn(&Node, &TraversalContext<'_>) -> bool,
{
    type Input = Node;
    type Output = Node;

    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: &Node, _config: &Config) -> Result<Node> {
        traverse::filter(input, |node, ctx| (self.predicate)(node, ctx))
            .ok_or_else(|| XjxError::processing("no node matched the filter"))
    }
}

/// Rebuild the tree, letting a closure decide each node's fate
pub struct MapStage<F> {
    name: String,
    f: F,
}

impl<F> MapStage<F>
where
    F: Fn(&Node, &TraversalContext<'_>) -> TransformAction,
{
    pub fn new(name: &str, f: F) -> Self {
        MapStage { name: name.to_string(), f }
    }
}

impl<F> Stage for MapStage<F>
where
    F: Fn(&Node, &TraversalContext<'_>) -> TransformAction,
{
    type Input = Node;
    type Output = Node;

    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: &Node, _config: &Config) -> Result<Node> {
        traverse::transform(input, |node, ctx| (self.f)(node, ctx))
            .ok_or_else(|| XjxError::processing("the root node was removed"))
    }
}

/// Run a [`ValueTransform`] over the whole tree
#[derive(Debug, Clone)]
pub struct TransformStage<T> {
    transform: T,
}

impl<T: ValueTransform> TransformStage<T> {
    pub fn new(transform: T) -> Self {
        TransformStage { transform }
    }
}

impl<T: ValueTransform> Stage for TransformStage<T> {
    type Input = Node;
    type Output = Node;

    fn name(&self) -> &str {
        self.transform.name()
    }

    fn execute(&self, input: &Node, _config: &Config) -> Result<Node> {
        Ok(transforms::apply(&self.transform, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Primitive;
    use crate::pipeline::{Hooks, Pipeline};
    use crate::transforms::{BooleanTransform, NumberTransform};
    use serde_json::json;

    fn parse(pipeline: &Pipeline, text: &str) -> Node {
        pipeline.execute_source(&MarkupSource, text.to_string(), Hooks::new()).unwrap()
    }

    #[test]
    fn test_empty_markup_is_rejected() {
        let err = Pipeline::default()
            .execute_source(&MarkupSource, "  \n".to_string(), Hooks::new())
            .unwrap_err();
        assert_eq!(err.stage(), Some("markup-source"));
        assert!(matches!(err.root(), XjxError::Validation { .. }));
    }

    #[test]
    fn test_parse_errors_carry_the_stage() {
        let err = Pipeline::default()
            .execute_source(&MarkupSource, "<a><b></a>".to_string(), Hooks::new())
            .unwrap_err();
        assert_eq!(err.stage(), Some("markup-source"));
        assert!(matches!(err.root(), XjxError::Parse { .. }));
    }

    #[test]
    fn test_data_output_follows_high_fidelity_flag() {
        let standard = Pipeline::default();
        let tree = parse(&standard, "<a><b>1</b></a>");
        let value = standard.execute_output(&DataOutput, &tree, Hooks::new()).unwrap();
        assert_eq!(value, json!({"a": {"b": "1"}}));

        let hifi = Pipeline::new(Config::default().with_high_fidelity(true));
        let value = hifi.execute_output(&DataOutput, &tree, Hooks::new()).unwrap();
        assert_eq!(value, json!({"#document": [{"a": {"$children": [{"b": {"$val": "1"}}]}}]}));
        let back = hifi.execute_source(&DataSource, value, Hooks::new()).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_compact_output_prunes_empty_values() {
        let pipeline = Pipeline::default();
        let tree = parse(&pipeline, "<a><b/><c>x</c><d></d></a>");
        let value = pipeline.execute_output(&CompactOutput, &tree, Hooks::new()).unwrap();
        assert_eq!(value, json!({"a": {"c": "x"}}));
    }

    #[test]
    fn test_filter_stage() {
        let pipeline = Pipeline::default();
        let tree = parse(&pipeline, "<lib><book><t>A</t></book><mag><t>B</t></mag></lib>");
        let only_books = FilterStage::new("books", |node: &Node, _: &TraversalContext<'_>| node.name() == "book");
        let filtered = pipeline.execute_transform(&only_books, &tree, Hooks::new()).unwrap();
        let markup = pipeline.execute_output(&MarkupOutput, &filtered, Hooks::new()).unwrap();
        assert_eq!(markup, r#"<?xml version="1.0" encoding="UTF-8"?><lib><book><t>A</t></book></lib>"#);

        let nothing = FilterStage::new("none", |_: &Node, _: &TraversalContext<'_>| false);
        let err = pipeline.execute_transform(&nothing, &tree, Hooks::new()).unwrap_err();
        assert_eq!(err.stage(), Some("none"));
    }

    #[test]
    fn test_map_stage_flattens() {
        let pipeline = Pipeline::default();
        let tree = parse(&pipeline, "<a><wrap><b/><c/></wrap></a>");
        let unwrap = MapStage::new("unwrap", |node: &Node, _: &TraversalContext<'_>| {
            if node.name() == "wrap" {
                TransformAction::Flatten
            } else {
                TransformAction::Keep
            }
        });
        let out = pipeline.execute_transform(&unwrap, &tree, Hooks::new()).unwrap();
        let names: Vec<&str> = out.root_record().unwrap().children().iter().map(Node::name).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_transform_stages_chain() {
        let pipeline = Pipeline::default();
        let tree = parse(&pipeline, r#"<u id="7"><active>yes</active><age>41</age></u>"#);
        let tree = pipeline
            .execute_transform(&TransformStage::new(BooleanTransform::new()), &tree, Hooks::new())
            .unwrap();
        let tree = pipeline
            .execute_transform(&TransformStage::new(NumberTransform::new()), &tree, Hooks::new())
            .unwrap();
        let value = pipeline.execute_output(&DataOutput, &tree, Hooks::new()).unwrap();
        assert_eq!(value, json!({"u": {"$attr": {"id": 7}, "active": true, "age": 41}}));
        assert_eq!(
            tree.root_record().unwrap().attribute("id"),
            Some(&Primitive::from(7i64))
        );
    }
}
