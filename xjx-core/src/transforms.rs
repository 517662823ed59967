//! Value coercion over a tree
//!
//! A [`ValueTransform`] rewrites single primitives. [`apply`] runs it over
//! every place a tree holds one: `Value` leaves, `Field` values, record text
//! bodies and, unless the transform opts out, attribute values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Number;

use crate::error::{Result, XjxError};
use crate::node::{Body, ClonePolicy, Field, Node, Primitive};
use crate::traverse::{self, detach, TransformAction};

pub trait ValueTransform {
    fn name(&self) -> &str;

    /// The replacement for `value`, or `None` to leave it alone
    fn transform_primitive(&self, value: &Primitive) -> Option<Primitive>;

    fn applies_to_attributes(&self) -> bool {
        true
    }
}

/// Run `transform` over every primitive in `root`, returning a new tree
pub fn apply<T: ValueTransform + ?Sized>(transform: &T, root: &Node) -> Node {
    let rebuilt = traverse::transform(root, |node, _ctx| match node {
        Node::Value(value) => match transform.transform_primitive(value) {
            Some(coerced) => TransformAction::Replace(Node::Value(coerced)),
            None => TransformAction::Keep,
        },
        Node::Field(field) => match transform.transform_primitive(&field.value) {
            Some(coerced) => TransformAction::Replace(Node::Field(Field { value: coerced, ..field.clone() })),
            None => TransformAction::Keep,
        },
        Node::Record(_) => update_record(transform, node),
        _ => TransformAction::Keep,
    });
    // Nothing above removes a node, so the root always survives
    rebuilt.unwrap_or_else(|| ClonePolicy::Transform.apply(root))
}

fn update_record<T: ValueTransform + ?Sized>(transform: &T, node: &Node) -> TransformAction {
    let mut updated = detach(node);
    let Some(record) = updated.as_record_mut() else {
        return TransformAction::Keep;
    };

    let mut changed = false;
    if let Body::Text(value) = &mut record.body {
        if let Some(coerced) = transform.transform_primitive(value) {
            *value = coerced;
            changed = true;
        }
    }
    if transform.applies_to_attributes() {
        for attribute in &mut record.attributes {
            if let Some(coerced) = transform.transform_primitive(&attribute.value) {
                attribute.value = coerced;
                changed = true;
            }
        }
    }

    if changed {
        TransformAction::Update(updated)
    } else {
        TransformAction::Keep
    }
}

/// Turns boolean words into booleans
#[derive(Debug, Clone)]
pub struct BooleanTransform {
    true_values: Vec<String>,
    false_values: Vec<String>,
    ignore_case: bool,
    attributes: bool,
}

impl Default for BooleanTransform {
    fn default() -> Self {
        BooleanTransform {
            true_values: vec!["true".into(), "yes".into(), "on".into()],
            false_values: vec!["false".into(), "no".into(), "off".into()],
            ignore_case: true,
            attributes: true,
        }
    }
}

impl BooleanTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_true_values(mut self, words: &[&str]) -> Self {
        self.true_values = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn with_false_values(mut self, words: &[&str]) -> Self {
        self.false_values = words.iter().map(|w| w.to_string()).collect();
        self
    }

    pub fn with_ignore_case(mut self, on: bool) -> Self {
        self.ignore_case = on;
        self
    }

    pub fn with_attributes(mut self, on: bool) -> Self {
        self.attributes = on;
        self
    }

    fn matches(&self, words: &[String], text: &str) -> bool {
        words.iter().any(|word| {
            if self.ignore_case {
                word.eq_ignore_ascii_case(text)
            } else {
                word == text
            }
        })
    }
}

impl ValueTransform for BooleanTransform {
    fn name(&self) -> &str {
        "boolean"
    }

    fn transform_primitive(&self, value: &Primitive) -> Option<Primitive> {
        let text = value.as_str()?.trim();
        if self.matches(&self.true_values, text) {
            Some(Primitive::Bool(true))
        } else if self.matches(&self.false_values, text) {
            Some(Primitive::Bool(false))
        } else {
            None
        }
    }

    fn applies_to_attributes(&self) -> bool {
        self.attributes
    }
}

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?$").expect("valid number pattern")
});

static HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0[xX][0-9a-fA-F]+$").expect("valid hex pattern"));

/// Turns numeric text into numbers
///
/// Integers, decimals and scientific notation are recognised; `0x` hex is
/// opt-in. Text with a leading zero such as `"007"` is an identifier, not a
/// number, and stays a string.
#[derive(Debug, Clone)]
pub struct NumberTransform {
    hex: bool,
    attributes: bool,
}

impl Default for NumberTransform {
    fn default() -> Self {
        NumberTransform { hex: false, attributes: true }
    }
}

impl NumberTransform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hex(mut self, on: bool) -> Self {
        self.hex = on;
        self
    }

    pub fn with_attributes(mut self, on: bool) -> Self {
        self.attributes = on;
        self
    }
}

impl ValueTransform for NumberTransform {
    fn name(&self) -> &str {
        "number"
    }

    fn transform_primitive(&self, value: &Primitive) -> Option<Primitive> {
        let text = value.as_str()?.trim();

        if self.hex && HEX.is_match(text) {
            return i64::from_str_radix(&text[2..], 16).ok().map(|n| Primitive::Number(n.into()));
        }
        if !DECIMAL.is_match(text) {
            return None;
        }

        let is_integer = !text.contains(['.', 'e', 'E']);
        if is_integer {
            if let Ok(n) = text.parse::<i64>() {
                return Some(Primitive::Number(n.into()));
            }
        }
        let n = text.parse::<f64>().ok()?;
        Number::from_f64(n).map(Primitive::Number)
    }

    fn applies_to_attributes(&self) -> bool {
        self.attributes
    }
}

/// Regex replacement over string values
#[derive(Debug, Clone)]
pub struct RegexTransform {
    pattern: Regex,
    replacement: String,
    attributes: bool,
}

impl RegexTransform {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| XjxError::validation(format!("invalid pattern '{}': {}", pattern, e)))?;
        Ok(RegexTransform { pattern, replacement: replacement.to_string(), attributes: true })
    }

    pub fn with_attributes(mut self, on: bool) -> Self {
        self.attributes = on;
        self
    }
}

impl ValueTransform for RegexTransform {
    fn name(&self) -> &str {
        "regex"
    }

    fn transform_primitive(&self, value: &Primitive) -> Option<Primitive> {
        let text = value.as_str()?;
        if !self.pattern.is_match(text) {
            return None;
        }
        let replaced = self.pattern.replace_all(text, self.replacement.as_str());
        Some(Primitive::String(replaced.into_owned()))
    }

    fn applies_to_attributes(&self) -> bool {
        self.attributes
    }
}
