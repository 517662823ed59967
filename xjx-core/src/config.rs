//! Conversion configuration
//!
//! `Config` is an immutable value: builder methods consume it and return the
//! changed copy. Partial configuration (from a file or the command line) is
//! expressed as a [`ConfigOverride`], applied with [`Config::merge`], where
//! every `Some` leaf wins and every `None` leaf inherits from the base.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

use crate::error::{Result, XjxError};

/// Declares a strategy enum with its kebab-case names.
macro_rules! strategy_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Parse from the kebab-case name
            pub fn from_str(s: &str) -> Option<Self> {
                match s.to_lowercase().as_str() {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Every accepted name, in declaration order
            pub fn valid_values() -> &'static [&'static str] {
                &[$($text),+]
            }
        }
    };
}

strategy_enum! {
    /// Where record attributes go in structured data
    AttributeStrategy {
        /// Same level as child keys; scalars are read back as attributes
        Merge => "merge",
        /// Same level, keys marked with the attribute prefix
        Prefix => "prefix",
        /// Dedicated sub-object under the attributes property
        Property => "property",
    }
}

strategy_enum! {
    /// How a record's text appears in structured data
    TextStrategy {
        /// A text-only record becomes the bare value
        Direct => "direct",
        /// Text always lives under the value property
        Property => "property",
    }
}

strategy_enum! {
    /// When same-named children become an array
    ArrayStrategy {
        Multiple => "multiple",
        Always => "always",
        Never => "never",
    }
}

strategy_enum! {
    /// How an element with no attributes and no content is represented
    EmptyElementStrategy {
        Object => "object",
        Null => "null",
        String => "string",
        Remove => "remove",
    }
}

strategy_enum! {
    /// How records holding both text and elements are represented
    MixedContentStrategy {
        Preserve => "preserve",
        PrioritizeText => "prioritize-text",
        PrioritizeElements => "prioritize-elements",
    }
}

/// Which node kinds survive conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Preserve {
    pub namespaces: bool,
    pub comments: bool,
    pub instructions: bool,
    pub cdata: bool,
    pub text: bool,
    pub whitespace: bool,
    pub attributes: bool,
    /// Keep `prefix:local` qualifiers in structured-data keys
    pub prefixed_names: bool,
}

impl Default for Preserve {
    fn default() -> Self {
        Preserve {
            namespaces: true,
            comments: true,
            instructions: true,
            cdata: true,
            text: true,
            whitespace: false,
            attributes: true,
            prefixed_names: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategies {
    pub attribute: AttributeStrategy,
    pub text: TextStrategy,
    pub array: ArrayStrategy,
    pub empty_element: EmptyElementStrategy,
    pub mixed_content: MixedContentStrategy,
}

impl Default for Strategies {
    fn default() -> Self {
        Strategies {
            attribute: AttributeStrategy::Property,
            text: TextStrategy::Direct,
            array: ArrayStrategy::Multiple,
            empty_element: EmptyElementStrategy::Object,
            mixed_content: MixedContentStrategy::Preserve,
        }
    }
}

/// Keys used for metadata when emitting structured data
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNames {
    pub value: String,
    pub attributes: String,
    pub children: String,
    pub namespace: String,
    pub prefix: String,
    pub cdata: String,
    pub comment: String,
    pub instruction: String,
    pub target: String,
    /// Namespace declarations made on a record
    pub namespaces: String,
    /// Marks a `Field` node in high-fidelity form
    pub field: String,
    /// Key prefix marking attributes under the `prefix` attribute strategy
    pub attribute_prefix: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        PropertyNames {
            value: "$val".to_string(),
            attributes: "$attr".to_string(),
            children: "$children".to_string(),
            namespace: "$ns".to_string(),
            prefix: "$pre".to_string(),
            cdata: "$cdata".to_string(),
            comment: "$cmnt".to_string(),
            instruction: "$pi".to_string(),
            target: "$trgt".to_string(),
            namespaces: "$xmlns".to_string(),
            field: "$field".to_string(),
            attribute_prefix: "@".to_string(),
        }
    }
}

impl PropertyNames {
    /// True if `key` is one of the metadata keys (not an element name)
    pub fn is_reserved(&self, key: &str) -> bool {
        [
            &self.value,
            &self.attributes,
            &self.children,
            &self.namespace,
            &self.prefix,
            &self.cdata,
            &self.comment,
            &self.instruction,
            &self.target,
            &self.namespaces,
            &self.field,
        ]
        .iter()
        .any(|name| name.as_str() == key)
    }
}

/// Array naming rules
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRules {
    /// Element name given to array items with no better name
    pub default_item_name: String,
    /// Item name per parent element name
    pub item_names: BTreeMap<String, String>,
    /// Parents whose children are always emitted as arrays
    pub force_array: Vec<String>,
}

impl Default for ArrayRules {
    fn default() -> Self {
        ArrayRules {
            default_item_name: "item".to_string(),
            item_names: BTreeMap::new(),
            force_array: Vec::new(),
        }
    }
}

impl ArrayRules {
    pub fn item_name_for(&self, parent: &str) -> &str {
        self.item_names.get(parent).map(String::as_str).unwrap_or(&self.default_item_name)
    }

    pub fn is_forced(&self, parent: &str) -> bool {
        self.force_array.iter().any(|name| name == parent)
    }
}

/// Markup text layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatOptions {
    /// Indent width for pretty printing; `None` writes compact markup
    pub indent: Option<usize>,
    /// Force the `<?xml ...?>` declaration on or off; `None` writes it for document trees only
    pub declaration: Option<bool>,
}

/// Complete conversion configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub preserve: Preserve,
    /// Use the lossless structured-data codec
    pub high_fidelity: bool,
    pub strategies: Strategies,
    pub properties: PropertyNames,
    pub arrays: ArrayRules,
    pub format: FormatOptions,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_high_fidelity(mut self, on: bool) -> Self {
        self.high_fidelity = on;
        self
    }

    pub fn with_attribute_strategy(mut self, strategy: AttributeStrategy) -> Self {
        self.strategies.attribute = strategy;
        self
    }

    pub fn with_text_strategy(mut self, strategy: TextStrategy) -> Self {
        self.strategies.text = strategy;
        self
    }

    pub fn with_array_strategy(mut self, strategy: ArrayStrategy) -> Self {
        self.strategies.array = strategy;
        self
    }

    pub fn with_empty_element_strategy(mut self, strategy: EmptyElementStrategy) -> Self {
        self.strategies.empty_element = strategy;
        self
    }

    pub fn with_mixed_content_strategy(mut self, strategy: MixedContentStrategy) -> Self {
        self.strategies.mixed_content = strategy;
        self
    }

    pub fn with_preserve(mut self, preserve: Preserve) -> Self {
        self.preserve = preserve;
        self
    }

    pub fn with_preserve_whitespace(mut self, on: bool) -> Self {
        self.preserve.whitespace = on;
        self
    }

    pub fn with_preserve_comments(mut self, on: bool) -> Self {
        self.preserve.comments = on;
        self
    }

    pub fn with_preserve_namespaces(mut self, on: bool) -> Self {
        self.preserve.namespaces = on;
        self
    }

    pub fn with_preserve_prefixed_names(mut self, on: bool) -> Self {
        self.preserve.prefixed_names = on;
        self
    }

    pub fn with_properties(mut self, properties: PropertyNames) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_attributes_property(mut self, name: &str) -> Self {
        self.properties.attributes = name.to_string();
        self
    }

    pub fn with_item_name(mut self, parent: &str, item: &str) -> Self {
        self.arrays.item_names.insert(parent.to_string(), item.to_string());
        self
    }

    pub fn with_force_array(mut self, parent: &str) -> Self {
        self.arrays.force_array.push(parent.to_string());
        self
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.format.indent = indent;
        self
    }

    pub fn with_declaration(mut self, declaration: Option<bool>) -> Self {
        self.format.declaration = declaration;
        self
    }

    /// Apply an override on top of this configuration.
    pub fn merge(&self, over: &ConfigOverride) -> Config {
        let mut merged = self.clone();

        if let Some(p) = &over.preserve {
            let base = &mut merged.preserve;
            set(&mut base.namespaces, p.namespaces);
            set(&mut base.comments, p.comments);
            set(&mut base.instructions, p.instructions);
            set(&mut base.cdata, p.cdata);
            set(&mut base.text, p.text);
            set(&mut base.whitespace, p.whitespace);
            set(&mut base.attributes, p.attributes);
            set(&mut base.prefixed_names, p.prefixed_names);
        }

        set(&mut merged.high_fidelity, over.high_fidelity);

        if let Some(s) = &over.strategies {
            let base = &mut merged.strategies;
            set(&mut base.attribute, s.attribute);
            set(&mut base.text, s.text);
            set(&mut base.array, s.array);
            set(&mut base.empty_element, s.empty_element);
            set(&mut base.mixed_content, s.mixed_content);
        }

        if let Some(p) = &over.properties {
            let base = &mut merged.properties;
            set_string(&mut base.value, &p.value);
            set_string(&mut base.attributes, &p.attributes);
            set_string(&mut base.children, &p.children);
            set_string(&mut base.namespace, &p.namespace);
            set_string(&mut base.prefix, &p.prefix);
            set_string(&mut base.cdata, &p.cdata);
            set_string(&mut base.comment, &p.comment);
            set_string(&mut base.instruction, &p.instruction);
            set_string(&mut base.target, &p.target);
            set_string(&mut base.namespaces, &p.namespaces);
            set_string(&mut base.field, &p.field);
            set_string(&mut base.attribute_prefix, &p.attribute_prefix);
        }

        if let Some(a) = &over.arrays {
            let base = &mut merged.arrays;
            set_string(&mut base.default_item_name, &a.default_item_name);
            // Per-parent names merge key by key
            if let Some(names) = &a.item_names {
                for (parent, item) in names {
                    base.item_names.insert(parent.clone(), item.clone());
                }
            }
            if let Some(forced) = &a.force_array {
                base.force_array = forced.clone();
            }
        }

        if let Some(f) = &over.format {
            if let Some(indent) = f.indent {
                merged.format.indent = indent;
            }
            if let Some(declaration) = f.declaration {
                merged.format.declaration = declaration;
            }
        }

        merged
    }
}

fn set<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn set_string(slot: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

/// Partial configuration; see [`Config::merge`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverride {
    pub preserve: Option<PreserveOverride>,
    pub high_fidelity: Option<bool>,
    pub strategies: Option<StrategiesOverride>,
    pub properties: Option<PropertyNamesOverride>,
    pub arrays: Option<ArrayRulesOverride>,
    pub format: Option<FormatOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PreserveOverride {
    pub namespaces: Option<bool>,
    pub comments: Option<bool>,
    pub instructions: Option<bool>,
    pub cdata: Option<bool>,
    pub text: Option<bool>,
    pub whitespace: Option<bool>,
    pub attributes: Option<bool>,
    pub prefixed_names: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StrategiesOverride {
    pub attribute: Option<AttributeStrategy>,
    pub text: Option<TextStrategy>,
    pub array: Option<ArrayStrategy>,
    pub empty_element: Option<EmptyElementStrategy>,
    pub mixed_content: Option<MixedContentStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PropertyNamesOverride {
    pub value: Option<String>,
    pub attributes: Option<String>,
    pub children: Option<String>,
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub cdata: Option<String>,
    pub comment: Option<String>,
    pub instruction: Option<String>,
    pub target: Option<String>,
    pub namespaces: Option<String>,
    pub field: Option<String>,
    pub attribute_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArrayRulesOverride {
    pub default_item_name: Option<String>,
    pub item_names: Option<BTreeMap<String, String>>,
    pub force_array: Option<Vec<String>>,
}

/// An explicit `null` resets a setting to unset; a missing key inherits it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormatOverride {
    #[serde(default, deserialize_with = "explicit")]
    pub indent: Option<Option<usize>>,
    #[serde(default, deserialize_with = "explicit")]
    pub declaration: Option<Option<bool>>,
}

fn explicit<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ConfigOverride {
    /// Parse an override from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| XjxError::validation(format!("invalid configuration: {}", e)))
    }
}
