//! Configuration assembly: defaults, then the config file, then flags

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use xjx_core::config::{FormatOverride, StrategiesOverride};
use xjx_core::{
    ArrayStrategy, AttributeStrategy, Config, ConfigOverride, EmptyElementStrategy,
    MixedContentStrategy, TextStrategy,
};

use crate::cli::Args;

/// Build the effective configuration for `args`
pub fn build_config(args: &Args) -> Result<Config> {
    let mut config = Config::default();
    if let Some(path) = &args.config {
        config = config.merge(&load_override(path)?);
    }
    Ok(config.merge(&flag_override(args)?))
}

/// Read a config file; `.yaml`/`.yml` are YAML, anything else JSON
pub fn load_override(path: &Path) -> Result<ConfigOverride> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file '{}'", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let over = if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| anyhow!(e))
    } else {
        ConfigOverride::from_json_str(&text).map_err(|e| anyhow!(e))
    };
    over.with_context(|| format!("invalid config file '{}'", path.display()))
}

fn flag_override(args: &Args) -> Result<ConfigOverride> {
    let strategies = StrategiesOverride {
        attribute: choice(
            args.attributes.as_deref(),
            "attribute",
            AttributeStrategy::from_str,
            AttributeStrategy::valid_values(),
        )?,
        text: choice(args.text.as_deref(), "text", TextStrategy::from_str, TextStrategy::valid_values())?,
        array: choice(args.arrays.as_deref(), "array", ArrayStrategy::from_str, ArrayStrategy::valid_values())?,
        empty_element: choice(
            args.empty.as_deref(),
            "empty element",
            EmptyElementStrategy::from_str,
            EmptyElementStrategy::valid_values(),
        )?,
        mixed_content: choice(
            args.mixed.as_deref(),
            "mixed content",
            MixedContentStrategy::from_str,
            MixedContentStrategy::valid_values(),
        )?,
    };

    Ok(ConfigOverride {
        high_fidelity: args.hifi.then_some(true),
        strategies: Some(strategies),
        format: Some(FormatOverride { indent: args.pretty.map(Some), declaration: None }),
        ..ConfigOverride::default()
    })
}

fn choice<T>(
    value: Option<&str>,
    what: &str,
    parse: fn(&str) -> Option<T>,
    valid: &[&str],
) -> Result<Option<T>> {
    value
        .map(|v| {
            parse(v).ok_or_else(|| {
                anyhow!("invalid {} strategy '{}'. Valid values: {}", what, v, valid.join(", "))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["xjx", "input.xml"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = build_config(&args(&["--attributes", "merge", "--empty", "null", "--pretty", "2"])).unwrap();
        assert_eq!(config.strategies.attribute, AttributeStrategy::Merge);
        assert_eq!(config.strategies.empty_element, EmptyElementStrategy::Null);
        assert_eq!(config.strategies.text, TextStrategy::Direct);
        assert_eq!(config.format.indent, Some(2));
        assert!(!config.high_fidelity);
    }

    #[test]
    fn test_invalid_strategy_lists_valid_values() {
        let err = build_config(&args(&["--arrays", "sometimes"])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("sometimes"));
        assert!(message.contains("multiple, always, never"));
    }

    #[test]
    fn test_yaml_config_file() {
        let file = write_config(
            ".yaml",
            "strategies:\n  attribute: prefix\n  array: always\narrays:\n  itemNames:\n    users: user\n",
        );
        let path = file.path().to_string_lossy().to_string();
        let config = build_config(&args(&["--config", path.as_str(), "--arrays", "never"])).unwrap();
        assert_eq!(config.strategies.attribute, AttributeStrategy::Prefix);
        // The flag wins over the file
        assert_eq!(config.strategies.array, ArrayStrategy::Never);
        assert_eq!(config.arrays.item_name_for("users"), "user");
    }

    #[test]
    fn test_json_config_file() {
        let file = write_config(".json", r#"{"highFidelity": true, "preserve": {"comments": false}}"#);
        let path = file.path().to_string_lossy().to_string();
        let config = build_config(&args(&["--config", path.as_str()])).unwrap();
        assert!(config.high_fidelity);
        assert!(!config.preserve.comments);
    }

    #[test]
    fn test_bad_config_file() {
        let file = write_config(".json", r#"{"strategy": {}}"#);
        let err = load_override(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid config file"));

        let missing = load_override(Path::new("/nonexistent/xjx.yaml")).unwrap_err();
        assert!(missing.to_string().contains("cannot read config file"));
    }
}
