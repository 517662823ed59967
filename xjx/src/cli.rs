//! CLI argument parsing using clap

use std::path::PathBuf;

use clap::Parser;

/// Convert between XML and JSON through a neutral tree
#[derive(Parser, Debug)]
#[command(name = "xjx")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # XML to JSON, attributes merged next to child elements
    xjx users.xml --attributes merge

    # JSON back to XML, pretty printed
    xjx users.json -t xml --pretty 2

    # Lossless round trip through JSON
    xjx doc.xml --hifi > doc.json && xjx doc.json --hifi

    # Read stdin, type booleans and numbers, drop empty values
    cat feed.xml | xjx - --coerce --compact

    # Strategies from a file, one flag on top
    xjx feed.xml --config xjx.yaml --empty null
"#)]
pub struct Args {
    /// Input file, or `-` for stdin
    #[arg(default_value = "-")]
    pub input: String,

    /// Output format: json or xml (default: the other one)
    #[arg(short = 't', long = "to")]
    pub to: Option<String>,

    /// Use the lossless high-fidelity JSON form
    #[arg(long = "hifi")]
    pub hifi: bool,

    /// Configuration file (JSON or YAML)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Attribute strategy: merge, prefix, property
    #[arg(long = "attributes")]
    pub attributes: Option<String>,

    /// Text strategy: direct, property
    #[arg(long = "text")]
    pub text: Option<String>,

    /// Array strategy: multiple, always, never
    #[arg(long = "arrays")]
    pub arrays: Option<String>,

    /// Empty element strategy: object, null, string, remove
    #[arg(long = "empty")]
    pub empty: Option<String>,

    /// Mixed content strategy: preserve, prioritize-text, prioritize-elements
    #[arg(long = "mixed")]
    pub mixed: Option<String>,

    /// Drop empty values from JSON output
    #[arg(long = "compact")]
    pub compact: bool,

    /// Pretty print with this indent width
    #[arg(long = "pretty")]
    pub pretty: Option<usize>,

    /// Turn boolean and numeric text into typed values
    #[arg(long = "coerce")]
    pub coerce: bool,

    /// Show debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
