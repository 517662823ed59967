//! xjx - Convert between XML and JSON through a neutral tree
//!
//! This is the main CLI entry point: it reads the input, assembles the
//! configuration and runs the conversion stages through one pipeline.

mod cli;
mod settings;

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xjx_core::{
    BooleanTransform, CompactOutput, DataOutput, DataSource, Hooks, MarkupOutput, MarkupSource,
    Node, NumberTransform, Pipeline, TransformStage,
};

use cli::Args;
use clap::Parser;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Json,
    Xml,
}

impl Target {
    fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Target::Json),
            "xml" => Some(Target::Xml),
            _ => None,
        }
    }

    fn valid_values() -> &'static [&'static str] {
        &["json", "xml"]
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("error: {:#}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with `--verbose`
fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = settings::build_config(&args)?;
    let input = read_input(&args.input)?;
    let is_markup = input.trim_start().starts_with('<');

    let target = match &args.to {
        Some(name) => Target::from_str(name).ok_or_else(|| {
            anyhow!("invalid target '{}'. Valid values: {}", name, Target::valid_values().join(", "))
        })?,
        None if is_markup => Target::Json,
        None => Target::Xml,
    };
    debug!(markup_input = is_markup, ?target, "starting conversion");

    let pipeline = Pipeline::new(config);
    let mut tree = if is_markup {
        pipeline.execute_source(&MarkupSource, input, Hooks::new())?
    } else {
        let value: Value = serde_json::from_str(&input).context("input is neither markup nor valid JSON")?;
        pipeline.execute_source(&DataSource, value, Hooks::new())?
    };

    if args.coerce {
        tree = coerce(&pipeline, &tree)?;
    }

    let output = match target {
        Target::Xml => pipeline.execute_output(&MarkupOutput, &tree, Hooks::new())?,
        Target::Json => {
            let value = if args.compact {
                pipeline.execute_output(&CompactOutput, &tree, Hooks::new())?
            } else {
                pipeline.execute_output(&DataOutput, &tree, Hooks::new())?
            };
            render_json(&value, pipeline.config().format.indent)?
        }
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("cannot read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("cannot read '{}'", input))
}

/// Type boolean words, then numeric text
fn coerce(pipeline: &Pipeline, tree: &Node) -> Result<Node> {
    let tree = pipeline.execute_transform(&TransformStage::new(BooleanTransform::new()), tree, Hooks::new())?;
    Ok(pipeline.execute_transform(&TransformStage::new(NumberTransform::new()), &tree, Hooks::new())?)
}

fn render_json(value: &Value, indent: Option<usize>) -> Result<String> {
    let Some(width) = indent else {
        return Ok(serde_json::to_string(value)?);
    };
    let spaces = " ".repeat(width);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(spaces.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}
