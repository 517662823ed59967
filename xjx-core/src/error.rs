//! Error types shared by every codec and the pipeline executor

use thiserror::Error;

/// Maximum number of source characters kept in a parse error snippet
const SNIPPET_LEN: usize = 40;

/// Errors that can occur during conversion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XjxError {
    /// Input that breaks an API contract (e.g. a data root with two keys)
    #[error("Validation failed: {message}{}", key_suffix(.key))]
    Validation { message: String, key: Option<String> },

    /// Malformed markup text
    #[error("Failed to parse markup: {message} (near `{snippet}`)")]
    Parse { message: String, snippet: String },

    /// Internal conversion failure
    #[error("Processing failed: {message}")]
    Processing { message: String },

    /// An error raised inside a named pipeline stage
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<XjxError>,
    },
}

fn key_suffix(key: &Option<String>) -> String {
    match key {
        Some(k) => format!(" (key '{}')", k),
        None => String::new(),
    }
}

impl XjxError {
    pub fn validation(message: impl Into<String>) -> Self {
        XjxError::Validation { message: message.into(), key: None }
    }

    pub fn validation_at(message: impl Into<String>, key: impl Into<String>) -> Self {
        XjxError::Validation { message: message.into(), key: Some(key.into()) }
    }

    /// Build a parse error, cutting a short snippet out of `source` around `position`.
    pub fn parse(message: impl Into<String>, source: &str, position: usize) -> Self {
        XjxError::Parse { message: message.into(), snippet: snippet_at(source, position) }
    }

    pub fn processing(message: impl Into<String>) -> Self {
        XjxError::Processing { message: message.into() }
    }

    /// Wrap this error with the name of the stage it escaped from.
    ///
    /// An error that already carries a stage name is returned unchanged.
    pub fn in_stage(self, stage: &str) -> Self {
        if matches!(self, XjxError::Stage { .. }) {
            return self;
        }
        XjxError::Stage { stage: stage.to_string(), source: Box::new(self) }
    }

    /// The underlying error with any stage wrappers removed
    pub fn root(&self) -> &XjxError {
        match self {
            XjxError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the stage this error escaped from, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            XjxError::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

/// Take up to `SNIPPET_LEN` characters of `source` starting a little before `position`.
fn snippet_at(source: &str, position: usize) -> String {
    let mut start = position.saturating_sub(SNIPPET_LEN / 2).min(source.len());
    while start > 0 && !source.is_char_boundary(start) {
        start -= 1;
    }
    source[start..].chars().take(SNIPPET_LEN).collect()
}

pub type Result<T> = std::result::Result<T, XjxError>;
