//! YAML error types with source-annotated diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors from reading or writing YAML documents
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    #[diagnostic(code(dst::yaml::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize YAML: {message}")]
    #[diagnostic(code(dst::yaml::serialize))]
    Serialize { message: String },
}

/// A parse failure pointing at the offending location
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid YAML in {filename}: {message}")]
#[diagnostic(code(dst::yaml::syntax), help("check indentation and quoting near the marked location"))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err.location().map(|loc| {
            let offset = loc.index().min(content.len());
            SourceSpan::from((offset, 1usize.min(content.len() - offset)))
        });
        Self {
            filename: filename.to_string(),
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }
}
