//! Error types for template runs
//!
//! Every error here aborts the run. Nothing is written once one is raised.

use thiserror::Error;

/// Programmer misuse of the templating API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("Callback passed to `{member}`, accessors do not take blocks")]
    CallbackArgument { member: String },

    #[error("Weird argument list to `{member}`: expected at most 1 value, got {count}")]
    TooManyArguments { member: String, count: usize },

    #[error("Selector step `{member}` takes no arguments, got {count}")]
    SelectorArguments { member: String, count: usize },

    #[error("Declaration is lacking a type")]
    MissingType,

    #[error("Declaration of `{type_name}` is lacking a name")]
    MissingName { type_name: String },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Section `{0}` is reserved for declarations")]
    ReservedSection(String),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = TemplateError> = std::result::Result<T, E>;
