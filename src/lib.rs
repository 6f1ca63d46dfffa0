//! tftemplate core - imperative templates in, Terraform JSON out
//!
//! # Guarantees
//! 1. Output Is Deterministic: same content, same bytes
//! 2. Tokens Encode Identity: `${[data.]type.name.field}`, never checked
//! 3. Last Declaration Wins
//! 4. Runs Are All-Or-Nothing

pub mod error;
pub mod reference;
pub mod resource;
pub mod registry;
pub mod document;
pub mod hashing;
pub mod pipeline;

pub use error::{TemplateError, UsageError};
pub use reference::{
    normalize_name, Category, InstanceReference, MemberCall, NamespaceSelector, ReferenceToken,
    TypeSelector,
};
pub use resource::Resource;
pub use registry::{RedeclarePolicy, RunConfig, RunContext, Section, OUTPUT_SECTION};
pub use document::Document;
pub use hashing::sha256_hex;
pub use pipeline::{render, render_to_path, render_to_string, render_with_config};
