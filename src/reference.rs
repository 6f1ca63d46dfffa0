//! Reference tokens and the selector chain
//!
//! `namespace -> type -> instance -> field` never looks at the registry.
//! A token only encodes identity, so forward references to resources that
//! are declared later (or never) are fine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UsageError;

/// Whether a declaration lives in resource-space or data-source-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resource,
    #[serde(rename = "data")]
    DataSource,
}

impl Category {
    /// Token prefix for this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            Category::Resource => "",
            Category::DataSource => "data.",
        }
    }

    /// Top-level key in the rendered document.
    pub fn section_key(&self) -> &'static str {
        match self {
            Category::Resource => "resource",
            Category::DataSource => "data",
        }
    }
}

impl FromStr for Category {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource" => Ok(Category::Resource),
            "data" => Ok(Category::DataSource),
            other => Err(UsageError::UnknownCategory(other.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section_key())
    }
}

/// Replace every space and period with an underscore.
pub fn normalize_name(raw: &str) -> String {
    raw.replace([' ', '.'], "_")
}

/// `${<prefix><type>.<name>.<field>}`, resolved by the downstream tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ReferenceToken(String);

impl ReferenceToken {
    pub(crate) fn new(category: Category, type_name: &str, name: &str, field: &str) -> Self {
        Self(format!(
            "${{{}{}.{}.{}}}",
            category.prefix(),
            type_name,
            name,
            field
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ReferenceToken> for Value {
    fn from(token: ReferenceToken) -> Self {
        Value::String(token.0)
    }
}

impl From<&ReferenceToken> for Value {
    fn from(token: &ReferenceToken) -> Self {
        Value::String(token.0.clone())
    }
}

impl PartialEq<str> for ReferenceToken {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ReferenceToken {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A member access as seen by the dynamic surface: name, positional
/// arguments and whether a callback was attached.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberCall {
    pub member: String,
    pub args: Vec<Value>,
    pub callback: bool,
}

impl MemberCall {
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            args: vec![],
            callback: false,
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn with_callback(mut self) -> Self {
        self.callback = true;
        self
    }

    /// Selector steps accept neither arguments nor callbacks.
    fn expect_bare(&self) -> Result<&str, UsageError> {
        if self.callback {
            return Err(UsageError::CallbackArgument {
                member: self.member.clone(),
            });
        }
        if !self.args.is_empty() {
            return Err(UsageError::SelectorArguments {
                member: self.member.clone(),
                count: self.args.len(),
            });
        }
        Ok(&self.member)
    }
}

/// Entry point of the chain, bound to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceSelector {
    category: Category,
}

impl NamespaceSelector {
    pub fn new(category: Category) -> Self {
        Self { category }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn into_type(&self, type_name: impl Into<String>) -> TypeSelector {
        TypeSelector {
            category: self.category,
            type_name: type_name.into(),
        }
    }

    /// Bracket lookup, for type names that are not valid identifiers.
    pub fn index(&self, type_name: &str) -> TypeSelector {
        self.into_type(type_name)
    }

    pub fn dispatch(&self, call: &MemberCall) -> Result<TypeSelector, UsageError> {
        call.expect_bare().map(|member| self.into_type(member))
    }
}

/// Bound to category and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSelector {
    category: Category,
    type_name: String,
}

impl TypeSelector {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn into_instance(&self, name: &str) -> InstanceReference {
        InstanceReference::new(self.category, self.type_name.clone(), name)
    }

    pub fn index(&self, name: &str) -> InstanceReference {
        self.into_instance(name)
    }

    pub fn dispatch(&self, call: &MemberCall) -> Result<InstanceReference, UsageError> {
        call.expect_bare().map(|member| self.into_instance(member))
    }
}

/// Bound to category, type and normalized name. Every field access
/// manufactures a fresh token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceReference {
    category: Category,
    type_name: String,
    name: String,
}

impl InstanceReference {
    pub fn new(category: Category, type_name: impl Into<String>, name: &str) -> Self {
        Self {
            category,
            type_name: type_name.into(),
            name: normalize_name(name),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, field: &str) -> ReferenceToken {
        ReferenceToken::new(self.category, &self.type_name, &self.name, field)
    }

    pub fn dispatch(&self, call: &MemberCall) -> Result<ReferenceToken, UsageError> {
        call.expect_bare().map(|member| self.field(member))
    }
}
