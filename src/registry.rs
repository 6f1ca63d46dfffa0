//! Run context - the registry for one templating run
//!
//! Holds `category -> type -> name -> Resource` plus the auxiliary top-level
//! sections (outputs and friends). One context per run, no shared state.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{Result, UsageError};
use crate::reference::{normalize_name, Category, InstanceReference, NamespaceSelector};
use crate::resource::Resource;

/// What to do when a (category, type, name) is declared a second time.
/// The later declaration always wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedeclarePolicy {
    #[default]
    Silent,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub redeclare: RedeclarePolicy,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_indent() -> usize { 2 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            redeclare: RedeclarePolicy::default(),
            indent: default_indent(),
        }
    }
}

impl RunConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

pub(crate) type TypeBuckets = BTreeMap<String, BTreeMap<String, Resource>>;

pub const OUTPUT_SECTION: &str = "output";

/// An auxiliary top-level section. Entries keep insertion order; inserting
/// an existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Section {
    entries: Map<String, Value>,
}

impl Section {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct RunContext {
    config: RunConfig,
    data: TypeBuckets,
    resources: TypeBuckets,
    sections: Vec<(String, Section)>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::with_config(RunConfig::default())
    }

    pub fn with_config(config: RunConfig) -> Self {
        Self {
            config,
            data: BTreeMap::new(),
            resources: BTreeMap::new(),
            sections: vec![],
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    fn buckets(&self, category: Category) -> &TypeBuckets {
        match category {
            Category::Resource => &self.resources,
            Category::DataSource => &self.data,
        }
    }

    fn buckets_mut(&mut self, category: Category) -> &mut TypeBuckets {
        match category {
            Category::Resource => &mut self.resources,
            Category::DataSource => &mut self.data,
        }
    }

    /// Create a fresh resource under (category, type, normalized name),
    /// replacing whatever was stored there before.
    pub fn declare(
        &mut self,
        category: Category,
        type_name: &str,
        name: &str,
    ) -> Result<&mut Resource, UsageError> {
        if type_name.is_empty() {
            return Err(UsageError::MissingType);
        }
        if name.is_empty() {
            return Err(UsageError::MissingName {
                type_name: type_name.to_string(),
            });
        }

        let identity = InstanceReference::new(category, type_name, name);
        let key = identity.name().to_string();
        let policy = self.config.redeclare;

        let bucket = self
            .buckets_mut(category)
            .entry(type_name.to_string())
            .or_default();

        match bucket.entry(key) {
            Entry::Occupied(mut entry) => {
                tracing::debug!("Redeclared {} {}.{}, replacing", category, type_name, entry.key());
                if policy == RedeclarePolicy::Warn {
                    tracing::warn!(
                        "{} {}.{} declared more than once; the last declaration wins",
                        category,
                        type_name,
                        entry.key()
                    );
                }
                entry.insert(Resource::new(identity));
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                tracing::debug!("Declared {} {}.{}", category, type_name, entry.key());
                Ok(entry.insert(Resource::new(identity)))
            }
        }
    }

    /// Declare and fill in attributes within one scope. Returns a handle for
    /// referencing the resource afterwards.
    pub fn declare_with<F>(
        &mut self,
        category: Category,
        type_name: &str,
        name: &str,
        build: F,
    ) -> Result<InstanceReference>
    where
        F: FnOnce(&mut Resource) -> Result<()>,
    {
        let resource = self.declare(category, type_name, name)?;
        let handle = resource.handle();
        build(resource)?;
        Ok(handle)
    }

    pub fn resource<F>(&mut self, type_name: &str, name: &str, build: F) -> Result<InstanceReference>
    where
        F: FnOnce(&mut Resource) -> Result<()>,
    {
        self.declare_with(Category::Resource, type_name, name, build)
    }

    pub fn data<F>(&mut self, type_name: &str, name: &str, build: F) -> Result<InstanceReference>
    where
        F: FnOnce(&mut Resource) -> Result<()>,
    {
        self.declare_with(Category::DataSource, type_name, name, build)
    }

    pub fn namespace(&self, category: Category) -> NamespaceSelector {
        NamespaceSelector::new(category)
    }

    pub fn resources(&self) -> NamespaceSelector {
        self.namespace(Category::Resource)
    }

    pub fn data_sources(&self) -> NamespaceSelector {
        self.namespace(Category::DataSource)
    }

    pub fn get(&self, category: Category, type_name: &str, name: &str) -> Option<&Resource> {
        self.buckets(category)
            .get(type_name)?
            .get(&normalize_name(name))
    }

    /// Number of declarations in a category.
    pub fn len(&self, category: Category) -> usize {
        self.buckets(category).values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len(Category::Resource) == 0
            && self.len(Category::DataSource) == 0
            && self.sections.is_empty()
    }

    /// Sorted `type -> name -> resource` for a category.
    pub(crate) fn declared(&self, category: Category) -> &TypeBuckets {
        self.buckets(category)
    }

    /// Auxiliary sections in the order they were first touched.
    pub(crate) fn sections(&self) -> &[(String, Section)] {
        &self.sections
    }

    /// Mutable access to an auxiliary top-level section, created on first use.
    pub fn section_mut(&mut self, key: &str) -> Result<&mut Section, UsageError> {
        if key == Category::Resource.section_key() || key == Category::DataSource.section_key() {
            return Err(UsageError::ReservedSection(key.to_string()));
        }
        let idx = match self.sections.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.sections.push((key.to_string(), Section::default()));
                self.sections.len() - 1
            }
        };
        Ok(&mut self.sections[idx].1)
    }

    /// `output "<name>" { value = ... }`. Duplicate names overwrite.
    pub fn output(&mut self, name: &str, value: impl Into<Value>) -> Result<(), UsageError> {
        let outputs = self.section_mut(OUTPUT_SECTION)?;
        outputs.insert(name, json!({ "value": value.into() }));
        Ok(())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_normalizes_name() {
        let mut ctx = RunContext::new();
        ctx.declare(Category::Resource, "aws_s3_bucket", "my resource.v2")
            .unwrap()
            .set("bucket", "logs");
        let r = ctx
            .get(Category::Resource, "aws_s3_bucket", "my_resource_v2")
            .unwrap();
        assert_eq!(r.name(), "my_resource_v2");
        assert!(ctx
            .get(Category::Resource, "aws_s3_bucket", "my resource.v2")
            .is_some());
    }

    #[test]
    fn test_redeclare_overwrites_without_merge() {
        let mut ctx = RunContext::with_config(RunConfig {
            redeclare: RedeclarePolicy::Warn,
            ..RunConfig::default()
        });
        ctx.declare(Category::Resource, "aws_lb", "b")
            .unwrap()
            .set("internal", true);
        ctx.declare(Category::Resource, "aws_lb", "b")
            .unwrap()
            .set("idle_timeout", 30);

        let r = ctx.get(Category::Resource, "aws_lb", "b").unwrap();
        assert!(r.get("internal").is_none());
        assert_eq!(r.get("idle_timeout"), Some(&json!(30)));
        assert_eq!(ctx.len(Category::Resource), 1);
    }

    #[test]
    fn test_categories_are_separate() {
        let mut ctx = RunContext::new();
        ctx.declare(Category::DataSource, "aws_vpc", "main").unwrap();
        assert!(ctx.get(Category::Resource, "aws_vpc", "main").is_none());
        assert_eq!(ctx.len(Category::DataSource), 1);
        assert_eq!(ctx.len(Category::Resource), 0);
    }

    #[test]
    fn test_declare_requires_type_and_name() {
        let mut ctx = RunContext::new();
        assert_eq!(
            ctx.declare(Category::Resource, "", "main").unwrap_err(),
            UsageError::MissingType
        );
        assert_eq!(
            ctx.declare(Category::Resource, "aws_vpc", "").unwrap_err(),
            UsageError::MissingName {
                type_name: "aws_vpc".into()
            }
        );
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_declare_with_returns_handle() {
        let mut ctx = RunContext::new();
        let cert = ctx
            .data("aws_acm_certificate", "www.example.com", |c| {
                c.set("domain", "www.example.com")
                    .set("statuses", vec!["ISSUED"])
                    .set("most_recent", true);
                Ok(())
            })
            .unwrap();
        assert_eq!(
            cert.field("arn"),
            "${data.aws_acm_certificate.www_example_com.arn}"
        );
    }

    #[test]
    fn test_output_sections() {
        let mut ctx = RunContext::new();
        ctx.output("vpc_id", "${aws_vpc.main.id}").unwrap();
        ctx.output("alb_dns", "${aws_lb.b.dns_name}").unwrap();
        ctx.output("vpc_id", "${aws_vpc.other.id}").unwrap();
        let (key, outputs) = &ctx.sections()[0];
        assert_eq!(key, "output");
        assert_eq!(outputs.keys().collect::<Vec<_>>(), vec!["vpc_id", "alb_dns"]);
        assert_eq!(
            outputs.get("vpc_id"),
            Some(&json!({"value": "${aws_vpc.other.id}"}))
        );
    }

    #[test]
    fn test_reserved_sections() {
        let mut ctx = RunContext::new();
        assert_eq!(
            ctx.section_mut("resource").unwrap_err(),
            UsageError::ReservedSection("resource".into())
        );
        assert!(ctx.section_mut("locals").is_ok());
    }

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RunConfig::default());
        let config = RunConfig::from_json_str(r#"{"redeclare": "warn", "indent": 4}"#).unwrap();
        assert_eq!(config.redeclare, RedeclarePolicy::Warn);
        assert_eq!(config.indent, 4);
    }
}
