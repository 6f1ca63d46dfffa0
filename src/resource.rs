//! Resource - open-ended attribute builder
//!
//! There is no schema. Any attribute name can be set, and any attribute name
//! can be turned into a reference to this resource.

use serde::ser::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Result, UsageError};
use crate::reference::{Category, InstanceReference, MemberCall, ReferenceToken};

/// One declared resource or data source.
///
/// Attributes keep insertion order. Identity (category, type, name) is held
/// by the enclosing registry keys and never shows up in the serialized form.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    identity: InstanceReference,
    attributes: Map<String, Value>,
}

impl Resource {
    pub(crate) fn new(identity: InstanceReference) -> Self {
        Self {
            identity,
            attributes: Map::new(),
        }
    }

    pub fn category(&self) -> Category {
        self.identity.category()
    }

    pub fn type_name(&self) -> &str {
        self.identity.type_name()
    }

    /// Normalized name.
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// Store `value` under `name`. Setting an existing attribute replaces
    /// the value and keeps its position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Like [`Resource::set`] for anything serde can turn into JSON.
    pub fn set_serialized<T: serde::Serialize>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.set(name, value))
    }

    /// Token pointing at `field` of this resource.
    pub fn reference(&self, field: &str) -> ReferenceToken {
        self.identity.field(field)
    }

    /// Detached handle usable after the declaring scope ends.
    pub fn handle(&self) -> InstanceReference {
        self.identity.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Arity dispatch: no argument yields a self-reference, one argument sets
    /// the attribute. A callback or more than one argument is misuse.
    pub fn dispatch(&mut self, call: &MemberCall) -> Result<Option<ReferenceToken>, UsageError> {
        if call.callback {
            return Err(UsageError::CallbackArgument {
                member: call.member.clone(),
            });
        }
        match call.args.as_slice() {
            [] => Ok(Some(self.reference(&call.member))),
            [value] => {
                self.set(call.member.as_str(), value.clone());
                Ok(None)
            }
            args => Err(UsageError::TooManyArguments {
                member: call.member.clone(),
                count: args.len(),
            }),
        }
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lb() -> Resource {
        Resource::new(InstanceReference::new(
            Category::Resource,
            "aws_lb",
            "backend_alb_b",
        ))
    }

    #[test]
    fn test_set_keeps_insertion_order() {
        let mut r = lb();
        r.set("name", "prod-backend-alb-b")
            .set("internal", true)
            .set("idle_timeout", 30);
        let s = serde_json::to_string(&r).unwrap();
        assert_eq!(
            s,
            r#"{"name":"prod-backend-alb-b","internal":true,"idle_timeout":30}"#
        );
    }

    #[test]
    fn test_reset_replaces_in_place() {
        let mut r = lb();
        r.set("a", 1).set("b", 2).set("a", 3);
        let s = serde_json::to_string(&r).unwrap();
        assert_eq!(s, r#"{"a":3,"b":2}"#);
    }

    #[test]
    fn test_identity_not_serialized() {
        let r = lb();
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({}));
    }

    #[test]
    fn test_self_reference() {
        let r = lb();
        assert_eq!(r.reference("dns_name"), "${aws_lb.backend_alb_b.dns_name}");
    }

    #[test]
    fn test_dispatch_by_arity() {
        let mut r = lb();
        let token = r.dispatch(&MemberCall::new("arn")).unwrap();
        assert_eq!(token.unwrap(), "${aws_lb.backend_alb_b.arn}");

        assert_eq!(r.dispatch(&MemberCall::new("internal").arg(true)).unwrap(), None);
        assert_eq!(r.get("internal"), Some(&json!(true)));

        let err = r
            .dispatch(&MemberCall::new("subnets").arg("a").arg("b"))
            .unwrap_err();
        assert_eq!(
            err,
            UsageError::TooManyArguments {
                member: "subnets".into(),
                count: 2
            }
        );
        assert!(r.get("subnets").is_none());

        let err = r
            .dispatch(&MemberCall::new("tags").arg(json!({})).with_callback())
            .unwrap_err();
        assert!(matches!(err, UsageError::CallbackArgument { .. }));
    }

    #[test]
    fn test_nested_mapping_keeps_written_order() {
        let mut r = lb();
        r.set(
            "health_check",
            json!({"matcher": "200", "healthy_threshold": 2, "path": "/manage/health"}),
        );
        assert_eq!(
            serde_json::to_string(&r).unwrap(),
            r#"{"health_check":{"matcher":"200","healthy_threshold":2,"path":"/manage/health"}}"#
        );
    }

    #[test]
    fn test_set_serialized_nested() {
        #[derive(serde::Serialize)]
        struct HealthCheck {
            path: &'static str,
            interval: u32,
        }
        let mut r = lb();
        r.set_serialized(
            "health_check",
            &HealthCheck {
                path: "/manage/health",
                interval: 10,
            },
        )
        .unwrap();
        assert_eq!(
            r.get("health_check"),
            Some(&json!({"interval": 10, "path": "/manage/health"}))
        );
    }
}
