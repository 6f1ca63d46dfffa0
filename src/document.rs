//! Document - the rendered JSON tree
//!
//! Key order is fixed: `data`, `resource`, then auxiliary sections in the
//! order they were declared. Types and names are sorted, so identical
//! content renders to identical bytes whatever the declaration order.

use std::io;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::error::Result;
use crate::hashing::sha256_hex;
use crate::reference::Category;
use crate::registry::{RunContext, Section, TypeBuckets};

/// Category keys in output order.
const CATEGORY_ORDER: [Category; 2] = [Category::DataSource, Category::Resource];

pub struct Document<'a> {
    categories: Vec<(&'static str, &'a TypeBuckets)>,
    sections: &'a [(String, Section)],
    indent: usize,
}

impl<'a> Document<'a> {
    pub fn from_context(ctx: &'a RunContext) -> Self {
        let categories = CATEGORY_ORDER
            .iter()
            .map(|c| (c.section_key(), ctx.declared(*c)))
            .filter(|(_, buckets)| buckets.values().any(|names| !names.is_empty()))
            .collect();

        Self {
            categories,
            sections: ctx.sections(),
            indent: ctx.config().indent,
        }
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_json_string(&self) -> Result<String> {
        let indent = vec![b' '; self.indent];
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(
            &mut buf,
            PrettyFormatter::with_indent(&indent),
        );
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// SHA-256 of the rendered text.
    pub fn digest(&self) -> Result<String> {
        let text = self.to_json_string()?;
        Ok(sha256_hex(text.as_bytes()))
    }
}

/// `type -> name -> attributes`, skipping type buckets that never received
/// a declaration.
struct Buckets<'a>(&'a TypeBuckets);

impl Serialize for Buckets<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (type_name, names) in self.0.iter().filter(|(_, names)| !names.is_empty()) {
            map.serialize_entry(type_name, names)?;
        }
        map.end()
    }
}

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len() + self.sections.len()))?;
        for (key, buckets) in &self.categories {
            map.serialize_entry(key, &Buckets(buckets))?;
        }
        for (key, section) in self.sections {
            map.serialize_entry(key, section)?;
        }
        map.end()
    }
}
