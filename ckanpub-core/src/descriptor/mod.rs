//! Data Package descriptor model and loading
//!
//! A bundle is a directory holding a `datapackage.json` descriptor and
//! the tabular resource files it references by relative path.
//!
//! ```text
//! pop_by_town/
//! ├── datapackage.json
//! └── data/
//!     └── pop_by_town.csv
//! ```

mod loader;
mod validation;

pub use loader::{load_bundle, Bundle, DESCRIPTOR_FILE};
pub use validation::{validate, ValidationIssue, ValidationReport};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The parsed `datapackage.json` descriptor
///
/// Only the keys the publisher reads are modelled. Everything here is
/// optional at the type level; the loader and the extras mapper report
/// missing keys as [`crate::PublishError::MissingField`] so the message
/// names the exact path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<Author>,

    #[serde(default)]
    pub sources: Vec<Source>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    /// Catalog-specific metadata, in document order
    #[serde(default)]
    pub ckan_extras: IndexMap<String, CkanExtra>,
}

/// Dataset author, published as the CKAN maintainer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// Provenance record; `name` doubles as the CKAN owner organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub web: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Path relative to the bundle root
    ///
    /// Only single-file resources are supported; a multi-part (array) path
    /// fails the typed parse with `InvalidDescriptor`.
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub schema: Option<TableSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// A column in a resource's table schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    /// Categorical breakdown axis (gender, age group, ...) rather than a measure
    #[serde(default)]
    pub dimension: bool,

    #[serde(default)]
    pub constraints: Option<Constraints>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default, rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

/// One entry of `ckan_extras`
///
/// Plain entries carry a display `ckan_name` and a scalar `value`; the
/// structured keys (`years_in_catalog`, `default`, ...) only need `value`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CkanExtra {
    #[serde(default)]
    pub ckan_name: Option<String>,

    /// `None` when the key is absent; an explicit `null` is `Some(Value::Null)`
    #[serde(default, deserialize_with = "present_value")]
    pub value: Option<Value>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Descriptor {
    /// The first resource, which is the one that gets uploaded
    pub fn primary_resource(&self) -> Option<&Resource> {
        self.resources.first()
    }

    /// `sources[0].name`, the organization code
    pub fn source_code(&self) -> Option<&str> {
        self.sources.first().and_then(|s| s.name.as_deref())
    }
}
