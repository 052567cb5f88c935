//! Descriptor -> CKAN package payload
//!
//! Builds the `package_patch` body, including the ordered list of
//! key/value extras the catalog renders on the dataset page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{CkanExtra, Descriptor};
use crate::sources::lookup_source;
use crate::PublishError;

/// `ckan_extras` keys that get dedicated handling instead of a direct entry
pub const EXCLUDED_EXTRAS: &[&str] = &["years_in_catalog", "expected_number_of_geographies", "default"];

/// Default join delimiter for years and dimension values
pub const DEFAULT_DELIMITER: &str = ";";

/// A CKAN package extra
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
    pub key: String,
    pub value: Value,
}

impl Extra {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// How list-valued extras are rendered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrasFormat {
    /// Joins `years_in_catalog` and dimension enum values
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Emit a `Source` extra resolved through the source lookup table
    #[serde(default)]
    pub include_source: bool,
}

impl Default for ExtrasFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            include_source: false,
        }
    }
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Body of the `package_patch` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadObject {
    pub name: String,
    pub title: String,
    pub maintainer: String,
    pub maintainer_email: String,
    pub owner_org: String,

    /// Catalog package id, set once the package has been looked up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub extras: Vec<Extra>,
}

impl UploadObject {
    /// Copy the package-level fields out of a descriptor
    ///
    /// Extras are left empty; see [`build_extras`].
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Self, PublishError> {
        let author = descriptor.author.as_ref();
        Ok(Self {
            name: required(descriptor.name.as_deref(), "name")?,
            title: required(descriptor.title.as_deref(), "title")?,
            maintainer: required(author.and_then(|a| a.name.as_deref()), "author.name")?,
            maintainer_email: required(author.and_then(|a| a.email.as_deref()), "author.email")?,
            owner_org: required(descriptor.source_code(), "sources[0].name")?,
            id: None,
            extras: Vec::new(),
        })
    }
}

fn required(value: Option<&str>, field: &str) -> Result<String, PublishError> {
    value
        .map(str::to_string)
        .ok_or_else(|| PublishError::MissingField(field.to_string()))
}

fn special_extra<'a>(descriptor: &'a Descriptor, key: &str) -> Result<&'a Value, PublishError> {
    descriptor
        .ckan_extras
        .get(key)
        .and_then(|e| e.value.as_ref())
        .ok_or_else(|| PublishError::MissingField(format!("ckan_extras.{key}")))
}

/// Strings are used verbatim, everything else as its JSON text
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_values(values: &[Value], delimiter: &str) -> String {
    values.iter().map(as_text).collect::<Vec<_>>().join(delimiter)
}

fn direct_extra(key: &str, entry: &CkanExtra) -> Result<Extra, PublishError> {
    let ckan_name = entry
        .ckan_name
        .clone()
        .ok_or_else(|| PublishError::MissingField(format!("ckan_extras.{key}.ckan_name")))?;
    let value = entry
        .value
        .clone()
        .ok_or_else(|| PublishError::MissingField(format!("ckan_extras.{key}.value")))?;
    Ok(Extra {
        key: ckan_name,
        value,
    })
}

/// Build the ordered extras list for a descriptor
///
/// Order: direct `ckan_extras` entries (document order), `Description`,
/// `Default`, optionally `Source`, `Years in Catalog`, then one entry per
/// dimension field of the first resource.
pub fn build_extras(
    descriptor: &Descriptor,
    format: &ExtrasFormat,
) -> Result<Vec<Extra>, PublishError> {
    let mut extras = descriptor
        .ckan_extras
        .iter()
        .filter(|(key, _)| !EXCLUDED_EXTRAS.contains(&key.as_str()))
        .map(|(key, entry)| direct_extra(key, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let description = descriptor
        .description
        .clone()
        .ok_or_else(|| PublishError::MissingField("description".to_string()))?;
    extras.push(Extra::new("Description", description));

    let default = special_extra(descriptor, "default")?;
    extras.push(Extra::new("Default", default.to_string()));

    if format.include_source {
        let code = descriptor
            .source_code()
            .ok_or_else(|| PublishError::MissingField("sources[0].name".to_string()))?;
        extras.push(Extra::new("Source", lookup_source(code)?));
    }

    let years = match special_extra(descriptor, "years_in_catalog")? {
        Value::Array(years) => join_values(years, &format.delimiter),
        single => as_text(single),
    };
    extras.push(Extra::new("Years in Catalog", years));

    special_extra(descriptor, "geography")?;

    let fields = descriptor
        .primary_resource()
        .and_then(|r| r.schema.as_ref())
        .map(|s| s.fields.as_slice())
        .ok_or_else(|| PublishError::MissingField("resources[0].schema".to_string()))?;

    for (i, field) in fields.iter().enumerate() {
        if !field.dimension {
            continue;
        }
        let values = field
            .constraints
            .as_ref()
            .and_then(|c| c.enum_values.as_deref())
            .ok_or_else(|| {
                PublishError::MissingField(format!(
                    "resources[0].schema.fields[{i}].constraints.enum"
                ))
            })?;
        extras.push(Extra::new(
            field.name.clone(),
            join_values(values, &format.delimiter),
        ));
    }

    Ok(extras)
}
