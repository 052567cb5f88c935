//! Structural validation against the legacy Tabular Data Package profile
//!
//! Each rule inspects the raw descriptor JSON and reports the offending
//! instance together with its JSON pointer. The loader decides what to do
//! with the report; this module never tolerates anything on its own.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// Package and resource names: lowercase alphanumerics plus `-._/`
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-a-z0-9._/]+$").expect("name pattern is valid"));

/// A single profile violation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// Identifier of the rule that fired
    pub rule_id: &'static str,
    /// JSON pointer to the offending instance (`""` is the whole descriptor)
    pub pointer: String,
    /// The offending instance itself
    pub instance: Value,
    /// Human-readable description
    pub message: String,
}

/// All violations found in one descriptor, in rule order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// True when exactly one issue was reported and its instance equals `instance`
    ///
    /// Comparison is structural (`serde_json::Value` equality), so the
    /// same content at a different location in the document also matches.
    pub fn is_only_instance(&self, instance: Option<&Value>) -> bool {
        match (self.issues.as_slice(), instance) {
            ([issue], Some(expected)) => &issue.instance == expected,
            _ => false,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            let pointer = if issue.pointer.is_empty() {
                "/"
            } else {
                issue.pointer.as_str()
            };
            writeln!(f, "  [{}] {}: {}", issue.rule_id, pointer, issue.message)?;
        }
        Ok(())
    }
}

/// A profile rule over the raw descriptor
trait ProfileRule: Send + Sync {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>);
}

fn issue(
    rule_id: &'static str,
    pointer: impl Into<String>,
    instance: &Value,
    message: impl Into<String>,
) -> ValidationIssue {
    ValidationIssue {
        rule_id,
        pointer: pointer.into(),
        instance: instance.clone(),
        message: message.into(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `name` must be a slug
struct PackageNameRule;

impl ProfileRule for PackageNameRule {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>) {
        let Some(name) = descriptor.get("name") else {
            return;
        };
        match name.as_str() {
            Some(s) if NAME_PATTERN.is_match(s) => {}
            Some(s) => issues.push(issue(
                "package-name",
                "/name",
                name,
                format!("'{s}' does not match {}", NAME_PATTERN.as_str()),
            )),
            None => issues.push(issue(
                "package-name",
                "/name",
                name,
                format!("expected string, found {}", type_name(name)),
            )),
        }
    }
}

/// Free-text properties must be strings
struct StringPropertiesRule;

const STRING_PROPERTIES: &[&str] = &["title", "description", "homepage", "version"];

impl ProfileRule for StringPropertiesRule {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>) {
        for key in STRING_PROPERTIES {
            if let Some(value) = descriptor.get(*key) {
                if !value.is_string() {
                    issues.push(issue(
                        "string-property",
                        format!("/{key}"),
                        value,
                        format!("expected string, found {}", type_name(value)),
                    ));
                }
            }
        }
    }
}

/// `author` uses the profile's person string (`"Name <email>"`)
///
/// Catalog bundles carry an object with `name` and `email` instead, which
/// this rule reports every time.
struct AuthorRule;

impl ProfileRule for AuthorRule {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>) {
        if let Some(author) = descriptor.get("author") {
            if !author.is_string() {
                issues.push(issue(
                    "author",
                    "/author",
                    author,
                    format!("expected person string, found {}", type_name(author)),
                ));
            }
        }
    }
}

/// Lists of named records
struct RecordListRule;

const RECORD_LISTS: &[(&str, &[&str])] = &[
    ("sources", &["name"]),
    ("contributors", &["name"]),
    ("licenses", &["name", "id"]),
];

impl ProfileRule for RecordListRule {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>) {
        for (key, name_keys) in RECORD_LISTS {
            let Some(list) = descriptor.get(*key) else {
                continue;
            };
            let Some(entries) = list.as_array() else {
                issues.push(issue(
                    "record-list",
                    format!("/{key}"),
                    list,
                    format!("expected array, found {}", type_name(list)),
                ));
                continue;
            };
            for (i, entry) in entries.iter().enumerate() {
                let named = entry.as_object().is_some_and(|obj| {
                    name_keys
                        .iter()
                        .any(|k| obj.get(*k).is_some_and(Value::is_string))
                });
                if !named {
                    issues.push(issue(
                        "record-list",
                        format!("/{key}/{i}"),
                        entry,
                        format!("expected object with a string '{}'", name_keys.join("' or '")),
                    ));
                }
            }
        }
    }
}

struct KeywordsRule;

impl ProfileRule for KeywordsRule {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>) {
        let Some(keywords) = descriptor.get("keywords") else {
            return;
        };
        let all_strings = keywords
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !all_strings {
            issues.push(issue(
                "keywords",
                "/keywords",
                keywords,
                "expected array of strings",
            ));
        }
    }
}

/// `resources` is required, non-empty, and every resource is tabular
struct ResourcesRule;

impl ResourcesRule {
    fn check_resource(&self, i: usize, resource: &Value, issues: &mut Vec<ValidationIssue>) {
        let pointer = format!("/resources/{i}");
        let Some(obj) = resource.as_object() else {
            issues.push(issue(
                "resource",
                pointer,
                resource,
                format!("expected object, found {}", type_name(resource)),
            ));
            return;
        };

        // multi-part paths are not publishable; the upload takes one file
        match obj.get("path") {
            Some(Value::String(_)) => {}
            Some(other) => issues.push(issue(
                "resource-path",
                format!("{pointer}/path"),
                other,
                format!("expected a single file path, found {}", type_name(other)),
            )),
            None if obj.contains_key("data") => {}
            None => issues.push(issue(
                "resource-path",
                pointer.clone(),
                resource,
                "resource needs a 'path' or inline 'data'",
            )),
        }

        if let Some(name) = obj.get("name") {
            if !name.as_str().is_some_and(|s| NAME_PATTERN.is_match(s)) {
                issues.push(issue(
                    "resource-name",
                    format!("{pointer}/name"),
                    name,
                    format!("expected string matching {}", NAME_PATTERN.as_str()),
                ));
            }
        }

        let Some(schema) = obj.get("schema") else {
            issues.push(issue(
                "table-schema",
                pointer,
                resource,
                "tabular resource needs a 'schema'",
            ));
            return;
        };
        let Some(fields) = schema.get("fields").and_then(Value::as_array) else {
            issues.push(issue(
                "table-schema",
                format!("{pointer}/schema"),
                schema,
                "schema needs a 'fields' array",
            ));
            return;
        };
        for (j, field) in fields.iter().enumerate() {
            self.check_field(&format!("{pointer}/schema/fields/{j}"), field, issues);
        }
    }

    fn check_field(&self, pointer: &str, field: &Value, issues: &mut Vec<ValidationIssue>) {
        if !field.get("name").is_some_and(Value::is_string) {
            issues.push(issue(
                "field",
                pointer,
                field,
                "field needs a string 'name'",
            ));
            return;
        }
        if let Some(dimension) = field.get("dimension") {
            if !dimension.is_boolean() {
                issues.push(issue(
                    "field",
                    format!("{pointer}/dimension"),
                    dimension,
                    format!("expected boolean, found {}", type_name(dimension)),
                ));
            }
        }
        if let Some(constraints) = field.get("constraints") {
            if !constraints.is_object() {
                issues.push(issue(
                    "field-constraints",
                    format!("{pointer}/constraints"),
                    constraints,
                    format!("expected object, found {}", type_name(constraints)),
                ));
            } else if let Some(values) = constraints.get("enum") {
                if !values.is_array() {
                    issues.push(issue(
                        "field-constraints",
                        format!("{pointer}/constraints/enum"),
                        values,
                        format!("expected array, found {}", type_name(values)),
                    ));
                }
            }
        }
    }
}

impl ProfileRule for ResourcesRule {
    fn check(&self, descriptor: &Value, issues: &mut Vec<ValidationIssue>) {
        match descriptor.get("resources") {
            None => issues.push(issue(
                "resources",
                "",
                descriptor,
                "'resources' is a required property",
            )),
            Some(Value::Array(resources)) if resources.is_empty() => issues.push(issue(
                "resources",
                "/resources",
                &Value::Array(vec![]),
                "at least one resource is required",
            )),
            Some(Value::Array(resources)) => {
                for (i, resource) in resources.iter().enumerate() {
                    self.check_resource(i, resource, issues);
                }
            }
            Some(other) => issues.push(issue(
                "resources",
                "/resources",
                other,
                format!("expected array, found {}", type_name(other)),
            )),
        }
    }
}

/// Validate a raw descriptor against the profile
///
/// Returns every violation found; an empty report is `Ok`.
pub fn validate(descriptor: &Value) -> Result<(), ValidationReport> {
    if !descriptor.is_object() {
        return Err(ValidationReport {
            issues: vec![issue(
                "descriptor",
                "",
                descriptor,
                format!("expected object, found {}", type_name(descriptor)),
            )],
        });
    }

    let rules: [&dyn ProfileRule; 6] = [
        &PackageNameRule,
        &StringPropertiesRule,
        &AuthorRule,
        &RecordListRule,
        &KeywordsRule,
        &ResourcesRule,
    ];

    let mut report = ValidationReport::default();
    for rule in rules {
        rule.check(descriptor, &mut report.issues);
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}
