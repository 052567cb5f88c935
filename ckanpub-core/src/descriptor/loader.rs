//! Bundle loading: descriptor file -> (Bundle, UploadObject)

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{validate, Descriptor};
use crate::extras::{build_extras, ExtrasFormat, UploadObject};
use crate::PublishError;

/// Conventional descriptor file name inside a bundle directory
pub const DESCRIPTOR_FILE: &str = "datapackage.json";

/// A loaded bundle
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Path of the descriptor file that was read
    pub descriptor_path: PathBuf,
    /// Directory holding the descriptor; resource paths are relative to it
    pub root: PathBuf,
    pub descriptor: Descriptor,
}

impl Bundle {
    /// Path of the resource that gets uploaded, as written in the descriptor
    pub fn resource_path(&self) -> Result<&str, PublishError> {
        self.descriptor
            .primary_resource()
            .and_then(|r| r.path.as_deref())
            .ok_or_else(|| PublishError::MissingField("resources[0].path".to_string()))
    }

    /// Local file backing the uploaded resource
    pub fn resource_file(&self) -> Result<PathBuf, PublishError> {
        Ok(self.root.join(self.resource_path()?))
    }
}

/// Load and validate a bundle, and derive its catalog upload object
///
/// `path` may point at the descriptor file or at the bundle directory.
pub fn load_bundle(
    path: &Path,
    format: &ExtrasFormat,
) -> Result<(Bundle, UploadObject), PublishError> {
    let descriptor_path = if path.is_dir() {
        path.join(DESCRIPTOR_FILE)
    } else {
        path.to_path_buf()
    };

    let content = std::fs::read_to_string(&descriptor_path)
        .map_err(|e| PublishError::from_io(&descriptor_path, e))?;
    let raw: Value =
        serde_json::from_str(&content).map_err(|source| PublishError::InvalidDescriptor {
            path: descriptor_path.clone(),
            source,
        })?;
    let descriptor: Descriptor =
        serde_json::from_value(raw.clone()).map_err(|source| PublishError::InvalidDescriptor {
            path: descriptor_path.clone(),
            source,
        })?;

    let mut upload = UploadObject::from_descriptor(&descriptor)?;

    match validate(&raw) {
        Ok(()) => {}
        Err(report) if report.is_only_instance(raw.get("author")) => {
            debug!(
                "Ignoring validation issue on the author object of {}:\n{}",
                descriptor_path.display(),
                report
            );
        }
        Err(report) => return Err(PublishError::Validation(report)),
    }

    upload.extras = build_extras(&descriptor, format)?;

    let root = descriptor_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    debug!(
        "Loaded bundle '{}' from {} ({} extras)",
        upload.name,
        descriptor_path.display(),
        upload.extras.len()
    );

    Ok((
        Bundle {
            descriptor_path,
            root,
            descriptor,
        },
        upload,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_bundle(descriptor: &Value) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(DESCRIPTOR_FILE),
            serde_json::to_string_pretty(descriptor).unwrap(),
        )
        .unwrap();
        dir
    }

    fn descriptor() -> Value {
        json!({
            "name": "pop_by_town",
            "title": "Population by Town",
            "description": "Population counts by town",
            "author": {"name": "CTData Collaborative", "email": "info@ctdata.org"},
            "sources": [{"name": "uscensus", "web": ""}],
            "resources": [{
                "path": "data/pop_by_town.csv",
                "schema": {"fields": [
                    {"name": "Town", "dimension": false},
                    {"name": "Gender", "dimension": true,
                     "constraints": {"enum": ["Male", "Female"]}}
                ]}
            }],
            "ckan_extras": {
                "geography": {"ckan_name": "Geography", "value": "Town"},
                "years_in_catalog": {"value": [2015, 2016]},
                "default": {"value": "Total"}
            }
        })
    }

    #[test]
    fn test_load_from_directory_and_file() {
        let dir = write_bundle(&descriptor());

        let (bundle, upload) = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap();
        assert_eq!(bundle.root, dir.path());
        assert_eq!(upload.name, "pop_by_town");
        assert_eq!(upload.maintainer, "CTData Collaborative");
        assert_eq!(upload.maintainer_email, "info@ctdata.org");
        assert_eq!(upload.owner_org, "uscensus");
        assert!(upload.id.is_none());
        assert_eq!(
            bundle.resource_file().unwrap(),
            dir.path().join("data/pop_by_town.csv")
        );

        let (bundle, _) = load_bundle(
            &dir.path().join(DESCRIPTOR_FILE),
            &ExtrasFormat::default(),
        )
        .unwrap();
        assert_eq!(bundle.root, dir.path());
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_bundle(&dir.path().join("nope.json"), &ExtrasFormat::default()).unwrap_err();
        assert!(matches!(err, PublishError::NotFound(_)));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR_FILE), "{ not json").unwrap();
        let err = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap_err();
        assert!(matches!(err, PublishError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_missing_required_fields() {
        for (pointer, expected) in [
            ("/name", "name"),
            ("/title", "title"),
            ("/author/name", "author.name"),
            ("/author/email", "author.email"),
        ] {
            let mut d = descriptor();
            let (parent, key) = pointer.rsplit_once('/').unwrap();
            d.pointer_mut(parent)
                .unwrap()
                .as_object_mut()
                .unwrap()
                .remove(key);
            let dir = write_bundle(&d);

            let err = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap_err();
            assert!(
                matches!(err, PublishError::MissingField(ref f) if f == expected),
                "expected MissingField({expected}), got {err:?}"
            );
        }
    }

    #[test]
    fn test_multi_part_resource_path_is_invalid() {
        let mut d = descriptor();
        d["resources"][0]["path"] = json!(["data/part1.csv", "data/part2.csv"]);
        let dir = write_bundle(&d);

        let err = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap_err();
        assert!(matches!(err, PublishError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_empty_sources_is_missing_field() {
        let mut d = descriptor();
        d["sources"] = json!([]);
        let dir = write_bundle(&d);

        let err = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap_err();
        assert!(matches!(err, PublishError::MissingField(ref f) if f == "sources[0].name"));
    }

    #[test]
    fn test_non_author_validation_failure_aborts() {
        let mut d = descriptor();
        d["name"] = json!("Population By Town");
        let dir = write_bundle(&d);

        let err = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap_err();
        let report = match err {
            PublishError::Validation(report) => report,
            other => panic!("expected validation error, got {other:?}"),
        };
        // the author issue is still reported alongside the real one
        assert_eq!(report.issues.len(), 2);
    }

    #[test]
    fn test_extras_errors_propagate() {
        let mut d = descriptor();
        d["ckan_extras"].as_object_mut().unwrap().remove("geography");
        let dir = write_bundle(&d);

        let err = load_bundle(dir.path(), &ExtrasFormat::default()).unwrap_err();
        assert!(matches!(err, PublishError::MissingField(ref f) if f == "ckan_extras.geography"));
    }
}
