//! Test helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ckanpub_core::catalog::{
    CatalogBackend, PackageInfo, ResourceAction, ResourceInfo, ResourceUpload,
};
use ckanpub_core::descriptor::DESCRIPTOR_FILE;
use ckanpub_core::extras::UploadObject;
use ckanpub_core::PublishError;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Mutex, Once};
use tempfile::TempDir;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// The `pop_by_town` descriptor used throughout the tests
pub fn pop_by_town_descriptor() -> Value {
    json!({
        "name": "pop_by_town",
        "title": "Population by Town",
        "description": "Population counts by town and gender",
        "author": {"name": "CTData Collaborative", "email": "info@ctdata.org"},
        "sources": [{"name": "uscensus", "web": ""}],
        "resources": [{
            "path": "data/pop_by_town.csv",
            "format": "csv",
            "schema": {"fields": [
                {"name": "Town", "type": "string", "dimension": false},
                {"name": "Gender", "type": "string", "dimension": true,
                 "constraints": {"enum": ["Male", "Female"]}},
                {"name": "Value", "type": "number", "dimension": false}
            ]}
        }],
        "ckan_extras": {
            "geography": {"ckan_name": "Geography", "value": "Town"},
            "years_in_catalog": {"value": [2015, 2016]},
            "default": {"value": "Total"}
        }
    })
}

pub const POP_BY_TOWN_CSV: &str = "Town,Gender,Value\nHartford,Male,60000\nHartford,Female,63000\n";

/// Write a bundle (descriptor plus its CSV) into a fresh temp directory
pub fn create_bundle(descriptor: &Value) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    write_bundle(dir.path(), descriptor);
    dir
}

pub fn write_bundle(root: &Path, descriptor: &Value) {
    std::fs::create_dir_all(root.join("data")).expect("data dir");
    std::fs::write(
        root.join(DESCRIPTOR_FILE),
        serde_json::to_string_pretty(descriptor).expect("descriptor json"),
    )
    .expect("write descriptor");
    std::fs::write(root.join("data/pop_by_town.csv"), POP_BY_TOWN_CSV).expect("write csv");
}

/// A call made against [`RecordingCatalog`]
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCall {
    ShowPackage(String),
    PatchPackage(UploadObject),
    UploadResource(ResourceUpload),
}

/// In-memory catalog that records every call
pub struct RecordingCatalog {
    /// Returned by `show_package`; `None` means the package does not exist
    pub package: Option<PackageInfo>,
    /// When set, `patch_package` fails with this HTTP status
    pub patch_status: Option<u16>,
    /// When set, the resource upload fails with this HTTP status
    pub upload_status: Option<u16>,
    pub calls: Mutex<Vec<CatalogCall>>,
}

impl RecordingCatalog {
    pub fn with_package(package: PackageInfo) -> Self {
        Self {
            package: Some(package),
            patch_status: None,
            upload_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A package with no resources yet
    pub fn empty_package(id: &str) -> Self {
        Self::with_package(PackageInfo {
            id: id.to_string(),
            name: Some("pop_by_town".to_string()),
            resources: vec![],
        })
    }

    /// A package whose first resource is `resource_id`
    pub fn package_with_resource(id: &str, resource_id: &str) -> Self {
        Self::with_package(PackageInfo {
            id: id.to_string(),
            name: Some("pop_by_town".to_string()),
            resources: vec![ResourceInfo {
                id: resource_id.to_string(),
                name: Some("Population by Town".to_string()),
            }],
        })
    }

    pub fn missing_package() -> Self {
        Self {
            package: None,
            patch_status: None,
            upload_status: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CatalogBackend for RecordingCatalog {
    async fn show_package(&self, name_or_id: &str) -> Result<PackageInfo, PublishError> {
        self.record(CatalogCall::ShowPackage(name_or_id.to_string()));
        self.package
            .clone()
            .ok_or_else(|| PublishError::PackageNotFound(name_or_id.to_string()))
    }

    async fn patch_package(&self, upload: &UploadObject) -> Result<(), PublishError> {
        self.record(CatalogCall::PatchPackage(upload.clone()));
        match self.patch_status {
            Some(status) => Err(PublishError::CatalogResponse {
                action: "package_patch",
                status,
                message: "rejected by test catalog".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn create_or_update_resource(
        &self,
        upload: &ResourceUpload,
    ) -> Result<ResourceAction, PublishError> {
        self.record(CatalogCall::UploadResource(upload.clone()));
        if let Some(status) = self.upload_status {
            return Err(PublishError::CatalogResponse {
                action: "resource_upload",
                status,
                message: "rejected by test catalog".to_string(),
            });
        }
        Ok(if upload.existing_resource_id.is_some() {
            ResourceAction::Updated
        } else {
            ResourceAction::Created
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
