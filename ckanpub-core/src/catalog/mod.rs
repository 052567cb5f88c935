//! Catalog backends
//!
//! The publish workflow only needs three remote operations. They sit
//! behind [`CatalogBackend`] so the workflow can run against CKAN or
//! against an in-memory double in tests.

mod ckan;

pub use ckan::{CkanClient, RESOURCE_URL_PLACEHOLDER};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::extras::UploadObject;
use crate::PublishError;

/// The subset of a CKAN package the publisher reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceInfo>,
}

impl PackageInfo {
    /// Id of the file slot the upload should overwrite, if the package has one
    ///
    /// An empty id counts as no slot.
    pub fn existing_resource_id(&self) -> Option<&str> {
        self.resources
            .first()
            .map(|r| r.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// Arguments for [`CatalogBackend::create_or_update_resource`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUpload {
    pub package_id: String,
    /// Update this resource in place; `None` creates a new one
    pub existing_resource_id: Option<String>,
    /// Display name of the resource
    pub title: String,
    /// Local file streamed as the resource content
    pub file: PathBuf,
}

/// Which path `create_or_update_resource` took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceAction {
    Created,
    Updated,
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAction::Created => f.write_str("created"),
            ResourceAction::Updated => f.write_str("updated"),
        }
    }
}

/// Remote catalog operations used by the publish workflow
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Look up a package by name or id
    ///
    /// Fails with [`PublishError::PackageNotFound`] when the catalog has no
    /// such package.
    async fn show_package(&self, name_or_id: &str) -> Result<PackageInfo, PublishError>;

    /// Send the full upload object (with `id` resolved) as a package patch
    async fn patch_package(&self, upload: &UploadObject) -> Result<(), PublishError>;

    /// Upload the file, replacing `existing_resource_id` when present
    async fn create_or_update_resource(
        &self,
        upload: &ResourceUpload,
    ) -> Result<ResourceAction, PublishError>;

    /// Backend identifier for logging/debugging
    fn name(&self) -> &'static str;
}
