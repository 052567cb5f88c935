//! Publish workflow
//!
//! One linear pass per bundle:
//!
//! ```text
//! start ──► loaded ──► package id resolved ──► metadata patched ──► resource uploaded ──► done
//!             │
//!             └── dry run stops here
//! ```
//!
//! Any error aborts the pass. Nothing is rolled back: if the metadata patch
//! succeeds and the upload then fails, the catalog keeps the new metadata
//! next to the old file.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::catalog::{CatalogBackend, ResourceAction, ResourceUpload};
use crate::descriptor::load_bundle;
use crate::extras::{ExtrasFormat, UploadObject};
use crate::url::check_ckan_url;
use crate::PublishError;

/// One publish invocation
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Catalog base URL, checked before anything else happens
    pub ckan_url: String,
    /// Descriptor file or bundle directory
    pub bundle: PathBuf,
    /// Stop after loading; no catalog calls are made
    pub dry_run: bool,
}

/// Progress reported as each remote step completes
#[derive(Debug, Clone, PartialEq)]
pub enum PublishEvent {
    MetadataPatched {
        title: String,
    },
    ResourceUploaded {
        /// Resource path as written in the descriptor
        path: String,
        action: ResourceAction,
    },
}

/// How a publish pass ended
#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    /// Loaded and mapped, nothing sent
    DryRun { upload: UploadObject },
    Published {
        upload: UploadObject,
        resource_path: String,
        resource_action: ResourceAction,
    },
}

impl PublishOutcome {
    pub fn upload(&self) -> &UploadObject {
        match self {
            PublishOutcome::DryRun { upload } | PublishOutcome::Published { upload, .. } => upload,
        }
    }
}

/// Runs the publish workflow against a catalog backend
pub struct Publisher<C> {
    catalog: C,
    format: ExtrasFormat,
}

impl<C: CatalogBackend> Publisher<C> {
    pub fn new(catalog: C, format: ExtrasFormat) -> Self {
        Self { catalog, format }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Publish one bundle
    ///
    /// `on_event` is called after the metadata patch and after the upload,
    /// so a caller can report the first step even if the second one fails.
    pub async fn publish(
        &self,
        request: &PublishRequest,
        on_event: &mut dyn FnMut(PublishEvent),
    ) -> Result<PublishOutcome, PublishError> {
        if !check_ckan_url(&request.ckan_url) {
            return Err(PublishError::InvalidUrl(request.ckan_url.clone()));
        }

        let (bundle, mut upload) = load_bundle(&request.bundle, &self.format)?;
        info!(
            "Loaded '{}' from {}",
            upload.name,
            bundle.descriptor_path.display()
        );

        if request.dry_run {
            info!("Dry run: skipping catalog calls to {}", request.ckan_url);
            return Ok(PublishOutcome::DryRun { upload });
        }

        let resource_path = bundle.resource_path()?.to_string();
        let resource_file = bundle.resource_file()?;
        // fail before the catalog is touched, not after the metadata patch
        let metadata = tokio::fs::metadata(&resource_file)
            .await
            .map_err(|e| PublishError::from_io(&resource_file, e))?;
        if !metadata.is_file() {
            return Err(PublishError::NotFound(resource_file));
        }

        let package = self.catalog.show_package(&upload.name).await?;
        debug!(
            "Resolved package '{}' to id {} via {}",
            upload.name,
            package.id,
            self.catalog.name()
        );
        upload.id = Some(package.id.clone());

        self.catalog.patch_package(&upload).await?;
        on_event(PublishEvent::MetadataPatched {
            title: upload.title.clone(),
        });

        let resource = ResourceUpload {
            package_id: package.id.clone(),
            existing_resource_id: package.existing_resource_id().map(str::to_string),
            title: upload.title.clone(),
            file: resource_file,
        };
        let resource_action = self.catalog.create_or_update_resource(&resource).await?;
        on_event(PublishEvent::ResourceUploaded {
            path: resource_path.clone(),
            action: resource_action,
        });

        Ok(PublishOutcome::Published {
            upload,
            resource_path,
            resource_action,
        })
    }
}
