//! CKAN action API backend
//!
//! Talks to `{base}/api/action/<action>` and unwraps CKAN's
//! `{"success": .., "result": .., "error": ..}` envelope.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{CatalogBackend, PackageInfo, ResourceAction, ResourceInfo, ResourceUpload};
use crate::config::HttpConfig;
use crate::extras::UploadObject;
use crate::PublishError;

/// Value sent as a resource's `url`
///
/// CKAN derives the real download URL from the uploaded file, so the
/// declared URL is never dereferenced.
pub const RESOURCE_URL_PLACEHOLDER: &str = "dummy-value";

/// `error.__type` CKAN uses for unknown packages
const NOT_FOUND_ERROR: &str = "Not Found Error";

#[derive(Debug, Deserialize)]
struct CkanEnvelope<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    error: Option<CkanApiError>,
}

#[derive(Debug, Deserialize)]
struct CkanApiError {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl CkanApiError {
    fn is_not_found(&self) -> bool {
        self.kind.as_deref() == Some(NOT_FOUND_ERROR)
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.message) {
            (Some(kind), Some(message)) => format!("{kind}: {message}"),
            (Some(kind), None) => kind.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "unknown error".to_string(),
        }
    }
}

/// CKAN catalog client
pub struct CkanClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CkanClient {
    /// Create a client for the catalog at `base_url`
    ///
    /// No request is made here; the URL is only checked by the workflow.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        config: &HttpConfig,
    ) -> Result<Self, PublishError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder.build().map_err(|source| PublishError::Transport {
            action: "client setup",
            source,
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/api/action/{}", self.base_url, action)
    }

    fn require_api_key(&self) -> Result<&str, PublishError> {
        self.api_key.as_deref().ok_or(PublishError::MissingApiKey)
    }

    /// Unwrap a CKAN envelope
    ///
    /// When `package` is set, a 404 or a "Not Found Error" envelope maps to
    /// [`PublishError::PackageNotFound`] for that name.
    async fn read_result<T: DeserializeOwned>(
        action: &'static str,
        response: Response,
        package: Option<&str>,
    ) -> Result<T, PublishError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| PublishError::Transport { action, source })?;
        let envelope = serde_json::from_str::<CkanEnvelope<T>>(&body).ok();

        let not_found = status == StatusCode::NOT_FOUND
            || envelope
                .as_ref()
                .and_then(|e| e.error.as_ref())
                .is_some_and(CkanApiError::is_not_found);
        if let (true, Some(name)) = (not_found, package) {
            return Err(PublishError::PackageNotFound(name.to_string()));
        }

        match envelope {
            Some(CkanEnvelope {
                success: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Some(envelope) => Err(PublishError::CatalogResponse {
                action,
                status: status.as_u16(),
                message: envelope
                    .error
                    .map(|e| e.describe())
                    .unwrap_or_else(|| "response carried no result".to_string()),
            }),
            None => Err(PublishError::CatalogResponse {
                action,
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            }),
        }
    }
}

#[async_trait]
impl CatalogBackend for CkanClient {
    async fn show_package(&self, name_or_id: &str) -> Result<PackageInfo, PublishError> {
        let url = self.action_url("package_show");
        debug!("GET {} (id={})", url, name_or_id);

        let mut request = self.client.get(&url).query(&[("id", name_or_id)]);
        if let Some(key) = &self.api_key {
            request = request.header(AUTHORIZATION, key.as_str());
        }
        let response = request
            .send()
            .await
            .map_err(|source| PublishError::Transport {
                action: "package_show",
                source,
            })?;

        Self::read_result("package_show", response, Some(name_or_id)).await
    }

    async fn patch_package(&self, upload: &UploadObject) -> Result<(), PublishError> {
        let api_key = self.require_api_key()?;
        let url = self.action_url("package_patch");
        debug!("POST {} (package {})", url, upload.name);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, api_key)
            .json(upload)
            .send()
            .await
            .map_err(|source| PublishError::Transport {
                action: "package_patch",
                source,
            })?;

        let _: serde_json::Value = Self::read_result("package_patch", response, None).await?;
        info!("Patched metadata for '{}'", upload.name);
        Ok(())
    }

    async fn create_or_update_resource(
        &self,
        upload: &ResourceUpload,
    ) -> Result<ResourceAction, PublishError> {
        let api_key = self.require_api_key()?;

        let (action, id_field, id, outcome) = match &upload.existing_resource_id {
            Some(id) => ("resource_update", "id", id.clone(), ResourceAction::Updated),
            None => (
                "resource_create",
                "package_id",
                upload.package_id.clone(),
                ResourceAction::Created,
            ),
        };

        // The handle moves into the request body and is closed when the
        // request finishes, whatever the outcome.
        let file = tokio::fs::File::open(&upload.file)
            .await
            .map_err(|e| PublishError::from_io(&upload.file, e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| PublishError::from_io(&upload.file, e))?
            .len();
        let file_name = upload
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let form = Form::new()
            .text(id_field, id)
            .text("url", RESOURCE_URL_PLACEHOLDER)
            .text("name", upload.title.clone())
            .part(
                "upload",
                Part::stream_with_length(file, length).file_name(file_name),
            );

        let url = self.action_url(action);
        debug!("POST {} ({} bytes from {})", url, length, upload.file.display());

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|source| PublishError::Transport { action, source })?;

        let resource: ResourceInfo = Self::read_result(action, response, None).await?;
        info!("Resource {} {} for package {}", resource.id, outcome, upload.package_id);
        Ok(outcome)
    }

    fn name(&self) -> &'static str {
        "ckan"
    }
}
