//! Publishing error types with clear, actionable messages

use std::path::PathBuf;
use thiserror::Error;

use crate::descriptor::ValidationReport;

/// Errors raised while loading a bundle or talking to the catalog
///
/// Nothing in the workflow retries or suppresses these; every variant
/// aborts the run and surfaces to the caller.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The catalog base URL is not a well-formed http(s)/ftp(s) URL
    #[error("{0} isn't a valid url")]
    InvalidUrl(String),

    /// A local file (descriptor or resource) does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The descriptor is not valid JSON or does not fit the descriptor model
    #[error("Failed to parse descriptor {}", path.display())]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Any other local I/O failure
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A key required to build the upload object is absent
    #[error("Descriptor is missing required field '{0}'")]
    MissingField(String),

    /// The bundle failed structural validation
    #[error("Data package validation failed:\n{0}")]
    Validation(ValidationReport),

    /// `sources[0].name` has no entry in the source lookup table
    #[error("Unknown source '{0}'. Add it to the source lookup table or publish without --with-source")]
    UnknownSource(String),

    /// The catalog has no package with this name; packages are never created here
    #[error("Package '{0}' not found in the catalog.\n\nCreate the dataset in the catalog first, then publish again.")]
    PackageNotFound(String),

    /// A write against the catalog was attempted without an API key
    #[error("A CKAN API key is required to publish. Pass --ckanapikey or set CKANAPIKEY")]
    MissingApiKey,

    /// The request never produced a response
    #[error("Request to {action} failed")]
    Transport {
        action: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The catalog answered with a non-2xx status or an unsuccessful envelope
    #[error("CKAN {action} failed: HTTP {status} - {message}")]
    CatalogResponse {
        action: &'static str,
        status: u16,
        message: String,
    },
}

impl PublishError {
    /// Map an I/O error on `path` onto `NotFound` or `Io`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            PublishError::NotFound(path)
        } else {
            PublishError::Io { path, source }
        }
    }
}
