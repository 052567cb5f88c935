//! ckanpub - Data Package to CKAN publishing
//!
//! Reads a local Data Package bundle (`datapackage.json` plus its tabular
//! resource), maps the descriptor onto a CKAN `package_patch` payload and
//! uploads the resource file to the catalog.
//!
//! # Architecture
//!
//! ```text
//! datapackage.json ──► descriptor::load_bundle ──► (Bundle, UploadObject)
//!                            │
//!                            └── extras::build_extras
//!                                        │
//!                                        ▼
//!                     publish::Publisher ──► catalog::CatalogBackend
//!                                              ├── package_show
//!                                              ├── package_patch
//!                                              └── resource_create / resource_update
//! ```

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod extras;
pub mod publish;
pub mod sources;
pub mod url;

pub use error::PublishError;
