//! cbrest Core Library
//!
//! Request shapes for a document-store cluster's REST surface, including:
//! - Connection configuration
//! - REST endpoint paths
//! - Bucket settings with default/override merging
//! - Cluster bootstrap steps
//! - RBAC user payloads
//! - N1QL query requests and parameter binding

pub mod bucket;
pub mod cluster;
pub mod config;
pub mod endpoints;
pub mod query;
pub mod user;

// Re-export commonly used types
pub use bucket::{BucketSettings, SettingsError};
pub use cluster::{ClusterInitSettings, InitStep};
pub use config::ConnectionConfig;
pub use endpoints::Endpoint;
pub use query::{QueryParams, QueryRequest};
pub use user::UserSettings;

/// Form-encoded request body, in field order
pub type FormPayload = Vec<(String, String)>;
