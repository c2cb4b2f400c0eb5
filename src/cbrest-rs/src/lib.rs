//! cbrest Client Library
//!
//! Typed HTTP client for a document-store cluster's admin, data and
//! N1QL query REST services.

mod client;
mod connection;

pub use cbrest_core::{
    BucketSettings, ClusterInitSettings, ConnectionConfig, QueryParams, QueryRequest,
    UserSettings,
};
pub use client::Client;
pub use connection::{Connection, Payload};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bucket settings: {0}")]
    InvalidBucketField(#[from] cbrest_core::SettingsError),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
