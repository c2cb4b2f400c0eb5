//! REST paths of the cluster's admin and query services
//!
//! Paths are kept as raw segments so the client can percent-encode caller
//! supplied names (bucket names, document keys, user ids) when joining them
//! onto a base URL.

use std::fmt;

/// A REST path relative to a service's base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
}

impl Endpoint {
    fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// GET /pools
    pub fn pools() -> Self {
        Self::from_segments(["pools"])
    }

    /// POST /pools/default
    pub fn default_pool() -> Self {
        Self::from_segments(["pools", "default"])
    }

    /// POST /node/controller/setupServices
    pub fn setup_services() -> Self {
        Self::from_segments(["node", "controller", "setupServices"])
    }

    /// POST /settings/web
    pub fn web_settings() -> Self {
        Self::from_segments(["settings", "web"])
    }

    /// POST /settings/indexes
    pub fn index_settings() -> Self {
        Self::from_segments(["settings", "indexes"])
    }

    /// /pools/default/buckets
    pub fn buckets() -> Self {
        Self::from_segments(["pools", "default", "buckets"])
    }

    /// /pools/default/buckets/{name}
    pub fn bucket(name: &str) -> Self {
        let mut endpoint = Self::buckets();
        endpoint.segments.push(name.to_string());
        endpoint
    }

    /// /pools/default/buckets/{bucket}/docs/{key}
    pub fn document(bucket: &str, key: &str) -> Self {
        let mut endpoint = Self::bucket(bucket);
        endpoint.segments.push("docs".to_string());
        endpoint.segments.push(key.to_string());
        endpoint
    }

    /// /pools/default/buckets/{bucket}/controller/doFlush
    pub fn flush(bucket: &str) -> Self {
        let mut endpoint = Self::bucket(bucket);
        endpoint.segments.push("controller".to_string());
        endpoint.segments.push("doFlush".to_string());
        endpoint
    }

    /// /settings/rbac/users/local/{id}
    pub fn local_user(id: &str) -> Self {
        Self::from_segments(["settings", "rbac", "users", "local", id])
    }

    /// POST /query/service (query port)
    pub fn query_service() -> Self {
        Self::from_segments(["query", "service"])
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
