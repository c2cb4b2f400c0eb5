use std::time::Duration;

use cbrest_core::{ConnectionConfig, Endpoint};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method, Request, Response, Url};
use serde_json::Value;

use crate::{ClientError, Result};

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Timeout for the liveness probe. Every other call uses the transport default.
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Request body of a dispatched call
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Empty,
    Form(&'a [(String, String)]),
    Json(&'a Value),
}

/// Cluster coordinates, credentials and the shared transport handle
#[derive(Debug, Clone)]
pub struct Connection {
    config: ConnectionConfig,
    admin_base_url: String,
    query_base_url: String,
    admin_base: Url,
    query_base: Url,
    http: HttpClient,
}

impl Connection {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let http = HttpClient::builder().build()?;
        Self::with_http_client(config, http)
    }

    /// Use a preconfigured transport, e.g. one with timeouts, custom TLS
    /// roots or proxy settings
    pub fn with_http_client(config: ConnectionConfig, http: HttpClient) -> Result<Self> {
        let admin_base_url = config.admin_base_url();
        let query_base_url = config.query_base_url();
        let admin_base = parse_base_url(&admin_base_url)?;
        let query_base = parse_base_url(&query_base_url)?;

        Ok(Self {
            config,
            admin_base_url,
            query_base_url,
            admin_base,
            query_base,
            http,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn admin_base_url(&self) -> &str {
        &self.admin_base_url
    }

    pub fn query_base_url(&self) -> &str {
        &self.query_base_url
    }

    /// Absolute URL of an endpoint on the admin/data port
    pub fn admin_url(&self, endpoint: &Endpoint) -> Url {
        join(&self.admin_base, endpoint)
    }

    /// Absolute URL of an endpoint on the query port
    pub fn query_url(&self, endpoint: &Endpoint) -> Url {
        join(&self.query_base, endpoint)
    }

    /// Whether the admin port answers HTTP at all.
    ///
    /// Sends an unauthenticated `GET /pools`; any response, including 4xx
    /// and 5xx, counts as reachable. Connection failures and timeouts yield
    /// `false`. Never errors.
    pub async fn is_connected(&self) -> bool {
        let url = self.admin_url(&Endpoint::pools());

        match self.http.get(url).timeout(LIVENESS_TIMEOUT).send().await {
            Ok(response) => {
                tracing::debug!(status = response.status().as_u16(), "Cluster reachable");
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Cluster unreachable");
                false
            }
        }
    }

    /// Build an authenticated request without sending it
    pub fn build_request(&self, method: Method, url: Url, payload: Payload<'_>) -> Result<Request> {
        let builder = self
            .http
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password));

        let builder = match payload {
            Payload::Empty => builder,
            Payload::Form(form) => builder.form(form),
            Payload::Json(body) => builder.json(body),
        };

        let mut request = builder.build()?;

        // reqwest's form encoder omits the charset
        if let Payload::Form(_) = payload {
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        }

        Ok(request)
    }

    /// Issue an authenticated call. Any non-2xx status becomes
    /// [`ClientError::Api`] carrying the response body verbatim.
    #[tracing::instrument(skip_all, fields(method = %method, url = %url))]
    pub async fn call(&self, method: Method, url: Url, payload: Payload<'_>) -> Result<Response> {
        let request = self.build_request(method, url, payload)?;
        let response = self.http.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Cluster rejected request");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "Request succeeded");
        Ok(response)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidBaseUrl(format!("{}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

fn join(base: &Url, endpoint: &Endpoint) -> Url {
    let mut url = base.clone();
    // Bases are checked by `parse_base_url`, so this always succeeds
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(endpoint.segments());
    }
    url
}
