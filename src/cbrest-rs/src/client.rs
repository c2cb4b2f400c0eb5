use std::path::Path;

use cbrest_core::{
    BucketSettings, ClusterInitSettings, ConnectionConfig, Endpoint, FormPayload, QueryRequest,
    UserSettings,
};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::connection::{Connection, Payload};
use crate::{ClientError, Result};

/// Cluster REST API Client
#[derive(Debug, Clone)]
pub struct Client {
    connection: Connection,
}

impl Client {
    /// Create a client for the given cluster coordinates
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        Ok(Self {
            connection: Connection::new(config)?,
        })
    }

    /// Create a client over a preconfigured `reqwest::Client`
    pub fn with_http_client(config: ConnectionConfig, http: reqwest::Client) -> Result<Self> {
        Ok(Self {
            connection: Connection::with_http_client(config, http)?,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Liveness check against the admin port
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Bootstrap a fresh node with the default settings
    pub async fn init_cluster(&self) -> Result<()> {
        self.init_cluster_with(&ClusterInitSettings::default()).await
    }

    /// Bootstrap a fresh node.
    ///
    /// Runs all four setup steps in order. A step the cluster rejects is
    /// logged and the remaining steps still run; transport failures abort.
    #[tracing::instrument(skip(self))]
    pub async fn init_cluster_with(&self, settings: &ClusterInitSettings) -> Result<()> {
        let config = self.connection.config();

        for step in settings.steps(&config.username, &config.password) {
            let url = self.connection.admin_url(&step.endpoint);
            match self
                .connection
                .call(Method::POST, url, Payload::Form(&step.form))
                .await
            {
                Ok(_) => tracing::debug!(step = step.name, "Cluster setup step applied"),
                Err(ClientError::Api { status, body }) => {
                    tracing::warn!(
                        step = step.name,
                        status,
                        body = %body,
                        "Cluster setup step rejected"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Create a bucket
    #[tracing::instrument(skip(self, settings), fields(bucket = %settings.name))]
    pub async fn create_bucket(&self, settings: &BucketSettings) -> Result<()> {
        let form = settings.to_form();
        self.admin_call(Method::POST, &Endpoint::buckets(), Payload::Form(&form))
            .await?;
        Ok(())
    }

    /// Get bucket information
    #[tracing::instrument(skip(self))]
    pub async fn get_bucket(&self, name: &str) -> Result<Value> {
        let response = self
            .admin_call(Method::GET, &Endpoint::bucket(name), Payload::Empty)
            .await?;
        Ok(response.json().await?)
    }

    /// Edit bucket parameters. Fields are passed through unchecked.
    #[tracing::instrument(skip(self, fields))]
    pub async fn edit_bucket<I, K, V>(&self, name: &str, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let form: FormPayload = fields
            .into_iter()
            .map(|(key, value)| (key.into(), value.to_string()))
            .collect();
        self.admin_call(Method::POST, &Endpoint::bucket(name), Payload::Form(&form))
            .await?;
        Ok(())
    }

    /// Delete a bucket
    #[tracing::instrument(skip(self))]
    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        self.admin_call(Method::DELETE, &Endpoint::bucket(name), Payload::Empty)
            .await?;
        Ok(())
    }

    /// List all buckets
    #[tracing::instrument(skip(self))]
    pub async fn list_buckets(&self) -> Result<Vec<Value>> {
        let response = self
            .admin_call(Method::GET, &Endpoint::buckets(), Payload::Empty)
            .await?;
        Ok(response.json().await?)
    }

    /// Create or replace a local RBAC user
    #[tracing::instrument(skip(self, user), fields(roles = ?user.roles))]
    pub async fn create_user(&self, user_id: &str, user: &UserSettings) -> Result<()> {
        let form = user.to_form();
        self.admin_call(Method::PUT, &Endpoint::local_user(user_id), Payload::Form(&form))
            .await?;
        Ok(())
    }

    /// Delete a local RBAC user
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.admin_call(Method::DELETE, &Endpoint::local_user(user_id), Payload::Empty)
            .await?;
        Ok(())
    }

    /// Get a document's JSON body, unwrapped from its `meta`/`json` envelope
    #[tracing::instrument(skip(self))]
    pub async fn get_document(&self, bucket: &str, key: &str) -> Result<Value> {
        let response = self
            .admin_call(Method::GET, &Endpoint::document(bucket, key), Payload::Empty)
            .await?;

        let mut envelope: Value = response.json().await?;
        envelope
            .get_mut("json")
            .map(Value::take)
            .ok_or_else(|| {
                ClientError::InvalidResponse("document envelope has no `json` field".to_string())
            })
    }

    /// Insert (or overwrite) a document
    #[tracing::instrument(skip(self, document))]
    pub async fn insert_document<T>(&self, bucket: &str, key: &str, document: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let form = vec![("value".to_string(), serde_json::to_string(document)?)];
        self.admin_call(Method::POST, &Endpoint::document(bucket, key), Payload::Form(&form))
            .await?;
        Ok(())
    }

    /// Read a JSON file and insert its contents as a document
    #[tracing::instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn insert_document_from_file(
        &self,
        bucket: &str,
        key: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let contents = tokio::fs::read_to_string(path.as_ref()).await?;
        let document: Value = serde_json::from_str(&contents)?;
        self.insert_document(bucket, key, &document).await
    }

    /// Remove every document from a bucket (flush must be enabled on it)
    #[tracing::instrument(skip(self))]
    pub async fn flush_bucket(&self, bucket: &str) -> Result<()> {
        self.admin_call(Method::POST, &Endpoint::flush(bucket), Payload::Empty)
            .await?;
        Ok(())
    }

    /// Execute a N1QL query and return its `results` rows.
    ///
    /// Any failure (rejected call, unreachable query service, malformed or
    /// incomplete response) yields `None`. Use [`Client::try_n1ql_query`] to
    /// see the error.
    pub async fn n1ql_query(&self, request: &QueryRequest) -> Option<Vec<Value>> {
        match self.try_n1ql_query(request).await {
            Ok(results) => Some(results),
            Err(e) => {
                tracing::debug!(error = %e, "N1QL query failed");
                None
            }
        }
    }

    /// Execute a N1QL query, surfacing failures
    #[tracing::instrument(skip(self, request), fields(statement = %request.statement))]
    pub async fn try_n1ql_query(&self, request: &QueryRequest) -> Result<Vec<Value>> {
        let body = request.to_body();
        let url = self.connection.query_url(&Endpoint::query_service());
        let response = self
            .connection
            .call(Method::POST, url, Payload::Json(&body))
            .await?;

        let mut response: Value = response.json().await?;
        let results = response
            .get_mut("results")
            .map(Value::take)
            .ok_or_else(|| {
                ClientError::InvalidResponse("query response has no `results` field".to_string())
            })?;

        Ok(serde_json::from_value(results)?)
    }

    async fn admin_call(
        &self,
        method: Method,
        endpoint: &Endpoint,
        payload: Payload<'_>,
    ) -> Result<reqwest::Response> {
        let url = self.connection.admin_url(endpoint);
        self.connection.call(method, url, payload).await
    }
}
