use serde::{Deserialize, Serialize};

/// Coordinates and credentials of the target cluster
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,

    /// Port serving administrative and data calls
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,

    /// Port serving the N1QL query service
    #[serde(default = "default_query_port")]
    pub query_port: u16,

    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_admin_port() -> u16 {
    8091
}

fn default_query_port() -> u16 {
    8093
}

fn default_username() -> String {
    "Administrator".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

impl ConnectionConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ConnectionConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// `scheme://host:admin_port`
    pub fn admin_base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.admin_port)
    }

    /// `scheme://host:query_port`
    pub fn query_base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.query_port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            admin_port: default_admin_port(),
            query_port: default_query_port(),
            username: default_username(),
            password: default_password(),
        }
    }
}
