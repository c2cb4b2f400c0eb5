use serde::{Deserialize, Serialize};

use crate::{Endpoint, FormPayload};

/// Single-node cluster bootstrap settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClusterInitSettings {
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Data service RAM quota for the default pool
    #[serde(default = "default_memory_quota_mb")]
    pub memory_quota_mb: u64,

    /// GSI storage mode, needed before index queries can run
    #[serde(default = "default_index_storage_mode")]
    pub index_storage_mode: String,
}

fn default_services() -> Vec<String> {
    vec!["kv".to_string(), "n1ql".to_string(), "index".to_string()]
}

fn default_memory_quota_mb() -> u64 {
    1024
}

fn default_index_storage_mode() -> String {
    "forestdb".to_string()
}

impl Default for ClusterInitSettings {
    fn default() -> Self {
        Self {
            services: default_services(),
            memory_quota_mb: default_memory_quota_mb(),
            index_storage_mode: default_index_storage_mode(),
        }
    }
}

/// One POST of the bootstrap sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitStep {
    pub name: &'static str,
    pub endpoint: Endpoint,
    pub form: FormPayload,
}

impl ClusterInitSettings {
    /// The four setup calls, in the order the cluster expects them.
    /// `username`/`password` become the cluster's administrator credentials.
    pub fn steps(&self, username: &str, password: &str) -> Vec<InitStep> {
        vec![
            InitStep {
                name: "services",
                endpoint: Endpoint::setup_services(),
                form: vec![("services".to_string(), self.services.join(","))],
            },
            InitStep {
                name: "memory_quota",
                endpoint: Endpoint::default_pool(),
                form: vec![("memoryQuota".to_string(), self.memory_quota_mb.to_string())],
            },
            InitStep {
                name: "credentials",
                endpoint: Endpoint::web_settings(),
                form: vec![
                    ("username".to_string(), username.to_string()),
                    ("password".to_string(), password.to_string()),
                    ("port".to_string(), "SAME".to_string()),
                ],
            },
            InitStep {
                name: "index_storage_mode",
                endpoint: Endpoint::index_settings(),
                form: vec![("storageMode".to_string(), self.index_storage_mode.clone())],
            },
        ]
    }
}
