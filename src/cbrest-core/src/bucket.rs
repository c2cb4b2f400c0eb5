//! Bucket creation settings
//!
//! A bucket is created from a fixed default record (RAM quota, SASL auth,
//! couchbase bucket type, proxy port) that callers can override or extend
//! with any other parameter the bucket REST API accepts.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::FormPayload;

pub const DEFAULT_RAM_QUOTA_MB: u64 = 256;
pub const DEFAULT_PROXY_PORT: u16 = 11216;
pub const DEFAULT_AUTH_TYPE: &str = "sasl";
pub const DEFAULT_BUCKET_TYPE: &str = "couchbase";

/// Form fields accepted by `POST /pools/default/buckets` (Server 7.6 / 8.0)
pub const BUCKET_FIELDS: &[&str] = &[
    "name",
    "ramQuotaMB",
    "authType",
    "saslPassword",
    "bucketType",
    "proxyPort",
    "replicaNumber",
    "replicaIndex",
    "threadsNumber",
    "flushEnabled",
    "evictionPolicy",
    "conflictResolutionType",
    "maxTTL",
    "compressionMode",
    "storageBackend",
    "durabilityMinLevel",
    "parallelDBAndViewCompaction",
    "autoCompactionDefined",
    "purgeInterval",
    "databaseFragmentationThreshold[percentage]",
    "databaseFragmentationThreshold[size]",
    "viewFragmentationThreshold[percentage]",
    "viewFragmentationThreshold[size]",
    "magmaFragmentationPercentage",
    "allowedTimePeriod[fromHour]",
    "allowedTimePeriod[fromMinute]",
    "allowedTimePeriod[toHour]",
    "allowedTimePeriod[toMinute]",
    "allowedTimePeriod[abortOutstanding]",
    "numVBuckets",
    "storageQuotaPercentage",
    "rank",
    "historyRetentionCollectionDefault",
    "historyRetentionBytes",
    "historyRetentionSeconds",
    "magmaKeyTreeDataBlockSize",
    "magmaSeqTreeDataBlockSize",
    "durabilityImpossibleFallback",
    "warmupBehavior",
    "memoryLowWatermark",
    "memoryHighWatermark",
    "enableCrossClusterVersioning",
    "versionPruningWindowHrs",
    "accessScannerEnabled",
    "expiryPagerSleepTime",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Unknown bucket field: {0}")]
    UnknownField(String),
}

/// Settings for a new bucket: the default record plus validated overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSettings {
    pub name: String,
    pub sasl_password: String,
    pub ram_quota_mb: u64,
    pub proxy_port: u16,
    overrides: BTreeMap<String, String>,
}

impl BucketSettings {
    pub fn new(name: impl Into<String>, sasl_password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sasl_password: sasl_password.into(),
            ram_quota_mb: DEFAULT_RAM_QUOTA_MB,
            proxy_port: DEFAULT_PROXY_PORT,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_ram_quota_mb(mut self, ram_quota_mb: u64) -> Self {
        self.ram_quota_mb = ram_quota_mb;
        self
    }

    pub fn with_proxy_port(mut self, proxy_port: u16) -> Self {
        self.proxy_port = proxy_port;
        self
    }

    /// Apply extra REST fields. A field sharing a name with a default
    /// replaces it; unknown names are rejected and leave `self` untouched.
    pub fn with_overrides<I, K, V>(mut self, fields: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        let mut staged = Vec::new();
        for (key, value) in fields {
            let key = key.into();
            if !BUCKET_FIELDS.contains(&key.as_str()) {
                return Err(SettingsError::UnknownField(key));
            }
            staged.push((key, value.to_string()));
        }
        self.overrides.extend(staged);
        Ok(self)
    }

    pub fn overrides(&self) -> &BTreeMap<String, String> {
        &self.overrides
    }

    /// The outgoing form: defaults first, then any remaining overrides
    pub fn to_form(&self) -> FormPayload {
        let defaults = [
            ("name", self.name.clone()),
            ("ramQuotaMB", self.ram_quota_mb.to_string()),
            ("authType", DEFAULT_AUTH_TYPE.to_string()),
            ("saslPassword", self.sasl_password.clone()),
            ("bucketType", DEFAULT_BUCKET_TYPE.to_string()),
            ("proxyPort", self.proxy_port.to_string()),
        ];

        let mut form: FormPayload = defaults
            .iter()
            .map(|(key, value)| {
                let value = self.overrides.get(*key).unwrap_or(value);
                (key.to_string(), value.clone())
            })
            .collect();

        for (key, value) in &self.overrides {
            if !defaults.iter().any(|(default_key, _)| *default_key == key.as_str()) {
                form.push((key.clone(), value.clone()));
            }
        }

        form
    }
}
