use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ReplicateError;

/// Protocol name whose prefix the replication pipelines use.
pub const XROOTD_PROTOCOL: &str = "XRootD";

#[derive(Debug, Clone, Deserialize)]
struct ProtocolEntry {
    protocol: String,
    prefix: String,
}

// storage.json is an array of site records; only the first record's
// protocol table is relevant here.
#[derive(Debug, Clone, Deserialize)]
struct StorageRecord {
    protocols: Vec<ProtocolEntry>,
}

/// A storage site's endpoint description: a read-only mapping from protocol
/// name to URI prefix, loaded once per run and immutable afterwards.
#[derive(Debug, Clone)]
pub struct SiteEndpoint {
    pub name: String,
    protocols: HashMap<String, String>,
}

impl SiteEndpoint {
    /// Load `<siteconf_dir>/<name>/storage.json` and build the protocol map.
    pub fn load(siteconf_dir: &Path, name: &str) -> Result<Self, ReplicateError> {
        let path = siteconf_dir.join(name).join("storage.json");
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ReplicateError::UnsupportedSite(
                name.to_string(),
                format!("cannot read {}: {}", path.display(), e),
            )
        })?;
        let records: Vec<StorageRecord> = serde_json::from_str(&content).map_err(|e| {
            ReplicateError::UnsupportedSite(
                name.to_string(),
                format!("malformed {}: {}", path.display(), e),
            )
        })?;
        let first = records.into_iter().next().ok_or_else(|| {
            ReplicateError::UnsupportedSite(name.to_string(), "empty storage.json".to_string())
        })?;
        let protocols =
            first.protocols.into_iter().map(|p| (p.protocol, p.prefix)).collect();
        Ok(Self { name: name.to_string(), protocols })
    }

    pub fn prefix(&self, protocol: &str) -> Result<&str, ReplicateError> {
        self.protocols.get(protocol).map(String::as_str).ok_or_else(|| {
            ReplicateError::UnsupportedSite(
                self.name.clone(),
                format!("no '{}' protocol in storage.json", protocol),
            )
        })
    }

    pub fn xrootd_prefix(&self) -> Result<&str, ReplicateError> {
        self.prefix(XROOTD_PROTOCOL)
    }
}
