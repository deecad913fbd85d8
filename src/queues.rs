//! Per-NUMA-node page queue sampling from sysfs.

use crate::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;

/// Where the kernel exposes per-node memory statistics.
pub const DEFAULT_NODE_ROOT: &str = "/sys/devices/system/node";

/// One tick's worth of samples: node id -> named page counts. The BTreeMap
/// keeps domains in ascending id order for rendering.
pub type DomainMap = BTreeMap<u32, HashMap<String, u64>>;

/// Pull-based source reading `node<N>/vmstat` under a sysfs root.
///
/// The root is injectable so tests can point the reader at a fixture tree.
pub struct NodeQueues {
    root: PathBuf,
}

impl NodeQueues {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_NODE_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        NodeQueues { root: root.into() }
    }

    /// Sample every node directory once. Returns an empty map on systems
    /// exposing no `node<N>` entries.
    pub fn sample(&self) -> Result<DomainMap> {
        let mut domains = DomainMap::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(id) = name
                .to_string_lossy()
                .strip_prefix("node")
                .and_then(|rest| rest.parse::<u32>().ok())
            else {
                continue;
            };
            let content = fs::read_to_string(entry.path().join("vmstat"))?;
            domains.insert(id, Self::parse_vmstat(&content)?);
        }
        Ok(domains)
    }

    /// Parse a node vmstat file into the page queue counters the watcher
    /// displays. Values are page counts, not bytes.
    fn parse_vmstat(content: &str) -> Result<HashMap<String, u64>> {
        let mut counters = HashMap::new();
        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            let value = value
                .parse::<u64>()
                .map_err(|_| WatchError::ParseError(format!("Invalid number: {value}")))?;
            counters.insert(name.to_string(), value);
        }

        let get = |name: &str| -> Result<u64> {
            counters
                .get(name)
                .copied()
                .ok_or_else(|| WatchError::FieldNotFound(name.to_string()))
        };

        let mut queues = HashMap::new();
        queues.insert(
            "active".to_string(),
            get("nr_active_anon")? + get("nr_active_file")?,
        );
        queues.insert(
            "inactive".to_string(),
            get("nr_inactive_anon")? + get("nr_inactive_file")?,
        );
        queues.insert("free".to_string(), get("nr_free_pages")?);
        Ok(queues)
    }
}

impl Default for NodeQueues {
    fn default() -> Self {
        Self::new()
    }
}

/// A timestamped sample, serializable for one-shot JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub domains: DomainMap,
}

impl QueueSnapshot {
    pub fn take(source: &NodeQueues) -> Result<Self> {
        let domains = source.sample()?;
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Ok(QueueSnapshot { timestamp, domains })
    }
}
