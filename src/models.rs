//! Serializable views of a stats snapshot.
use std::collections::HashMap;

use crate::container::ContainerID;
use crate::cri::ContainerStatsSnapshot;
use crate::runtime::v1::{ContainerStats, UInt64Value};

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct ContainerStatsSummary {
    pub container_id: ContainerID,
    pub name: Option<String>,
    pub labels: HashMap<String, String>,
    pub cpu_timestamp: Option<i64>,
    pub cpu_usage_core_nano_seconds: Option<u64>,
    pub cpu_usage_nano_cores: Option<u64>,
    pub memory_timestamp: Option<i64>,
    pub memory_working_set_bytes: Option<u64>,
    pub memory_available_bytes: Option<u64>,
    pub memory_usage_bytes: Option<u64>,
    pub memory_rss_bytes: Option<u64>,
    pub memory_page_faults: Option<u64>,
    pub memory_major_page_faults: Option<u64>,
    pub writable_layer_mountpoint: Option<String>,
    pub writable_layer_used_bytes: Option<u64>,
    pub writable_layer_inodes_used: Option<u64>,
}

fn value(v: &Option<UInt64Value>) -> Option<u64> {
    v.as_ref().map(|v| v.value)
}

impl ContainerStatsSummary {
    pub fn new(container_id: ContainerID, stats: &ContainerStats) -> Self {
        let attributes = stats.attributes.as_ref();
        let cpu = stats.cpu.as_ref();
        let memory = stats.memory.as_ref();
        let layer = stats.writable_layer.as_ref();
        Self {
            container_id,
            name: attributes
                .and_then(|a| a.metadata.as_ref())
                .map(|m| m.name.clone()),
            labels: attributes.map(|a| a.labels.clone()).unwrap_or_default(),
            cpu_timestamp: cpu.map(|c| c.timestamp),
            cpu_usage_core_nano_seconds: cpu.and_then(|c| value(&c.usage_core_nano_seconds)),
            cpu_usage_nano_cores: cpu.and_then(|c| value(&c.usage_nano_cores)),
            memory_timestamp: memory.map(|m| m.timestamp),
            memory_working_set_bytes: memory.and_then(|m| value(&m.working_set_bytes)),
            memory_available_bytes: memory.and_then(|m| value(&m.available_bytes)),
            memory_usage_bytes: memory.and_then(|m| value(&m.usage_bytes)),
            memory_rss_bytes: memory.and_then(|m| value(&m.rss_bytes)),
            memory_page_faults: memory.and_then(|m| value(&m.page_faults)),
            memory_major_page_faults: memory.and_then(|m| value(&m.major_page_faults)),
            writable_layer_mountpoint: layer
                .and_then(|l| l.fs_id.as_ref())
                .map(|fs| fs.mountpoint.clone()),
            writable_layer_used_bytes: layer.and_then(|l| value(&l.used_bytes)),
            writable_layer_inodes_used: layer.and_then(|l| value(&l.inodes_used)),
        }
    }
}

/// One line of the `cri-stats` output.
#[derive(Debug, serde::Serialize)]
pub struct SnapshotReport {
    /// Seconds since the unix epoch at which the snapshot was taken.
    pub timestamp: u64,
    pub runtime_name: Option<String>,
    pub runtime_version: Option<String>,
    /// Sorted by container id.
    pub containers: Vec<ContainerStatsSummary>,
}

impl SnapshotReport {
    pub fn new(
        timestamp: u64,
        runtime_name: Option<&str>,
        runtime_version: Option<&str>,
        snapshot: &ContainerStatsSnapshot,
    ) -> Self {
        let mut containers: Vec<_> = snapshot
            .iter()
            .map(|(id, stats)| ContainerStatsSummary::new(id.clone(), stats))
            .collect();
        containers.sort_by(|a, b| a.container_id.cmp(&b.container_id));

        Self {
            timestamp,
            runtime_name: runtime_name.map(str::to_owned),
            runtime_version: runtime_version.map(str::to_owned),
            containers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::v1::{
        ContainerAttributes, ContainerMetadata, FilesystemIdentifier, FilesystemUsage,
        MemoryUsage,
    };

    fn stats() -> ContainerStats {
        ContainerStats {
            attributes: Some(ContainerAttributes {
                id: "c1".to_owned(),
                metadata: Some(ContainerMetadata {
                    name: "nginx".to_owned(),
                    attempt: 0,
                }),
                labels: HashMap::from([("app".to_owned(), "web".to_owned())]),
                annotations: HashMap::default(),
            }),
            cpu: None,
            memory: Some(MemoryUsage {
                timestamp: 42,
                working_set_bytes: Some(UInt64Value { value: 1024 }),
                ..Default::default()
            }),
            writable_layer: Some(FilesystemUsage {
                timestamp: 42,
                fs_id: Some(FilesystemIdentifier {
                    mountpoint: "/var/lib/containerd".to_owned(),
                }),
                used_bytes: Some(UInt64Value { value: 4096 }),
                inodes_used: None,
            }),
        }
    }

    #[test]
    fn test_summary_flattens_present_fields() {
        let summary = ContainerStatsSummary::new(ContainerID::new("c1"), &stats());
        assert_eq!(summary.name.as_deref(), Some("nginx"));
        assert_eq!(summary.labels.get("app").map(String::as_str), Some("web"));
        assert_eq!(summary.cpu_timestamp, None);
        assert_eq!(summary.cpu_usage_core_nano_seconds, None);
        assert_eq!(summary.memory_timestamp, Some(42));
        assert_eq!(summary.memory_working_set_bytes, Some(1024));
        assert_eq!(summary.memory_usage_bytes, None);
        assert_eq!(
            summary.writable_layer_mountpoint.as_deref(),
            Some("/var/lib/containerd")
        );
        assert_eq!(summary.writable_layer_used_bytes, Some(4096));
    }

    #[test]
    fn test_report_is_sorted_and_serializable() {
        let mut snapshot = ContainerStatsSnapshot::new();
        for id in ["c3", "c1", "c2"] {
            snapshot.insert(ContainerID::new(id), stats());
        }

        let report = SnapshotReport::new(7, Some("containerd"), Some("v2.0.4"), &snapshot);
        let ids: Vec<_> = report
            .containers
            .iter()
            .map(|c| c.container_id.as_str())
            .collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["timestamp"], 7);
        assert_eq!(json["runtime_name"], "containerd");
        assert_eq!(json["containers"][0]["container_id"], "c1");
        assert_eq!(json["containers"][0]["memory_working_set_bytes"], 1024);
        assert!(json["containers"][0]["cpu_usage_nano_cores"].is_null());
    }
}
