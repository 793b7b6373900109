use std::collections::HashMap;

use crate::container::ContainerID;
use crate::runtime::v1::ContainerStats;

/// Point-in-time stats of every container reported by the runtime.
pub type ContainerStatsSnapshot = HashMap<ContainerID, ContainerStats>;

/// Keys a `ListContainerStats` response by container id.
///
/// If the runtime reports the same id twice, the record that comes later in the
/// response wins. Ids are kept as reported. Records without attributes carry no id
/// and are skipped.
pub fn index_by_container_id(stats: Vec<ContainerStats>) -> ContainerStatsSnapshot {
    let mut out = HashMap::with_capacity(stats.len());
    for record in stats {
        let Some(attributes) = record.attributes.as_ref() else {
            log::warn!("skipping container stats record without attributes");
            continue;
        };
        out.insert(ContainerID::new(&attributes.id), record);
    }

    out
}
