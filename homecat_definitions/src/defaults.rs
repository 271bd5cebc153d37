use merge::Merge;

use super::identity::canonical_name;
use super::structs::{CompanionOverrides, CompanionSpec, KindDefaults, WorkloadOverrides};
use super::WorkloadSpec;

/// Where the per-app config directory appears inside a container
pub const DEFAULT_CONFIG_MOUNT_PATH: &str = "/config";
/// Host device handed to hardware passthrough workloads
pub const DEFAULT_DEVICE_PATH: &str = "/dev/ttyACM0";

/// Fill in every optional field a workload left unset
///
/// Pure: the input is untouched and the result is a new spec in which every
/// fallback is explicit. Caller values always win, including an explicit `false`.
/// Applying this to its own output changes nothing.
pub fn apply_defaults(spec: &WorkloadSpec) -> WorkloadSpec {
    let table = spec.kind.defaults();
    let name = canonical_name(&spec.name);
    let overrides = workload_fallbacks(spec, table, &name).merge(spec.overrides.clone());

    let config_mount_path = overrides
        .config_mount_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_MOUNT_PATH.into());
    let companions = spec
        .companions
        .iter()
        .map(|c| CompanionSpec {
            overrides: companion_fallbacks(c, table, &config_mount_path).merge(c.overrides.clone()),
            ..c.clone()
        })
        .collect();

    trace!("defaulted {} as {:?}", name, spec.kind);
    WorkloadSpec {
        overrides,
        companions,
        ..spec.clone()
    }
}

fn workload_fallbacks(spec: &WorkloadSpec, table: &KindDefaults, name: &str) -> WorkloadOverrides {
    let volumes = spec
        .overrides
        .volumes
        .clone()
        .unwrap_or_else(|| table.default_volumes());
    let probe_enabled = spec
        .overrides
        .liveness_probe_enabled
        .unwrap_or_else(|| table.probe_enabled());

    WorkloadOverrides {
        image: table.image_for(name),
        device_path: if volumes.iter().any(|r| r == "device") {
            Some(DEFAULT_DEVICE_PATH.into())
        } else {
            None
        },
        volumes: Some(volumes),
        config_mount_path: Some(DEFAULT_CONFIG_MOUNT_PATH.into()),
        data_mount_path: table.data_mount_path.map(String::from),
        files_mount_path: if spec.config_files.is_empty() {
            None
        } else {
            Some(format!("/etc/{}", name))
        },
        liveness_probe_enabled: Some(probe_enabled),
        liveness_probe: if probe_enabled {
            table.probe.probe(spec.port)
        } else {
            None
        },
        exposure_enabled: Some(table.exposure),
        host_network: Some(table.host_network),
    }
}

fn companion_fallbacks(
    c: &CompanionSpec,
    table: &KindDefaults,
    mount_path: &str,
) -> CompanionOverrides {
    let probe_enabled = c
        .overrides
        .liveness_probe_enabled
        .unwrap_or_else(|| table.probe_enabled());
    CompanionOverrides {
        image: table.image_for(&canonical_name(&c.name)),
        mount_path: Some(mount_path.into()),
        liveness_probe_enabled: Some(probe_enabled),
        liveness_probe: if probe_enabled {
            table.probe.probe(c.port)
        } else {
            None
        },
        exposure_enabled: Some(table.exposure),
    }
}
