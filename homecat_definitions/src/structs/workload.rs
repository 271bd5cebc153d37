use std::collections::BTreeMap;

use super::{EnvVar, Environment, Probe, WorkloadKind};

/// Declarative description of one workload, deserialized from `homecat.yml`
///
/// ```yaml
/// - name: sonarr
///   port: 8989
/// - name: valheim
///   kind: gameserver
///   image: lloesche/valheim-server
///   dataMountPath: /opt/valheim
///   env:
///   - name: SERVER_NAME
///     value: Dedicated
/// ```
///
/// Never mutated once handed to the assembler; `apply_defaults` returns a new value.
/// Deserialized through `WorkloadSource`, so unknown keys are rejected.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "WorkloadSource", rename_all = "camelCase")]
pub struct WorkloadSpec {
    /// Application name, lower-cased into the canonical name
    pub name: String,
    pub kind: WorkloadKind,

    /// Primary port: probed, exposed, and opened on the container
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Env vars, appended after any identity vars, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// Extra annotations for the Ingress, merged over the defaults
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub ingress_annotations: BTreeMap<String, String>,

    /// Inline config files, shipped as a ConfigMap and mounted file by file
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub config_files: BTreeMap<String, String>,

    /// Further containers in the same pod
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub companions: Vec<CompanionSpec>,

    /// Injected by the caller from the process-wide config
    pub environment: Environment,

    // Below are fields that have fallbacks; add any new ones to defaults.rs
    #[serde(flatten)]
    pub overrides: WorkloadOverrides,
}

/// The optional half of a `WorkloadSpec`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Merge)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkloadOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Volume roles: storage, config, timezone, device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,
    /// Create a Service and Ingress for the primary port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_network: Option<bool>,
}

/// A further container sharing the workload's pod, volumes and identity
///
/// Its config directory is isolated by its own canonical name.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "CompanionSource", rename_all = "camelCase")]
pub struct CompanionSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    #[serde(flatten)]
    pub overrides: CompanionOverrides,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Merge)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanionOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Where this container sees its config sub-directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<Probe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exposure_enabled: Option<bool>,
}

/// Flat, strict shape of a workload entry in `homecat.yml`
///
/// `flatten` cannot be combined with `deny_unknown_fields`,
/// so entries are read in this shape and split afterwards.
#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct WorkloadSource {
    name: String,
    kind: WorkloadKind,
    port: Option<u16>,
    env: Vec<EnvVar>,
    ingress_annotations: BTreeMap<String, String>,
    config_files: BTreeMap<String, String>,
    companions: Vec<CompanionSpec>,

    image: Option<String>,
    volumes: Option<Vec<String>>,
    config_mount_path: Option<String>,
    data_mount_path: Option<String>,
    files_mount_path: Option<String>,
    device_path: Option<String>,
    liveness_probe_enabled: Option<bool>,
    liveness_probe: Option<Probe>,
    exposure_enabled: Option<bool>,
    host_network: Option<bool>,
}

impl From<WorkloadSource> for WorkloadSpec {
    fn from(src: WorkloadSource) -> Self {
        WorkloadSpec {
            name: src.name,
            kind: src.kind,
            port: src.port,
            env: src.env,
            ingress_annotations: src.ingress_annotations,
            config_files: src.config_files,
            companions: src.companions,
            environment: Environment::default(),
            overrides: WorkloadOverrides {
                image: src.image,
                volumes: src.volumes,
                config_mount_path: src.config_mount_path,
                data_mount_path: src.data_mount_path,
                files_mount_path: src.files_mount_path,
                device_path: src.device_path,
                liveness_probe_enabled: src.liveness_probe_enabled,
                liveness_probe: src.liveness_probe,
                exposure_enabled: src.exposure_enabled,
                host_network: src.host_network,
            },
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
struct CompanionSource {
    name: String,
    port: Option<u16>,
    env: Vec<EnvVar>,

    image: Option<String>,
    mount_path: Option<String>,
    liveness_probe_enabled: Option<bool>,
    liveness_probe: Option<Probe>,
    exposure_enabled: Option<bool>,
}

impl From<CompanionSource> for CompanionSpec {
    fn from(src: CompanionSource) -> Self {
        CompanionSpec {
            name: src.name,
            port: src.port,
            env: src.env,
            overrides: CompanionOverrides {
                image: src.image,
                mount_path: src.mount_path,
                liveness_probe_enabled: src.liveness_probe_enabled,
                liveness_probe: src.liveness_probe,
                exposure_enabled: src.exposure_enabled,
            },
        }
    }
}

impl WorkloadSpec {
    pub fn new(name: &str) -> Self {
        WorkloadSpec {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Thread the process-wide environment into this workload
    pub fn with_environment(self, environment: Environment) -> Self {
        WorkloadSpec { environment, ..self }
    }
}
