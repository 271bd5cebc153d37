use k8s_openapi::api::core::v1::{ConfigMapVolumeSource, HostPathVolumeSource, Volume, VolumeMount};
use std::{fmt, str::FromStr};

use super::defaults::{DEFAULT_CONFIG_MOUNT_PATH, DEFAULT_DEVICE_PATH};
use super::identity::canonical_name;
use super::{Error, ErrorKind, Result, WorkloadSpec};

/// Host timezone file, mounted straight through
pub const TIMEZONE_PATH: &str = "/etc/localtime";

/// Logical purpose of a volume
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeRole {
    /// Shared storage tree, same path on host and in container
    Storage,
    /// Shared config parent, isolated per app by sub-path
    Config,
    /// Host timezone
    Timezone,
    /// Hardware passthrough; makes the container privileged
    Device,
    /// Inline config files from a generated ConfigMap (not requestable by name)
    Files,
}

impl FromStr for VolumeRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "storage" => Ok(VolumeRole::Storage),
            "config" => Ok(VolumeRole::Config),
            "timezone" => Ok(VolumeRole::Timezone),
            "device" => Ok(VolumeRole::Device),
            _ => bail!(ErrorKind::UnknownVolumeRole(s.into())),
        }
    }
}

impl fmt::Display for VolumeRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.volume_name())
    }
}

impl VolumeRole {
    /// Name of the pod volume backing this role
    pub fn volume_name(self) -> &'static str {
        match self {
            VolumeRole::Storage => "storage",
            VolumeRole::Config => "config",
            VolumeRole::Timezone => "timezone",
            VolumeRole::Device => "device",
            VolumeRole::Files => "files",
        }
    }

    /// Containers mounting this role must run privileged
    pub fn requires_privilege(self) -> bool {
        self == VolumeRole::Device
    }
}

/// Where a volume's content comes from
#[derive(Clone, Debug, PartialEq)]
pub enum VolumeSource {
    HostPath(String),
    ConfigMap(String),
    Device(String),
}

/// One mount of a role-backed volume into a container
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeBinding {
    pub role: VolumeRole,
    pub source: VolumeSource,
    pub mount_path: String,
    pub sub_path: Option<String>,
    pub read_only: bool,
}

impl VolumeBinding {
    pub fn to_mount(&self) -> VolumeMount {
        VolumeMount {
            name: self.role.volume_name().into(),
            mount_path: self.mount_path.clone(),
            sub_path: self.sub_path.clone(),
            read_only: if self.read_only { Some(true) } else { None },
            ..Default::default()
        }
    }
}

/// The volumes of one pod, resolved from a defaulted workload
///
/// Mounts are computed per container since the config sub-path is the
/// container's own canonical name.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumePlan {
    roles: Vec<VolumeRole>,
    storage_path: String,
    config_path: String,
    device_path: String,
    data_mount_path: Option<String>,
    files: Option<FilesPlan>,
}

#[derive(Clone, Debug, PartialEq)]
struct FilesPlan {
    config_map: String,
    mount_dir: String,
    files: Vec<String>,
}

impl VolumePlan {
    /// Resolve the roles of a defaulted workload
    ///
    /// All or nothing: an unknown or repeated role fails the whole plan.
    pub fn resolve(spec: &WorkloadSpec) -> Result<VolumePlan> {
        let name = canonical_name(&spec.name);
        let env = &spec.environment;
        let table = spec.kind.defaults();
        let requested = spec
            .overrides
            .volumes
            .clone()
            .unwrap_or_else(|| table.default_volumes());

        let mut roles: Vec<VolumeRole> = vec![];
        for r in &requested {
            let role: VolumeRole = r.parse()?;
            if roles.contains(&role) {
                bail!(ErrorKind::DuplicateVolumeRole(name, r.clone()));
            }
            roles.push(role);
        }

        let config_path = match table.config_parent {
            Some(parent) => format!("{}/{}", env.host_config_path.trim_end_matches('/'), parent),
            None => env.host_config_path.clone(),
        };

        let files = if spec.config_files.is_empty() {
            None
        } else {
            let mount_dir = spec
                .overrides
                .files_mount_path
                .clone()
                .unwrap_or_else(|| format!("/etc/{}", name));
            Some(FilesPlan {
                config_map: files_config_map_name(&name),
                mount_dir: mount_dir.trim_end_matches('/').into(),
                files: spec.config_files.keys().cloned().collect(),
            })
        };

        Ok(VolumePlan {
            roles,
            storage_path: env.host_storage_path.clone(),
            config_path,
            device_path: spec
                .overrides
                .device_path
                .clone()
                .unwrap_or_else(|| DEFAULT_DEVICE_PATH.into()),
            data_mount_path: spec.overrides.data_mount_path.clone(),
            files,
        })
    }

    pub fn roles(&self) -> &[VolumeRole] {
        &self.roles
    }

    pub fn requires_privilege(&self) -> bool {
        self.roles.iter().any(|r| r.requires_privilege())
    }

    fn source(&self, role: VolumeRole) -> VolumeSource {
        match role {
            VolumeRole::Storage => VolumeSource::HostPath(self.storage_path.clone()),
            VolumeRole::Config => VolumeSource::HostPath(self.config_path.clone()),
            VolumeRole::Timezone => VolumeSource::HostPath(TIMEZONE_PATH.into()),
            VolumeRole::Device => VolumeSource::Device(self.device_path.clone()),
            VolumeRole::Files => VolumeSource::ConfigMap(
                self.files.as_ref().map(|f| f.config_map.clone()).unwrap_or_default(),
            ),
        }
    }

    /// Pod volumes, one per role, in request order
    pub fn volumes(&self) -> Vec<Volume> {
        let mut roles = self.roles.clone();
        if self.files.is_some() {
            roles.push(VolumeRole::Files);
        }
        roles
            .into_iter()
            .map(|role| {
                let name = role.volume_name().to_string();
                match self.source(role) {
                    VolumeSource::HostPath(path) | VolumeSource::Device(path) => Volume {
                        name,
                        host_path: Some(HostPathVolumeSource { path, type_: None }),
                        ..Default::default()
                    },
                    VolumeSource::ConfigMap(cm) => Volume {
                        name,
                        config_map: Some(ConfigMapVolumeSource {
                            name: Some(cm),
                            ..Default::default()
                        }),
                        ..Default::default()
                    },
                }
            })
            .collect()
    }

    /// Mounts for the container named `app`
    ///
    /// `config_mount_path` is where `app` sees its own config sub-directory.
    /// Config files are only mounted when `with_files` is set.
    pub fn bindings(
        &self,
        app: &str,
        config_mount_path: &str,
        with_files: bool,
    ) -> Vec<VolumeBinding> {
        let app = canonical_name(app);
        let mut bindings = vec![];
        for &role in &self.roles {
            let source = self.source(role);
            match role {
                VolumeRole::Storage => bindings.push(VolumeBinding {
                    role,
                    source,
                    mount_path: self.storage_path.clone(),
                    sub_path: None,
                    read_only: false,
                }),
                VolumeRole::Config => {
                    bindings.push(VolumeBinding {
                        role,
                        source: source.clone(),
                        mount_path: config_mount_path.into(),
                        sub_path: Some(app.clone()),
                        read_only: false,
                    });
                    if let Some(data) = &self.data_mount_path {
                        bindings.push(VolumeBinding {
                            role,
                            source,
                            mount_path: data.clone(),
                            sub_path: Some(format!("{}-data", app)),
                            read_only: false,
                        });
                    }
                }
                VolumeRole::Timezone => bindings.push(VolumeBinding {
                    role,
                    source,
                    mount_path: TIMEZONE_PATH.into(),
                    sub_path: None,
                    read_only: true,
                }),
                VolumeRole::Device => bindings.push(VolumeBinding {
                    role,
                    source,
                    mount_path: self.device_path.clone(),
                    sub_path: None,
                    read_only: false,
                }),
                VolumeRole::Files => {}
            }
        }
        if with_files {
            if let Some(f) = &self.files {
                for file in &f.files {
                    bindings.push(VolumeBinding {
                        role: VolumeRole::Files,
                        source: self.source(VolumeRole::Files),
                        mount_path: format!("{}/{}", f.mount_dir, file),
                        sub_path: Some(file.clone()),
                        read_only: true,
                    });
                }
            }
        }
        bindings
    }

    pub fn mounts(&self, app: &str, config_mount_path: &str, with_files: bool) -> Vec<VolumeMount> {
        self.bindings(app, config_mount_path, with_files)
            .iter()
            .map(VolumeBinding::to_mount)
            .collect()
    }
}

/// Name of the ConfigMap carrying a workload's inline config files
pub fn files_config_map_name(name: &str) -> String {
    format!("{}-files", name)
}

/// Volumes and main-container mounts of a defaulted workload
pub fn resolve_volumes(spec: &WorkloadSpec) -> Result<(Vec<Volume>, Vec<VolumeMount>)> {
    let plan = VolumePlan::resolve(spec)?;
    let config_mount_path = spec
        .overrides
        .config_mount_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_MOUNT_PATH.into());
    let mounts = plan.mounts(&spec.name, &config_mount_path, true);
    Ok((plan.volumes(), mounts))
}
