use std::fmt;

use super::Probe;

/// How a liveness probe is built when a workload does not supply one
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProbeShape {
    /// HTTP GET on the primary port
    Http,
    /// TCP connect on the primary port
    Tcp,
    /// No probe at all
    None,
}

impl ProbeShape {
    /// The default probe for a primary port, if this shape has one
    pub fn probe(self, port: Option<u16>) -> Option<Probe> {
        match (self, port) {
            (ProbeShape::Http, Some(p)) => Some(Probe::http(p)),
            (ProbeShape::Tcp, Some(p)) => Some(Probe::tcp(p)),
            _ => None,
        }
    }
}

/// The kinds of workload we know how to fill in
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// A linuxserver.io style image: PUID/PGID aware, `/config` + shared storage
    LinuxServer,
    /// A dedicated game server on the host network with a config and data dir
    GameServer,
    /// Anything else with a web interface and a config directory
    Service,
}

impl Default for WorkloadKind {
    fn default() -> Self {
        WorkloadKind::LinuxServer
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            WorkloadKind::LinuxServer => "linuxserver",
            WorkloadKind::GameServer => "gameserver",
            WorkloadKind::Service => "service",
        };
        write!(f, "{}", name)
    }
}

/// Per-kind fallbacks, consulted by the defaulting engine
///
/// Everything here is data: kinds differ only in this table, never in code paths.
#[derive(Debug, Clone, PartialEq)]
pub struct KindDefaults {
    /// Registry prefix; image defaults to `<prefix>/<name>` when set
    pub image_prefix: Option<&'static str>,
    /// Volume roles used when a workload does not list any
    pub volumes: &'static [&'static str],
    /// Sub-directory of the host config root holding per-app config dirs
    pub config_parent: Option<&'static str>,
    /// Container path for a per-app data directory
    pub data_mount_path: Option<&'static str>,
    pub probe: ProbeShape,
    pub exposure: bool,
    pub host_network: bool,
    /// Inject PGID/PUID/TZ ahead of caller env vars
    pub identity_env: bool,
}

const LINUXSERVER: KindDefaults = KindDefaults {
    image_prefix: Some("ghcr.io/linuxserver"),
    volumes: &["storage", "config"],
    config_parent: None,
    data_mount_path: None,
    probe: ProbeShape::Http,
    exposure: true,
    host_network: false,
    identity_env: true,
};

const GAMESERVER: KindDefaults = KindDefaults {
    image_prefix: None,
    volumes: &["config"],
    config_parent: Some("games"),
    data_mount_path: Some("/data"),
    probe: ProbeShape::None,
    exposure: false,
    host_network: true,
    identity_env: true,
};

const SERVICE: KindDefaults = KindDefaults {
    image_prefix: None,
    volumes: &["config"],
    config_parent: None,
    data_mount_path: None,
    probe: ProbeShape::Http,
    exposure: true,
    host_network: false,
    identity_env: false,
};

impl WorkloadKind {
    pub fn defaults(self) -> &'static KindDefaults {
        match self {
            WorkloadKind::LinuxServer => &LINUXSERVER,
            WorkloadKind::GameServer => &GAMESERVER,
            WorkloadKind::Service => &SERVICE,
        }
    }
}

impl KindDefaults {
    pub fn image_for(&self, name: &str) -> Option<String> {
        self.image_prefix.map(|prefix| format!("{}/{}", prefix, name))
    }

    pub fn default_volumes(&self) -> Vec<String> {
        self.volumes.iter().map(|r| r.to_string()).collect()
    }

    pub fn probe_enabled(&self) -> bool {
        self.probe != ProbeShape::None
    }
}
