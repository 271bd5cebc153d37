/// Allow normal error handling from structs
pub use super::{ErrorKind, Result};

/// Per-process host settings injected into every workload
mod environment;
pub use self::environment::Environment;

mod env;
pub use self::env::{EnvVar, SecretKeyRef};

/// Kubernetes liveness probes
pub mod probes;
pub use self::probes::{Exec, HttpGet, Probe, TcpSocket};

/// The per-kind defaults table
pub mod kind;
pub use self::kind::{KindDefaults, ProbeShape, WorkloadKind};

mod workload;
pub use self::workload::{CompanionOverrides, CompanionSpec, WorkloadOverrides, WorkloadSpec};
