#![recursion_limit = "1024"]
#![allow(renamed_and_removed_lints)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate merge_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate maplit;

#[macro_use]
extern crate error_chain;
error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    links {}
    foreign_links {}
    errors {
        UnknownVolumeRole(role: String) {
            description("unknown volume role")
            display(
                "unknown volume role '{}' (expected one of storage, config, timezone, device)",
                &role
            )
        }
        DuplicateVolumeRole(workload: String, role: String) {
            description("volume role requested twice")
            display("workload '{}' requests volume role '{}' more than once", &workload, &role)
        }
        MissingField(workload: String, field: String) {
            description("required field missing")
            display("workload '{}' is missing required field '{}'", &workload, &field)
        }
        NameCollision(name: String, scope: String) {
            description("name already registered in scope")
            display("'{}' is already registered under scope '{}'", &name, &scope)
        }
        InvalidProbe(workload: String, reason: String) {
            description("invalid liveness probe")
            display("workload '{}' has an invalid probe: {}", &workload, &reason)
        }
    }
}

impl Error {
    /// Whether this error came from an unusable workload description
    ///
    /// Synthesis is deterministic, so these are never worth retrying.
    pub fn is_configuration(&self) -> bool {
        match self.kind() {
            ErrorKind::UnknownVolumeRole(_)
            | ErrorKind::DuplicateVolumeRole(..)
            | ErrorKind::MissingField(..)
            | ErrorKind::NameCollision(..)
            | ErrorKind::InvalidProbe(..) => true,
            _ => false,
        }
    }
}

/// Input structs for workloads
pub mod structs;
pub use structs::{
    CompanionSpec, EnvVar, Environment, KindDefaults, Probe, ProbeShape, WorkloadKind, WorkloadSpec,
};

mod util;

/// Hierarchical namespacing of workloads
pub mod scope;
pub use scope::{ScopeId, ScopeTree};

/// Canonical names and label sets
pub mod identity;
pub use identity::{derive_identity, Identity};

/// Fallback values for everything a workload leaves unset
pub mod defaults;
pub use defaults::apply_defaults;

/// Volume roles to host-backed volumes and mounts
pub mod volumes;
pub use volumes::{resolve_volumes, VolumeBinding, VolumePlan, VolumeRole, VolumeSource};

/// Service + Ingress pairs
pub mod exposure;
pub use exposure::{compose_exposure, ExposureBundle};

/// Putting it all together
pub mod assemble;
pub use assemble::{assemble, CompositeWorkload};
