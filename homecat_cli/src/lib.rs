#![recursion_limit = "1024"]
#![allow(renamed_and_removed_lints)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

#[macro_use]
extern crate error_chain;
error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }
    links {
        Def(homecat_definitions::Error, homecat_definitions::ErrorKind);
    }
    foreign_links {
        Io(::std::io::Error);
        SerdeY(serde_yaml::Error);
    }
    errors {
        MissingConfig(path: String) {
            description("config file not found")
            display("config file {} does not exist", &path)
        }
        UnknownWorkload(name: String) {
            description("workload not defined")
            display("no workload named '{}' in the config", &name)
        }
        AmbiguousWorkload(name: String, paths: Vec<String>) {
            description("workload name matches several scopes")
            display(
                "'{}' is defined in several scopes ({}); give the full path",
                &name,
                paths.join(", ")
            )
        }
    }
}

pub use homecat_definitions::{CompositeWorkload, Environment, ScopeId, ScopeTree, WorkloadSpec};

/// Reading `homecat.yml`
pub mod config;
pub use config::{Config, ScopeSource};

/// Synthesizing and rendering manifests
pub mod generate;

/// Listers
pub mod list;

/// Debug printers
pub mod show;
