use homecat_definitions::apply_defaults;

use super::{Config, Result, WorkloadSpec};

/// The effective spec of one workload after defaulting
pub fn effective(conf: &Config, name: &str) -> Result<WorkloadSpec> {
    let placement = conf.find(name)?;
    debug!("Showing {}", placement.path);
    Ok(apply_defaults(&placement.spec))
}

/// Print the effective spec
///
/// This allows debugging what a terse workload entry turns into.
pub fn workload(conf: &Config, name: &str) -> Result<()> {
    let spec = effective(conf, name)?;
    println!("{}", serde_yaml::to_string(&spec)?);
    Ok(())
}
