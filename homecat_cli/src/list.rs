//! The `homecat list` subcommand
use super::{Config, Result};

/// Every workload path with its kind
pub fn entries(conf: &Config) -> Result<Vec<(String, String)>> {
    let (_, placements) = conf.walk()?;
    Ok(placements
        .into_iter()
        .map(|p| (p.path, p.spec.kind.to_string()))
        .collect())
}

/// Print the defined workloads
pub fn workloads(conf: &Config) -> Result<()> {
    for (path, kind) in entries(conf)? {
        println!("{} ({})", path, kind);
    }
    Ok(())
}
