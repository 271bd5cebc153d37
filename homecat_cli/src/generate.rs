use homecat_definitions::assemble;
use k8s_openapi::Resource;
use std::fs;

use super::{CompositeWorkload, Config, Result, ResultExt};

/// Assemble every workload in the config
///
/// All or nothing: the first configuration error aborts the run.
pub fn synthesize(conf: &Config) -> Result<Vec<CompositeWorkload>> {
    let (mut tree, placements) = conf.walk()?;
    let mut res = vec![];
    for p in placements {
        let cw = assemble(&p.spec, &mut tree, p.scope)
            .chain_err(|| format!("failed to assemble {}", p.path))?;
        res.push(cw);
    }
    Ok(res)
}

fn push_doc<T: serde::Serialize + Resource>(out: &mut String, obj: &T) -> Result<()> {
    trace!("rendering {} {}", T::API_VERSION, T::KIND);
    let doc = serde_yaml::to_string(obj)?;
    if !doc.starts_with("---") {
        out.push_str("---\n");
    }
    out.push_str(doc.trim_end());
    out.push('\n');
    Ok(())
}

/// Render workloads as a multi-document YAML stream
///
/// Per workload: the Deployment, then a Service and Ingress per exposure, then ConfigMaps.
pub fn render(workloads: &[CompositeWorkload]) -> Result<String> {
    let mut out = String::new();
    for cw in workloads {
        push_doc(&mut out, &cw.deployment)?;
        for ex in &cw.exposures {
            push_doc(&mut out, &ex.service)?;
            push_doc(&mut out, &ex.ingress)?;
        }
        for cm in &cw.config_maps {
            push_doc(&mut out, cm)?;
        }
    }
    Ok(out)
}

/// Generate manifests for the whole config to a file or stdout
pub fn generate(conf: &Config, output: Option<&str>) -> Result<()> {
    let workloads = synthesize(conf)?;
    let rendered = render(&workloads)?;
    match output {
        Some(path) => {
            fs::write(path, &rendered).chain_err(|| format!("failed to write {}", path))?;
            info!("Wrote {} workloads to {}", workloads.len(), path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
