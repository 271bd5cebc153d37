use homecat_definitions::identity::canonical_name;
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use super::{Environment, ErrorKind, Result, ResultExt, ScopeId, ScopeTree, WorkloadSpec};

/// Config file used when neither `-c` nor `$HOMECAT_CONFIG` is given
pub const DEFAULT_CONFIG_FILE: &str = "homecat.yml";
pub const CONFIG_ENV_VAR: &str = "HOMECAT_CONFIG";

/// Everything `homecat.yml` describes
///
/// Workloads at the top level live directly under the root scope.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Host settings threaded into every workload
    pub environment: Environment,

    /// Labels carried by every generated resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workloads: Vec<WorkloadSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<ScopeSource>,
}

/// A named group of workloads and nested groups
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScopeSource {
    pub name: String,

    /// Added to the labels of everything beneath this scope
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workloads: Vec<WorkloadSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<ScopeSource>,
}

/// A workload together with the scope it is to be assembled under
#[derive(Clone, Debug)]
pub struct Placement {
    pub scope: ScopeId,
    /// Full path of the workload, e.g. `/media/sonarr`
    pub path: String,
    pub spec: WorkloadSpec,
}

impl Config {
    /// Where to look for the config
    ///
    /// An explicit path wins over `$HOMECAT_CONFIG`, which wins over `./homecat.yml`.
    pub fn locate(explicit: Option<&str>) -> PathBuf {
        if let Some(p) = explicit {
            return PathBuf::from(p);
        }
        if let Ok(p) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(p);
        }
        Path::new(".").join(DEFAULT_CONFIG_FILE)
    }

    /// Read a config file in an arbitrary path
    pub fn from_path(path: &Path) -> Result<Config> {
        trace!("Using config in {}", path.display());
        if !path.exists() {
            bail!(ErrorKind::MissingConfig(path.display().to_string()));
        }
        let data = fs::read_to_string(path)?;
        let conf: Config = serde_yaml::from_str(&data)
            .chain_err(|| format!("invalid config in {}", path.display()))?;
        debug!(
            "Loaded {} top level workloads and {} scopes",
            conf.workloads.len(),
            conf.scopes.len()
        );
        Ok(conf)
    }

    pub fn read(explicit: Option<&str>) -> Result<Config> {
        Config::from_path(&Config::locate(explicit))
    }

    /// Build the scope tree and list where each workload goes
    ///
    /// Scopes are registered up front, workloads are left for the assembler to
    /// register. Every workload gets a copy of the environment.
    /// Placements are depth first, a scope's own workloads before its sub-scopes.
    pub fn walk(&self) -> Result<(ScopeTree, Vec<Placement>)> {
        let mut tree = ScopeTree::with_labels(self.labels.clone());
        let mut placements = vec![];
        let root = tree.root();
        self.place(&mut tree, root, &self.workloads, &self.scopes, &mut placements)?;
        Ok((tree, placements))
    }

    fn place(
        &self,
        tree: &mut ScopeTree,
        scope: ScopeId,
        workloads: &[WorkloadSpec],
        scopes: &[ScopeSource],
        placements: &mut Vec<Placement>,
    ) -> Result<()> {
        let mut children = vec![];
        for s in scopes {
            let id = tree.add_child(scope, &s.name, s.labels.clone())?;
            children.push((id, s));
        }
        for w in workloads {
            placements.push(Placement {
                scope,
                path: workload_path(tree, scope, &w.name),
                spec: w.clone().with_environment(self.environment.clone()),
            });
        }
        for (id, s) in children {
            self.place(tree, id, &s.workloads, &s.scopes, placements)?;
        }
        Ok(())
    }

    /// Find a single workload by canonical name or full path
    pub fn find(&self, name: &str) -> Result<Placement> {
        let (_, placements) = self.walk()?;
        let wanted = canonical_name(name);
        let matches: Vec<Placement> = placements
            .into_iter()
            .filter(|p| p.path == name || canonical_name(&p.spec.name) == wanted)
            .collect();
        match matches.len() {
            0 => bail!(ErrorKind::UnknownWorkload(name.into())),
            1 => Ok(matches[0].clone()),
            _ => {
                let paths = matches.into_iter().map(|p| p.path).collect();
                bail!(ErrorKind::AmbiguousWorkload(name.into(), paths))
            }
        }
    }
}

/// `/scope/path/<canonical name>` of a workload
pub fn workload_path(tree: &ScopeTree, scope: ScopeId, name: &str) -> String {
    format!("{}/{}", tree.path(scope).trim_end_matches('/'), canonical_name(name))
}
