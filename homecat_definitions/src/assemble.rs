use k8s_openapi::api::{
    apps::v1::{Deployment, DeploymentSpec},
    core::v1::{ConfigMap, Container, ContainerPort, PodSpec, PodTemplateSpec, SecurityContext},
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeSet;

use super::defaults::DEFAULT_CONFIG_MOUNT_PATH;
use super::exposure::{compose_exposure, ExposureBundle};
use super::identity::{canonical_name, derive_identity, Identity, APP_LABEL};
use super::structs::Probe;
use super::util::Require;
use super::volumes::{files_config_map_name, VolumePlan};
use super::{apply_defaults, EnvVar, ErrorKind, Result, ScopeId, ScopeTree, WorkloadSpec};

/// Everything generated for one workload
///
/// Handed to the caller as is; the serialization boundary writes it out verbatim.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeWorkload {
    pub identity: Identity,
    pub deployment: Deployment,
    /// One per exposed container, main container first
    pub exposures: Vec<ExposureBundle>,
    pub config_maps: Vec<ConfigMap>,
}

impl CompositeWorkload {
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Label set the pod template carries and every exposure selects on
    pub fn pod_labels(&self) -> Option<&std::collections::BTreeMap<String, String>> {
        self.deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.metadata.as_ref())
            .and_then(|m| m.labels.as_ref())
    }

    pub fn containers(&self) -> &[Container] {
        self.deployment
            .spec
            .as_ref()
            .and_then(|s| s.template.spec.as_ref())
            .map(|s| s.containers.as_slice())
            .unwrap_or(&[])
    }

    pub fn exposure(&self, name: &str) -> Option<&ExposureBundle> {
        self.exposures.iter().find(|e| e.name() == Some(name))
    }
}

/// Inputs of one container after defaulting
struct ContainerShape<'a> {
    name: String,
    image: String,
    port: Option<u16>,
    env: &'a [EnvVar],
    mount_path: String,
    with_files: bool,
    probe: Option<Probe>,
    exposed: bool,
}

/// Synthesize the full resource set for `spec` and register it under `scope`
///
/// The tree is only modified once everything has been produced, so a failed
/// assembly can be fixed and retried against the same tree.
pub fn assemble(
    spec: &WorkloadSpec,
    tree: &mut ScopeTree,
    scope: ScopeId,
) -> Result<CompositeWorkload> {
    let name = canonical_name(&spec.name);
    if name.is_empty() {
        bail!(ErrorKind::MissingField(tree.path(scope), "name".into()));
    }
    if tree.child(scope, &name).is_some() {
        bail!(ErrorKind::NameCollision(name, tree.path(scope)));
    }
    let cnames = companion_names(spec, &name, tree, scope)?;

    let identity = derive_identity(tree, scope, &spec.name);
    let eff = apply_defaults(spec);
    let env = &eff.environment;
    let table = eff.kind.defaults();
    let plan = VolumePlan::resolve(&eff)?;
    let privileged = plan.requires_privilege();
    if privileged {
        warn!("{} mounts a device and runs privileged", name);
    }

    let identity_env = if table.identity_env {
        vec![
            EnvVar::plain("PGID", env.group_id),
            EnvVar::plain("PUID", env.user_id),
            EnvVar::plain("TZ", &env.timezone),
        ]
    } else {
        vec![]
    };

    let main_mount = eff
        .overrides
        .config_mount_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_MOUNT_PATH.into());
    let mut shapes = vec![ContainerShape {
        name: name.clone(),
        image: eff.overrides.image.clone().require(&name, "image")?,
        port: eff.port,
        env: &eff.env,
        mount_path: main_mount.clone(),
        with_files: true,
        probe: enabled_probe(eff.overrides.liveness_probe_enabled, &eff.overrides.liveness_probe),
        exposed: eff.overrides.exposure_enabled.unwrap_or(table.exposure),
    }];

    for (c, cname) in eff.companions.iter().zip(cnames.iter().cloned()) {
        shapes.push(ContainerShape {
            image: c.overrides.image.clone().require(&cname, "image")?,
            port: c.port,
            env: &c.env,
            mount_path: c.overrides.mount_path.clone().unwrap_or_else(|| main_mount.clone()),
            with_files: false,
            probe: enabled_probe(c.overrides.liveness_probe_enabled, &c.overrides.liveness_probe),
            exposed: c.overrides.exposure_enabled.unwrap_or(table.exposure),
            name: cname,
        });
    }

    let mut containers = vec![];
    let mut exposures = vec![];
    for shape in shapes {
        if let Some(p) = &shape.probe {
            p.verify(&shape.name)?;
        }
        let mut ports = None;
        if shape.exposed {
            let port = shape.port.require(&shape.name, "port")?;
            ports = Some(vec![ContainerPort {
                container_port: port.into(),
                name: Some("http".into()),
                protocol: Some("TCP".into()),
                ..Default::default()
            }]);
            exposures.push(compose_exposure(
                &shape.name,
                port,
                &identity.labels,
                &env.parent_domain,
                &eff.ingress_annotations,
            ));
        }

        let vars = identity_env.iter().chain(shape.env.iter()).map(EnvVar::to_kube).collect();
        containers.push(Container {
            name: shape.name.clone(),
            image: Some(shape.image),
            env: Some(vars),
            ports,
            liveness_probe: shape.probe.as_ref().map(Probe::to_kube),
            volume_mounts: Some(plan.mounts(&shape.name, &shape.mount_path, shape.with_files)),
            security_context: if privileged {
                Some(SecurityContext {
                    privileged: Some(true),
                    ..Default::default()
                })
            } else {
                None
            },
            ..Default::default()
        });
    }

    let mut config_maps = vec![];
    if !eff.config_files.is_empty() {
        config_maps.push(ConfigMap {
            metadata: ObjectMeta {
                name: Some(files_config_map_name(&name)),
                labels: Some(identity.labels.clone()),
                ..Default::default()
            },
            data: Some(eff.config_files.clone()),
            ..Default::default()
        });
    }

    let deployment = Deployment {
        metadata: identity.metadata(),
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(identity.labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(identity.labels.clone()),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    host_network: eff.overrides.host_network,
                    volumes: Some(plan.volumes()),
                    containers,
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    };

    // companion Services and config dirs live in the same namespace as the workload
    let pod_label = btreemap! { APP_LABEL.to_string() => name.clone() };
    tree.add_child(scope, &name, pod_label.clone())?;
    for cname in &cnames {
        tree.add_child(scope, cname, pod_label.clone())?;
    }
    info!(
        "assembled {} under {} ({} exposures)",
        name,
        tree.path(scope),
        exposures.len()
    );
    Ok(CompositeWorkload {
        identity,
        deployment,
        exposures,
        config_maps,
    })
}

/// Canonical companion names, checked against each other and the scope
fn companion_names(
    spec: &WorkloadSpec,
    name: &str,
    tree: &ScopeTree,
    scope: ScopeId,
) -> Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    seen.insert(name.to_string());
    let mut names = vec![];
    for c in &spec.companions {
        let cname = canonical_name(&c.name);
        if cname.is_empty() {
            bail!(ErrorKind::MissingField(name.into(), "companions[].name".into()));
        }
        if !seen.insert(cname.clone()) {
            let pod = format!("{}/{}", tree.path(scope).trim_end_matches('/'), name);
            bail!(ErrorKind::NameCollision(cname, pod));
        }
        if tree.child(scope, &cname).is_some() {
            bail!(ErrorKind::NameCollision(cname, tree.path(scope)));
        }
        names.push(cname);
    }
    Ok(names)
}

/// Disabling the probe drops a supplied one too
fn enabled_probe(enabled: Option<bool>, probe: &Option<Probe>) -> Option<Probe> {
    if enabled == Some(false) {
        None
    } else {
        probe.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::assemble;
    use crate::structs::{CompanionSpec, Exec, Probe};
    use crate::{EnvVar, Environment, ErrorKind, ScopeTree, WorkloadKind, WorkloadSpec};
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn env() -> Environment {
        Environment {
            parent_domain: "example.com".into(),
            host_storage_path: "/mnt/storage".into(),
            host_config_path: "/mnt/config".into(),
            user_id: 1000,
            group_id: 100,
            timezone: "Europe/London".into(),
        }
    }

    fn sonarr() -> WorkloadSpec {
        WorkloadSpec {
            port: Some(8989),
            env: vec![EnvVar::plain("UMASK", "022")],
            ..WorkloadSpec::new("Sonarr")
        }
        .with_environment(env())
    }

    fn env_names(c: &k8s_openapi::api::core::v1::Container) -> Vec<String> {
        c.env.as_ref().unwrap().iter().map(|e| e.name.clone()).collect()
    }

    #[test]
    fn linuxserver_app() {
        let mut tree = ScopeTree::with_labels(btreemap! {
            "owner".to_string() => "home".to_string(),
        });
        let root = tree.root();
        let cw = assemble(&sonarr(), &mut tree, root).unwrap();

        assert_eq!(cw.name(), "sonarr");
        let labels = cw.pod_labels().unwrap();
        assert_eq!(labels["app"], "sonarr");
        assert_eq!(labels["owner"], "home");

        let spec = cw.deployment.spec.as_ref().unwrap();
        assert_eq!(spec.selector.match_labels.as_ref(), Some(labels));
        let pod = spec.template.spec.as_ref().unwrap();
        assert_eq!(pod.host_network, Some(false));
        assert_eq!(pod.volumes.as_ref().unwrap().len(), 2);

        let c = &cw.containers()[0];
        assert_eq!(c.image.as_deref(), Some("ghcr.io/linuxserver/sonarr"));
        assert_eq!(env_names(c), vec!["PGID", "PUID", "TZ", "UMASK"]);
        assert_eq!(c.env.as_ref().unwrap()[1].value.as_deref(), Some("1000"));
        assert_eq!(c.ports.as_ref().unwrap()[0].container_port, 8989);
        assert_eq!(c.security_context, None);
        let probe = c.liveness_probe.as_ref().unwrap();
        assert_eq!(probe.http_get.as_ref().unwrap().port, IntOrString::Int(8989));
        assert_eq!(probe.initial_delay_seconds, Some(30));

        assert_eq!(cw.exposures.len(), 1);
        let ex = cw.exposure("sonarr").unwrap();
        assert_eq!(ex.selector(), Some(labels));
        assert_eq!(ex.host(), Some("sonarr.example.com"));
        assert_eq!(ex.tls_secret(), Some("sonarr-cert"));
        assert!(cw.config_maps.is_empty());

        // registered only now
        assert!(tree.child(root, "sonarr").is_some());
    }

    #[test]
    fn exposure_disabled() {
        let mut spec = sonarr();
        spec.overrides.exposure_enabled = Some(false);
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let cw = assemble(&spec, &mut tree, root).unwrap();
        assert!(cw.exposures.is_empty());
        assert_eq!(cw.containers()[0].ports, None);
    }

    #[test]
    fn duplicate_env_passes_through() {
        let mut spec = sonarr();
        spec.env.push(EnvVar::plain("TZ", "UTC"));
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let cw = assemble(&spec, &mut tree, root).unwrap();
        assert_eq!(env_names(&cw.containers()[0]), vec!["PGID", "PUID", "TZ", "UMASK", "TZ"]);
    }

    #[test]
    fn collision_leaves_tree_untouched() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let media = tree.add_child(root, "media", Default::default()).unwrap();
        assemble(&sonarr(), &mut tree, media).unwrap();

        let err = assemble(&sonarr(), &mut tree, media).unwrap_err();
        match err.kind() {
            ErrorKind::NameCollision(n, scope) => {
                assert_eq!(n, "sonarr");
                assert_eq!(scope, "/media");
            }
            k => panic!("unexpected error kind {:?}", k),
        }
        assert!(err.is_configuration());
        // same app elsewhere is fine
        assert!(assemble(&sonarr(), &mut tree, root).is_ok());
    }

    #[test]
    fn failure_registers_nothing() {
        let mut spec = sonarr();
        spec.overrides.volumes = Some(vec!["config".into(), "scratch".into()]);
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let err = assemble(&spec, &mut tree, root).unwrap_err();
        match err.kind() {
            ErrorKind::UnknownVolumeRole(r) => assert_eq!(r, "scratch"),
            k => panic!("unexpected error kind {:?}", k),
        }
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn gameserver() {
        let mut spec = WorkloadSpec::new("Valheim").with_environment(env());
        spec.kind = WorkloadKind::GameServer;
        spec.port = Some(2456);
        let mut tree = ScopeTree::new();
        let root = tree.root();

        // no image prefix for game servers
        let err = assemble(&spec, &mut tree, root).unwrap_err();
        match err.kind() {
            ErrorKind::MissingField(w, f) => {
                assert_eq!(w, "valheim");
                assert_eq!(f, "image");
            }
            k => panic!("unexpected error kind {:?}", k),
        }

        spec.overrides.image = Some("lloesche/valheim-server".into());
        let cw = assemble(&spec, &mut tree, root).unwrap();
        let pod = cw.deployment.spec.as_ref().unwrap().template.spec.as_ref().unwrap();
        assert_eq!(pod.host_network, Some(true));
        assert!(cw.exposures.is_empty());
        let c = &cw.containers()[0];
        assert_eq!(c.liveness_probe, None);
        assert_eq!(c.ports, None);
        let mounts = c.volume_mounts.as_ref().unwrap();
        assert_eq!(mounts[1].mount_path, "/data");
        assert_eq!(mounts[1].sub_path.as_deref(), Some("valheim-data"));
    }

    #[test]
    fn device_makes_privileged() {
        let mut spec = WorkloadSpec::new("homeassistant").with_environment(env());
        spec.kind = WorkloadKind::Service;
        spec.port = Some(8123);
        spec.overrides.image = Some("homeassistant/home-assistant".into());
        spec.overrides.volumes = Some(vec!["config".into(), "timezone".into(), "device".into()]);
        spec.overrides.host_network = Some(true);
        spec.companions.push(CompanionSpec {
            name: "zigbee2mqtt".into(),
            port: Some(8080),
            ..Default::default()
        });
        spec.companions[0].overrides.image = Some("koenkk/zigbee2mqtt".into());
        spec.companions[0].overrides.mount_path = Some("/app/data".into());

        let mut tree = ScopeTree::new();
        let root = tree.root();
        let cw = assemble(&spec, &mut tree, root).unwrap();
        assert_eq!(cw.containers().len(), 2);
        for c in cw.containers() {
            assert_eq!(c.security_context.as_ref().unwrap().privileged, Some(true));
            // service kind: no identity env
            assert_eq!(c.env.as_ref().unwrap().len(), 0);
        }
        let z = &cw.containers()[1];
        let cfg = &z.volume_mounts.as_ref().unwrap()[0];
        assert_eq!(cfg.mount_path, "/app/data");
        assert_eq!(cfg.sub_path.as_deref(), Some("zigbee2mqtt"));

        // companion exposed on its own name but selecting the shared pod
        let ex = cw.exposure("zigbee2mqtt").unwrap();
        assert_eq!(ex.host(), Some("zigbee2mqtt.example.com"));
        assert_eq!(ex.selector(), cw.pod_labels());
        assert_eq!(cw.exposures.len(), 2);
    }

    #[test]
    fn companion_names_are_unique() {
        let mut spec = sonarr();
        spec.companions.push(CompanionSpec {
            name: "SONARR".into(),
            ..Default::default()
        });
        let mut tree = ScopeTree::new();
        let root = tree.root();
        match assemble(&spec, &mut tree, root).unwrap_err().kind() {
            ErrorKind::NameCollision(n, scope) => {
                assert_eq!(n, "sonarr");
                assert_eq!(scope, "/sonarr");
            }
            k => panic!("unexpected error kind {:?}", k),
        }
    }

    fn netdata() -> WorkloadSpec {
        let mut spec = WorkloadSpec::new("netdata").with_environment(env());
        spec.kind = WorkloadKind::Service;
        spec.port = Some(19999);
        spec.overrides.image = Some("netdata/netdata".into());
        spec
    }

    fn homeassistant_with(companion: &str) -> WorkloadSpec {
        let mut spec = WorkloadSpec::new("homeassistant").with_environment(env());
        spec.kind = WorkloadKind::Service;
        spec.port = Some(8123);
        spec.overrides.image = Some("homeassistant/home-assistant".into());
        spec.companions.push(CompanionSpec {
            name: companion.into(),
            port: Some(19999),
            ..Default::default()
        });
        spec.companions[0].overrides.image = Some("netdata/netdata".into());
        spec
    }

    #[test]
    fn companion_collides_with_sibling_workload() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        assemble(&netdata(), &mut tree, root).unwrap();

        let err = assemble(&homeassistant_with("Netdata"), &mut tree, root).unwrap_err();
        match err.kind() {
            ErrorKind::NameCollision(n, scope) => {
                assert_eq!(n, "netdata");
                assert_eq!(scope, "/");
            }
            k => panic!("unexpected error kind {:?}", k),
        }
        assert!(tree.child(root, "homeassistant").is_none());
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn sibling_workload_collides_with_companion() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        assemble(&homeassistant_with("netdata"), &mut tree, root).unwrap();
        assert!(tree.child(root, "netdata").is_some());

        match assemble(&netdata(), &mut tree, root).unwrap_err().kind() {
            ErrorKind::NameCollision(n, scope) => {
                assert_eq!(n, "netdata");
                assert_eq!(scope, "/");
            }
            k => panic!("unexpected error kind {:?}", k),
        }

        // fine in another scope
        let other = tree.add_child(root, "monitoring", Default::default()).unwrap();
        assert!(assemble(&netdata(), &mut tree, other).is_ok());
    }

    #[test]
    fn probes() {
        let mut spec = sonarr();
        spec.overrides.liveness_probe = Some(Probe {
            exec: Some(Exec { command: vec![] }),
            ..Default::default()
        });
        let mut tree = ScopeTree::new();
        let root = tree.root();
        match assemble(&spec, &mut tree, root).unwrap_err().kind() {
            ErrorKind::InvalidProbe(w, _) => assert_eq!(w, "sonarr"),
            k => panic!("unexpected error kind {:?}", k),
        }

        // a disabled probe is dropped, invalid or not
        spec.overrides.liveness_probe_enabled = Some(false);
        let cw = assemble(&spec, &mut tree, root).unwrap();
        assert_eq!(cw.containers()[0].liveness_probe, None);
    }

    #[test]
    fn config_files() {
        let mut spec = WorkloadSpec::new("netdata").with_environment(env());
        spec.kind = WorkloadKind::Service;
        spec.port = Some(19999);
        spec.overrides.image = Some("netdata/netdata".into());
        spec.config_files.insert("netdata.conf".into(), "[global]\n".into());
        spec.env.push(EnvVar::secret("NETDATA_CLAIM_TOKEN", "netdata", "token"));

        let mut tree = ScopeTree::new();
        let root = tree.root();
        let cw = assemble(&spec, &mut tree, root).unwrap();
        let cm = &cw.config_maps[0];
        assert_eq!(cm.metadata.name.as_deref(), Some("netdata-files"));
        assert_eq!(cm.data.as_ref().unwrap()["netdata.conf"], "[global]\n");

        let c = &cw.containers()[0];
        let secret = c.env.as_ref().unwrap()[0].value_from.as_ref().unwrap();
        assert_eq!(secret.secret_key_ref.as_ref().unwrap().key, "token");
        let files = c.volume_mounts.as_ref().unwrap().iter().find(|m| m.name == "files").unwrap();
        assert_eq!(files.mount_path, "/etc/netdata/netdata.conf");
    }
}
