use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use super::{ScopeId, ScopeTree};

/// Label key every workload is selected by
pub const APP_LABEL: &str = "app";

/// Name and labels shared by everything generated for one application
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub name: String,
    pub labels: BTreeMap<String, String>,
}

/// Lower-cased application name
///
/// Not sanitized: an invalid resource name is rejected downstream by kube.
pub fn canonical_name(app: &str) -> String {
    app.to_lowercase()
}

/// Identity of `app` when placed under `scope`
///
/// Labels are the scope's inherited labels plus `app: <canonical name>`,
/// where the app label always wins.
pub fn derive_identity(tree: &ScopeTree, scope: ScopeId, app: &str) -> Identity {
    let name = canonical_name(app);
    let mut labels = tree.labels(scope);
    labels.insert(APP_LABEL.into(), name.clone());
    Identity { name, labels }
}

impl Identity {
    pub fn metadata(&self) -> ObjectMeta {
        ObjectMeta {
            name: Some(self.name.clone()),
            labels: Some(self.labels.clone()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{canonical_name, derive_identity};
    use crate::ScopeTree;

    #[test]
    fn lowercases_only() {
        assert_eq!(canonical_name("Valheim"), "valheim");
        assert_eq!(canonical_name("unifi-controller"), "unifi-controller");
        assert_eq!(canonical_name("Home Assistant"), "home assistant");
    }

    #[test]
    fn app_label_wins() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let media = tree
            .add_child(root, "media", btreemap! {
                "app".to_string() => "media".to_string(),
                "suite".to_string() => "media".to_string(),
            })
            .unwrap();

        let id = derive_identity(&tree, media, "Sonarr");
        assert_eq!(id.name, "sonarr");
        assert_eq!(id.labels, btreemap! {
            "app".to_string() => "sonarr".to_string(),
            "suite".to_string() => "media".to_string(),
        });

        let md = id.metadata();
        assert_eq!(md.name.as_deref(), Some("sonarr"));
        assert_eq!(md.labels, Some(id.labels.clone()));
    }
}
