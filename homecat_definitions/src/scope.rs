use std::collections::BTreeMap;

use super::{ErrorKind, Result};

/// Handle to a node in a `ScopeTree`
///
/// Only meaningful for the tree that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

#[derive(Debug, Clone)]
struct ScopeNode {
    name: String,
    parent: Option<ScopeId>,
    labels: BTreeMap<String, String>,
    children: BTreeMap<String, ScopeId>,
}

/// Ownership hierarchy that workloads are composed under
///
/// Nodes are append-only and live as long as the tree. Each node carries the labels
/// it declares itself; everything beneath it inherits them.
/// Sibling names are unique, registration takes `&mut self`.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    nodes: Vec<ScopeNode>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        ScopeTree::new()
    }
}

impl ScopeTree {
    /// A tree with an anonymous, label-free root
    pub fn new() -> Self {
        ScopeTree::with_labels(BTreeMap::new())
    }

    pub fn with_labels(labels: BTreeMap<String, String>) -> Self {
        ScopeTree {
            nodes: vec![ScopeNode {
                name: String::new(),
                parent: None,
                labels,
                children: BTreeMap::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Register a named child under `parent`
    ///
    /// Fails with a `NameCollision` if a sibling already has this name.
    pub fn add_child(
        &mut self,
        parent: ScopeId,
        name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<ScopeId> {
        if self.child(parent, name).is_some() {
            bail!(ErrorKind::NameCollision(name.into(), self.path(parent)));
        }
        let id = ScopeId(self.nodes.len());
        self.nodes.push(ScopeNode {
            name: name.into(),
            parent: Some(parent),
            labels,
            children: BTreeMap::new(),
        });
        self.nodes[parent.0].children.insert(name.into(), id);
        trace!("registered scope {}", self.path(id));
        Ok(id)
    }

    pub fn child(&self, parent: ScopeId, name: &str) -> Option<ScopeId> {
        self.nodes[parent.0].children.get(name).cloned()
    }

    pub fn children(&self, id: ScopeId) -> Vec<ScopeId> {
        self.nodes[id.0].children.values().cloned().collect()
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.nodes[id.0].parent
    }

    pub fn name(&self, id: ScopeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Root-first chain of ids ending in `id`
    pub fn ancestry(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut cur = id;
        while let Some(p) = self.parent(cur) {
            chain.push(p);
            cur = p;
        }
        chain.reverse();
        chain
    }

    /// Slash separated name path, `/` for the root
    pub fn path(&self, id: ScopeId) -> String {
        let names: Vec<&str> = self
            .ancestry(id)
            .into_iter()
            .skip(1)
            .map(|a| self.name(a))
            .collect();
        format!("/{}", names.join("/"))
    }

    /// Labels declared by the node itself
    pub fn own_labels(&self, id: ScopeId) -> &BTreeMap<String, String> {
        &self.nodes[id.0].labels
    }

    /// Effective labels: every ancestor's labels, nearer nodes winning on conflict
    pub fn labels(&self, id: ScopeId) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        for a in self.ancestry(id) {
            for (k, v) in self.own_labels(a) {
                labels.insert(k.clone(), v.clone());
            }
        }
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::ScopeTree;
    use crate::ErrorKind;

    #[test]
    fn sibling_collision() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        tree.add_child(root, "media", btreemap! {}).unwrap();
        let err = tree.add_child(root, "media", btreemap! {}).unwrap_err();
        match err.kind() {
            ErrorKind::NameCollision(name, scope) => {
                assert_eq!(name, "media");
                assert_eq!(scope, "/");
            }
            k => panic!("unexpected error kind {:?}", k),
        }
        assert!(err.is_configuration());
        assert_eq!(tree.children(root).len(), 1);
    }

    #[test]
    fn same_name_different_parents() {
        let mut tree = ScopeTree::new();
        let root = tree.root();
        let home = tree.add_child(root, "homeautomation", btreemap! {}).unwrap();
        let media = tree.add_child(root, "media", btreemap! {}).unwrap();
        let a = tree.add_child(home, "database", btreemap! {}).unwrap();
        let b = tree.add_child(media, "database", btreemap! {}).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.path(a), "/homeautomation/database");
        assert_eq!(tree.path(b), "/media/database");
        assert_eq!(tree.parent(b), Some(media));
    }

    #[test]
    fn label_inheritance() {
        let mut tree = ScopeTree::with_labels(btreemap! {
            "owner".to_string() => "homelab".to_string(),
            "tier".to_string() => "default".to_string(),
        });
        let root = tree.root();
        let home = tree
            .add_child(root, "home", btreemap! { "tier".to_string() => "home".to_string() })
            .unwrap();
        let mqtt = tree
            .add_child(home, "mosquitto", btreemap! {
                "app".to_string() => "mosquitto".to_string(),
            })
            .unwrap();

        assert_eq!(tree.labels(mqtt), btreemap! {
            "owner".to_string() => "homelab".to_string(),
            "tier".to_string() => "home".to_string(),
            "app".to_string() => "mosquitto".to_string(),
        });
        assert_eq!(tree.own_labels(home).len(), 1);
        assert_eq!(tree.path(root), "/");
    }
}
