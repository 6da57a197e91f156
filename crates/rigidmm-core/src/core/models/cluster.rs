//! Hierarchical rigid clusters.
//!
//! A cluster is a named rigid grouping of atoms and child clusters, each
//! held at a fixed placement in the cluster's local frame. Placement
//! operations that need to see other clusters (cycle checks, recursive
//! attachment) live on the owning `MolecularModel`; this type only carries
//! the per-cluster state.

use super::ids::{AtomId, BodyId, ClusterId};
use nalgebra::{Isometry3, Point3};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    // --- Topological state, filled during definition ---
    pub id: ClusterId,
    pub name: String,

    /// Atoms placed directly in this cluster, with their stations in this
    /// cluster's frame.
    pub direct_atoms: BTreeMap<AtomId, Point3<f64>>,
    /// Child clusters placed directly in this cluster, with their rigid
    /// placements in this cluster's frame.
    pub direct_clusters: BTreeMap<ClusterId, Isometry3<f64>>,
    /// Every atom of this cluster or any descendant, with its station
    /// re-expressed in this cluster's frame. Kept up to date as atoms and
    /// clusters are placed.
    pub all_atoms: BTreeMap<AtomId, Point3<f64>>,
    /// Immediate parents; a body is not a parent, it is tracked below.
    pub parents: BTreeSet<ClusterId>,

    /// Body this cluster is fixed to, once it (or an ancestor) has been
    /// attached.
    pub body: Option<BodyId>,
    /// Placement fixed in the attached body's frame.
    pub placement_b: Isometry3<f64>,

    // --- Topological cache ---
    pub(crate) cache_valid: bool,
}

impl Cluster {
    pub fn new(id: ClusterId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            direct_atoms: BTreeMap::new(),
            direct_clusters: BTreeMap::new(),
            all_atoms: BTreeMap::new(),
            parents: BTreeSet::new(),
            body: None,
            placement_b: Isometry3::identity(),
            cache_valid: false,
        }
    }

    /// A top-level cluster has no parent clusters and may be attached to a
    /// body or grow children.
    pub fn is_top_level(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn is_attached_to_body(&self) -> bool {
        self.body.is_some()
    }

    /// Whether the atom appears anywhere in this cluster's subtree.
    pub fn contains_atom(&self, atom: AtomId) -> bool {
        self.all_atoms.contains_key(&atom)
    }

    pub(crate) fn invalidate_topological_cache(&mut self) {
        // TODO: clear composite charge/geometric properties once they are
        // actually computed.
        self.cache_valid = false;
    }

    /// Recomputes the composite properties of this cluster. The hooks for
    /// charge and geometric properties are currently no-ops.
    pub(crate) fn realize_topological_cache(&mut self) {
        if self.cache_valid {
            return;
        }
        self.cache_valid = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cluster_is_top_level_and_unattached() {
        let cluster = Cluster::new(ClusterId(1), "methyl");
        assert!(cluster.is_top_level());
        assert!(!cluster.is_attached_to_body());
        assert!(cluster.all_atoms.is_empty());
    }

    #[test]
    fn contains_atom_looks_at_the_flattened_set() {
        let mut cluster = Cluster::new(ClusterId(0), "g");
        cluster.all_atoms.insert(AtomId(3), Point3::origin());
        assert!(cluster.contains_atom(AtomId(3)));
        assert!(!cluster.contains_atom(AtomId(4)));
    }

    #[test]
    fn cache_realization_is_idempotent() {
        let mut cluster = Cluster::new(ClusterId(0), "g");
        cluster.realize_topological_cache();
        assert!(cluster.cache_valid);
        cluster.realize_topological_cache();
        assert!(cluster.cache_valid);
        cluster.invalidate_topological_cache();
        assert!(!cluster.cache_valid);
    }
}
