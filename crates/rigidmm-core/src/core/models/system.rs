//! The molecular model: atoms, bonds, clusters and bodies.
//!
//! All four stores are append-only and indexed by dense ids; every
//! cross-reference is by id. The cluster-tree operations that need a view
//! over several entities at once (containment checks, recursive body
//! attachment) live here rather than on the entity types.

use super::atom::Atom;
use super::body::{AtomPlacement, Body};
use super::cluster::Cluster;
use super::ids::{AtomId, BodyId, BondId, ChargedTypeId, ClusterId};
use super::topology::Bond;
use nalgebra::{Isometry3, Point3};
use thiserror::Error;

/// The reserved top-level cluster created at construction; free atoms and
/// groups may be placed here before being organised further.
pub const FREE_CLUSTER_NAME: &str = "free atoms and groups";

/// Violations of the molecular-topology preconditions.
#[derive(Debug, Error, PartialEq)]
pub enum TopologyError {
    #[error("atom {0} does not exist")]
    InvalidAtom(AtomId),

    #[error("cluster {0} does not exist")]
    InvalidCluster(ClusterId),

    #[error("body {0} has no atoms attached")]
    InvalidBody(BodyId),

    #[error("cannot bond atom {0} to itself")]
    SelfBond(AtomId),

    #[error("atom {atom} is already attached to body {body}")]
    AtomAlreadyOnBody { atom: AtomId, body: BodyId },

    #[error("cluster {cluster} ('{name}') already contains atom {atom}")]
    AtomAlreadyInCluster {
        cluster: ClusterId,
        name: String,
        atom: AtomId,
    },

    #[error("cluster {0} is not a top-level cluster")]
    ClusterNotTopLevel(ClusterId),

    #[error("cluster {cluster} is already attached to body {body}")]
    ClusterAlreadyOnBody { cluster: ClusterId, body: BodyId },

    #[error("cluster {parent} already contains cluster {child}")]
    ClusterContainsCluster { parent: ClusterId, child: ClusterId },

    #[error("atom {atom} of cluster {child} is already present in cluster {parent}")]
    OverlappingAtom {
        atom: AtomId,
        child: ClusterId,
        parent: ClusterId,
    },

    #[error("atom {0} is not attached to any body")]
    UnassignedAtom(AtomId),

    #[error("atom {atom} is not placed in cluster {cluster}")]
    AtomNotInCluster { atom: AtomId, cluster: ClusterId },
}

/// Mutable views over the model's stores, handed to the realization
/// pipeline so it can work on several stores at once.
pub(crate) struct ModelParts<'a> {
    pub atoms: &'a mut Vec<Atom>,
    pub clusters: &'a mut Vec<Cluster>,
    pub bodies: &'a mut Vec<Option<Body>>,
}

#[derive(Debug, Clone)]
pub struct MolecularModel {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    clusters: Vec<Cluster>,
    // Indexed by the host engine's body numbers; only entries for bodies
    // that actually carry atoms are populated.
    bodies: Vec<Option<Body>>,
}

impl Default for MolecularModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MolecularModel {
    pub fn new() -> Self {
        let mut model = Self {
            atoms: Vec::new(),
            bonds: Vec::new(),
            clusters: Vec::new(),
            bodies: Vec::new(),
        };
        let free = model.create_cluster(FREE_CLUSTER_NAME);
        debug_assert_eq!(free, ClusterId(0));
        model
    }

    // --- Validity and access ---

    pub fn is_valid_atom(&self, atom: AtomId) -> bool {
        atom.index() < self.atoms.len()
    }

    pub fn is_valid_cluster(&self, cluster: ClusterId) -> bool {
        cluster.index() < self.clusters.len()
    }

    pub fn is_valid_body(&self, body: BodyId) -> bool {
        self.bodies
            .get(body.index())
            .is_some_and(|slot| slot.is_some())
    }

    pub fn atom(&self, atom: AtomId) -> Option<&Atom> {
        self.atoms.get(atom.index())
    }

    pub fn bond(&self, bond: BondId) -> Option<&Bond> {
        self.bonds.get(bond.index())
    }

    pub fn cluster(&self, cluster: ClusterId) -> Option<&Cluster> {
        self.clusters.get(cluster.index())
    }

    pub fn body(&self, body: BodyId) -> Option<&Body> {
        self.bodies.get(body.index()).and_then(|slot| slot.as_ref())
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// The body array as indexed by host body ids; unused slots are `None`.
    pub fn body_slots(&self) -> &[Option<Body>] {
        &self.bodies
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn n_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub(crate) fn parts_mut(&mut self) -> ModelParts<'_> {
        ModelParts {
            atoms: &mut self.atoms,
            clusters: &mut self.clusters,
            bodies: &mut self.bodies,
        }
    }

    fn check_atom(&self, atom: AtomId) -> Result<(), TopologyError> {
        if self.is_valid_atom(atom) {
            Ok(())
        } else {
            Err(TopologyError::InvalidAtom(atom))
        }
    }

    fn check_cluster(&self, cluster: ClusterId) -> Result<(), TopologyError> {
        if self.is_valid_cluster(cluster) {
            Ok(())
        } else {
            Err(TopologyError::InvalidCluster(cluster))
        }
    }

    // --- Definition-phase construction ---

    pub fn add_atom(&mut self, charged_type: ChargedTypeId) -> AtomId {
        let id = AtomId(self.atoms.len());
        self.atoms.push(Atom::new(id, charged_type));
        id
    }

    /// Inserts an undirected bond. Re-adding an existing bond (in either
    /// atom order) is idempotent and returns the original bond id.
    pub fn add_bond(
        &mut self,
        atom1: AtomId,
        atom2: AtomId,
    ) -> Result<BondId, TopologyError> {
        self.check_atom(atom1)?;
        self.check_atom(atom2)?;
        if atom1 == atom2 {
            return Err(TopologyError::SelfBond(atom1));
        }

        let bond = Bond::new(atom1, atom2);
        if let Some(existing) = self.bonds.iter().position(|b| *b == bond) {
            return Ok(BondId(existing));
        }

        self.bonds.push(bond);
        self.atoms[bond.atom1.index()].bond12.push(bond.atom2);
        self.atoms[bond.atom2.index()].bond12.push(bond.atom1);
        Ok(BondId(self.bonds.len() - 1))
    }

    pub fn create_cluster(&mut self, name: &str) -> ClusterId {
        let id = ClusterId(self.clusters.len());
        self.clusters.push(Cluster::new(id, name));
        id
    }

    /// Places an atom at a fixed station in a top-level cluster. If the
    /// cluster is already attached to a body, the atom is attached to that
    /// body at the composed station in the same step.
    pub fn place_atom_in_cluster(
        &mut self,
        atom: AtomId,
        cluster: ClusterId,
        station: Point3<f64>,
    ) -> Result<(), TopologyError> {
        self.check_atom(atom)?;
        self.check_cluster(cluster)?;

        let c = &self.clusters[cluster.index()];
        if !c.is_top_level() {
            return Err(TopologyError::ClusterNotTopLevel(cluster));
        }
        if let Some(body) = self.atoms[atom.index()].body {
            return Err(TopologyError::AtomAlreadyOnBody { atom, body });
        }
        if c.contains_atom(atom) {
            return Err(TopologyError::AtomAlreadyInCluster {
                cluster,
                name: c.name.clone(),
                atom,
            });
        }
        let attached = c.body.map(|body| (body, c.placement_b));

        let c = &mut self.clusters[cluster.index()];
        c.direct_atoms.insert(atom, station);
        c.all_atoms.insert(atom, station);

        if let Some((body, placement)) = attached {
            self.atoms[atom.index()].attach_to_body(body, placement * station);
        }
        Ok(())
    }

    /// Whether `needle` appears anywhere in `haystack`'s subtree.
    pub fn cluster_contains_cluster(&self, haystack: ClusterId, needle: ClusterId) -> bool {
        let c = &self.clusters[haystack.index()];
        if c.direct_clusters.contains_key(&needle) {
            return true;
        }
        c.direct_clusters
            .keys()
            .any(|&child| self.cluster_contains_cluster(child, needle))
    }

    /// Places a child cluster at a fixed transform in a top-level parent.
    /// Every atom of the child becomes part of the parent's flattened atom
    /// set; if the parent is on a body, the child subtree is attached.
    pub fn place_cluster_in_cluster(
        &mut self,
        child: ClusterId,
        parent: ClusterId,
        placement: Isometry3<f64>,
    ) -> Result<(), TopologyError> {
        self.check_cluster(child)?;
        self.check_cluster(parent)?;

        if child == parent || self.cluster_contains_cluster(parent, child) {
            return Err(TopologyError::ClusterContainsCluster { parent, child });
        }
        if !self.clusters[parent.index()].is_top_level() {
            return Err(TopologyError::ClusterNotTopLevel(parent));
        }
        if let Some(body) = self.clusters[child.index()].body {
            return Err(TopologyError::ClusterAlreadyOnBody {
                cluster: child,
                body,
            });
        }

        let child_atoms: Vec<(AtomId, Point3<f64>)> = self.clusters[child.index()]
            .all_atoms
            .iter()
            .map(|(&atom, &station)| (atom, station))
            .collect();

        let p = &self.clusters[parent.index()];
        for &(atom, _) in &child_atoms {
            if p.contains_atom(atom) {
                return Err(TopologyError::OverlappingAtom {
                    atom,
                    child,
                    parent,
                });
            }
        }

        let p = &mut self.clusters[parent.index()];
        for &(atom, station) in &child_atoms {
            p.all_atoms.insert(atom, placement * station);
        }
        p.direct_clusters.insert(child, placement);
        let attached = p.body.map(|body| (body, p.placement_b));
        self.clusters[child.index()].parents.insert(parent);

        if let Some((body, parent_placement)) = attached {
            self.attach_cluster_tree(child, body, parent_placement * placement)?;
        }
        Ok(())
    }

    /// Attaches a cluster to a body via the body's internal top-level
    /// cluster, which is created lazily on first use.
    pub fn attach_cluster_to_body(
        &mut self,
        cluster: ClusterId,
        body: BodyId,
        placement: Isometry3<f64>,
    ) -> Result<(), TopologyError> {
        self.check_cluster(cluster)?;
        let body_cluster = self.ensure_body(body)?;
        self.place_cluster_in_cluster(cluster, body_cluster, placement)
    }

    /// Attaches a single atom to a body at the given station.
    pub fn attach_atom_to_body(
        &mut self,
        atom: AtomId,
        body: BodyId,
        station: Point3<f64>,
    ) -> Result<(), TopologyError> {
        self.check_atom(atom)?;
        let body_cluster = self.ensure_body(body)?;
        self.place_atom_in_cluster(atom, body_cluster, station)
    }

    /// Stamps the body assignment down a cluster subtree, attaching every
    /// directly placed atom and recursing into child clusters.
    fn attach_cluster_tree(
        &mut self,
        cluster: ClusterId,
        body: BodyId,
        placement: Isometry3<f64>,
    ) -> Result<(), TopologyError> {
        {
            let c = &mut self.clusters[cluster.index()];
            if let Some(existing) = c.body {
                return Err(TopologyError::ClusterAlreadyOnBody {
                    cluster,
                    body: existing,
                });
            }
            c.body = Some(body);
            c.placement_b = placement;
        }

        let direct_atoms: Vec<(AtomId, Point3<f64>)> = self.clusters[cluster.index()]
            .direct_atoms
            .iter()
            .map(|(&atom, &station)| (atom, station))
            .collect();
        for (atom, station) in direct_atoms {
            let entry = &mut self.atoms[atom.index()];
            if let Some(existing) = entry.body {
                return Err(TopologyError::AtomAlreadyOnBody {
                    atom,
                    body: existing,
                });
            }
            entry.attach_to_body(body, placement * station);
        }

        let children: Vec<(ClusterId, Isometry3<f64>)> = self.clusters[cluster.index()]
            .direct_clusters
            .iter()
            .map(|(&child, &child_placement)| (child, child_placement))
            .collect();
        for (child, child_placement) in children {
            self.attach_cluster_tree(child, body, placement * child_placement)?;
        }
        Ok(())
    }

    fn ensure_body(&mut self, body: BodyId) -> Result<ClusterId, TopologyError> {
        if body.index() >= self.bodies.len() {
            self.bodies.resize(body.index() + 1, None);
        }
        if let Some(existing) = &self.bodies[body.index()] {
            return Ok(existing.cluster);
        }
        let cluster = self.create_cluster(&Body::cluster_name_for(body));
        self.attach_cluster_tree(cluster, body, Isometry3::identity())?;
        self.bodies[body.index()] = Some(Body::new(cluster));
        Ok(cluster)
    }

    // --- Structural queries ---

    pub fn atom_body(&self, atom: AtomId) -> Result<BodyId, TopologyError> {
        self.check_atom(atom)?;
        self.atoms[atom.index()]
            .body
            .ok_or(TopologyError::UnassignedAtom(atom))
    }

    pub fn atom_station_on_body(&self, atom: AtomId) -> Result<Point3<f64>, TopologyError> {
        self.check_atom(atom)?;
        let entry = &self.atoms[atom.index()];
        if entry.body.is_none() {
            return Err(TopologyError::UnassignedAtom(atom));
        }
        Ok(entry.station_b)
    }

    pub fn atom_station_in_cluster(
        &self,
        atom: AtomId,
        cluster: ClusterId,
    ) -> Result<Point3<f64>, TopologyError> {
        self.check_atom(atom)?;
        self.check_cluster(cluster)?;
        self.clusters[cluster.index()]
            .all_atoms
            .get(&atom)
            .copied()
            .ok_or(TopologyError::AtomNotInCluster { atom, cluster })
    }

    pub(crate) fn invalidate_topological_caches(&mut self) {
        for atom in &mut self.atoms {
            atom.invalidate_topological_cache();
        }
        for cluster in &mut self.clusters {
            cluster.invalidate_topological_cache();
        }
        for body in self.bodies.iter_mut().flatten() {
            body.invalidate_topological_cache();
        }
    }

    /// Rebuilds each body's flattened atom array from its cluster's
    /// `all_atoms` set, sorted by atom id.
    pub(crate) fn flatten_bodies(&mut self) {
        let clusters = &self.clusters;
        for body in self.bodies.iter_mut().flatten() {
            let cluster = &clusters[body.cluster.index()];
            body.all_atoms = cluster
                .all_atoms
                .iter()
                .map(|(&atom, &station)| AtomPlacement { atom, station })
                .collect();
        }
    }
}
