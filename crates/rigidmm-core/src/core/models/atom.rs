//! The per-atom record: identity, direct bonds, body assignment and the
//! derived bonded-neighbour caches.

use super::ids::{AtomId, BodyId, ChargedTypeId};
use crate::core::forcefield::params::{BondBend, BondStretch, BondTorsion};
use nalgebra::Point3;

/// A 1-3 chain from some atom: the intermediate atom and the far end.
pub type PathPair = (AtomId, AtomId);
/// A 1-4 chain: two intermediates and the far end.
pub type PathTriple = (AtomId, AtomId, AtomId);
/// A 1-5 chain: three intermediates and the far end.
pub type PathQuad = (AtomId, AtomId, AtomId, AtomId);

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    // --- Topological state, filled during definition ---
    pub id: AtomId,
    pub charged_type: ChargedTypeId,
    /// Directly bonded neighbours; sorted ascending once realized.
    pub bond12: Vec<AtomId>,
    /// Body this atom is fixed to, once it (or a containing cluster) has
    /// been attached.
    pub body: Option<BodyId>,
    /// Station fixed in the attached body's frame.
    pub station_b: Point3<f64>,

    // --- Topological cache, filled at realization ---
    // Shortest-path bonded neighbours: the current atom is always the "1"
    // and is not stored. An atom reachable in two bonds is recorded in
    // bond13 only, never again in bond14/bond15.
    pub bond13: Vec<PathPair>,
    pub bond14: Vec<PathTriple>,
    pub bond15: Vec<PathQuad>,

    // Cross-body subsets: chains retained only when at least one non-self
    // atom lies on a different body. Each such chain appears in the lists
    // of both end atoms; the energy path breaks the tie by endpoint id
    // while the scaling path needs both copies.
    pub xbond12: Vec<AtomId>,
    pub xbond13: Vec<PathPair>,
    pub xbond14: Vec<PathTriple>,
    pub xbond15: Vec<PathQuad>,

    /// Resolved stretch parameters, index-parallel to `xbond12`.
    pub stretch: Vec<BondStretch>,
    /// Resolved bend parameters, index-parallel to `xbond13`.
    pub bend: Vec<BondBend>,
    /// Resolved torsion parameters, index-parallel to `xbond14`.
    pub torsion: Vec<BondTorsion>,
}

impl Atom {
    pub fn new(id: AtomId, charged_type: ChargedTypeId) -> Self {
        Self {
            id,
            charged_type,
            bond12: Vec::new(),
            body: None,
            station_b: Point3::origin(),
            bond13: Vec::new(),
            bond14: Vec::new(),
            bond15: Vec::new(),
            xbond12: Vec::new(),
            xbond13: Vec::new(),
            xbond14: Vec::new(),
            xbond15: Vec::new(),
            stretch: Vec::new(),
            bend: Vec::new(),
            torsion: Vec::new(),
        }
    }

    pub fn is_attached_to_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn is_bonded_to(&self, other: AtomId) -> bool {
        self.bond12.contains(&other)
    }

    pub(crate) fn attach_to_body(&mut self, body: BodyId, station: Point3<f64>) {
        debug_assert!(!self.is_attached_to_body());
        self.body = Some(body);
        self.station_b = station;
    }

    pub(crate) fn invalidate_topological_cache(&mut self) {
        self.body = None;
        self.station_b = Point3::origin();
        self.bond13.clear();
        self.bond14.clear();
        self.bond15.clear();
        self.xbond12.clear();
        self.xbond13.clear();
        self.xbond14.clear();
        self.xbond15.clear();
        self.stretch.clear();
        self.bend.clear();
        self.torsion.clear();
    }
}
