//! The host-facing force-field subsystem.
//!
//! A subsystem moves through two phases. During definition, classes,
//! types, bonded parameters, atoms, bonds and cluster placements are
//! built up; every mutating call clears the topology-valid flag. A single
//! idempotent [`realize_topology`](ForceFieldSubsystem::realize_topology)
//! call then freezes the topology and fills every derived cache, after
//! which [`evaluate`](ForceFieldSubsystem::evaluate) may be called any
//! number of times against externally supplied body poses.

use super::error::EngineError;
use super::kernel;
use super::multibody::{MassProperties, MultibodyState, SpatialForce};
use super::realize;
use crate::core::elements;
use crate::core::forcefield::catalog::{CatalogError, ForceFieldCatalog};
use crate::core::forcefield::mixing::VdwMixingRule;
use crate::core::forcefield::params::{BondSeparation, ScaleFactors, TorsionSpec};
use crate::core::models::ids::{AtomClassId, AtomId, BodyId, BondId, ChargedTypeId, ClusterId};
use crate::core::models::system::MolecularModel;
use nalgebra::{Isometry3, Matrix3, Point3};

pub struct ForceFieldSubsystem {
    pub(crate) model: MolecularModel,
    pub(crate) catalog: ForceFieldCatalog,
    pub(crate) scale_factors: ScaleFactors,
    pub(crate) mixing_rule: VdwMixingRule,
    pub(crate) topology_valid: bool,
}

impl Default for ForceFieldSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceFieldSubsystem {
    pub fn new() -> Self {
        Self {
            model: MolecularModel::new(),
            catalog: ForceFieldCatalog::new(),
            scale_factors: ScaleFactors::default(),
            mixing_rule: VdwMixingRule::default(),
            topology_valid: false,
        }
    }

    // --- Force field definition ---

    /// Defines an atom class: an element refined by expected valence and
    /// per-class vdW parameters (radius in Å, well depth in kcal/mol).
    pub fn define_atom_class(
        &mut self,
        id: AtomClassId,
        name: &str,
        element: u32,
        valence: u32,
        vdw_radius: f64,
        vdw_well_depth_kcal: f64,
    ) -> Result<(), EngineError> {
        self.catalog
            .define_atom_class(id, name, element, valence, vdw_radius, vdw_well_depth_kcal)?;
        self.topology_valid = false;
        Ok(())
    }

    /// Defines a charged atom type: an atom class with a partial charge in
    /// units of the proton charge.
    pub fn define_charged_atom_type(
        &mut self,
        id: ChargedTypeId,
        name: &str,
        atom_class: AtomClassId,
        partial_charge: f64,
    ) -> Result<(), EngineError> {
        self.catalog
            .define_charged_atom_type(id, name, atom_class, partial_charge)?;
        self.topology_valid = false;
        Ok(())
    }

    /// Defines bond-stretch parameters for an unordered class pair;
    /// stiffness in kcal/mol/Å², nominal length in Å.
    pub fn define_bond_stretch(
        &mut self,
        class1: AtomClassId,
        class2: AtomClassId,
        stiffness_kcal_per_a2: f64,
        nominal_length: f64,
    ) -> Result<(), EngineError> {
        self.catalog
            .define_bond_stretch(class1, class2, stiffness_kcal_per_a2, nominal_length)?;
        self.topology_valid = false;
        Ok(())
    }

    /// Defines bond-bend parameters for a class triple whose middle class
    /// is the vertex atom; stiffness in kcal/mol/rad², angle in degrees.
    pub fn define_bond_bend(
        &mut self,
        class1: AtomClassId,
        class2: AtomClassId,
        class3: AtomClassId,
        stiffness_kcal_per_rad2: f64,
        nominal_angle_deg: f64,
    ) -> Result<(), EngineError> {
        self.catalog.define_bond_bend(
            class1,
            class2,
            class3,
            stiffness_kcal_per_rad2,
            nominal_angle_deg,
        )?;
        self.topology_valid = false;
        Ok(())
    }

    /// Defines bond-torsion parameters for a class quad: one to three
    /// periodic terms with distinct periodicities.
    pub fn define_bond_torsion(
        &mut self,
        class1: AtomClassId,
        class2: AtomClassId,
        class3: AtomClassId,
        class4: AtomClassId,
        terms: &[TorsionSpec],
    ) -> Result<(), EngineError> {
        self.catalog
            .define_bond_torsion(class1, class2, class3, class4, terms)?;
        self.topology_valid = false;
        Ok(())
    }

    fn check_scale_factor(factor: f64) -> Result<(), EngineError> {
        if factor.is_finite() && (0.0..=1.0).contains(&factor) {
            Ok(())
        } else {
            Err(CatalogError::ScaleFactorOutOfRange(factor).into())
        }
    }

    /// Sets the vdW scale factor for pairs at the given bonded separation.
    pub fn set_vdw_scale_factor(
        &mut self,
        separation: BondSeparation,
        factor: f64,
    ) -> Result<(), EngineError> {
        Self::check_scale_factor(factor)?;
        self.scale_factors.set_vdw(separation, factor);
        Ok(())
    }

    /// Sets the Coulomb scale factor for pairs at the given bonded
    /// separation.
    pub fn set_coulomb_scale_factor(
        &mut self,
        separation: BondSeparation,
        factor: f64,
    ) -> Result<(), EngineError> {
        Self::check_scale_factor(factor)?;
        self.scale_factors.set_coulomb(separation, factor);
        Ok(())
    }

    /// Selects the vdW combining rule. The derived pair table depends on
    /// it, so the topology must be re-realized afterwards.
    pub fn set_mixing_rule(&mut self, rule: VdwMixingRule) {
        self.mixing_rule = rule;
        self.topology_valid = false;
    }

    pub fn mixing_rule(&self) -> VdwMixingRule {
        self.mixing_rule
    }

    pub fn vdw_scale_factor(&self, separation: BondSeparation) -> f64 {
        self.scale_factors.vdw(separation)
    }

    pub fn coulomb_scale_factor(&self, separation: BondSeparation) -> f64 {
        self.scale_factors.coulomb(separation)
    }

    // --- Molecule definition ---

    /// Adds an atom of the given charged atom type.
    pub fn add_atom(&mut self, charged_type: ChargedTypeId) -> Result<AtomId, EngineError> {
        if !self.catalog.is_valid_charged_type(charged_type) {
            return Err(CatalogError::UndefinedChargedType(charged_type).into());
        }
        let id = self.model.add_atom(charged_type);
        self.topology_valid = false;
        Ok(id)
    }

    /// Adds an undirected bond; idempotent for an existing pair.
    pub fn add_bond(&mut self, atom1: AtomId, atom2: AtomId) -> Result<BondId, EngineError> {
        let id = self.model.add_bond(atom1, atom2)?;
        self.topology_valid = false;
        Ok(id)
    }

    /// Creates an empty named cluster.
    pub fn create_cluster(&mut self, name: &str) -> ClusterId {
        self.topology_valid = false;
        self.model.create_cluster(name)
    }

    pub fn place_atom_in_cluster(
        &mut self,
        atom: AtomId,
        cluster: ClusterId,
        station: Point3<f64>,
    ) -> Result<(), EngineError> {
        self.model.place_atom_in_cluster(atom, cluster, station)?;
        self.topology_valid = false;
        Ok(())
    }

    pub fn place_cluster_in_cluster(
        &mut self,
        child: ClusterId,
        parent: ClusterId,
        placement: Isometry3<f64>,
    ) -> Result<(), EngineError> {
        self.model.place_cluster_in_cluster(child, parent, placement)?;
        self.topology_valid = false;
        Ok(())
    }

    pub fn attach_cluster_to_body(
        &mut self,
        cluster: ClusterId,
        body: BodyId,
        placement: Isometry3<f64>,
    ) -> Result<(), EngineError> {
        self.model.attach_cluster_to_body(cluster, body, placement)?;
        self.topology_valid = false;
        Ok(())
    }

    pub fn attach_atom_to_body(
        &mut self,
        atom: AtomId,
        body: BodyId,
        station: Point3<f64>,
    ) -> Result<(), EngineError> {
        self.model.attach_atom_to_body(atom, body, station)?;
        self.topology_valid = false;
        Ok(())
    }

    /// Composite mass properties of a cluster in the given frame.
    // TODO: compute the real composite properties from the flattened atom
    // placements and element masses; until then every cluster reports unit
    // mass at the origin with unit inertia.
    pub fn calc_cluster_mass_properties(
        &self,
        cluster: ClusterId,
        _transform: Isometry3<f64>,
    ) -> Result<MassProperties, EngineError> {
        if self.model.cluster(cluster).is_none() {
            return Err(crate::core::models::system::TopologyError::InvalidCluster(cluster).into());
        }
        Ok(MassProperties {
            mass: 1.0,
            center_of_mass: Point3::origin(),
            inertia: Matrix3::identity(),
        })
    }

    // --- Structural queries ---

    pub fn model(&self) -> &MolecularModel {
        &self.model
    }

    pub fn catalog(&self) -> &ForceFieldCatalog {
        &self.catalog
    }

    pub fn n_atoms(&self) -> usize {
        self.model.n_atoms()
    }

    pub fn n_bonds(&self) -> usize {
        self.model.n_bonds()
    }

    pub fn bond_atoms(&self, bond: BondId) -> Option<(AtomId, AtomId)> {
        self.model.bond(bond).map(|b| (b.atom1, b.atom2))
    }

    /// The atom class behind an atom's charged type.
    pub fn atom_class_id(&self, atom: AtomId) -> Option<AtomClassId> {
        let atom = self.model.atom(atom)?;
        self.catalog.class_of_type(atom.charged_type)
    }

    /// The atomic number of an atom's element.
    pub fn atom_element(&self, atom: AtomId) -> Option<u32> {
        let class = self.atom_class_id(atom)?;
        self.catalog.atom_class(class).map(|c| c.element)
    }

    /// The element mass of an atom, in daltons.
    pub fn atom_mass(&self, atom: AtomId) -> Option<f64> {
        let element = self.atom_element(atom)?;
        elements::by_atomic_number(element).map(|e| e.mass)
    }

    /// The per-class vdW radius of an atom, in Å.
    pub fn atom_radius(&self, atom: AtomId) -> Option<f64> {
        let class = self.atom_class_id(atom)?;
        self.catalog.atom_class(class).map(|c| c.vdw_radius)
    }

    /// The default display colour of an atom's element.
    pub fn atom_default_color(&self, atom: AtomId) -> Option<[f64; 3]> {
        let element = self.atom_element(atom)?;
        elements::by_atomic_number(element).map(|e| e.default_color)
    }

    // --- Realization and evaluation ---

    /// Whether the derived topology caches are valid.
    pub fn is_topology_realized(&self) -> bool {
        self.topology_valid
    }

    /// The one-shot transition from mutable definition to the frozen,
    /// evaluable topology. Idempotent: repeated calls after a successful
    /// realization return immediately.
    pub fn realize_topology(&mut self) -> Result<(), EngineError> {
        realize::realize(self)
    }

    /// Evaluates the potential energy and per-body spatial forces for the
    /// configuration supplied by `state`, adding into the caller's
    /// accumulators. The topology must have been realized; `body_forces`
    /// must cover every body index the subsystem knows about.
    pub fn evaluate<S: MultibodyState>(
        &self,
        state: &S,
        potential_energy: &mut f64,
        body_forces: &mut [SpatialForce],
    ) {
        assert!(
            self.topology_valid,
            "evaluate called before realize_topology"
        );
        assert!(
            body_forces.len() >= self.model.body_slots().len(),
            "body force accumulator does not cover every body"
        );
        kernel::evaluate(self, state, potential_energy, body_forces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subsystem_with_hydrogen_class() -> ForceFieldSubsystem {
        let mut ff = ForceFieldSubsystem::new();
        ff.define_atom_class(AtomClassId(0), "HX", 1, 1, 1.2, 0.02)
            .unwrap();
        ff.define_charged_atom_type(ChargedTypeId(0), "HX+", AtomClassId(0), 0.1)
            .unwrap();
        ff
    }

    #[test]
    fn add_atom_requires_a_defined_charged_type() {
        let mut ff = ForceFieldSubsystem::new();
        assert!(matches!(
            ff.add_atom(ChargedTypeId(0)),
            Err(EngineError::Catalog {
                source: CatalogError::UndefinedChargedType(ChargedTypeId(0))
            })
        ));
    }

    #[test]
    fn scale_factors_outside_unit_interval_are_rejected() {
        let mut ff = ForceFieldSubsystem::new();
        assert!(ff.set_vdw_scale_factor(BondSeparation::OneFour, 1.5).is_err());
        assert!(ff
            .set_coulomb_scale_factor(BondSeparation::OneTwo, -0.1)
            .is_err());
        assert!(ff
            .set_coulomb_scale_factor(BondSeparation::OneTwo, f64::NAN)
            .is_err());
        ff.set_vdw_scale_factor(BondSeparation::OneFour, 0.5).unwrap();
        assert_eq!(ff.vdw_scale_factor(BondSeparation::OneFour), 0.5);
    }

    #[test]
    fn mutating_calls_invalidate_the_realized_topology() {
        let mut ff = subsystem_with_hydrogen_class();
        let a = ff.add_atom(ChargedTypeId(0)).unwrap();
        ff.attach_atom_to_body(a, BodyId(0), Point3::origin()).unwrap();
        ff.realize_topology().unwrap();
        assert!(ff.is_topology_realized());

        let b = ff.add_atom(ChargedTypeId(0)).unwrap();
        assert!(!ff.is_topology_realized());
        ff.attach_atom_to_body(b, BodyId(1), Point3::origin()).unwrap();
        ff.realize_topology().unwrap();
        assert!(ff.is_topology_realized());
    }

    #[test]
    fn changing_the_mixing_rule_invalidates_the_topology() {
        let mut ff = subsystem_with_hydrogen_class();
        let a = ff.add_atom(ChargedTypeId(0)).unwrap();
        ff.attach_atom_to_body(a, BodyId(0), Point3::origin()).unwrap();
        ff.realize_topology().unwrap();
        ff.set_mixing_rule(VdwMixingRule::Jorgensen);
        assert!(!ff.is_topology_realized());
    }

    #[test]
    fn opaque_accessors_resolve_through_class_and_element() {
        let mut ff = subsystem_with_hydrogen_class();
        let a = ff.add_atom(ChargedTypeId(0)).unwrap();
        assert_eq!(ff.atom_element(a), Some(1));
        assert_eq!(ff.atom_mass(a), Some(1.008));
        assert_eq!(ff.atom_radius(a), Some(1.2));
        assert_eq!(ff.atom_default_color(a), Some([0.0, 1.0, 0.0]));
    }

    #[test]
    fn mass_properties_stub_reports_unit_mass_at_origin() {
        let mut ff = ForceFieldSubsystem::new();
        let cluster = ff.create_cluster("g");
        let props = ff
            .calc_cluster_mass_properties(cluster, Isometry3::identity())
            .unwrap();
        assert_eq!(props.mass, 1.0);
        assert_eq!(props.center_of_mass, Point3::origin());
        assert!(ff
            .calc_cluster_mass_properties(ClusterId(99), Isometry3::identity())
            .is_err());
    }
}
