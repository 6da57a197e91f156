//! Force-field parameter value types.
//!
//! Constructors take user-facing units (kcal/mol, degrees) and store
//! internal units (Da·Å²/ps², radians); validation of user input happens in
//! the catalog and subsystem layers, so the constructors here only carry
//! debug assertions on their already-checked invariants.

use super::super::units;
use crate::core::models::ids::{AtomClassId, ChargedTypeId};
use serde::{Deserialize, Serialize};

/// Effective Lennard-Jones pair parameters for two atom classes.
///
/// `dmin` is the interatomic separation at minimum energy (twice the mixed
/// radius), `emin` the well depth in internal units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VdwPair {
    pub dmin: f64,
    pub emin: f64,
}

impl VdwPair {
    /// Placeholder stored for class-id slots that were never defined; those
    /// entries are unreachable from any realized atom.
    pub(crate) const UNSET: VdwPair = VdwPair {
        dmin: f64::NAN,
        emin: f64::NAN,
    };
}

/// A chemical-environment equivalence bucket: element, expected valence and
/// the per-class vdW parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomClass {
    pub id: AtomClassId,
    pub name: String,
    /// Atomic number of the element this class refines.
    pub element: u32,
    /// Number of direct bonds expected.
    pub valence: u32,
    /// vdW radius in Å (half the like-pair dmin).
    pub vdw_radius: f64,
    /// vdW well depth in internal energy units.
    pub vdw_well_depth: f64,
    // Derived pair-parameter cache, filled at realization: entry k holds
    // the mixed parameters for class id + k, so only the diagonal and
    // upper triangle are stored. A class j < id is looked up from class j.
    pub(crate) vdw_pairs: Vec<VdwPair>,
}

impl AtomClass {
    pub fn new(
        id: AtomClassId,
        name: &str,
        element: u32,
        valence: u32,
        vdw_radius: f64,
        vdw_well_depth_kcal: f64,
    ) -> Self {
        debug_assert!(vdw_radius >= 0.0 && vdw_well_depth_kcal >= 0.0);
        Self {
            id,
            name: name.to_string(),
            element,
            valence,
            vdw_radius,
            vdw_well_depth: units::kcal_to_internal(vdw_well_depth_kcal),
            vdw_pairs: Vec::new(),
        }
    }

    /// The well depth converted back to kcal/mol, for read-back queries.
    pub fn vdw_well_depth_kcal(&self) -> f64 {
        units::internal_to_kcal(self.vdw_well_depth)
    }

    pub(crate) fn invalidate_topological_cache(&mut self) {
        self.vdw_pairs.clear();
    }
}

/// A specific partial charge assigned to an atom class.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargedAtomType {
    pub id: ChargedTypeId,
    pub name: String,
    pub atom_class: AtomClassId,
    /// Partial charge in units of the proton charge; signed.
    pub partial_charge: f64,
}

impl ChargedAtomType {
    pub fn new(id: ChargedTypeId, name: &str, atom_class: AtomClassId, partial_charge: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            atom_class,
            partial_charge,
        }
    }
}

/// Harmonic bond-stretch parameters for a class pair.
///
/// The energy is `k·(d − d0)²` with no factor of ½, so the restoring force
/// magnitude is `2k·(d − d0)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondStretch {
    /// Stiffness in internal energy units per Å².
    pub k: f64,
    /// Separation at which the force vanishes, in Å.
    pub d0: f64,
}

impl BondStretch {
    pub fn new(stiffness_kcal_per_a2: f64, nominal_length: f64) -> Self {
        debug_assert!(stiffness_kcal_per_a2 >= 0.0 && nominal_length >= 0.0);
        Self {
            k: units::kcal_to_internal(stiffness_kcal_per_a2),
            d0: nominal_length,
        }
    }
}

/// Harmonic bond-bend parameters for a class triple.
///
/// The energy is `k·(θ − θ0)²` with no factor of ½.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondBend {
    /// Stiffness in internal energy units per rad².
    pub k: f64,
    /// Unstressed angle in radians, in [0, π].
    pub theta0: f64,
}

impl BondBend {
    pub fn new(stiffness_kcal_per_rad2: f64, nominal_angle_deg: f64) -> Self {
        debug_assert!(stiffness_kcal_per_rad2 >= 0.0);
        debug_assert!((0.0..=180.0).contains(&nominal_angle_deg));
        Self {
            k: units::kcal_to_internal(stiffness_kcal_per_rad2),
            theta0: nominal_angle_deg.to_radians(),
        }
    }
}

/// One periodic term of a torsion.
///
/// The torsion angle follows the polymer convention (θ = 0 when the outer
/// atoms eclipse); energy is `amp·(1 + cos(nθ − φ))` and the torque applied
/// about the bond axis is `n·amp·sin(nθ − φ)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsionTerm {
    /// Periodicity n: 1 ⇒ 360°, 2 ⇒ 180°, 3 ⇒ 120°, …; in [1, 6].
    pub periodicity: u32,
    /// Amplitude in internal energy units, ≥ 0.
    pub amplitude: f64,
    /// Phase offset in radians, in (−π, π].
    pub phase: f64,
}

impl TorsionTerm {
    pub fn new(periodicity: u32, amplitude_kcal: f64, phase_deg: f64) -> Self {
        debug_assert!((1..=6).contains(&periodicity));
        debug_assert!(amplitude_kcal >= 0.0);
        Self {
            periodicity,
            amplitude: units::kcal_to_internal(amplitude_kcal),
            phase: phase_deg.to_radians(),
        }
    }

    #[inline]
    pub fn energy(&self, theta: f64) -> f64 {
        self.amplitude * (1.0 + (self.periodicity as f64 * theta - self.phase).cos())
    }

    #[inline]
    pub fn torque(&self, theta: f64) -> f64 {
        self.periodicity as f64
            * self.amplitude
            * (self.periodicity as f64 * theta - self.phase).sin()
    }
}

/// A full torsion: one to three periodic terms with distinct periodicities.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BondTorsion {
    pub terms: Vec<TorsionTerm>,
}

impl BondTorsion {
    pub fn has_term(&self, periodicity: u32) -> bool {
        self.terms.iter().any(|t| t.periodicity == periodicity)
    }

    pub(crate) fn add_term(&mut self, term: TorsionTerm) {
        debug_assert!(!self.has_term(term.periodicity));
        self.terms.push(term);
    }
}

/// Definition-time wire form of one torsion term, in user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorsionSpec {
    pub periodicity: u32,
    pub amplitude_kcal: f64,
    /// Phase in degrees, in [0, 180].
    pub phase_deg: f64,
}

/// Bonded-path distance between two atoms, counted along the shortest
/// chain of bonds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BondSeparation {
    OneTwo,
    OneThree,
    OneFour,
    OneFive,
}

impl BondSeparation {
    #[inline]
    fn slot(self) -> usize {
        match self {
            BondSeparation::OneTwo => 0,
            BondSeparation::OneThree => 1,
            BondSeparation::OneFour => 2,
            BondSeparation::OneFive => 3,
        }
    }
}

/// Scale factors applied to non-bonded terms for atom pairs that are also
/// within a short bonded path. Each factor is in [0, 1]; by convention 1-2
/// and 1-3 interactions are fully excluded and 1-4/1-5 fully included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleFactors {
    vdw: [f64; 4],
    coulomb: [f64; 4],
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self {
            vdw: [0.0, 0.0, 1.0, 1.0],
            coulomb: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

impl ScaleFactors {
    #[inline]
    pub fn vdw(&self, separation: BondSeparation) -> f64 {
        self.vdw[separation.slot()]
    }

    #[inline]
    pub fn coulomb(&self, separation: BondSeparation) -> f64 {
        self.coulomb[separation.slot()]
    }

    pub fn set_vdw(&mut self, separation: BondSeparation, factor: f64) {
        debug_assert!((0.0..=1.0).contains(&factor));
        self.vdw[separation.slot()] = factor;
    }

    pub fn set_coulomb(&mut self, separation: BondSeparation, factor: f64) {
        debug_assert!((0.0..=1.0).contains(&factor));
        self.coulomb[separation.slot()] = factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn atom_class_converts_well_depth_and_reads_it_back() {
        let class = AtomClass::new(AtomClassId(3), "CT", 6, 4, 1.908, 0.109);
        assert!(f64_approx_equal(class.vdw_well_depth, 0.109 * 418.4));
        assert!(f64_approx_equal(class.vdw_well_depth_kcal(), 0.109));
    }

    #[test]
    fn bond_stretch_stores_internal_stiffness() {
        let stretch = BondStretch::new(340.0, 1.09);
        assert!(f64_approx_equal(stretch.k, 340.0 * 418.4));
        assert_eq!(stretch.d0, 1.09);
    }

    #[test]
    fn bond_bend_converts_angle_to_radians() {
        let bend = BondBend::new(50.0, 109.5);
        assert!(f64_approx_equal(bend.theta0, 109.5_f64.to_radians()));
        assert!(f64_approx_equal(bend.k, 50.0 * 418.4));
    }

    #[test]
    fn torsion_term_energy_and_torque_match_their_definitions() {
        let term = TorsionTerm::new(3, 1.0, 0.0);
        let amp = 418.4;
        assert!(f64_approx_equal(term.energy(PI), amp * (1.0 + (3.0 * PI).cos())));
        assert!(term.energy(PI).abs() < 1e-9);
        assert!(f64_approx_equal(term.energy(0.0), 2.0 * amp));
        assert!(f64_approx_equal(term.torque(PI / 6.0), 3.0 * amp * (PI / 2.0).sin()));
    }

    #[test]
    fn torsion_energy_is_periodic_in_two_pi_over_n() {
        let term = TorsionTerm::new(3, 0.8, 30.0);
        for theta in [-2.0, -0.3, 0.0, 1.1, 2.9] {
            let shifted = theta + 2.0 * PI / 3.0;
            assert!(
                (term.energy(theta) - term.energy(shifted)).abs() < 1e-9,
                "energy not periodic at theta = {}",
                theta
            );
        }
    }

    #[test]
    fn bond_torsion_tracks_term_periodicities() {
        let mut torsion = BondTorsion::default();
        torsion.add_term(TorsionTerm::new(2, 0.5, 180.0));
        torsion.add_term(TorsionTerm::new(3, 1.0, 0.0));
        assert!(torsion.has_term(2));
        assert!(torsion.has_term(3));
        assert!(!torsion.has_term(1));
    }

    #[test]
    fn scale_factors_default_to_exclusion_below_one_four() {
        let factors = ScaleFactors::default();
        assert_eq!(factors.vdw(BondSeparation::OneTwo), 0.0);
        assert_eq!(factors.coulomb(BondSeparation::OneThree), 0.0);
        assert_eq!(factors.vdw(BondSeparation::OneFour), 1.0);
        assert_eq!(factors.coulomb(BondSeparation::OneFive), 1.0);
    }

    #[test]
    fn scale_factors_setters_update_one_slot_only() {
        let mut factors = ScaleFactors::default();
        factors.set_vdw(BondSeparation::OneFour, 0.5);
        factors.set_coulomb(BondSeparation::OneFour, 0.8333);
        assert_eq!(factors.vdw(BondSeparation::OneFour), 0.5);
        assert_eq!(factors.coulomb(BondSeparation::OneFour), 0.8333);
        assert_eq!(factors.vdw(BondSeparation::OneFive), 1.0);
        assert_eq!(factors.vdw(BondSeparation::OneTwo), 0.0);
    }
}
