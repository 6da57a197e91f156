//! Keyed parameter tables with canonical class-tuple keys.
//!
//! Bonded parameters are looked up by the atom classes along the chain.
//! Since a chain read backwards is the same chain, every key is stored in a
//! canonical orientation: pairs sorted ascending, triples with the vertex
//! class fixed in the middle and the outer classes sorted, quads reversed
//! as a whole when the outer pair is out of order.

use super::mixing::VdwMixingRule;
use super::params::{
    AtomClass, BondBend, BondStretch, BondTorsion, ChargedAtomType, TorsionSpec, TorsionTerm,
    VdwPair,
};
use crate::core::elements;
use crate::core::models::ids::{AtomClassId, ChargedTypeId};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Canonical unordered atom-class pair (bond-stretch key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassPair([AtomClassId; 2]);

impl ClassPair {
    pub fn new(a: AtomClassId, b: AtomClassId) -> Self {
        if a <= b { Self([a, b]) } else { Self([b, a]) }
    }
}

impl fmt::Display for ClassPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.0[0], self.0[1])
    }
}

/// Canonical atom-class triple (bond-bend key); the middle class is the
/// vertex atom and stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassTriple([AtomClassId; 3]);

impl ClassTriple {
    pub fn new(a: AtomClassId, b: AtomClassId, c: AtomClassId) -> Self {
        if a <= c { Self([a, b, c]) } else { Self([c, b, a]) }
    }
}

impl fmt::Display for ClassTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0[0], self.0[1], self.0[2])
    }
}

/// Canonical atom-class quad (bond-torsion key); reversing the chain swaps
/// the outer pair and the inner pair together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassQuad([AtomClassId; 4]);

impl ClassQuad {
    pub fn new(a: AtomClassId, b: AtomClassId, c: AtomClassId, d: AtomClassId) -> Self {
        if a <= d { Self([a, b, c, d]) } else { Self([d, c, b, a]) }
    }
}

impl fmt::Display for ClassQuad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{},{})", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Errors raised while defining force-field parameters, or when a bonded
/// chain spanning bodies turns out to have no catalog entry.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("atomic number {0} has no element table entry")]
    UnknownElement(u32),

    #[error("atom class {0} is not defined")]
    UndefinedAtomClass(AtomClassId),

    #[error("charged atom type {0} is not defined")]
    UndefinedChargedType(ChargedTypeId),

    #[error("atom class {id} is already in use for '{existing}'")]
    AtomClassAlreadyDefined { id: AtomClassId, existing: String },

    #[error("charged atom type {id} is already in use for '{existing}'")]
    ChargedTypeAlreadyDefined { id: ChargedTypeId, existing: String },

    #[error("a bond stretch term is already defined for class pair {0}")]
    StretchAlreadyDefined(ClassPair),

    #[error("a bond bend term is already defined for class triple {0}")]
    BendAlreadyDefined(ClassTriple),

    #[error("bond torsion terms are already defined for class quad {0}")]
    TorsionAlreadyDefined(ClassQuad),

    #[error("{quantity} must be a finite, non-negative number, got {value}")]
    InvalidQuantity { quantity: &'static str, value: f64 },

    #[error("nominal angle {0}° is outside [0, 180]")]
    AngleOutOfRange(f64),

    #[error("torsion periodicity {0} is outside [1, 6]")]
    PeriodicityOutOfRange(u32),

    #[error("torsion periodicity {0} may only be specified once")]
    DuplicatePeriodicity(u32),

    #[error("a torsion takes between one and three terms, got {0}")]
    TorsionTermCount(usize),

    #[error("torsion phase angle {0}° is outside [0, 180]")]
    PhaseOutOfRange(f64),

    #[error("scale factor {0} is outside [0, 1]")]
    ScaleFactorOutOfRange(f64),

    #[error("no bond stretch parameters defined for class pair {0}")]
    MissingStretch(ClassPair),

    #[error("no bond bend parameters defined for class triple {0}")]
    MissingBend(ClassTriple),

    #[error("no bond torsion parameters defined for class quad {0}")]
    MissingTorsion(ClassQuad),
}

fn check_nonnegative(quantity: &'static str, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CatalogError::InvalidQuantity { quantity, value })
    }
}

/// The keyed parameter tables of the force field: atom classes, charged
/// atom types, and the stretch/bend/torsion tables keyed by canonical
/// class tuples. Class and type slots are append-only and keyed by the
/// user-chosen id, which may leave gaps.
#[derive(Debug, Clone, Default)]
pub struct ForceFieldCatalog {
    classes: Vec<Option<AtomClass>>,
    charged_types: Vec<Option<ChargedAtomType>>,
    stretch: BTreeMap<ClassPair, BondStretch>,
    bend: BTreeMap<ClassTriple, BondBend>,
    torsion: BTreeMap<ClassQuad, BondTorsion>,
}

impl ForceFieldCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid_class(&self, id: AtomClassId) -> bool {
        self.classes.get(id.index()).is_some_and(|slot| slot.is_some())
    }

    pub fn is_valid_charged_type(&self, id: ChargedTypeId) -> bool {
        self.charged_types
            .get(id.index())
            .is_some_and(|slot| slot.is_some())
    }

    pub fn atom_class(&self, id: AtomClassId) -> Option<&AtomClass> {
        self.classes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    pub fn charged_type(&self, id: ChargedTypeId) -> Option<&ChargedAtomType> {
        self.charged_types
            .get(id.index())
            .and_then(|slot| slot.as_ref())
    }

    /// The atom class a charged type refines. Realized topologies only ever
    /// hold valid type ids, so the hot path may index through this freely.
    pub fn class_of_type(&self, id: ChargedTypeId) -> Option<AtomClassId> {
        self.charged_type(id).map(|t| t.atom_class)
    }

    fn ensure_class_ok(&self, id: AtomClassId) -> Result<(), CatalogError> {
        if self.is_valid_class(id) {
            Ok(())
        } else {
            Err(CatalogError::UndefinedAtomClass(id))
        }
    }

    pub fn define_atom_class(
        &mut self,
        id: AtomClassId,
        name: &str,
        element: u32,
        valence: u32,
        vdw_radius: f64,
        vdw_well_depth_kcal: f64,
    ) -> Result<(), CatalogError> {
        if !elements::is_valid_element(element) {
            return Err(CatalogError::UnknownElement(element));
        }
        check_nonnegative("van der Waals radius", vdw_radius)?;
        check_nonnegative("van der Waals well depth", vdw_well_depth_kcal)?;

        if id.index() >= self.classes.len() {
            self.classes.resize(id.index() + 1, None);
        }
        if let Some(existing) = &self.classes[id.index()] {
            return Err(CatalogError::AtomClassAlreadyDefined {
                id,
                existing: existing.name.clone(),
            });
        }
        self.classes[id.index()] = Some(AtomClass::new(
            id,
            name,
            element,
            valence,
            vdw_radius,
            vdw_well_depth_kcal,
        ));
        Ok(())
    }

    pub fn define_charged_atom_type(
        &mut self,
        id: ChargedTypeId,
        name: &str,
        atom_class: AtomClassId,
        partial_charge: f64,
    ) -> Result<(), CatalogError> {
        self.ensure_class_ok(atom_class)?;
        // The charge is a signed quantity; only reject non-numbers.
        if !partial_charge.is_finite() {
            return Err(CatalogError::InvalidQuantity {
                quantity: "partial charge",
                value: partial_charge,
            });
        }

        if id.index() >= self.charged_types.len() {
            self.charged_types.resize(id.index() + 1, None);
        }
        if let Some(existing) = &self.charged_types[id.index()] {
            return Err(CatalogError::ChargedTypeAlreadyDefined {
                id,
                existing: existing.name.clone(),
            });
        }
        self.charged_types[id.index()] =
            Some(ChargedAtomType::new(id, name, atom_class, partial_charge));
        Ok(())
    }

    pub fn define_bond_stretch(
        &mut self,
        class1: AtomClassId,
        class2: AtomClassId,
        stiffness_kcal_per_a2: f64,
        nominal_length: f64,
    ) -> Result<(), CatalogError> {
        self.ensure_class_ok(class1)?;
        self.ensure_class_ok(class2)?;
        check_nonnegative("bond stretch stiffness", stiffness_kcal_per_a2)?;
        check_nonnegative("nominal bond length", nominal_length)?;

        let key = ClassPair::new(class1, class2);
        if self.stretch.contains_key(&key) {
            return Err(CatalogError::StretchAlreadyDefined(key));
        }
        self.stretch
            .insert(key, BondStretch::new(stiffness_kcal_per_a2, nominal_length));
        Ok(())
    }

    pub fn define_bond_bend(
        &mut self,
        class1: AtomClassId,
        class2: AtomClassId,
        class3: AtomClassId,
        stiffness_kcal_per_rad2: f64,
        nominal_angle_deg: f64,
    ) -> Result<(), CatalogError> {
        self.ensure_class_ok(class1)?;
        self.ensure_class_ok(class2)?;
        self.ensure_class_ok(class3)?;
        check_nonnegative("bond bend stiffness", stiffness_kcal_per_rad2)?;
        if !nominal_angle_deg.is_finite() || !(0.0..=180.0).contains(&nominal_angle_deg) {
            return Err(CatalogError::AngleOutOfRange(nominal_angle_deg));
        }

        let key = ClassTriple::new(class1, class2, class3);
        if self.bend.contains_key(&key) {
            return Err(CatalogError::BendAlreadyDefined(key));
        }
        self.bend.insert(
            key,
            BondBend::new(stiffness_kcal_per_rad2, nominal_angle_deg),
        );
        Ok(())
    }

    pub fn define_bond_torsion(
        &mut self,
        class1: AtomClassId,
        class2: AtomClassId,
        class3: AtomClassId,
        class4: AtomClassId,
        terms: &[TorsionSpec],
    ) -> Result<(), CatalogError> {
        self.ensure_class_ok(class1)?;
        self.ensure_class_ok(class2)?;
        self.ensure_class_ok(class3)?;
        self.ensure_class_ok(class4)?;
        if terms.is_empty() || terms.len() > 3 {
            return Err(CatalogError::TorsionTermCount(terms.len()));
        }

        let mut torsion = BondTorsion::default();
        for spec in terms {
            if !(1..=6).contains(&spec.periodicity) {
                return Err(CatalogError::PeriodicityOutOfRange(spec.periodicity));
            }
            check_nonnegative("torsion amplitude", spec.amplitude_kcal)?;
            if !spec.phase_deg.is_finite() || !(0.0..=180.0).contains(&spec.phase_deg) {
                return Err(CatalogError::PhaseOutOfRange(spec.phase_deg));
            }
            if torsion.has_term(spec.periodicity) {
                return Err(CatalogError::DuplicatePeriodicity(spec.periodicity));
            }
            torsion.add_term(TorsionTerm::new(
                spec.periodicity,
                spec.amplitude_kcal,
                spec.phase_deg,
            ));
        }

        let key = ClassQuad::new(class1, class2, class3, class4);
        if self.torsion.contains_key(&key) {
            return Err(CatalogError::TorsionAlreadyDefined(key));
        }
        self.torsion.insert(key, torsion);
        Ok(())
    }

    /// Looks up stretch parameters for a class pair, in either order.
    pub fn bond_stretch(
        &self,
        class1: AtomClassId,
        class2: AtomClassId,
    ) -> Result<&BondStretch, CatalogError> {
        let key = ClassPair::new(class1, class2);
        self.stretch
            .get(&key)
            .ok_or(CatalogError::MissingStretch(key))
    }

    /// Looks up bend parameters; `class2` is the vertex atom's class.
    pub fn bond_bend(
        &self,
        class1: AtomClassId,
        class2: AtomClassId,
        class3: AtomClassId,
    ) -> Result<&BondBend, CatalogError> {
        let key = ClassTriple::new(class1, class2, class3);
        self.bend.get(&key).ok_or(CatalogError::MissingBend(key))
    }

    /// Looks up torsion parameters for a class quad, in either orientation.
    pub fn bond_torsion(
        &self,
        class1: AtomClassId,
        class2: AtomClassId,
        class3: AtomClassId,
        class4: AtomClassId,
    ) -> Result<&BondTorsion, CatalogError> {
        let key = ClassQuad::new(class1, class2, class3, class4);
        self.torsion
            .get(&key)
            .ok_or(CatalogError::MissingTorsion(key))
    }

    /// The precomputed effective pair parameters for two classes. The
    /// upper-triangular table lives on the lower-numbered class.
    #[inline]
    pub fn vdw_pair(&self, class1: AtomClassId, class2: AtomClassId) -> VdwPair {
        let (low, high) = if class1 <= class2 {
            (class1, class2)
        } else {
            (class2, class1)
        };
        self.classes[low.index()]
            .as_ref()
            .map(|class| class.vdw_pairs[high.index() - low.index()])
            .unwrap_or(VdwPair::UNSET)
    }

    /// Clears every per-class derived cache.
    pub(crate) fn invalidate_derived(&mut self) {
        for class in self.classes.iter_mut().flatten() {
            class.invalidate_topological_cache();
        }
    }

    /// Fills the diagonal and upper triangle of the per-class pair table
    /// under the given mixing rule. Slots for undefined class ids keep the
    /// unset placeholder; no realized atom can reach them.
    pub(crate) fn realize_vdw_pairs(&mut self, rule: VdwMixingRule) {
        let n = self.classes.len();
        for i in 0..n {
            let Some((ri, ei)) = self.classes[i]
                .as_ref()
                .map(|c| (c.vdw_radius, c.vdw_well_depth))
            else {
                continue;
            };
            let mut pairs = vec![VdwPair::UNSET; n - i];
            for (j, slot) in self.classes[i..].iter().enumerate() {
                if let Some(other) = slot {
                    let (rmin, emin) = rule.combine(ri, other.vdw_radius, ei, other.vdw_well_depth);
                    pairs[j] = VdwPair {
                        dmin: 2.0 * rmin,
                        emin,
                    };
                }
            }
            if let Some(class) = self.classes[i].as_mut() {
                class.vdw_pairs = pairs;
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.classes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn n_charged_types(&self) -> usize {
        self.charged_types
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}
