//! Scratch vectors applying the 1-2/1-3/1-4/1-5 non-bonded scale factors.
//!
//! During the non-bonded sweep for an atom, the positions of its
//! cross-body bonded neighbours are temporarily overwritten with the
//! configured scale factors, and restored to the identity afterwards. Only
//! chains that cross bodies matter here: fully intra-body pairs never
//! reach the non-bonded loop at all. The 1-4 and 1-5 writes are skipped
//! entirely while both of their factors are exactly 1, which is the common
//! case.

use crate::core::forcefield::params::{BondSeparation, ScaleFactors};
use crate::core::models::atom::Atom;
use crate::core::models::ids::AtomId;

/// Per-invocation scale scratch, held at the identity between atoms.
pub(crate) struct ScaleScratch {
    vdw: Vec<f64>,
    coulomb: Vec<f64>,
}

impl ScaleScratch {
    pub fn new(n_atoms: usize) -> Self {
        Self {
            vdw: vec![1.0; n_atoms],
            coulomb: vec![1.0; n_atoms],
        }
    }

    #[inline]
    pub fn vdw(&self, atom: AtomId) -> f64 {
        self.vdw[atom.index()]
    }

    #[inline]
    pub fn coulomb(&self, atom: AtomId) -> f64 {
        self.coulomb[atom.index()]
    }

    /// Writes the scale factors at every cross-body bonded neighbour of
    /// `atom`: the 1-2 ids themselves, then the tails of the 1-3, 1-4 and
    /// 1-5 chains.
    pub fn apply(&mut self, atom: &Atom, factors: &ScaleFactors) {
        for &neighbor in &atom.xbond12 {
            self.vdw[neighbor.index()] = factors.vdw(BondSeparation::OneTwo);
            self.coulomb[neighbor.index()] = factors.coulomb(BondSeparation::OneTwo);
        }
        for &(_, tail) in &atom.xbond13 {
            self.vdw[tail.index()] = factors.vdw(BondSeparation::OneThree);
            self.coulomb[tail.index()] = factors.coulomb(BondSeparation::OneThree);
        }
        if factors.vdw(BondSeparation::OneFour) != 1.0
            || factors.coulomb(BondSeparation::OneFour) != 1.0
        {
            for &(_, _, tail) in &atom.xbond14 {
                self.vdw[tail.index()] = factors.vdw(BondSeparation::OneFour);
                self.coulomb[tail.index()] = factors.coulomb(BondSeparation::OneFour);
            }
        }
        if factors.vdw(BondSeparation::OneFive) != 1.0
            || factors.coulomb(BondSeparation::OneFive) != 1.0
        {
            for &(_, _, _, tail) in &atom.xbond15 {
                self.vdw[tail.index()] = factors.vdw(BondSeparation::OneFive);
                self.coulomb[tail.index()] = factors.coulomb(BondSeparation::OneFive);
            }
        }
    }

    /// Restores the identity at exactly the positions `apply` wrote, under
    /// the same skip conditions.
    pub fn reset(&mut self, atom: &Atom, factors: &ScaleFactors) {
        for &neighbor in &atom.xbond12 {
            self.vdw[neighbor.index()] = 1.0;
            self.coulomb[neighbor.index()] = 1.0;
        }
        for &(_, tail) in &atom.xbond13 {
            self.vdw[tail.index()] = 1.0;
            self.coulomb[tail.index()] = 1.0;
        }
        if factors.vdw(BondSeparation::OneFour) != 1.0
            || factors.coulomb(BondSeparation::OneFour) != 1.0
        {
            for &(_, _, tail) in &atom.xbond14 {
                self.vdw[tail.index()] = 1.0;
                self.coulomb[tail.index()] = 1.0;
            }
        }
        if factors.vdw(BondSeparation::OneFive) != 1.0
            || factors.coulomb(BondSeparation::OneFive) != 1.0
        {
            for &(_, _, _, tail) in &atom.xbond15 {
                self.vdw[tail.index()] = 1.0;
                self.coulomb[tail.index()] = 1.0;
            }
        }
    }

    /// Whether every slot is back at 1; the kernel checks this after a
    /// full sweep.
    pub fn is_identity(&self) -> bool {
        self.vdw.iter().chain(self.coulomb.iter()).all(|&s| s == 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::ChargedTypeId;

    fn atom_with_chains() -> Atom {
        let mut atom = Atom::new(AtomId(0), ChargedTypeId(0));
        atom.xbond12 = vec![AtomId(1)];
        atom.xbond13 = vec![(AtomId(1), AtomId(2))];
        atom.xbond14 = vec![(AtomId(1), AtomId(2), AtomId(3))];
        atom.xbond15 = vec![(AtomId(1), AtomId(2), AtomId(3), AtomId(4))];
        atom
    }

    #[test]
    fn apply_writes_factors_at_chain_tails_only() {
        let mut scratch = ScaleScratch::new(6);
        let mut factors = ScaleFactors::default();
        factors.set_vdw(BondSeparation::OneFour, 0.5);
        scratch.apply(&atom_with_chains(), &factors);

        assert_eq!(scratch.vdw(AtomId(1)), 0.0);
        assert_eq!(scratch.coulomb(AtomId(1)), 0.0);
        assert_eq!(scratch.vdw(AtomId(2)), 0.0);
        assert_eq!(scratch.vdw(AtomId(3)), 0.5);
        // 1-5 factors are both 1, so the write is skipped and position 4
        // stays at the identity it already held.
        assert_eq!(scratch.vdw(AtomId(4)), 1.0);
        assert_eq!(scratch.vdw(AtomId(5)), 1.0);
    }

    #[test]
    fn reset_returns_every_written_position_to_identity() {
        let mut scratch = ScaleScratch::new(6);
        let mut factors = ScaleFactors::default();
        factors.set_vdw(BondSeparation::OneFour, 0.5);
        factors.set_coulomb(BondSeparation::OneFive, 0.8333);
        let atom = atom_with_chains();

        scratch.apply(&atom, &factors);
        assert!(!scratch.is_identity());
        scratch.reset(&atom, &factors);
        assert!(scratch.is_identity());
    }

    #[test]
    fn default_factors_leave_one_four_and_beyond_untouched() {
        let mut scratch = ScaleScratch::new(6);
        let factors = ScaleFactors::default();
        scratch.apply(&atom_with_chains(), &factors);
        assert_eq!(scratch.vdw(AtomId(3)), 1.0);
        assert_eq!(scratch.coulomb(AtomId(4)), 1.0);
    }
}
