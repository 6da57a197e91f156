//! The one-shot topology realization pipeline.
//!
//! Realization is the transition from the mutable definition phase to the
//! frozen, evaluable topology. It invalidates every derived cache and then
//! rebuilds, in dependency order: the per-class vdW pair table, the
//! per-cluster composite caches, the per-body flattened atom arrays, the
//! atom-to-body assignment, the shortest-path 1-3/1-4/1-5 bonded
//! neighbour chains, their cross-body subsets, and the resolved bonded
//! parameters for every cross-body chain. Missing bonded parameters and
//! unattached atoms are fatal configuration errors.

use super::error::EngineError;
use super::subsystem::ForceFieldSubsystem;
use crate::core::forcefield::catalog::ForceFieldCatalog;
use crate::core::models::ids::{AtomClassId, AtomId, BodyId};
use crate::core::models::system::{MolecularModel, TopologyError};
use std::collections::HashSet;
use tracing::{debug, instrument};

#[instrument(skip_all, name = "realize_topology")]
pub(crate) fn realize(subsystem: &mut ForceFieldSubsystem) -> Result<(), EngineError> {
    if subsystem.topology_valid {
        return Ok(());
    }

    let ForceFieldSubsystem {
        model,
        catalog,
        mixing_rule,
        topology_valid,
        ..
    } = subsystem;

    model.invalidate_topological_caches();
    catalog.invalidate_derived();

    // Effective vdW parameters for every pair of defined classes, so the
    // evaluator has no missing-entry path.
    catalog.realize_vdw_pairs(*mixing_rule);

    // Clusters first; bodies are top-level clusters and assume all cluster
    // caches are in place.
    {
        let parts = model.parts_mut();
        for cluster in parts.clusters.iter_mut() {
            cluster.realize_topological_cache();
        }
    }
    model.flatten_bodies();

    assign_atoms_to_bodies(model)?;
    build_bonded_paths(model);
    mark_cross_body_chains(model);
    resolve_bonded_parameters(model, catalog)?;

    *topology_valid = true;
    debug!(
        atoms = model.n_atoms(),
        bonds = model.n_bonds(),
        bodies = model.body_slots().iter().flatten().count(),
        "topology realized"
    );
    Ok(())
}

/// Writes body and station onto every atom by walking each body's
/// flattened atom list. An atom reachable from two bodies is an internal
/// error (the placement checks exclude it); an atom reachable from none is
/// a configuration error.
fn assign_atoms_to_bodies(model: &mut MolecularModel) -> Result<(), EngineError> {
    let parts = model.parts_mut();
    for (body_index, slot) in parts.bodies.iter().enumerate() {
        let Some(body) = slot else { continue };
        for placement in &body.all_atoms {
            let atom = &mut parts.atoms[placement.atom.index()];
            if atom.body.is_some() {
                return Err(EngineError::Internal(format!(
                    "atom {} is assigned to more than one body",
                    placement.atom
                )));
            }
            atom.attach_to_body(BodyId(body_index), placement.station);
        }
    }
    for atom in parts.atoms.iter() {
        if atom.body.is_none() {
            return Err(TopologyError::UnassignedAtom(atom.id).into());
        }
    }
    Ok(())
}

/// Chases bonds outward from every atom to fill the 1-3, 1-4 and 1-5
/// chain lists. A growing visited set carried across the three expansions
/// keeps only the *shortest* path to any atom: an atom two bonds away is
/// recorded in bond13 and never again in bond14 or bond15. Results are
/// sorted lexicographically.
fn build_bonded_paths(model: &mut MolecularModel) {
    let parts = model.parts_mut();
    for atom in parts.atoms.iter_mut() {
        atom.bond12.sort_unstable();
    }
    let adjacency: Vec<Vec<AtomId>> = parts.atoms.iter().map(|a| a.bond12.clone()).collect();

    for atom in parts.atoms.iter_mut() {
        let mut visited: HashSet<AtomId> = HashSet::with_capacity(1 + 4 * atom.bond12.len());
        visited.insert(atom.id);
        visited.extend(atom.bond12.iter().copied());

        let mut bond13 = Vec::new();
        for &b in &atom.bond12 {
            for &c in &adjacency[b.index()] {
                if visited.insert(c) {
                    bond13.push((b, c));
                }
            }
        }
        bond13.sort_unstable();

        let mut bond14 = Vec::new();
        for &(b, c) in &bond13 {
            for &d in &adjacency[c.index()] {
                if visited.insert(d) {
                    bond14.push((b, c, d));
                }
            }
        }
        bond14.sort_unstable();

        let mut bond15 = Vec::new();
        for &(b, c, d) in &bond14 {
            for &e in &adjacency[d.index()] {
                if visited.insert(e) {
                    bond15.push((b, c, d, e));
                }
            }
        }
        bond15.sort_unstable();

        atom.bond13 = bond13;
        atom.bond14 = bond14;
        atom.bond15 = bond15;
    }
}

/// Retains only the chains where at least one non-self atom lies on a
/// different body. Every retained chain shows up in the lists of both end
/// atoms; evaluation breaks the tie by endpoint id, while the non-bonded
/// scaling window needs both copies.
fn mark_cross_body_chains(model: &mut MolecularModel) {
    let parts = model.parts_mut();
    let body_of: Vec<Option<BodyId>> = parts.atoms.iter().map(|a| a.body).collect();

    for atom in parts.atoms.iter_mut() {
        let home = atom.body;
        atom.xbond12 = atom
            .bond12
            .iter()
            .copied()
            .filter(|b| body_of[b.index()] != home)
            .collect();
        atom.xbond13 = atom
            .bond13
            .iter()
            .copied()
            .filter(|&(b, c)| body_of[b.index()] != home || body_of[c.index()] != home)
            .collect();
        atom.xbond14 = atom
            .bond14
            .iter()
            .copied()
            .filter(|&(b, c, d)| {
                body_of[b.index()] != home
                    || body_of[c.index()] != home
                    || body_of[d.index()] != home
            })
            .collect();
        atom.xbond15 = atom
            .bond15
            .iter()
            .copied()
            .filter(|&(b, c, d, e)| {
                body_of[b.index()] != home
                    || body_of[c.index()] != home
                    || body_of[d.index()] != home
                    || body_of[e.index()] != home
            })
            .collect();
    }
}

/// Resolves the catalog entry for every cross-body chain: a stretch per
/// xbond12 entry, a bend per xbond13 entry (the vertex is the chain's
/// first atom) and a torsion per xbond14 entry. A chain without a catalog
/// entry is fatal.
fn resolve_bonded_parameters(
    model: &mut MolecularModel,
    catalog: &ForceFieldCatalog,
) -> Result<(), EngineError> {
    let class_of: Vec<AtomClassId> = model
        .atoms()
        .iter()
        .map(|a| catalog.class_of_type(a.charged_type))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| EngineError::Internal("atom with an undefined charged type".to_string()))?;

    let parts = model.parts_mut();
    for atom in parts.atoms.iter_mut() {
        let own = class_of[atom.id.index()];
        atom.stretch = atom
            .xbond12
            .iter()
            .map(|&b| catalog.bond_stretch(own, class_of[b.index()]).copied())
            .collect::<Result<_, _>>()?;
        atom.bend = atom
            .xbond13
            .iter()
            .map(|&(b, c)| {
                catalog
                    .bond_bend(own, class_of[b.index()], class_of[c.index()])
                    .copied()
            })
            .collect::<Result<_, _>>()?;
        atom.torsion = atom
            .xbond14
            .iter()
            .map(|&(b, c, d)| {
                catalog
                    .bond_torsion(own, class_of[b.index()], class_of[c.index()], class_of[d.index()])
                    .cloned()
            })
            .collect::<Result<_, _>>()?;
    }
    Ok(())
}
