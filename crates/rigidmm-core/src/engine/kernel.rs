//! The force evaluation kernel.
//!
//! Strategy, per evaluation:
//!
//! ```text
//! for each body b1
//!   for each atom a1 on b1
//!     process a1's cross-body bonded chains (stretch, bend, torsion)
//!     write scale factors for a1's bonded neighbours
//!     for each body b2 > b1
//!       for each atom a2 on b2
//!         accumulate scaled Coulomb and LJ 12-6 energy and force
//!     reset the scale factors
//! ```
//!
//! Bonded chains appear in the lists of both end atoms; each is evaluated
//! exactly once by skipping the visit where the chain's far end has the
//! lower atom id. Intra-body atom pairs are never visited: the body pair
//! loop is strictly upper-triangular and the cross-body chain lists
//! exclude chains confined to one body.

use super::multibody::{MultibodyState, SpatialForce};
use super::scaling::ScaleScratch;
use super::subsystem::ForceFieldSubsystem;
use crate::core::forcefield::potentials;
use crate::core::models::atom::Atom;
use crate::core::models::ids::BodyId;
use crate::core::units;
use nalgebra::{Point3, Vector3};
use tracing::{instrument, warn};

#[instrument(skip_all, level = "trace", name = "evaluate_forces")]
pub(crate) fn evaluate<S: MultibodyState>(
    subsystem: &ForceFieldSubsystem,
    state: &S,
    potential_energy: &mut f64,
    body_forces: &mut [SpatialForce],
) {
    let model = &subsystem.model;
    let catalog = &subsystem.catalog;
    let atoms = model.atoms();
    let bodies = model.body_slots();

    let mut scratch = ScaleScratch::new(atoms.len());

    // World-frame station and position of an atom, through its own body's
    // pose. Used for the bonded chains, whose atoms may sit on any body.
    let world_of = |atom: &Atom| -> (Vector3<f64>, Vector3<f64>) {
        let pose = state.body_pose(atom.body.unwrap());
        let station_g = pose.rotation * atom.station_b.coords;
        let position_g = pose.translation.vector + station_g;
        (station_g, position_g)
    };

    for (b1_index, slot1) in bodies.iter().enumerate() {
        let Some(body1) = slot1 else { continue };
        let x_gb1 = state.body_pose(BodyId(b1_index));

        for placement1 in &body1.all_atoms {
            let a1 = &atoms[placement1.atom.index()];
            let a1_type = catalog.charged_type(a1.charged_type).unwrap();
            let a1_class_id = a1_type.atom_class;
            let a1_station_g = x_gb1.rotation * a1.station_b.coords;
            let a1_pos_g = x_gb1.translation.vector + a1_station_g;
            let q1_factor = units::COULOMB_FACTOR * a1_type.partial_charge;

            // Bond stretch (1-2). Process each chain only from its
            // lower-id endpoint.
            for (i, &a2_id) in a1.xbond12.iter().enumerate() {
                if a2_id < a1.id {
                    continue;
                }
                let a2 = &atoms[a2_id.index()];
                let b2 = a2.body.unwrap();
                let (a2_station_g, a2_pos_g) = world_of(a2);
                let r = a2_pos_g - a1_pos_g;
                let d = r.norm();
                if d == 0.0 {
                    warn!(atom1 = %a1.id, atom2 = %a2.id, "zero-length bond");
                }

                let stretch = &a1.stretch[i];
                let x = d - stretch.d0;
                let energy = stretch.k * x * x;
                let force = -2.0 * stretch.k * x; // sign as applied to a2
                let f2 = (force / d) * r;
                *potential_energy += energy;
                body_forces[b2.index()] += SpatialForce::new(a2_station_g.cross(&f2), f2);
                body_forces[b1_index] -= SpatialForce::new(a1_station_g.cross(&f2), f2);
            }

            // Bond bend (1-2-3); the chain's first atom is the vertex.
            for (i, &(a2_id, a3_id)) in a1.xbond13.iter().enumerate() {
                if a3_id < a1.id {
                    continue;
                }
                let a2 = &atoms[a2_id.index()];
                let a3 = &atoms[a3_id.index()];
                let (a2_station_g, a2_pos_g) = world_of(a2);
                let (a3_station_g, a3_pos_g) = world_of(a3);

                let result = potentials::harmonic_bend(
                    &Point3::from(a2_pos_g),
                    &Point3::from(a1_pos_g),
                    &Point3::from(a3_pos_g),
                    &a1.bend[i],
                );
                *potential_energy += result.energy;
                body_forces[b1_index] += SpatialForce::new(
                    a1_station_g.cross(&result.force_on_first),
                    result.force_on_first,
                );
                body_forces[a2.body.unwrap().index()] += SpatialForce::new(
                    a2_station_g.cross(&result.force_on_center),
                    result.force_on_center,
                );
                body_forces[a3.body.unwrap().index()] += SpatialForce::new(
                    a3_station_g.cross(&result.force_on_second),
                    result.force_on_second,
                );
            }

            // Bond torsion (1-2-3-4).
            for (i, &(a2_id, a3_id, a4_id)) in a1.xbond14.iter().enumerate() {
                if a4_id < a1.id {
                    continue;
                }
                let a2 = &atoms[a2_id.index()];
                let a3 = &atoms[a3_id.index()];
                let a4 = &atoms[a4_id.index()];
                let (a2_station_g, a2_pos_g) = world_of(a2);
                let (a3_station_g, a3_pos_g) = world_of(a3);
                let (a4_station_g, a4_pos_g) = world_of(a4);

                let result = potentials::periodic_torsion(
                    &Point3::from(a1_pos_g),
                    &Point3::from(a2_pos_g),
                    &Point3::from(a3_pos_g),
                    &Point3::from(a4_pos_g),
                    &a1.torsion[i],
                );
                *potential_energy += result.energy;
                let stations = [a1_station_g, a2_station_g, a3_station_g, a4_station_g];
                let body_ids = [
                    BodyId(b1_index),
                    a2.body.unwrap(),
                    a3.body.unwrap(),
                    a4.body.unwrap(),
                ];
                for ((station, body), force) in
                    stations.iter().zip(body_ids.iter()).zip(result.forces.iter())
                {
                    body_forces[body.index()] +=
                        SpatialForce::new(station.cross(force), *force);
                }
            }

            // Non-bonded, against every higher-numbered body.
            scratch.apply(a1, &subsystem.scale_factors);
            for (b2_index, slot2) in bodies.iter().enumerate().skip(b1_index + 1) {
                let Some(body2) = slot2 else { continue };
                let x_gb2 = state.body_pose(BodyId(b2_index));

                for placement2 in &body2.all_atoms {
                    let a2 = &atoms[placement2.atom.index()];
                    let a2_type = catalog.charged_type(a2.charged_type).unwrap();
                    let a2_class_id = a2_type.atom_class;

                    let a2_station_g = x_gb2.rotation * a2.station_b.coords;
                    let a2_pos_g = x_gb2.translation.vector + a2_station_g;
                    let r = a2_pos_g - a1_pos_g; // from a1 to a2
                    let d2 = r.norm_squared();

                    let ood = 1.0 / d2.sqrt();
                    let ood2 = ood * ood;

                    // Coulomb; the 1/d² factor is applied once, below.
                    let qq = scratch.coulomb(a2.id) * q1_factor * a2_type.partial_charge;
                    let e_coulomb = qq * ood;
                    let f_coulomb = e_coulomb;

                    // Lennard-Jones 12-6 on the precomputed pair
                    // parameters, held by the lower-numbered class.
                    let pair = catalog.vdw_pair(a1_class_id, a2_class_id);
                    let ddij2 = pair.dmin * pair.dmin * ood2;
                    let ddij6 = ddij2 * ddij2 * ddij2;
                    let ddij12 = ddij6 * ddij6;

                    let eij_scaled = scratch.vdw(a2.id) * pair.emin;
                    let e_vdw = eij_scaled * (ddij12 - 2.0 * ddij6);
                    let f_vdw = 12.0 * eij_scaled * (ddij12 - ddij6);

                    let f2 = ((f_coulomb + f_vdw) * ood2) * r;
                    *potential_energy += e_coulomb + e_vdw;
                    body_forces[b2_index] += SpatialForce::new(a2_station_g.cross(&f2), f2);
                    body_forces[b1_index] -= SpatialForce::new(a1_station_g.cross(&f2), f2);
                }
            }
            scratch.reset(a1, &subsystem.scale_factors);
        }
    }

    debug_assert!(scratch.is_identity());
}
