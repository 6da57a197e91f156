//! Bend and torsion geometry kernels.
//!
//! Each kernel takes world-frame atom positions plus the bonded parameters
//! and returns the scalar energy together with one cartesian force per
//! participating atom. The forces of every evaluation sum to zero, so the
//! pure bend torque and the pure torsion torque introduce no net linear
//! momentum. Degenerate geometries (coincident or colinear atoms) take
//! deterministic fallback directions and are reported as `warn!` events
//! without changing behaviour.

use super::params::{BondBend, BondTorsion};
use nalgebra::{Point3, Vector3};
use tracing::warn;

/// Result of a harmonic bend evaluation for the triple r–c–s with vertex c.
#[derive(Debug, Clone, Copy)]
pub struct BendEvaluation {
    /// The angle between the two flank vectors, in radians.
    pub theta: f64,
    /// Potential energy, internal units.
    pub energy: f64,
    pub force_on_center: Vector3<f64>,
    pub force_on_first: Vector3<f64>,
    pub force_on_second: Vector3<f64>,
}

/// Result of a periodic torsion evaluation for the chain r–x–y–s.
#[derive(Debug, Clone, Copy)]
pub struct TorsionEvaluation {
    /// The dihedral angle in the polymer convention, radians.
    pub theta: f64,
    /// Potential energy, internal units.
    pub energy: f64,
    /// Forces on r, x, y, s in chain order.
    pub forces: [Vector3<f64>; 4],
}

/// Some unit vector perpendicular to `v`. Used when a degenerate geometry
/// leaves no well-defined direction; any perpendicular will do as long as
/// the choice is deterministic.
fn perpendicular_unit(v: &Vector3<f64>) -> Vector3<f64> {
    let vx = v.x.abs();
    let vy = v.y.abs();
    let vz = v.z.abs();
    let other = if vx <= vy && vx <= vz {
        Vector3::x()
    } else if vy <= vz {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let perp = v.cross(&other);
    let norm = perp.norm();
    if norm == 0.0 {
        // v itself is (numerically) zero; no direction is meaningful.
        return Vector3::x();
    }
    perp / norm
}

/// Evaluates a harmonic bend for a central atom at `center` bonded to atoms
/// at `first` and `second`.
///
/// The angle is measured between the two flank vectors; the energy is
/// `k·(θ − θ0)²` and each flank force is the bend torque divided by that
/// flank's length, directed perpendicular to the flank within the bend
/// plane. The center carries the negated sum so the three forces cancel.
pub fn harmonic_bend(
    center: &Point3<f64>,
    first: &Point3<f64>,
    second: &Point3<f64>,
    bend: &BondBend,
) -> BendEvaluation {
    let r = first - center;
    let s = second - center;
    let rr = r.dot(&r);
    let ss = s.dot(&s);

    let rs = r.dot(&s);
    let rxs = r.cross(&s);
    let rxs_len = rxs.norm();
    let theta = rxs_len.atan2(rs);
    let deviation = theta - bend.theta0;
    let energy = bend.k * deviation * deviation;

    // Unit normal of the bend plane; when the flanks are colinear there is
    // no plane, so push them apart around an arbitrary perpendicular.
    let plane_normal = if rxs_len != 0.0 {
        rxs / rxs_len
    } else {
        warn!(
            theta_deg = theta.to_degrees(),
            "bend flanks are colinear; using an arbitrary perpendicular"
        );
        perpendicular_unit(&r)
    };

    let force_factor = -2.0 * bend.k * deviation;
    let force_on_first = (force_factor / rr) * r.cross(&plane_normal);
    let force_on_second = (force_factor / ss) * plane_normal.cross(&s);
    BendEvaluation {
        theta,
        energy,
        force_on_center: -(force_on_first + force_on_second),
        force_on_first,
        force_on_second,
    }
}

/// Evaluates a periodic torsion for the chain r–x–y–s rotating about the
/// x→y axis.
///
/// θ = 0 when r and s eclipse across the axis; a positive rotation turns s
/// by the right-hand rule around x→y. The torque `Σ n·ampₙ·sin(nθ − φₙ)`
/// is converted into four forces producing that pure torque. When the axis
/// atoms coincide there is no axis: the flank forces are mirrored onto the
/// axis atoms so the total remains exactly zero. When a flank is colinear
/// with the axis no torque can be produced and all four forces are zero.
pub fn periodic_torsion(
    first: &Point3<f64>,
    axis_from: &Point3<f64>,
    axis_to: &Point3<f64>,
    last: &Point3<f64>,
    torsion: &BondTorsion,
) -> TorsionEvaluation {
    // All vectors point along the r->x->y->s direction.
    let r = axis_from - first;
    let s = last - axis_to;
    let xy = axis_to - axis_from;

    // Unit axis, with increasingly desperate fallbacks when the axis atoms
    // overlap. oov == 0 signals the missing axis to the force assembly.
    let vv = xy.dot(&xy);
    let oov = if vv == 0.0 { 0.0 } else { 1.0 / vv.sqrt() };
    let v = if oov != 0.0 {
        xy * oov
    } else {
        warn!("torsion axis atoms coincide; using a substitute axis");
        let rxs = r.cross(&s);
        let rxs_len = rxs.norm();
        if rxs_len != 0.0 {
            rxs / rxs_len
        } else {
            perpendicular_unit(&r)
        }
    };

    // Plane normals: the axis serves as the shared "x" direction of the
    // two half planes, with r and s lying roughly along their "y" axes.
    let t = r.cross(&v);
    let u = v.cross(&s);
    let tt = t.dot(&t);
    let uu = u.dot(&u);
    if tt == 0.0 || uu == 0.0 {
        warn!("torsion flank is colinear with the axis; no torque produced");
        return TorsionEvaluation {
            theta: 0.0,
            energy: 0.0,
            forces: [Vector3::zeros(); 4],
        };
    }

    let txu = t.cross(&u);
    let ootu = 1.0 / (tt * uu).sqrt();
    let cos_theta = t.dot(&u) * ootu;
    let sin_theta = v.dot(&txu) * ootu;
    let theta = sin_theta.atan2(cos_theta);

    let mut energy = 0.0;
    let mut torque = 0.0;
    for term in &torsion.terms {
        energy += term.energy(theta);
        torque += term.torque(theta);
    }

    let ry = axis_to - first;
    let xs = last - axis_from;
    let dedt = (torque / tt) * t.cross(&v);
    let dedu = -(torque / uu) * u.cross(&v);

    let force_first = dedt.cross(&v);
    let force_last = dedu.cross(&v);
    let (force_axis_from, force_axis_to) = if oov == 0.0 {
        // No axis; mirroring at least keeps the forces summing to zero.
        (-force_first, -force_last)
    } else {
        (
            (ry.cross(&dedt) + dedu.cross(&s)) * oov,
            (dedt.cross(&r) + xs.cross(&dedu)) * oov,
        )
    };

    TorsionEvaluation {
        theta,
        energy,
        forces: [force_first, force_axis_from, force_axis_to, force_last],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::TorsionTerm;
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn vector_approx_zero(v: &Vector3<f64>) -> bool {
        v.norm() < TOLERANCE
    }

    fn single_term_torsion(periodicity: u32, amplitude_kcal: f64, phase_deg: f64) -> BondTorsion {
        let mut torsion = BondTorsion::default();
        torsion.add_term(TorsionTerm::new(periodicity, amplitude_kcal, phase_deg));
        torsion
    }

    mod bend {
        use super::*;

        #[test]
        fn energy_and_forces_vanish_at_the_nominal_angle() {
            let bend = BondBend::new(50.0, 90.0);
            let result = harmonic_bend(
                &Point3::origin(),
                &Point3::new(1.0, 0.0, 0.0),
                &Point3::new(0.0, 2.5, 0.0),
                &bend,
            );
            assert!(f64_approx_equal(result.theta, PI / 2.0));
            assert!(f64_approx_equal(result.energy, 0.0));
            assert!(vector_approx_zero(&result.force_on_center));
            assert!(vector_approx_zero(&result.force_on_first));
            assert!(vector_approx_zero(&result.force_on_second));
        }

        #[test]
        fn sixty_degree_bend_with_ninety_degree_nominal_matches_hand_value() {
            let bend = BondBend::new(1.0, 90.0);
            let result = harmonic_bend(
                &Point3::origin(),
                &Point3::new(1.0, 0.0, 0.0),
                &Point3::new(60f64.to_radians().cos(), 60f64.to_radians().sin(), 0.0),
                &bend,
            );
            assert!(f64_approx_equal(result.theta, PI / 3.0));
            assert!(f64_approx_equal(result.energy, (PI / 6.0).powi(2) * 418.4));
        }

        #[test]
        fn forces_always_sum_to_zero() {
            let bend = BondBend::new(35.0, 104.5);
            let result = harmonic_bend(
                &Point3::new(0.1, -0.2, 0.3),
                &Point3::new(1.1, 0.4, -0.2),
                &Point3::new(-0.7, 0.9, 0.8),
                &bend,
            );
            let total = result.force_on_center + result.force_on_first + result.force_on_second;
            assert!(vector_approx_zero(&total));
        }

        #[test]
        fn wider_angle_than_nominal_pulls_the_flanks_together() {
            let bend = BondBend::new(10.0, 60.0);
            let result = harmonic_bend(
                &Point3::origin(),
                &Point3::new(1.0, 0.0, 0.0),
                &Point3::new(0.0, 1.0, 0.0),
                &bend,
            );
            // theta (90°) exceeds theta0 (60°): the flank forces close the angle.
            assert!(result.force_on_first.y > 0.0);
            assert!(result.force_on_second.x > 0.0);
        }

        #[test]
        fn colinear_flanks_still_produce_finite_opposed_forces() {
            let bend = BondBend::new(20.0, 109.5);
            let result = harmonic_bend(
                &Point3::origin(),
                &Point3::new(1.0, 0.0, 0.0),
                &Point3::new(2.0, 0.0, 0.0),
                &bend,
            );
            assert!(result.energy.is_finite());
            assert!(result.force_on_first.iter().all(|c| c.is_finite()));
            let total = result.force_on_center + result.force_on_first + result.force_on_second;
            assert!(vector_approx_zero(&total));
        }
    }

    mod torsion {
        use super::*;

        fn butane_like_positions(theta: f64) -> [Point3<f64>; 4] {
            // x at origin, y along +z; r in the xz plane; s rotated by theta
            // about the axis, by the right-hand rule around x->y.
            [
                Point3::new(1.0, 0.0, -1.0),
                Point3::origin(),
                Point3::new(0.0, 0.0, 1.5),
                Point3::new(theta.cos(), theta.sin(), 2.5),
            ]
        }

        #[test]
        fn trans_configuration_of_a_threefold_term_has_zero_energy() {
            let torsion = single_term_torsion(3, 1.0, 0.0);
            let [r, x, y, s] = butane_like_positions(PI);
            let result = periodic_torsion(&r, &x, &y, &s, &torsion);
            assert!(f64_approx_equal(result.theta.abs(), PI));
            assert!(result.energy.abs() < 1e-6);
        }

        #[test]
        fn eclipsed_configuration_of_a_threefold_term_has_maximal_energy() {
            let torsion = single_term_torsion(3, 1.0, 0.0);
            let [r, x, y, s] = butane_like_positions(0.0);
            let result = periodic_torsion(&r, &x, &y, &s, &torsion);
            assert!(f64_approx_equal(result.theta, 0.0));
            assert!(f64_approx_equal(result.energy, 2.0 * 418.4));
        }

        #[test]
        fn energy_is_periodic_in_two_pi_over_n() {
            let torsion = single_term_torsion(3, 1.0, 30.0);
            for theta in [0.2, 1.0, 2.2] {
                let [r, x, y, s] = butane_like_positions(theta);
                let [r2, x2, y2, s2] = butane_like_positions(theta + 2.0 * PI / 3.0);
                let a = periodic_torsion(&r, &x, &y, &s, &torsion);
                let b = periodic_torsion(&r2, &x2, &y2, &s2, &torsion);
                assert!(
                    (a.energy - b.energy).abs() < 1e-6,
                    "not periodic at theta = {}",
                    theta
                );
            }
        }

        #[test]
        fn forces_sum_to_zero_in_a_generic_configuration() {
            let torsion = single_term_torsion(2, 0.7, 180.0);
            let result = periodic_torsion(
                &Point3::new(0.9, -0.3, -1.1),
                &Point3::new(0.1, 0.2, 0.0),
                &Point3::new(-0.2, 0.1, 1.4),
                &Point3::new(0.8, 1.0, 2.2),
                &torsion,
            );
            let total: Vector3<f64> = result.forces.iter().sum();
            assert!(vector_approx_zero(&total));
        }

        #[test]
        fn coincident_axis_atoms_yield_forces_summing_exactly_to_zero() {
            let torsion = single_term_torsion(3, 1.0, 0.0);
            let shared = Point3::new(0.0, 0.0, 1.0);
            let result = periodic_torsion(
                &Point3::new(1.0, 0.0, 0.0),
                &shared,
                &shared,
                &Point3::new(0.0, 1.0, 2.0),
                &torsion,
            );
            let total: Vector3<f64> = result.forces.iter().sum();
            assert_eq!(total, Vector3::zeros());
        }

        #[test]
        fn flank_colinear_with_axis_produces_no_forces_at_all() {
            let torsion = single_term_torsion(3, 1.0, 0.0);
            // r sits on the x->y axis extended backwards.
            let result = periodic_torsion(
                &Point3::new(0.0, 0.0, -1.0),
                &Point3::origin(),
                &Point3::new(0.0, 0.0, 1.0),
                &Point3::new(1.0, 0.0, 2.0),
                &torsion,
            );
            assert_eq!(result.energy, 0.0);
            for force in &result.forces {
                assert_eq!(*force, Vector3::zeros());
            }
        }

        #[test]
        fn positive_rotation_follows_the_right_hand_rule() {
            let torsion = single_term_torsion(1, 1.0, 0.0);
            let quarter = PI / 2.0;
            let [r, x, y, s] = butane_like_positions(quarter);
            let result = periodic_torsion(&r, &x, &y, &s, &torsion);
            assert!(f64_approx_equal(result.theta, quarter));
        }
    }

    mod perpendicular {
        use super::*;

        #[test]
        fn result_is_unit_length_and_orthogonal() {
            for v in [
                Vector3::new(1.0, 0.0, 0.0),
                Vector3::new(0.0, -2.0, 0.0),
                Vector3::new(1.0, 2.0, 3.0),
                Vector3::new(-0.3, 0.001, 5.0),
            ] {
                let p = perpendicular_unit(&v);
                assert!(f64_approx_equal(p.norm(), 1.0));
                assert!(p.dot(&v).abs() < TOLERANCE * v.norm());
            }
        }

        #[test]
        fn zero_vector_falls_back_to_a_fixed_direction() {
            assert_eq!(perpendicular_unit(&Vector3::zeros()), Vector3::x());
        }
    }
}
