//! The unit system shared by the whole force field.
//!
//! Lengths are in angstroms, masses in daltons and times in picoseconds,
//! which makes the consistent internal energy unit Da·Å²/ps². User-facing
//! parameters arrive in kcal/mol and degrees and are converted exactly once
//! at definition time; everything downstream of the parameter catalog works
//! in internal units only.

/// Internal energy units (Da·Å²/ps²) per kcal/mol. Exact.
pub const ENERGY_PER_KCAL: f64 = 418.4;

/// Coulomb's constant 1/(4πε₀) in units converting e²/Å to kcal/mol,
/// followed by conversion to internal energy units (2002 CODATA).
pub const COULOMB_FACTOR: f64 = 332.06371 * ENERGY_PER_KCAL;

/// Converts an energy-like quantity from kcal/mol to internal units.
#[inline]
pub fn kcal_to_internal(energy_kcal: f64) -> f64 {
    energy_kcal * ENERGY_PER_KCAL
}

/// Converts an energy-like quantity from internal units back to kcal/mol.
#[inline]
pub fn internal_to_kcal(energy_internal: f64) -> f64 {
    energy_internal / ENERGY_PER_KCAL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kcal_conversion_round_trips_to_floating_point_tolerance() {
        for value in [0.0, 1.0, 0.109, 350.0, -7.25] {
            let round_tripped = internal_to_kcal(kcal_to_internal(value));
            assert!((round_tripped - value).abs() <= f64::EPSILON * value.abs());
        }
    }

    #[test]
    fn one_kcal_is_the_exact_internal_constant() {
        assert_eq!(kcal_to_internal(1.0), 418.4);
    }

    #[test]
    fn coulomb_factor_is_in_internal_energy_units() {
        assert!((COULOMB_FACTOR - 332.06371 * 418.4).abs() < 1e-9);
    }
}
