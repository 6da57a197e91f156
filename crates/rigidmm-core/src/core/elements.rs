//! Static periodic-element table.
//!
//! Populated once at compile time and immutable thereafter. Masses are in
//! daltons; the default colours are RGB triples used by hosts that render
//! the molecular system.

use phf::{Map, phf_map};

const GRAY: [f64; 3] = [0.5, 0.5, 0.5];
const GREEN: [f64; 3] = [0.0, 1.0, 0.0];
const BLUE: [f64; 3] = [0.0, 0.0, 1.0];
const RED: [f64; 3] = [1.0, 0.0, 0.0];
const MAGENTA: [f64; 3] = [1.0, 0.0, 1.0];
const YELLOW: [f64; 3] = [1.0, 1.0, 0.0];

/// A chemical element as known to the force field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Atomic number (proton count), always ≥ 1.
    pub atomic_number: u32,
    /// Standard one- or two-letter symbol.
    pub symbol: &'static str,
    /// Full English name.
    pub name: &'static str,
    /// Atomic mass in daltons.
    pub mass: f64,
    /// Default display colour as an RGB triple in [0, 1].
    pub default_color: [f64; 3],
}

const fn element(
    atomic_number: u32,
    symbol: &'static str,
    name: &'static str,
    mass: f64,
    default_color: [f64; 3],
) -> Element {
    Element {
        atomic_number,
        symbol,
        name,
        mass,
        default_color,
    }
}

static ELEMENTS: Map<u32, Element> = phf_map! {
    1u32 => element(1, "H", "Hydrogen", 1.008, GREEN),
    2u32 => element(2, "He", "Helium", 4.003, GRAY),
    3u32 => element(3, "Li", "Lithium", 6.941, GRAY),
    6u32 => element(6, "C", "Carbon", 12.011, GRAY),
    7u32 => element(7, "N", "Nitrogen", 14.007, BLUE),
    8u32 => element(8, "O", "Oxygen", 15.999, RED),
    9u32 => element(9, "F", "Fluorine", 18.998, GRAY),
    10u32 => element(10, "Ne", "Neon", 20.180, GRAY),
    11u32 => element(11, "Na", "Sodium", 22.990, GRAY),
    12u32 => element(12, "Mg", "Magnesium", 24.305, GRAY),
    14u32 => element(14, "Si", "Silicon", 28.086, GRAY),
    15u32 => element(15, "P", "Phosphorus", 30.974, MAGENTA),
    16u32 => element(16, "S", "Sulphur", 32.066, YELLOW),
    17u32 => element(17, "Cl", "Chlorine", 35.453, GRAY),
    18u32 => element(18, "Ar", "Argon", 39.948, GRAY),
    19u32 => element(19, "K", "Potassium", 39.098, GRAY),
    20u32 => element(20, "Ca", "Calcium", 40.078, GRAY),
    26u32 => element(26, "Fe", "Iron", 55.845, GRAY),
    29u32 => element(29, "Cu", "Copper", 63.546, GRAY),
    30u32 => element(30, "Zn", "Zinc", 65.390, GRAY),
    36u32 => element(36, "Kr", "Krypton", 83.800, GRAY),
    47u32 => element(47, "Ag", "Silver", 107.868, GRAY),
    53u32 => element(53, "I", "Iodine", 126.904, GRAY),
    54u32 => element(54, "Xe", "Xenon", 131.290, GRAY),
    79u32 => element(79, "Au", "Gold", 196.967, YELLOW),
    92u32 => element(92, "U", "Uranium", 238.029, GRAY),
};

/// Looks up an element by atomic number.
pub fn by_atomic_number(atomic_number: u32) -> Option<&'static Element> {
    ELEMENTS.get(&atomic_number)
}

/// Returns whether the given atomic number has a table entry.
pub fn is_valid_element(atomic_number: u32) -> bool {
    ELEMENTS.contains_key(&atomic_number)
}
