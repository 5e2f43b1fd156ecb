//! Physical constants and numerical tolerances for thermochemistry.
//!
//! All energies are in eV, frequencies in THz, temperatures in K, lengths in
//! Angstrom, masses in Dalton and pressures in kPa. The conversion factors below
//! bridge those input units to the eV/THz system used by the partition functions.
//!
//! The constants are grouped in an immutable [`PhysicalConstants`] value instead of
//! free-standing globals so that every routine receives them explicitly.

use serde::{Deserialize, Serialize};

/// Unit constants used by every partition-function evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Planck constant in eV/THz
    pub planck: f64,
    /// Boltzmann constant in eV/K
    pub boltzmann: f64,
    /// Moment of inertia conversion from Å²·Da to eV/THz²
    pub inertia_conversion: f64,
    /// Pressure conversion from kPa to eV/Å³
    pub pressure_conversion: f64,
    /// Mass conversion from Da to eV/(Å²·THz²)
    pub mass_conversion: f64,
}

impl PhysicalConstants {
    /// Constants matching the units VASP reports frequencies and energies in.
    pub const VASP: PhysicalConstants = PhysicalConstants {
        planck: 0.004_135_667_696_923_859,
        boltzmann: 8.617_333_262_145_2e-5,
        inertia_conversion: 1.036_426_97e-4,
        pressure_conversion: 6.242e-9,
        mass_conversion: 0.103_642_696e-3,
    };

    /// Thermal energy k·T in eV.
    #[inline]
    pub fn thermal_energy(&self, temperature: f64) -> f64 {
        self.boltzmann * temperature
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::VASP
    }
}

/// Numerical tolerances for rigid-body symmetry detection.
///
/// # Default Values
///
/// - `symmetry`: 1e-3 Å, maximum Cartesian distance between an atom and its
///   rotated image for the two to be considered the same site
/// - `inertia`: 1e-5, relative threshold below which principal moments are treated
///   as vanishing or degenerate, and below which the inertia determinant marks a
///   linear rotor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Distance tolerance (Å) for matching rotated atoms
    pub symmetry: f64,
    /// Relative tolerance on moments of inertia
    pub inertia: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            symmetry: 1e-3,
            inertia: 1e-5,
        }
    }
}
