//! Thermochemistry from a DFT energy and a harmonic frequency spectrum.
//!
//! This module assembles the Gibbs free energy of a system from four independent
//! contributions, each evaluated from its partition function `Z`:
//!
//! | Contribution | Model | Applies to |
//! |--------------|-------|------------|
//! | [`Elec`] | ground-state spin degeneracy | always |
//! | [`Vib`] | harmonic oscillators | always |
//! | [`Rot`] | classical rigid rotor | molecules |
//! | [`Trans`] | ideal gas | molecules |
//!
//! # Thermodynamic Relations
//!
//! For a gas-phase molecule:
//!
//! ```text
//! H = E_dft + E_zpe + E_elec + E_vib + E_rot + E_trans + kT
//! S = S_elec + S_vib + S_rot + S_trans + k
//! ```
//!
//! For an adsorbate or solid (no overall rotation or translation):
//!
//! ```text
//! H = E_dft + E_zpe + E_elec + E_vib
//! S = S_elec + S_vib + k
//! ```
//!
//! and in both cases `G = H − T·S`. Energies are in eV, entropies in eV/K.
//!
//! # Usage
//!
//! ```
//! use vaspgibbs::structure::{Atom, Cell, MassTable};
//! use vaspgibbs::thermo::{compute_thermo, ElectronicState, ThermoInput};
//! use num_complex::Complex64;
//!
//! let cell = Cell::cubic(10.0)?;
//! let atoms = vec![Atom::new("H", [0.5, 0.5, 0.5]), Atom::new("H", [0.5, 0.5, 0.574])];
//! let masses: MassTable = [("H", 1.008)].into_iter().collect();
//! let spectrum = [Complex64::new(131.9, 0.0)];
//!
//! let input = ThermoInput {
//!     temperature: 298.15,
//!     pressure: 101.325,
//!     spectrum: &spectrum,
//!     dft_energy: -6.77,
//!     cell: &cell,
//!     atoms: &atoms,
//!     masses: &masses,
//!     electronic: ElectronicState::new(2, None),
//!     is_molecule: true,
//! };
//! let result = compute_thermo(&input)?;
//! assert!(result.gibbs < result.enthalpy);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::constants::{PhysicalConstants, Tolerances};
use crate::geometry::{self, GeometryError};
use crate::structure::{Atom, Cell, MassTable};
use crate::symmetry;
use log::{debug, warn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Error type for thermochemistry evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThermoError {
    /// A partition function came out non-positive or non-finite
    #[error("Non-physical {contribution} partition function: Z = {value}")]
    NonPhysicalPartitionFunction {
        /// Name of the offending contribution
        contribution: &'static str,
        /// The computed partition function
        value: f64,
    },
    /// Invalid temperature, pressure or system
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Geometric failure while building the rigid-rotor model
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Type alias for thermochemistry results
type Result<T> = std::result::Result<T, ThermoError>;

/// Common view of a partition-function based contribution.
pub trait Contribution {
    /// Short name used in reports and error messages
    fn name(&self) -> &'static str;
    /// Partition function (dimensionless, > 0)
    fn partition_function(&self) -> f64;
    /// Entropy in eV/K
    fn entropy(&self) -> f64;
    /// Internal energy in eV
    fn energy(&self) -> f64;
}

/// Natural log of a partition function, rejecting non-physical values.
fn ln_partition(z: f64, contribution: &'static str) -> Result<f64> {
    if !(z > 0.0 && z.is_finite()) {
        return Err(ThermoError::NonPhysicalPartitionFunction {
            contribution,
            value: z,
        });
    }
    Ok(z.ln())
}

/// Electron count and spin constraint of the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectronicState {
    /// Total number of valence electrons (NELECT)
    pub electron_count: u32,
    /// Fixed difference between up and down electrons (NUPDOWN), if set
    pub fixed_spin: Option<u32>,
}

impl ElectronicState {
    /// Creates an electronic state description.
    pub fn new(electron_count: u32, fixed_spin: Option<u32>) -> Self {
        Self {
            electron_count,
            fixed_spin,
        }
    }

    /// Ground-state spin degeneracy.
    ///
    /// `NUPDOWN + 1` if the spin difference is fixed, otherwise 1 for an even and 2
    /// for an odd number of electrons.
    pub fn degeneracy(&self) -> u32 {
        match self.fixed_spin {
            Some(n) => n.saturating_add(1),
            None => self.electron_count % 2 + 1,
        }
    }
}

/// Electronic contribution.
///
/// Excited states are assumed far above kT, so only the spin degeneracy of the
/// ground state contributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Elec {
    /// Partition function (spin degeneracy)
    pub z: f64,
    /// Entropy in eV/K
    pub s: f64,
    /// Internal energy in eV (always zero)
    pub e: f64,
}

impl Elec {
    /// Electronic contribution for the given spin state.
    pub fn new(state: &ElectronicState, constants: &PhysicalConstants) -> Result<Self> {
        let z = state.degeneracy() as f64;
        let s = constants.boltzmann * ln_partition(z, "electronic")?;
        Ok(Self { z, s, e: 0.0 })
    }
}

/// Vibrational contribution in the harmonic approximation.
///
/// Each real mode of frequency `f` contributes, with `x = h f / kT`,
///
/// ```text
/// Z = Π 1 / (1 − e^(−x))
/// S = k (Σ x / (e^x − 1) + ln Z)
/// E = Σ h f / (e^x − 1)
/// ```
///
/// The harmonic model breaks down at high temperature for soft modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vib {
    /// Partition function
    pub z: f64,
    /// Entropy in eV/K
    pub s: f64,
    /// Thermal vibrational energy in eV (zero-point energy excluded)
    pub e: f64,
    /// Number of modes included
    pub modes: usize,
}

impl Vib {
    /// Vibrational contribution for real frequencies in THz.
    ///
    /// An empty list gives `Z = 1, S = 0, E = 0`.
    pub fn new(temperature: f64, frequencies: &[f64], constants: &PhysicalConstants) -> Result<Self> {
        if frequencies.is_empty() {
            return Ok(Self {
                z: 1.0,
                s: 0.0,
                e: 0.0,
                modes: 0,
            });
        }

        let kt = constants.thermal_energy(temperature);
        let h = constants.planck;

        let mut z = 1.0;
        let mut reduced_sum = 0.0;
        let mut e = 0.0;
        for &f in frequencies {
            let x = h * f / kt;
            let occupation = 1.0 / x.exp_m1();
            z *= -1.0 / (-x).exp_m1();
            reduced_sum += x * occupation;
            e += h * f * occupation;
        }

        let s = constants.boltzmann * (reduced_sum + ln_partition(z, "vibrational")?);

        Ok(Self {
            z,
            s,
            e,
            modes: frequencies.len(),
        })
    }
}

/// Rotational contribution of a classical rigid rotor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rot {
    /// Partition function
    pub z: f64,
    /// Entropy in eV/K
    pub s: f64,
    /// Rotational energy in eV
    pub e: f64,
    /// Rotational symmetry number
    pub sigma: u32,
    /// Sorted principal moments of inertia in eV/THz²
    pub principal_moments: [f64; 3],
    /// Whether the molecule was treated as a linear rotor
    pub linear: bool,
}

impl Rot {
    /// Rotational contribution of `atoms`.
    ///
    /// A single atom has no rotational degrees of freedom (`Z = 1, S = 0, E = 0`).
    /// Otherwise the rotor is non-linear when `det(I) > tol · max(I)³`, where
    /// `max(I)` is the largest tensor element:
    ///
    /// ```text
    /// non-linear: Z = (8π²kT/h²)^(3/2) √(π det I) / σ,   E = 3/2 kT
    /// linear:     Z = 8π²kT I₂ / (σ h²),               E = kT
    /// ```
    ///
    /// and `S = k ln Z + E/T`.
    pub fn new(
        temperature: f64,
        cell: &Cell,
        atoms: &[Atom],
        masses: &MassTable,
        constants: &PhysicalConstants,
        tolerances: &Tolerances,
    ) -> Result<Self> {
        if atoms.len() <= 1 {
            return Ok(Self {
                z: 1.0,
                s: 0.0,
                e: 0.0,
                sigma: 1,
                principal_moments: [0.0; 3],
                linear: false,
            });
        }

        let masses = masses.masses_for(atoms)?;
        let inertia = geometry::inertia_tensor(cell, atoms, &masses, constants)?;
        let principal = geometry::principal_moments(&inertia);
        let sigma = symmetry::symmetry_number(cell, atoms, &masses, &principal, tolerances)?;

        let kt = constants.thermal_energy(temperature);
        let h2 = constants.planck.powi(2);
        let det = inertia.determinant();
        let linear = det <= tolerances.inertia * inertia.max().powi(3);

        let (z, e) = if linear {
            (8.0 * PI.powi(2) * kt * principal.moments[2] / h2 / sigma as f64, kt)
        } else {
            (
                (8.0 * PI.powi(2) * kt / h2).powf(1.5) * (PI * det).sqrt() / sigma as f64,
                1.5 * kt,
            )
        };

        debug!(
            "Rotor: sigma = {}, det(I) = {:.4e}, {}",
            sigma,
            det,
            if linear { "linear" } else { "non-linear" }
        );

        let s = constants.boltzmann * ln_partition(z, "rotational")? + e / temperature;

        Ok(Self {
            z,
            s,
            e,
            sigma,
            principal_moments: principal.moments.into(),
            linear,
        })
    }
}

/// Translational contribution of an ideal gas at pressure `P` (kPa).
///
/// ```text
/// Z = (2π M kT / h²)^(3/2) · kT / P
/// S = k (ln Z + 3/2)
/// E = 3/2 kT
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trans {
    /// Partition function
    pub z: f64,
    /// Entropy in eV/K
    pub s: f64,
    /// Translational energy in eV
    pub e: f64,
}

impl Trans {
    /// Translational contribution of `atoms` at `temperature` and `pressure`.
    pub fn new(
        temperature: f64,
        pressure: f64,
        atoms: &[Atom],
        masses: &MassTable,
        constants: &PhysicalConstants,
    ) -> Result<Self> {
        let total_mass: f64 =
            masses.masses_for(atoms)?.iter().sum::<f64>() * constants.mass_conversion;

        let kt = constants.thermal_energy(temperature);
        let volume = kt / (pressure * constants.pressure_conversion);
        let z = (2.0 * PI * total_mass * kt / constants.planck.powi(2)).powf(1.5) * volume;
        let s = constants.boltzmann * (ln_partition(z, "translational")? + 1.5);

        Ok(Self { z, s, e: 1.5 * kt })
    }
}

macro_rules! impl_contribution {
    ($ty:ty, $name:literal) => {
        impl Contribution for $ty {
            fn name(&self) -> &'static str {
                $name
            }
            fn partition_function(&self) -> f64 {
                self.z
            }
            fn entropy(&self) -> f64 {
                self.s
            }
            fn energy(&self) -> f64 {
                self.e
            }
        }
    };
}

impl_contribution!(Elec, "electronic");
impl_contribution!(Vib, "vibrational");
impl_contribution!(Rot, "rotational");
impl_contribution!(Trans, "translational");

/// Everything needed to evaluate the thermochemistry of one structure.
#[derive(Debug, Clone)]
pub struct ThermoInput<'a> {
    /// Temperature in K
    pub temperature: f64,
    /// Pressure in kPa (used for molecules only)
    pub pressure: f64,
    /// Frequency spectrum in THz; imaginary modes have a non-zero imaginary part
    pub spectrum: &'a [Complex64],
    /// Total DFT energy in eV
    pub dft_energy: f64,
    /// Simulation cell
    pub cell: &'a Cell,
    /// Atoms in fractional coordinates
    pub atoms: &'a [Atom],
    /// Atomic masses by species
    pub masses: &'a MassTable,
    /// Electron count and spin constraint
    pub electronic: ElectronicState,
    /// Gas-phase molecule (`true`) or adsorbate/solid (`false`)
    pub is_molecule: bool,
}

/// Result of a thermochemistry evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermoResult {
    /// Gibbs free energy G = H − TS in eV
    pub gibbs: f64,
    /// Enthalpy in eV
    pub enthalpy: f64,
    /// Entropy in eV/K
    pub entropy: f64,
    /// Zero-point energy in eV
    pub zero_point_energy: f64,
    /// Electronic contribution
    pub elec: Elec,
    /// Vibrational contribution
    pub vib: Vib,
    /// Rotational contribution (molecules only)
    pub rot: Option<Rot>,
    /// Translational contribution (molecules only)
    pub trans: Option<Trans>,
    /// Number of spectrum entries discarded as imaginary or negative
    pub discarded_modes: usize,
}

impl ThermoResult {
    /// All computed contributions, in report order.
    pub fn contributions(&self) -> Vec<&dyn Contribution> {
        let mut parts: Vec<&dyn Contribution> = Vec::with_capacity(4);
        parts.push(&self.elec);
        parts.push(&self.vib);
        if let Some(rot) = &self.rot {
            parts.push(rot);
        }
        if let Some(trans) = &self.trans {
            parts.push(trans);
        }
        parts
    }
}

/// Keeps the real, non-negative entries of a spectrum.
pub fn real_frequencies(spectrum: &[Complex64]) -> Vec<f64> {
    spectrum
        .iter()
        .filter(|f| f.im == 0.0 && f.re >= 0.0)
        .map(|f| f.re)
        .collect()
}

/// Evaluates thermochemistry with fixed constants and tolerances.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ThermoCalculator {
    /// Physical constants
    pub constants: PhysicalConstants,
    /// Symmetry tolerances
    pub tolerances: Tolerances,
}

impl ThermoCalculator {
    /// Creates a calculator.
    pub fn new(constants: PhysicalConstants, tolerances: Tolerances) -> Self {
        Self {
            constants,
            tolerances,
        }
    }

    /// Computes G, H, S and the zero-point energy of `input`.
    ///
    /// # Errors
    ///
    /// - [`ThermoError::InvalidInput`] for a non-positive temperature, a non-positive
    ///   pressure or an empty atom list (molecules only)
    /// - [`ThermoError::NonPhysicalPartitionFunction`] if any `Z` is not positive
    /// - [`ThermoError::Geometry`] for missing masses or geometric failures
    pub fn compute(&self, input: &ThermoInput) -> Result<ThermoResult> {
        self.validate(input)?;

        let t = input.temperature;
        let c = &self.constants;

        let freq = real_frequencies(input.spectrum);
        let discarded_modes = input.spectrum.len() - freq.len();
        if discarded_modes > 0 {
            warn!(
                "Discarding {} imaginary or negative mode(s) from the spectrum",
                discarded_modes
            );
        }

        let zero_point_energy = 0.5 * c.planck * freq.iter().sum::<f64>();

        let elec = Elec::new(&input.electronic, c)?;
        let vib = Vib::new(t, &freq, c)?;

        let (enthalpy, entropy, rot, trans) = if input.is_molecule {
            let rot = Rot::new(t, input.cell, input.atoms, input.masses, c, &self.tolerances)?;
            let trans = Trans::new(t, input.pressure, input.atoms, input.masses, c)?;

            let h = input.dft_energy
                + zero_point_energy
                + elec.e
                + vib.e
                + rot.e
                + trans.e
                + c.thermal_energy(t);
            let s = elec.s + vib.s + rot.s + trans.s + c.boltzmann;
            (h, s, Some(rot), Some(trans))
        } else {
            let h = input.dft_energy + zero_point_energy + elec.e + vib.e;
            let s = elec.s + vib.s + c.boltzmann;
            (h, s, None, None)
        };

        let gibbs = enthalpy - t * entropy;
        debug!("G = {:.6} eV, H = {:.6} eV, S = {:.6e} eV/K", gibbs, enthalpy, entropy);

        Ok(ThermoResult {
            gibbs,
            enthalpy,
            entropy,
            zero_point_energy,
            elec,
            vib,
            rot,
            trans,
            discarded_modes,
        })
    }

    fn validate(&self, input: &ThermoInput) -> Result<()> {
        if !(input.temperature > 0.0 && input.temperature.is_finite()) {
            return Err(ThermoError::InvalidInput(format!(
                "temperature must be positive, got {} K",
                input.temperature
            )));
        }
        if input.is_molecule {
            if !(input.pressure > 0.0 && input.pressure.is_finite()) {
                return Err(ThermoError::InvalidInput(format!(
                    "pressure must be positive, got {} kPa",
                    input.pressure
                )));
            }
            if input.atoms.is_empty() {
                return Err(ThermoError::InvalidInput(
                    "a molecule needs at least one atom".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Computes thermochemistry with VASP unit constants and default tolerances.
pub fn compute_thermo(input: &ThermoInput) -> Result<ThermoResult> {
    ThermoCalculator::default().compute(input)
}
