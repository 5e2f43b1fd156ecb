#![deny(missing_docs)]

//! vaspgibbs - Gibbs free energies from VASP frequency calculations
//!
//! vaspgibbs turns the output of a VASP finite-difference frequency calculation
//! (`IBRION = 5`) into thermochemical quantities: zero-point energy, enthalpy,
//! entropy and Gibbs free energy at a chosen temperature and pressure.
//!
//! # Overview
//!
//! The free energy is assembled from partition functions:
//!
//! - **Electronic**: ground-state spin degeneracy from NELECT / NUPDOWN
//! - **Vibrational**: harmonic oscillators from the real frequencies
//! - **Rotational**: classical rigid rotor with an automatically detected
//!   rotational symmetry number (molecules only)
//! - **Translational**: ideal gas (molecules only)
//!
//! ```text
//! G = H - T·S
//! ```
//!
//! Adsorbates and solids keep only the electronic and vibrational terms.
//!
//! # Workflow
//!
//! 1. `vasp-gibbs prepare --top 2` writes a POSCAR with selective-dynamics flags so
//!    that only the adsorbate and the top slab layers are displaced
//! 2. Run VASP with `IBRION = 5`
//! 3. `vasp-gibbs -t 500 [-m]` reads OUTCAR, POTCAR and POSCAR and reports G, H, S
//!
//! # Quick Start
//!
//! ```no_run
//! use vaspgibbs::parser::{read_outcar, read_poscar, read_potcar};
//! use vaspgibbs::thermo::{compute_thermo, ElectronicState, ThermoInput};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcar = read_outcar(Path::new("OUTCAR"))?;
//!     let masses = read_potcar(Path::new("POTCAR"))?;
//!     let poscar = read_poscar(Path::new("POSCAR"))?;
//!
//!     let input = ThermoInput {
//!         temperature: 298.15,
//!         pressure: 101.325,
//!         spectrum: &outcar.frequencies,
//!         dft_energy: outcar.dft_energy,
//!         cell: &poscar.cell,
//!         atoms: &poscar.atoms,
//!         masses: &masses,
//!         electronic: ElectronicState::new(outcar.electron_count, outcar.fixed_spin),
//!         is_molecule: true,
//!     };
//!     let result = compute_thermo(&input)?;
//!     println!("G = {:.4} eV", result.gibbs);
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`constants`]: unit constants and symmetry tolerances
//! - [`structure`]: atoms, cells, POSCAR contents and mass tables
//! - [`geometry`]: centre of mass, inertia tensor, rigid rotations
//! - [`symmetry`]: rotational symmetry number search
//! - [`thermo`]: partition functions and G/H/S assembly
//! - [`parser`]: OUTCAR, POTCAR and POSCAR readers
//! - [`io`]: POSCAR/JSON writers and selective-dynamics preparation
//! - [`report`]: plain-text result tables
//! - [`settings`]: hierarchical INI configuration
//! - [`cli`]: command-line parsing for the `vasp-gibbs` binary

pub mod cli;
pub mod constants;
pub mod geometry;
pub mod io;
pub mod parser;
pub mod report;
pub mod settings;
pub mod structure;
pub mod symmetry;
pub mod thermo;

pub use constants::{PhysicalConstants, Tolerances};
pub use structure::{Atom, Cell, MassTable, Poscar};
pub use thermo::{compute_thermo, ThermoCalculator, ThermoInput, ThermoResult};
