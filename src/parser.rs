//! Readers for VASP input and output files.
//!
//! This module extracts the data the thermochemistry engine needs from a finished
//! VASP frequency calculation:
//!
//! - **OUTCAR**: total energy, electron count, NUPDOWN and the vibrational spectrum
//! - **POTCAR**: atomic masses of each species
//! - **POSCAR/CONTCAR**: cell, species and fractional positions
//!
//! Every reader comes in two flavours: `read_*` takes a path, `parse_*` takes the
//! file contents.
//!
//! # Frequencies
//!
//! VASP lists the eigenvalues of the dynamical matrix as
//!
//! ```text
//!    1 f  =   67.981 THz   427.13 2PiTHz 2267.6 cm-1   281.14 meV
//!    9 f/i=    1.234 THz     7.75 2PiTHz   41.2 cm-1     5.10 meV
//! ```
//!
//! Real modes become `Complex64::new(f, 0.0)`; imaginary (`f/i`) modes become
//! `Complex64::new(0.0, f)`.

use crate::structure::{Atom, Cell, MassTable, Poscar};
use lazy_static::lazy_static;
use log::debug;
use nalgebra::{Matrix3, Vector3};
use num_complex::Complex64;
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for parsing operations.
#[derive(Error, Debug)]
pub enum ParseError {
    /// I/O error when reading files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Parse error with descriptive message
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Type alias for parse operation results
type Result<T> = std::result::Result<T, ParseError>;

const FLOAT_RE: &str = r"[-+]?(?:\d+\.\d*|\.\d+|\d+)(?:[eE][-+]?\d+)?";

lazy_static! {
    // "   NELECT =      16.0000    total number of electrons"
    static ref NELECT_RE: Regex = Regex::new(&format!(r"NELECT\s*=\s*({0})", FLOAT_RE)).unwrap();

    // "   NUPDOWN=    -1.0000    fix difference up-down"
    static ref NUPDOWN_RE: Regex = Regex::new(&format!(r"NUPDOWN\s*=\s*({0})", FLOAT_RE)).unwrap();

    // "  energy  without entropy=  -14.22  energy(sigma->0) =  -14.22"
    static ref ENERGY_RE: Regex =
        Regex::new(&format!(r"energy\(sigma->0\)\s*=\s*({0})", FLOAT_RE)).unwrap();

    static ref FREQ_RE: Regex =
        Regex::new(&format!(r"^\s*\d+\s+f(/i)?\s*=\s*({0})\s+THz", FLOAT_RE)).unwrap();

    // "   VRHFIN =C: s2p2"
    static ref VRHFIN_RE: Regex = Regex::new(r"VRHFIN\s*=\s*(\w+)\s*:").unwrap();

    // "   POMASS =   12.011; ZVAL   =    4.000    mass and valenz"
    static ref POMASS_RE: Regex = Regex::new(r"POMASS\s*=\s*([0-9.]+)").unwrap();
}

const DYNMAT_HEADER: &str = "Eigenvectors and eigenvalues of the dynamical matrix";
const MASS_WEIGHTED_HEADER: &str = "Eigenvectors after division by SQRT(mass)";

/// Data extracted from an OUTCAR file.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcarData {
    /// Last `energy(sigma->0)` value in eV
    pub dft_energy: f64,
    /// Number of valence electrons (NELECT)
    pub electron_count: u32,
    /// NUPDOWN if it was fixed (non-negative), `None` otherwise
    pub fixed_spin: Option<u32>,
    /// Vibrational spectrum in THz (empty if no frequency block was found)
    pub frequencies: Vec<Complex64>,
}

fn last_capture(re: &Regex, content: &str, name: &str) -> Result<f64> {
    let value = re
        .captures_iter(content)
        .last()
        .and_then(|c| c.get(1))
        .ok_or_else(|| ParseError::Parse(format!("{} not found", name)))?;
    value
        .as_str()
        .parse()
        .map_err(|_| ParseError::Parse(format!("Invalid {} value: {}", name, value.as_str())))
}

/// Reads an OUTCAR file.
pub fn read_outcar(path: &Path) -> Result<OutcarData> {
    let content = fs::read_to_string(path)?;
    parse_outcar(&content)
}

/// Parses the contents of an OUTCAR file.
///
/// # Errors
///
/// Returns [`ParseError::Parse`] if NELECT or the total energy is missing.
/// A missing NUPDOWN is treated as unset.
pub fn parse_outcar(content: &str) -> Result<OutcarData> {
    let nelect = last_capture(&NELECT_RE, content, "NELECT")?;
    if nelect < 0.0 {
        return Err(ParseError::Parse(format!("Negative NELECT: {}", nelect)));
    }
    let electron_count = nelect.round() as u32;

    let fixed_spin = match last_capture(&NUPDOWN_RE, content, "NUPDOWN") {
        Ok(n) if n >= 0.0 => Some(n.round() as u32),
        _ => None,
    };

    let dft_energy = last_capture(&ENERGY_RE, content, "energy(sigma->0)")?;
    let frequencies = parse_frequencies(content)?;

    debug!(
        "OUTCAR: E = {} eV, NELECT = {}, NUPDOWN = {:?}, {} modes",
        dft_energy,
        electron_count,
        fixed_spin,
        frequencies.len()
    );

    Ok(OutcarData {
        dft_energy,
        electron_count,
        fixed_spin,
        frequencies,
    })
}

/// Extracts the last dynamical-matrix eigenvalue block of an OUTCAR.
pub fn parse_frequencies(content: &str) -> Result<Vec<Complex64>> {
    let mut frequencies = Vec::new();
    let mut in_block = false;

    for line in content.lines() {
        if line.contains(DYNMAT_HEADER) {
            in_block = true;
            frequencies.clear();
            continue;
        }
        if line.contains(MASS_WEIGHTED_HEADER) {
            in_block = false;
            continue;
        }
        if !in_block {
            continue;
        }
        if let Some(caps) = FREQ_RE.captures(line) {
            let value: f64 = caps[2]
                .parse()
                .map_err(|_| ParseError::Parse(format!("Invalid frequency: {}", &caps[2])))?;
            if caps.get(1).is_some() {
                frequencies.push(Complex64::new(0.0, value));
            } else {
                frequencies.push(Complex64::new(value, 0.0));
            }
        }
    }

    Ok(frequencies)
}

/// Reads a POTCAR file.
pub fn read_potcar(path: &Path) -> Result<MassTable> {
    let content = fs::read_to_string(path)?;
    parse_potcar(&content)
}

/// Parses the species and masses of a (concatenated) POTCAR.
///
/// # Errors
///
/// Returns [`ParseError::Parse`] if no species are found or if the number of
/// `VRHFIN` and `POMASS` entries differs.
pub fn parse_potcar(content: &str) -> Result<MassTable> {
    let species: Vec<&str> = VRHFIN_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let masses = POMASS_RE
        .captures_iter(content)
        .map(|c| {
            c[1].parse::<f64>()
                .map_err(|_| ParseError::Parse(format!("Invalid POMASS: {}", &c[1])))
        })
        .collect::<Result<Vec<f64>>>()?;

    if species.is_empty() {
        return Err(ParseError::Parse("No VRHFIN entries in POTCAR".into()));
    }
    if species.len() != masses.len() {
        return Err(ParseError::Parse(format!(
            "POTCAR has {} VRHFIN entries but {} POMASS entries",
            species.len(),
            masses.len()
        )));
    }

    Ok(species.into_iter().zip(masses).collect())
}

/// Reads a POSCAR (or CONTCAR) file.
pub fn read_poscar(path: &Path) -> Result<Poscar> {
    let content = fs::read_to_string(path)?;
    parse_poscar(&content)
}

fn parse_floats(line: &str, count: usize, what: &str) -> Result<Vec<f64>> {
    let values = line
        .split_whitespace()
        .take(count)
        .map(|s| {
            s.parse::<f64>()
                .map_err(|_| ParseError::Parse(format!("Invalid {}: {}", what, line.trim())))
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.len() < count {
        return Err(ParseError::Parse(format!("Incomplete {}: {}", what, line.trim())));
    }
    Ok(values)
}

fn next_line<'a>(lines: &mut std::str::Lines<'a>, what: &str) -> Result<&'a str> {
    lines
        .next()
        .ok_or_else(|| ParseError::Parse(format!("POSCAR ends before {}", what)))
}

fn parse_flag(token: &str) -> Result<bool> {
    match token {
        "T" | "t" => Ok(true),
        "F" | "f" => Ok(false),
        _ => Err(ParseError::Parse(format!(
            "Invalid selective dynamics flag: {}",
            token
        ))),
    }
}

/// Parses a VASP 5 POSCAR.
///
/// Supports a negative scaling factor (interpreted as the target cell volume),
/// an optional `Selective dynamics` line and both `Direct` and `Cartesian`
/// coordinates. Cartesian positions are converted to fractional.
///
/// # Errors
///
/// Returns [`ParseError::Parse`] for truncated files, VASP 4 files without a
/// species line, malformed numbers or a singular lattice.
pub fn parse_poscar(content: &str) -> Result<Poscar> {
    let mut lines = content.lines();

    let comment = next_line(&mut lines, "comment")?.trim().to_string();
    let scale = parse_floats(next_line(&mut lines, "scaling factor")?, 1, "scaling factor")?[0];

    let mut vectors = [[0.0; 3]; 3];
    for vector in vectors.iter_mut() {
        let v = parse_floats(next_line(&mut lines, "lattice vectors")?, 3, "lattice vector")?;
        vector.copy_from_slice(&v);
    }
    let lattice = Matrix3::from_columns(&vectors.map(Vector3::from));
    let factor = if scale < 0.0 {
        (-scale / lattice.determinant().abs()).cbrt()
    } else {
        scale
    };
    let cell = Cell::new(lattice * factor).map_err(|e| ParseError::Parse(e.to_string()))?;

    let species_line = next_line(&mut lines, "species")?;
    let species: Vec<String> = species_line.split_whitespace().map(String::from).collect();
    if species.is_empty() || !species[0].chars().all(|c| c.is_alphabetic()) {
        return Err(ParseError::Parse(
            "POSCAR species line is missing (VASP 4 format is not supported)".into(),
        ));
    }

    let counts = next_line(&mut lines, "atom counts")?
        .split_whitespace()
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| ParseError::Parse(format!("Invalid atom count: {}", s)))
        })
        .collect::<Result<Vec<usize>>>()?;
    if counts.len() != species.len() {
        return Err(ParseError::Parse(format!(
            "{} species but {} atom counts",
            species.len(),
            counts.len()
        )));
    }

    let mut mode = next_line(&mut lines, "coordinate mode")?.trim().to_string();
    let selective = mode.starts_with(['S', 's']);
    if selective {
        mode = next_line(&mut lines, "coordinate mode")?.trim().to_string();
    }
    let cartesian = mode.starts_with(['C', 'c', 'K', 'k']);

    let mut atoms = Vec::with_capacity(counts.iter().sum());
    for (symbol, &count) in species.iter().zip(&counts) {
        for _ in 0..count {
            let line = next_line(&mut lines, "atomic positions")?;
            let xyz = parse_floats(line, 3, "position")?;
            let mut position = Vector3::new(xyz[0], xyz[1], xyz[2]);
            if cartesian {
                position = cell.to_fractional(&(position * factor));
            }

            let flags = if selective {
                let tokens: Vec<&str> = line.split_whitespace().skip(3).take(3).collect();
                if tokens.len() < 3 {
                    return Err(ParseError::Parse(format!(
                        "Missing selective dynamics flags: {}",
                        line.trim()
                    )));
                }
                Some([
                    parse_flag(tokens[0])?,
                    parse_flag(tokens[1])?,
                    parse_flag(tokens[2])?,
                ])
            } else {
                None
            };

            atoms.push(Atom {
                species: symbol.clone(),
                position,
                selective: flags,
            });
        }
    }

    Ok(Poscar {
        comment,
        cell,
        atoms,
    })
}
