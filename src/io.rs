//! File output for structures and results.
//!
//! This module writes POSCAR files (optionally with selective dynamics, as needed
//! to restrict a VASP finite-difference frequency calculation to a subset of atoms)
//! and JSON result files.

use crate::structure::{Atom, Cell, Poscar};
use crate::thermo::ThermoResult;
use log::info;
use std::fs;
use std::io::Result;
use std::path::Path;
use thiserror::Error;

/// Error type for selective-dynamics preparation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrepareError {
    /// An atom index is outside the structure
    #[error("Atom index {index} is out of range for {count} atoms")]
    IndexOutOfRange {
        /// Offending 0-based index
        index: usize,
        /// Number of atoms in the structure
        count: usize,
    },
    /// More top layers requested than the structure has
    #[error("Requested {requested} top layers but the structure has only {available}")]
    TooManyLayers {
        /// Number of layers requested
        requested: usize,
        /// Number of distinct layers found
        available: usize,
    },
}

/// Formats a POSCAR in VASP 5 format with direct coordinates.
pub fn format_poscar(poscar: &Poscar) -> String {
    let mut content = format!("{}\n   1.00000000000000\n", poscar.comment);

    for i in 0..3 {
        let v = poscar.cell.lattice_vector(i);
        content.push_str(&format!("  {:20.16}  {:20.16}  {:20.16}\n", v.x, v.y, v.z));
    }

    // species are listed by contiguous runs so that atom order is preserved
    let mut runs: Vec<(&str, usize)> = Vec::new();
    for atom in &poscar.atoms {
        match runs.last_mut() {
            Some((species, count)) if *species == atom.species => *count += 1,
            _ => runs.push((atom.species.as_str(), 1)),
        }
    }
    let symbols: Vec<String> = runs.iter().map(|(s, _)| format!("{:>4}", s)).collect();
    let counts: Vec<String> = runs.iter().map(|(_, n)| format!("{:>4}", n)).collect();
    content.push_str(&format!("{}\n{}\n", symbols.join(" "), counts.join(" ")));

    let selective = poscar.has_selective_dynamics();
    if selective {
        content.push_str("Selective dynamics\n");
    }
    content.push_str("Direct\n");

    for atom in &poscar.atoms {
        let p = atom.position;
        content.push_str(&format!("  {:20.16}  {:20.16}  {:20.16}", p.x, p.y, p.z));
        if selective {
            let flags = atom.selective.unwrap_or([true; 3]);
            for flag in flags {
                content.push_str(if flag { "   T" } else { "   F" });
            }
        }
        content.push('\n');
    }

    content
}

/// Writes a POSCAR file.
///
/// # Examples
///
/// ```
/// use vaspgibbs::io;
/// use vaspgibbs::structure::{Atom, Cell, Poscar};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let poscar = Poscar {
///         comment: "H2".to_string(),
///         cell: Cell::cubic(10.0)?,
///         atoms: vec![Atom::new("H", [0.5, 0.5, 0.5]), Atom::new("H", [0.5, 0.5, 0.574])],
///     };
///     let path = std::env::temp_dir().join("vaspgibbs_doc_POSCAR");
///     io::write_poscar(&poscar, &path)?;
///     std::fs::remove_file(&path)?;
///     Ok(())
/// }
/// ```
pub fn write_poscar(poscar: &Poscar, path: &Path) -> Result<()> {
    fs::write(path, format_poscar(poscar))?;
    info!("Wrote {} atoms to {}", poscar.atoms.len(), path.display());
    Ok(())
}

/// Writes a thermochemistry result as pretty-printed JSON.
pub fn write_json(result: &ThermoResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json)?;
    info!("Wrote results to {}", path.display());
    Ok(())
}

/// Layer index of every atom, counted from the top (largest Cartesian z).
///
/// Atoms whose heights differ by less than `tol` from the highest atom of a layer
/// belong to that layer.
fn layers_from_top(cell: &Cell, atoms: &[Atom], tol: f64) -> (Vec<usize>, usize) {
    let heights: Vec<f64> = atoms
        .iter()
        .map(|a| cell.to_cartesian(&a.position).z)
        .collect();

    let mut order: Vec<usize> = (0..atoms.len()).collect();
    order.sort_by(|&a, &b| heights[b].total_cmp(&heights[a]));

    let mut layer_of = vec![0; atoms.len()];
    let mut layer_count = 0;
    let mut layer_top = f64::INFINITY;
    for &i in &order {
        if layer_count == 0 || layer_top - heights[i] >= tol {
            layer_count += 1;
            layer_top = heights[i];
        }
        layer_of[i] = layer_count - 1;
    }

    (layer_of, layer_count)
}

/// Sets selective-dynamics flags for a frequency calculation.
///
/// - With no `moving` atoms and `top == 0`, every atom may move.
/// - Otherwise atoms listed in `moving` (0-based) and atoms in the `top` highest
///   layers may move; all other atoms are frozen.
///
/// Layers are groups of atoms whose Cartesian heights agree within `tol` Å.
///
/// # Errors
///
/// - [`PrepareError::IndexOutOfRange`] if an index in `moving` is not an atom
/// - [`PrepareError::TooManyLayers`] if `top` exceeds the number of layers
///
/// # Examples
///
/// ```
/// use vaspgibbs::io::prepare_poscar;
/// use vaspgibbs::structure::{Atom, Cell};
///
/// let cell = Cell::cubic(1.0)?;
/// let atoms = vec![Atom::new("C", [0.0, 0.0, 0.0]), Atom::new("C", [0.0, 0.0, 0.5])];
///
/// let prepared = prepare_poscar(&cell, &atoms, &[], 1, 1e-3)?;
/// assert_eq!(prepared[0].selective, Some([false; 3]));
/// assert_eq!(prepared[1].selective, Some([true; 3]));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn prepare_poscar(
    cell: &Cell,
    atoms: &[Atom],
    moving: &[usize],
    top: usize,
    tol: f64,
) -> std::result::Result<Vec<Atom>, PrepareError> {
    if let Some(&index) = moving.iter().find(|&&i| i >= atoms.len()) {
        return Err(PrepareError::IndexOutOfRange {
            index,
            count: atoms.len(),
        });
    }

    let (layer_of, layer_count) = layers_from_top(cell, atoms, tol);
    if top > layer_count {
        return Err(PrepareError::TooManyLayers {
            requested: top,
            available: layer_count,
        });
    }

    let everything = moving.is_empty() && top == 0;
    Ok(atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| {
            let free = everything || moving.contains(&i) || layer_of[i] < top;
            Atom {
                selective: Some([free; 3]),
                ..atom.clone()
            }
        })
        .collect())
}
