//! Rotational symmetry number detection.
//!
//! The symmetry number σ counts the indistinguishable orientations of a molecule
//! reachable by proper rotations. It divides the rotational partition function.
//!
//! Only cyclic rotations about the three principal axes of inertia are searched:
//! for every non-degenerate, non-vanishing principal moment the largest order `n`
//! such that a rotation by 2π/n maps the molecule onto itself is found, and σ is
//! the product of those orders. This is exact for the common cases (C∞v, D∞h, C2v,
//! C3v, D3h, ...) but is not a full point-group classification.

use crate::constants::Tolerances;
use crate::geometry::{self, GeometryError, PrincipalMoments};
use crate::structure::{Atom, Cell};
use log::debug;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Largest number of atoms sharing one species.
///
/// No rotation of order larger than this can map the molecule onto itself.
pub fn max_species_repetition(atoms: &[Atom]) -> usize {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for atom in atoms {
        *counts.entry(atom.species.as_str()).or_default() += 1;
    }
    counts.into_values().max().unwrap_or(0)
}

/// Rotational symmetry number of a molecule.
///
/// # Algorithm
///
/// 1. Take the sorted moments `I[0..3]` and axes from `principal`.
/// 2. Skip axis `i` if `I[i] < tol · max(I)` (vanishing moment, e.g. the axis of a
///    linear molecule) or if `(I[i] − I[i−1]) / I[i] < tol` (degenerate with the
///    previous axis).
/// 3. For every remaining axis try orders `2..=max_rep` and keep the largest order
///    whose rotation is reproduced by [`geometry::rigid_equal`].
/// 4. Multiply the per-axis orders.
///
/// `tol` is `tolerances.inertia`; atom matching uses `tolerances.symmetry`.
///
/// # Returns
///
/// σ ≥ 1. An empty or single-atom system has σ = 1.
pub fn symmetry_number(
    cell: &Cell,
    atoms: &[Atom],
    masses: &[f64],
    principal: &PrincipalMoments,
    tolerances: &Tolerances,
) -> Result<u32, GeometryError> {
    if atoms.len() < 2 {
        return Ok(1);
    }

    let cm = geometry::center_of_mass(cell, atoms, masses)?;
    let moments = principal.moments;
    let max_moment = moments.max();
    let max_rep = max_species_repetition(atoms);

    let mut sigma = 1u32;
    for i in 0..3 {
        if moments[i] < tolerances.inertia * max_moment {
            debug!("Axis {}: vanishing moment {:.3e}, skipped", i, moments[i]);
            continue;
        }
        if i > 0 && (moments[i] - moments[i - 1]) / moments[i] < tolerances.inertia {
            debug!("Axis {}: degenerate with axis {}, skipped", i, i - 1);
            continue;
        }

        let axis = principal.axes.column(i).into_owned();
        let mut axis_order = 1u32;
        for order in 2..=max_rep {
            let rotated = geometry::rotate_molecule(cell, atoms, &cm, &axis, 2.0 * PI / order as f64)?;
            if geometry::rigid_equal(cell, atoms, &rotated, tolerances.symmetry) {
                axis_order = order as u32;
            }
        }

        debug!("Axis {}: rotational order {}", i, axis_order);
        sigma *= axis_order;
    }

    Ok(sigma)
}
