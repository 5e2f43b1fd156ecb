//! Rigid-body geometry kernel.
//!
//! This module provides the rigid-body operations needed by the rotational
//! partition function and the symmetry-number search:
//!
//! - [`center_of_mass`] and [`inertia_tensor`] about the center of mass
//! - [`principal_moments`]: sorted eigen-decomposition of the inertia tensor
//! - [`rotation_matrix`] (Rodrigues' formula) and [`rotate_molecule`]
//! - [`rigid_equal`]: species-aware comparison of two configurations
//!
//! Atoms carry fractional coordinates; every distance is measured in Cartesian
//! space after mapping through the [`Cell`].

use crate::constants::PhysicalConstants;
use crate::structure::{Atom, Cell};
use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use thiserror::Error;

/// Error type for geometric operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Rotation requested about a zero-length (or non-finite) axis
    #[error("Rotation axis has zero length")]
    ZeroAxis,
    /// Cell matrix has no inverse
    #[error("Cell matrix is singular")]
    SingularCell,
    /// No mass is known for a species
    #[error("No mass available for species '{0}'")]
    UnknownSpecies(String),
    /// Per-atom data does not match the atom list
    #[error("Length mismatch: {atoms} atoms but {masses} masses")]
    LengthMismatch {
        /// Number of atoms
        atoms: usize,
        /// Number of masses
        masses: usize,
    },
}

/// Sorted principal moments of inertia and the matching principal axes.
#[derive(Debug, Clone, PartialEq)]
pub struct PrincipalMoments {
    /// Eigenvalues in ascending order
    pub moments: Vector3<f64>,
    /// Unit principal axes; column `i` belongs to `moments[i]`
    pub axes: Matrix3<f64>,
}

fn check_lengths(atoms: &[Atom], masses: &[f64]) -> Result<(), GeometryError> {
    if atoms.len() != masses.len() {
        return Err(GeometryError::LengthMismatch {
            atoms: atoms.len(),
            masses: masses.len(),
        });
    }
    Ok(())
}

/// Mass-weighted average of the Cartesian atomic positions.
///
/// # Errors
///
/// Returns [`GeometryError::LengthMismatch`] if `masses` and `atoms` differ in length.
pub fn center_of_mass(
    cell: &Cell,
    atoms: &[Atom],
    masses: &[f64],
) -> Result<Vector3<f64>, GeometryError> {
    check_lengths(atoms, masses)?;
    let total: f64 = masses.iter().sum();
    let weighted = atoms
        .iter()
        .zip(masses)
        .fold(Vector3::zeros(), |acc, (atom, &m)| {
            acc + cell.to_cartesian(&atom.position) * m
        });
    Ok(weighted / total)
}

/// Inertia tensor about the center of mass, in eV/THz².
///
/// ```text
/// I_ij = Σ_k m_k (δ_ij |r_k|² − r_k,i r_k,j)
/// ```
///
/// with `r_k` the Cartesian offset of atom `k` from the center of mass. The result
/// is symmetric by construction.
pub fn inertia_tensor(
    cell: &Cell,
    atoms: &[Atom],
    masses: &[f64],
    constants: &PhysicalConstants,
) -> Result<Matrix3<f64>, GeometryError> {
    let cm = center_of_mass(cell, atoms, masses)?;

    let mut tensor = Matrix3::zeros();
    for (atom, &m) in atoms.iter().zip(masses) {
        let r = cell.to_cartesian(&atom.position) - cm;
        tensor += (Matrix3::identity() * r.norm_squared() - r * r.transpose()) * m;
    }

    Ok(tensor * constants.inertia_conversion)
}

/// Diagonalizes a symmetric tensor, sorting eigenvalues in ascending order.
pub fn principal_moments(tensor: &Matrix3<f64>) -> PrincipalMoments {
    let eigen = SymmetricEigen::new(*tensor);

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));

    let moments = Vector3::new(
        eigen.eigenvalues[order[0]],
        eigen.eigenvalues[order[1]],
        eigen.eigenvalues[order[2]],
    );
    let axes = Matrix3::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ]);

    PrincipalMoments { moments, axes }
}

/// Rotation by `theta` radians about `axis` (Rodrigues' formula).
///
/// ```text
/// R = P + (I − P) cos θ + Q sin θ
/// ```
///
/// where `P = u uᵀ` projects onto the normalized axis `u` and `Q` is the
/// cross-product matrix of `u`.
///
/// # Errors
///
/// Returns [`GeometryError::ZeroAxis`] if `axis` has zero or non-finite length.
///
/// # Examples
///
/// ```
/// use vaspgibbs::geometry::rotation_matrix;
/// use nalgebra::Vector3;
/// use std::f64::consts::FRAC_PI_2;
///
/// let r = rotation_matrix(&Vector3::new(0.0, 0.0, 2.0), FRAC_PI_2)?;
/// let v = r * Vector3::new(1.0, 0.0, 0.0);
/// assert!((v - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
/// # Ok::<(), vaspgibbs::geometry::GeometryError>(())
/// ```
pub fn rotation_matrix(axis: &Vector3<f64>, theta: f64) -> Result<Matrix3<f64>, GeometryError> {
    let norm = axis.norm();
    if norm == 0.0 || !norm.is_finite() {
        return Err(GeometryError::ZeroAxis);
    }
    let u = axis / norm;

    let p = u * u.transpose();
    let q = u.cross_matrix();

    Ok(p + (Matrix3::identity() - p) * theta.cos() + q * theta.sin())
}

/// Rotates every atom by `theta` about `axis` through the point `cm`.
///
/// Positions are converted to Cartesian, rotated about `cm`, and converted back to
/// fractional coordinates. A new atom list is returned; `atoms` is left untouched.
pub fn rotate_molecule(
    cell: &Cell,
    atoms: &[Atom],
    cm: &Vector3<f64>,
    axis: &Vector3<f64>,
    theta: f64,
) -> Result<Vec<Atom>, GeometryError> {
    let rotation = rotation_matrix(axis, theta)?;

    Ok(atoms
        .iter()
        .map(|atom| {
            let cart = cell.to_cartesian(&atom.position);
            let rotated = rotation * (cart - cm) + cm;
            atom.with_position(cell.to_fractional(&rotated))
        })
        .collect())
}

/// Tests whether `b` reproduces `a` within `tol` Angstrom.
///
/// Every atom of `a` must have at least one atom of the same species in `b` closer
/// than `tol`. The match is existential: several atoms of `a` may pair with the same
/// atom of `b`.
pub fn rigid_equal(cell: &Cell, a: &[Atom], b: &[Atom], tol: f64) -> bool {
    a.iter().all(|atom_a| {
        b.iter().any(|atom_b| {
            atom_a.species == atom_b.species
                && cell.to_cartesian(&(atom_a.position - atom_b.position)).norm() < tol
        })
    })
}
