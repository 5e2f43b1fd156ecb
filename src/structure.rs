//! Periodic structure data types.
//!
//! This module provides the data model shared by the VASP readers and the
//! thermochemistry engine:
//!
//! - [`Atom`]: species label, fractional position and optional selective-dynamics flags
//! - [`Cell`]: lattice matrix with its cached inverse
//! - [`MassTable`]: species → atomic mass lookup (usually read from POTCAR)
//!
//! Positions are fractional. Cartesian coordinates are in Angstrom and are
//! obtained with [`Cell::to_cartesian`].

use crate::geometry::GeometryError;
use nalgebra::{Matrix3, Vector3};
use std::collections::HashMap;

/// A single atom of a periodic structure.
///
/// # Examples
///
/// ```
/// use vaspgibbs::structure::Atom;
///
/// let atom = Atom::new("O", [0.5, 0.5, 0.5]);
/// assert_eq!(atom.species, "O");
/// assert!(atom.selective.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol, e.g. "C" or "Pt"
    pub species: String,
    /// Position in fractional cell coordinates
    pub position: Vector3<f64>,
    /// Selective-dynamics flags (x, y, z); `true` means the coordinate may move
    pub selective: Option<[bool; 3]>,
}

impl Atom {
    /// Creates an atom without selective-dynamics flags.
    pub fn new(species: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            species: species.into(),
            position: Vector3::from(position),
            selective: None,
        }
    }

    /// Returns a copy of this atom placed at another fractional position.
    pub fn with_position(&self, position: Vector3<f64>) -> Self {
        Self {
            species: self.species.clone(),
            position,
            selective: self.selective,
        }
    }
}

/// Simulation cell.
///
/// The matrix maps fractional to Cartesian coordinates, `cartesian = C · fractional`,
/// so the lattice vectors are the *columns* of `C`. POSCAR files list the lattice
/// vectors as rows; use [`Cell::from_lattice_vectors`] for that layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl Cell {
    /// Creates a cell from a fractional → Cartesian matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::SingularCell`] if the matrix cannot be inverted.
    pub fn new(matrix: Matrix3<f64>) -> Result<Self, GeometryError> {
        let inverse = matrix.try_inverse().ok_or(GeometryError::SingularCell)?;
        if !inverse.iter().all(|v| v.is_finite()) {
            return Err(GeometryError::SingularCell);
        }
        Ok(Self { matrix, inverse })
    }

    /// Creates a cell from three lattice vectors `a`, `b`, `c` in Angstrom.
    ///
    /// # Examples
    ///
    /// ```
    /// use vaspgibbs::structure::Cell;
    /// use nalgebra::Vector3;
    ///
    /// let cell = Cell::from_lattice_vectors([[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]])?;
    /// let cart = cell.to_cartesian(&Vector3::new(0.5, 0.5, 0.5));
    /// assert_eq!(cart, Vector3::new(1.0, 1.5, 2.0));
    /// # Ok::<(), vaspgibbs::geometry::GeometryError>(())
    /// ```
    pub fn from_lattice_vectors(vectors: [[f64; 3]; 3]) -> Result<Self, GeometryError> {
        let columns = vectors.map(Vector3::from);
        Self::new(Matrix3::from_columns(&columns))
    }

    /// Cubic cell with edge length `a`.
    pub fn cubic(a: f64) -> Result<Self, GeometryError> {
        Self::new(Matrix3::from_diagonal_element(a))
    }

    /// The fractional → Cartesian matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// The Cartesian → fractional matrix.
    pub fn inverse(&self) -> &Matrix3<f64> {
        &self.inverse
    }

    /// Lattice vector `i` (0 = a, 1 = b, 2 = c).
    pub fn lattice_vector(&self, i: usize) -> Vector3<f64> {
        self.matrix.column(i).into_owned()
    }

    /// Cell volume in Å³.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Converts a fractional position to Cartesian coordinates.
    #[inline]
    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.matrix * fractional
    }

    /// Converts a Cartesian position to fractional coordinates.
    #[inline]
    pub fn to_fractional(&self, cartesian: &Vector3<f64>) -> Vector3<f64> {
        self.inverse * cartesian
    }
}

/// Contents of a POSCAR file.
#[derive(Debug, Clone, PartialEq)]
pub struct Poscar {
    /// First line of the file
    pub comment: String,
    /// Simulation cell, scaling factor already applied
    pub cell: Cell,
    /// Atoms in file order
    pub atoms: Vec<Atom>,
}

impl Poscar {
    /// Returns true if any atom carries selective-dynamics flags.
    pub fn has_selective_dynamics(&self) -> bool {
        self.atoms.iter().any(|a| a.selective.is_some())
    }
}

/// Atomic masses by species, in Dalton.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MassTable {
    masses: HashMap<String, f64>,
}

impl MassTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mass of `species`, replacing any previous entry.
    pub fn insert(&mut self, species: impl Into<String>, mass: f64) {
        self.masses.insert(species.into(), mass);
    }

    /// Looks up the mass of `species`.
    pub fn get(&self, species: &str) -> Option<f64> {
        self.masses.get(species).copied()
    }

    /// Number of species in the table.
    pub fn len(&self) -> usize {
        self.masses.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    /// Masses of `atoms`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnknownSpecies`] for the first atom whose species
    /// has no entry.
    pub fn masses_for(&self, atoms: &[Atom]) -> Result<Vec<f64>, GeometryError> {
        atoms
            .iter()
            .map(|atom| {
                self.get(&atom.species)
                    .ok_or_else(|| GeometryError::UnknownSpecies(atom.species.clone()))
            })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for MassTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            masses: iter.into_iter().map(|(s, m)| (s.into(), m)).collect(),
        }
    }
}
