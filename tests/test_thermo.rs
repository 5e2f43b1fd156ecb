use nalgebra::Vector3;
use num_complex::Complex64;
use std::f64::consts::PI;
use vaspgibbs::constants::{PhysicalConstants, Tolerances};
use vaspgibbs::geometry::{
    center_of_mass, inertia_tensor, principal_moments, rigid_equal, rotate_molecule,
};
use vaspgibbs::structure::{Atom, Cell, MassTable};
use vaspgibbs::symmetry::symmetry_number;
use vaspgibbs::thermo::{
    compute_thermo, ElectronicState, Rot, ThermoInput, Trans, Vib,
};

const BOX: f64 = 10.0;

fn masses() -> MassTable {
    [("H", 1.008), ("C", 12.011), ("N", 14.007), ("O", 15.999)]
        .into_iter()
        .collect()
}

/// Builds atoms from Cartesian offsets (Å) around the centre of a cubic box.
fn molecule(cell: &Cell, sites: &[(&str, [f64; 3])]) -> Vec<Atom> {
    let centre = Vector3::repeat(BOX / 2.0);
    sites
        .iter()
        .map(|(species, offset)| {
            let cart = centre + Vector3::from(*offset);
            Atom::new(*species, cell.to_fractional(&cart).into())
        })
        .collect()
}

fn ammonia(cell: &Cell) -> Vec<Atom> {
    let r = 0.94;
    let mut sites = vec![("N", [0.0, 0.0, 0.38])];
    for k in 0..3 {
        let phi = 2.0 * PI * k as f64 / 3.0;
        sites.push(("H", [r * phi.cos(), r * phi.sin(), 0.0]));
    }
    molecule(cell, &sites)
}

fn asymmetric(cell: &Cell) -> Vec<Atom> {
    molecule(
        cell,
        &[
            ("C", [0.0, 0.0, 0.0]),
            ("N", [1.2, 0.1, 0.0]),
            ("O", [-0.4, 1.3, 0.2]),
            ("H", [0.3, -0.9, 0.7]),
        ],
    )
}

fn water(cell: &Cell) -> Vec<Atom> {
    molecule(
        cell,
        &[
            ("O", [0.0, 0.0, 0.0]),
            ("H", [0.757, 0.586, 0.0]),
            ("H", [-0.757, 0.586, 0.0]),
        ],
    )
}

fn carbon_dioxide(cell: &Cell) -> Vec<Atom> {
    molecule(
        cell,
        &[
            ("O", [-1.16, 0.0, 0.0]),
            ("C", [0.0, 0.0, 0.0]),
            ("O", [1.16, 0.0, 0.0]),
        ],
    )
}

fn sigma(cell: &Cell, atoms: &[Atom]) -> u32 {
    let m = masses().masses_for(atoms).unwrap();
    let inertia = inertia_tensor(cell, atoms, &m, &PhysicalConstants::VASP).unwrap();
    let principal = principal_moments(&inertia);
    symmetry_number(cell, atoms, &m, &principal, &Tolerances::default()).unwrap()
}

#[test]
fn test_single_atom_has_no_rotation() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = molecule(&cell, &[("O", [0.0; 3])]);
    let rot = Rot::new(
        300.0,
        &cell,
        &atoms,
        &masses(),
        &PhysicalConstants::VASP,
        &Tolerances::default(),
    )
    .unwrap();
    assert_eq!((rot.z, rot.s, rot.e), (1.0, 0.0, 0.0));
}

#[test]
fn test_rigid_equal_is_reflexive() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = asymmetric(&cell);
    assert!(rigid_equal(&cell, &atoms, &atoms, 1e-9));
}

#[test]
fn test_full_turn_is_identity() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = asymmetric(&cell);
    let m = masses().masses_for(&atoms).unwrap();
    let cm = center_of_mass(&cell, &atoms, &m).unwrap();
    let axis = Vector3::new(0.3, -1.0, 0.5);

    let turned = rotate_molecule(&cell, &atoms, &cm, &axis, 2.0 * PI).unwrap();
    assert!(rigid_equal(&cell, &atoms, &turned, 1e-6));
}

#[test]
fn test_rotation_is_undone_by_opposite_angle() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = asymmetric(&cell);
    let m = masses().masses_for(&atoms).unwrap();
    let cm = center_of_mass(&cell, &atoms, &m).unwrap();
    let axis = Vector3::new(1.0, 2.0, 3.0);

    let there = rotate_molecule(&cell, &atoms, &cm, &axis, 0.7).unwrap();
    assert!(!rigid_equal(&cell, &atoms, &there, 1e-3));
    let back = rotate_molecule(&cell, &there, &cm, &axis, -0.7).unwrap();
    for (a, b) in atoms.iter().zip(&back) {
        assert!((a.position - b.position).norm() < 1e-12);
    }
}

#[test]
fn test_asymmetric_molecule_has_sigma_one() {
    let cell = Cell::cubic(BOX).unwrap();
    assert_eq!(sigma(&cell, &asymmetric(&cell)), 1);
}

#[test]
fn test_ammonia_has_sigma_three() {
    let cell = Cell::cubic(BOX).unwrap();
    assert_eq!(sigma(&cell, &ammonia(&cell)), 3);
}

#[test]
fn test_carbon_dioxide_is_linear_with_sigma_two() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = carbon_dioxide(&cell);
    let c = PhysicalConstants::VASP;
    let rot = Rot::new(298.15, &cell, &atoms, &masses(), &c, &Tolerances::default()).unwrap();

    assert_eq!(rot.sigma, 2);
    assert!(rot.linear);
    assert!((rot.e - c.thermal_energy(298.15)).abs() < 1e-15);

    // Z = 8π²kT·I₂ / (σh²)
    let m = masses().masses_for(&atoms).unwrap();
    let inertia = inertia_tensor(&cell, &atoms, &m, &c).unwrap();
    let i2 = principal_moments(&inertia).moments[2];
    let expected = 8.0 * PI.powi(2) * c.thermal_energy(298.15) * i2 / (2.0 * c.planck.powi(2));
    assert!((rot.z - expected).abs() / expected < 1e-12, "Z = {}", rot.z);
    assert!((rot.z - 264.6).abs() < 1.0);
    let s = c.boltzmann * expected.ln() + c.boltzmann;
    assert!((rot.s - s).abs() < 1e-15);
}

#[test]
fn test_water_rotational_partition_function() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = water(&cell);
    let c = PhysicalConstants::VASP;
    let t = 298.15;
    let rot = Rot::new(t, &cell, &atoms, &masses(), &c, &Tolerances::default()).unwrap();

    assert_eq!(rot.sigma, 2);
    assert!(!rot.linear);

    // Z = (8π²kT/h²)^{3/2} · √(π det I) / σ
    let m = masses().masses_for(&atoms).unwrap();
    let det = inertia_tensor(&cell, &atoms, &m, &c).unwrap().determinant();
    let kt = c.thermal_energy(t);
    let expected = (8.0 * PI.powi(2) * kt / c.planck.powi(2)).powf(1.5) * (PI * det).sqrt() / 2.0;
    assert!((rot.z - expected).abs() / expected < 1e-12, "Z = {}", rot.z);
    assert!((rot.e - 1.5 * kt).abs() < 1e-15);
    assert!((rot.s - (c.boltzmann * expected.ln() + 1.5 * c.boltzmann)).abs() < 1e-15);
}

#[test]
fn test_ammonia_is_non_linear() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = ammonia(&cell);
    let c = PhysicalConstants::VASP;
    let rot = Rot::new(298.15, &cell, &atoms, &masses(), &c, &Tolerances::default()).unwrap();

    assert!(!rot.linear);
    assert!((rot.e - 1.5 * c.thermal_energy(298.15)).abs() < 1e-15);
}

#[test]
fn test_translation_scaling() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = carbon_dioxide(&cell);
    let c = PhysicalConstants::VASP;
    let m = masses();

    let base = Trans::new(300.0, 100.0, &atoms, &m, &c).unwrap();
    let hot = Trans::new(600.0, 100.0, &atoms, &m, &c).unwrap();
    let dense = Trans::new(300.0, 200.0, &atoms, &m, &c).unwrap();

    assert!((hot.z / base.z - 2f64.powf(2.5)).abs() < 1e-9);
    assert!((dense.z / base.z - 0.5).abs() < 1e-12);
}

#[test]
fn test_nitrogen_translational_entropy() {
    // Sackur-Tetrode: S_trans(N2, 298.15 K, 1 atm) = 150.4 J/(mol K)
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = molecule(&cell, &[("N", [0.0, 0.0, -0.55]), ("N", [0.0, 0.0, 0.55])]);
    let c = PhysicalConstants::VASP;
    let trans = Trans::new(298.15, 101.325, &atoms, &masses(), &c).unwrap();

    let total = trans.s + c.boltzmann;
    assert!((total - 1.5588e-3).abs() / 1.5588e-3 < 0.01, "S = {}", total);
}

#[test]
fn test_vibrational_entropy_grows_with_temperature() {
    let c = PhysicalConstants::VASP;
    let freq = [3.5, 12.0, 45.0, 90.0];
    let mut previous = 0.0;
    for t in [50.0, 100.0, 200.0, 400.0, 800.0] {
        let vib = Vib::new(t, &freq, &c).unwrap();
        assert!(vib.s > previous);
        previous = vib.s;
    }
}

#[test]
fn test_gibbs_identity_for_molecule() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = ammonia(&cell);
    let m = masses();
    let spectrum = [
        Complex64::new(101.0, 0.0),
        Complex64::new(101.0, 0.0),
        Complex64::new(100.0, 0.0),
        Complex64::new(49.0, 0.0),
        Complex64::new(49.0, 0.0),
        Complex64::new(31.0, 0.0),
        Complex64::new(0.0, 1.2),
    ];
    let input = ThermoInput {
        temperature: 400.0,
        pressure: 50.0,
        spectrum: &spectrum,
        dft_energy: -19.5,
        cell: &cell,
        atoms: &atoms,
        masses: &m,
        electronic: ElectronicState::new(8, None),
        is_molecule: true,
    };

    let result = compute_thermo(&input).unwrap();
    assert_eq!(result.gibbs, result.enthalpy - 400.0 * result.entropy);
    assert_eq!(result.discarded_modes, 1);
    assert_eq!(result.vib.modes, 6);
    assert_eq!(result.rot.map(|r| r.sigma), Some(3));
    assert!(result.trans.is_some());

    let condensed = compute_thermo(&ThermoInput {
        is_molecule: false,
        ..input
    })
    .unwrap();
    assert!(condensed.rot.is_none());
    assert!(condensed.entropy < result.entropy);
}

#[test]
fn test_enthalpy_and_entropy_assembly() {
    let cell = Cell::cubic(BOX).unwrap();
    let atoms = water(&cell);
    let m = masses();
    let c = PhysicalConstants::VASP;
    let t = 298.15;
    let spectrum = [
        Complex64::new(113.8, 0.0),
        Complex64::new(110.2, 0.0),
        Complex64::new(47.8, 0.0),
        Complex64::new(-0.4, 0.0),
        Complex64::new(0.0, 0.9),
    ];
    let input = ThermoInput {
        temperature: t,
        pressure: 101.325,
        spectrum: &spectrum,
        dft_energy: -14.22,
        cell: &cell,
        atoms: &atoms,
        masses: &m,
        electronic: ElectronicState::new(8, None),
        is_molecule: true,
    };

    let gas = compute_thermo(&input).unwrap();
    let zpe = 0.5 * c.planck * (113.8 + 110.2 + 47.8);
    assert!((gas.zero_point_energy - zpe).abs() < 1e-12);
    assert_eq!(gas.discarded_modes, 2);

    let rot = gas.rot.unwrap();
    let trans = gas.trans.unwrap();
    let h_rest = gas.enthalpy - input.dft_energy - gas.zero_point_energy - gas.elec.e
        - gas.vib.e
        - rot.e
        - trans.e;
    assert!((h_rest - c.thermal_energy(t)).abs() < 1e-12, "H remainder = {}", h_rest);
    let s_rest = gas.entropy - gas.elec.s - gas.vib.s - rot.s - trans.s;
    assert!((s_rest - c.boltzmann).abs() < 1e-15, "S remainder = {}", s_rest);

    // standard molar entropy of water vapour is about 188.8 J/(mol K)
    let molar = gas.entropy * 96_485.332;
    assert!((molar - 188.8).abs() < 2.0, "S = {} J/(mol K)", molar);

    let condensed = compute_thermo(&ThermoInput {
        is_molecule: false,
        ..input
    })
    .unwrap();
    let h_rest = condensed.enthalpy
        - input.dft_energy
        - condensed.zero_point_energy
        - condensed.elec.e
        - condensed.vib.e;
    assert!(h_rest.abs() < 1e-12, "H remainder = {}", h_rest);
    let s_rest = condensed.entropy - condensed.elec.s - condensed.vib.s;
    assert!((s_rest - c.boltzmann).abs() < 1e-15, "S remainder = {}", s_rest);
    assert_eq!(condensed.gibbs, condensed.enthalpy - t * condensed.entropy);
}
