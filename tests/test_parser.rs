use num_complex::Complex64;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vaspgibbs::io::{prepare_poscar, write_json, write_poscar};
use vaspgibbs::parser::{read_outcar, read_poscar, read_potcar, ParseError};
use vaspgibbs::report::format_report;
use vaspgibbs::structure::Poscar;
use vaspgibbs::thermo::{compute_thermo, ElectronicState, ThermoInput};

const OUTCAR: &str = r#" vasp.6.3.0 18Jan22 complex
   NELECT =      16.0000    total number of electrons
   NUPDOWN=      -1.0000    fix difference up-down
  energy  without entropy=      -22.90000000  energy(sigma->0) =      -22.91000000
  energy  without entropy=      -22.95000000  energy(sigma->0) =      -22.95664412

 Eigenvectors and eigenvalues of the dynamical matrix
 ----------------------------------------------------


   1 f  =   70.500000 THz   442.96 2PiTHz 2351.63 cm-1   291.56 meV
             X         Y         Z           dx          dy          dz
      4.000000  5.000000  5.000000            0.40        0           0

   2 f  =   40.100000 THz   251.96 2PiTHz 1337.60 cm-1   165.84 meV
             X         Y         Z           dx          dy          dz
      4.000000  5.000000  5.000000            0.60        0           0

   3 f  =   19.000000 THz   119.38 2PiTHz  633.77 cm-1    78.58 meV
             X         Y         Z           dx          dy          dz
      4.000000  5.000000  5.000000            0           0.5         0

   4 f  =   19.000000 THz   119.38 2PiTHz  633.77 cm-1    78.58 meV
             X         Y         Z           dx          dy          dz
      4.000000  5.000000  5.000000            0           0           0.5

   5 f/i=    0.350000 THz     2.20 2PiTHz   11.67 cm-1     1.45 meV
             X         Y         Z           dx          dy          dz
      4.000000  5.000000  5.000000            0.1         0           0

 Eigenvectors after division by SQRT(mass)
 ----------------------------------------------------

   1 f  =   99.000000 THz   622.04 2PiTHz 3302.29 cm-1   409.43 meV
"#;

const POTCAR: &str = r#"  PAW_PBE C 08Apr2002
   VRHFIN =C: s2p2
   POMASS =   12.011; ZVAL   =    4.000    mass and valenz
  End of Dataset
  PAW_PBE O 08Apr2002
   VRHFIN =O: s2p4
   POMASS =   16.000; ZVAL   =    6.000    mass and valenz
  End of Dataset
"#;

const POSCAR: &str = r#"CO2 in a box
   1.0
    10.0000000000    0.0000000000    0.0000000000
     0.0000000000   10.0000000000    0.0000000000
     0.0000000000    0.0000000000   10.0000000000
   O    C    O
   1    1    1
Cartesian
     3.8400000000    5.0000000000    5.0000000000
     5.0000000000    5.0000000000    5.0000000000
     6.1600000000    5.0000000000    5.0000000000
"#;

fn write_run(dir: &Path) {
    fs::write(dir.join("OUTCAR"), OUTCAR).unwrap();
    fs::write(dir.join("POTCAR"), POTCAR).unwrap();
    fs::write(dir.join("POSCAR"), POSCAR).unwrap();
}

#[test]
fn test_read_outcar_file() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path());

    let outcar = read_outcar(&dir.path().join("OUTCAR")).unwrap();
    assert_eq!(outcar.electron_count, 16);
    assert_eq!(outcar.fixed_spin, None);
    assert!((outcar.dft_energy + 22.95664412).abs() < 1e-12);
    assert_eq!(outcar.frequencies.len(), 5);
    assert_eq!(outcar.frequencies[0], Complex64::new(70.5, 0.0));
    assert_eq!(outcar.frequencies[4], Complex64::new(0.0, 0.35));
}

#[test]
fn test_read_potcar_and_poscar_files() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path());

    let masses = read_potcar(&dir.path().join("POTCAR")).unwrap();
    assert_eq!(masses.get("C"), Some(12.011));
    assert_eq!(masses.get("O"), Some(16.0));

    let poscar = read_poscar(&dir.path().join("POSCAR")).unwrap();
    assert_eq!(poscar.comment, "CO2 in a box");
    let species: Vec<&str> = poscar.atoms.iter().map(|a| a.species.as_str()).collect();
    assert_eq!(species, vec!["O", "C", "O"]);
    assert!((poscar.atoms[2].position.x - 0.616).abs() < 1e-12);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = read_outcar(&dir.path().join("OUTCAR"));
    assert!(matches!(result, Err(ParseError::Io(_))));
}

#[test]
fn test_end_to_end_carbon_dioxide() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path());

    let outcar = read_outcar(&dir.path().join("OUTCAR")).unwrap();
    let masses = read_potcar(&dir.path().join("POTCAR")).unwrap();
    let poscar = read_poscar(&dir.path().join("POSCAR")).unwrap();

    let input = ThermoInput {
        temperature: 298.15,
        pressure: 101.325,
        spectrum: &outcar.frequencies,
        dft_energy: outcar.dft_energy,
        cell: &poscar.cell,
        atoms: &poscar.atoms,
        masses: &masses,
        electronic: ElectronicState::new(outcar.electron_count, outcar.fixed_spin),
        is_molecule: true,
    };
    let result = compute_thermo(&input).unwrap();

    assert_eq!(result.discarded_modes, 1);
    let rot = result.rot.unwrap();
    assert_eq!(rot.sigma, 2);
    assert!(rot.linear);
    // ZPE = h/2 * (70.5 + 40.1 + 19 + 19) THz
    assert!((result.zero_point_energy - 0.5 * 0.004_135_667_696_923_859 * 148.6).abs() < 1e-12);
    assert!(result.gibbs < result.enthalpy);

    let json_path = dir.path().join("result.json");
    write_json(&result, &json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["rot"]["sigma"], 2);
    assert_eq!(value["discarded_modes"], 1);

    let text = format_report(&result, 298.15, 101.325);
    assert!(text.contains("(linear)"));
}

#[test]
fn test_prepare_writes_selective_dynamics() {
    let dir = TempDir::new().unwrap();
    write_run(dir.path());

    let poscar = read_poscar(&dir.path().join("POSCAR")).unwrap();
    let atoms = prepare_poscar(&poscar.cell, &poscar.atoms, &[1], 0, 0.1).unwrap();
    let out = dir.path().join("POSCAR_vg");
    write_poscar(
        &Poscar {
            comment: poscar.comment.clone(),
            cell: poscar.cell.clone(),
            atoms,
        },
        &out,
    )
    .unwrap();

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.contains("Selective dynamics"));
    let reread = read_poscar(&out).unwrap();
    let flags: Vec<_> = reread.atoms.iter().map(|a| a.selective).collect();
    assert_eq!(flags, vec![Some([false; 3]), Some([true; 3]), Some([false; 3])]);
}
