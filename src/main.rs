//! vasp-gibbs command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Gibbs free energy of an adsorbate at 500 K from ./OUTCAR, ./POTCAR, ./POSCAR
//! vasp-gibbs -t 500
//!
//! # Gas-phase molecule in run1/, results also written as JSON
//! vasp-gibbs -m -p 10 --json co2.json run1
//!
//! # Selective dynamics for the two top layers plus atoms 1 and 5-7
//! vasp-gibbs prepare --top 2 --atoms 1,5-7 slab
//!
//! # Write ./vaspgibbs.cfg with the built-in defaults
//! vasp-gibbs init-config
//! ```

use log::{debug, info};
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use vaspgibbs::cli::{self, Command};
use vaspgibbs::settings::{Settings, SettingsManager, CONFIG_FILE_NAME};
use vaspgibbs::structure::Poscar;
use vaspgibbs::thermo::{ElectronicState, ThermoCalculator, ThermoInput};
use vaspgibbs::{io, parser, report};

fn main() {
    let manager = match SettingsManager::load() {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };
    let settings = manager.settings().clone();

    env_logger::Builder::from_default_env()
        .filter_level(settings.logging.level_filter())
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();
    debug!("Configuration loaded from: {}", manager.config_source());

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("vasp-gibbs");

    let command = match cli::parse_args(args.get(1..).unwrap_or_default(), &settings) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", cli::usage(program));
            process::exit(1);
        }
    };

    let outcome = match command {
        Command::Help => {
            println!("{}", cli::usage(program));
            Ok(())
        }
        Command::InitConfig => run_init_config(),
        Command::Prepare {
            top,
            atoms,
            tol,
            output,
            dir,
        } => run_prepare(&dir, &atoms, top, tol, output),
        Command::Compute {
            temperature,
            pressure,
            molecule,
            json,
            dir,
        } => run_compute(&settings, &dir, temperature, pressure, molecule, json.as_deref()),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_init_config() -> Result<(), Box<dyn Error>> {
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(format!("{} already exists; remove it first", CONFIG_FILE_NAME).into());
    }
    SettingsManager::create_template(path)?;
    println!("✓ Settings template created: {}", path.display());
    Ok(())
}

fn run_prepare(
    dir: &Path,
    moving: &[usize],
    top: usize,
    tol: f64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let poscar = parser::read_poscar(&dir.join("POSCAR"))?;
    let atoms = io::prepare_poscar(&poscar.cell, &poscar.atoms, moving, top, tol)?;
    let free = atoms
        .iter()
        .filter(|a| a.selective == Some([true; 3]))
        .count();

    let prepared = Poscar {
        comment: poscar.comment,
        cell: poscar.cell,
        atoms,
    };
    let output = output.unwrap_or_else(|| dir.join("POSCAR_vg"));
    io::write_poscar(&prepared, &output)?;

    println!(
        "✓ {} of {} atoms free to move, written to {}",
        free,
        prepared.atoms.len(),
        output.display()
    );
    Ok(())
}

fn run_compute(
    settings: &Settings,
    dir: &Path,
    temperature: f64,
    pressure: f64,
    molecule: bool,
    json: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    info!("Reading VASP output from {}", dir.display());
    let outcar = parser::read_outcar(&dir.join("OUTCAR"))?;
    let masses = parser::read_potcar(&dir.join("POTCAR"))?;
    let poscar = parser::read_poscar(&dir.join("POSCAR"))?;
    info!(
        "{} atoms, {} species, {} frequencies",
        poscar.atoms.len(),
        masses.len(),
        outcar.frequencies.len()
    );

    let input = ThermoInput {
        temperature,
        pressure,
        spectrum: &outcar.frequencies,
        dft_energy: outcar.dft_energy,
        cell: &poscar.cell,
        atoms: &poscar.atoms,
        masses: &masses,
        electronic: ElectronicState::new(outcar.electron_count, outcar.fixed_spin),
        is_molecule: molecule,
    };

    let calculator = ThermoCalculator {
        tolerances: settings.tolerances,
        ..ThermoCalculator::default()
    };
    let result = calculator.compute(&input)?;

    println!("{}", report::format_report(&result, temperature, pressure));
    if let Some(path) = json {
        io::write_json(&result, path)?;
    }
    Ok(())
}
