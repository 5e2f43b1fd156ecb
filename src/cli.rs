//! Command-line argument handling for the `vasp-gibbs` binary.
//!
//! ```text
//! vasp-gibbs [-t K] [-p kPa] [-m] [--json FILE] [DIR]
//! vasp-gibbs prepare [--top N] [--atoms 1,2,5-7] [--tol Å] [-o FILE] [DIR]
//! vasp-gibbs init-config
//! vasp-gibbs --help
//! ```
//!
//! Flags that are not given fall back to the loaded [`Settings`].

use crate::settings::Settings;
use std::path::PathBuf;
use thiserror::Error;

/// Default layer tolerance for `prepare --top`, in Angstrom.
pub const DEFAULT_LAYER_TOLERANCE: f64 = 0.1;

/// Errors produced while parsing the command line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CliError {
    /// A flag expects a value but none followed it
    #[error("Missing value for {0}")]
    MissingValue(String),
    /// A flag value could not be parsed
    #[error("Invalid value for {flag}: {value}")]
    InvalidValue {
        /// The flag
        flag: String,
        /// The rejected value
        value: String,
    },
    /// Flag not recognised
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    /// More than one directory argument
    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}

/// A parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Compute G, H and S from the VASP files in `dir`
    Compute {
        /// Temperature in K
        temperature: f64,
        /// Pressure in kPa
        pressure: f64,
        /// Treat the structure as a gas-phase molecule
        molecule: bool,
        /// Optional JSON output file
        json: Option<PathBuf>,
        /// Directory holding OUTCAR, POTCAR and POSCAR
        dir: PathBuf,
    },
    /// Write a POSCAR with selective-dynamics flags for a frequency run
    Prepare {
        /// Number of top layers allowed to move
        top: usize,
        /// 0-based indices of atoms allowed to move
        atoms: Vec<usize>,
        /// Layer grouping tolerance in Angstrom
        tol: f64,
        /// Output file (default `DIR/POSCAR_vg`)
        output: Option<PathBuf>,
        /// Directory holding the source POSCAR
        dir: PathBuf,
    },
    /// Write a configuration template to `./vaspgibbs.cfg`
    InitConfig,
    /// Print usage
    Help,
}

fn take_value<'a, I: Iterator<Item = &'a String>>(
    iter: &mut I,
    flag: &str,
) -> Result<&'a str, CliError> {
    iter.next()
        .map(String::as_str)
        .ok_or_else(|| CliError::MissingValue(flag.to_string()))
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

fn parse_positive(flag: &str, value: &str) -> Result<f64, CliError> {
    let v: f64 = parse_number(flag, value)?;
    if v > 0.0 && v.is_finite() {
        Ok(v)
    } else {
        Err(CliError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
    }
}

/// Parses a 1-based atom list such as `1,2,5-7` into sorted, unique 0-based indices.
///
/// # Examples
///
/// ```
/// use vaspgibbs::cli::parse_atom_list;
///
/// assert_eq!(parse_atom_list("3,1,5-7").unwrap(), vec![0, 2, 4, 5, 6]);
/// assert!(parse_atom_list("0").is_err());
/// ```
pub fn parse_atom_list(list: &str) -> Result<Vec<usize>, CliError> {
    let invalid = || CliError::InvalidValue {
        flag: "--atoms".to_string(),
        value: list.to_string(),
    };

    let mut indices = Vec::new();
    for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (first, last) = match item.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (item, item),
        };
        let first: usize = first.parse().map_err(|_| invalid())?;
        let last: usize = last.parse().map_err(|_| invalid())?;
        if first == 0 || last < first {
            return Err(invalid());
        }
        indices.extend((first - 1)..last);
    }
    if indices.is_empty() {
        return Err(invalid());
    }

    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

/// Parses the arguments following the program name.
pub fn parse_args(args: &[String], settings: &Settings) -> Result<Command, CliError> {
    match args.first().map(String::as_str) {
        Some("-h") | Some("--help") | Some("help") => Ok(Command::Help),
        Some("init-config") => match args.get(1) {
            None => Ok(Command::InitConfig),
            Some(extra) => Err(CliError::UnexpectedArgument(extra.clone())),
        },
        Some("prepare") => parse_prepare(&args[1..]),
        _ => parse_compute(args, settings),
    }
}

fn set_dir(dir: &mut Option<PathBuf>, arg: &str) -> Result<(), CliError> {
    if arg.starts_with('-') {
        return Err(CliError::UnknownOption(arg.to_string()));
    }
    if dir.is_some() {
        return Err(CliError::UnexpectedArgument(arg.to_string()));
    }
    *dir = Some(PathBuf::from(arg));
    Ok(())
}

fn parse_compute(args: &[String], settings: &Settings) -> Result<Command, CliError> {
    let mut temperature = settings.conditions.temperature;
    let mut pressure = settings.conditions.pressure;
    let mut molecule = settings.conditions.molecule;
    let mut json = None;
    let mut dir = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-t" | "--temperature" => {
                temperature = parse_positive(arg, take_value(&mut iter, arg)?)?;
            }
            "-p" | "--pressure" => {
                pressure = parse_positive(arg, take_value(&mut iter, arg)?)?;
            }
            "-m" | "--molecule" => molecule = true,
            "--json" => json = Some(PathBuf::from(take_value(&mut iter, arg)?)),
            "-h" | "--help" => return Ok(Command::Help),
            other => set_dir(&mut dir, other)?,
        }
    }

    Ok(Command::Compute {
        temperature,
        pressure,
        molecule,
        json,
        dir: dir.unwrap_or_else(|| PathBuf::from(".")),
    })
}

fn parse_prepare(args: &[String]) -> Result<Command, CliError> {
    let mut top = 0;
    let mut atoms = Vec::new();
    let mut tol = DEFAULT_LAYER_TOLERANCE;
    let mut output = None;
    let mut dir = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--top" => top = parse_number(arg, take_value(&mut iter, arg)?)?,
            "--atoms" => atoms = parse_atom_list(take_value(&mut iter, arg)?)?,
            "--tol" => tol = parse_positive(arg, take_value(&mut iter, arg)?)?,
            "-o" | "--output" => output = Some(PathBuf::from(take_value(&mut iter, arg)?)),
            "-h" | "--help" => return Ok(Command::Help),
            other => set_dir(&mut dir, other)?,
        }
    }

    Ok(Command::Prepare {
        top,
        atoms,
        tol,
        output,
        dir: dir.unwrap_or_else(|| PathBuf::from(".")),
    })
}

/// Usage text printed for `--help` and on argument errors.
pub fn usage(program: &str) -> String {
    format!(
        r#"Gibbs free energy from VASP frequency calculations

USAGE:
    {0} [OPTIONS] [DIR]
    {0} prepare [OPTIONS] [DIR]
    {0} init-config
    {0} --help

COMPUTE OPTIONS (reads DIR/OUTCAR, DIR/POTCAR, DIR/POSCAR):
    -t, --temperature K     Temperature in K
    -p, --pressure KPA      Pressure in kPa (molecules only)
    -m, --molecule          Gas-phase molecule: add rotation and translation
        --json FILE         Also write the results as JSON

PREPARE OPTIONS (reads DIR/POSCAR, writes DIR/POSCAR_vg):
        --top N             Let the N highest atomic layers move
        --atoms LIST        Let the listed atoms move (1-based, e.g. 1,2,5-7)
        --tol A             Layer grouping tolerance in Angstrom (default {1})
    -o, --output FILE       Output file

Without --top or --atoms every atom may move.
Defaults for temperature, pressure and molecule come from vaspgibbs.cfg."#,
        program, DEFAULT_LAYER_TOLERANCE
    )
}
