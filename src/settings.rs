//! Configuration management for vaspgibbs.
//!
//! Default conditions and numerical tolerances can be customized through
//! INI-format configuration files. Files are applied in the following order, each
//! overriding the values set by the previous one:
//!
//! 1. Built-in defaults
//! 2. System configuration (`/etc/vaspgibbs/vaspgibbs.cfg`)
//! 3. User configuration (`~/.config/vaspgibbs/vaspgibbs.cfg`)
//! 4. Local configuration (`./vaspgibbs.cfg`)
//!
//! Command-line options override all of them.
//!
//! # Configuration File Format
//!
//! ```ini
//! [conditions]
//! temperature = 298.15
//! pressure = 101.325
//! molecule = false
//!
//! [tolerances]
//! symmetry = 0.001
//! inertia = 0.00001
//!
//! [logging]
//! level = info
//! ```

use crate::constants::Tolerances;
use configparser::ini::Ini;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file searched in every location.
pub const CONFIG_FILE_NAME: &str = "vaspgibbs.cfg";

/// Errors that can occur during configuration loading and processing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error when reading configuration files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// INI parsing error
    #[error("INI parsing error: {0}")]
    IniParse(String),
    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Main configuration structure containing all program settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Default thermodynamic conditions
    pub conditions: ConditionSettings,
    /// Symmetry-detection tolerances
    pub tolerances: Tolerances,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Default thermodynamic conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSettings {
    /// Temperature in K (default: 298.15)
    pub temperature: f64,
    /// Pressure in kPa (default: 101.325)
    pub pressure: f64,
    /// Treat the system as a gas-phase molecule (default: false)
    pub molecule: bool,
}

impl Default for ConditionSettings {
    fn default() -> Self {
        Self {
            temperature: 298.15,
            pressure: 101.325,
            molecule: false,
        }
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: error, warn, info, debug or trace (default: "info")
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Log level as a `log` filter, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

type Section = HashMap<String, Option<String>>;

fn parse_value<T: std::str::FromStr>(section: &Section, key: &str) -> Result<Option<T>, ConfigError> {
    match section.get(key) {
        Some(Some(raw)) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(format!("Invalid {}: {}", key, raw))),
        _ => Ok(None),
    }
}

fn parse_positive(section: &Section, key: &str) -> Result<Option<f64>, ConfigError> {
    match parse_value::<f64>(section, key)? {
        Some(v) if !(v > 0.0 && v.is_finite()) => Err(ConfigError::InvalidValue(format!(
            "{} must be positive, got {}",
            key, v
        ))),
        other => Ok(other),
    }
}

impl Settings {
    /// Applies the contents of an INI document on top of these settings.
    ///
    /// Keys absent from the document keep their current value.
    pub fn apply_ini(&mut self, content: &str) -> Result<(), ConfigError> {
        let mut ini = Ini::new();
        ini.read(content.to_string())
            .map_err(|e| ConfigError::IniParse(format!("Failed to parse INI: {}", e)))?;
        let map = ini.get_map_ref();

        if let Some(section) = map.get("conditions") {
            if let Some(t) = parse_positive(section, "temperature")? {
                self.conditions.temperature = t;
            }
            if let Some(p) = parse_positive(section, "pressure")? {
                self.conditions.pressure = p;
            }
            if let Some(m) = parse_value(section, "molecule")? {
                self.conditions.molecule = m;
            }
        }

        if let Some(section) = map.get("tolerances") {
            if let Some(s) = parse_positive(section, "symmetry")? {
                self.tolerances.symmetry = s;
            }
            if let Some(i) = parse_positive(section, "inertia")? {
                self.tolerances.inertia = i;
            }
        }

        if let Some(section) = map.get("logging") {
            if let Some(Some(level)) = section.get("level") {
                if level.parse::<log::LevelFilter>().is_err() {
                    return Err(ConfigError::InvalidValue(format!("Invalid level: {}", level)));
                }
                self.logging.level = level.to_lowercase();
            }
        }

        Ok(())
    }
}

/// Configuration manager that handles loading and accessing program settings.
pub struct SettingsManager {
    settings: Settings,
    config_source: String,
}

impl SettingsManager {
    /// Loads configuration from the standard locations.
    ///
    /// Files that exist but fail to parse are reported with a warning and skipped.
    pub fn load() -> Result<Self, ConfigError> {
        let mut paths = Vec::new();
        paths.extend(Self::get_system_config_path());
        paths.extend(Self::get_user_config_path());
        paths.push(PathBuf::from(CONFIG_FILE_NAME));
        let manager = Self::load_from_paths(&paths);
        info!("Configuration loaded from: {}", manager.config_source);
        Ok(manager)
    }

    /// Loads configuration from explicit paths, later paths taking precedence.
    pub fn load_from_paths(paths: &[PathBuf]) -> Self {
        let mut settings = Settings::default();
        let mut config_source = "built-in defaults".to_string();

        for path in paths.iter().filter(|p| p.exists()) {
            let mut candidate = settings.clone();
            match Self::load_config(path, &mut candidate) {
                Ok(()) => {
                    settings = candidate;
                    config_source = path.display().to_string();
                    debug!("Loaded configuration from: {}", path.display());
                }
                Err(e) => {
                    warn!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }

        Self {
            settings,
            config_source,
        }
    }

    /// Returns the source of the loaded configuration.
    pub fn config_source(&self) -> &str {
        &self.config_source
    }

    /// Gets a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn load_config(path: &Path, settings: &mut Settings) -> Result<(), ConfigError> {
        let content = fs::read_to_string(path)?;
        settings.apply_ini(&content)
    }

    fn get_system_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            Some(PathBuf::from("/etc/vaspgibbs").join(CONFIG_FILE_NAME))
        }
        #[cfg(windows)]
        {
            std::env::var("PROGRAMDATA")
                .ok()
                .map(|pd| PathBuf::from(pd).join("vaspgibbs").join(CONFIG_FILE_NAME))
        }
    }

    fn get_user_config_path() -> Option<PathBuf> {
        #[cfg(unix)]
        {
            std::env::var("HOME").ok().map(|home| {
                PathBuf::from(home)
                    .join(".config")
                    .join("vaspgibbs")
                    .join(CONFIG_FILE_NAME)
            })
        }
        #[cfg(windows)]
        {
            std::env::var("APPDATA")
                .ok()
                .map(|appdata| PathBuf::from(appdata).join("vaspgibbs").join(CONFIG_FILE_NAME))
        }
    }

    /// Writes a commented configuration template with the built-in defaults.
    pub fn create_template(path: &Path) -> Result<(), ConfigError> {
        fs::write(path, Self::generate_template_content())?;
        info!("Created settings template at: {}", path.display());
        Ok(())
    }

    fn generate_template_content() -> String {
        let defaults = Settings::default();
        format!(
            r#"# vaspgibbs configuration file
#
# Files are read in this order, later files overriding earlier ones:
#   /etc/vaspgibbs/vaspgibbs.cfg
#   ~/.config/vaspgibbs/vaspgibbs.cfg
#   ./vaspgibbs.cfg
# Command-line options override every file.

[conditions]
# Temperature in K
temperature = {}

# Pressure in kPa (gas-phase molecules only)
pressure = {}

# Treat the structure as a gas-phase molecule (adds rotation and translation)
molecule = {}

[tolerances]
# Distance (Angstrom) within which a rotated atom matches an original one
symmetry = {}

# Relative tolerance for vanishing or degenerate moments of inertia
inertia = {}

[logging]
# error, warn, info, debug or trace
level = {}
"#,
            defaults.conditions.temperature,
            defaults.conditions.pressure,
            defaults.conditions.molecule,
            defaults.tolerances.symmetry,
            defaults.tolerances.inertia,
            defaults.logging.level,
        )
    }
}
