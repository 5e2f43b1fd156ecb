//! Plain-text report of a thermochemistry result.

use crate::thermo::ThermoResult;

const RULE: &str = "----------------------------------------------------------------";

/// Formats `result` as a human-readable table.
///
/// The report lists the conditions, the totals (G, H, S, TS, ZPE) and one line per
/// contribution with its partition function, entropy and energy. For molecules the
/// symmetry number and principal moments of inertia are appended.
pub fn format_report(result: &ThermoResult, temperature: f64, pressure: f64) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", RULE));
    out.push_str(" Thermochemistry\n");
    out.push_str(&format!("{}\n", RULE));
    out.push_str(&format!(" Temperature                {:>16.2} K\n", temperature));
    if result.rot.is_some() {
        out.push_str(&format!(" Pressure                   {:>16.3} kPa\n", pressure));
        out.push_str(" Phase                              gas-phase molecule\n");
    } else {
        out.push_str(" Phase                              condensed / adsorbed\n");
    }
    out.push_str(&format!(
        " Vibrational modes          {:>16}\n",
        result.vib.modes
    ));
    if result.discarded_modes > 0 {
        out.push_str(&format!(
            " Discarded modes            {:>16}   (imaginary or negative)\n",
            result.discarded_modes
        ));
    }
    out.push_str(&format!("{}\n", RULE));

    out.push_str(&format!(" G   (Gibbs free energy)    {:>16.6} eV\n", result.gibbs));
    out.push_str(&format!(" H   (enthalpy)             {:>16.6} eV\n", result.enthalpy));
    out.push_str(&format!(" S   (entropy)              {:>16.6e} eV/K\n", result.entropy));
    out.push_str(&format!(
        " TS                         {:>16.6} eV\n",
        temperature * result.entropy
    ));
    out.push_str(&format!(
        " ZPE (zero-point energy)    {:>16.6} eV\n",
        result.zero_point_energy
    ));
    out.push_str(&format!("{}\n", RULE));

    out.push_str(" Contribution          Z                S (eV/K)        E (eV)\n");
    for part in result.contributions() {
        out.push_str(&format!(
            " {:<14} {:>14.6e}  {:>14.6e}  {:>12.6}\n",
            part.name(),
            part.partition_function(),
            part.entropy(),
            part.energy()
        ));
    }

    if let Some(rot) = &result.rot {
        out.push_str(&format!("{}\n", RULE));
        out.push_str(&format!(
            " Symmetry number            {:>16}   ({})\n",
            rot.sigma,
            if rot.linear { "linear" } else { "non-linear" }
        ));
        let [i0, i1, i2] = rot.principal_moments;
        out.push_str(&format!(
            " Principal moments (eV/THz²) {:.4e} {:.4e} {:.4e}\n",
            i0, i1, i2
        ));
    }
    out.push_str(&format!("{}\n", RULE));

    out
}
