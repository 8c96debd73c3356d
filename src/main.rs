use std::env;

use anyhow::{Context, Result};
use serde::Serialize;

use alert_aeff::flux::fluence_norm_unit;
use alert_aeff::units::{PEV, TEV, YR};
use alert_aeff::{
    divide_by_time, energy_squared_flux, power_law_threshold_flux, IntoDeclination, PowerLawQuery,
};

/// Summary of one smoke run, printed as JSON with `--json`.
#[derive(Debug, Serialize)]
struct SmokeReport {
    declination_deg: f64,
    selection: &'static str,
    purity: &'static str,
    spectral_index: f64,
    e_min_gev: f64,
    e_max_gev: f64,
    norm_energy_tev: f64,
    threshold_per_gev_cm2: f64,
    integration_time_yr: f64,
    e2dnde_at_tev: f64,
    e2dnde_erg_cm2_s: f64,
}

fn main() -> Result<()> {
    env_logger::init();

    let mut json = false;
    let mut declination = String::from("10");
    for arg in env::args().skip(1) {
        if arg == "--json" {
            json = true;
        } else {
            declination = arg;
        }
    }
    let declination_deg = declination
        .as_str()
        .into_degrees()
        .context("parsing declination argument")?;

    let query = PowerLawQuery {
        norm_energy: 1.0 * PEV,
        ..Default::default()
    };
    let threshold = power_law_threshold_flux(declination_deg, &query)
        .with_context(|| format!("computing threshold flux at declination {declination_deg} deg"))?;

    let period = 0.5 * YR;
    let flux = divide_by_time(threshold, period).context("dividing by integration time")?;

    let e2_energy = 100.0 * TEV;
    let e2dnde = energy_squared_flux(flux, e2_energy).context("computing E^2dN/dE")?;

    let report = SmokeReport {
        declination_deg,
        selection: query.selection.name(),
        purity: query.purity.name(),
        spectral_index: query.spectral_index,
        e_min_gev: query.e_min_gev,
        e_max_gev: query.e_max_gev,
        norm_energy_tev: query.norm_energy.to(TEV)?,
        threshold_per_gev_cm2: threshold.to(fluence_norm_unit())?,
        integration_time_yr: period.to(YR)?,
        e2dnde_at_tev: e2_energy.to(TEV)?,
        e2dnde_erg_cm2_s: e2dnde.value,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "dec {:.1} deg, {} ({}): threshold {:.3e} GeV^-1 cm^-2 at {} TeV",
            report.declination_deg,
            report.selection,
            report.purity,
            report.threshold_per_gev_cm2,
            report.norm_energy_tev
        );
        println!(
            "over {} yr: E^2dN/dE = {e2dnde:.3} at {} TeV",
            report.integration_time_yr, report.e2dnde_at_tev
        );
    }
    Ok(())
}
