//! Turning a flux-averaged effective area into flux thresholds and event
//! expectations.
//!
//! Threshold fluxes are differential fluxes at a normalisation energy,
//! `GeV^-1 cm^-2` for a time-integrated (fluence) convention. Dividing one
//! by a time period with [`divide_by_time`] gives `GeV^-1 cm^-2 s^-1`, and
//! [`energy_squared_flux`] reports either one in the E²dN/dE convention.

use std::fmt;

use log::{info, warn};

use crate::aeff::integrate::aggregate;
use crate::aeff::loader::TableLoader;
use crate::aeff::model::{DeclinationBucket, IntoDeclination, Purity, Selection};
use crate::error::{AeffError, Result};
use crate::spectrum::{EnergyPdf, PowerLaw};
use crate::units::{Quantity, Unit, CM, ERG, GEV, S};

/// Unit of a time-integrated flux normalisation.
pub fn fluence_norm_unit() -> Unit {
    GEV.powi(-1) * CM.powi(-2)
}

// ---------------------------------------------------------------------------
// SensitivityCalculator – table-backed entry points
// ---------------------------------------------------------------------------

/// Runs the table → integral → threshold chain against one table source.
#[derive(Debug, Clone)]
pub struct SensitivityCalculator {
    loader: TableLoader,
}

impl SensitivityCalculator {
    pub fn new(loader: TableLoader) -> Self {
        Self { loader }
    }

    /// Bundled alert tables, root overridable through `AEFF_TABLE_DIR`.
    pub fn from_env() -> Self {
        Self::new(TableLoader::from_env())
    }

    /// Flux-averaged effective area summed over the selection's streams (GeV cm²).
    pub fn effective_area(
        &self,
        declination_deg: impl IntoDeclination,
        energy_pdf: &dyn EnergyPdf,
        selection: &str,
        purity: &str,
    ) -> Result<Quantity> {
        let selection: Selection = selection.parse()?;
        let purity: Purity = purity.parse()?;
        let declination_deg = declination_deg.into_degrees()?;
        self.effective_area_for(declination_deg, energy_pdf, selection, purity)
    }

    fn effective_area_for(
        &self,
        declination_deg: f64,
        energy_pdf: &dyn EnergyPdf,
        selection: Selection,
        purity: Purity,
    ) -> Result<Quantity> {
        info!(
            "You have selected a source at a declination of {declination_deg:.2} deg \
             ({} bucket), with the {selection} selection and purity {purity}.",
            DeclinationBucket::from_degrees(declination_deg)
        );

        let curves = self.loader.load_selection(declination_deg, selection)?;
        let a_eff = aggregate(&curves, energy_pdf)?;

        info!(
            "Flux-averaged effective area is {a_eff:.2} for each particle emitted between \
             {:.2e} GeV and {:.2e} GeV",
            energy_pdf.e_min(),
            energy_pdf.e_max()
        );
        if a_eff.base_value() == 0.0 {
            warn!("No effective-area bin overlaps the energy PDF; the threshold flux is infinite");
        }
        Ok(a_eff)
    }

    /// Flux normalisation at `norm_energy` for which one event is expected.
    pub fn threshold_flux(
        &self,
        declination_deg: impl IntoDeclination,
        energy_pdf: &dyn EnergyPdf,
        selection: &str,
        purity: &str,
        norm_energy: Quantity,
    ) -> Result<Quantity> {
        let selection: Selection = selection.parse()?;
        let purity: Purity = purity.parse()?;
        let declination_deg = declination_deg.into_degrees()?;
        self.threshold_flux_for(declination_deg, energy_pdf, selection, purity, norm_energy)
    }

    fn threshold_flux_for(
        &self,
        declination_deg: f64,
        energy_pdf: &dyn EnergyPdf,
        selection: Selection,
        purity: Purity,
        norm_energy: Quantity,
    ) -> Result<Quantity> {
        let norm_gev = norm_energy_in_domain(norm_energy, energy_pdf)?;

        let a_eff = self.effective_area_for(declination_deg, energy_pdf, selection, purity)?;
        let threshold = a_eff.recip() * energy_pdf.f(norm_gev);

        info!(
            "For this spectrum, we require a flux of {:.2e} GeV^-1 cm^-2 at {norm_gev:.2e} GeV",
            threshold.to(fluence_norm_unit())?
        );
        energy_squared_flux(threshold, norm_energy)?;

        Ok(threshold)
    }

    /// Normalisation via a 1 GeV reference instead of the PDF shape.
    ///
    /// `(1 GeV)² / A_eff` is the E²dN/dE fluence at 1 GeV; dividing out the
    /// same `(1 GeV)²` gives the per-GeV normalisation returned here.
    pub fn reference_normalization(
        &self,
        declination_deg: impl IntoDeclination,
        energy_pdf: &dyn EnergyPdf,
        selection: &str,
        purity: &str,
    ) -> Result<Quantity> {
        let a_eff = self.effective_area(declination_deg, energy_pdf, selection, purity)?;

        let reference = (1.0 * GEV).powi(2);
        let e2_norm = reference / a_eff;
        let flux_norm = e2_norm / reference;

        info!(
            "At the 1 GeV reference this is E^2dN/dE = {:.2e} GeV cm^-2, \
             i.e. a normalisation of {:.2e} GeV^-1 cm^-2",
            e2_norm.to(GEV / CM.powi(2))?,
            flux_norm.to(fluence_norm_unit())?
        );
        Ok(flux_norm)
    }

    /// Expected number of events for a source of normalisation `flux_norm`.
    ///
    /// `flux_norm` must use the same convention as the threshold, i.e. a
    /// per-GeV fluence at `norm_energy`. Always uses the default purity.
    pub fn expected_events(
        &self,
        flux_norm: Quantity,
        declination_deg: impl IntoDeclination,
        energy_pdf: &dyn EnergyPdf,
        selection: &str,
        norm_energy: Quantity,
    ) -> Result<Quantity> {
        flux_norm.require_unit("flux_norm")?;
        let threshold = self.threshold_flux(
            declination_deg,
            energy_pdf,
            selection,
            Purity::default().name(),
            norm_energy,
        )?;

        if flux_norm.dimension() != threshold.dimension() {
            return Err(AeffError::UnitMismatch {
                expected: threshold.dimension().to_string(),
                found: flux_norm.dimension().to_string(),
            });
        }
        let n_exp = flux_norm / threshold;

        info!(
            "Given a flux of {flux_norm:.2} at {:.2e} GeV, we have an expectation of {n_exp:.2}",
            norm_energy.to(GEV)?
        );
        Ok(n_exp)
    }

    /// Threshold flux for an unbroken power law.
    pub fn power_law_threshold_flux(
        &self,
        declination_deg: impl IntoDeclination,
        query: &PowerLawQuery,
    ) -> Result<Quantity> {
        let declination_deg = declination_deg.into_degrees()?;
        let pdf = PowerLaw::new(query.spectral_index, query.e_min_gev, query.e_max_gev)?;
        info!(
            "Assuming a power law with index {:.2} between {:.2e} GeV and {:.2e} GeV.",
            pdf.gamma(),
            pdf.e_min(),
            pdf.e_max()
        );
        self.threshold_flux_for(
            declination_deg,
            &pdf,
            query.selection,
            query.purity,
            query.norm_energy,
        )
    }
}

impl Default for SensitivityCalculator {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Parameters of [`power_law_threshold_flux`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLawQuery {
    pub spectral_index: f64,
    pub e_min_gev: f64,
    pub e_max_gev: f64,
    pub selection: Selection,
    pub purity: Purity,
    pub norm_energy: Quantity,
}

impl Default for PowerLawQuery {
    fn default() -> Self {
        Self {
            spectral_index: 2.0,
            e_min_gev: 1.0e2,
            e_max_gev: 1.0e7,
            selection: Selection::default(),
            purity: Purity::default(),
            norm_energy: 10.0 * GEV,
        }
    }
}

/// Convert to GeV and require `e_min < E < e_max`.
fn norm_energy_in_domain(norm_energy: Quantity, energy_pdf: &dyn EnergyPdf) -> Result<f64> {
    norm_energy.require_unit("norm_energy")?;
    let norm_gev = norm_energy.to(GEV).map_err(|_| {
        AeffError::InvalidInput(format!(
            "Use a unit of energy for your flux normalisation energy! \
             You provided {norm_energy} as a norm_energy"
        ))
    })?;

    let (e_min, e_max) = (energy_pdf.e_min(), energy_pdf.e_max());
    if !(norm_gev > e_min && norm_gev < e_max) {
        return Err(AeffError::OutOfRange {
            energy_gev: norm_gev,
            e_min,
            e_max,
        });
    }
    Ok(norm_gev)
}

// ---------------------------------------------------------------------------
// Table-free utilities
// ---------------------------------------------------------------------------

/// Divide a flux by a time period, e.g. to turn a fluence into a flux.
pub fn divide_by_time(flux: Quantity, time_period: Quantity) -> Result<Quantity> {
    flux.require_unit("flux")?;
    time_period.require_unit("time_period")?;
    let seconds = time_period.to(S).map_err(|_| AeffError::UnitMismatch {
        expected: "a unit of time".to_string(),
        found: format!("{time_period} as a time_period"),
    })?;

    let div_flux = flux / time_period;
    info!("Dividing by {seconds:.2e} s gives: {div_flux:.2}");
    Ok(div_flux)
}

/// Whether an E²dN/dE value is time-integrated or per unit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyFluxKind {
    /// erg cm^-2
    Fluence,
    /// erg cm^-2 s^-1
    Flux,
}

impl EnergyFluxKind {
    pub fn unit(self) -> Unit {
        match self {
            EnergyFluxKind::Fluence => ERG / CM.powi(2),
            EnergyFluxKind::Flux => ERG / CM.powi(2) / S,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            EnergyFluxKind::Fluence => "erg cm^-2",
            EnergyFluxKind::Flux => "erg cm^-2 s^-1",
        }
    }
}

/// E²dN/dE at a reference energy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySquaredFlux {
    pub quantity: Quantity,
    pub kind: EnergyFluxKind,
    /// Magnitude in `kind`'s erg unit.
    pub value: f64,
}

impl fmt::Display for EnergySquaredFlux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*e} {}", p, self.value, self.kind.symbol()),
            None => write!(f, "{:e} {}", self.value, self.kind.symbol()),
        }
    }
}

/// `flux_norm × norm_energy²`, in erg cm^-2 when `flux_norm` is a per-GeV
/// fluence and in erg cm^-2 s^-1 otherwise.
pub fn energy_squared_flux(flux_norm: Quantity, norm_energy: Quantity) -> Result<EnergySquaredFlux> {
    norm_energy.require_unit("norm_energy")?;
    flux_norm.require_unit("flux_norm")?;
    if !norm_energy.is_convertible_to(GEV) {
        return Err(AeffError::UnitMismatch {
            expected: GEV.dimension().to_string(),
            found: norm_energy.dimension().to_string(),
        });
    }

    let quantity = flux_norm * norm_energy.checked_powi(2)?;
    let kind = if flux_norm.is_convertible_to(fluence_norm_unit()) {
        EnergyFluxKind::Fluence
    } else {
        EnergyFluxKind::Flux
    };
    let e2dnde = EnergySquaredFlux {
        quantity,
        kind,
        value: quantity.to(kind.unit())?,
    };

    info!(
        "This corresponds to E^2dN/dE = {e2dnde:.2} at {:.2e} GeV",
        norm_energy.to(GEV)?
    );
    Ok(e2dnde)
}

// ---------------------------------------------------------------------------
// Free-function entry points over the bundled/env-configured tables
// ---------------------------------------------------------------------------

pub fn get_effective_area(
    declination_deg: impl IntoDeclination,
    energy_pdf: &dyn EnergyPdf,
    selection: &str,
    purity: &str,
) -> Result<Quantity> {
    SensitivityCalculator::from_env().effective_area(declination_deg, energy_pdf, selection, purity)
}

pub fn get_threshold_flux(
    declination_deg: impl IntoDeclination,
    energy_pdf: &dyn EnergyPdf,
    selection: &str,
    purity: &str,
    norm_energy: Quantity,
) -> Result<Quantity> {
    SensitivityCalculator::from_env().threshold_flux(
        declination_deg,
        energy_pdf,
        selection,
        purity,
        norm_energy,
    )
}

pub fn get_reference_normalization(
    declination_deg: impl IntoDeclination,
    energy_pdf: &dyn EnergyPdf,
    selection: &str,
    purity: &str,
) -> Result<Quantity> {
    SensitivityCalculator::from_env().reference_normalization(
        declination_deg,
        energy_pdf,
        selection,
        purity,
    )
}

pub fn get_expected_events(
    flux_norm: Quantity,
    declination_deg: impl IntoDeclination,
    energy_pdf: &dyn EnergyPdf,
    selection: &str,
    norm_energy: Quantity,
) -> Result<Quantity> {
    SensitivityCalculator::from_env().expected_events(
        flux_norm,
        declination_deg,
        energy_pdf,
        selection,
        norm_energy,
    )
}

pub fn power_law_threshold_flux(
    declination_deg: impl IntoDeclination,
    query: &PowerLawQuery,
) -> Result<Quantity> {
    SensitivityCalculator::from_env().power_law_threshold_flux(declination_deg, query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aeff::loader::Availability;
    use crate::config::TableConfig;
    use crate::units::{Dimension, DIMENSIONLESS, PEV, TEV, YR};
    use approx::assert_relative_eq;
    use std::fs;
    use tempfile::TempDir;

    /// One 1 PeV - 10 PeV bin of 1 m² in alerts_v1/mid.
    fn one_bin_calculator() -> (TempDir, SensitivityCalculator) {
        let dir = TempDir::new().unwrap();
        let table = dir.path().join("alerts_v1/dec_minus_5_30/Aeff_ehe.csv");
        fs::create_dir_all(table.parent().unwrap()).unwrap();
        fs::write(&table, "1000,1.0\n10000,1.0\n").unwrap();
        let loader = TableLoader::new(TableConfig::new(dir.path()), Availability::alerts());
        (dir, SensitivityCalculator::new(loader))
    }

    fn e2_pdf() -> PowerLaw {
        PowerLaw::new(2.0, 1.0e5, 1.0e8).unwrap()
    }

    #[test]
    fn test_threshold_from_single_bin() {
        let (_dir, calc) = one_bin_calculator();
        let pdf = e2_pdf();

        // A = (1e-6 - 1e-7) GeV × 1e4 cm²
        let a_eff = calc.effective_area(0.0, &pdf, "alerts_v1", "bronze").unwrap();
        assert_relative_eq!(a_eff.to(GEV * CM.powi(2)).unwrap(), 9.0e-3, max_relative = 1e-12);

        let threshold = calc
            .threshold_flux(0.0, &pdf, "alerts_v1", "gold", 1.0 * PEV)
            .unwrap();
        assert_relative_eq!(
            threshold.to(fluence_norm_unit()).unwrap(),
            1.0e-12 / 9.0e-3,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_norm_energy_must_be_inside_open_domain() {
        let (_dir, calc) = one_bin_calculator();
        let pdf = e2_pdf();
        for e in [100.0 * TEV, 1.0e8 * GEV, 1.0 * GEV] {
            let err = calc.threshold_flux(0.0, &pdf, "alerts_v1", "bronze", e).unwrap_err();
            assert!(matches!(err, AeffError::OutOfRange { .. }), "{e}");
        }
        assert!(calc
            .threshold_flux(0.0, &pdf, "alerts_v1", "bronze", 100.001 * TEV)
            .is_ok());
    }

    #[test]
    fn test_norm_energy_needs_energy_unit() {
        let (_dir, calc) = one_bin_calculator();
        let pdf = e2_pdf();
        for bad in [Quantity::number(1.0e6), 3.0 * S] {
            let err = calc.threshold_flux(0.0, &pdf, "alerts_v1", "bronze", bad).unwrap_err();
            assert!(matches!(err, AeffError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_unknown_purity_is_invalid() {
        let (_dir, calc) = one_bin_calculator();
        let err = calc.effective_area(0.0, &e2_pdf(), "alerts_v1", "silver").unwrap_err();
        assert!(err.to_string().contains("bronze, gold"));
    }

    #[test]
    fn test_reference_normalization_is_inverse_area() {
        let (_dir, calc) = one_bin_calculator();
        let norm = calc
            .reference_normalization(0.0, &e2_pdf(), "alerts_v1", "bronze")
            .unwrap();
        assert_eq!(norm.dimension(), fluence_norm_unit().dimension());
        assert_relative_eq!(
            norm.to(fluence_norm_unit()).unwrap(),
            1.0 / 9.0e-3,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_expected_events_scales_with_flux() {
        let (_dir, calc) = one_bin_calculator();
        let pdf = e2_pdf();
        let threshold = calc
            .threshold_flux(0.0, &pdf, "alerts_v1", "bronze", 1.0 * PEV)
            .unwrap();

        let n = calc
            .expected_events(threshold * 3.0, 0.0, &pdf, "alerts_v1", 1.0 * PEV)
            .unwrap();
        assert!(n.dimension().is_none());
        assert_relative_eq!(n.to(DIMENSIONLESS).unwrap(), 3.0, max_relative = 1e-12);
    }

    #[test]
    fn test_expected_events_rejects_other_convention() {
        let (_dir, calc) = one_bin_calculator();
        let per_second = 1.0e-18 * GEV.powi(-1) * CM.powi(-2) / S;
        let err = calc
            .expected_events(per_second, 0.0, &e2_pdf(), "alerts_v1", 1.0 * PEV)
            .unwrap_err();
        assert!(matches!(err, AeffError::UnitMismatch { .. }));

        let bare = Quantity::number(1.0e-12);
        assert!(matches!(
            calc.expected_events(bare, 0.0, &e2_pdf(), "alerts_v1", 1.0 * PEV),
            Err(AeffError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_divide_by_time_round_trip() {
        let fluence = 4.2e-13 * fluence_norm_unit();
        let period = 0.5 * YR;
        let flux = divide_by_time(fluence, period).unwrap();
        assert_eq!(flux.dimension(), Dimension::new(-1, -2, -1));
        assert_relative_eq!(
            (flux * period).to(fluence_norm_unit()).unwrap(),
            4.2e-13,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_divide_by_time_unit_errors() {
        let fluence = 1.0 * fluence_norm_unit();
        assert!(matches!(
            divide_by_time(fluence, Quantity::number(10.0)),
            Err(AeffError::InvalidInput(_))
        ));
        assert!(matches!(
            divide_by_time(fluence, 10.0 * GEV),
            Err(AeffError::UnitMismatch { .. })
        ));
        assert!(matches!(
            divide_by_time(Quantity::number(1.0), 1.0 * S),
            Err(AeffError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_energy_squared_fluence_and_flux() {
        // 1 GeV^-1 cm^-2 at 1 erg → 1 erg cm^-2
        let e = 1.0 * ERG;
        let fluence_norm = (1.0 / ERG.scale()) * fluence_norm_unit();
        let fluence = energy_squared_flux(fluence_norm, e).unwrap();
        assert_eq!(fluence.kind, EnergyFluxKind::Fluence);
        assert_relative_eq!(fluence.value, 1.0, max_relative = 1e-12);

        let flux = energy_squared_flux(fluence_norm / (1.0 * S), e).unwrap();
        assert_eq!(flux.kind, EnergyFluxKind::Flux);
        assert_relative_eq!(flux.value, 1.0, max_relative = 1e-12);
        assert_eq!(format!("{flux:.1}"), "1.0e0 erg cm^-2 s^-1");
    }

    #[test]
    fn test_energy_squared_flux_rejects_bad_units() {
        let norm = 1.0 * fluence_norm_unit();
        assert!(matches!(
            energy_squared_flux(norm, 2.0 * S),
            Err(AeffError::UnitMismatch { .. })
        ));
        assert!(matches!(
            energy_squared_flux(1.0 * S, 1.0 * GEV),
            Err(AeffError::UnitMismatch { .. })
        ));
        assert!(matches!(
            energy_squared_flux(norm, Quantity::number(1.0)),
            Err(AeffError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_power_law_query_defaults() {
        let q = PowerLawQuery::default();
        assert_eq!(q.selection, Selection::AlertsV2);
        assert_eq!(q.purity, Purity::Bronze);
        assert_relative_eq!(q.norm_energy.to(GEV).unwrap(), 10.0);
    }
}
