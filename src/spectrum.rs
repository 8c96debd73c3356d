//! Energy PDF collaborator contract and a power-law implementation.

use crate::error::{AeffError, Result};

/// Spectral shape plus integration capability over an energy range.
///
/// Energies are plain GeV values; `f` takes the energy divided by 1 GeV.
/// Implementations are treated as read-only.
pub trait EnergyPdf {
    /// Lower bound of the domain, in GeV.
    fn e_min(&self) -> f64;

    /// Upper bound of the domain, in GeV.
    fn e_max(&self) -> f64;

    /// Integrated flux between `e_lo` and `e_hi` (GeV).
    fn flux_integral(&self, e_lo: f64, e_hi: f64) -> f64;

    /// Spectral value at the dimensionless energy `x = E / GeV`.
    fn f(&self, x: f64) -> f64;
}

/// Unbroken power law `dN/dE ∝ E^-γ` between `e_min` and `e_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerLaw {
    gamma: f64,
    e_min: f64,
    e_max: f64,
}

impl PowerLaw {
    pub fn new(gamma: f64, e_min_gev: f64, e_max_gev: f64) -> Result<Self> {
        if !gamma.is_finite() {
            return Err(AeffError::InvalidInput(format!(
                "Spectral index {gamma} is not a finite number"
            )));
        }
        if !(e_min_gev.is_finite() && e_max_gev.is_finite())
            || e_min_gev <= 0.0
            || e_max_gev <= e_min_gev
        {
            return Err(AeffError::InvalidInput(format!(
                "Energy range {e_min_gev} GeV - {e_max_gev} GeV must be positive and increasing"
            )));
        }
        Ok(Self {
            gamma,
            e_min: e_min_gev,
            e_max: e_max_gev,
        })
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl EnergyPdf for PowerLaw {
    fn e_min(&self) -> f64 {
        self.e_min
    }

    fn e_max(&self) -> f64 {
        self.e_max
    }

    // Not clipped to [e_min, e_max]; callers decide which ranges to ask for.
    fn flux_integral(&self, e_lo: f64, e_hi: f64) -> f64 {
        let one_minus_gamma = 1.0 - self.gamma;
        if one_minus_gamma.abs() < f64::EPSILON {
            (e_hi / e_lo).ln()
        } else {
            (e_hi.powf(one_minus_gamma) - e_lo.powf(one_minus_gamma)) / one_minus_gamma
        }
    }

    fn f(&self, x: f64) -> f64 {
        x.powf(-self.gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_e2_flux_integral() {
        let pl = PowerLaw::new(2.0, 1.0e2, 1.0e7).unwrap();
        assert_relative_eq!(pl.gamma(), 2.0);
        assert_relative_eq!(pl.flux_integral(1.0e2, 1.0e3), 1.0e-2 - 1.0e-3, max_relative = 1e-12);
        assert_relative_eq!(pl.f(1.0e3), 1.0e-6);
    }

    #[test]
    fn test_gamma_one_is_logarithmic() {
        let pl = PowerLaw::new(1.0, 1.0, 100.0).unwrap();
        assert_relative_eq!(pl.flux_integral(1.0, 100.0), 100.0_f64.ln());
    }

    #[test]
    fn test_rejects_bad_range() {
        assert!(PowerLaw::new(2.0, 1.0e7, 1.0e2).is_err());
        assert!(PowerLaw::new(2.0, 0.0, 1.0e2).is_err());
        assert!(PowerLaw::new(f64::NAN, 1.0, 1.0e2).is_err());
    }
}
