use super::model::EffectiveAreaCurve;
use crate::error::Result;
use crate::spectrum::EnergyPdf;
use crate::units::{Quantity, Unit, CM, GEV};

/// Unit of a flux-averaged effective area (area × energy-integrated flux).
pub fn flux_averaged_area_unit() -> Unit {
    GEV * CM.powi(2)
}

/// Integrate one curve against an energy PDF.
///
/// Each bin contributes `flux_integral(e_lo, e_hi) × mean(area)` when its
/// lower edge lies strictly inside `(e_min, e_max)`. Only the lower edge is
/// tested, so a bin straddling `e_max` counts in full, while one straddling
/// `e_min` is skipped entirely.
pub fn integrate_curve(curve: &EffectiveAreaCurve, energy_pdf: &dyn EnergyPdf) -> Quantity {
    let (e_min, e_max) = (energy_pdf.e_min(), energy_pdf.e_max());

    // GeV cm², the canonical base
    let total: f64 = curve
        .bins()
        .filter(|bin| bin.e_lo_gev > e_min && bin.e_lo_gev < e_max)
        .map(|bin| energy_pdf.flux_integral(bin.e_lo_gev, bin.e_hi_gev) * bin.area.base_value())
        .sum();

    Quantity::new(total, flux_averaged_area_unit())
}

/// Sum the integrated area of every stream in a selection. No per-stream weighting.
pub fn aggregate(curves: &[EffectiveAreaCurve], energy_pdf: &dyn EnergyPdf) -> Result<Quantity> {
    curves
        .iter()
        .map(|curve| integrate_curve(curve, energy_pdf))
        .try_fold(Quantity::zero(flux_averaged_area_unit()), Quantity::checked_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aeff::model::AeffRow;
    use crate::spectrum::PowerLaw;
    use crate::units::M;
    use approx::assert_relative_eq;

    fn curve(rows: &[(f64, f64)]) -> EffectiveAreaCurve {
        EffectiveAreaCurve::new(
            "test",
            rows.iter()
                .map(|&(energy_tev, area_m2)| AeffRow {
                    energy_tev,
                    area_m2,
                })
                .collect(),
        )
    }

    fn gev_m2(q: Quantity) -> f64 {
        q.to(GEV * M.powi(2)).unwrap()
    }

    #[test]
    fn test_single_bin() {
        // 1 TeV - 10 TeV at 2 m² and 4 m², E^-2 between 100 GeV and 1 PeV
        let pdf = PowerLaw::new(2.0, 1.0e2, 1.0e6).unwrap();
        let c = curve(&[(1.0, 2.0), (10.0, 4.0)]);
        let expected = (1.0e-3 - 1.0e-4) * 3.0;
        assert_relative_eq!(gev_m2(integrate_curve(&c, &pdf)), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_empty_curve_is_zero() {
        let pdf = PowerLaw::new(2.0, 1.0e2, 1.0e6).unwrap();
        let result = integrate_curve(&curve(&[]), &pdf);
        assert_eq!(result.base_value(), 0.0);
        assert_eq!(result.dimension(), flux_averaged_area_unit().dimension());
    }

    #[test]
    fn test_no_overlap_is_exactly_zero() {
        let pdf = PowerLaw::new(2.0, 1.0e5, 1.0e6).unwrap();
        let below = curve(&[(1.0, 5.0), (10.0, 5.0), (10.0, 5.0), (50.0, 5.0)]);
        let above = curve(&[(2.0e3, 5.0), (5.0e3, 5.0)]);
        assert_eq!(integrate_curve(&below, &pdf).base_value(), 0.0);
        assert_eq!(integrate_curve(&above, &pdf).base_value(), 0.0);
    }

    #[test]
    fn test_lower_edge_on_domain_boundary_is_excluded() {
        // Lower edge exactly e_min (100 TeV) and exactly e_max (1 PeV).
        let pdf = PowerLaw::new(2.0, 1.0e5, 1.0e6).unwrap();
        let c = curve(&[(100.0, 1.0), (200.0, 1.0), (1000.0, 1.0), (2000.0, 1.0)]);
        assert_eq!(integrate_curve(&c, &pdf).base_value(), 0.0);
    }

    #[test]
    fn test_bin_straddling_upper_bound_counts_in_full() {
        let pdf = PowerLaw::new(2.0, 1.0e5, 1.0e6).unwrap();
        let c = curve(&[(500.0, 1.0), (5000.0, 1.0)]);
        let expected = 1.0 / 5.0e5 - 1.0 / 5.0e6;
        assert_relative_eq!(gev_m2(integrate_curve(&c, &pdf)), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_bin_straddling_lower_bound_is_skipped() {
        let pdf = PowerLaw::new(2.0, 1.0e5, 1.0e6).unwrap();
        let c = curve(&[(50.0, 1.0), (500.0, 1.0)]);
        assert_eq!(integrate_curve(&c, &pdf).base_value(), 0.0);
    }

    #[test]
    fn test_aggregate_sums_streams() {
        let pdf = PowerLaw::new(2.0, 1.0e2, 1.0e6).unwrap();
        let a = curve(&[(1.0, 2.0), (10.0, 4.0)]);
        let b = curve(&[(10.0, 1.0), (100.0, 1.0)]);
        let total = aggregate(&[a.clone(), b.clone()], &pdf).unwrap();
        let parts = gev_m2(integrate_curve(&a, &pdf)) + gev_m2(integrate_curve(&b, &pdf));
        assert_relative_eq!(gev_m2(total), parts, max_relative = 1e-12);
        assert_eq!(aggregate(&[], &pdf).unwrap().base_value(), 0.0);
    }
}
