//! Neutrino alert flux sensitivity.
//!
//! Declination-binned detector effective-area tables are integrated against
//! an energy spectrum to give a flux-averaged effective area, which is then
//! turned into the flux normalisation needed for one expected event.
//!
//! ```no_run
//! use alert_aeff::spectrum::PowerLaw;
//! use alert_aeff::units::{GEV, PEV};
//! use alert_aeff::get_threshold_flux;
//!
//! let pdf = PowerLaw::new(2.0, 2.0e5, 1.0e7)?;
//! let threshold = get_threshold_flux(10.0, &pdf, "alerts_v1", "bronze", 1.0 * PEV)?;
//! println!("{:.2e} GeV^-1 cm^-2", threshold.to(GEV.powi(-1) * alert_aeff::units::CM.powi(-2))?);
//! # Ok::<(), alert_aeff::AeffError>(())
//! ```

pub mod aeff;
pub mod config;
pub mod error;
pub mod flux;
pub mod spectrum;
pub mod units;

pub use aeff::model::{DeclinationBucket, IntoDeclination, Purity, Selection};
pub use error::{AeffError, Result};
pub use flux::{
    divide_by_time, energy_squared_flux, get_effective_area, get_expected_events,
    get_reference_normalization, get_threshold_flux, power_law_threshold_flux, PowerLawQuery,
    SensitivityCalculator,
};
pub use spectrum::{EnergyPdf, PowerLaw};
pub use units::Quantity;
