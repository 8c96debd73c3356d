//! Unit-tagged physical quantities.
//!
//! Every flux, energy, area and time value crossing a public interface is a
//! [`Quantity`]: a magnitude stored in the canonical base (GeV, cm, s) plus
//! the [`Dimension`] exponents of that base. Named [`Unit`]s compose with
//! `*`, `/` and [`Unit::powi`], and `f64 * Unit` builds a quantity:
//!
//! ```
//! use alert_aeff::units::{CM, ERG, GEV, S, YR};
//!
//! let fluence = 0.5 * YR * (5.5e-11 * ERG / CM.powi(2) / S);
//! let per_gev = fluence / (1.0e6 * GEV).powi(2);
//! assert!(per_gev.to(GEV.powi(-1) * CM.powi(-2)).is_ok());
//! ```

use std::fmt;
use std::ops::{Div, Mul};

use crate::error::{AeffError, Result};

// ---------------------------------------------------------------------------
// Dimension – exponents of the canonical base units
// ---------------------------------------------------------------------------

/// Exponents of energy (GeV), length (cm) and time (s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    pub energy: i8,
    pub length: i8,
    pub time: i8,
}

impl Dimension {
    pub const NONE: Dimension = Dimension::new(0, 0, 0);
    pub const ENERGY: Dimension = Dimension::new(1, 0, 0);
    pub const LENGTH: Dimension = Dimension::new(0, 1, 0);
    pub const TIME: Dimension = Dimension::new(0, 0, 1);

    pub const fn new(energy: i8, length: i8, time: i8) -> Self {
        Self {
            energy,
            length,
            time,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// `None` when an exponent leaves the `i8` range.
    pub fn checked_powi(self, n: i32) -> Option<Self> {
        let n = i8::try_from(n).ok()?;
        Some(Self::new(
            self.energy.checked_mul(n)?,
            self.length.checked_mul(n)?,
            self.time.checked_mul(n)?,
        ))
    }

    /// # Panics
    ///
    /// If an exponent leaves the `i8` range; see [`checked_powi`](Self::checked_powi).
    pub fn powi(self, n: i32) -> Self {
        match self.checked_powi(n) {
            Some(dim) => dim,
            None => panic!("dimension {self} raised to {n} overflows the exponent range"),
        }
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        Dimension::new(
            self.energy + rhs.energy,
            self.length + rhs.length,
            self.time + rhs.time,
        )
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        Dimension::new(
            self.energy - rhs.energy,
            self.length - rhs.length,
            self.time - rhs.time,
        )
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "dimensionless");
        }
        let parts: Vec<String> = [("GeV", self.energy), ("cm", self.length), ("s", self.time)]
            .iter()
            .filter(|(_, exp)| *exp != 0)
            .map(|(sym, exp)| match exp {
                1 => sym.to_string(),
                e => format!("{sym}^{e}"),
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

// ---------------------------------------------------------------------------
// Unit – a scale factor onto the canonical base
// ---------------------------------------------------------------------------

/// A physical unit: how many canonical base units one of it is worth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    scale: f64,
    dim: Dimension,
}

impl Unit {
    pub const fn new(scale: f64, dim: Dimension) -> Self {
        Self { scale, dim }
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn powi(self, n: i32) -> Unit {
        Unit::new(self.scale.powi(n), self.dim.powi(n))
    }
}

impl Mul for Unit {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        Unit::new(self.scale * rhs.scale, self.dim * rhs.dim)
    }
}

impl Div for Unit {
    type Output = Unit;

    fn div(self, rhs: Unit) -> Unit {
        Unit::new(self.scale / rhs.scale, self.dim / rhs.dim)
    }
}

impl Mul<Unit> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Unit) -> Quantity {
        Quantity::new(self, rhs)
    }
}

/// Gigaelectronvolt: base energy unit.
pub const GEV: Unit = Unit::new(1.0, Dimension::ENERGY);
pub const TEV: Unit = Unit::new(1.0e3, Dimension::ENERGY);
pub const PEV: Unit = Unit::new(1.0e6, Dimension::ENERGY);
/// 1 erg = 1e-7 J = 624.150907446 GeV.
pub const ERG: Unit = Unit::new(624.150_907_446_076, Dimension::ENERGY);

/// Centimetre: base length unit.
pub const CM: Unit = Unit::new(1.0, Dimension::LENGTH);
pub const M: Unit = Unit::new(100.0, Dimension::LENGTH);

/// Second: base time unit.
pub const S: Unit = Unit::new(1.0, Dimension::TIME);
pub const DAY: Unit = Unit::new(86_400.0, Dimension::TIME);
/// Julian year (365.25 days).
pub const YR: Unit = Unit::new(31_557_600.0, Dimension::TIME);

/// Unit of a plain ratio.
pub const DIMENSIONLESS: Unit = Unit::new(1.0, Dimension::NONE);

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// A magnitude in canonical base units together with its dimension.
///
/// A quantity built through [`Quantity::number`] carries no unit at all.
/// Products and ratios involving at least one tagged operand are tagged,
/// so a ratio of two fluxes is a *tagged* dimensionless value, distinct
/// from a bare number handed in by a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    value: f64,
    dim: Dimension,
    tagged: bool,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value: value * unit.scale,
            dim: unit.dim,
            tagged: true,
        }
    }

    /// A bare number with no unit attached.
    pub fn number(value: f64) -> Self {
        Self {
            value,
            dim: Dimension::NONE,
            tagged: false,
        }
    }

    /// Additive identity for quantities of `unit`'s dimension.
    pub fn zero(unit: Unit) -> Self {
        Self::new(0.0, unit)
    }

    pub fn has_unit(&self) -> bool {
        self.tagged
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    /// Magnitude in the canonical base (GeV, cm, s).
    pub fn base_value(&self) -> f64 {
        self.value
    }

    pub fn is_convertible_to(&self, unit: Unit) -> bool {
        self.dim == unit.dim
    }

    /// Magnitude expressed in `unit`.
    pub fn to(&self, unit: Unit) -> Result<f64> {
        if !self.is_convertible_to(unit) {
            return Err(AeffError::UnitMismatch {
                expected: unit.dim.to_string(),
                found: self.dim.to_string(),
            });
        }
        Ok(self.value / unit.scale)
    }

    /// Fail with `InvalidInput` if this is a bare number.
    pub fn require_unit(&self, name: &str) -> Result<()> {
        if self.tagged {
            Ok(())
        } else {
            Err(AeffError::InvalidInput(format!(
                "'{name}' ({}) does not have an associated unit",
                self.value
            )))
        }
    }

    pub fn checked_add(self, rhs: Quantity) -> Result<Quantity> {
        if self.dim != rhs.dim {
            return Err(AeffError::UnitMismatch {
                expected: self.dim.to_string(),
                found: rhs.dim.to_string(),
            });
        }
        Ok(Quantity {
            value: self.value + rhs.value,
            dim: self.dim,
            tagged: self.tagged || rhs.tagged,
        })
    }

    /// # Panics
    ///
    /// If an exponent leaves the `i8` range; see [`checked_powi`](Self::checked_powi).
    pub fn powi(self, n: i32) -> Quantity {
        Quantity {
            value: self.value.powi(n),
            dim: self.dim.powi(n),
            tagged: self.tagged,
        }
    }

    /// `InvalidInput` instead of a panic when the exponent is out of range.
    pub fn checked_powi(self, n: i32) -> Result<Quantity> {
        let dim = self.dim.checked_powi(n).ok_or_else(|| {
            AeffError::InvalidInput(format!(
                "Cannot raise a quantity in {} to the power {n}",
                self.dim
            ))
        })?;
        Ok(Quantity {
            value: self.value.powi(n),
            dim,
            tagged: self.tagged,
        })
    }

    pub fn recip(self) -> Quantity {
        self.powi(-1)
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        Quantity {
            value: self.value * rhs.value,
            dim: self.dim * rhs.dim,
            tagged: self.tagged || rhs.tagged,
        }
    }
}

impl Div for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Quantity) -> Quantity {
        Quantity {
            value: self.value / rhs.value,
            dim: self.dim / rhs.dim,
            tagged: self.tagged || rhs.tagged,
        }
    }
}

impl Mul<Unit> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Unit) -> Quantity {
        self * Quantity::new(1.0, rhs)
    }
}

impl Div<Unit> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: Unit) -> Quantity {
        self / Quantity::new(1.0, rhs)
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        Quantity {
            value: self.value * rhs,
            ..self
        }
    }
}

impl Mul<Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        rhs * self
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        Quantity {
            value: self.value / rhs,
            ..self
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*e}", p, self.value)?,
            None => write!(f, "{:e}", self.value)?,
        }
        if self.tagged && !self.dim.is_none() {
            write!(f, " {}", self.dim)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_conversions() {
        let e = 1.0 * PEV;
        assert_relative_eq!(e.to(GEV).unwrap(), 1.0e6);
        assert_relative_eq!(e.to(TEV).unwrap(), 1.0e3);
        assert_relative_eq!((1.0 * ERG).to(GEV).unwrap(), 624.150_907_446, epsilon = 1e-6);
    }

    #[test]
    fn test_area_and_time_conversions() {
        let area = 2.0 * M.powi(2);
        assert_relative_eq!(area.to(CM.powi(2)).unwrap(), 2.0e4);

        let half_year = 0.5 * YR;
        assert_relative_eq!(half_year.to(S).unwrap(), 15_778_800.0);
        assert_relative_eq!(half_year.to(DAY).unwrap(), 182.625);
    }

    #[test]
    fn test_incompatible_conversion_is_mismatch() {
        let e = 10.0 * GEV;
        assert!(matches!(e.to(S), Err(AeffError::UnitMismatch { .. })));
    }

    #[test]
    fn test_products_track_dimension() {
        let flux = 3.0 * GEV.powi(-1) * CM.powi(-2);
        let e2 = flux * (2.0 * GEV).powi(2);
        assert_eq!(e2.dimension(), Dimension::new(1, -2, 0));
        assert_relative_eq!(e2.to(GEV / CM.powi(2)).unwrap(), 12.0);

        let ratio = flux / flux;
        assert!(ratio.dimension().is_none());
        assert!(ratio.has_unit());
        assert_relative_eq!(ratio.to(DIMENSIONLESS).unwrap(), 1.0);
    }

    #[test]
    fn test_bare_number_has_no_unit() {
        let n = Quantity::number(4.0);
        assert!(!n.has_unit());
        assert!(matches!(
            n.require_unit("time_period"),
            Err(AeffError::InvalidInput(_))
        ));
        assert!((1.0 * S).require_unit("time_period").is_ok());
    }

    #[test]
    fn test_exponent_overflow() {
        let e = 2.0 * GEV;
        assert!(matches!(e.checked_powi(130), Err(AeffError::InvalidInput(_))));
        assert!(matches!(e.checked_powi(-300), Err(AeffError::InvalidInput(_))));
        assert!((e * e).checked_powi(64).is_err());
        assert_eq!(e.checked_powi(3).unwrap().dimension(), Dimension::new(3, 0, 0));
        assert_eq!(Dimension::ENERGY.checked_powi(127), Some(Dimension::new(127, 0, 0)));
    }

    #[test]
    #[should_panic(expected = "overflows")]
    fn test_powi_overflow_panics() {
        let _ = (2.0 * GEV).powi(130);
    }

    #[test]
    fn test_checked_add() {
        let a = 1.0 * M.powi(2);
        let b = 5000.0 * CM.powi(2);
        assert_relative_eq!(a.checked_add(b).unwrap().to(M.powi(2)).unwrap(), 1.5);
        assert!(a.checked_add(1.0 * S).is_err());
    }

    #[test]
    fn test_display() {
        let q = 2.5 * GEV.powi(-1) * CM.powi(-2) / S;
        assert_eq!(format!("{q:.2}"), "2.50e0 GeV^-1 cm^-2 s^-1");
        assert_eq!(format!("{:.1}", Quantity::number(3.0)), "3.0e0");
    }
}
