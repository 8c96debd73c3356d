use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{AeffError, Result};
use crate::units::{Quantity, M, TEV};

// ---------------------------------------------------------------------------
// Selection / Purity – which instrument configuration to use
// ---------------------------------------------------------------------------

/// Alert selection whose tables are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Selection {
    AlertsV1,
    #[default]
    AlertsV2,
}

impl Selection {
    pub const ALL: [Selection; 2] = [Selection::AlertsV1, Selection::AlertsV2];

    pub fn name(self) -> &'static str {
        match self {
            Selection::AlertsV1 => "alerts_v1",
            Selection::AlertsV2 => "alerts_v2",
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Selection {
    type Err = AeffError;

    fn from_str(s: &str) -> Result<Self> {
        Selection::ALL
            .into_iter()
            .find(|sel| sel.name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Selection::ALL.iter().map(|sel| sel.name()).collect();
                AeffError::InvalidInput(format!(
                    "Selection '{s}' not recognised. The following selections are available: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Alert purity class. Carried through and reported, but every purity
/// currently maps onto the same tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Purity {
    #[default]
    Bronze,
    Gold,
}

impl Purity {
    pub const ALL: [Purity; 2] = [Purity::Bronze, Purity::Gold];

    pub fn name(self) -> &'static str {
        match self {
            Purity::Bronze => "bronze",
            Purity::Gold => "gold",
        }
    }
}

impl fmt::Display for Purity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Purity {
    type Err = AeffError;

    fn from_str(s: &str) -> Result<Self> {
        Purity::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Purity::ALL.iter().map(|p| p.name()).collect();
                AeffError::InvalidInput(format!(
                    "Purity '{s}' not recognised. The following purities are available: {}",
                    valid.join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Declination
// ---------------------------------------------------------------------------

/// Declination band a source falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclinationBucket {
    /// dec < -5°
    South,
    /// -5° <= dec <= 30°
    Mid,
    /// dec > 30°
    North,
}

impl DeclinationBucket {
    pub fn from_degrees(declination_deg: f64) -> Self {
        if declination_deg < -5.0 {
            DeclinationBucket::South
        } else if declination_deg > 30.0 {
            DeclinationBucket::North
        } else {
            DeclinationBucket::Mid
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeclinationBucket::South => "south",
            DeclinationBucket::Mid => "mid",
            DeclinationBucket::North => "north",
        }
    }

    /// Directory holding this bucket's tables, below the selection directory.
    pub fn dir_name(self) -> &'static str {
        match self {
            DeclinationBucket::South => "dec_minus_90_minus_5",
            DeclinationBucket::Mid => "dec_minus_5_30",
            DeclinationBucket::North => "dec_30_90",
        }
    }
}

impl fmt::Display for DeclinationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything a caller may hand in as a declination in degrees.
///
/// Strings are parsed; anything that is not a finite real number is
/// rejected with `InvalidInput` instead of being coerced.
pub trait IntoDeclination {
    fn into_degrees(self) -> Result<f64>;
}

fn finite_declination(value: f64, shown: &dyn fmt::Display) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AeffError::InvalidInput(format!(
            "Cannot convert declination '{shown}' to a finite number"
        )))
    }
}

impl IntoDeclination for f64 {
    fn into_degrees(self) -> Result<f64> {
        finite_declination(self, &self)
    }
}

impl IntoDeclination for f32 {
    fn into_degrees(self) -> Result<f64> {
        f64::from(self).into_degrees()
    }
}

impl IntoDeclination for i32 {
    fn into_degrees(self) -> Result<f64> {
        Ok(f64::from(self))
    }
}

impl IntoDeclination for &str {
    fn into_degrees(self) -> Result<f64> {
        let parsed = self.trim().parse::<f64>().map_err(|_| {
            AeffError::InvalidInput(format!("Cannot convert declination '{self}' to float"))
        })?;
        finite_declination(parsed, &self)
    }
}

impl IntoDeclination for &String {
    fn into_degrees(self) -> Result<f64> {
        self.as_str().into_degrees()
    }
}

impl IntoDeclination for String {
    fn into_degrees(self) -> Result<f64> {
        self.as_str().into_degrees()
    }
}

// ---------------------------------------------------------------------------
// EffectiveAreaCurve – one stream's raw table
// ---------------------------------------------------------------------------

/// One raw table row: energy in TeV, effective area in m².
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AeffRow {
    pub energy_tev: f64,
    pub area_m2: f64,
}

/// One energy bin built from an adjacent pair of rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeffBin {
    /// Lower bin edge in GeV.
    pub e_lo_gev: f64,
    /// Upper bin edge in GeV.
    pub e_hi_gev: f64,
    /// Mean of the two rows' areas.
    pub area: Quantity,
}

/// Raw effective-area table of one detection stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveAreaCurve {
    pub stream: String,
    pub rows: Vec<AeffRow>,
}

impl EffectiveAreaCurve {
    pub fn new(stream: impl Into<String>, rows: Vec<AeffRow>) -> Self {
        Self {
            stream: stream.into(),
            rows,
        }
    }

    /// Number of raw rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether an odd trailing row will be ignored by [`bins`](Self::bins).
    pub fn has_unpaired_row(&self) -> bool {
        self.rows.len() % 2 == 1
    }

    /// Rows consumed as (lower, upper) pairs, energies converted TeV → GeV.
    ///
    /// Rows `2i` and `2i + 1` form bin `i`. With an odd row count the last
    /// row has no partner and does not appear in any bin.
    pub fn bins(&self) -> impl Iterator<Item = AeffBin> + '_ {
        let tev_to_gev = TEV.scale();
        self.rows.chunks_exact(2).map(move |pair| AeffBin {
            e_lo_gev: pair[0].energy_tev * tev_to_gev,
            e_hi_gev: pair[1].energy_tev * tev_to_gev,
            area: 0.5 * (pair[0].area_m2 + pair[1].area_m2) * M.powi(2),
        })
    }
}
