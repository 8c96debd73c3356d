use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;

use super::model::{AeffRow, DeclinationBucket, EffectiveAreaCurve, IntoDeclination, Selection};
use crate::config::TableConfig;
use crate::error::{AeffError, Result};

// ---------------------------------------------------------------------------
// Availability – which (selection, bucket) pairs have tables
// ---------------------------------------------------------------------------

/// Maps each provisioned (selection, bucket) pair to its stream names.
///
/// A pair that is absent is valid but not yet provisioned: loading it
/// is an `Unimplemented` error rather than an empty result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    streams: BTreeMap<(Selection, DeclinationBucket), Vec<String>>,
}

impl Availability {
    /// Nothing provisioned.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The realtime alert tables shipped with the crate.
    pub fn alerts() -> Self {
        Self::empty()
            .with(Selection::AlertsV1, DeclinationBucket::Mid, &["ehe"])
            .with(Selection::AlertsV2, DeclinationBucket::Mid, &["ehe_gfu", "hese"])
            .with(Selection::AlertsV2, DeclinationBucket::North, &["ehe_gfu", "hese"])
    }

    pub fn with(mut self, selection: Selection, bucket: DeclinationBucket, streams: &[&str]) -> Self {
        self.streams.insert(
            (selection, bucket),
            streams.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn is_provisioned(&self, selection: Selection, bucket: DeclinationBucket) -> bool {
        self.streams.contains_key(&(selection, bucket))
    }

    /// Stream names for a pair, `None` when it has no tables.
    pub fn streams(&self, selection: Selection, bucket: DeclinationBucket) -> Option<&[String]> {
        self.streams.get(&(selection, bucket)).map(Vec::as_slice)
    }
}

// ---------------------------------------------------------------------------
// TableLoader
// ---------------------------------------------------------------------------

/// Resolves a declination and selection to the matching raw tables.
///
/// Tables are read from disk on every call; nothing is cached.
#[derive(Debug, Clone)]
pub struct TableLoader {
    config: TableConfig,
    availability: Availability,
}

impl TableLoader {
    pub fn new(config: TableConfig, availability: Availability) -> Self {
        Self {
            config,
            availability,
        }
    }

    /// Bundled alert availability, table root from the environment.
    pub fn from_env() -> Self {
        Self::new(TableConfig::from_env(), Availability::alerts())
    }

    /// `<root>/<selection>/<bucket dir>/Aeff_<stream>.csv`
    pub fn table_path(&self, selection: Selection, bucket: DeclinationBucket, stream: &str) -> PathBuf {
        self.config
            .root
            .join(selection.name())
            .join(bucket.dir_name())
            .join(format!("Aeff_{stream}.csv"))
    }

    /// Load every stream's curve for the selection's matching declination bucket.
    pub fn load(
        &self,
        declination_deg: impl IntoDeclination,
        selection: &str,
    ) -> Result<Vec<EffectiveAreaCurve>> {
        let selection: Selection = selection.parse()?;
        let declination_deg = declination_deg.into_degrees()?;
        self.load_selection(declination_deg, selection)
    }

    pub fn load_selection(
        &self,
        declination_deg: f64,
        selection: Selection,
    ) -> Result<Vec<EffectiveAreaCurve>> {
        let bucket = DeclinationBucket::from_degrees(declination_deg);
        let streams = self
            .availability
            .streams(selection, bucket)
            .ok_or(AeffError::Unimplemented {
                selection: selection.name(),
                bucket: bucket.name(),
                declination_deg,
            })?;

        debug!(
            "Loading effective areas from {}",
            self.config.root.join(selection.name()).join(bucket.dir_name()).display()
        );

        streams
            .iter()
            .map(|stream| read_curve(&self.table_path(selection, bucket, stream), stream))
            .collect()
    }
}

/// Parse a headerless `energy_TeV,area_m2` table.
pub fn read_curve(path: &Path, stream: &str) -> Result<EffectiveAreaCurve> {
    let table_err = |source: csv::Error| AeffError::TableRead {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(table_err)?;

    let rows = reader
        .deserialize::<AeffRow>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(table_err)?;

    let curve = EffectiveAreaCurve::new(stream, rows);
    if curve.has_unpaired_row() {
        debug!(
            "{} has an odd number of rows ({}); the last row is not part of any bin",
            path.display(),
            curve.len()
        );
    }
    Ok(curve)
}
