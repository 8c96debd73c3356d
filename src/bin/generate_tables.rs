//! Regenerate the bundled effective-area tables.
//!
//! Each stream is a smooth parameterisation
//! `A(E) = A_max · r / (1 + r)`, `r = (E / E_c)^k`, optionally damped by
//! `exp(-E / E_abs)` for Earth absorption in the northern sky. Rows come in
//! (lower edge, upper edge) pairs on a 0.1 dex grid from 10 TeV to 100 PeV.
//!
//! Usage: `generate_tables [output_dir]` (default `tables`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use alert_aeff::aeff::model::{DeclinationBucket, Selection};

struct StreamShape {
    a_max_m2: f64,
    e_c_tev: f64,
    k: f64,
    e_abs_tev: Option<f64>,
}

impl StreamShape {
    fn area_m2(&self, e_tev: f64) -> f64 {
        let r = (e_tev / self.e_c_tev).powf(self.k);
        let area = self.a_max_m2 * r / (1.0 + r);
        match self.e_abs_tev {
            Some(e_abs) => area * (-e_tev / e_abs).exp(),
            None => area,
        }
    }
}

const LOG_E_START: f64 = 1.0;
const LOG_E_STEP: f64 = 0.1;
const N_BINS: usize = 40;

fn write_table(path: &Path, shape: &StreamShape) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for i in 0..N_BINS {
        let lo = 10f64.powf(LOG_E_START + i as f64 * LOG_E_STEP);
        let hi = 10f64.powf(LOG_E_START + (i + 1) as f64 * LOG_E_STEP);
        for e in [lo, hi] {
            writer.write_record([format!("{e:.6e}"), format!("{:.6e}", shape.area_m2(e))])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let root: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tables".to_string())
        .into();

    let ehe_gfu = |e_abs_tev| StreamShape {
        a_max_m2: 120.0,
        e_c_tev: 500.0,
        k: 1.2,
        e_abs_tev,
    };
    let hese = |e_abs_tev| StreamShape {
        a_max_m2: 40.0,
        e_c_tev: 150.0,
        k: 1.0,
        e_abs_tev,
    };

    let tables = [
        (
            Selection::AlertsV1,
            DeclinationBucket::Mid,
            "ehe",
            StreamShape {
                a_max_m2: 105.0,
                e_c_tev: 700.0,
                k: 1.3,
                e_abs_tev: None,
            },
        ),
        (Selection::AlertsV2, DeclinationBucket::Mid, "ehe_gfu", ehe_gfu(None)),
        (Selection::AlertsV2, DeclinationBucket::Mid, "hese", hese(None)),
        (Selection::AlertsV2, DeclinationBucket::North, "ehe_gfu", ehe_gfu(Some(5.0e4))),
        (Selection::AlertsV2, DeclinationBucket::North, "hese", hese(Some(5.0e4))),
    ];

    for (selection, bucket, stream, shape) in &tables {
        let path = root
            .join(selection.name())
            .join(bucket.dir_name())
            .join(format!("Aeff_{stream}.csv"));
        write_table(&path, shape)?;
        println!("Wrote {} rows to {}", 2 * N_BINS, path.display());
    }
    Ok(())
}
