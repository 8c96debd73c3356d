//! Effective-area layer: table selection, loading and integration.
//!
//! Architecture:
//! ```text
//!  declination + selection
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  bucket → Aeff_<stream>.csv → Vec<EffectiveAreaCurve>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ integrate  │  ∑ flux_integral(bin) × mean area, per curve
//!   └───────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  ∑ over the selection's streams → GeV cm²
//!   └───────────┘
//! ```

pub mod integrate;
pub mod loader;
pub mod model;
