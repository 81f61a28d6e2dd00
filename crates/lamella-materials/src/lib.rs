//! # Lamella Materials
//!
//! Optical constants for grating calculations. The solver only depends on
//! the [`MaterialOptics`](provider::MaterialOptics) lookup; everything else in
//! this crate is one way of answering it.
//!
//! ## Available data sources
//!
//! | Source | Module | Status |
//! |--------|--------|--------|
//! | Soft x-ray (δ, β) tables: Au, Ni, C | [`tabulated`] | Coarse built-in values |
//! | Fixed index | [`provider::ConstantIndex`] | Implemented |
//! | Name → provider table | [`database`] | In-memory only |

pub mod database;
pub mod provider;
pub mod spline;
pub mod tabulated;

pub use database::MaterialDatabase;
pub use provider::{ConstantIndex, MaterialError, MaterialOptics, MaterialProvider};

/// $hc$ in eV·µm: $\lambda[\mu m] = 1.23984172 / E[eV]$.
pub const HC_EV_UM: f64 = 1.239_841_72;
