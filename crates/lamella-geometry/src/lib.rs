//! # Lamella Geometry
//!
//! Surface-relief grating geometry:
//!
//! - **Profiles** ([`profile`]): rectangular, blazed, sinusoidal and
//!   trapezoidal groove shapes, validated at construction.
//! - **Slicing** ([`slicing`]): staircase approximation of the modulated
//!   region as a stack of lamellar layers.
//! - **Fourier series** ([`fourier`]): closed-form permittivity harmonics of
//!   each layer for the modal solver.
//!
//! Lengths are in micrometres, angles in degrees. The x coordinate of a
//! layer's material spans is expressed as a fraction of the period.

pub mod fourier;
pub mod profile;
pub mod slicing;

pub use fourier::{FourierSeries, LayerSeries};
pub use profile::{GeometryError, GratingProfile, ProfileKind, ProfileShape};
pub use slicing::{slice_profile, Slice};
