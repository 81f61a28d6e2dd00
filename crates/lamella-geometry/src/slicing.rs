//! Staircase approximation of a grating profile.
//!
//! The modulated region $0 \le y \le d$ is cut into horizontal slices of equal
//! thickness. Within each slice the material distribution is taken to be the
//! one at the slice's mid-height, so every slice is a lamellar layer that
//! varies only along $x$. Slices are returned top first, in the order light
//! meets them.

use crate::profile::{GeometryError, GratingProfile, ProfileKind};

/// One lamellar layer of the staircase.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    /// Layer thickness (µm).
    pub thickness_um: f64,
    /// Material intervals of $x/\Lambda$ at the sampling plane.
    pub spans: Vec<(f64, f64)>,
}

/// Cut `profile` into `slices` equal-thickness layers, top first.
///
/// Rectangular profiles are already lamellar and always give exactly one
/// layer; a flat profile gives none.
pub fn slice_profile(profile: &GratingProfile, slices: usize) -> Result<Vec<Slice>, GeometryError> {
    if slices == 0 {
        return Err(GeometryError::InvalidSlicing);
    }
    let depth = profile.depth_um();
    if profile.is_flat() {
        return Ok(Vec::new());
    }

    let count = if profile.kind() == ProfileKind::Rectangular {
        1
    } else {
        slices
    };
    let thickness = depth / count as f64;

    Ok((0..count)
        .map(|j| {
            let mid = depth - (j as f64 + 0.5) * thickness;
            Slice {
                thickness_um: thickness,
                spans: profile.material_spans(mid),
            }
        })
        .collect())
}
