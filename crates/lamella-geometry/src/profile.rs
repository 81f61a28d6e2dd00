//! Surface-relief grating profiles.
//!
//! A profile is one period of a surface $s(x)$, $0 \le x < \Lambda$, with the
//! grating material below the surface and the ambient medium above it.
//! Heights are measured from the groove floor. Every profile is validated once
//! at construction; a [`GratingProfile`] that exists is geometrically sound.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for invalid grating geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Grating period must be finite and positive, got {0} um")]
    InvalidPeriod(f64),

    #[error("Groove depth must be finite and non-negative, got {0} um")]
    InvalidDepth(f64),

    #[error("Duty cycle (valley width / period) must lie strictly between 0 and 1, got {0}")]
    InvalidDutyCycle(f64),

    #[error("{name} angle must lie in {range} degrees, got {value}")]
    InvalidAngle {
        name: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error(
        "Sidewalls self-intersect: valley width {valley_width_um} um plus ramp runs \
         {ramp_runs_um:.6} um exceed the period {period_um} um"
    )]
    SelfIntersecting {
        valley_width_um: f64,
        ramp_runs_um: f64,
        period_um: f64,
    },

    #[error("Material identifier must not be empty")]
    EmptyMaterial,

    #[error("{kind} profile expects {expected} geometry parameters ({names}), got {got}")]
    ParameterCount {
        kind: ProfileKind,
        expected: usize,
        names: &'static str,
        got: usize,
    },

    #[error("Unknown profile kind '{0}'. Valid kinds: rectangular, blazed, sinusoidal, trapezoidal")]
    UnknownKind(String),

    #[error("Slice count must be at least 1")]
    InvalidSlicing,
}

/// The four supported profile families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Rectangular,
    Blazed,
    Sinusoidal,
    Trapezoidal,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Rectangular => "rectangular",
            ProfileKind::Blazed => "blazed",
            ProfileKind::Sinusoidal => "sinusoidal",
            ProfileKind::Trapezoidal => "trapezoidal",
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileKind {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangular" => Ok(ProfileKind::Rectangular),
            "blazed" => Ok(ProfileKind::Blazed),
            "sinusoidal" => Ok(ProfileKind::Sinusoidal),
            "trapezoidal" => Ok(ProfileKind::Trapezoidal),
            other => Err(GeometryError::UnknownKind(other.to_string())),
        }
    }
}

/// Lamellar grating: a flat valley of width `valley_width_um` followed by a
/// ridge of height `depth_um`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangular {
    pub depth_um: f64,
    pub valley_width_um: f64,
}

/// Sawtooth grating with one facet per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blazed {
    /// Angle of the long (rising) facet.
    pub blaze_deg: f64,
    /// Angle of the short (falling) facet.
    pub anti_blaze_deg: f64,
}

/// $s(x) = \tfrac{d}{2}\,(1 - \cos 2\pi x/\Lambda)$.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sinusoidal {
    pub depth_um: f64,
}

/// Flat valley, rising sidewall, plateau, falling sidewall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trapezoidal {
    pub depth_um: f64,
    /// Width of the flat groove floor.
    pub valley_width_um: f64,
    /// Angle of the rising sidewall (90° is vertical).
    pub blaze_deg: f64,
    /// Angle of the falling sidewall (90° is vertical).
    pub anti_blaze_deg: f64,
}

/// Shape of one grating period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProfileShape {
    Rectangular(Rectangular),
    Blazed(Blazed),
    Sinusoidal(Sinusoidal),
    Trapezoidal(Trapezoidal),
}

impl ProfileShape {
    pub fn kind(&self) -> ProfileKind {
        match self {
            ProfileShape::Rectangular(_) => ProfileKind::Rectangular,
            ProfileShape::Blazed(_) => ProfileKind::Blazed,
            ProfileShape::Sinusoidal(_) => ProfileKind::Sinusoidal,
            ProfileShape::Trapezoidal(_) => ProfileKind::Trapezoidal,
        }
    }
}

/// A validated grating profile: period, shape and material identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GratingProfile {
    period_um: f64,
    shape: ProfileShape,
    material: String,
}

impl GratingProfile {
    /// Validate and build a profile.
    pub fn new(
        period_um: f64,
        shape: ProfileShape,
        material: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        let material = material.into();
        if !(period_um.is_finite() && period_um > 0.0) {
            return Err(GeometryError::InvalidPeriod(period_um));
        }
        if material.trim().is_empty() {
            return Err(GeometryError::EmptyMaterial);
        }

        match &shape {
            ProfileShape::Rectangular(r) => {
                check_depth(r.depth_um)?;
                let duty = r.valley_width_um / period_um;
                if !(duty.is_finite() && duty > 0.0 && duty < 1.0) {
                    return Err(GeometryError::InvalidDutyCycle(duty));
                }
            }
            ProfileShape::Blazed(b) => {
                check_angle("Blaze", b.blaze_deg, AngleRange::HalfOpen)?;
                check_angle("Anti-blaze", b.anti_blaze_deg, AngleRange::HalfOpen)?;
            }
            ProfileShape::Sinusoidal(s) => check_depth(s.depth_um)?,
            ProfileShape::Trapezoidal(t) => {
                check_depth(t.depth_um)?;
                check_angle("Blaze", t.blaze_deg, AngleRange::OpenClosed)?;
                check_angle("Anti-blaze", t.anti_blaze_deg, AngleRange::OpenClosed)?;
                if !(t.valley_width_um.is_finite() && t.valley_width_um >= 0.0) {
                    return Err(GeometryError::InvalidDutyCycle(t.valley_width_um / period_um));
                }
                let ramp_runs_um = ramp_run(t.depth_um, t.blaze_deg) + ramp_run(t.depth_um, t.anti_blaze_deg);
                if t.valley_width_um + ramp_runs_um > period_um {
                    return Err(GeometryError::SelfIntersecting {
                        valley_width_um: t.valley_width_um,
                        ramp_runs_um,
                        period_um,
                    });
                }
            }
        }

        Ok(Self {
            period_um,
            shape,
            material,
        })
    }

    pub fn rectangular(
        period_um: f64,
        depth_um: f64,
        valley_width_um: f64,
        material: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        Self::new(
            period_um,
            ProfileShape::Rectangular(Rectangular {
                depth_um,
                valley_width_um,
            }),
            material,
        )
    }

    pub fn blazed(
        period_um: f64,
        blaze_deg: f64,
        anti_blaze_deg: f64,
        material: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        Self::new(
            period_um,
            ProfileShape::Blazed(Blazed {
                blaze_deg,
                anti_blaze_deg,
            }),
            material,
        )
    }

    pub fn sinusoidal(
        period_um: f64,
        depth_um: f64,
        material: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        Self::new(period_um, ProfileShape::Sinusoidal(Sinusoidal { depth_um }), material)
    }

    pub fn trapezoidal(
        period_um: f64,
        depth_um: f64,
        valley_width_um: f64,
        blaze_deg: f64,
        anti_blaze_deg: f64,
        material: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        Self::new(
            period_um,
            ProfileShape::Trapezoidal(Trapezoidal {
                depth_um,
                valley_width_um,
                blaze_deg,
                anti_blaze_deg,
            }),
            material,
        )
    }

    /// Build from a kind tag and a flat parameter list, as given on the
    /// command line:
    ///
    /// - rectangular: depth, valley width
    /// - blazed: blaze angle, anti-blaze angle
    /// - sinusoidal: depth
    /// - trapezoidal: depth, valley width, blaze angle, anti-blaze angle
    pub fn from_parameters(
        kind: ProfileKind,
        period_um: f64,
        params: &[f64],
        material: impl Into<String>,
    ) -> Result<Self, GeometryError> {
        let (expected, names) = match kind {
            ProfileKind::Rectangular => (2, "depth, valley width"),
            ProfileKind::Blazed => (2, "blaze angle, anti-blaze angle"),
            ProfileKind::Sinusoidal => (1, "depth"),
            ProfileKind::Trapezoidal => (4, "depth, valley width, blaze angle, anti-blaze angle"),
        };
        if params.len() != expected {
            return Err(GeometryError::ParameterCount {
                kind,
                expected,
                names,
                got: params.len(),
            });
        }
        match kind {
            ProfileKind::Rectangular => Self::rectangular(period_um, params[0], params[1], material),
            ProfileKind::Blazed => Self::blazed(period_um, params[0], params[1], material),
            ProfileKind::Sinusoidal => Self::sinusoidal(period_um, params[0], material),
            ProfileKind::Trapezoidal => {
                Self::trapezoidal(period_um, params[0], params[1], params[2], params[3], material)
            }
        }
    }

    pub fn period_um(&self) -> f64 {
        self.period_um
    }

    pub fn shape(&self) -> &ProfileShape {
        &self.shape
    }

    pub fn kind(&self) -> ProfileKind {
        self.shape.kind()
    }

    /// Material identifier, resolved by a refractive index lookup.
    pub fn material(&self) -> &str {
        &self.material
    }

    /// Peak-to-valley height of the profile (µm).
    pub fn depth_um(&self) -> f64 {
        match &self.shape {
            ProfileShape::Rectangular(r) => r.depth_um,
            ProfileShape::Sinusoidal(s) => s.depth_um,
            ProfileShape::Trapezoidal(t) => t.depth_um,
            ProfileShape::Blazed(b) => {
                let (ta, tb) = (tan_deg(b.blaze_deg), tan_deg(b.anti_blaze_deg));
                if ta <= 0.0 || tb <= 0.0 {
                    0.0
                } else {
                    self.period_um * ta * tb / (ta + tb)
                }
            }
        }
    }

    /// True when the profile has no modulation (a flat mirror).
    pub fn is_flat(&self) -> bool {
        self.depth_um() <= 0.0
    }

    /// Intervals of $x/\Lambda$ occupied by material at `height_um` above the
    /// groove floor, sorted and disjoint, each within $[0, 1]$.
    ///
    /// Heights at or above the profile peak return no intervals.
    pub fn material_spans(&self, height_um: f64) -> Vec<(f64, f64)> {
        let depth = self.depth_um();
        if height_um >= depth || depth <= 0.0 {
            return Vec::new();
        }
        let y = height_um.max(0.0);
        let period = self.period_um;

        let span = match &self.shape {
            ProfileShape::Rectangular(r) => (r.valley_width_um / period, 1.0),
            ProfileShape::Blazed(b) => (
                y / (period * tan_deg(b.blaze_deg)),
                1.0 - y / (period * tan_deg(b.anti_blaze_deg)),
            ),
            ProfileShape::Sinusoidal(s) => {
                let x1 = (1.0 - 2.0 * y / s.depth_um).clamp(-1.0, 1.0).acos() / (2.0 * PI);
                (x1, 1.0 - x1)
            }
            ProfileShape::Trapezoidal(t) => (
                (t.valley_width_um + ramp_run(y, t.blaze_deg)) / period,
                1.0 - ramp_run(y, t.anti_blaze_deg) / period,
            ),
        };

        let (lo, hi) = (span.0.clamp(0.0, 1.0), span.1.clamp(0.0, 1.0));
        if hi > lo {
            vec![(lo, hi)]
        } else {
            Vec::new()
        }
    }
}

#[derive(Clone, Copy)]
enum AngleRange {
    /// [0°, 90°)
    HalfOpen,
    /// (0°, 90°]
    OpenClosed,
}

fn check_angle(name: &'static str, value: f64, range: AngleRange) -> Result<(), GeometryError> {
    let ok = match range {
        AngleRange::HalfOpen => (0.0..90.0).contains(&value),
        AngleRange::OpenClosed => value > 0.0 && value <= 90.0,
    };
    if ok {
        Ok(())
    } else {
        Err(GeometryError::InvalidAngle {
            name,
            value,
            range: match range {
                AngleRange::HalfOpen => "[0, 90)",
                AngleRange::OpenClosed => "(0, 90]",
            },
        })
    }
}

fn check_depth(depth_um: f64) -> Result<(), GeometryError> {
    if depth_um.is_finite() && depth_um >= 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidDepth(depth_um))
    }
}

fn tan_deg(angle_deg: f64) -> f64 {
    angle_deg.to_radians().tan()
}

/// Horizontal run of a wall of height `rise_um` inclined at `angle_deg`.
fn ramp_run(rise_um: f64, angle_deg: f64) -> f64 {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    (rise_um * cos / sin).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_duty_cycle_at_or_above_one_is_rejected() {
        let err = GratingProfile::rectangular(1.0, 0.1, 1.0, "Au").unwrap_err();
        assert!(matches!(err, GeometryError::InvalidDutyCycle(_)));
        let err = GratingProfile::rectangular(1.0, 0.1, 1.2, "Au").unwrap_err();
        assert!(matches!(err, GeometryError::InvalidDutyCycle(_)));
        assert!(GratingProfile::rectangular(1.0, 0.1, 0.0, "Au").is_err());
    }

    #[test]
    fn test_negative_depth_is_rejected() {
        assert_eq!(
            GratingProfile::rectangular(1.0, -0.01, 0.5, "Au").unwrap_err(),
            GeometryError::InvalidDepth(-0.01)
        );
        assert!(GratingProfile::sinusoidal(1.0, -1.0, "Au").is_err());
        assert!(GratingProfile::trapezoidal(1.0, -0.1, 0.3, 60.0, 60.0, "Au").is_err());
    }

    #[test]
    fn test_self_intersecting_trapezoid_is_rejected() {
        // 0.5 + 2 * 0.3/tan(30°) ≈ 1.54 > 1
        let err = GratingProfile::trapezoidal(1.0, 0.3, 0.5, 30.0, 30.0, "Au").unwrap_err();
        assert!(matches!(err, GeometryError::SelfIntersecting { .. }));
    }

    #[test]
    fn test_invalid_period_and_material() {
        assert!(matches!(
            GratingProfile::sinusoidal(0.0, 0.1, "Au"),
            Err(GeometryError::InvalidPeriod(_))
        ));
        assert_eq!(
            GratingProfile::sinusoidal(1.0, 0.1, "  ").unwrap_err(),
            GeometryError::EmptyMaterial
        );
    }

    #[test]
    fn test_blazed_angles_outside_range_are_rejected() {
        assert!(GratingProfile::blazed(1.0, 90.0, 30.0, "Au").is_err());
        assert!(GratingProfile::blazed(1.0, 3.0, -1.0, "Au").is_err());
    }

    #[test]
    fn test_blazed_depth_from_facet_angles() {
        let g = GratingProfile::blazed(1.6, 3.2, 30.0, "Au").unwrap();
        let ta = 3.2f64.to_radians().tan();
        let tb = 30f64.to_radians().tan();
        let apex = 1.6 * tb / (ta + tb);
        assert_abs_diff_eq!(g.depth_um(), apex * ta, epsilon = 1e-12);
        // Material at the floor spans the whole period.
        let spans = g.material_spans(0.0);
        assert_abs_diff_eq!(spans[0].0, 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(spans[0].1, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_zero_blaze_angle_is_flat() {
        let g = GratingProfile::blazed(1.0, 0.0, 30.0, "Au").unwrap();
        assert!(g.is_flat());
        assert!(g.material_spans(0.0).is_empty());
    }

    #[test]
    fn test_sinusoid_half_height_spans_middle_half() {
        let g = GratingProfile::sinusoidal(2.0, 0.4, "Au").unwrap();
        let spans = g.material_spans(0.2);
        assert_eq!(spans.len(), 1);
        assert_abs_diff_eq!(spans[0].0, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(spans[0].1, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_trapezoid_plateau_width() {
        let g = GratingProfile::trapezoidal(1.0, 0.1, 0.4, 45.0, 45.0, "Au").unwrap();
        let spans = g.material_spans(0.1 - 1e-12);
        // 45° walls: each run equals the depth.
        assert_abs_diff_eq!(spans[0].0, 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(spans[0].1, 0.9, epsilon = 1e-9);
    }

    #[test]
    fn test_vertical_trapezoid_walls_match_rectangle() {
        let trap = GratingProfile::trapezoidal(1.0, 0.1, 0.3, 90.0, 90.0, "Au").unwrap();
        let rect = GratingProfile::rectangular(1.0, 0.1, 0.3, "Au").unwrap();
        let a = trap.material_spans(0.05);
        let b = rect.material_spans(0.05);
        assert_abs_diff_eq!(a[0].0, b[0].0, epsilon = 1e-12);
        assert_abs_diff_eq!(a[0].1, b[0].1, epsilon = 1e-12);
    }

    #[test]
    fn test_from_parameters_checks_count() {
        let err = GratingProfile::from_parameters(ProfileKind::Trapezoidal, 1.0, &[0.1, 0.2], "Au")
            .unwrap_err();
        assert!(matches!(err, GeometryError::ParameterCount { expected: 4, got: 2, .. }));
        let g = GratingProfile::from_parameters(ProfileKind::Blazed, 1.6, &[3.2, 30.0], "Au").unwrap();
        assert_eq!(g.kind(), ProfileKind::Blazed);
    }

    #[test]
    fn test_kind_parses_from_str() {
        assert_eq!("sinusoidal".parse::<ProfileKind>().unwrap(), ProfileKind::Sinusoidal);
        assert!("triangular".parse::<ProfileKind>().is_err());
    }
}
