//! Configuration for face triangulation.
//!
//! [`TriangulationConfig`] controls the comparison tolerances used by the
//! ear clipper and how a batch reacts to faces it cannot triangulate.
//!
//! # Presets
//!
//! - [`TriangulationConfig::default()`] - exact comparisons, fail on the first bad face
//! - [`TriangulationConfig::tolerant()`] - small tolerances, bad faces are skipped
//!
//! # Example
//!
//! ```
//! use facetri::TriangulationConfig;
//!
//! let config = TriangulationConfig::default()
//!     .with_ear_tolerance(1e-9)
//!     .with_parallel(true);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::triangulate::{Error, Result};

/// Settings for [`triangulate_faces`] and [`triangulate_face`].
///
/// Deserializes from partial input: missing fields take their default value.
///
/// [`triangulate_faces`]: ../triangulate/fn.triangulate_faces.html
/// [`triangulate_face`]: ../triangulate/fn.triangulate_face.html
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationConfig {
    /// Slack for the ear containment test.
    ///
    /// A vertex blocks a candidate ear when all three of its half-plane
    /// values are greater than `-ear_tolerance`. With `0.0` only vertices
    /// strictly inside the ear block it; a positive value also treats
    /// vertices lying on (or rounding just outside of) an ear edge as
    /// blockers, so no sliver ear is clipped across them.
    /// Default: `0.0`
    pub ear_tolerance: f64,

    /// Upper bound on the summed cross product magnitudes for a loop to be
    /// treated as a straight line by the collinear degeneracy check.
    /// Default: `0.0`
    pub collinear_tolerance: f64,

    /// Skip faces that fail to triangulate instead of failing the batch.
    /// Default: `false`
    pub skip_invalid_faces: bool,

    /// Triangulate faces on the rayon thread pool.
    /// The output order is the same as for a sequential run.
    /// Default: `false`
    pub parallel: bool,
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            ear_tolerance: 0.0,
            collinear_tolerance: 0.0,
            skip_invalid_faces: false,
            parallel: false,
        }
    }
}

impl TriangulationConfig {
    /// Looser settings for meshes coming out of lossy pipelines, where
    /// vertices that should sit on an edge are off by rounding noise.
    pub fn tolerant() -> Self {
        Self {
            ear_tolerance: 1e-9,
            collinear_tolerance: 1e-9,
            skip_invalid_faces: true,
            parallel: false,
        }
    }

    pub fn with_ear_tolerance(mut self, tolerance: f64) -> Self {
        self.ear_tolerance = tolerance;
        self
    }

    pub fn with_collinear_tolerance(mut self, tolerance: f64) -> Self {
        self.collinear_tolerance = tolerance;
        self
    }

    pub fn with_skip_invalid_faces(mut self, skip: bool) -> Self {
        self.skip_invalid_faces = skip;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks that both tolerances are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("ear_tolerance", self.ear_tolerance),
            ("collinear_tolerance", self.collinear_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidTolerance { name, value });
            }
        }
        Ok(())
    }
}
