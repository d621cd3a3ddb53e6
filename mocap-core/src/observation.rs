use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A 2d detection of one marker in one camera at one frame.
///
/// `quality` is the confidence of the upstream detector in `[0, 1]`. It is used both as
/// the weight of the observation in triangulation and to filter out unreliable detections.
/// An observation with `quality <= 0` (or any non-finite component) is unusable.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Observation2D {
    pub x: f64,
    pub y: f64,
    pub quality: f64,
}

impl Observation2D {
    pub fn new(x: f64, y: f64, quality: f64) -> Self {
        Self { x, y, quality }
    }

    /// The observed pixel position.
    #[inline(always)]
    pub fn point(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Whether this observation can take part in triangulation at all.
    #[inline(always)]
    pub fn is_usable(&self) -> bool {
        self.quality > 0.0 && self.x.is_finite() && self.y.is_finite() && self.quality.is_finite()
    }

    /// Whether this observation is usable and at least as confident as `min_quality`.
    ///
    /// ```
    /// use mocap_core::Observation2D;
    ///
    /// assert!(Observation2D::new(10.0, 20.0, 0.5).passes(0.5));
    /// assert!(!Observation2D::new(10.0, 20.0, 0.4).passes(0.5));
    /// assert!(!Observation2D::new(10.0, 20.0, 0.0).passes(0.0));
    /// assert!(!Observation2D::new(f64::NAN, 20.0, 0.9).passes(0.5));
    /// ```
    #[inline(always)]
    pub fn passes(&self, min_quality: f64) -> bool {
        self.is_usable() && self.quality >= min_quality
    }
}

impl From<(f64, f64, f64)> for Observation2D {
    fn from((x, y, quality): (f64, f64, f64)) -> Self {
        Self::new(x, y, quality)
    }
}
