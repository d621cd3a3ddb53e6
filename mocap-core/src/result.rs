use nalgebra::Point3;
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A successfully triangulated marker.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TriangulationResult {
    /// The reconstructed point in world coordinates.
    pub point: Point3<f64>,
    /// The mean pixel distance between each contributing observation and the reprojection of `point`.
    pub reprojection_error: f64,
    /// The cameras used by the winning subset, in input order.
    pub contributing_cameras: Vec<String>,
    /// Contributing cameras whose left/right counterpart detection was used instead of their own.
    pub swapped_cameras: Vec<String>,
}

impl TriangulationResult {
    /// Whether `camera` took part in the triangulation.
    pub fn contributed(&self, camera: &str) -> bool {
        self.contributing_cameras.iter().any(|name| name == camera)
    }
}

/// The expected, recoverable reasons a marker has no 3d estimate on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TriangulationFailure {
    /// Fewer calibrated, quality-passing observations than the camera floor. No search was run.
    #[error("only {available} usable cameras, {required} required")]
    InsufficientCameras { available: usize, required: usize },
    /// No camera subset, with or without left/right swaps, reached the error threshold.
    ///
    /// `best_error` is `None` when not a single subset produced a finite point.
    #[error("reprojection error threshold not met (best error {best_error:?})")]
    ErrorThresholdUnmet { best_error: Option<f64> },
}
