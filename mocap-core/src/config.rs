use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Triangulation is undefined with fewer cameras than this, whatever the configuration says.
pub const MIN_TRIANGULATION_CAMERAS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_cameras_for_triangulation must be at least 2, got {0}")]
    TooFewCameras(usize),
    #[error("reprojection_error_threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
    #[error("min_quality must lie in [0, 1], got {0}")]
    InvalidMinQuality(f64),
}

/// The run-wide settings for triangulation.
///
/// These are supplied once and passed by value into every call; nothing is read from
/// ambient state.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangulationConfig {
    /// The mean reprojection error, in pixels, at or below which a triangulation is accepted.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_reprojection_error_threshold")
    )]
    pub reprojection_error_threshold: f64,
    /// The fewest cameras a triangulation may use. Values below 2 are rejected.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_min_cameras_for_triangulation")
    )]
    pub min_cameras_for_triangulation: usize,
    /// Try swapping left and right detections in a minority of cameras when no camera
    /// subset reaches the threshold.
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_handle_left_right_swap")
    )]
    pub handle_left_right_swap: bool,
    /// Observations with a quality below this are discarded before the search.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_min_quality"))]
    pub min_quality: f64,
}

impl TriangulationConfig {
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn reprojection_error_threshold(self, reprojection_error_threshold: f64) -> Self {
        Self {
            reprojection_error_threshold,
            ..self
        }
    }

    #[must_use]
    pub fn min_cameras_for_triangulation(self, min_cameras_for_triangulation: usize) -> Self {
        Self {
            min_cameras_for_triangulation,
            ..self
        }
    }

    #[must_use]
    pub fn handle_left_right_swap(self, handle_left_right_swap: bool) -> Self {
        Self {
            handle_left_right_swap,
            ..self
        }
    }

    #[must_use]
    pub fn min_quality(self, min_quality: f64) -> Self {
        Self {
            min_quality,
            ..self
        }
    }

    /// The camera floor actually applied: never below [`MIN_TRIANGULATION_CAMERAS`].
    pub fn camera_floor(&self) -> usize {
        self.min_cameras_for_triangulation
            .max(MIN_TRIANGULATION_CAMERAS)
    }

    /// Checks the settings for values that make the search meaningless.
    ///
    /// ```
    /// use mocap_core::{ConfigError, TriangulationConfig};
    ///
    /// assert!(TriangulationConfig::new().validate().is_ok());
    /// assert_eq!(
    ///     TriangulationConfig::new().min_cameras_for_triangulation(1).validate(),
    ///     Err(ConfigError::TooFewCameras(1)),
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_cameras_for_triangulation < MIN_TRIANGULATION_CAMERAS {
            return Err(ConfigError::TooFewCameras(
                self.min_cameras_for_triangulation,
            ));
        }
        if !(self.reprojection_error_threshold >= 0.0) {
            return Err(ConfigError::InvalidThreshold(
                self.reprojection_error_threshold,
            ));
        }
        if !(0.0..=1.0).contains(&self.min_quality) {
            return Err(ConfigError::InvalidMinQuality(self.min_quality));
        }
        Ok(())
    }
}

impl Default for TriangulationConfig {
    fn default() -> Self {
        Self {
            reprojection_error_threshold: default_reprojection_error_threshold(),
            min_cameras_for_triangulation: default_min_cameras_for_triangulation(),
            handle_left_right_swap: default_handle_left_right_swap(),
            min_quality: default_min_quality(),
        }
    }
}

fn default_reprojection_error_threshold() -> f64 {
    15.0
}

fn default_min_cameras_for_triangulation() -> usize {
    2
}

fn default_handle_left_right_swap() -> bool {
    false
}

fn default_min_quality() -> f64 {
    0.5
}
