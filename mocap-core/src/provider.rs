use crate::{CameraCalibration, Observation2D};
use nalgebra::Point3;

/// Supplies the calibration of each camera by name.
///
/// A camera missing from the provider is treated as unavailable for every point.
pub trait CalibrationProvider {
    /// All camera names, in a stable order.
    fn camera_names(&self) -> Vec<&str>;

    fn camera_data(&self, name: &str) -> Option<&CameraCalibration>;
}

/// Supplies the already-resolved 2d observation of a marker.
///
/// Deciding which physical track to read from is the implementor's concern.
pub trait ObservationSource {
    fn observation(&self, camera: &str, marker: &str, frame: i32) -> Option<Observation2D>;
}

impl<T> ObservationSource for &T
where
    T: ObservationSource + ?Sized,
{
    fn observation(&self, camera: &str, marker: &str, frame: i32) -> Option<Observation2D> {
        (**self).observation(camera, marker, frame)
    }
}

/// The triangulation output of one marker over a contiguous frame range.
///
/// Every vector holds one entry per frame. Failed frames hold a `NaN` point and error,
/// a zero camera count, and no contribution flags set.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTrack {
    pub first_frame: i32,
    pub points: Vec<Point3<f64>>,
    pub errors: Vec<f64>,
    pub camera_counts: Vec<usize>,
    /// `contributions[frame][camera]`, cameras in calibration order.
    pub contributions: Vec<Vec<bool>>,
}

impl MarkerTrack {
    /// Creates a track of `frames` failed entries over `cameras` cameras.
    pub fn failed(first_frame: i32, frames: usize, cameras: usize) -> Self {
        Self {
            first_frame,
            points: vec![Point3::new(f64::NAN, f64::NAN, f64::NAN); frames],
            errors: vec![f64::NAN; frames],
            camera_counts: vec![0; frames],
            contributions: vec![vec![false; cameras]; frames],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The frames covered by this track.
    pub fn frames(&self) -> impl Iterator<Item = i32> {
        let first = self.first_frame;
        (0..self.len() as i32).map(move |ix| first + ix)
    }
}

/// Receives triangulated tracks, one marker at a time, for bulk writing.
pub trait TriangulationSink {
    fn write_track(&mut self, marker: &str, track: &MarkerTrack);
}
