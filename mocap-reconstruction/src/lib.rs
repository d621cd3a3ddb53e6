//! Batch reconstruction of skeleton markers from multi-camera 2d detections.
//!
//! A run loads the calibration of every camera, picks a [`Skeleton`], and hands an
//! [`ObservationSource`](mocap_core::ObservationSource) to a [`FrameMarkerOrchestrator`]. The
//! orchestrator triangulates every (marker, frame) pair with the camera subset search of
//! `mocap-geom` and returns one [`MarkerTrack`](mocap_core::MarkerTrack) per marker.
//!
//! ```
//! use mocap_core::nalgebra::{Matrix3, Point3, Vector3};
//! use mocap_core::{CalibrationSet, CameraCalibration, Observation2D, TriangulationConfig};
//! use mocap_reconstruction::{FrameMarkerOrchestrator, ObservationTable, Skeleton};
//!
//! let k = Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0);
//! let calibration = CalibrationSet::from_cameras((0..3).map(|ix| {
//!     CameraCalibration::from_axis_angle(
//!         format!("cam{}", ix),
//!         k,
//!         Vector3::new(0.0, 0.5 * ix as f64 - 0.5, 0.0),
//!         Vector3::new(0.0, 0.0, 6.0),
//!     )
//! }))
//! .unwrap();
//!
//! let neck = Point3::new(0.0, -0.4, 0.1).to_homogeneous();
//! let mut observations = ObservationTable::new();
//! for camera in calibration.iter() {
//!     let pixel = camera.projection_matrix().project(&neck);
//!     observations.insert(&*camera.name, "Neck", 0, Observation2D::new(pixel.x, pixel.y, 0.9));
//! }
//!
//! let orchestrator = FrameMarkerOrchestrator::new(&calibration, TriangulationConfig::new()).unwrap();
//! let batch = orchestrator.run(&observations, &Skeleton::new("neck", ["Neck"]), 0..1);
//! assert_eq!(batch.summary.succeeded, 1);
//! assert_eq!(batch.track("Neck").unwrap().camera_counts, [3]);
//! ```

mod calibration_file;
mod orchestrator;
mod skeleton;
mod store;

pub use calibration_file::*;
pub use orchestrator::*;
pub use skeleton::*;
pub use store::*;
