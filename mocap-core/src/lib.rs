//! # Mocap Core
//!
//! This library provides the common types and collaborator traits used to reconstruct
//! 3d body-joint markers from several calibrated cameras. The numerical algorithms live in
//! `mocap-geom` and the batch driver lives in `mocap-reconstruction`; both build on the
//! abstractions in this crate.
//!
//! ## Triangulation
//!
//! At one instant, a marker (for instance the left wrist) is detected in the image of
//! several cameras. Each detection is an [`Observation2D`]: a pixel position plus a
//! quality score in `[0, 1]` from the upstream 2d pose estimator. Each camera carries a
//! [`CameraCalibration`] from which a [`ProjectionMatrix`] `P = K · [R | t]` is derived.
//! Triangulation finds the 3d point whose projections through every `P` land closest to the
//! observed pixels. The mean pixel distance between observation and reprojection is the
//! reprojection error, which decides whether a [`TriangulationResult`] is trusted.
//!
//! ```text
//!        cam A              cam B              cam C
//!          O                  O                  O
//!           \                 |                 /
//!         @@@a@@@         @@@@b@@@@         @@@c@@@
//!              \              |              /
//!               \             |             /
//!                \            |            /
//!                 `-----------p-----------'
//! ```
//!
//! ## Collaborators
//!
//! The triangulation engine does not load files, store animation curves, or track people.
//! Those concerns are reached through three narrow traits:
//!
//! * [`CalibrationProvider`] - supplies per-camera calibration by name
//! * [`ObservationSource`] - supplies the `(x, y, quality)` of a marker in a camera at a frame
//! * [`TriangulationSink`] - receives reconstructed tracks one marker at a time

mod calibration;
mod config;
mod observation;
mod projection;
mod provider;
mod result;
mod triangulation;

pub use calibration::*;
pub use config::*;
pub use nalgebra;
pub use observation::*;
pub use projection::*;
pub use provider::*;
pub use result::*;
pub use triangulation::*;
