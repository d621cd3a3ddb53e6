//! This crate contains the numerical core of multi-camera marker triangulation.
//!
//! ## Triangulation
//!
//! Each camera that sees a marker contributes a pixel `(x, y)`, a quality `w`, and its
//! projection matrix `P`. The [`WeightedDltTriangulator`] stacks two weighted rows per camera,
//!
//! ```text
//! w * (P[0] - x * P[2])
//! w * (P[1] - y * P[2])
//! ```
//!
//! and takes the right-singular vector of the smallest singular value as the homogeneous point.
//! The point is then reprojected through every camera and the mean pixel distance to the
//! observations is its reprojection error.
//!
//! ## Camera subset search
//!
//! Upstream 2d detectors are sometimes badly wrong in one view. The [`CameraSubsetSelector`]
//! first triangulates with every camera, then with every combination missing one camera, then
//! two, and so on, stopping at the first level whose best subset reaches the error threshold.
//! If nothing reaches it, the [`LeftRightSwapResolver`] tries substituting the left/right
//! counterpart detection in a minority of the cameras.
//!
//! ```text
//!   cameras off = 0    {0 1 2 3}
//!   cameras off = 1    {0 1 2} {0 1 3} {0 2 3} {1 2 3}
//!   cameras off = 2    {0 1} {0 2} {0 3} {1 2} {1 3} {2 3}
//! ```

mod combinations;
mod reprojection;
mod selection;
mod swap;
mod triangulation;

pub use combinations::*;
pub use reprojection::*;
pub use selection::*;
pub use swap::*;
pub use triangulation::*;
