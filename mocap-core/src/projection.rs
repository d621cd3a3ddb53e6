use crate::CameraCalibration;
use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Matrix3, Matrix3x4, Point2, RowVector4, Rotation3, Vector3, Vector4};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The 3x4 matrix `P = K · [R | t]` which maps a homogeneous world point into
/// homogeneous pixel coordinates for one camera.
///
/// ```
/// use mocap_core::ProjectionMatrix;
/// use mocap_core::nalgebra::{Matrix3, Point3, Rotation3, Vector3};
///
/// let k = Matrix3::new(
///     1000.0, 0.0, 640.0,
///     0.0, 1000.0, 360.0,
///     0.0, 0.0, 1.0,
/// );
/// let p = ProjectionMatrix::from_parts(&k, &Rotation3::identity(), &Vector3::new(0.0, 0.0, 5.0));
/// let pixel = p.project(&Point3::origin().to_homogeneous());
/// assert!((pixel - mocap_core::nalgebra::Point2::new(640.0, 360.0)).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ProjectionMatrix(pub Matrix3x4<f64>);

impl ProjectionMatrix {
    /// Combines intrinsics and pose into a projection matrix.
    pub fn from_parts(
        intrinsics: &Matrix3<f64>,
        rotation: &Rotation3<f64>,
        translation: &Vector3<f64>,
    ) -> Self {
        let rot = rotation.matrix();
        let pose = Matrix3x4::<f64>::from_columns(&[
            rot.column(0),
            rot.column(1),
            rot.column(2),
            translation.column(0),
        ]);
        Self(intrinsics * pose)
    }

    pub fn from_calibration(calibration: &CameraCalibration) -> Self {
        calibration.projection_matrix()
    }

    /// Row `r` of the matrix.
    #[inline(always)]
    pub fn row(&self, r: usize) -> RowVector4<f64> {
        self.0.row(r).into_owned()
    }

    /// Projects a homogeneous point into pixel coordinates.
    ///
    /// A point on the camera's principal plane divides by zero; the resulting
    /// infinities or `NaN` are returned rather than reported.
    #[inline(always)]
    pub fn project(&self, point: &Vector4<f64>) -> Point2<f64> {
        let h = self.0 * point;
        Point2::new(h.x / h.z, h.y / h.z)
    }
}
