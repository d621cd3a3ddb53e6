use crate::{CalibrationProvider, ProjectionMatrix};
use nalgebra::{Matrix3, Rotation3, Vector3};
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that a supplied rotation matrix is orthonormal.
const ROTATION_TOLERANCE: f64 = 1e-6;

/// A calibration entry was malformed.
///
/// This is a contract violation on the calibration provider. It is raised once when the
/// entry is converted, never per triangulated point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalibrationError {
    #[error("camera {camera:?}: {field} must have shape {expected}, found {found}")]
    Dimension {
        camera: String,
        field: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("camera {camera:?}: {field} contains a non-finite value")]
    NonFinite { camera: String, field: &'static str },
    #[error("camera {camera:?}: rotation matrix is not a proper rotation")]
    InvalidRotation { camera: String },
    #[error("camera {camera:?} appears more than once in the calibration set")]
    DuplicateCamera { camera: String },
}

/// The calibration of one camera: intrinsic matrix `K`, world-to-camera rotation `R`,
/// and translation `t`, so that a world point `X` lands at `K (R X + t)`.
///
/// Distortion coefficients are carried for completeness but are not applied by the
/// triangulation core, which expects undistorted image coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraCalibration {
    pub name: String,
    pub intrinsics: Matrix3<f64>,
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub distortion: Option<Vec<f64>>,
    pub image_size: Option<[f64; 2]>,
}

impl CameraCalibration {
    /// Creates a calibration with no distortion and unknown image size.
    pub fn new(
        name: impl Into<String>,
        intrinsics: Matrix3<f64>,
        rotation: Rotation3<f64>,
        translation: Vector3<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            intrinsics,
            rotation,
            translation,
            distortion: None,
            image_size: None,
        }
    }

    /// Creates a calibration whose rotation is given as an axis-angle (Rodrigues) vector.
    ///
    /// ```
    /// use mocap_core::CameraCalibration;
    /// use mocap_core::nalgebra::{Matrix3, Vector3};
    ///
    /// let camera = CameraCalibration::from_axis_angle(
    ///     "cam1",
    ///     Matrix3::identity(),
    ///     Vector3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2),
    ///     Vector3::zeros(),
    /// );
    /// let rotated = camera.rotation * Vector3::x();
    /// assert!((rotated - Vector3::y()).norm() < 1e-12);
    /// ```
    pub fn from_axis_angle(
        name: impl Into<String>,
        intrinsics: Matrix3<f64>,
        axis_angle: Vector3<f64>,
        translation: Vector3<f64>,
    ) -> Self {
        Self::new(
            name,
            intrinsics,
            Rotation3::from_scaled_axis(axis_angle),
            translation,
        )
    }

    #[must_use]
    pub fn distortion(self, distortion: Vec<f64>) -> Self {
        Self {
            distortion: Some(distortion),
            ..self
        }
    }

    #[must_use]
    pub fn image_size(self, image_size: [f64; 2]) -> Self {
        Self {
            image_size: Some(image_size),
            ..self
        }
    }

    /// The rotation as an axis-angle vector whose norm is the angle in radians.
    pub fn axis_angle(&self) -> Vector3<f64> {
        self.rotation.scaled_axis()
    }

    /// Builds `P = K · [R | t]` for this camera.
    pub fn projection_matrix(&self) -> ProjectionMatrix {
        ProjectionMatrix::from_parts(&self.intrinsics, &self.rotation, &self.translation)
    }
}

/// A rotation as it appears in a calibration document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(untagged))]
pub enum RawRotation {
    /// Rodrigues vector.
    AxisAngle(Vec<f64>),
    /// Row-major 3x3 matrix.
    Matrix(Vec<Vec<f64>>),
}

/// An unvalidated calibration entry, shaped like a section of a Pose2Sim calibration file.
///
/// Convert it with [`RawCameraCalibration::into_calibration`], which checks every dimension.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RawCameraCalibration {
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub size: Option<Vec<f64>>,
    pub matrix: Vec<Vec<f64>>,
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default, alias = "distortion", alias = "dist")
    )]
    pub distortions: Option<Vec<f64>>,
    pub rotation: RawRotation,
    pub translation: Vec<f64>,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub fisheye: Option<bool>,
}

impl RawCameraCalibration {
    /// Validates the entry and converts it into a [`CameraCalibration`] named `camera`.
    ///
    /// ```
    /// use mocap_core::{CalibrationError, RawCameraCalibration, RawRotation};
    ///
    /// let raw = RawCameraCalibration {
    ///     name: None,
    ///     size: None,
    ///     matrix: vec![vec![1500.0, 0.0, 960.0], vec![0.0, 1500.0, 540.0]],
    ///     distortions: None,
    ///     rotation: RawRotation::AxisAngle(vec![0.0, 0.0, 0.0]),
    ///     translation: vec![0.0, 0.0, 3.0],
    ///     fisheye: None,
    /// };
    /// assert!(matches!(
    ///     raw.into_calibration("cam1"),
    ///     Err(CalibrationError::Dimension { field: "matrix", .. })
    /// ));
    /// ```
    pub fn into_calibration(self, camera: &str) -> Result<CameraCalibration, CalibrationError> {
        let intrinsics = matrix3(camera, "matrix", &self.matrix)?;
        let rotation = match &self.rotation {
            RawRotation::AxisAngle(v) => {
                Rotation3::from_scaled_axis(vector3(camera, "rotation", v)?)
            }
            RawRotation::Matrix(rows) => {
                let m = matrix3(camera, "rotation", rows)?;
                let orthonormal = (m.transpose() * m - Matrix3::identity()).amax()
                    < ROTATION_TOLERANCE
                    && (m.determinant() - 1.0).abs() < ROTATION_TOLERANCE;
                if !orthonormal {
                    return Err(CalibrationError::InvalidRotation {
                        camera: camera.to_owned(),
                    });
                }
                Rotation3::from_matrix_unchecked(m)
            }
        };
        let translation = vector3(camera, "translation", &self.translation)?;

        let image_size = match self.size {
            Some(size) if size.len() == 2 => {
                finite(camera, "size", &size)?;
                Some([size[0], size[1]])
            }
            Some(size) => {
                return Err(CalibrationError::Dimension {
                    camera: camera.to_owned(),
                    field: "size",
                    expected: "[2]",
                    found: format!("[{}]", size.len()),
                })
            }
            None => None,
        };
        if let Some(distortion) = &self.distortions {
            finite(camera, "distortions", distortion)?;
        }

        Ok(CameraCalibration {
            name: camera.to_owned(),
            intrinsics,
            rotation,
            translation,
            distortion: self.distortions,
            image_size,
        })
    }
}

fn finite(camera: &str, field: &'static str, values: &[f64]) -> Result<(), CalibrationError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CalibrationError::NonFinite {
            camera: camera.to_owned(),
            field,
        })
    }
}

fn vector3(camera: &str, field: &'static str, v: &[f64]) -> Result<Vector3<f64>, CalibrationError> {
    if v.len() != 3 {
        return Err(CalibrationError::Dimension {
            camera: camera.to_owned(),
            field,
            expected: "[3]",
            found: format!("[{}]", v.len()),
        });
    }
    finite(camera, field, v)?;
    Ok(Vector3::new(v[0], v[1], v[2]))
}

fn matrix3(
    camera: &str,
    field: &'static str,
    rows: &[Vec<f64>],
) -> Result<Matrix3<f64>, CalibrationError> {
    if rows.len() != 3 || rows.iter().any(|row| row.len() != 3) {
        let found = rows
            .iter()
            .map(|row| row.len().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(CalibrationError::Dimension {
            camera: camera.to_owned(),
            field,
            expected: "[3, 3]",
            found: format!("rows of [{}]", found),
        });
    }
    for row in rows {
        finite(camera, field, row)?;
    }
    Ok(Matrix3::from_fn(|r, c| rows[r][c]))
}

/// An ordered set of camera calibrations with unique names.
///
/// Camera order is the insertion order and is the order in which per-camera contribution
/// flags are reported.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CalibrationSet {
    cameras: Vec<CameraCalibration>,
}

impl CalibrationSet {
    pub fn new() -> Self {
        Default::default()
    }

    /// Builds a set from calibrations, rejecting duplicate names.
    pub fn from_cameras(
        cameras: impl IntoIterator<Item = CameraCalibration>,
    ) -> Result<Self, CalibrationError> {
        let mut set = Self::new();
        for camera in cameras {
            set.insert(camera)?;
        }
        Ok(set)
    }

    pub fn insert(&mut self, camera: CameraCalibration) -> Result<(), CalibrationError> {
        if self.get(&camera.name).is_some() {
            return Err(CalibrationError::DuplicateCamera {
                camera: camera.name,
            });
        }
        self.cameras.push(camera);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&CameraCalibration> {
        self.cameras.iter().find(|camera| camera.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CameraCalibration> + '_ {
        self.cameras.iter()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }
}

impl CalibrationProvider for CalibrationSet {
    fn camera_names(&self) -> Vec<&str> {
        self.cameras.iter().map(|camera| camera.name.as_str()).collect()
    }

    fn camera_data(&self, name: &str) -> Option<&CameraCalibration> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawCameraCalibration {
        RawCameraCalibration {
            name: Some("cam01".into()),
            size: Some(vec![1920.0, 1080.0]),
            matrix: vec![
                vec![1500.0, 0.0, 960.0],
                vec![0.0, 1500.0, 540.0],
                vec![0.0, 0.0, 1.0],
            ],
            distortions: Some(vec![0.01, -0.02, 0.0, 0.0]),
            rotation: RawRotation::AxisAngle(vec![0.1, 0.2, 0.3]),
            translation: vec![-1.0, 0.0, 0.0],
            fisheye: Some(false),
        }
    }

    #[test]
    fn converts_well_formed_entry() {
        let camera = raw().into_calibration("cam_01").unwrap();
        assert_eq!(camera.name, "cam_01");
        assert_eq!(camera.intrinsics[(0, 2)], 960.0);
        assert_eq!(camera.image_size, Some([1920.0, 1080.0]));
        approx::assert_relative_eq!(
            camera.axis_angle(),
            Vector3::new(0.1, 0.2, 0.3),
            epsilon = 1e-12
        );
    }

    #[test]
    fn accepts_rotation_matrix() {
        let rotation = Rotation3::from_scaled_axis(Vector3::new(0.3, -0.1, 0.2));
        let m = rotation.matrix();
        let rows = (0..3)
            .map(|r| (0..3).map(|c| m[(r, c)]).collect())
            .collect();
        let raw = RawCameraCalibration {
            rotation: RawRotation::Matrix(rows),
            ..raw()
        };
        let camera = raw.into_calibration("cam").unwrap();
        approx::assert_relative_eq!(camera.rotation, rotation, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_dimensions() {
        let bad_translation = RawCameraCalibration {
            translation: vec![1.0, 2.0],
            ..raw()
        };
        assert!(matches!(
            bad_translation.into_calibration("cam"),
            Err(CalibrationError::Dimension {
                field: "translation",
                ..
            })
        ));

        let bad_rotation = RawCameraCalibration {
            rotation: RawRotation::AxisAngle(vec![0.0; 4]),
            ..raw()
        };
        assert!(matches!(
            bad_rotation.into_calibration("cam"),
            Err(CalibrationError::Dimension {
                field: "rotation",
                ..
            })
        ));
    }

    #[test]
    fn rejects_non_rotation_matrix() {
        let raw = RawCameraCalibration {
            rotation: RawRotation::Matrix(vec![
                vec![2.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ]),
            ..raw()
        };
        assert_eq!(
            raw.into_calibration("cam"),
            Err(CalibrationError::InvalidRotation {
                camera: "cam".into()
            })
        );
    }

    #[test]
    fn rejects_non_finite() {
        let raw = RawCameraCalibration {
            translation: vec![f64::NAN, 0.0, 0.0],
            ..raw()
        };
        assert!(matches!(
            raw.into_calibration("cam"),
            Err(CalibrationError::NonFinite { .. })
        ));
    }

    #[test]
    fn set_keeps_order_and_rejects_duplicates() {
        let a = raw().into_calibration("b_cam").unwrap();
        let b = raw().into_calibration("a_cam").unwrap();
        let mut set = CalibrationSet::from_cameras([a.clone(), b]).unwrap();
        assert_eq!(set.camera_names(), vec!["b_cam", "a_cam"]);
        assert!(set.camera_data("a_cam").is_some());
        assert!(set.camera_data("missing").is_none());
        assert_eq!(
            set.insert(a),
            Err(CalibrationError::DuplicateCamera {
                camera: "b_cam".into()
            })
        );
        assert_eq!(set.len(), 2);
    }
}
