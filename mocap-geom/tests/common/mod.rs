#![allow(dead_code)]

use mocap_core::nalgebra::{Matrix3, Point2, Point3, Rotation3, Vector3};
use mocap_core::{Observation2D, ProjectionMatrix};
use mocap_geom::CameraView;

/// Five cameras six units from the origin, looking at it from different directions.
pub fn rig() -> Vec<ProjectionMatrix> {
    let k = Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0);
    [
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(0.0, 0.6, 0.0),
        Vector3::new(0.0, -0.6, 0.0),
        Vector3::new(0.5, 0.0, 0.0),
        Vector3::new(-0.5, 0.2, 0.0),
    ]
    .iter()
    .map(|&r| ProjectionMatrix::from_parts(&k, &Rotation3::new(r), &Vector3::new(0.0, 0.0, 6.0)))
    .collect()
}

pub fn pixel(projection: &ProjectionMatrix, point: &Point3<f64>) -> Point2<f64> {
    projection.project(&point.to_homogeneous())
}

pub fn observe(projection: &ProjectionMatrix, point: &Point3<f64>, quality: f64) -> Observation2D {
    let p = pixel(projection, point);
    Observation2D::new(p.x, p.y, quality)
}

/// Noise-free views of `point` from every projection.
pub fn views_of<'a>(
    projections: &'a [ProjectionMatrix],
    point: &Point3<f64>,
    quality: f64,
) -> Vec<CameraView<'a>> {
    projections
        .iter()
        .map(|p| CameraView::new(p, observe(p, point, quality)))
        .collect()
}
