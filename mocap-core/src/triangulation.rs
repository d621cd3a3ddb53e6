use crate::ProjectionMatrix;
use nalgebra::{Point2, Vector4};

/// The homogeneous point returned when triangulation is undefined.
pub fn undefined_point() -> Vector4<f64> {
    Vector4::repeat(f64::NAN)
}

/// This trait is for algorithms which triangulate one point from two or more weighted
/// observations. Each observation is a [`ProjectionMatrix`], an image point in pixels, and a
/// non-negative weight.
///
/// The result is a homogeneous point normalized so that `w = 1`. When the point cannot be
/// determined (fewer than two observations, or a degenerate system) every component is `NaN`;
/// see [`undefined_point`]. This keeps the sentinel cheap inside search loops.
pub trait TriangulatorWeighted {
    fn triangulate_weighted<'a>(
        &self,
        views: impl Iterator<Item = (&'a ProjectionMatrix, Point2<f64>, f64)> + Clone,
    ) -> Vector4<f64>;
}

impl<T> TriangulatorWeighted for &T
where
    T: TriangulatorWeighted,
{
    fn triangulate_weighted<'a>(
        &self,
        views: impl Iterator<Item = (&'a ProjectionMatrix, Point2<f64>, f64)> + Clone,
    ) -> Vector4<f64> {
        (**self).triangulate_weighted(views)
    }
}
