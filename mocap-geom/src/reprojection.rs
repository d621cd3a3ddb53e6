use mocap_core::{
    nalgebra::{Point2, Vector4},
    ProjectionMatrix,
};

/// Projects a homogeneous world point through `projection` into pixel coordinates.
///
/// `NaN` components propagate, so reprojecting [`mocap_core::undefined_point`] yields a `NaN`
/// pixel.
#[inline(always)]
pub fn reproject(projection: &ProjectionMatrix, point: &Vector4<f64>) -> Point2<f64> {
    projection.project(point)
}

/// The pixel distance between two points, ignoring `NaN` components.
///
/// If every component of the difference is `NaN` the distance is infinite, so a failed
/// reprojection can never look better than a real one.
///
/// ```
/// use mocap_core::nalgebra::Point2;
/// use mocap_geom::euclidean_distance;
///
/// assert_eq!(euclidean_distance(&Point2::new(0.0, 0.0), &Point2::new(3.0, 4.0)), 5.0);
/// assert_eq!(euclidean_distance(&Point2::new(f64::NAN, 0.0), &Point2::new(1.0, 2.0)), 2.0);
/// assert!(euclidean_distance(&Point2::new(f64::NAN, f64::NAN), &Point2::new(1.0, 2.0)).is_infinite());
/// ```
pub fn euclidean_distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let d = a - b;
    if d.iter().all(|c| c.is_nan()) {
        return f64::INFINITY;
    }
    d.iter()
        .filter(|c| !c.is_nan())
        .map(|c| c * c)
        .sum::<f64>()
        .sqrt()
}

/// The mean [`euclidean_distance`] between each observation and the reprojection of `point`.
///
/// Returns `NaN` when there are no views.
pub fn mean_reprojection_error<'a>(
    views: impl IntoIterator<Item = (&'a ProjectionMatrix, Point2<f64>)>,
    point: &Vector4<f64>,
) -> f64 {
    let (sum, count) = views
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), (projection, observed)| {
            (
                sum + euclidean_distance(&reproject(projection, point), &observed),
                count + 1,
            )
        });
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}
