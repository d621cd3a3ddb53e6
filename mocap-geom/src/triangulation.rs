use mocap_core::{
    nalgebra::{DMatrix, Point2, Vector4},
    undefined_point, ProjectionMatrix, TriangulatorWeighted,
};

/// Weighted direct linear transform (DLT) triangulation.
///
/// Each observation `(x, y)` with weight `w` through projection `P` contributes the rows
/// `w * (P[0] - x * P[2])` and `w * (P[1] - y * P[2])` to a `2N x 4` matrix `A`. The point is
/// the right-singular vector of `A` with the smallest singular value, dehomogenized so that
/// `w = 1`. Weighting by detection quality lets confident views dominate the algebraic
/// residual.
///
/// The residual being minimized is algebraic, not geometric, so the result is not the
/// maximum-likelihood point under pixel noise. It is exact for noise-free observations and
/// cheap enough to run for every camera subset of a search.
///
/// ```
/// use mocap_core::nalgebra::{Matrix3, Point3, Rotation3, Vector3};
/// use mocap_core::{ProjectionMatrix, TriangulatorWeighted};
/// use mocap_geom::WeightedDltTriangulator;
///
/// let k = Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0);
/// let a = ProjectionMatrix::from_parts(&k, &Rotation3::identity(), &Vector3::new(0.0, 0.0, 6.0));
/// let b = ProjectionMatrix::from_parts(
///     &k,
///     &Rotation3::new(Vector3::new(0.0, 0.6, 0.0)),
///     &Vector3::new(0.0, 0.0, 6.0),
/// );
/// let point = Point3::new(0.1, -0.2, 0.3).to_homogeneous();
/// let views = [(&a, a.project(&point), 1.0), (&b, b.project(&point), 0.8)];
/// let triangulated = WeightedDltTriangulator::new().triangulate_weighted(views.iter().copied());
/// assert!((triangulated - point).norm() < 1e-6);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct WeightedDltTriangulator {
    epsilon: f64,
    max_iterations: usize,
}

impl WeightedDltTriangulator {
    /// Creates a `WeightedDltTriangulator` with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon used as the convergence threshold of the SVD.
    ///
    /// Default is `f64::EPSILON`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the maximum number of iterations for the SVD.
    ///
    /// Default is `1000`.
    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

impl Default for WeightedDltTriangulator {
    fn default() -> Self {
        Self {
            epsilon: f64::EPSILON,
            max_iterations: 1000,
        }
    }
}

impl TriangulatorWeighted for WeightedDltTriangulator {
    fn triangulate_weighted<'a>(
        &self,
        views: impl Iterator<Item = (&'a ProjectionMatrix, Point2<f64>, f64)> + Clone,
    ) -> Vector4<f64> {
        let rows = 2 * views.clone().count();
        // Two cameras are the least that constrain a point.
        if rows < 4 {
            return undefined_point();
        }

        let mut a = DMatrix::<f64>::zeros(rows, 4);
        for (i, (p, image, weight)) in views.enumerate() {
            for c in 0..4 {
                a[(2 * i, c)] = weight * (p.0[(0, c)] - image.x * p.0[(2, c)]);
                a[(2 * i + 1, c)] = weight * (p.0[(1, c)] - image.y * p.0[(2, c)]);
            }
        }

        let svd = match a.try_svd(false, true, self.epsilon, self.max_iterations) {
            Some(svd) => svd,
            None => return undefined_point(),
        };

        // Find the smallest singular value; its right-singular vector spans the null space.
        svd.singular_values
            .iter()
            .enumerate()
            .min_by_key(|&(_, &s)| float_ord::FloatOrd(s))
            .and_then(|(ix, _)| svd.v_t.as_ref().map(|v_t| v_t.row(ix).transpose()))
            .map(|q| Vector4::new(q[0] / q[3], q[1] / q[3], q[2] / q[3], 1.0))
            .unwrap_or_else(undefined_point)
    }
}
