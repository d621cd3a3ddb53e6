use crate::{mean_reprojection_error, Combinations, LeftRightSwapResolver, WeightedDltTriangulator};
use log::{debug, trace};
use mocap_core::{
    nalgebra::{Point2, Point3, Vector4},
    CalibrationProvider, ConfigError, Observation2D, ProjectionMatrix, TriangulationConfig,
    TriangulationFailure, TriangulationResult, TriangulatorWeighted,
};

/// Everything one camera contributes to the triangulation of one marker at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView<'a> {
    pub projection: &'a ProjectionMatrix,
    pub observation: Observation2D,
    /// The observation of the marker's left/right counterpart in this camera, if any.
    pub swapped: Option<Observation2D>,
}

impl<'a> CameraView<'a> {
    pub fn new(projection: &'a ProjectionMatrix, observation: Observation2D) -> Self {
        Self {
            projection,
            observation,
            swapped: None,
        }
    }

    #[must_use]
    pub fn with_swapped(self, swapped: Option<Observation2D>) -> Self {
        Self { swapped, ..self }
    }
}

/// One camera's input to [`CameraSubsetSelector::triangulate_point`], keyed by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraObservation<'a> {
    pub camera: &'a str,
    pub observation: Option<Observation2D>,
    pub swapped: Option<Observation2D>,
}

impl<'a> CameraObservation<'a> {
    pub fn new(camera: &'a str, observation: Option<Observation2D>) -> Self {
        Self {
            camera,
            observation,
            swapped: None,
        }
    }

    #[must_use]
    pub fn with_swapped(self, swapped: Option<Observation2D>) -> Self {
        Self { swapped, ..self }
    }
}

/// The winning configuration of a search, expressed as indices into the input views.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub point: Point3<f64>,
    pub reprojection_error: f64,
    /// Ascending indices of the views used.
    pub cameras: Vec<usize>,
    /// The subset of `cameras` whose alternate observation was used.
    pub swapped: Vec<usize>,
}

/// Triangulates `cameras` (indices into `views`), using the alternate observation for the
/// indices listed in `swapped`, and returns the point with its mean reprojection error.
///
/// Returns `None` if a swapped camera has no alternate, or if the point or its error is not
/// finite.
pub fn evaluate_subset<T>(
    triangulator: &T,
    views: &[CameraView<'_>],
    cameras: &[usize],
    swapped: &[usize],
) -> Option<(Vector4<f64>, f64)>
where
    T: TriangulatorWeighted,
{
    let observed = |ix: usize| -> Option<Point2<f64>> {
        if swapped.contains(&ix) {
            views[ix].swapped.map(|o| o.point())
        } else {
            Some(views[ix].observation.point())
        }
    };
    if cameras.iter().any(|&ix| observed(ix).is_none()) {
        return None;
    }
    let weighted = cameras.iter().filter_map(|&ix| {
        observed(ix).map(|image| (views[ix].projection, image, views[ix].observation.quality))
    });

    let point = triangulator.triangulate_weighted(weighted.clone());
    if !point.iter().all(|c| c.is_finite()) {
        return None;
    }
    let error = mean_reprojection_error(weighted.map(|(p, image, _)| (p, image)), &point);
    if error.is_finite() {
        Some((point, error))
    } else {
        None
    }
}

#[derive(Debug)]
struct Candidate {
    point: Vector4<f64>,
    error: f64,
    cameras: Vec<usize>,
    swapped: Vec<usize>,
}

/// Searches camera subsets for the one that triangulates a marker with the lowest mean
/// reprojection error.
///
/// The search removes cameras greedily: it evaluates the full set, then every subset with one
/// camera off, then two, and stops after the first level at which the best subset found so far
/// reaches `reprojection_error_threshold`. Subsets never shrink below the camera floor.
///
/// Combinations are enumerated as ascending indices-to-keep, and a candidate only replaces the
/// current best when it is strictly better, so ties go to the first subset found. The result
/// is deterministic for identical inputs.
///
/// If the best subset still misses the threshold and `handle_left_right_swap` is set, a
/// [`LeftRightSwapResolver`] is run on that subset, and its best configuration replaces the
/// subset if strictly better. A configuration that still misses the threshold is reported as
/// [`TriangulationFailure::ErrorThresholdUnmet`] and its point discarded.
#[derive(Debug, Clone)]
pub struct CameraSubsetSelector<T = WeightedDltTriangulator> {
    triangulator: T,
    config: TriangulationConfig,
}

impl CameraSubsetSelector {
    /// Creates a selector using the [`WeightedDltTriangulator`].
    pub fn new(config: TriangulationConfig) -> Result<Self, ConfigError> {
        Self::with_triangulator(WeightedDltTriangulator::new(), config)
    }
}

impl<T> CameraSubsetSelector<T>
where
    T: TriangulatorWeighted,
{
    pub fn with_triangulator(
        triangulator: T,
        config: TriangulationConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            triangulator,
            config,
        })
    }

    pub fn config(&self) -> &TriangulationConfig {
        &self.config
    }

    pub fn triangulator(&self) -> &T {
        &self.triangulator
    }

    /// Runs the search over `views`.
    ///
    /// Views whose primary observation does not pass `min_quality` are excluded up front. The
    /// returned indices refer to positions in `views`.
    pub fn select(&self, views: &[CameraView<'_>]) -> Result<Selection, TriangulationFailure> {
        let threshold = self.config.reprojection_error_threshold;
        let floor = self.config.camera_floor();
        let eligible = views
            .iter()
            .enumerate()
            .filter(|(_, view)| view.observation.passes(self.config.min_quality))
            .map(|(ix, _)| ix)
            .collect::<Vec<usize>>();
        let n = eligible.len();
        if n < floor {
            trace!("{} of {} cameras eligible, {} required", n, views.len(), floor);
            return Err(TriangulationFailure::InsufficientCameras {
                available: n,
                required: floor,
            });
        }

        let mut best: Option<Candidate> = None;
        let mut combinations = Combinations::new(n, n);
        let mut subset = Vec::with_capacity(n);
        for off in 0..=n - floor {
            combinations.reset(n, n - off);
            while let Some(keep) = combinations.next_combination() {
                subset.clear();
                subset.extend(keep.iter().map(|&ix| eligible[ix]));
                let (point, error) =
                    match evaluate_subset(&self.triangulator, views, &subset, &[]) {
                        Some(evaluated) => evaluated,
                        None => {
                            trace!("subset {:?} is degenerate", subset);
                            continue;
                        }
                    };
                trace!("subset {:?}: error {}", subset, error);
                if best.as_ref().map_or(true, |b| error < b.error) {
                    best = Some(Candidate {
                        point,
                        error,
                        cameras: subset.clone(),
                        swapped: vec![],
                    });
                }
            }
            if let Some(b) = best.as_ref().filter(|b| b.error <= threshold) {
                trace!("accepted {:?} with {} cameras off", b.cameras, off);
                break;
            }
        }

        if self.config.handle_left_right_swap {
            if let Some(current) = best.as_mut().filter(|b| b.error > threshold) {
                let outcome = LeftRightSwapResolver::new(&self.triangulator, threshold)
                    .min_quality(self.config.min_quality)
                    .resolve(views, &current.cameras);
                debug!(
                    "swap search over {:?} scanned {} levels",
                    current.cameras, outcome.levels_scanned
                );
                if let Some(swap) = outcome.best.filter(|swap| swap.error < current.error) {
                    debug!(
                        "swapping {:?} lowers error from {} to {}",
                        swap.swapped, current.error, swap.error
                    );
                    current.point = swap.point;
                    current.error = swap.error;
                    current.swapped = swap.swapped;
                }
            }
        }

        match best {
            Some(b) if b.error <= threshold => Ok(Selection {
                point: Point3::new(b.point.x, b.point.y, b.point.z),
                reprojection_error: b.error,
                cameras: b.cameras,
                swapped: b.swapped,
            }),
            best => Err(TriangulationFailure::ErrorThresholdUnmet {
                best_error: best.map(|b| b.error),
            }),
        }
    }

    /// Triangulates one marker from name-keyed observations.
    ///
    /// Cameras without calibration in `calibration`, or without an observation, are treated
    /// as unavailable. Contributing cameras are reported in input order.
    ///
    /// ```
    /// use mocap_core::nalgebra::{Matrix3, Point3, Vector3};
    /// use mocap_core::{CalibrationSet, CameraCalibration, Observation2D, TriangulationConfig};
    /// use mocap_geom::{CameraObservation, CameraSubsetSelector};
    ///
    /// let k = Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0);
    /// let calibration = CalibrationSet::from_cameras(
    ///     ["front", "left", "right"].iter().zip([0.0, 0.6, -0.6]).map(|(name, yaw)| {
    ///         CameraCalibration::from_axis_angle(
    ///             *name,
    ///             k,
    ///             Vector3::new(0.0, yaw, 0.0),
    ///             Vector3::new(0.0, 0.0, 6.0),
    ///         )
    ///     }),
    /// )
    /// .unwrap();
    ///
    /// let marker = Point3::new(0.1, -0.2, 0.3).to_homogeneous();
    /// let observations = calibration.iter().map(|camera| {
    ///     let pixel = camera.projection_matrix().project(&marker);
    ///     CameraObservation::new(&camera.name, Some(Observation2D::new(pixel.x, pixel.y, 0.9)))
    /// });
    ///
    /// let selector = CameraSubsetSelector::new(TriangulationConfig::new()).unwrap();
    /// let result = selector.triangulate_point(observations, &calibration).unwrap();
    /// assert_eq!(result.contributing_cameras, ["front", "left", "right"]);
    /// assert!(result.reprojection_error < 1e-6);
    /// ```
    pub fn triangulate_point<'a, C>(
        &self,
        observations: impl IntoIterator<Item = CameraObservation<'a>>,
        calibration: &C,
    ) -> Result<TriangulationResult, TriangulationFailure>
    where
        C: CalibrationProvider + ?Sized,
    {
        let available = observations
            .into_iter()
            .filter_map(|input| {
                let observation = input.observation?;
                let camera = calibration.camera_data(input.camera)?;
                Some((
                    input.camera,
                    camera.projection_matrix(),
                    observation,
                    input.swapped,
                ))
            })
            .collect::<Vec<_>>();
        let views = available
            .iter()
            .map(|(_, projection, observation, swapped)| {
                CameraView::new(projection, *observation).with_swapped(*swapped)
            })
            .collect::<Vec<_>>();

        let selection = self.select(&views)?;
        let name = |ix: &usize| available[*ix].0.to_owned();
        Ok(TriangulationResult {
            point: selection.point,
            reprojection_error: selection.reprojection_error,
            contributing_cameras: selection.cameras.iter().map(name).collect(),
            swapped_cameras: selection.swapped.iter().map(name).collect(),
        })
    }
}
