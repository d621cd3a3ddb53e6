use crate::{evaluate_subset, CameraView, Combinations, WeightedDltTriangulator};
use log::debug;
use mocap_core::{nalgebra::Vector4, TriangulatorWeighted};

/// One swapped configuration that produced a finite point.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapCandidate {
    pub point: Vector4<f64>,
    pub error: f64,
    /// Indices into the views whose alternate observation was used, ascending.
    pub swapped: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapOutcome {
    /// The lowest-error swapped configuration, if any produced a finite point.
    pub best: Option<SwapCandidate>,
    /// How many swap counts (1, 2, ...) were enumerated before stopping.
    pub levels_scanned: usize,
}

/// Tries substituting the left/right counterpart detection in a minority of cameras.
///
/// Upstream 2d pose estimators regularly confuse symmetric landmarks such as the left and
/// right wrist in a few views. Given a fixed camera set of size `m`, the resolver swaps one
/// camera, then two, and so on while `2 * n_swapped < m`, so that the majority of cameras are
/// never overridden. It stops after the first swap count whose best configuration reaches
/// the threshold.
///
/// Triangulation weights stay those of the primary observations.
#[derive(Debug, Clone)]
pub struct LeftRightSwapResolver<T = WeightedDltTriangulator> {
    triangulator: T,
    threshold: f64,
    min_quality: f64,
}

impl<T> LeftRightSwapResolver<T>
where
    T: TriangulatorWeighted,
{
    pub fn new(triangulator: T, threshold: f64) -> Self {
        Self {
            triangulator,
            threshold,
            min_quality: 0.0,
        }
    }

    /// Alternate observations below this quality are never swapped in.
    ///
    /// Default is `0.0`, which still excludes unusable observations.
    #[must_use]
    pub fn min_quality(self, min_quality: f64) -> Self {
        Self {
            min_quality,
            ..self
        }
    }

    /// Searches swap configurations of `cameras`, a set of indices into `views`.
    pub fn resolve(&self, views: &[CameraView<'_>], cameras: &[usize]) -> SwapOutcome {
        let m = cameras.len();
        let swappable = cameras
            .iter()
            .map(|&ix| {
                views[ix]
                    .swapped
                    .map_or(false, |alternate| alternate.passes(self.min_quality))
            })
            .collect::<Vec<bool>>();

        let mut best: Option<SwapCandidate> = None;
        let mut levels_scanned = 0;
        let mut combinations = Combinations::new(m, 0);
        let mut swapped = Vec::with_capacity(m);
        let mut n_swapped = 1;
        while 2 * n_swapped < m {
            levels_scanned += 1;
            combinations.reset(m, n_swapped);
            while let Some(chosen) = combinations.next_combination() {
                if !chosen.iter().all(|&c| swappable[c]) {
                    continue;
                }
                swapped.clear();
                swapped.extend(chosen.iter().map(|&c| cameras[c]));
                let (point, error) =
                    match evaluate_subset(&self.triangulator, views, cameras, &swapped) {
                        Some(evaluated) => evaluated,
                        None => continue,
                    };
                debug!("swapping {:?} of {:?}: error {}", swapped, cameras, error);
                if best.as_ref().map_or(true, |b| error < b.error) {
                    best = Some(SwapCandidate {
                        point,
                        error,
                        swapped: swapped.clone(),
                    });
                }
            }
            if best.as_ref().map_or(false, |b| b.error <= self.threshold) {
                break;
            }
            n_swapped += 1;
        }

        SwapOutcome {
            best,
            levels_scanned,
        }
    }
}
