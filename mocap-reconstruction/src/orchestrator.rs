use crate::Skeleton;
use itertools::iproduct;
use log::*;
use mocap_core::{
    nalgebra::Point3, CalibrationProvider, ConfigError, MarkerTrack, ObservationSource,
    ProjectionMatrix, TriangulationConfig, TriangulationFailure, TriangulationResult,
    TriangulationSink,
};
use mocap_geom::{CameraSubsetSelector, CameraView};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Counts of how each (marker, frame) slot of a batch ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Slots for which a triangulation was attempted.
    pub attempted: usize,
    pub succeeded: usize,
    pub insufficient_cameras: usize,
    pub threshold_unmet: usize,
    /// Slots never started because the batch was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
}

impl BatchSummary {
    fn record(&mut self, slot: &Slot) {
        match slot {
            Slot::Solved(_) => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            Slot::Failed(TriangulationFailure::InsufficientCameras { .. }) => {
                self.attempted += 1;
                self.insufficient_cameras += 1;
            }
            Slot::Failed(TriangulationFailure::ErrorThresholdUnmet { .. }) => {
                self.attempted += 1;
                self.threshold_unmet += 1;
            }
            Slot::NotStarted => {
                self.skipped += 1;
                self.cancelled = true;
            }
        }
    }
}

/// The tracks of every marker of a skeleton over one frame range.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulationBatch {
    pub first_frame: i32,
    /// Camera names in the order of each track's contribution flags.
    pub cameras: Vec<String>,
    /// One track per skeleton marker, in skeleton order.
    pub tracks: Vec<(String, MarkerTrack)>,
    pub summary: BatchSummary,
}

impl TriangulationBatch {
    pub fn track(&self, marker: &str) -> Option<&MarkerTrack> {
        self.tracks
            .iter()
            .find(|(name, _)| name == marker)
            .map(|(_, track)| track)
    }

    /// Hands every track to `sink`, one marker at a time.
    pub fn write_to(&self, sink: &mut impl TriangulationSink) {
        for (marker, track) in &self.tracks {
            sink.write_track(marker, track);
        }
    }
}

#[derive(Debug)]
struct Solved {
    point: Point3<f64>,
    error: f64,
    /// Calibration indices.
    cameras: Vec<usize>,
    swapped: Vec<usize>,
}

#[derive(Debug)]
enum Slot {
    Solved(Solved),
    Failed(TriangulationFailure),
    NotStarted,
}

/// Triangulates every marker of a skeleton on every frame of a range.
///
/// Projection matrices are built once, when the orchestrator is created. Each (marker, frame)
/// slot is independent of the others; with the `rayon` feature the slots are processed in
/// parallel and collected in order, so the output does not depend on scheduling.
///
/// A failed slot never aborts the batch. It is recorded in its track as a `NaN` point and
/// error with no contributing cameras.
#[derive(Debug, Clone)]
pub struct FrameMarkerOrchestrator {
    cameras: Vec<String>,
    projections: Vec<ProjectionMatrix>,
    selector: CameraSubsetSelector,
}

impl FrameMarkerOrchestrator {
    /// Validates `config` and caches the projection matrix of every camera in `calibration`.
    pub fn new<C>(calibration: &C, config: TriangulationConfig) -> Result<Self, ConfigError>
    where
        C: CalibrationProvider + ?Sized,
    {
        let selector = CameraSubsetSelector::new(config)?;
        let (cameras, projections): (Vec<String>, Vec<ProjectionMatrix>) = calibration
            .camera_names()
            .into_iter()
            .filter_map(|name| {
                let camera = calibration.camera_data(name);
                if camera.is_none() {
                    warn!("camera {} is listed but has no calibration", name);
                }
                camera.map(|camera| (name.to_owned(), camera.projection_matrix()))
            })
            .unzip();
        debug!("cached projection matrices for cameras {:?}", cameras);
        Ok(Self {
            cameras,
            projections,
            selector,
        })
    }

    /// Camera names in calibration order.
    pub fn cameras(&self) -> &[String] {
        &self.cameras
    }

    pub fn config(&self) -> &TriangulationConfig {
        self.selector.config()
    }

    /// Triangulates a single marker on a single frame.
    pub fn triangulate<S>(
        &self,
        source: &S,
        skeleton: &Skeleton,
        marker: &str,
        frame: i32,
    ) -> Result<TriangulationResult, TriangulationFailure>
    where
        S: ObservationSource + ?Sized,
    {
        let solved = self.solve(source, marker, skeleton.counterpart(marker), frame)?;
        let names = |cameras: &[usize]| {
            cameras
                .iter()
                .map(|&ix| self.cameras[ix].clone())
                .collect::<Vec<String>>()
        };
        Ok(TriangulationResult {
            point: solved.point,
            reprojection_error: solved.error,
            contributing_cameras: names(&solved.cameras),
            swapped_cameras: names(&solved.swapped),
        })
    }

    /// Triangulates every marker of `skeleton` on every frame in `frames`.
    pub fn run<S>(&self, source: &S, skeleton: &Skeleton, frames: Range<i32>) -> TriangulationBatch
    where
        S: ObservationSource + Sync + ?Sized,
    {
        self.run_cancellable(source, skeleton, frames, &AtomicBool::new(false))
    }

    /// Like [`FrameMarkerOrchestrator::run`], but stops starting new slots once `cancel` is set.
    ///
    /// Slots already in progress finish. Slots never started are recorded as failures and
    /// counted in [`BatchSummary::skipped`].
    pub fn run_cancellable<S>(
        &self,
        source: &S,
        skeleton: &Skeleton,
        frames: Range<i32>,
        cancel: &AtomicBool,
    ) -> TriangulationBatch
    where
        S: ObservationSource + Sync + ?Sized,
    {
        let frame_count = frames.len();
        let twins = skeleton
            .markers()
            .iter()
            .map(|marker| skeleton.counterpart(marker))
            .collect::<Vec<Option<&str>>>();
        let work = iproduct!(0..skeleton.len(), frames.clone()).collect::<Vec<(usize, i32)>>();
        debug!(
            "triangulating {} markers over frames {:?}",
            skeleton.len(),
            frames
        );

        let process = |&(marker, frame): &(usize, i32)| {
            if cancel.load(Ordering::Relaxed) {
                return Slot::NotStarted;
            }
            let name = &skeleton.markers()[marker];
            match self.solve(source, name, twins[marker], frame) {
                Ok(solved) => Slot::Solved(solved),
                Err(failure) => {
                    trace!("{} at frame {}: {}", name, frame, failure);
                    Slot::Failed(failure)
                }
            }
        };
        #[cfg(not(feature = "rayon"))]
        let slots = work.iter().map(process).collect::<Vec<Slot>>();
        #[cfg(feature = "rayon")]
        let slots = work.par_iter().map(process).collect::<Vec<Slot>>();

        let mut summary = BatchSummary::default();
        let mut tracks = Vec::with_capacity(skeleton.len());
        for (ix, marker) in skeleton.markers().iter().enumerate() {
            let mut track = MarkerTrack::failed(frames.start, frame_count, self.cameras.len());
            let marker_slots = &slots[ix * frame_count..(ix + 1) * frame_count];
            for (f, slot) in marker_slots.iter().enumerate() {
                summary.record(slot);
                if let Slot::Solved(solved) = slot {
                    track.points[f] = solved.point;
                    track.errors[f] = solved.error;
                    track.camera_counts[f] = solved.cameras.len();
                    for &camera in &solved.cameras {
                        track.contributions[f][camera] = true;
                    }
                }
            }
            tracks.push((marker.clone(), track));
        }

        if summary.cancelled {
            warn!(
                "batch cancelled with {} of {} marker frames not started",
                summary.skipped,
                work.len()
            );
        }
        info!(
            "triangulated {} of {} marker frames ({} with too few cameras, {} over threshold)",
            summary.succeeded,
            summary.attempted,
            summary.insufficient_cameras,
            summary.threshold_unmet
        );

        TriangulationBatch {
            first_frame: frames.start,
            cameras: self.cameras.clone(),
            tracks,
            summary,
        }
    }

    fn solve<S>(
        &self,
        source: &S,
        marker: &str,
        twin: Option<&str>,
        frame: i32,
    ) -> Result<Solved, TriangulationFailure>
    where
        S: ObservationSource + ?Sized,
    {
        let twin = twin.filter(|_| self.config().handle_left_right_swap);
        let mut calibration_indices = Vec::with_capacity(self.cameras.len());
        let mut views = Vec::with_capacity(self.cameras.len());
        for (ix, (camera, projection)) in self.cameras.iter().zip(&self.projections).enumerate() {
            if let Some(observation) = source.observation(camera, marker, frame) {
                let swapped = twin.and_then(|twin| source.observation(camera, twin, frame));
                calibration_indices.push(ix);
                views.push(CameraView::new(projection, observation).with_swapped(swapped));
            }
        }

        let selection = self.selector.select(&views)?;
        let to_calibration = |views: &[usize]| {
            views
                .iter()
                .map(|&view| calibration_indices[view])
                .collect::<Vec<usize>>()
        };
        Ok(Solved {
            point: selection.point,
            error: selection.reprojection_error,
            cameras: to_calibration(&selection.cameras),
            swapped: to_calibration(&selection.swapped),
        })
    }
}
