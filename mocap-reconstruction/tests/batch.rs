use approx::assert_relative_eq;
use mocap_core::nalgebra::{Matrix3, Point3, Vector3};
use mocap_core::{
    CalibrationSet, CameraCalibration, Observation2D, TriangulationConfig, TriangulationFailure,
};
use mocap_reconstruction::{
    load_calibration_file, FrameMarkerOrchestrator, ObservationTable, Skeleton, TrackTable,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::sync::atomic::AtomicBool;

const FRAMES: std::ops::Range<i32> = 100..110;

fn calibration() -> CalibrationSet {
    let k = Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0);
    CalibrationSet::from_cameras(
        [
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.6, 0.0),
            Vector3::new(0.0, -0.6, 0.0),
            Vector3::new(0.5, 0.0, 0.0),
            Vector3::new(-0.5, 0.2, 0.0),
        ]
        .into_iter()
        .enumerate()
        .map(|(ix, r)| {
            CameraCalibration::from_axis_angle(
                format!("cam{}", ix),
                k,
                r,
                Vector3::new(0.0, 0.0, 6.0),
            )
        }),
    )
    .unwrap()
}

/// Where a marker is at a frame: a small circle per marker.
fn position(marker: usize, frame: i32) -> Point3<f64> {
    let phase = 0.1 * frame as f64 + marker as f64;
    Point3::new(
        0.3 * phase.cos() - 0.1 * marker as f64,
        0.2 * phase.sin(),
        0.05 * marker as f64,
    )
}

fn observe(calibration: &CalibrationSet, camera: &str, point: &Point3<f64>) -> Observation2D {
    let pixel = calibration
        .get(camera)
        .unwrap()
        .projection_matrix()
        .project(&point.to_homogeneous());
    Observation2D::new(pixel.x, pixel.y, 0.9)
}

#[test]
fn batch_over_skeleton() {
    let _ = pretty_env_logger::try_init_timed();
    let calibration = calibration();
    let skeleton = Skeleton::new("upper", ["Neck", "LShoulder", "RShoulder"]);
    let mut rng = Pcg64::seed_from_u64(7);
    let mut observations = ObservationTable::new();
    for (m, marker) in skeleton.markers().iter().enumerate() {
        for frame in FRAMES {
            for camera in calibration.iter() {
                // cam4 never sees the neck.
                if marker == "Neck" && camera.name == "cam4" {
                    continue;
                }
                let mut observation = observe(&calibration, &camera.name, &position(m, frame));
                observation.x += rng.gen_range(-0.3..0.3);
                observation.y += rng.gen_range(-0.3..0.3);
                observations.insert(&*camera.name, &**marker, frame, observation);
            }
        }
    }
    // Only one camera sees the right shoulder on the last frame.
    for camera in ["cam1", "cam2", "cam3", "cam4"] {
        observations.insert(
            camera,
            "RShoulder",
            FRAMES.end - 1,
            Observation2D::new(0.0, 0.0, 0.0),
        );
    }

    let orchestrator =
        FrameMarkerOrchestrator::new(&calibration, TriangulationConfig::new()).unwrap();
    let batch = orchestrator.run(&observations, &skeleton, FRAMES);

    assert_eq!(batch.first_frame, FRAMES.start);
    assert_eq!(batch.cameras, ["cam0", "cam1", "cam2", "cam3", "cam4"]);
    assert_eq!(batch.summary.attempted, 30);
    assert_eq!(batch.summary.succeeded, 29);
    assert_eq!(batch.summary.insufficient_cameras, 1);
    assert!(!batch.summary.cancelled);

    for (m, marker) in skeleton.markers().iter().enumerate() {
        let track = batch.track(marker).unwrap();
        assert_eq!(track.len(), FRAMES.len());
        for (f, frame) in track.frames().enumerate() {
            if marker == "RShoulder" && frame == FRAMES.end - 1 {
                assert!(track.points[f].x.is_nan());
                assert!(track.errors[f].is_nan());
                assert_eq!(track.camera_counts[f], 0);
                assert!(track.contributions[f].iter().all(|&c| !c));
                continue;
            }
            assert_relative_eq!(track.points[f], position(m, frame), epsilon = 1e-2);
            assert!(track.errors[f] < 1.0);
            let expected = if marker == "Neck" { 4 } else { 5 };
            assert_eq!(track.camera_counts[f], expected);
            assert_eq!(track.contributions[f][4], marker != "Neck");
        }
    }

    let mut sink = TrackTable::new();
    batch.write_to(&mut sink);
    assert_eq!(sink.len(), 3);
    assert_eq!(sink.get("LShoulder"), batch.track("LShoulder"));
}

fn confused_wrists(calibration: &CalibrationSet) -> ObservationTable {
    let left = Point3::new(0.1, -0.2, 0.3);
    let right = Point3::new(-0.3, -0.1, 0.25);
    let mut observations = ObservationTable::new();
    for camera in calibration.iter() {
        let (l, r) = if camera.name == "cam4" {
            (right, left)
        } else {
            (left, right)
        };
        observations.insert(&*camera.name, "LWrist", 0, observe(calibration, &camera.name, &l));
        observations.insert(&*camera.name, "RWrist", 0, observe(calibration, &camera.name, &r));
    }
    observations
}

#[test]
fn left_right_swap() {
    let _ = pretty_env_logger::try_init_timed();
    let calibration = calibration();
    let observations = confused_wrists(&calibration);
    let skeleton = Skeleton::new("wrists", ["LWrist", "RWrist"]);
    let config = TriangulationConfig::new()
        .reprojection_error_threshold(5.0)
        .min_cameras_for_triangulation(5);

    let orchestrator = FrameMarkerOrchestrator::new(&calibration, config).unwrap();
    assert!(matches!(
        orchestrator.triangulate(&observations, &skeleton, "LWrist", 0),
        Err(TriangulationFailure::ErrorThresholdUnmet { .. })
    ));

    let orchestrator =
        FrameMarkerOrchestrator::new(&calibration, config.handle_left_right_swap(true)).unwrap();
    let left = orchestrator
        .triangulate(&observations, &skeleton, "LWrist", 0)
        .unwrap();
    assert_eq!(left.swapped_cameras, ["cam4"]);
    assert_eq!(left.contributing_cameras.len(), 5);
    assert_relative_eq!(left.point, Point3::new(0.1, -0.2, 0.3), epsilon = 1e-3);

    let batch = orchestrator.run(&observations, &skeleton, 0..1);
    assert_eq!(batch.summary.succeeded, 2);
    let right = batch.track("RWrist").unwrap();
    assert_relative_eq!(right.points[0], Point3::new(-0.3, -0.1, 0.25), epsilon = 1e-3);
}

#[test]
fn confused_camera_is_dropped_without_swap() {
    let calibration = calibration();
    let observations = confused_wrists(&calibration);
    let skeleton = Skeleton::new("wrists", ["LWrist", "RWrist"]);
    let config = TriangulationConfig::new().reprojection_error_threshold(5.0);
    let orchestrator = FrameMarkerOrchestrator::new(&calibration, config).unwrap();
    let batch = orchestrator.run(&observations, &skeleton, 0..1);
    for (_, track) in &batch.tracks {
        assert_eq!(track.camera_counts, [4]);
        assert_eq!(track.contributions[0], [true, true, true, true, false]);
    }
}

#[test]
fn cancelled_batch_starts_nothing() {
    let calibration = calibration();
    let observations = confused_wrists(&calibration);
    let skeleton = Skeleton::new("wrists", ["LWrist", "RWrist"]);
    let orchestrator =
        FrameMarkerOrchestrator::new(&calibration, TriangulationConfig::new()).unwrap();
    let batch =
        orchestrator.run_cancellable(&observations, &skeleton, 0..3, &AtomicBool::new(true));
    assert!(batch.summary.cancelled);
    assert_eq!(batch.summary.skipped, 6);
    assert_eq!(batch.summary.attempted, 0);
    assert_eq!(batch.tracks.len(), 2);
    assert!(batch
        .tracks
        .iter()
        .all(|(_, track)| track.camera_counts.iter().all(|&count| count == 0)));
}

#[test]
fn invalid_config_is_rejected() {
    let calibration = calibration();
    let config = TriangulationConfig::new().min_quality(-0.5);
    assert!(FrameMarkerOrchestrator::new(&calibration, config).is_err());
}

#[test]
fn calibration_file_drives_a_batch() {
    let path =
        std::env::temp_dir().join(format!("mocap-calibration-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{
            "cam_a": {
                "matrix": [[1000, 0, 640], [0, 1000, 360], [0, 0, 1]],
                "rotation": [0.0, 0.0, 0.0],
                "translation": [0.0, 0.0, 6.0]
            },
            "cam_b": {
                "matrix": [[1000, 0, 640], [0, 1000, 360], [0, 0, 1]],
                "rotation": [0.0, 0.6, 0.0],
                "translation": [0.0, 0.0, 6.0]
            },
            "metadata": { "error": 0.12 }
        }"#,
    )
    .unwrap();
    let calibration = load_calibration_file(&path);
    std::fs::remove_file(&path).unwrap();
    let calibration = calibration.unwrap();
    assert_eq!(calibration.len(), 2);

    let nose = Point3::new(0.05, 0.1, -0.2);
    let mut observations = ObservationTable::new();
    for camera in calibration.iter() {
        observations.insert(&*camera.name, "Nose", 0, observe(&calibration, &camera.name, &nose));
    }
    let orchestrator =
        FrameMarkerOrchestrator::new(&calibration, TriangulationConfig::new()).unwrap();
    let result = orchestrator
        .triangulate(&observations, &Skeleton::halpe_26(), "Nose", 0)
        .unwrap();
    assert_eq!(result.contributing_cameras, ["cam_a", "cam_b"]);
    assert_relative_eq!(result.point, nose, epsilon = 1e-6);
}
