use criterion::{criterion_group, criterion_main, Criterion};
use mocap_core::nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use mocap_core::{Observation2D, ProjectionMatrix, TriangulationConfig, TriangulatorWeighted};
use mocap_geom::{CameraSubsetSelector, CameraView, WeightedDltTriangulator};

fn rig(cameras: usize) -> Vec<ProjectionMatrix> {
    let k = Matrix3::new(1000.0, 0.0, 640.0, 0.0, 1000.0, 360.0, 0.0, 0.0, 1.0);
    (0..cameras)
        .map(|ix| {
            let yaw = std::f64::consts::TAU * ix as f64 / cameras as f64;
            ProjectionMatrix::from_parts(
                &k,
                &Rotation3::new(Vector3::new(0.2, yaw, 0.0)),
                &Vector3::new(0.0, 0.0, 6.0),
            )
        })
        .collect()
}

fn views(projections: &[ProjectionMatrix], outliers: usize) -> Vec<CameraView<'_>> {
    let marker = Point3::new(0.1, -0.2, 0.3).to_homogeneous();
    projections
        .iter()
        .enumerate()
        .map(|(ix, p)| {
            let pixel = p.project(&marker);
            let offset = if ix < outliers { 90.0 } else { 0.0 };
            CameraView::new(p, Observation2D::new(pixel.x + offset, pixel.y, 0.9))
        })
        .collect()
}

fn triangulate(c: &mut Criterion) {
    let projections = rig(8);
    let views = views(&projections, 0);
    let triangulator = WeightedDltTriangulator::new();
    c.bench_function("triangulate_weighted_8", |b| {
        b.iter(|| {
            triangulator.triangulate_weighted(
                views
                    .iter()
                    .map(|v| (v.projection, v.observation.point(), v.observation.quality)),
            )
        })
    });
}

fn select(c: &mut Criterion) {
    let projections = rig(8);
    let clean = views(&projections, 0);
    let noisy = views(&projections, 2);
    let selector = CameraSubsetSelector::new(TriangulationConfig::new()).unwrap();
    c.bench_function("select_8_clean", |b| b.iter(|| selector.select(&clean)));
    c.bench_function("select_8_two_outliers", |b| {
        b.iter(|| selector.select(&noisy))
    });
}

criterion_group!(
    name = geom;
    config = Criterion::default().sample_size(10);
    targets = triangulate, select
);
criterion_main!(geom);
