use criterion::{Criterion, criterion_group, criterion_main};
use flyby::geometry::{CameraIntrinsics, FieldOfView, camera_vectors, ra_dec, track_to};
use flyby::physics::math::Vector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;

fn random_positions(count: usize, seed: u64) -> Vec<Vector> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let theta = rng.random_range(0.0..std::f64::consts::TAU);
            let z: f64 = rng.random_range(-0.99..0.99);
            let r = libm::sqrt(1.0 - z * z);
            Vector::new(r * libm::cos(theta), r * libm::sin(theta), z) * 300.0
        })
        .collect()
}

fn intrinsics() -> CameraIntrinsics {
    CameraIntrinsics {
        lens: 230.0,
        sensor_width: 3.45e-3 * 2464.0,
        res_x: 2464,
        res_y: 2056,
    }
}

fn bench_pointing(c: &mut Criterion) {
    let positions = random_positions(1_000, 42);
    let intrinsics = intrinsics();

    c.bench_function("track_to", |b| {
        b.iter(|| {
            for position in &positions {
                let _ = black_box(track_to(*position, Vector::ZERO));
            }
        })
    });

    c.bench_function("field_of_view", |b| {
        b.iter(|| {
            for position in &positions {
                if let Ok(orientation) = track_to(*position, Vector::ZERO) {
                    if let Ok(geometry) = camera_vectors(orientation, &intrinsics) {
                        black_box(FieldOfView::from_geometry(&geometry));
                    }
                }
            }
        })
    });

    c.bench_function("ra_dec", |b| {
        b.iter(|| {
            for position in &positions {
                black_box(ra_dec(*position));
            }
        })
    });
}

criterion_group!(benches, bench_pointing);
criterion_main!(benches);
