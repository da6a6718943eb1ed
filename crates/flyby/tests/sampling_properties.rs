//! Property sweeps over randomly drawn sample schedules
//!
//! Windows, step counts and warp factors come from a seeded generator so a
//! failure always reproduces.

use flyby::physics::math::{ASTRONOMICAL_UNIT, MU_SUN, SECONDS_PER_DAY, Scalar};
use flyby::physics::orbit::KeplerianElements;
use flyby::propagation::{DateDetector, KeplerianPropagator, Propagator};
use flyby::recorder::EncounterRecorder;
use flyby::sampling::{MIN_MATCH_TOLERANCE, SamplePolicy, build_schedule};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const CASES: usize = 200;

fn random_policy(rng: &mut ChaCha8Rng) -> SamplePolicy {
    if rng.random_bool(0.5) {
        SamplePolicy::Linear
    } else {
        SamplePolicy::SinhWarp {
            factor: rng.random_range(0.1..6.0),
        }
    }
}

#[test]
fn test_schedules_are_ordered_and_span_the_window() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..CASES {
        let start: Scalar = rng.random_range(-1.0e6..1.0e6);
        let duration: Scalar = rng.random_range(10.0..1.0e4);
        let steps = rng.random_range(2..200);
        let policy = random_policy(&mut rng);

        let schedule = build_schedule(start, start + duration, steps, policy).unwrap();
        let instants = schedule.instants();

        assert_eq!(instants.len(), steps);
        assert_eq!(instants[0], start);
        assert_eq!(instants[steps - 1], start + duration);
        assert!(
            instants.windows(2).all(|pair| pair[0] < pair[1]),
            "{policy} schedule over {duration} s with {steps} steps is not increasing"
        );
        assert!(schedule.tolerance() >= MIN_MATCH_TOLERANCE);
    }
}

#[test]
fn test_sinh_schedules_are_symmetric_about_the_midpoint() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for _ in 0..CASES {
        let duration: Scalar = rng.random_range(10.0..1.0e4);
        let steps = rng.random_range(2..100);
        let factor = rng.random_range(0.1..6.0);

        let schedule = build_schedule(
            -duration / 2.0,
            duration / 2.0,
            steps,
            SamplePolicy::SinhWarp { factor },
        )
        .unwrap();
        let offsets: Vec<Scalar> = schedule.offsets_from_midpoint().collect();

        for (early, late) in offsets.iter().zip(offsets.iter().rev()) {
            assert!(
                (early + late).abs() < 1e-9 * duration,
                "factor {factor}, {steps} steps: {early} and {late} are not mirrored"
            );
        }
    }
}

#[test]
fn test_sinh_schedules_concentrate_near_the_midpoint() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);

    for _ in 0..CASES {
        let duration: Scalar = rng.random_range(10.0..1.0e4);
        let steps = rng.random_range(5..100);
        let factor = rng.random_range(1.0..6.0);

        let schedule =
            build_schedule(0.0, duration, steps, SamplePolicy::SinhWarp { factor }).unwrap();
        let instants = schedule.instants();

        let edge_gap = instants[1] - instants[0];
        let middle = steps / 2;
        let middle_gap = instants[middle] - instants[middle - 1];

        assert!(
            middle_gap < edge_gap,
            "factor {factor}, {steps} steps: middle gap {middle_gap} not below edge gap {edge_gap}"
        );
    }
}

#[test]
fn test_detector_records_every_instant_of_random_schedules() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let elements = KeplerianElements {
        semi_major_axis: 1.644 * ASTRONOMICAL_UNIT,
        eccentricity: 0.384,
        inclination: 3.4,
        right_ascension_of_ascending_node: 73.2,
        argument_of_periapsis: 319.3,
        mean_anomaly: 57.3,
    };

    for _ in 0..20 {
        let half_span: Scalar = rng.random_range(1.0..400.0) * SECONDS_PER_DAY;
        let steps = rng.random_range(2..300);
        let policy = random_policy(&mut rng);
        let schedule = build_schedule(-half_span, half_span, steps, policy).unwrap();

        let mut propagator = KeplerianPropagator::from_elements(&elements, MU_SUN, 0.0).unwrap();
        let mut detector = DateDetector::new(schedule.clone(), EncounterRecorder::new("asteroid"));
        propagator
            .propagate(-half_span, half_span, &mut detector)
            .unwrap();

        assert!(detector.is_exhausted());
        let records = detector.into_handler().into_records();
        assert_eq!(records.len(), steps);
        for (record, instant) in records.iter().zip(schedule.instants()) {
            assert_eq!(record.instant, *instant);
            assert!(record.position.is_finite());
        }
    }
}
