// Unit tests for Yabonse Dispatch

use yabonse_dispatch::core::{
    eligibility::{check_eligibility, is_eligible, Eligibility, IneligibleReason, DEFAULT_FRESHNESS_WINDOW_MS},
    geo::{bounding_box, distance, eta, haversine_distance, round_to_precision},
};
use yabonse_dispatch::models::{Coordinate, DriverLocation, DriverRecord, DriverStatus, MatchRequest};

const NOW: i64 = 1_760_000_000_000;

fn point(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn approved_online_driver() -> DriverRecord {
    DriverRecord {
        id: "driver-a".to_string(),
        name: Some("Chanda".to_string()),
        status: DriverStatus::Approved,
        is_online: true,
        rating: None,
        vehicle: None,
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(-15.4167, 28.2833, -15.4167, 28.2833);
    assert_eq!(distance, 0.0);
}

#[test]
fn test_distance_lusaka_to_kabwe() {
    // Lusaka to Kabwe is roughly 110-140 km as the crow flies
    let d = distance(point(-15.4167, 28.2833), point(-14.4469, 28.4464));
    assert!(d > 100.0 && d < 140.0, "got {}", d);
}

#[test]
fn test_distance_symmetry_over_sample() {
    let points = [
        point(0.0, 0.0),
        point(-15.4167, 28.2833),
        point(51.5074, -0.1278),
        point(-33.8688, 151.2093),
        point(89.9, 179.9),
        point(-89.9, -179.9),
    ];

    for a in points {
        assert_eq!(distance(a, a), 0.0);
        for b in points {
            let ab = distance(a, b);
            let ba = distance(b, a);
            assert!((ab - ba).abs() < 1e-9, "{} vs {} for {} / {}", ab, ba, a, b);
            if a != b {
                assert!(ab > 0.0);
            }
        }
    }
}

#[test]
fn test_eta_never_zero_for_positive_distance() {
    assert_eq!(eta(0.0), 0);
    for d in [1e-9, 0.01, 0.5, 0.49999, 1.0, 7.3, 250.0] {
        assert!(eta(d) >= 1, "eta({}) was zero", d);
    }
}

#[test]
fn test_display_rounding() {
    assert_eq!(round_to_precision(1.111949), 1.11);
    assert_eq!(round_to_precision(2.005001), 2.01);
    assert_eq!(round_to_precision(0.0), 0.0);
}

#[test]
fn test_bounding_box_contains_every_point_in_radius() {
    let center = point(-15.4167, 28.2833);
    let bbox = bounding_box(center, 10.0);

    // Points ~9.9 km away in the four cardinal directions
    for candidate in [
        point(-15.4167 + 0.089, 28.2833),
        point(-15.4167 - 0.089, 28.2833),
        point(-15.4167, 28.2833 + 0.092),
        point(-15.4167, 28.2833 - 0.092),
    ] {
        assert!(distance(center, candidate) < 10.0);
        assert!(bbox.contains(candidate), "{} outside box", candidate);
    }

    assert!(!bbox.contains(point(-15.0, 28.2833)));
}

#[test]
fn test_eligibility_scenario_driver_a() {
    let driver = approved_online_driver();
    let location = DriverLocation::new(point(0.0, 0.01), NOW - 30_000).unwrap();
    let request = MatchRequest::new(point(0.0, 0.0));

    match check_eligibility(&driver, Some(&location), &request, DEFAULT_FRESHNESS_WINDOW_MS, NOW) {
        Eligibility::Eligible { distance_km } => {
            assert_eq!(round_to_precision(distance_km), 1.11);
            assert_eq!(eta(distance_km), 3);
        }
        other => panic!("driver A should be eligible, got {:?}", other),
    }
}

#[test]
fn test_eligibility_scenario_driver_b_offline() {
    let mut driver = approved_online_driver();
    driver.is_online = false;
    let location = DriverLocation::new(point(0.0, 0.01), NOW - 30_000).unwrap();
    let request = MatchRequest::new(point(0.0, 0.0));

    assert_eq!(
        check_eligibility(&driver, Some(&location), &request, DEFAULT_FRESHNESS_WINDOW_MS, NOW),
        Eligibility::Ineligible(IneligibleReason::Offline)
    );
}

#[test]
fn test_stale_location_never_eligible() {
    let driver = approved_online_driver();
    let request = MatchRequest::new(point(0.0, 0.0));

    let stale = DriverLocation::new(point(0.0, 0.001), NOW - 600_000).unwrap();
    assert!(!is_eligible(&driver, Some(&stale), &request, DEFAULT_FRESHNESS_WINDOW_MS, NOW));

    // A wider window accepts the same location
    assert!(is_eligible(&driver, Some(&stale), &request, 900_000, NOW));
}
