// Integration tests for Yabonse Dispatch

use std::sync::Arc;
use yabonse_dispatch::core::{DispatchError, MatchPolicy, Matcher, Notifier};
use yabonse_dispatch::models::{
    Coordinate, DispatchEntity, DriverLocation, DriverRating, DriverRecord, DriverStatus,
    MatchRequest, NotificationKind, NotifyContext,
};
use yabonse_dispatch::services::{MemoryStore, StoreHandle};

const NOW: i64 = 1_760_000_000_000;

fn point(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).unwrap()
}

fn create_test_driver(id: &str, status: DriverStatus, is_online: bool, rating: Option<f64>) -> DriverRecord {
    DriverRecord {
        id: id.to_string(),
        name: Some(format!("Driver {}", id)),
        status,
        is_online,
        rating: rating.map(|average| DriverRating { average, count: 20 }),
        vehicle: None,
    }
}

fn seed(store: &MemoryStore, id: &str, status: DriverStatus, is_online: bool, rating: Option<f64>, at: Coordinate, age_ms: i64) {
    store.insert_driver(create_test_driver(id, status, is_online, rating));
    store.insert_location(id, DriverLocation::new(at, NOW - age_ms).unwrap());
}

fn matcher(store: &Arc<MemoryStore>) -> Matcher<MemoryStore> {
    Matcher::new(Arc::clone(store), MatchPolicy::default())
}

#[tokio::test]
async fn test_integration_end_to_end_matching() {
    let store = Arc::new(MemoryStore::new());
    let pickup = point(-15.4167, 28.2833); // Lusaka

    seed(&store, "close", DriverStatus::Approved, true, Some(4.2), point(-15.42, 28.29), 5_000);
    seed(&store, "closer", DriverStatus::Approved, true, Some(3.9), point(-15.417, 28.284), 5_000);
    seed(&store, "pending", DriverStatus::Pending, true, Some(5.0), point(-15.417, 28.284), 5_000);
    seed(&store, "blocked", DriverStatus::Blocked, true, Some(5.0), point(-15.417, 28.284), 5_000);
    seed(&store, "offline", DriverStatus::Approved, false, Some(5.0), point(-15.417, 28.284), 5_000);
    seed(&store, "stale", DriverStatus::Approved, true, Some(5.0), point(-15.417, 28.284), 301_000);
    seed(&store, "far", DriverStatus::Approved, true, Some(5.0), point(-14.4469, 28.4464), 5_000);
    store.insert_driver(create_test_driver("no_location", DriverStatus::Approved, true, Some(5.0)));

    let request = MatchRequest::new(pickup).with_ride_id("ride-42");
    let result = matcher(&store).find_drivers_at(&request, NOW).await.unwrap();

    let ids: Vec<&str> = result.candidates.iter().map(|c| c.driver.id.as_str()).collect();
    assert_eq!(ids, vec!["closer", "close"]);
    assert_eq!(result.total_eligible, 2);
    assert_eq!(result.drivers_scanned, 8);
    assert_eq!(result.search_radius_km, 10.0);
    assert_eq!(result.pickup, pickup);

    for candidate in &result.candidates {
        assert!(candidate.distance_km <= request.max_radius_km);
        assert_eq!(candidate.driver.status, DriverStatus::Approved);
        assert!(candidate.driver.is_online);
        assert!(candidate.eta_minutes >= 1);
    }
}

#[tokio::test]
async fn test_limit_and_total_eligible() {
    let store = Arc::new(MemoryStore::new());
    for i in 0..7 {
        seed(
            &store,
            &format!("d{}", i),
            DriverStatus::Approved,
            true,
            Some(4.0),
            point(0.0, 0.002 * (i + 1) as f64),
            1_000,
        );
    }

    let request = MatchRequest::new(point(0.0, 0.0)).with_limit(5).unwrap();
    let result = matcher(&store).find_drivers_at(&request, NOW).await.unwrap();

    assert_eq!(result.candidates.len(), 5);
    assert_eq!(result.total_eligible, 7);

    for pair in result.candidates.windows(2) {
        let (x, y) = (&pair[0], &pair[1]);
        assert!(
            x.distance_km < y.distance_km
                || (x.distance_km == y.distance_km && x.driver.rating_value() >= y.driver.rating_value())
        );
    }
}

#[tokio::test]
async fn test_offline_driver_not_counted() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "a", DriverStatus::Approved, true, None, point(0.0, 0.01), 1_000);
    seed(&store, "b", DriverStatus::Approved, false, None, point(0.0, 0.01), 1_000);

    let result = matcher(&store)
        .find_drivers_at(&MatchRequest::new(point(0.0, 0.0)), NOW)
        .await
        .unwrap();

    assert_eq!(result.total_eligible, 1);
    assert_eq!(result.candidates[0].driver.id, "a");
    assert_eq!(result.candidates[0].eta_minutes, 3);
}

#[tokio::test]
async fn test_empty_fleet_is_not_an_error() {
    let store = Arc::new(MemoryStore::new());

    let result = matcher(&store)
        .find_drivers_at(&MatchRequest::new(point(0.0, 0.0)), NOW)
        .await
        .unwrap();

    assert!(result.fleet_is_empty());
    assert!(result.candidates.is_empty());
    assert_eq!(result.total_eligible, 0);
}

#[tokio::test]
async fn test_store_failure_is_upstream_unavailable() {
    let store = Arc::new(MemoryStore::new());
    seed(&store, "a", DriverStatus::Approved, true, None, point(0.0, 0.01), 1_000);
    store.set_fail_reads(true);

    let err = matcher(&store)
        .find_drivers_at(&MatchRequest::new(point(0.0, 0.0)), NOW)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::UpstreamUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_notify_scenario() {
    let store = Arc::new(MemoryStore::new());
    store.insert_driver(create_test_driver("driver-1", DriverStatus::Approved, true, None));
    let notifier = Notifier::new(Arc::clone(&store));

    let context = NotifyContext {
        pickup_address: Some("Main St".to_string()),
        fare: Some(25.0),
        ..Default::default()
    };
    let record = notifier
        .notify("driver-1", NotificationKind::RideRequest, context)
        .await
        .unwrap();

    assert_eq!(record.title, "🚗 New Ride Request!");
    assert_eq!(record.body, "Pickup: Main St\nFare: K25");
    assert!(!record.read);

    let missing = notifier
        .notify("missing-driver", NotificationKind::RideRequest, NotifyContext::default())
        .await
        .unwrap_err();
    assert!(matches!(missing, DispatchError::NotFound { .. }));
}

#[tokio::test]
async fn test_retry_after_partial_failure_completes_marker() {
    let store = Arc::new(MemoryStore::new());
    store.insert_driver(create_test_driver("driver-1", DriverStatus::Approved, true, None));
    let notifier = Notifier::new(Arc::clone(&store));
    let context = NotifyContext {
        delivery_id: Some("delivery-7".to_string()),
        ..Default::default()
    };
    let entity = DispatchEntity::Delivery("delivery-7".to_string());

    store.set_fail_marker_writes(true);
    let err = notifier
        .notify("driver-1", NotificationKind::DeliveryRequest, context.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::PartialNotifyFailure { .. }));
    assert!(store.notified_drivers(&entity).is_empty());

    store.set_fail_marker_writes(false);
    notifier
        .notify("driver-1", NotificationKind::DeliveryRequest, context.clone())
        .await
        .unwrap();
    notifier
        .notify("driver-1", NotificationKind::DeliveryRequest, context)
        .await
        .unwrap();

    assert_eq!(store.notified_drivers(&entity).len(), 1);
    assert_eq!(store.notifications_for("driver-1").len(), 3);
}

#[tokio::test]
async fn test_shared_handle_feeds_matcher_and_notifier() {
    let handle = StoreHandle::new();
    let store = handle.get_or_init(MemoryStore::new);
    let again = handle.get_or_init(MemoryStore::new);
    assert!(Arc::ptr_eq(&store, &again));

    seed(&store, "a", DriverStatus::Approved, true, None, point(0.0, 0.01), 1_000);

    let matcher = Matcher::new(Arc::clone(&store), MatchPolicy::default());
    let notifier = Notifier::new(again);

    let result = matcher
        .find_drivers_at(&MatchRequest::new(point(0.0, 0.0)), NOW)
        .await
        .unwrap();
    let record = notifier
        .notify(&result.candidates[0].driver.id, NotificationKind::RideCancelled, NotifyContext::default())
        .await
        .unwrap();

    assert_eq!(record.driver_id, "a");
    assert_eq!(store.notifications_for("a").len(), 1);
}
