use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use crate::core::error::DispatchError;
use crate::models::{NotificationKind, NotificationRecord, NotifiedMarker, NotifyContext};
use crate::services::DocumentStore;

/// Build the title and body shown to the driver
///
/// Unknown kinds get the generic app title rather than an error.
pub fn render_message(kind: &NotificationKind, context: &NotifyContext) -> (String, String) {
    let (title, body) = match kind {
        NotificationKind::RideRequest => ("🚗 New Ride Request!", request_body(context)),
        NotificationKind::RideCancelled => (
            "❌ Ride Cancelled",
            "The customer has cancelled the ride request".to_string(),
        ),
        NotificationKind::DeliveryRequest => ("📦 New Delivery Request!", request_body(context)),
        NotificationKind::DeliveryCancelled => (
            "❌ Delivery Cancelled",
            "The sender has cancelled the delivery request".to_string(),
        ),
        NotificationKind::Other(_) => ("YABONSE", "You have a new notification".to_string()),
    };

    (title.to_string(), body)
}

fn request_body(context: &NotifyContext) -> String {
    let pickup = context
        .pickup_address
        .as_deref()
        .filter(|address| !address.is_empty())
        .unwrap_or("Unknown");
    let fare = context.fare.filter(|fare| fare.is_finite()).unwrap_or(0.0);

    format!("Pickup: {}\nFare: K{}", pickup, fare)
}

/// Sends dispatch notifications to drivers
///
/// Each call writes the driver-facing record and, for ride and delivery
/// requests, a notified-driver marker on the entity. The two writes are not
/// atomic; a failed second write is reported as `PartialNotifyFailure`.
pub struct Notifier<S> {
    store: Arc<S>,
}

impl<S> Clone for Notifier<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: DocumentStore> Notifier<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn notify(
        &self,
        driver_id: &str,
        kind: NotificationKind,
        context: NotifyContext,
    ) -> Result<NotificationRecord, DispatchError> {
        if driver_id.is_empty() {
            return Err(DispatchError::InvalidRequest("driverId is required".to_string()));
        }

        let driver = self.store.get_driver(driver_id).await.map_err(|e| {
            tracing::error!(driver_id, kind = %kind, "Failed to look up driver: {}", e);
            e
        })?;
        if driver.is_none() {
            tracing::info!("Notification for unknown driver {}", driver_id);
            return Err(DispatchError::driver_not_found(driver_id));
        }

        let (title, body) = render_message(&kind, &context);
        let now = Utc::now();
        let record = NotificationRecord {
            id: Uuid::new_v4().to_string(),
            driver_id: driver_id.to_string(),
            kind,
            title,
            body,
            context,
            read: false,
            created_at: now,
        };

        self.store.append_notification(&record).await.map_err(|e| {
            tracing::error!(
                driver_id,
                kind = %record.kind,
                ride_id = ?record.context.ride_id,
                delivery_id = ?record.context.delivery_id,
                "Failed to append notification: {}",
                e
            );
            e
        })?;

        if let Some(entity) = record.kind.marker_target(&record.context) {
            let marker = NotifiedMarker {
                driver_id: driver_id.to_string(),
                notified_at: now,
                responded: false,
            };

            match self.store.record_notified_marker(&entity, &marker).await {
                Ok(true) => tracing::debug!("Marked {} as notified on {}", driver_id, entity),
                Ok(false) => tracing::debug!("{} already marked as notified on {}", driver_id, entity),
                Err(source) => {
                    tracing::error!(
                        driver_id,
                        notification_id = %record.id,
                        entity = %entity,
                        "Notification stored but notified marker failed: {}",
                        source
                    );
                    return Err(DispatchError::PartialNotifyFailure {
                        notification_id: record.id,
                        driver_id: driver_id.to_string(),
                        entity,
                        source,
                    });
                }
            }
        }

        tracing::info!("Sent {} notification {} to driver {}", record.kind, record.id, driver_id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchEntity, DriverRecord, DriverStatus};
    use crate::services::MemoryStore;

    fn create_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.insert_driver(DriverRecord {
            id: "driver-1".to_string(),
            name: Some("Mwila".to_string()),
            status: DriverStatus::Approved,
            is_online: true,
            rating: None,
            vehicle: None,
        });
        Arc::new(store)
    }

    fn ride_context() -> NotifyContext {
        NotifyContext {
            ride_id: Some("ride-1".to_string()),
            pickup_address: Some("Main St".to_string()),
            fare: Some(25.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_request_templates() {
        let (title, body) = render_message(&NotificationKind::RideRequest, &ride_context());
        assert_eq!(title, "🚗 New Ride Request!");
        assert_eq!(body, "Pickup: Main St\nFare: K25");

        let (title, body) = render_message(&NotificationKind::DeliveryRequest, &NotifyContext::default());
        assert_eq!(title, "📦 New Delivery Request!");
        assert_eq!(body, "Pickup: Unknown\nFare: K0");
    }

    #[test]
    fn test_cancel_and_fallback_templates() {
        let context = NotifyContext::default();

        assert_eq!(
            render_message(&NotificationKind::RideCancelled, &context),
            (
                "❌ Ride Cancelled".to_string(),
                "The customer has cancelled the ride request".to_string()
            )
        );
        assert_eq!(
            render_message(&NotificationKind::DeliveryCancelled, &context),
            (
                "❌ Delivery Cancelled".to_string(),
                "The sender has cancelled the delivery request".to_string()
            )
        );
        assert_eq!(
            render_message(&NotificationKind::from("PROMO"), &context),
            ("YABONSE".to_string(), "You have a new notification".to_string())
        );
    }

    #[test]
    fn test_fractional_fare() {
        let context = NotifyContext {
            fare: Some(42.5),
            pickup_address: Some(String::new()),
            ..Default::default()
        };
        let (_, body) = render_message(&NotificationKind::RideRequest, &context);
        assert_eq!(body, "Pickup: Unknown\nFare: K42.5");
    }

    #[tokio::test]
    async fn test_notify_writes_record_and_marker() {
        let store = create_store();
        let notifier = Notifier::new(store.clone());

        let record = notifier
            .notify("driver-1", NotificationKind::RideRequest, ride_context())
            .await
            .unwrap();

        assert!(!record.read);
        assert_eq!(store.notifications_for("driver-1"), vec![record.clone()]);

        let markers = store.notified_drivers(&DispatchEntity::Ride("ride-1".to_string()));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].driver_id, "driver-1");
        assert!(!markers[0].responded);
    }

    #[tokio::test]
    async fn test_cancellation_has_no_marker() {
        let store = create_store();
        let notifier = Notifier::new(store.clone());

        notifier
            .notify("driver-1", NotificationKind::RideCancelled, ride_context())
            .await
            .unwrap();

        assert_eq!(store.notifications_for("driver-1").len(), 1);
        assert!(store
            .notified_drivers(&DispatchEntity::Ride("ride-1".to_string()))
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_driver() {
        let notifier = Notifier::new(create_store());

        let err = notifier
            .notify("missing-driver", NotificationKind::RideRequest, ride_context())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NotFound { entity: "Driver", .. }));
    }

    #[tokio::test]
    async fn test_marker_failure_is_partial() {
        let store = create_store();
        store.set_fail_marker_writes(true);
        let notifier = Notifier::new(store.clone());

        let err = notifier
            .notify("driver-1", NotificationKind::RideRequest, ride_context())
            .await
            .unwrap_err();

        match err {
            DispatchError::PartialNotifyFailure { notification_id, entity, .. } => {
                assert_eq!(entity, DispatchEntity::Ride("ride-1".to_string()));
                assert_eq!(store.notifications_for("driver-1")[0].id, notification_id);
            }
            other => panic!("expected PartialNotifyFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_first_write_failure_is_upstream() {
        let store = create_store();
        store.set_fail_notification_writes(true);
        let notifier = Notifier::new(store.clone());

        let err = notifier
            .notify("driver-1", NotificationKind::RideRequest, ride_context())
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(store
            .notified_drivers(&DispatchEntity::Ride("ride-1".to_string()))
            .is_empty());
    }
}
