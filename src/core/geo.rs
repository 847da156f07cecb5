use geo::{coord, Intersects, Rect};
use crate::models::{BoundingBox, Coordinate};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average urban driving speed used for ETA estimates
pub const DEFAULT_AVG_SPEED_KMH: f64 = 30.0;

/// Kilometers per degree of latitude
const KM_PER_DEGREE_LAT: f64 = 110.574;

/// Kilometers per degree of longitude at the equator
const KM_PER_DEGREE_LNG: f64 = 111.320;

/// Great-circle distance between two coordinates in kilometers
///
/// The result is unrounded; use [`round_to_precision`] for display.
#[inline]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat(), a.lng(), b.lat(), b.lng())
}

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// ETA in whole minutes at the default average speed
#[inline]
pub fn eta(distance_km: f64) -> u32 {
    eta_minutes(distance_km, DEFAULT_AVG_SPEED_KMH)
}

/// ETA in whole minutes, rounded up
///
/// Zero only for a zero distance; any positive distance is at least one
/// minute away. A non-positive speed falls back to the default.
pub fn eta_minutes(distance_km: f64, avg_speed_kmh: f64) -> u32 {
    if !(distance_km > 0.0) {
        return 0;
    }

    let speed = if avg_speed_kmh.is_finite() && avg_speed_kmh > 0.0 {
        avg_speed_kmh
    } else {
        DEFAULT_AVG_SPEED_KMH
    };

    let minutes = (distance_km / speed * 60.0).ceil();
    (minutes as u32).max(1)
}

/// Round a distance to two decimal places for presentation
#[inline]
pub fn round_to_precision(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Approximate box around a center point for cheap pre-filtering
///
/// 1° latitude ≈ 110.574 km, 1° longitude ≈ 111.320 km * cos(latitude).
/// The longitude half-width is never smaller than the spherical extent of
/// the circle, `asin(sin(r/R) / cos(lat))`, which outgrows the planar figure
/// near the poles. Boxes that reach a pole, enclose one, or cross the
/// antimeridian span every longitude.
pub fn bounding_box(center: Coordinate, radius_km: f64) -> BoundingBox {
    let lat = center.lat();
    let lng = center.lng();

    let lat_delta = radius_km / KM_PER_DEGREE_LAT;
    let min_lat = (lat - lat_delta).max(-90.0);
    let max_lat = (lat + lat_delta).min(90.0);

    let cos_lat = lat.to_radians().cos();
    let planar_delta = radius_km / (KM_PER_DEGREE_LNG * cos_lat);
    let ratio = (radius_km / EARTH_RADIUS_KM).sin() / cos_lat;
    let lng_delta = if ratio.is_finite() && ratio < 1.0 {
        planar_delta.max(ratio.asin().to_degrees())
    } else {
        f64::INFINITY
    };

    let wraps = !lng_delta.is_finite()
        || lng - lng_delta < -180.0
        || lng + lng_delta > 180.0
        || min_lat <= -90.0
        || max_lat >= 90.0;

    let (min_lng, max_lng) = if wraps {
        (-180.0, 180.0)
    } else {
        (lng - lng_delta, lng + lng_delta)
    };

    BoundingBox {
        min_lat,
        max_lat,
        min_lng,
        max_lng,
    }
}

impl BoundingBox {
    /// Check if a point lies within the box, edges included
    pub fn contains(&self, point: Coordinate) -> bool {
        let rect = Rect::new(
            coord! { x: self.min_lng, y: self.min_lat },
            coord! { x: self.max_lng, y: self.max_lat },
        );
        rect.intersects(&coord! { x: point.lng(), y: point.lat() })
    }
}
