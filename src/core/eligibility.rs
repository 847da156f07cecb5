use crate::core::geo::distance;
use crate::models::{DriverLocation, DriverRecord, DriverStatus, MatchRequest};

/// Locations older than this are treated as absent (5 minutes)
pub const DEFAULT_FRESHNESS_WINDOW_MS: i64 = 300_000;

/// Why a driver was left out of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IneligibleReason {
    NotApproved,
    Offline,
    NoLocation,
    StaleLocation,
    OutOfRange,
}

/// Outcome of the eligibility check for one driver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eligibility {
    /// Carries the exact pickup distance so callers don't recompute it
    Eligible { distance_km: f64 },
    Ineligible(IneligibleReason),
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible { .. })
    }
}

/// Non-spatial part of the eligibility check
///
/// Returns the driver's usable location when the driver is approved, online
/// and has a location no older than `freshness_window_ms`.
pub fn check_availability<'a>(
    driver: &DriverRecord,
    location: Option<&'a DriverLocation>,
    freshness_window_ms: i64,
    now_ms: i64,
) -> Result<&'a DriverLocation, IneligibleReason> {
    if driver.status != DriverStatus::Approved {
        return Err(IneligibleReason::NotApproved);
    }

    if !driver.is_online {
        return Err(IneligibleReason::Offline);
    }

    let Some(location) = location else {
        return Err(IneligibleReason::NoLocation);
    };

    if location.updated_at_ms < now_ms.saturating_sub(freshness_window_ms) {
        return Err(IneligibleReason::StaleLocation);
    }

    Ok(location)
}

/// Decide whether a driver can be offered the request
///
/// A driver qualifies only when approved, online, with a location no older
/// than `freshness_window_ms` and within the requested radius of the pickup.
/// The first failing condition is reported.
pub fn check_eligibility(
    driver: &DriverRecord,
    location: Option<&DriverLocation>,
    request: &MatchRequest,
    freshness_window_ms: i64,
    now_ms: i64,
) -> Eligibility {
    let location = match check_availability(driver, location, freshness_window_ms, now_ms) {
        Ok(location) => location,
        Err(reason) => return Eligibility::Ineligible(reason),
    };

    let distance_km = distance(request.pickup, location.coordinate);
    if distance_km > request.max_radius_km {
        return Eligibility::Ineligible(IneligibleReason::OutOfRange);
    }

    Eligibility::Eligible { distance_km }
}

/// Plain predicate form of [`check_eligibility`]
#[inline]
pub fn is_eligible(
    driver: &DriverRecord,
    location: Option<&DriverLocation>,
    request: &MatchRequest,
    freshness_window_ms: i64,
    now_ms: i64,
) -> bool {
    check_eligibility(driver, location, request, freshness_window_ms, now_ms).is_eligible()
}
