use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use crate::core::{
    eligibility::{
        check_availability, check_eligibility, Eligibility, IneligibleReason,
        DEFAULT_FRESHNESS_WINDOW_MS,
    },
    error::DispatchError,
    geo::{bounding_box, eta_minutes, DEFAULT_AVG_SPEED_KMH},
};
use crate::models::{
    Coordinate, DriverLocation, DriverRecord, MatchCandidate, MatchRequest, DEFAULT_LIMIT,
    DEFAULT_RADIUS_KM,
};
use crate::services::DocumentStore;

/// Margin on the pre-filter radius for points sitting on the box edge
const PREFILTER_SLACK: f64 = 1.1;

/// Tunables for the matching pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPolicy {
    pub default_radius_km: f64,
    pub default_limit: usize,
    pub max_limit: usize,
    pub freshness_window_ms: i64,
    pub avg_speed_kmh: f64,
    pub bounding_box_prefilter: bool,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            default_radius_km: DEFAULT_RADIUS_KM,
            default_limit: DEFAULT_LIMIT,
            max_limit: 50,
            freshness_window_ms: DEFAULT_FRESHNESS_WINDOW_MS,
            avg_speed_kmh: DEFAULT_AVG_SPEED_KMH,
            bounding_box_prefilter: false,
        }
    }
}

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Ranked candidates, at most `limit` of them
    pub candidates: Vec<MatchCandidate>,
    /// Eligible drivers before truncation
    pub total_eligible: usize,
    pub search_radius_km: f64,
    pub pickup: Coordinate,
    /// Drivers read from the store, eligible or not
    pub drivers_scanned: usize,
    /// Ineligible drivers by the first condition they failed
    pub rejected: BTreeMap<IneligibleReason, usize>,
}

impl MatchResult {
    /// True when the store held no drivers at all
    pub fn fleet_is_empty(&self) -> bool {
        self.drivers_scanned == 0
    }
}

/// Distance ascending, then rating descending
fn compare_candidates(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| b.driver.rating_value().total_cmp(&a.driver.rating_value()))
}

/// Filter, score and rank already-fetched drivers for one request
///
/// # Pipeline Stages
/// 1. Optional bounding box pre-filter
/// 2. Eligibility (approved, online, fresh location, within radius)
/// 3. Distance and ETA scoring
/// 4. Ranking and truncation to `request.limit`
pub fn rank_candidates(
    request: &MatchRequest,
    drivers: Vec<DriverRecord>,
    locations: &HashMap<String, DriverLocation>,
    policy: &MatchPolicy,
    now_ms: i64,
) -> MatchResult {
    let drivers_scanned = drivers.len();
    let prefilter = policy
        .bounding_box_prefilter
        .then(|| bounding_box(request.pickup, request.max_radius_km * PREFILTER_SLACK));

    let mut rejected: BTreeMap<IneligibleReason, usize> = BTreeMap::new();

    let mut candidates: Vec<MatchCandidate> = drivers
        .into_iter()
        .filter_map(|driver| {
            let location = locations.get(&driver.id);

            // Box check applies to available drivers only
            if let Some(bbox) = &prefilter {
                match check_availability(&driver, location, policy.freshness_window_ms, now_ms) {
                    Ok(loc) if bbox.contains(loc.coordinate) => {}
                    Ok(_) => {
                        *rejected.entry(IneligibleReason::OutOfRange).or_default() += 1;
                        return None;
                    }
                    Err(reason) => {
                        *rejected.entry(reason).or_default() += 1;
                        return None;
                    }
                }
            }

            match check_eligibility(
                &driver,
                location,
                request,
                policy.freshness_window_ms,
                now_ms,
            ) {
                Eligibility::Eligible { distance_km } => Some(MatchCandidate {
                    location: location?.clone(),
                    eta_minutes: eta_minutes(distance_km, policy.avg_speed_kmh),
                    distance_km,
                    driver,
                }),
                Eligibility::Ineligible(reason) => {
                    *rejected.entry(reason).or_default() += 1;
                    None
                }
            }
        })
        .collect();

    if let Some(missing) = rejected.get(&IneligibleReason::NoLocation) {
        tracing::warn!(
            "{} online approved drivers have no location entry (pickup {})",
            missing,
            request.pickup
        );
    }
    tracing::debug!("Rejected drivers by reason: {:?}", rejected);

    candidates.sort_by(compare_candidates);

    let total_eligible = candidates.len();
    candidates.truncate(request.limit);

    MatchResult {
        candidates,
        total_eligible,
        search_radius_km: request.max_radius_km,
        pickup: request.pickup,
        drivers_scanned,
        rejected,
    }
}

/// Finds nearby available drivers for a pickup point
///
/// Reads the full driver and location sets from the store on every call
/// and ranks them in memory. Holds no mutable state, so one instance can
/// serve any number of concurrent requests.
pub struct Matcher<S> {
    store: Arc<S>,
    policy: MatchPolicy,
}

impl<S> Clone for Matcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
        }
    }
}

impl<S: DocumentStore> Matcher<S> {
    pub fn new(store: Arc<S>, policy: MatchPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Find and rank drivers for a request using the current time
    pub async fn find_drivers(&self, request: &MatchRequest) -> Result<MatchResult, DispatchError> {
        self.find_drivers_at(request, chrono::Utc::now().timestamp_millis())
            .await
    }

    /// Find and rank drivers, judging location freshness against `now_ms`
    pub async fn find_drivers_at(
        &self,
        request: &MatchRequest,
        now_ms: i64,
    ) -> Result<MatchResult, DispatchError> {
        let (drivers, locations) = tokio::try_join!(
            async {
                self.store.list_drivers().await.map_err(|e| {
                    tracing::error!(
                        pickup = %request.pickup,
                        radius_km = request.max_radius_km,
                        limit = request.limit,
                        ride_id = ?request.ride_id,
                        "Failed to read drivers: {}",
                        e
                    );
                    e
                })
            },
            async {
                self.store.list_locations().await.map_err(|e| {
                    tracing::error!(
                        pickup = %request.pickup,
                        radius_km = request.max_radius_km,
                        limit = request.limit,
                        ride_id = ?request.ride_id,
                        "Failed to read driver locations: {}",
                        e
                    );
                    e
                })
            }
        )?;

        let result = rank_candidates(request, drivers, &locations, &self.policy, now_ms);

        tracing::info!(
            "Matched {} of {} eligible drivers ({} scanned) within {} km of {}",
            result.candidates.len(),
            result.total_eligible,
            result.drivers_scanned,
            request.max_radius_km,
            request.pickup
        );

        Ok(result)
    }
}
