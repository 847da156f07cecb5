// Core algorithm exports
pub mod eligibility;
pub mod error;
pub mod geo;
pub mod matcher;
pub mod notifier;

pub use eligibility::{check_availability, check_eligibility, is_eligible, Eligibility, IneligibleReason};
pub use error::DispatchError;
pub use geo::{bounding_box, distance, eta, eta_minutes, haversine_distance, round_to_precision};
pub use matcher::{rank_candidates, MatchPolicy, MatchResult, Matcher};
pub use notifier::{render_message, Notifier};
