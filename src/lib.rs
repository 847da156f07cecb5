//! Yabonse Dispatch - driver matching service for the Yabonse ride-hailing app
//!
//! Finds nearby, eligible, available drivers for a pickup point, ranks them
//! by distance and rating, and records dispatch notifications for the
//! drivers a caller decides to contact.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{distance, eta, bounding_box, DispatchError, Matcher, MatchPolicy, MatchResult, Notifier};
pub use crate::models::{Coordinate, DriverLocation, DriverRecord, MatchCandidate, MatchRequest, NotificationKind, NotificationRecord};
pub use crate::services::{AppwriteClient, DocumentStore, MemoryStore, StoreError, StoreHandle};
