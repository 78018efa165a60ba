//! The promotion-hierarchy engine: rated individuals, per-tier ordered
//! retention, and the attrition/promotion round driver. Strictly
//! sequential within one run; deterministic under a fixed seed.

pub mod error;
pub mod hierarchy;
pub mod individual;
pub mod rng;
pub mod roster;
pub mod tier;

pub use error::EngineError;
pub use hierarchy::{validate_attrition, validate_bias, validate_schedule, Hierarchy};
pub use individual::{Group, GroupAssigner, Individual};
pub use rng::Rng;
pub use roster::Roster;
pub use tier::Tier;
