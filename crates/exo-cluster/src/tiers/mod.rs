//! Tier catalog and membership resolution

mod catalog;
mod membership;

pub use catalog::{default_tiers, Tier, TierCatalog};
pub use membership::{is_eligible, resolve, Membership};
