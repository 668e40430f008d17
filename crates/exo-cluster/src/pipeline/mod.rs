//! Pipeline driver and run reporting

mod driver;
mod report;

pub use driver::{Pipeline, TierResult};
pub use report::{RunReport, TierOutcome, TierStatus};
