//! Analysis modules.
//!
//! Bucket classification and contextual aggregation of recorded tells.

pub mod aggregator;
pub mod classifier;

pub use aggregator::{aggregate, AggregateQuery};
pub use classifier::{classify, validate_context};
