//! Report analysis: date ranges, filtering and aggregation.

pub mod aggregator;
pub mod date_range;
pub mod filter;

pub use aggregator::*;
pub use filter::{filter_records, FilterCriteria, ALL_BRANCHES};
