//! Run statistics
//!
//! This module owns the two pieces of state that must agree with each other
//! for the whole run:
//!
//! - `DedupSet`: every commenter id seen so far
//! - `BrandCounts`: the brand histogram and the total of counted users
//!
//! `Tally` keeps both, together with the progress log, behind a single lock.
//! `StatsSnapshot` is a detached copy used for reporting.

mod snapshot;
mod tally;

pub use snapshot::{BrandCount, StatsSnapshot};
pub use tally::{BrandCounts, DedupSet, Tally};
