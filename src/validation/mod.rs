//! Link validation
//!
//! Turns link references into statuses through a bounded pool of checks
//! that share the cache and run each distinct link at most once.

pub mod exclusion;
pub mod inflight;
pub mod pool;
pub mod probe;
pub mod retry;

pub use exclusion::ExclusionRules;
pub use inflight::{Claim, ClaimToken, InFlight, Waiter};
pub use pool::{PoolSettings, ValidateLinks, ValidatorPool};
pub use probe::{HttpProbe, LinkProbe, ProbeError};
pub use retry::{CheckState, RetryPolicy, run_remote_check};
