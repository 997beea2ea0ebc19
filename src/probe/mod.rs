pub mod http_probe;
pub mod outcome;
pub mod throttle;

pub use http_probe::{fail_path, probe_path, resolve_url, skip_path, ProbeContext};
pub use outcome::{BucketEntry, ProbeOutcome, StatusEntry};
pub use throttle::{ConcurrencyLimiter, RateThrottler};
