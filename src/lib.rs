pub mod config;
pub mod engine;
pub mod http_client;
pub mod output;
pub mod probe;
pub mod utils;
pub mod wordlist;

pub use crate::config::ScanConfig;
pub use crate::engine::{Orchestrator, ScanReport};
pub use crate::http_client::{HttpTransport, Transport};
pub use crate::probe::ProbeOutcome;
