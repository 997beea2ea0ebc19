use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::http_client::Transport;
use crate::output::log_sink::{LogSink, SinkStats, TicketCounter};
use crate::output::results::{ResultAggregator, ResultBuckets, Tally};
use crate::output::style::Tone;
use crate::probe::http_probe::{fail_path, probe_path, skip_path, ProbeContext};
use crate::probe::throttle::{ConcurrencyLimiter, RateThrottler};

pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Final state of a scan, complete or interrupted.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Candidate paths in the configuration.
    pub total: usize,
    /// Outcomes produced. A panicking probe still settles its path as a
    /// transport error, so this equals `total` for every finished run.
    pub outcomes: usize,
    pub buckets: ResultBuckets,
    pub tally: Tally,
    pub log: SinkStats,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Drives every probe of one scan under the concurrency cap.
pub struct Orchestrator {
    config: Arc<ScanConfig>,
    transport: Arc<dyn Transport>,
    grace: Duration,
}

impl Orchestrator {
    pub fn new(config: ScanConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            grace: DEFAULT_CANCEL_GRACE,
        }
    }

    /// Time in-flight probes get to finish once the scan is cancelled.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run the scan to completion or cancellation, then close `sink`.
    ///
    /// Cancellation stops new probes from starting, gives in-flight ones the
    /// grace period and still returns every result gathered until then.
    pub async fn run(&self, sink: LogSink, cancel: CancellationToken) -> ScanReport {
        let started = Instant::now();
        let completed = Arc::new(AtomicUsize::new(0));
        let results = Arc::new(ResultAggregator::new());
        let ctx = ProbeContext {
            config: self.config.clone(),
            transport: self.transport.clone(),
            limiter: ConcurrencyLimiter::new(self.config.concurrency()),
            throttler: RateThrottler::new(self.config.rate_limit()),
            log: sink.sender(),
            results: results.clone(),
            tickets: Arc::new(TicketCounter::new()),
            cancel: cancel.clone(),
            grace: self.grace,
        };

        tracing::info!(
            target_url = self.config.base_url(),
            endpoints = self.config.paths().len(),
            concurrency = self.config.concurrency(),
            rps = self.config.rate_limit(),
            "starting scan"
        );

        let mut set = JoinSet::new();
        for path in self.config.paths() {
            if cancel.is_cancelled() {
                skip_path(&ctx, path);
                completed.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            let ctx = ctx.clone();
            let path = path.clone();
            let completed = completed.clone();
            set.spawn(async move {
                let ticket = ctx.tickets.issue();
                let outcome = match tokio::spawn(probe_path(ctx.clone(), path.clone(), ticket)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!(path = %path, error = %e, "probe task failed");
                        ctx.log.plain(format!("[ERR] Unhandled error: {}", e), Tone::Failure);
                        let error = if e.is_panic() { "task panicked".to_string() } else { e.to_string() };
                        fail_path(&ctx, ticket, &path, error)
                    }
                };
                completed.fetch_add(1, Ordering::Relaxed);
                outcome
            });
        }

        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                tracing::error!(error = %e, "scan task failed");
                ctx.log.plain(format!("[ERR] Unhandled error: {}", e), Tone::Failure);
            }
        }

        drop(ctx);
        let log = sink.close().await;

        let report = ScanReport {
            total: self.config.paths().len(),
            outcomes: completed.load(Ordering::Relaxed),
            buckets: results.snapshot(),
            tally: results.tally(),
            log,
            cancelled: cancel.is_cancelled(),
            elapsed: started.elapsed(),
        };
        tracing::info!(
            outcomes = report.outcomes,
            findings = report.buckets.len(),
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "scan finished"
        );
        report
    }
}
