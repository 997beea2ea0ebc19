use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::ScanConfig;
use crate::http_client::Transport;
use crate::output::log_sink::{LogSender, Ticket, TicketCounter};
use crate::output::results::ResultAggregator;
use crate::probe::outcome::ProbeOutcome;
use crate::probe::throttle::{ConcurrencyLimiter, RateThrottler};

/// Everything a probe task shares with its siblings.
#[derive(Clone)]
pub struct ProbeContext {
    pub config: Arc<ScanConfig>,
    pub transport: Arc<dyn Transport>,
    pub limiter: ConcurrencyLimiter,
    pub throttler: RateThrottler,
    pub log: LogSender,
    pub results: Arc<ResultAggregator>,
    pub tickets: Arc<TicketCounter>,
    pub cancel: CancellationToken,
    /// How long an in-flight request may keep running after cancellation.
    pub grace: Duration,
}

/// `base/path` with leading slashes on `path` dropped.
pub fn resolve_url(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}

/// Probe one candidate path under `ticket`. Always yields exactly one outcome
/// and one `Final` log event, whether the request completed, failed or was cut
/// short by cancellation.
///
/// The caller issues the ticket so it can still settle the path through
/// [`fail_path`] if this future never returns.
pub async fn probe_path(ctx: ProbeContext, path: String, ticket: Ticket) -> ProbeOutcome {
    let url = resolve_url(ctx.config.base_url(), &path);

    let permit = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => {
            return conclude(&ctx, ticket, ProbeOutcome::cancelled(url));
        }
        permit = ctx.limiter.acquire() => permit,
    };

    ctx.log.start(ticket, format!("[~] Trying: {}", url));
    let started = Instant::now();

    let response = tokio::select! {
        res = ctx.transport.get(&url) => Some(res),
        _ = abandon_after_grace(&ctx.cancel, ctx.grace) => None,
    };
    let outcome = match response {
        Some(Ok(status)) => ProbeOutcome::classify(url, status),
        Some(Err(error)) => ProbeOutcome::TransportError { url, error },
        None => ProbeOutcome::cancelled(url),
    };
    let outcome = conclude(&ctx, ticket, outcome);

    let delay = ctx.throttler.delay_after(started.elapsed());
    if !delay.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = ctx.cancel.cancelled() => {}
        }
    }

    drop(permit);
    outcome
}

/// Conclude a candidate without ever acquiring a slot.
pub fn skip_path(ctx: &ProbeContext, path: &str) -> ProbeOutcome {
    let url = resolve_url(ctx.config.base_url(), path);
    let ticket = ctx.tickets.issue();
    conclude(ctx, ticket, ProbeOutcome::cancelled(url))
}

/// Settle a path whose task died before concluding it.
pub fn fail_path(ctx: &ProbeContext, ticket: Ticket, path: &str, error: String) -> ProbeOutcome {
    let url = resolve_url(ctx.config.base_url(), path);
    conclude(ctx, ticket, ProbeOutcome::TransportError { url, error })
}

fn conclude(ctx: &ProbeContext, ticket: Ticket, outcome: ProbeOutcome) -> ProbeOutcome {
    tracing::debug!(url = outcome.url(), status = ?outcome.status(), "probe concluded");
    ctx.log.finish(ticket, outcome.final_line(), outcome.tone());
    ctx.results.record(&outcome);
    outcome
}

async fn abandon_after_grace(cancel: &CancellationToken, grace: Duration) {
    cancel.cancelled().await;
    tokio::time::sleep(grace).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_url_avoids_double_slashes() {
        assert_eq!(resolve_url("https://example.test", "admin"), "https://example.test/admin");
        assert_eq!(resolve_url("https://example.test", "/admin"), "https://example.test/admin");
        assert_eq!(resolve_url("https://example.test", "//api/v1"), "https://example.test/api/v1");
        assert_eq!(resolve_url("https://example.test", ".env"), "https://example.test/.env");
    }
}
