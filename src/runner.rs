use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands};
use api_brute::config::{parse_concurrency, parse_header_entry, parse_rate_limit, ScanConfig};
use api_brute::output::style::{paint, Tone};
use api_brute::output::{export_results, print_summary, LogSink, SinkOptions};
use api_brute::{HttpTransport, Orchestrator, ScanReport};

fn print_banner(color: bool) {
    let logo = format!(r#"
    _          _   ____             _
   / \   _ __ (_) | __ ) _ __ _   _| |_ ___
  / _ \ | '_ \| | |  _ \| '__| | | | __/ _ \
 / ___ \| |_) | | | |_) | |  | |_| | ||  __/
/_/   \_\ .__/|_| |____/|_|   \__,_|\__\___| Version: {}
        |_|
"#, env!("CARGO_PKG_VERSION"));
    println!("{}", paint(&logo, Tone::Info, color));
    println!("{}\n", paint("Async HTTP Endpoint Scanner", Tone::Success, color));
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout belongs to the scan log.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "api_brute={crate},reqwest=info,hyper=info,h2=info,rustls=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .init();

    match cli.command {
        Commands::InitWordlist { path, force } => {
            api_brute::wordlist::write_default_wordlist(Path::new(&path), force)?;
            println!("[+] Default wordlist written to {}", path);
            Ok(())
        }
        Commands::Scan { target, wordlist, concurrency, rps, headers, out, insecure, no_color, progress, grace } => {
            let color = !no_color && std::io::stdout().is_terminal();
            print_banner(color);

            let endpoints = match api_brute::wordlist::load_wordlist(Path::new(&wordlist)) {
                Ok(list) => list,
                Err(e) => {
                    eprintln!("[!] {:#}", e);
                    eprintln!("[i] Create a starter list with: api_brute init-wordlist {}", wordlist);
                    Vec::new()
                }
            };
            if endpoints.is_empty() {
                anyhow::bail!("no endpoints to scan");
            }

            let mut custom_headers = Vec::new();
            for raw in &headers {
                match parse_header_entry(raw) {
                    Some(kv) => custom_headers.push(kv),
                    None => eprintln!("[!] Invalid header format {:?}. Use 'Key:Value'.", raw),
                }
            }

            let config = ScanConfig::builder(target)
                .paths(endpoints)
                .concurrency(parse_concurrency(&concurrency) as i64)
                .rate_limit(parse_rate_limit(&rps))
                .headers(custom_headers)
                .insecure(insecure)
                .build()?;

            run_scan(config, PathBuf::from(out), color, progress, Duration::from_secs(grace)).await
        }
    }
}

async fn run_scan(config: ScanConfig, out_dir: PathBuf, color: bool, progress: bool, grace: Duration) -> anyhow::Result<()> {
    let rps = if config.rate_limit() > 0.0 { config.rate_limit().to_string() } else { "No Limit".to_string() };
    let headers: Vec<String> = config.headers().iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    println!("{}", paint(&format!(" Starting scan on: {}", config.base_url()), Tone::Info, color));
    println!("{}", paint(&format!(" Concurrency: {}, RPS Limit: {}", config.concurrency(), rps), Tone::Info, color));
    println!("{}", paint(&format!(" Headers used: {}", headers.join(" | ")), Tone::Info, color));
    println!("\n{}\n", paint(&format!(" Total endpoints to scan: {}", config.paths().len()), Tone::Success, color));

    let transport = HttpTransport::from_config(&config).context("cannot prepare HTTP client")?;

    let cancel = CancellationToken::new();
    let cancel_ctrlc = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n[!] Interrupt received, finishing in-flight probes...");
            cancel_ctrlc.cancel();
        }
    });

    let bar = progress.then(|| {
        let pb = ProgressBar::with_draw_target(Some(config.paths().len() as u64), ProgressDrawTarget::stdout());
        pb.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    });
    let sink = LogSink::stdout(SinkOptions { color, progress: bar });

    let orchestrator = Orchestrator::new(config, Arc::new(transport)).with_grace(grace);
    let report = orchestrator.run(sink, cancel).await;

    // Export happens exactly once, whether or not the scan was interrupted.
    let stamp = api_brute::utils::file_stamp();
    match export_results(&out_dir, &report.buckets, &stamp) {
        Ok(paths) => println!("{}", paint(&format!("[i] Saved results: {}", paths.json.display()), Tone::Info, color)),
        Err(e) => {
            tracing::error!(error = %e, "export failed");
            eprintln!("{}", paint(&format!("[ERR] Failed writing results: {:#}", e), Tone::Failure, color));
        }
    }

    print_counters(&report, color);
    print_summary(&report.buckets, color);
    Ok(())
}

fn print_counters(report: &ScanReport, color: bool) {
    if report.cancelled {
        let line = format!(
            "[!] Scan interrupted: {} of {} endpoints answered before cancellation",
            report.tally.total() - report.tally.cancelled,
            report.total
        );
        println!("\n{}", paint(&line, Tone::Warning, color));
    }
    println!(
        "\n[i] Probed {} endpoints in {:.1}s ({} not found, {} errors)",
        report.outcomes,
        report.elapsed.as_secs_f64(),
        report.tally.not_found,
        report.tally.transport_errors - report.tally.cancelled,
    );
}
