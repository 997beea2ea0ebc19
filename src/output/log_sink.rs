use ahash::AHashMap;
use indicatif::ProgressBar;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::output::style::{paint, Tone};

/// Correlates the start and final line of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
pub struct TicketCounter {
    next: AtomicU64,
}

impl TicketCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Start { ticket: Ticket, text: String },
    Final { ticket: Ticket, text: String, tone: Tone },
    Plain { text: String, tone: Tone },
}

enum SinkMessage {
    Event(LogEvent),
    Close,
}

/// Producer handle. Cheap to clone, never blocks.
#[derive(Clone)]
pub struct LogSender {
    tx: mpsc::UnboundedSender<SinkMessage>,
}

impl LogSender {
    pub fn emit(&self, event: LogEvent) {
        if self.tx.send(SinkMessage::Event(event)).is_err() {
            tracing::debug!("log sink already closed, event dropped");
        }
    }

    pub fn start(&self, ticket: Ticket, text: impl Into<String>) {
        self.emit(LogEvent::Start { ticket, text: text.into() });
    }

    pub fn finish(&self, ticket: Ticket, text: impl Into<String>, tone: Tone) {
        self.emit(LogEvent::Final { ticket, text: text.into(), tone });
    }

    pub fn plain(&self, text: impl Into<String>, tone: Tone) {
        self.emit(LogEvent::Plain { text: text.into(), tone });
    }
}

#[derive(Default)]
pub struct SinkOptions {
    pub color: bool,
    /// Advanced once per `Final`; lines are printed above it.
    pub progress: Option<ProgressBar>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    pub starts: usize,
    pub finals: usize,
    pub plains: usize,
    /// `Final` events with no preceding `Start` (probes skipped on cancel).
    pub orphaned_finals: usize,
    /// Tickets that started but never reported a `Final`.
    pub unfinished: usize,
}

/// The single consumer of [`LogEvent`]s and the only writer to its output
/// while a scan runs. Lines appear in enqueue order.
pub struct LogSink {
    sender: LogSender,
    handle: JoinHandle<SinkStats>,
}

impl LogSink {
    pub fn spawn(out: Box<dyn Write + Send>, options: SinkOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(drain(rx, out, options));
        Self { sender: LogSender { tx }, handle }
    }

    pub fn stdout(options: SinkOptions) -> Self {
        Self::spawn(Box::new(std::io::stdout()), options)
    }

    pub fn sender(&self) -> LogSender {
        self.sender.clone()
    }

    /// Enqueue the close sentinel and wait until everything before it is
    /// written.
    pub async fn close(self) -> SinkStats {
        let _ = self.sender.tx.send(SinkMessage::Close);
        match self.handle.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!(error = %e, "log sink task failed");
                SinkStats::default()
            }
        }
    }
}

async fn drain(
    mut rx: mpsc::UnboundedReceiver<SinkMessage>,
    mut out: Box<dyn Write + Send>,
    options: SinkOptions,
) -> SinkStats {
    let mut open: AHashMap<Ticket, String> = AHashMap::new();
    let mut stats = SinkStats::default();

    while let Some(msg) = rx.recv().await {
        let event = match msg {
            SinkMessage::Event(ev) => ev,
            SinkMessage::Close => break,
        };
        let line = match event {
            LogEvent::Start { ticket, text } => {
                stats.starts += 1;
                let line = paint(&text, Tone::Warning, options.color);
                open.insert(ticket, text);
                line
            }
            LogEvent::Final { ticket, text, tone } => {
                stats.finals += 1;
                if open.remove(&ticket).is_none() {
                    stats.orphaned_finals += 1;
                }
                if let Some(pb) = &options.progress {
                    pb.inc(1);
                }
                paint(&text, tone, options.color)
            }
            LogEvent::Plain { text, tone } => {
                stats.plains += 1;
                paint(&text, tone, options.color)
            }
        };
        write_line(out.as_mut(), options.progress.as_ref(), &line);
    }

    stats.unfinished = open.len();
    for text in open.values() {
        tracing::debug!(line = %text, "probe started but never concluded");
    }
    if let Some(pb) = &options.progress {
        pb.finish_and_clear();
    }
    if let Err(e) = out.flush() {
        tracing::error!(error = %e, "failed to flush log output");
    }
    stats
}

fn write_line(out: &mut (dyn Write + Send), progress: Option<&ProgressBar>, line: &str) {
    let mut write = || {
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::error!(error = %e, "failed to write log line");
        }
    };
    match progress {
        Some(pb) => pb.suspend(write),
        None => write(),
    }
}

/// In-memory writer whose contents stay readable after the sink owns it.
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
