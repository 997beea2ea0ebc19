pub mod export;
pub mod log_sink;
pub mod results;
pub mod style;
pub mod summary;

pub use export::{export_results, ExportPaths};
pub use log_sink::{CaptureBuffer, LogEvent, LogSender, LogSink, SinkOptions, SinkStats, Ticket, TicketCounter};
pub use results::{ResultAggregator, ResultBuckets, Tally};
pub use summary::{print_summary, render_summary};
