use clap::Parser;

#[derive(clap::Parser, Debug)]
#[command(author, version, about = "Async HTTP endpoint scanner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Probe a target for every path in a wordlist
    Scan {
        /// Base URL of the target (e.g. https://example.com)
        target: String,

        /// Newline-delimited list of candidate paths
        #[arg(short = 'w', long, default_value = "wordlists/wordlist.txt")]
        wordlist: String,

        /// Max concurrent requests (invalid or non-positive falls back to 10)
        #[arg(short = 'c', long, default_value = "10", allow_hyphen_values = true)]
        concurrency: String,

        /// Requests per second limit, 0 for no limit (negative falls back to 0)
        #[arg(short = 'r', long, default_value = "0", allow_hyphen_values = true)]
        rps: String,

        /// Extra header in 'Key:Value' form, overrides defaults (repeatable)
        #[arg(short = 'H', long = "header", value_name = "KEY:VALUE")]
        headers: Vec<String>,

        /// Output directory
        #[arg(short = 'o', long, default_value = "./results")]
        out: String,

        /// Accept invalid TLS certificates
        #[arg(long, default_value_t = false)]
        insecure: bool,

        /// Disable colored output
        #[arg(long, default_value_t = false)]
        no_color: bool,

        /// Show a progress bar below the log
        #[arg(long, default_value_t = false)]
        progress: bool,

        /// Seconds in-flight probes may finish after Ctrl-C
        #[arg(long, default_value_t = 2_u64)]
        grace: u64,
    },

    /// Write the built-in default wordlist
    InitWordlist {
        /// Destination file
        #[arg(default_value = "wordlists/wordlist.txt")]
        path: String,

        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
