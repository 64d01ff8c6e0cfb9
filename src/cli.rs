use crate::farm::client::DEFAULT_INDEX_URL;
use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "bsw", version = VERSION, about = "Build-farm status watcher")]
pub struct Cli {
    /// Architecture to inspect, e.g. arm_latest (a bare name defaults to _oldest)
    #[arg(short, long, default_value = "arm_latest")]
    pub architecture: String,

    /// Platform display name, overrides --architecture (e.g. arm_cortex_latest)
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Estimate the time until an image is built for this box
    #[arg(short, long, value_name = "BOXNAME")]
    pub evaluate: Option<String>,

    /// Show the box an image is currently built for
    #[arg(short, long)]
    pub buildbox: bool,

    /// Show the estimated duration of a complete build cycle
    #[arg(short, long)]
    pub cycle: bool,

    /// Print the full status overview table
    #[arg(short, long)]
    pub verbose: bool,

    /// List all supported architectures
    #[arg(short, long)]
    pub supported: bool,

    /// List all usable platforms
    #[arg(short, long)]
    pub usable: bool,

    /// Write the parsed snapshot to a JSON file
    #[arg(short, long, value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// Re-render the overview every N seconds until interrupted
    #[arg(short, long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Platform index URL
    #[arg(long, default_value = DEFAULT_INDEX_URL)]
    pub index_url: String,

    /// Log engine activity to stderr
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Whether any output-producing flag was given. Without one the overview
    /// is printed, matching the historical default.
    pub fn has_action(&self) -> bool {
        self.verbose
            || self.buildbox
            || self.cycle
            || self.supported
            || self.usable
            || self.evaluate.is_some()
            || self.json.is_some()
            || self.watch.is_some()
    }
}
