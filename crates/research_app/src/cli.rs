use std::path::PathBuf;

use clap::Parser;

use crate::platform::logging::LogDestination;

/// Research client - submit a research job and follow it live
#[derive(Parser, Debug)]
#[command(name = "research-client")]
#[command(version)]
#[command(about = "Terminal client for the research job service", long_about = None)]
pub struct Cli {
    /// Job service URL (e.g., http://localhost:5000)
    #[arg(short = 'u', long = "url")]
    pub url: Option<String>,

    /// RON config file (default: ./research_client.ron if it exists)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long = "log", value_enum)]
    pub log: Option<LogDestination>,

    /// Log at debug level
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Research this topic and exit once it finishes. Without it, topics are read from stdin.
    pub topic: Option<String>,
}
