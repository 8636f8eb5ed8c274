use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "llm-field-etl")]
#[command(about = "Rewrite one field of every JSON record with a language model")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "etl-config.toml")]
    pub config: String,

    /// JSON Lines input file (stdin when omitted)
    #[arg(short, long)]
    pub input: Option<String>,

    /// JSON Lines output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override runtime.concurrent_requests from config
    #[arg(long)]
    pub concurrent_requests: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON (for log collectors)
    #[arg(long)]
    pub json_logs: bool,

    /// Show the resolved configuration without calling the backend
    #[arg(long)]
    pub dry_run: bool,
}
