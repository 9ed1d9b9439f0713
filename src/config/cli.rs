//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Coordinator mode (default) - hand out documents and aggregate counts
    Coordinator,
    /// Volunteer mode - ask for documents, count words, report back
    Volunteer,
}

/// WordPulse - volunteer-computing word-frequency analysis
#[derive(Parser, Debug)]
#[command(name = "wordpulse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: coordinator or volunteer
    #[arg(long, value_enum, default_value = "coordinator")]
    pub mode: ExecutionMode,

    /// TOML configuration file (CLI options take precedence)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Coordinator Options ===
    /// Port for the coordinator to listen on (0 = pick an unused port)
    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Address for the coordinator to bind to
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Host serving the documents
    #[arg(long)]
    pub document_host: Option<String>,

    /// Comma-separated document paths (e.g., "/a.txt,/b.txt")
    #[arg(long, value_delimiter = ',')]
    pub documents: Vec<String>,

    /// Comma-separated Project Gutenberg ids (e.g., "1513,27761")
    #[arg(long, value_delimiter = ',')]
    pub document_ids: Vec<u32>,

    // === Volunteer Options ===
    /// Coordinator host to connect to (volunteer mode only)
    #[arg(long, env = "WORDPULSE_COORDINATOR_HOST")]
    pub coordinator_host: Option<String>,

    /// Coordinator port to connect to (volunteer mode only)
    #[arg(long, env = "WORDPULSE_COORDINATOR_PORT")]
    pub coordinator_port: Option<u16>,

    /// Minimum length of counted words
    #[arg(long)]
    pub min_word_len: Option<usize>,

    /// Report only the N most frequent words per document (0 = all)
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Fetch documents over plain HTTP on this port instead of HTTPS
    #[arg(long)]
    pub plain_http_port: Option<u16>,

    // === Output Options ===
    /// Print only the N most frequent words of the final report
    #[arg(long)]
    pub top: Option<usize>,

    /// Write the final report as JSON to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Validate configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mode == ExecutionMode::Volunteer {
            if self.listen_port.is_some() || self.bind_address.is_some() {
                anyhow::bail!("--listen-port and --bind-address only apply to coordinator mode");
            }
            if self.json_output.is_some() {
                anyhow::bail!("--json-output only applies to coordinator mode");
            }
        }

        if self.min_word_len == Some(0) {
            anyhow::bail!("min_word_len must be at least 1");
        }

        if self.plain_http_port == Some(0) {
            anyhow::bail!("plain_http_port must be non-zero");
        }

        Ok(())
    }
}
