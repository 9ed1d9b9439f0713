//! Volunteer client
//!
//! A volunteer repeatedly:
//! 1. Asks the coordinator for work (one connection)
//! 2. Downloads the offered document and counts its words
//! 3. Reports the counts back (another connection)
//!
//! It stops when the coordinator says there is no work left, or when the
//! coordinator cannot be reached. A document that cannot be downloaded is
//! skipped: its unit stays Started on the coordinator and will be reissued
//! to someone else.

use crate::config::VolunteerConfig;
use crate::distributed::fetcher::{fetcher_for, DocumentFetcher};
use crate::distributed::protocol::*;
use crate::stats::WordCounter;
use anyhow::{Context, Result};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Consecutive failed downloads after which the volunteer gives up
pub const MAX_CONSECUTIVE_FETCH_FAILURES: usize = 3;

/// Why a volunteer stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Coordinator answered with no work
    NoWork,
    /// Talking to the coordinator failed
    CoordinatorUnavailable(String),
    /// Too many downloads failed in a row
    FetchFailures,
}

/// What a volunteer did before stopping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolunteerSummary {
    /// Documents counted and acknowledged
    pub completed: usize,
    /// Documents that could not be downloaded
    pub skipped: usize,
    pub stopped: StopReason,
}

/// Volunteer client
pub struct Volunteer {
    config: VolunteerConfig,
    fetcher: Box<dyn DocumentFetcher>,
    counter: WordCounter,

    /// Identifier used in logs (hostname)
    volunteer_id: String,
}

impl Volunteer {
    /// Create a volunteer with an explicit document fetcher
    pub fn new(config: VolunteerConfig, fetcher: Box<dyn DocumentFetcher>) -> Self {
        let counter = WordCounter::new(config.min_word_len, config.top_n);
        Self {
            config,
            fetcher,
            counter,
            volunteer_id: get_volunteer_id(),
        }
    }

    /// Create a volunteer using the fetcher selected by `config.fetch`
    pub fn from_config(config: VolunteerConfig) -> Result<Self> {
        let fetcher = fetcher_for(config.fetch)?;
        Ok(Self::new(config, fetcher))
    }

    pub fn volunteer_id(&self) -> &str {
        &self.volunteer_id
    }

    /// Send one request on a new connection and decode the single response
    async fn exchange(&self, request: &Message) -> Result<Message> {
        let addr = self.config.coordinator_address();
        let mut stream = TcpStream::connect(&addr)
            .await
            .with_context(|| format!("Failed to connect to coordinator at {}", addr))?;

        let (read_half, mut write_half) = stream.split();
        write_message(&mut write_half, request)
            .await
            .context("Failed to send request")?;

        let mut reader = BufReader::new(read_half);
        let response = decode(&mut reader)
            .await
            .context("Failed to read coordinator response")?;
        Ok(response)
    }

    /// Ask the coordinator for work
    pub async fn get_work(&self) -> Result<WorkOffer> {
        match self.exchange(&Message::WorkRequest).await? {
            Message::WorkOffer(offer) => Ok(offer),
            other => anyhow::bail!("Expected WorkOffer, got {}", other.kind()),
        }
    }

    /// Download `path` from `host` and count its words
    pub async fn do_work(&self, host: &str, path: &str) -> Result<WordCounts> {
        let body = self
            .fetcher
            .fetch(host, path)
            .await
            .with_context(|| format!("Failed to download {}", path))?;

        let counts = self.counter.count(&body);
        debug!("Counted {} words in {} ({} bytes)", counts.len(), path, body.len());
        Ok(counts)
    }

    /// Report the counts for `path`
    pub async fn report_work(&self, path: &str, counts: WordCounts) -> Result<()> {
        let report = WorkReport::new(path, counts).context("Invalid work report")?;

        match self.exchange(&Message::WorkReport(report)).await? {
            Message::WorkAck => Ok(()),
            other => anyhow::bail!("Expected WorkAck, got {}", other.kind()),
        }
    }

    /// Ask for, perform and report work until none is left
    pub async fn keep_working_until_done(&self) -> VolunteerSummary {
        let mut completed = 0;
        let mut skipped = 0;
        let mut consecutive_failures = 0;

        let stopped = loop {
            let offer = match self.get_work().await {
                Ok(offer) => offer,
                Err(e) => break StopReason::CoordinatorUnavailable(format!("{:#}", e)),
            };

            let (host, path) = match offer {
                WorkOffer::Assignment { host, path } => (host, path),
                WorkOffer::NoWork => break StopReason::NoWork,
            };
            info!("[{}] Working on {} from {}", self.volunteer_id, path, host);

            let counts = match self.do_work(&host, &path).await {
                Ok(counts) => {
                    consecutive_failures = 0;
                    counts
                }
                Err(e) => {
                    warn!("[{}] Skipping {}: {:#}", self.volunteer_id, path, e);
                    skipped += 1;
                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_FETCH_FAILURES {
                        break StopReason::FetchFailures;
                    }
                    continue;
                }
            };

            if let Err(e) = self.report_work(&path, counts).await {
                break StopReason::CoordinatorUnavailable(format!("{:#}", e));
            }
            completed += 1;
            info!("[{}] Reported {}", self.volunteer_id, path);
        };

        info!(
            "[{}] Stopping after {} documents ({} skipped): {:?}",
            self.volunteer_id, completed, skipped, stopped
        );

        VolunteerSummary {
            completed,
            skipped,
            stopped,
        }
    }
}

/// Volunteer identifier: hostname, or "unknown"
fn get_volunteer_id() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}
