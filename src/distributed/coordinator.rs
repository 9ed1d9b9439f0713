//! Coordinator service
//!
//! This module implements the coordinator that volunteers talk to.
//! The coordinator:
//! - Owns the work ledger for its whole lifetime
//! - Accepts one connection at a time and serves exactly one request on it
//! - Hands out documents and merges reported word counts
//! - Stops accepting once a work request finds nothing left to do
//!
//! Connections are handled strictly in sequence, so the ledger is borrowed
//! mutably by one handler at a time and needs no locking.
//!
//! # Failure Handling
//!
//! Every per-connection failure (undecodable request, unexpected message
//! kind, peer reset) is logged and the connection dropped; the accept loop
//! keeps going. There are no timeouts: a volunteer that keeps a connection
//! open without sending anything blocks the coordinator.

use crate::config::CoordinatorConfig;
use crate::distributed::protocol::*;
use crate::ledger::{Assignment, MergeOutcome, WorkLedger};
use anyhow::{Context, Result};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Pause after a failed accept before trying again
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// What the accept loop should do after a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Keep accepting
    Continue,
    /// A work request found no work left; stop accepting
    Shutdown,
}

/// Aggregate results, produced once when the coordinator shuts down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalReport {
    /// Number of documents analyzed
    pub units: usize,
    /// Word counts, count-descending
    pub results: Vec<(String, u64)>,
}

impl FinalReport {
    pub fn from_ledger(ledger: &WorkLedger) -> Self {
        Self {
            units: ledger.unit_count(),
            results: ledger.snapshot_sorted_results(),
        }
    }

    /// Sum of all counts
    pub fn total_words(&self) -> u64 {
        self.results
            .iter()
            .fold(0u64, |acc, (_, count)| acc.saturating_add(*count))
    }
}

/// Coordinator service
///
/// Bound to a listening socket on creation; [`CoordinatorService::run`]
/// serves volunteers until all work is done.
pub struct CoordinatorService {
    /// Listening socket
    listener: TcpListener,

    /// Work state, owned for the lifetime of the service
    ledger: WorkLedger,

    /// Host volunteers download documents from
    document_host: String,
}

impl CoordinatorService {
    /// Bind a coordinator over the configured corpus
    pub async fn bind(config: &CoordinatorConfig) -> Result<Self> {
        let ledger = WorkLedger::new(config.corpus());
        Self::bind_with_ledger(config, ledger).await
    }

    /// Bind a coordinator around an existing ledger
    pub async fn bind_with_ledger(config: &CoordinatorConfig, ledger: WorkLedger) -> Result<Self> {
        let addr = format!("{}:{}", config.bind_address, config.listen_port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind coordinator to {}", addr))?;

        let local = listener.local_addr().context("Failed to read bound address")?;
        info!(
            "Coordinator listening on {} ({} documents from {})",
            local,
            ledger.unit_count(),
            config.document_host
        );

        Ok(Self {
            listener,
            ledger,
            document_host: config.document_host.clone(),
        })
    }

    /// Address the coordinator is listening on
    ///
    /// Reports the actual port when the configured port was 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read bound address")
    }

    pub fn ledger(&self) -> &WorkLedger {
        &self.ledger
    }

    /// Serve volunteers until a work request finds no work left
    ///
    /// Returns the final aggregate report.
    pub async fn run(mut self) -> Result<FinalReport> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };
            debug!("Connection from {}", peer);

            match handle_connection(&mut self.ledger, &self.document_host, stream).await {
                Ok(ConnectionOutcome::Continue) => {}
                Ok(ConnectionOutcome::Shutdown) => break,
                Err(e) => warn!("Connection from {} failed: {:#}", peer, e),
            }
        }

        info!("All work is done ({})", self.ledger.progress());
        Ok(FinalReport::from_ledger(&self.ledger))
    }
}

/// Serve a single request on `stream`
///
/// Decodes one message and answers it:
/// - work request: offer the next unit, or `NO_WORK` (→ [`ConnectionOutcome::Shutdown`])
/// - work report: merge it and acknowledge, duplicates included
/// - anything else, decodable or not: send nothing
///
/// The connection is closed when `stream` is dropped on return.
pub async fn handle_connection<S>(
    ledger: &mut WorkLedger,
    document_host: &str,
    stream: S,
) -> Result<ConnectionOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let request = match decode(&mut reader).await {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Received an invalid request: {}", e);
            return Ok(ConnectionOutcome::Continue);
        }
    };

    match request {
        Message::WorkRequest => {
            let assignment = ledger.assign_next();
            let offer = match assignment {
                Assignment::Fresh(ref path) => {
                    info!("Assigning {} ({})", path, ledger.progress());
                    WorkOffer::assignment(document_host, path.as_str())?
                }
                Assignment::Reissue(ref path) => {
                    info!("No unstarted documents left; reissuing {}", path);
                    WorkOffer::assignment(document_host, path.as_str())?
                }
                Assignment::NoWork => {
                    info!("No work left");
                    WorkOffer::NoWork
                }
            };

            let sent = write_message(&mut write_half, &Message::WorkOffer(offer)).await;
            if assignment.is_no_work() {
                // The run is over whether or not this volunteer heard it
                if let Err(e) = sent {
                    warn!("Failed to send final no-work offer: {}", e);
                }
                return Ok(ConnectionOutcome::Shutdown);
            }
            sent.context("Failed to send work offer")?;
            Ok(ConnectionOutcome::Continue)
        }
        Message::WorkReport(report) => {
            let (path, counts) = report.into_parts();
            match ledger.merge_report(&path, &counts) {
                MergeOutcome::Merged => {
                    info!(
                        "Merged {} words for {} ({})",
                        counts.len(),
                        path,
                        ledger.progress()
                    );
                }
                MergeOutcome::Duplicate => info!("Ignoring duplicate report for {}", path),
                MergeOutcome::UnknownUnit => warn!("Ignoring report for unknown document {}", path),
            }

            write_message(&mut write_half, &Message::WorkAck)
                .await
                .context("Failed to send work acknowledgment")?;
            Ok(ConnectionOutcome::Continue)
        }
        other => {
            warn!("Received an unexpected {} request. Ignoring it.", other.kind());
            Ok(ConnectionOutcome::Continue)
        }
    }
}
