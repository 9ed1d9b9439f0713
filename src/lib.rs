//! WordPulse - volunteer-computing word-frequency analysis
//!
//! A coordinator hands out documents from a fixed corpus to volunteers, which
//! download and count them and report partial word counts back. The
//! coordinator merges each document's counts exactly once into a global
//! frequency table and prints it when every document is done.
//!
//! # Architecture
//!
//! - **Work ledger**: state machine tracking each document (unstarted, started, finished)
//! - **Line protocol**: self-terminating text messages over one TCP connection per request
//! - **Coordinator**: sequential accept loop owning the ledger
//! - **Volunteer**: request / fetch / count / report loop
//! - **Output**: text and JSON reports of the final counts

pub mod config;
pub mod distributed;
pub mod ledger;
pub mod output;
pub mod stats;

// Re-export commonly used types
pub use config::Config;
pub use ledger::WorkLedger;

/// Result type used throughout WordPulse
pub type Result<T> = anyhow::Result<T>;
