//! Distributed mode implementation
//!
//! This module implements the coordinator/volunteer system.
//!
//! # Architecture
//!
//! WordPulse uses a coordinator-volunteer architecture:
//!
//! - **Coordinator**: Owns the work ledger, hands out documents, merges word counts
//! - **Volunteer**: Asks for a document, downloads and counts it, reports back
//! - **Document host**: External web server holding the corpus
//!
//! # Modules
//!
//! - `protocol`: Message definitions, encoding and decoding
//! - `coordinator`: Coordinator service (accept loop, request dispatch)
//! - `volunteer`: Volunteer client loop
//! - `fetcher`: Document download transports

pub mod protocol;
pub mod coordinator;
pub mod fetcher;
pub mod volunteer;

// Re-export key types
pub use protocol::{
    Message,
    MessageKind,
    DocumentFetchRequest,
    WorkOffer,
    WorkReport,
    WordCounts,
    DecodeError,
    MessageError,
    NO_WORK_MARKER,
};

pub use coordinator::{CoordinatorService, ConnectionOutcome, FinalReport};
pub use fetcher::{DocumentFetcher, HttpsFetcher, PlainHttpFetcher};
pub use volunteer::{Volunteer, VolunteerSummary, StopReason};
