//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project Gutenberg ids of the default corpus
///
/// Romeo and Juliet, Hamlet, The Tempest, Macbeth, Othello, Julius Caesar,
/// Twelfth Night, The Merchant of Venice.
pub const DEFAULT_PLAY_IDS: [u32; 8] = [1513, 27761, 23042, 1533, 1531, 1522, 1526, 1515];

/// Default document host
pub const DEFAULT_DOCUMENT_HOST: &str = "www.gutenberg.org";

/// Default coordinator port volunteers connect to
pub const DEFAULT_COORDINATOR_PORT: u16 = 5791;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub volunteer: VolunteerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Address to bind the listener to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Port to listen on (0 = OS-assigned)
    #[serde(default)]
    pub listen_port: u16,
    /// Host serving the documents
    #[serde(default = "default_document_host")]
    pub document_host: String,
    /// Document paths on the host
    #[serde(default)]
    pub documents: Vec<String>,
    /// Project Gutenberg ids, expanded to `/cache/epub/<id>/pg<id>.txt`
    #[serde(default)]
    pub document_ids: Vec<u32>,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_document_host() -> String {
    DEFAULT_DOCUMENT_HOST.to_string()
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            listen_port: 0,
            document_host: default_document_host(),
            documents: Vec::new(),
            document_ids: Vec::new(),
        }
    }
}

impl CoordinatorConfig {
    /// Unit paths for the ledger
    ///
    /// Explicit `documents` first, then expanded `document_ids`. Falls back to
    /// the default plays when neither is set.
    pub fn corpus(&self) -> Vec<String> {
        if self.documents.is_empty() && self.document_ids.is_empty() {
            return DEFAULT_PLAY_IDS.iter().map(|id| gutenberg_path(*id)).collect();
        }

        self.documents
            .iter()
            .cloned()
            .chain(self.document_ids.iter().map(|id| gutenberg_path(*id)))
            .collect()
    }
}

/// Plain-text path of a Project Gutenberg ebook
pub fn gutenberg_path(id: u32) -> String {
    format!("/cache/epub/{}/pg{}.txt", id, id)
}

/// Volunteer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerConfig {
    /// Coordinator host name or address
    #[serde(default = "default_coordinator_host")]
    pub coordinator_host: String,
    /// Coordinator port
    #[serde(default = "default_coordinator_port")]
    pub coordinator_port: u16,
    /// Minimum word length counted
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
    /// Report only the N most frequent words (0 = all)
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// How documents are downloaded
    #[serde(default)]
    pub fetch: FetchMode,
}

fn default_coordinator_host() -> String {
    "localhost".to_string()
}

fn default_coordinator_port() -> u16 {
    DEFAULT_COORDINATOR_PORT
}

fn default_min_word_len() -> usize {
    6
}

fn default_top_n() -> usize {
    20
}

impl Default for VolunteerConfig {
    fn default() -> Self {
        Self {
            coordinator_host: default_coordinator_host(),
            coordinator_port: default_coordinator_port(),
            min_word_len: default_min_word_len(),
            top_n: default_top_n(),
            fetch: FetchMode::default(),
        }
    }
}

impl VolunteerConfig {
    /// `host:port` of the coordinator
    pub fn coordinator_address(&self) -> String {
        format!("{}:{}", self.coordinator_host, self.coordinator_port)
    }
}

/// Document download mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchMode {
    /// HTTPS on port 443
    #[default]
    Https,
    /// Unencrypted HTTP/1.1 on the given port (local document hosts)
    Plain { port: u16 },
}

/// Result output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print only the N most frequent words
    #[serde(default)]
    pub top: Option<usize>,
    /// Also write results as JSON to this path
    #[serde(default)]
    pub json_output: Option<PathBuf>,
}
