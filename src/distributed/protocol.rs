//! Coordinator/volunteer wire protocol
//!
//! This module defines the application-layer messages exchanged between the
//! coordinator and volunteers, plus the request a volunteer sends to the
//! document host. Every message is UTF-8 text, one field per line.
//!
//! # Message Flow
//!
//! ```text
//! Volunteer                       Coordinator
//!     |                                |
//!     |-------- REQWORK -------------->|
//!     |<------- ACK_REQWORK -----------|   Host:/Path: or NO_WORK
//!     |                                |
//!     |   (fetch + count the document) |
//!     |                                |
//!     |-------- REQ_WORK_COMP <path> ->|   <word> <count> lines
//!     |<------- ACK_WORK_COMP ---------|
//! ```
//!
//! Each exchange uses its own connection: one request, one response.
//!
//! # Message Framing
//!
//! There is no length prefix. The first line carries a literal tag that
//! selects the variant, and every variant's grammar terminates itself: either
//! the tag line is the whole message, or the body ends with a blank line.
//!
//! ```text
//! REQWORK
//!
//! ACK_REQWORK
//! Host: www.gutenberg.org
//! Path: /cache/epub/1513/pg1513.txt
//! <blank>
//!
//! ACK_REQWORK NO_WORK
//!
//! REQ_WORK_COMP /cache/epub/1513/pg1513.txt
//! romeo 16
//! juliet 18
//! <blank>
//!
//! ACK_WORK_COMP
//! ```

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Word -> count table carried by a work report
///
/// Ordered by word so the encoded form is deterministic.
pub type WordCounts = BTreeMap<String, u64>;

/// Marker following `ACK_REQWORK` when there is nothing left to hand out
///
/// This is the only no-work form; it does not depend on which field of the
/// offer was missing.
pub const NO_WORK_MARKER: &str = "NO_WORK";

/// HTTP version sent to the document host
pub const HTTP_VERSION: &str = "HTTP/1.1";

const HOST_KEY: &str = "Host";
const PATH_KEY: &str = "Path";

/// Message variant, identified on the wire by the tag on the first line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    DocumentFetchRequest,
    WorkRequest,
    WorkOffer,
    WorkReport,
    WorkAck,
}

impl MessageKind {
    /// Literal tag that starts the first line of this variant
    pub const fn tag(self) -> &'static str {
        match self {
            MessageKind::DocumentFetchRequest => "GET",
            MessageKind::WorkRequest => "REQWORK",
            MessageKind::WorkOffer => "ACK_REQWORK",
            MessageKind::WorkReport => "REQ_WORK_COMP",
            MessageKind::WorkAck => "ACK_WORK_COMP",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::DocumentFetchRequest => "DocumentFetchRequest",
            MessageKind::WorkRequest => "WorkRequest",
            MessageKind::WorkOffer => "WorkOffer",
            MessageKind::WorkReport => "WorkReport",
            MessageKind::WorkAck => "WorkAck",
        };
        f.write_str(name)
    }
}

/// Tags are tried in this order when decoding.
const DECODE_ORDER: [MessageKind; 5] = [
    MessageKind::DocumentFetchRequest,
    MessageKind::WorkRequest,
    MessageKind::WorkOffer,
    MessageKind::WorkReport,
    MessageKind::WorkAck,
];

/// Protocol message
///
/// All messages exchanged between volunteers, the coordinator and the
/// document host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Document fetch (Volunteer → document host)
    DocumentFetch(DocumentFetchRequest),

    /// Work request (Volunteer → Coordinator)
    WorkRequest,

    /// Work offer (Coordinator → Volunteer)
    ///
    /// Either names a document to analyze or says there is no work left.
    WorkOffer(WorkOffer),

    /// Work report (Volunteer → Coordinator)
    ///
    /// Word counts for a previously offered document.
    WorkReport(WorkReport),

    /// Work acknowledgment (Coordinator → Volunteer)
    ///
    /// Sent for every report, including duplicates.
    WorkAck,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::DocumentFetch(_) => MessageKind::DocumentFetchRequest,
            Message::WorkRequest => MessageKind::WorkRequest,
            Message::WorkOffer(_) => MessageKind::WorkOffer,
            Message::WorkReport(_) => MessageKind::WorkReport,
            Message::WorkAck => MessageKind::WorkAck,
        }
    }

    /// Encode to wire text. See [`encode`].
    pub fn encode(&self) -> String {
        encode(self)
    }
}

/// Rejected message construction
///
/// Raised when a field value would make the encoded form ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must not contain whitespace: {value:?}")]
    Whitespace { field: &'static str, value: String },
}

/// Decode failure
///
/// Any of these abandons the connection the message arrived on.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unrecognized message: {0:?}")]
    UnknownPrefix(String),

    #[error("malformed {kind} line: {line:?}")]
    Malformed { kind: MessageKind, line: String },

    #[error("{kind} is missing its {field} field")]
    MissingField { kind: MessageKind, field: &'static str },

    #[error("{kind} repeats {field:?}")]
    DuplicateField { kind: MessageKind, field: String },

    #[error("invalid count {token:?} for word {word:?}")]
    InvalidCount { word: String, token: String },

    #[error("stream ended before the {0} message was complete")]
    UnexpectedEof(MessageKind),

    #[error("stream ended before any message arrived")]
    Empty,

    #[error("failed to read message: {0}")]
    Io(#[from] std::io::Error),
}

/// Request for a document body from the document host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFetchRequest {
    host: String,
    path: String,
}

impl DocumentFetchRequest {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Result<Self, MessageError> {
        let host = host.into();
        let path = path.into();
        validate_token("host", &host)?;
        validate_token("path", &path)?;
        Ok(Self { host, path })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Coordinator's answer to a work request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkOffer {
    /// Download `path` from `host`, count it, report back
    Assignment { host: String, path: String },

    /// Every unit is finished
    NoWork,
}

impl WorkOffer {
    /// Build an offer, collapsing to [`WorkOffer::NoWork`] when either field
    /// is empty
    ///
    /// A half-filled assignment is never produced.
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Result<Self, MessageError> {
        let host = host.into();
        let path = path.into();
        if host.is_empty() || path.is_empty() {
            return Ok(WorkOffer::NoWork);
        }
        Self::assignment(host, path)
    }

    /// Build an assignment, rejecting empty or whitespace-bearing fields
    pub fn assignment(host: impl Into<String>, path: impl Into<String>) -> Result<Self, MessageError> {
        let host = host.into();
        let path = path.into();
        validate_token("host", &host)?;
        validate_token("path", &path)?;
        Ok(WorkOffer::Assignment { host, path })
    }

    pub fn is_no_work(&self) -> bool {
        matches!(self, WorkOffer::NoWork)
    }

    pub fn host(&self) -> Option<&str> {
        match self {
            WorkOffer::Assignment { host, .. } => Some(host),
            WorkOffer::NoWork => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            WorkOffer::Assignment { path, .. } => Some(path),
            WorkOffer::NoWork => None,
        }
    }
}

/// Word counts for one unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkReport {
    path: String,
    counts: WordCounts,
}

impl WorkReport {
    /// Build a report
    ///
    /// The path and every word must be a single non-empty token.
    pub fn new(path: impl Into<String>, counts: WordCounts) -> Result<Self, MessageError> {
        let path = path.into();
        validate_token("path", &path)?;
        for word in counts.keys() {
            validate_token("word", word)?;
        }
        Ok(Self { path, counts })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn counts(&self) -> &WordCounts {
        &self.counts
    }

    pub fn into_parts(self) -> (String, WordCounts) {
        (self.path, self.counts)
    }
}

fn validate_token(field: &'static str, value: &str) -> Result<(), MessageError> {
    if value.is_empty() {
        return Err(MessageError::Empty { field });
    }
    if value.chars().any(char::is_whitespace) {
        return Err(MessageError::Whitespace {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Encode a message to its wire text
///
/// Field values were validated at construction, so the output always decodes
/// back to the same message.
pub fn encode(msg: &Message) -> String {
    match msg {
        Message::DocumentFetch(req) => format!(
            "{} {} {}\r\n{}: {}\r\n\r\n",
            MessageKind::DocumentFetchRequest.tag(),
            req.path,
            HTTP_VERSION,
            HOST_KEY,
            req.host,
        ),
        Message::WorkRequest => format!("{}\n", MessageKind::WorkRequest.tag()),
        Message::WorkOffer(WorkOffer::Assignment { host, path }) => format!(
            "{}\n{}: {}\n{}: {}\n\n",
            MessageKind::WorkOffer.tag(),
            HOST_KEY,
            host,
            PATH_KEY,
            path,
        ),
        Message::WorkOffer(WorkOffer::NoWork) => {
            format!("{} {}\n", MessageKind::WorkOffer.tag(), NO_WORK_MARKER)
        }
        Message::WorkReport(report) => {
            let mut out = format!("{} {}\n", MessageKind::WorkReport.tag(), report.path);
            for (word, count) in &report.counts {
                out.push_str(word);
                out.push(' ');
                out.push_str(&count.to_string());
                out.push('\n');
            }
            out.push('\n');
            out
        }
        Message::WorkAck => format!("{}\n", MessageKind::WorkAck.tag()),
    }
}

/// Decode one message from a buffered stream
///
/// Reads the first line, selects the variant by its tag and lets that
/// variant's parser consume exactly the lines it owns. Bytes after the
/// message are left unread.
pub async fn decode<R>(reader: &mut R) -> Result<Message, DecodeError>
where
    R: AsyncBufRead + Unpin,
{
    let first = next_line(reader).await?.ok_or(DecodeError::Empty)?;

    let (tag, rest) = match first.split_once(' ') {
        Some((tag, rest)) => (tag, Some(rest)),
        None => (first.as_str(), None),
    };

    let kind = DECODE_ORDER
        .iter()
        .copied()
        .find(|kind| kind.tag() == tag)
        .ok_or_else(|| DecodeError::UnknownPrefix(first.clone()))?;

    match kind {
        MessageKind::DocumentFetchRequest => decode_document_fetch(&first, rest, reader).await,
        MessageKind::WorkRequest => {
            expect_bare(kind, &first, rest)?;
            Ok(Message::WorkRequest)
        }
        MessageKind::WorkOffer => decode_work_offer(&first, rest, reader).await,
        MessageKind::WorkReport => decode_work_report(&first, rest, reader).await,
        MessageKind::WorkAck => {
            expect_bare(kind, &first, rest)?;
            Ok(Message::WorkAck)
        }
    }
}

/// Read a complete message from a stream. Alias for [`decode`].
pub async fn read_message<R>(reader: &mut R) -> Result<Message, DecodeError>
where
    R: AsyncBufRead + Unpin,
{
    decode(reader).await
}

/// Write a message to a stream
///
/// Encodes the message, writes it and flushes so the peer sees it
/// immediately.
pub async fn write_message<W>(writer: &mut W, msg: &Message) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(encode(msg).as_bytes()).await?;
    writer.flush().await
}

/// Read one line without its `\n` / `\r\n` ending. `None` at end of stream.
async fn next_line<R>(reader: &mut R) -> Result<Option<String>, DecodeError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

fn expect_bare(kind: MessageKind, first: &str, rest: Option<&str>) -> Result<(), DecodeError> {
    match rest {
        None => Ok(()),
        Some(_) => Err(DecodeError::Malformed {
            kind,
            line: first.to_string(),
        }),
    }
}

/// Split a `Key: value` line.
fn split_header(kind: MessageKind, line: &str) -> Result<(String, String), DecodeError> {
    let (key, value) = line.split_once(':').ok_or_else(|| DecodeError::Malformed {
        kind,
        line: line.to_string(),
    })?;
    let value = value.trim();
    if key.is_empty() || value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(DecodeError::Malformed {
            kind,
            line: line.to_string(),
        });
    }
    Ok((key.to_string(), value.to_string()))
}

async fn decode_document_fetch<R>(
    first: &str,
    rest: Option<&str>,
    reader: &mut R,
) -> Result<Message, DecodeError>
where
    R: AsyncBufRead + Unpin,
{
    let kind = MessageKind::DocumentFetchRequest;
    let malformed = |line: &str| DecodeError::Malformed {
        kind,
        line: line.to_string(),
    };

    let parts: Vec<&str> = rest.unwrap_or("").split_whitespace().collect();
    let path = match parts.as_slice() {
        [path, version] if version.starts_with("HTTP/") => path.to_string(),
        _ => return Err(malformed(first)),
    };

    let mut host = None;
    loop {
        let line = next_line(reader)
            .await?
            .ok_or(DecodeError::UnexpectedEof(kind))?;
        if line.is_empty() {
            break;
        }
        let (key, value) = split_header(kind, &line)?;
        // Other HTTP headers are allowed and ignored.
        if key.eq_ignore_ascii_case(HOST_KEY) {
            if host.is_some() {
                return Err(DecodeError::DuplicateField { kind, field: key });
            }
            host = Some(value);
        }
    }

    let host = host.ok_or(DecodeError::MissingField { kind, field: "Host" })?;
    Ok(Message::DocumentFetch(DocumentFetchRequest { host, path }))
}

async fn decode_work_offer<R>(
    first: &str,
    rest: Option<&str>,
    reader: &mut R,
) -> Result<Message, DecodeError>
where
    R: AsyncBufRead + Unpin,
{
    let kind = MessageKind::WorkOffer;
    match rest {
        Some(NO_WORK_MARKER) => return Ok(Message::WorkOffer(WorkOffer::NoWork)),
        Some(_) => {
            return Err(DecodeError::Malformed {
                kind,
                line: first.to_string(),
            })
        }
        None => {}
    }

    let mut host = None;
    let mut path = None;
    loop {
        let line = next_line(reader)
            .await?
            .ok_or(DecodeError::UnexpectedEof(kind))?;
        if line.is_empty() {
            break;
        }
        let (key, value) = split_header(kind, &line)?;
        let slot = match key.as_str() {
            HOST_KEY => &mut host,
            PATH_KEY => &mut path,
            _ => return Err(DecodeError::Malformed { kind, line }),
        };
        if slot.is_some() {
            return Err(DecodeError::DuplicateField { kind, field: key });
        }
        *slot = Some(value);
    }

    let host = host.ok_or(DecodeError::MissingField { kind, field: HOST_KEY })?;
    let path = path.ok_or(DecodeError::MissingField { kind, field: PATH_KEY })?;
    Ok(Message::WorkOffer(WorkOffer::Assignment { host, path }))
}

async fn decode_work_report<R>(
    first: &str,
    rest: Option<&str>,
    reader: &mut R,
) -> Result<Message, DecodeError>
where
    R: AsyncBufRead + Unpin,
{
    let kind = MessageKind::WorkReport;
    let path = match rest.map(str::trim) {
        None | Some("") => return Err(DecodeError::MissingField { kind, field: "unit id" }),
        Some(path) if path.chars().any(char::is_whitespace) => {
            return Err(DecodeError::Malformed {
                kind,
                line: first.to_string(),
            })
        }
        Some(path) => path.to_string(),
    };

    let mut counts = WordCounts::new();
    loop {
        let line = next_line(reader)
            .await?
            .ok_or(DecodeError::UnexpectedEof(kind))?;
        if line.is_empty() {
            break;
        }

        let mut tokens = line.split_whitespace();
        let (word, token) = match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(word), Some(token), None) => (word, token),
            _ => {
                return Err(DecodeError::Malformed {
                    kind,
                    line: line.clone(),
                })
            }
        };
        let count: u64 = token.parse().map_err(|_| DecodeError::InvalidCount {
            word: word.to_string(),
            token: token.to_string(),
        })?;
        if counts.insert(word.to_string(), count).is_some() {
            return Err(DecodeError::DuplicateField {
                kind,
                field: word.to_string(),
            });
        }
    }

    Ok(Message::WorkReport(WorkReport { path, counts }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn decode_str(text: &str) -> Result<Message, DecodeError> {
        let mut reader = text.as_bytes();
        decode(&mut reader).await
    }

    fn sample_counts() -> WordCounts {
        [("romeo", 16), ("juliet", 18), ("rose", 7)]
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .collect()
    }

    #[tokio::test]
    async fn test_invalid_decode() {
        let err = decode_str("bogus msg").await.unwrap_err();
        assert!(matches!(err, DecodeError::UnknownPrefix(ref line) if line == "bogus msg"));
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let err = decode_str("").await.unwrap_err();
        assert!(matches!(err, DecodeError::Empty));
    }

    #[tokio::test]
    async fn test_document_fetch_request() {
        let msg = Message::DocumentFetch(DocumentFetchRequest::new("some-host", "some-path").unwrap());

        let encoded = msg.encode();
        assert_eq!(encoded, "GET some-path HTTP/1.1\r\nHost: some-host\r\n\r\n");

        match decode_str(&encoded).await.unwrap() {
            Message::DocumentFetch(req) => {
                assert_eq!(req.host(), "some-host");
                assert_eq!(req.path(), "some-path");
            }
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_document_fetch_missing_host() {
        let err = decode_str("GET /x HTTP/1.1\r\nAccept: */*\r\n\r\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "Host", .. }));
    }

    #[tokio::test]
    async fn test_work_request() {
        let encoded = Message::WorkRequest.encode();
        assert_eq!(encoded, "REQWORK\n");
        assert_eq!(decode_str(&encoded).await.unwrap(), Message::WorkRequest);
    }

    #[tokio::test]
    async fn test_work_request_with_trailing_text() {
        let err = decode_str("REQWORK please\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { kind: MessageKind::WorkRequest, .. }));
    }

    #[tokio::test]
    async fn test_work_offer_assignment() {
        let offer = WorkOffer::new("some-host", "some-path").unwrap();
        let msg = Message::WorkOffer(offer.clone());

        let encoded = msg.encode();
        assert_eq!(encoded, "ACK_REQWORK\nHost: some-host\nPath: some-path\n\n");

        assert_eq!(decode_str(&encoded).await.unwrap(), msg);
        assert_eq!(offer.host(), Some("some-host"));
        assert_eq!(offer.path(), Some("some-path"));
    }

    #[tokio::test]
    async fn test_work_offer_keys_in_either_order() {
        let msg = decode_str("ACK_REQWORK\nPath: /p\nHost: h\n\n").await.unwrap();
        assert_eq!(msg, Message::WorkOffer(WorkOffer::assignment("h", "/p").unwrap()));
    }

    #[tokio::test]
    async fn test_work_offer_no_work_forms() {
        let expected = "ACK_REQWORK NO_WORK\n";

        // Empty path, empty host, or both all collapse to one encoding.
        for (host, path) in [("some-host", ""), ("", "some-path"), ("", "")] {
            let offer = WorkOffer::new(host, path).unwrap();
            assert!(offer.is_no_work());
            assert_eq!(Message::WorkOffer(offer).encode(), expected);
        }

        assert_eq!(
            decode_str(expected).await.unwrap(),
            Message::WorkOffer(WorkOffer::NoWork)
        );
    }

    #[test]
    fn test_work_offer_assignment_rejects_empty_fields() {
        assert_eq!(
            WorkOffer::assignment("some-host", ""),
            Err(MessageError::Empty { field: "path" })
        );
        assert_eq!(
            WorkOffer::assignment("", "/p"),
            Err(MessageError::Empty { field: "host" })
        );
        assert!(matches!(
            WorkOffer::new("some host", "/p"),
            Err(MessageError::Whitespace { field: "host", .. })
        ));
    }

    #[tokio::test]
    async fn test_work_offer_missing_path() {
        let err = decode_str("ACK_REQWORK\nHost: h\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "Path", .. }));
    }

    #[tokio::test]
    async fn test_work_offer_unknown_key() {
        let err = decode_str("ACK_REQWORK\nHost: h\nPort: 80\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { kind: MessageKind::WorkOffer, .. }));
    }

    #[tokio::test]
    async fn test_work_offer_truncated() {
        let err = decode_str("ACK_REQWORK\nHost: h\nPath: /p\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof(MessageKind::WorkOffer)));
    }

    #[tokio::test]
    async fn test_work_offer_unknown_marker() {
        let err = decode_str("ACK_REQWORK NoWork_noHost\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_work_report() {
        let report = WorkReport::new("path-to-play", sample_counts()).unwrap();
        let msg = Message::WorkReport(report);

        let encoded = msg.encode();
        assert_eq!(
            encoded,
            "REQ_WORK_COMP path-to-play\njuliet 18\nromeo 16\nrose 7\n\n"
        );

        match decode_str(&encoded).await.unwrap() {
            Message::WorkReport(decoded) => {
                assert_eq!(decoded.path(), "path-to-play");
                assert_eq!(decoded.counts(), &sample_counts());
            }
            other => panic!("Wrong message type: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_work_report_empty_counts() {
        let msg = Message::WorkReport(WorkReport::new("/p", WordCounts::new()).unwrap());
        assert_eq!(msg.encode(), "REQ_WORK_COMP /p\n\n");
        assert_eq!(decode_str(&msg.encode()).await.unwrap(), msg);
    }

    #[tokio::test]
    async fn test_work_report_invalid_count() {
        let err = decode_str("REQ_WORK_COMP /p\nromeo -3\n\n").await.unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidCount { ref word, ref token } if word == "romeo" && token == "-3"
        ));

        let err = decode_str("REQ_WORK_COMP /p\nromeo many\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::InvalidCount { .. }));
    }

    #[tokio::test]
    async fn test_work_report_malformed_line() {
        let err = decode_str("REQ_WORK_COMP /p\nromeo\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { kind: MessageKind::WorkReport, .. }));

        let err = decode_str("REQ_WORK_COMP /p\nromeo 1 2\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_work_report_missing_id() {
        let err = decode_str("REQ_WORK_COMP\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::MissingField { field: "unit id", .. }));
    }

    #[tokio::test]
    async fn test_work_report_duplicate_word() {
        let err = decode_str("REQ_WORK_COMP /p\nrose 1\nrose 2\n\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::DuplicateField { .. }));
    }

    #[tokio::test]
    async fn test_work_report_truncated() {
        let err = decode_str("REQ_WORK_COMP /p\nrose 1\n").await.unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof(MessageKind::WorkReport)));
    }

    #[test]
    fn test_work_report_rejects_ambiguous_words() {
        let mut counts = WordCounts::new();
        counts.insert("two words".to_string(), 1);
        assert!(matches!(
            WorkReport::new("/p", counts),
            Err(MessageError::Whitespace { field: "word", .. })
        ));

        let mut counts = WordCounts::new();
        counts.insert(String::new(), 1);
        assert_eq!(
            WorkReport::new("/p", counts),
            Err(MessageError::Empty { field: "word" })
        );
    }

    #[tokio::test]
    async fn test_work_ack() {
        let encoded = Message::WorkAck.encode();
        assert_eq!(encoded, "ACK_WORK_COMP\n");
        assert_eq!(decode_str(&encoded).await.unwrap(), Message::WorkAck);
    }

    #[tokio::test]
    async fn test_crlf_line_endings() {
        let msg = decode_str("ACK_REQWORK\r\nHost: h\r\nPath: /p\r\n\r\n").await.unwrap();
        assert_eq!(msg, Message::WorkOffer(WorkOffer::assignment("h", "/p").unwrap()));
    }

    #[tokio::test]
    async fn test_messages_are_self_terminating() {
        let report = Message::WorkReport(WorkReport::new("/a", sample_counts()).unwrap());
        let offer = Message::WorkOffer(WorkOffer::assignment("h", "/b").unwrap());
        let stream = format!(
            "{}{}{}{}",
            report.encode(),
            offer.encode(),
            Message::WorkAck.encode(),
            Message::WorkRequest.encode()
        );

        let mut reader = BufReader::new(stream.as_bytes());
        assert_eq!(decode(&mut reader).await.unwrap(), report);
        assert_eq!(decode(&mut reader).await.unwrap(), offer);
        assert_eq!(decode(&mut reader).await.unwrap(), Message::WorkAck);
        assert_eq!(decode(&mut reader).await.unwrap(), Message::WorkRequest);
        assert!(matches!(decode(&mut reader).await, Err(DecodeError::Empty)));
    }

    #[tokio::test]
    async fn test_write_message() {
        let (mut client, server) = tokio::io::duplex(256);
        write_message(&mut client, &Message::WorkRequest).await.unwrap();
        drop(client);

        let mut reader = BufReader::new(server);
        assert_eq!(read_message(&mut reader).await.unwrap(), Message::WorkRequest);
    }

    #[test]
    fn test_message_kind_tags() {
        assert_eq!(Message::WorkRequest.kind().tag(), "REQWORK");
        assert_eq!(Message::WorkAck.kind().tag(), "ACK_WORK_COMP");
        assert_eq!(MessageKind::WorkReport.to_string(), "WorkReport");
    }
}
