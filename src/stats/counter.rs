//! Local word counting
//!
//! Turns a document body into the partial table a volunteer reports. Tokens
//! are whitespace-separated, lowercased, and kept only when they reach the
//! configured minimum length.
//!
//! # Example
//!
//! ```
//! use wordpulse::stats::WordCounter;
//!
//! let counter = WordCounter::new(6, 0);
//! let counts = counter.count("Wherefore art thou Romeo? wherefore");
//! assert_eq!(counts.get("wherefore"), Some(&2));
//! assert_eq!(counts.get("art"), None);
//! ```

use super::FrequencyTable;
use crate::distributed::protocol::WordCounts;

/// Counts words in document text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCounter {
    /// Minimum token length in characters
    min_word_len: usize,

    /// Keep only the N most frequent words (0 = keep all)
    top_n: usize,
}

impl WordCounter {
    pub fn new(min_word_len: usize, top_n: usize) -> Self {
        Self {
            min_word_len: min_word_len.max(1),
            top_n,
        }
    }

    pub fn min_word_len(&self) -> usize {
        self.min_word_len
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Add the qualifying words of one line to `table`
    pub fn tally_line(&self, line: &str, table: &mut FrequencyTable) {
        for token in line.split_whitespace() {
            if token.chars().count() >= self.min_word_len {
                table.add(&token.to_lowercase(), 1);
            }
        }
    }

    /// Full table for `text`, before the top-N cut
    pub fn tally(&self, text: &str) -> FrequencyTable {
        let mut table = FrequencyTable::new();
        for line in text.lines() {
            self.tally_line(line, &mut table);
        }
        table
    }

    /// Partial counts to report for `text`
    pub fn count(&self, text: &str) -> WordCounts {
        self.tally(text).top(self.top_n).into_iter().collect()
    }
}

impl Default for WordCounter {
    /// Words longer than five characters, twenty most frequent
    fn default() -> Self {
        Self::new(6, 20)
    }
}
