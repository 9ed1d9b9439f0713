//! Word frequency table
//!
//! Accumulates `word -> count` pairs. Counts only grow: additions saturate at
//! `u64::MAX` instead of wrapping.

use std::collections::HashMap;

/// Accumulated word counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `word`
    pub fn add(&mut self, word: &str, count: u64) {
        match self.counts.get_mut(word) {
            Some(total) => *total = total.saturating_add(count),
            None => {
                self.counts.insert(word.to_string(), count);
            }
        }
    }

    /// Add every `(word, count)` pair from `partial`
    pub fn merge<'a, I>(&mut self, partial: I)
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        for (word, count) in partial {
            self.add(word, *count);
        }
    }

    /// Count for `word` (0 if never seen)
    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0u64, |acc, c| acc.saturating_add(*c))
    }

    /// All entries, count-descending; ties ordered by word
    pub fn sorted_desc(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }

    /// The `n` most frequent entries (all of them when `n` is 0)
    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries = self.sorted_desc();
        if n > 0 {
            entries.truncate(n);
        }
        entries
    }
}
