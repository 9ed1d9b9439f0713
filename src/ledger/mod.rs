//! Work ledger
//!
//! Tracks every unit of work (one document path) through its lifecycle and
//! owns the global word-frequency table.
//!
//! # Unit Lifecycle
//!
//! ```text
//! Unstarted --assign_next()--> Started --merge_report()--> Finished
//!                                 |  ^
//!                                 +--+  assign_next() reissue (no change)
//! ```
//!
//! # Assignment Policy
//!
//! 1. If any unit is Unstarted, pick one uniformly at random and mark it Started.
//! 2. Otherwise, if any unit is Started, hand one out again unchanged. A
//!    volunteer that takes work and vanishes would otherwise stall the run;
//!    reissuing lets another volunteer finish it.
//! 3. Otherwise there is no work left.
//!
//! Started units never expire. A unit handed to a volunteer that disappears
//! stays Started until some other volunteer is given it via rule 2.
//!
//! Because of rule 2 the same unit can be reported more than once, so merging
//! is idempotent per unit: only the first report for a unit is counted.
//!
//! # Example
//!
//! ```
//! use wordpulse::ledger::{Assignment, WorkLedger};
//! use std::collections::BTreeMap;
//!
//! let mut ledger = WorkLedger::with_seed(["/a"], 7);
//! let path = match ledger.assign_next() {
//!     Assignment::Fresh(path) => path,
//!     other => panic!("unexpected {:?}", other),
//! };
//!
//! let counts: BTreeMap<String, u64> = [("foo".to_string(), 3)].into_iter().collect();
//! ledger.merge_report(&path, &counts);
//!
//! assert!(ledger.is_complete());
//! assert_eq!(ledger.snapshot_sorted_results(), vec![("foo".to_string(), 3)]);
//! ```

use crate::distributed::protocol::WordCounts;
use crate::stats::FrequencyTable;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle state of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Not yet handed to any volunteer
    Unstarted,
    /// Handed out at least once, no report merged yet
    Started,
    /// Report merged (terminal)
    Finished,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitState::Unstarted => write!(f, "unstarted"),
            UnitState::Started => write!(f, "started"),
            UnitState::Finished => write!(f, "finished"),
        }
    }
}

/// Result of [`WorkLedger::assign_next`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Unit was Unstarted and is now Started
    Fresh(String),
    /// Unit was already Started; handed out again
    Reissue(String),
    /// Every unit is Finished
    NoWork,
}

impl Assignment {
    /// Path of the assigned unit, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Assignment::Fresh(path) | Assignment::Reissue(path) => Some(path),
            Assignment::NoWork => None,
        }
    }

    pub fn is_no_work(&self) -> bool {
        matches!(self, Assignment::NoWork)
    }
}

/// Result of [`WorkLedger::merge_report`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Counts added; unit is now Finished
    Merged,
    /// Unit was already Finished; nothing changed
    Duplicate,
    /// Path is not part of the configured corpus; nothing changed
    UnknownUnit,
}

/// Number of units in each state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerProgress {
    pub unstarted: usize,
    pub started: usize,
    pub finished: usize,
}

impl LedgerProgress {
    pub fn total(&self) -> usize {
        self.unstarted + self.started + self.finished
    }
}

impl fmt::Display for LedgerProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} finished, {} started, {} unstarted",
            self.finished,
            self.total(),
            self.started,
            self.unstarted
        )
    }
}

/// In-memory work-assignment state machine
///
/// The set of units is fixed at construction. Every unit is in exactly one
/// state, which the single `path -> state` map guarantees structurally.
pub struct WorkLedger {
    /// Unit path → lifecycle state
    units: BTreeMap<String, UnitState>,

    /// Global word counts merged from reports
    word_counts: FrequencyTable,

    /// Source of the random unit choice
    rng: Xoshiro256PlusPlus,
}

impl WorkLedger {
    /// Create a ledger over `paths`, all Unstarted
    ///
    /// Duplicate paths collapse into one unit.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(paths, Xoshiro256PlusPlus::from_entropy())
    }

    /// Create a ledger with a fixed RNG seed
    ///
    /// Useful for reproducible tests.
    pub fn with_seed<I, S>(paths: I, seed: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_rng(paths, Xoshiro256PlusPlus::seed_from_u64(seed))
    }

    fn with_rng<I, S>(paths: I, rng: Xoshiro256PlusPlus) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let units = paths
            .into_iter()
            .map(|path| (path.into(), UnitState::Unstarted))
            .collect();

        Self {
            units,
            word_counts: FrequencyTable::new(),
            rng,
        }
    }

    /// Pick the next unit for a volunteer asking for work
    pub fn assign_next(&mut self) -> Assignment {
        if let Some(path) = self.choose_in(UnitState::Unstarted) {
            self.units.insert(path.clone(), UnitState::Started);
            return Assignment::Fresh(path);
        }

        match self.choose_in(UnitState::Started) {
            Some(path) => Assignment::Reissue(path),
            None => Assignment::NoWork,
        }
    }

    /// Merge a volunteer's counts for `path`
    ///
    /// Only the first report for a unit changes the table; later ones, and
    /// reports for paths outside the corpus, are no-ops.
    pub fn merge_report(&mut self, path: &str, partial: &WordCounts) -> MergeOutcome {
        let state = match self.units.get_mut(path) {
            Some(state) => state,
            None => return MergeOutcome::UnknownUnit,
        };

        if *state == UnitState::Finished {
            return MergeOutcome::Duplicate;
        }

        *state = UnitState::Finished;
        self.word_counts.merge(partial);
        MergeOutcome::Merged
    }

    /// Whether every unit is Finished
    pub fn is_complete(&self) -> bool {
        self.units.values().all(|state| *state == UnitState::Finished)
    }

    /// All words with their global counts, count-descending
    ///
    /// Words with equal counts are ordered alphabetically.
    pub fn snapshot_sorted_results(&self) -> Vec<(String, u64)> {
        self.word_counts.sorted_desc()
    }

    /// State of `path`, or `None` if it is not a configured unit
    pub fn state_of(&self, path: &str) -> Option<UnitState> {
        self.units.get(path).copied()
    }

    /// Number of units in each state
    pub fn progress(&self) -> LedgerProgress {
        let mut progress = LedgerProgress::default();
        for state in self.units.values() {
            match state {
                UnitState::Unstarted => progress.unstarted += 1,
                UnitState::Started => progress.started += 1,
                UnitState::Finished => progress.finished += 1,
            }
        }
        progress
    }

    /// Number of configured units
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Configured unit paths in sorted order
    pub fn unit_paths(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    /// Global count for a single word
    pub fn word_count(&self, word: &str) -> u64 {
        self.word_counts.get(word)
    }

    /// Number of distinct words merged so far
    pub fn distinct_words(&self) -> usize {
        self.word_counts.len()
    }

    /// Sum of all merged counts
    pub fn total_words(&self) -> u64 {
        self.word_counts.total()
    }

    fn choose_in(&mut self, wanted: UnitState) -> Option<String> {
        let candidates: Vec<&String> = self
            .units
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(path, _)| path)
            .collect();

        candidates.choose(&mut self.rng).map(|path| (*path).clone())
    }
}

impl fmt::Debug for WorkLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkLedger")
            .field("units", &self.units)
            .field("distinct_words", &self.word_counts.len())
            .finish()
    }
}
