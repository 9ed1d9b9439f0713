//! Word statistics
//!
//! - **FrequencyTable**: accumulated `word -> count` pairs with saturating adds
//! - **WordCounter**: turns document text into the partial counts a volunteer reports

pub mod counter;
pub mod frequency;

pub use counter::WordCounter;
pub use frequency::FrequencyTable;
