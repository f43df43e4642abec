//! Result-stream processing: extraction, scrubbing, merging, and the
//! consumer that folds agent results into renderable section events.

pub mod consumer;
pub mod extract;
pub mod merge;
pub mod sanitize;

pub use consumer::{SectionEvent, SectionTracker};
pub use extract::extract_first_object;
pub use merge::{merge_unique_quotes, merge_unique_scriptures, sort_presidents_quotes};
pub use sanitize::{sanitize_quote, sanitize_scripture};
