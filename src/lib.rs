//! vidinfo categorization library - shared modules for all binaries.
//!
//! Groups per-file video metadata into logical videos, picks the preferred
//! copy of each, and merges curated metadata across the group.

pub mod arbiter;
pub mod config;
pub mod errors;
pub mod grouping;
pub mod matching;
pub mod merge;
pub mod models;
pub mod naming;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod quality;
pub mod safety;
pub mod table;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::CategorizeConfig;
pub use errors::{CategorizeError, Result};
pub use merge::AliveIds;
pub use pipeline::{categorize, Categorized};
pub use table::VideoTable;
