//! In-memory state shared between the update loop and its readers.
//!
//! - `QueryRegistry`: the saved queries, swapped wholesale on reload
//! - `FeedStore`: the last successfully built feed per query name
//!
//! All state is rebuilt from scratch on restart. Readers always see either
//! the old or the new value in full, never a partial update.

pub mod memory;
pub mod queries;

// Re-export for convenience
pub use memory::FeedStore;
pub use queries::QueryRegistry;
