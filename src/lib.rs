//! Merge-hash record aggregator and binary record codec for fixed-layout
//! statistics dumps.
//!
//! Two previously produced record dumps are merged into a single
//! deduplicated result, sorted, rendered as a bounded table preview, and
//! persisted back to disk. See [`merge_table`] and [`codec`] for the two
//! load-bearing components.

pub mod codec;
pub mod config;
pub mod hash;
pub mod merge_table;
pub mod pipeline;
pub mod record;
pub mod status;
pub mod table_view;
