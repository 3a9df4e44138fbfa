//! The externally-visible status taxonomy, wire-stable across callers.
//!
//! Internally every operation returns its own small error enum in the
//! teacher's idiom (hand-written `Display`/`Error`/`From<io::Error>`, no
//! `thiserror`). `Status` is the flattened, stable surface those errors are
//! bridged down to at the process boundary — the same two-layer shape the
//! original C library's single `Status` enum collapsed onto, just kept
//! distinct from the richer internal errors here so the internal errors can
//! still carry a message.

use std::fmt;

use crate::codec::LoadError;
use crate::codec::StoreError;
use crate::merge_table::EmptyTable;
use crate::pipeline::JoinError;
use crate::table_view::TableViewError;

/// The stable status tag surfaced to callers and printed by the CLI.
/// Mirrors `Success`/`BadFile`/`EmptyFile`/`InvalidPointerOrSize`/`Error`
/// from the original header; the ALL_CAPS spellings are aliases of the
/// same taxonomy, not distinct variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    BadFile,
    EmptyFile,
    InvalidArgument,
    ResourceExhausted,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Success => "success",
            Status::BadFile => "bad file",
            Status::EmptyFile => "empty file",
            Status::InvalidArgument => "invalid argument",
            Status::ResourceExhausted => "resource exhausted",
        };
        f.write_str(s)
    }
}

impl From<&LoadError> for Status {
    fn from(err: &LoadError) -> Self {
        match err {
            LoadError::Io(_) | LoadError::Open(_) => Status::BadFile,
            LoadError::Empty => Status::EmptyFile,
            LoadError::InvalidArgument => Status::InvalidArgument,
        }
    }
}

impl From<&StoreError> for Status {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Io(_) | StoreError::Open(_) => Status::BadFile,
            StoreError::InvalidArgument => Status::InvalidArgument,
        }
    }
}

impl From<&EmptyTable> for Status {
    fn from(_: &EmptyTable) -> Self {
        Status::EmptyFile
    }
}

impl From<&JoinError> for Status {
    fn from(err: &JoinError) -> Self {
        match err {
            JoinError::BothEmpty => Status::InvalidArgument,
            JoinError::Load(inner) => Status::from(inner),
        }
    }
}

impl From<&TableViewError> for Status {
    fn from(_: &TableViewError) -> Self {
        Status::InvalidArgument
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_load_maps_to_empty_file_status() {
        assert_eq!(Status::from(&LoadError::Empty), Status::EmptyFile);
    }

    #[test]
    fn both_empty_join_maps_to_invalid_argument() {
        assert_eq!(Status::from(&JoinError::BothEmpty), Status::InvalidArgument);
    }
}
