//! Chunked, memory-mapped persistence of [`Record`] arrays.
//!
//! `store` truncates the destination file to the exact byte span of the
//! records, maps that span with write protection, copies the byte image in,
//! and requests an asynchronous writeback (`MS_ASYNC` semantics via
//! [`memmap2::MmapMut::flush_async`]) rather than waiting for durable
//! persistence. `load` walks the file in page-aligned [`config::batch_records`]
//! chunks rather than mapping the whole file at once, bounding peak virtual
//! address commitment for very large dumps; any trailing bytes smaller than
//! one record are silently discarded.
//!
//! Endianness is not negotiated: stored files are only portable between
//! hosts that share byte order, matching the limitation of the original
//! implementation this codec is modeled on.

use std::fmt;
use std::fs::File;
use std::fs::OpenOptions;
use std::path::Path;

use memmap2::MmapMut;
use memmap2::MmapOptions;
use zerocopy::FromBytes;
use zerocopy::IntoBytes;

use crate::config::batch_records;
use crate::record::Record;

const RECORD_SIZE: usize = std::mem::size_of::<Record>();

#[derive(Debug)]
pub enum StoreError {
    InvalidArgument,
    Open(std::io::Error),
    Io(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidArgument => write!(f, "no records to store"),
            StoreError::Open(err) => write!(f, "cannot open destination file: {err}"),
            StoreError::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}
impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug)]
pub enum LoadError {
    InvalidArgument,
    Open(std::io::Error),
    Empty,
    Io(std::io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::InvalidArgument => write!(f, "invalid load arguments"),
            LoadError::Open(err) => write!(f, "cannot open source file: {err}"),
            LoadError::Empty => write!(f, "source file is empty"),
            LoadError::Io(err) => write!(f, "IO error: {err}"),
        }
    }
}
impl std::error::Error for LoadError {}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Truncates `path` to `records.len() * size_of::<Record>()` bytes, maps it
/// writable, and copies `records` into the mapping. The file must already
/// exist; creating it is the caller's responsibility.
pub fn store(path: &Path, records: &[Record]) -> Result<(), StoreError> {
    if records.is_empty() {
        return Err(StoreError::InvalidArgument);
    }

    // A writable MAP_SHARED mapping requires the fd itself be opened
    // read-write; a write-only fd fails `mmap` with EACCES.
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(StoreError::Open)?;

    let byte_len = records.len() * RECORD_SIZE;
    file.set_len(byte_len as u64)?;

    let mut mmap = unsafe { MmapMut::map_mut(&file)? };
    mmap[..byte_len].copy_from_slice(records.as_bytes());
    mmap.flush_async()?;

    Ok(())
}

/// Opens `path` read-only, clamps its length down to a whole multiple of
/// `size_of::<Record>()`, and reads it back in page-aligned chunks.
pub fn load(path: &Path) -> Result<Vec<Record>, LoadError> {
    let file = File::open(path).map_err(LoadError::Open)?;
    let file_len = file.metadata()?.len() as usize;

    if file_len == 0 {
        return Err(LoadError::Empty);
    }

    let total_records = file_len / RECORD_SIZE;
    if total_records == 0 {
        return Err(LoadError::Empty);
    }

    let batch = batch_records();
    let mut out = Vec::with_capacity(total_records);
    let mut remaining = total_records;
    let mut record_offset = 0usize;

    while remaining > 0 {
        let chunk_records = remaining.min(batch);
        let byte_offset = record_offset * RECORD_SIZE;
        let chunk_bytes = chunk_records * RECORD_SIZE;

        let mmap = unsafe {
            MmapOptions::new()
                .offset(byte_offset as u64)
                .len(chunk_bytes)
                .map(&file)?
        };
        let chunk: &[Record] =
            <[Record]>::ref_from_bytes(&mmap[..chunk_bytes]).expect("chunk is record-aligned");
        out.extend_from_slice(chunk);

        remaining -= chunk_records;
        record_offset += chunk_records;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn make_records() -> Vec<Record> {
        vec![
            Record::new(90889, 13, 3.567, false, 3),
            Record::new(90089, 1, 88.90, true, 0),
        ]
    }

    #[test]
    fn round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.bin");
        std::fs::File::create(&path).unwrap();

        let records = make_records();
        store(&path, &records).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn empty_file_reports_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::File::create(&path).unwrap();

        match load(&path) {
            Err(LoadError::Empty) => {}
            other => panic!("expected Empty, got {other:?}"),
        }
    }

    #[test]
    fn trailing_partial_record_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");
        let mut file = std::fs::File::create(&path).unwrap();

        let records = make_records();
        file.write_all(records.as_bytes()).unwrap();
        file.write_all(&[0u8; 1]).unwrap();
        drop(file);

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn store_rejects_empty_slice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noop.bin");
        std::fs::File::create(&path).unwrap();
        assert!(matches!(
            store(&path, &[]),
            Err(StoreError::InvalidArgument)
        ));
    }
}
