//! Tunable constants shared by the merge table and the binary codec.

use crate::record::Record;

/// Bucket count used for the production merge table. Must stay a power of
/// two; see [`crate::merge_table::MergeHashTable`] for why.
pub const DEFAULT_BUCKETS: usize = 512;

/// Bucket count used by the table's own unit tests, matching the small
/// table size the original implementation used internally.
pub const TEST_BUCKETS: usize = 8;

/// Target chunk size for `load`, in bytes, before rounding to whole pages
/// and whole records. 1 MiB matches the original implementation.
const LOAD_CHUNK_BYTES: usize = 1024 * 1024;

/// Number of records per load chunk. Chosen so that a chunk's byte span is
/// an exact multiple of both the record size and the host page size —
/// `mmap` requires page-aligned offsets, and since every full chunk before
/// it was also this size, every chunk's starting offset lands on a page
/// boundary too.
pub fn batch_records() -> usize {
    let record_size = std::mem::size_of::<Record>();
    let page = page_size::get();
    let aligned_unit = lcm(record_size, page);
    let units = LOAD_CHUNK_BYTES.div_ceil(aligned_unit).max(1);
    (units * aligned_unit) / record_size
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_byte_span_is_page_aligned() {
        let page = page_size::get();
        let bytes = batch_records() * std::mem::size_of::<Record>();
        assert_eq!(bytes % page, 0);
        assert!(bytes > 0);
    }
}
