//! The merge-hash aggregator: a chained hash table that deduplicates
//! records by key and folds duplicates through a pluggable combine
//! operator.
//!
//! Ownership mirrors the original design without raw pointers: the table
//! owns a `Vec` of buckets, each bucket owns a `Vec` of nodes, each node
//! owns exactly one [`Record`] plus its precomputed hash. The original's
//! manual capacity-doubling-from-one bucket growth is replaced by `Vec`'s
//! own amortized doubling, which gives the same asymptotic behaviour
//! without a hand-rolled allocator dance.

use std::fmt;

use crate::hash::bucket_index;
use crate::hash::DefaultHasher;
use crate::hash::KeyHasher;
use crate::record::default_key_eq;
use crate::record::Record;

/// Field-wise fold applied when two records share a key.
pub trait Combine {
    fn combine(&self, into: &mut Record, other: &Record);
}

/// Key-equality predicate used to decide whether two records are the same
/// entry.
pub trait KeyEq {
    fn eq(&self, lhs: &Record, rhs: &Record) -> bool;
}

/// `count`/`cost` accumulate additively, `primary` is conjunctive, `mode`
/// takes the larger value. `id` is left unchanged. Not commutative in
/// `count`/`cost` at the floating-point level — addition order affects
/// rounding, which this accepts as a known artefact of the accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCombine;

impl Combine for DefaultCombine {
    fn combine(&self, into: &mut Record, other: &Record) {
        into.count += other.count;
        into.cost += other.cost;
        into.set_primary(into.primary() && other.primary());
        into.set_mode(into.mode().max(other.mode()));
    }
}

/// Equality on `id` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEq;

impl KeyEq for DefaultEq {
    fn eq(&self, lhs: &Record, rhs: &Record) -> bool {
        default_key_eq(lhs, rhs)
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    record: Record,
    hash: u64,
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    nodes: Vec<Node>,
}

/// An opaque reference to a live entry, valid only until the table's next
/// mutation. Expressed as a bucket/node index pair rather than a pointer so
/// that a stale handle simply fails to resolve instead of dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    bucket: usize,
    node: usize,
}

/// Returned by [`MergeHashTable::materialise`] when the table holds no
/// records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTable;

impl fmt::Display for EmptyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table holds no records")
    }
}

impl std::error::Error for EmptyTable {}

/// A power-of-two bucketed hash table with pluggable hash, combine, and
/// equality strategies, all defaulted to the original behaviour.
pub struct MergeHashTable<H = DefaultHasher, C = DefaultCombine, E = DefaultEq> {
    buckets: Vec<Bucket>,
    buckets_count: usize,
    hasher: H,
    combiner: C,
    eq: E,
}

impl MergeHashTable<DefaultHasher, DefaultCombine, DefaultEq> {
    /// Creates a table with the default hash, combine, and equality
    /// strategies. `buckets_count` must be a power of two.
    pub fn new(buckets_count: usize) -> Self {
        Self::with_strategies(buckets_count, DefaultHasher, DefaultCombine, DefaultEq)
    }
}

impl<H, C, E> MergeHashTable<H, C, E>
where
    H: KeyHasher,
    C: Combine,
    E: KeyEq,
{
    pub fn with_strategies(buckets_count: usize, hasher: H, combiner: C, eq: E) -> Self {
        assert!(
            buckets_count.is_power_of_two(),
            "buckets_count must be a power of two, got {buckets_count}"
        );
        Self {
            buckets: (0..buckets_count).map(|_| Bucket::default()).collect(),
            buckets_count,
            hasher,
            combiner,
            eq,
        }
    }

    /// Merges `record` into an existing entry with an equal key, or
    /// inserts a fresh node. Node storage growth is delegated to `Vec`;
    /// real allocation exhaustion aborts the process the same way it would
    /// in any other safe Rust collection, so there is no recoverable
    /// `ResourceExhausted` path to model here.
    pub fn insert(&mut self, record: Record) {
        let hash = self.hasher.hash(&record);
        let idx = bucket_index(hash, self.buckets_count);
        let bucket = &mut self.buckets[idx];
        for node in bucket.nodes.iter_mut() {
            if node.hash == hash && self.eq.eq(&node.record, &record) {
                self.combiner.combine(&mut node.record, &record);
                return;
            }
        }
        bucket.nodes.push(Node { record, hash });
    }

    /// Locates the live entry with the same key as `record`, if any.
    pub fn lookup(&self, record: &Record) -> Option<NodeHandle> {
        let hash = self.hasher.hash(record);
        let idx = bucket_index(hash, self.buckets_count);
        let bucket = &self.buckets[idx];
        bucket
            .nodes
            .iter()
            .position(|node| node.hash == hash && self.eq.eq(&node.record, record))
            .map(|node| NodeHandle { bucket: idx, node })
    }

    /// Resolves a handle returned by [`lookup`](Self::lookup). Returns
    /// `None` if the table has been mutated since the handle was obtained
    /// and the slot no longer refers to the same entry.
    pub fn get(&self, handle: NodeHandle) -> Option<&Record> {
        self.buckets
            .get(handle.bucket)
            .and_then(|b| b.nodes.get(handle.node))
            .map(|n| &n.record)
    }

    /// Removes the entry with the same key as `record`, if present. A
    /// no-op if absent. Always swaps the last node into the erased slot
    /// then shrinks — the original implementation's erase only performed
    /// this swap when the two nodes' hashes happened to differ, silently
    /// leaving a stale duplicate otherwise; that branch is not replicated.
    pub fn erase(&mut self, record: &Record) -> bool {
        let hash = self.hasher.hash(record);
        let idx = bucket_index(hash, self.buckets_count);
        let bucket = &mut self.buckets[idx];
        let Some(pos) = bucket
            .nodes
            .iter()
            .position(|node| node.hash == hash && self.eq.eq(&node.record, record))
        else {
            return false;
        };
        bucket.nodes.swap_remove(pos);
        true
    }

    /// Copies every live record into a freshly allocated array. Order is
    /// unspecified but stable across repeated calls on an unchanged table,
    /// since bucket and node storage order does not change without a
    /// mutation.
    pub fn materialise(&self) -> Result<Vec<Record>, EmptyTable> {
        let mut out = Vec::with_capacity(self.len());
        self.for_each(|record| out.push(*record));
        if out.is_empty() {
            Err(EmptyTable)
        } else {
            Ok(out)
        }
    }

    /// Invokes `action` once per live record, in unspecified order. Always
    /// indexes each bucket's own node array — the original implementation
    /// had a revision that indexed the outer loop's bucket from the inner
    /// loop, duplicating emissions; that bug is not replicated.
    pub fn for_each(&self, mut action: impl FnMut(&Record)) {
        for bucket in &self.buckets {
            for node in &bucket.nodes {
                action(&node.record);
            }
        }
    }

    /// Total number of live records across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.nodes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases all storage and returns the table to the zero state. The
    /// table must be reinitialised (via [`with_strategies`](Self::with_strategies)
    /// or [`new`](MergeHashTable::new)) before reuse; idempotent on an
    /// already-cleared table.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.buckets_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TEST_BUCKETS;

    fn table() -> MergeHashTable {
        MergeHashTable::new(TEST_BUCKETS)
    }

    #[test]
    fn hash_consistency() {
        use crate::hash::DefaultHasher;
        let a = Record::new(1, 0, 0.0, true, 0);
        let b = Record::new(1, 5, 5.0, false, 2);
        assert_eq!(DefaultHasher.hash(&a), DefaultHasher.hash(&b));
    }

    #[test]
    fn idempotent_clear() {
        let mut t = table();
        t.insert(Record::new(1, 1, 1.0, true, 1));
        t.clear();
        t.clear();
        assert_eq!(t.buckets.len(), 0);
        assert_eq!(t.buckets_count, 0);
    }

    #[test]
    fn merge_absorption() {
        let mut t = table();
        let r = Record::new(42, 1, 1.0, true, 1);
        t.insert(r);
        t.insert(r);
        assert_eq!(t.materialise().unwrap().len(), 1);
    }

    #[test]
    fn count_cost_folding() {
        let mut t = table();
        let a = Record::new(1, 13, 3.567, false, 3);
        let b = Record::new(1, 13, 0.011, true, 2);
        t.insert(a);
        t.insert(b);
        let out = t.materialise().unwrap();
        assert_eq!(out.len(), 1);
        let merged = out[0];
        assert_eq!(merged.count, 26);
        assert!((merged.cost - 3.578).abs() < 1e-4);
        assert!(!merged.primary());
        assert_eq!(merged.mode(), 3);
    }

    #[test]
    fn materialise_empty_is_an_error() {
        let t = table();
        assert!(t.materialise().is_err());
    }

    #[test]
    fn for_each_visits_every_live_node_once() {
        let mut t = table();
        for id in 0..20 {
            t.insert(Record::new(id, 1, 0.0, true, 0));
        }
        let mut seen = 0;
        t.for_each(|_| seen += 1);
        assert_eq!(seen, 20);
    }

    #[test]
    fn erase_removes_matching_entry_and_leaves_others_intact() {
        let mut t = table();
        let a = Record::new(1, 1, 1.0, true, 0);
        let b = Record::new(2, 1, 1.0, true, 0);
        t.insert(a);
        t.insert(b);
        assert!(t.erase(&a));
        assert!(!t.erase(&a));
        let out = t.materialise().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 2);
    }

    #[test]
    fn non_default_hash_and_combine_respect_custom_hooks() {
        struct ModFive;
        impl KeyHasher for ModFive {
            fn hash(&self, record: &Record) -> u64 {
                (record.id.rem_euclid(5)) as u64
            }
        }
        struct SumCost;
        impl Combine for SumCost {
            fn combine(&self, into: &mut Record, other: &Record) {
                into.cost += other.cost;
            }
        }
        let mut t = MergeHashTable::with_strategies(8, ModFive, SumCost, DefaultEq);
        t.insert(Record::new(5, 0, 1.0, true, 0));
        t.insert(Record::new(10, 0, 2.0, true, 0));
        // 5 and 10 hash equal under ModFive but DefaultEq only matches
        // identical ids, so they remain two distinct entries.
        assert_eq!(t.materialise().unwrap().len(), 2);
    }
}

#[cfg(all(test, feature = "proptest"))]
mod proptests {
    use super::*;
    use crate::config::TEST_BUCKETS;
    use proptest::prelude::*;

    fn arb_record() -> impl Strategy<Value = Record> {
        (
            any::<i64>(),
            any::<i32>(),
            any::<f32>(),
            any::<bool>(),
            0u8..8,
        )
            .prop_map(|(id, count, cost, primary, mode)| {
                Record::new(id, count, cost, primary, mode)
            })
    }

    proptest! {
        #[test]
        fn equal_keys_always_hash_equal(a in arb_record(), b in arb_record()) {
            if default_key_eq(&a, &b) {
                prop_assert_eq!(DefaultHasher.hash(&a), DefaultHasher.hash(&b));
            }
        }

        #[test]
        fn inserting_a_duplicate_key_never_grows_the_table(
            records in proptest::collection::vec(arb_record(), 1..32),
        ) {
            let mut t = MergeHashTable::new(TEST_BUCKETS);
            for r in &records {
                t.insert(*r);
            }
            let before = t.len();
            t.insert(records[0]);
            prop_assert_eq!(t.len(), before);
        }
    }
}
