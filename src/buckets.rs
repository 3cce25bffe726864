// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! k-mer bucket hashing (spec §4.6), grounded in `SuffixBuckets.cpp`'s
//! `bid = Σ^(k-1)*c0 + ... + c(k-1)` rank encoding and `filter_out`
//! skip-prefix check.
//!
//! Every suffix of every sequence is assigned to the bucket keyed by its
//! first `window_size` symbols. Buckets whose k-mer is outside the
//! alphabet (runs into the sentinel before `window_size` symbols) or
//! matches a configured skip-prefix pattern are dropped before
//! insertion; everything else becomes an intrusive singly-linked list of
//! suffix starts, arena-indexed into one flat `Vec` to avoid per-node
//! allocation.

use regex::Regex;

use crate::alphabet::RankTransform;
use crate::sequence_store::SequenceStore;

/// Sentinel "no next" value for the intrusive suffix list, analogous to
/// `VecMap`'s absent entries elsewhere in this crate.
pub const NPOS: usize = usize::MAX;

/// One suffix start position, arena-indexed and chained within its
/// bucket via `next`.
#[derive(Debug, Clone, Copy)]
pub struct Suffix {
    /// Index into the `SequenceStore` this suffix's sequence belongs to.
    pub sid: usize,
    /// Absolute position of the suffix start in the packed buffer.
    pub pos: usize,
    /// Bucket id this suffix was hashed into.
    pub bid: usize,
    /// Arena index of the next suffix in the same bucket, or `NPOS`.
    pub next: usize,
}

/// A bucket: all suffixes sharing the same leading k-mer.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    pub bid: usize,
    pub head: usize,
    pub size: usize,
}

/// All buckets for one run, plus the arena backing their suffix lists.
pub struct BucketTable {
    pub arena: Vec<Suffix>,
    /// Sparse: `bid -> index into `buckets`, only for nonempty buckets.
    pub buckets: Vec<Bucket>,
    pub window_size: usize,
}

impl BucketTable {
    /// Hash every suffix of every sequence in `store` into buckets keyed
    /// by its leading `window_size`-symbol k-mer, dropping suffixes whose
    /// k-mer runs past the sentinel, contains an out-of-alphabet byte, or
    /// matches any of `skip_prefixes`.
    pub fn build(
        store: &SequenceStore,
        rank: &RankTransform,
        window_size: usize,
        skip_prefixes: &[Regex],
    ) -> Self {
        use std::collections::HashMap;

        let mut arena = Vec::new();
        let mut by_bid: HashMap<usize, usize> = HashMap::new();
        let mut order: Vec<usize> = Vec::new();

        for sid in 0..store.size() {
            let seq = store.get(sid);
            let bytes = seq.bytes();
            let base = store.begin(sid);
            if bytes.len() < window_size {
                continue;
            }
            for start in 0..=(bytes.len() - window_size) {
                let window = &bytes[start..start + window_size];
                let bid = match rank.qgram_id(window) {
                    Some(id) => id,
                    None => continue,
                };
                if filter_out(window, skip_prefixes) {
                    continue;
                }

                let arena_idx = arena.len();
                let bucket_idx = *by_bid.entry(bid).or_insert_with(|| {
                    order.push(bid);
                    usize::MAX
                });
                let head_before = if bucket_idx == usize::MAX {
                    NPOS
                } else {
                    bucket_idx
                };
                arena.push(Suffix {
                    sid,
                    pos: base + start,
                    bid,
                    next: head_before,
                });
                by_bid.insert(bid, arena_idx);
            }
        }

        let mut buckets = Vec::with_capacity(order.len());
        for bid in order {
            let head = by_bid[&bid];
            let mut size = 0;
            let mut cur = head;
            while cur != NPOS {
                size += 1;
                cur = arena[cur].next;
            }
            buckets.push(Bucket { bid, head, size });
        }

        BucketTable {
            arena,
            buckets,
            window_size,
        }
    }

    /// Iterate a bucket's suffixes from its head.
    pub fn iter_bucket(&self, head: usize) -> BucketIter<'_> {
        BucketIter {
            arena: &self.arena,
            cur: head,
        }
    }
}

pub struct BucketIter<'a> {
    arena: &'a [Suffix],
    cur: usize,
}

impl<'a> Iterator for BucketIter<'a> {
    type Item = &'a Suffix;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == NPOS {
            return None;
        }
        let s = &self.arena[self.cur];
        self.cur = s.next;
        Some(s)
    }
}

/// `SuffixBuckets.cpp`'s skip-prefix filter: a k-mer matching any pattern
/// is excluded wholesale, used to drop low-complexity or repeat-masked
/// regions before they ever reach pair enumeration.
fn filter_out(window: &[u8], skip_prefixes: &[Regex]) -> bool {
    if skip_prefixes.is_empty() {
        return false;
    }
    // Patterns are matched against the ASCII k-mer, not its rank id,
    // since they are authored by a human against literal residues.
    let s = match std::str::from_utf8(window) {
        Ok(s) => s,
        Err(_) => return false,
    };
    skip_prefixes.iter().any(|re| re.is_match(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::protein24;
    use crate::sequence_store::{Delimiter, SequenceStore};
    use std::path::Path;
    use tempfile::tempdir;

    fn write(path: &Path, s: &str) {
        std::fs::write(path, s).unwrap();
    }

    #[test]
    fn buckets_group_shared_kmers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write(&path, ">a\nARNARN\n>b\nARNXXX\n");
        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        let rank = RankTransform::new(&protein24());

        let table = BucketTable::build(&store, &rank, 3, &[]);
        let arn_bid = rank.qgram_id(b"ARN").unwrap();
        let bucket = table.buckets.iter().find(|b| b.bid == arn_bid).unwrap();
        // "ARN" occurs at position 0 in both sequences, plus position 3 in "a".
        assert_eq!(bucket.size, 3);
    }

    #[test]
    fn skip_prefixes_drop_matching_kmers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write(&path, ">a\nNNNNNN\n");
        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        let rank = RankTransform::new(&protein24());
        let skip = vec![Regex::new("^NN").unwrap()];

        let table = BucketTable::build(&store, &rank, 3, &skip);
        assert!(table.buckets.is_empty());
    }

    #[test]
    fn suffixes_within_window_of_sentinel_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write(&path, ">a\nAR\n");
        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        let rank = RankTransform::new(&protein24());
        // window_size 3 but sequence is only 2 long: no suffix qualifies.
        let table = BucketTable::build(&store, &rank, 3, &[]);
        assert!(table.arena.is_empty());
    }
}
