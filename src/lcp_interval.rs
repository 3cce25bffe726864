// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! LCP-interval pair enumeration (C6, spec §4.6) plus the alternative
//! suffix-tree `lset`-partition form (C6', spec §4.6').
//!
//! The primary path walks the LCP array bottom-up with an explicit
//! stack (Abouelhoda/Kurtz/Ohlebusch's enhanced-suffix-array traversal),
//! grouping each l-interval's suffixes into its direct children and
//! emitting only cross-child pairs — within-child pairs belong to a
//! deeper, more specific interval and are emitted there instead. A
//! Burrows-Wheeler left-maximality check (`pair_check`) then drops pairs
//! whose preceding character is identical on both sides, since such a
//! pair is redundant with the one that will be found one level up —
//! except when a side has no preceding character to compare at all
//! (sequence start), in which case the pair is always kept.

use std::collections::HashSet;

use crate::alphabet::{BEGIN, RECORD_SEP, SENTINEL};
use crate::buckets::{BucketTable, NPOS};
use crate::suffix_array::BWT;

/// An unordered pair of distinct sequence ids, normalized so `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeqPair {
    pub a: usize,
    pub b: usize,
}

impl SeqPair {
    fn new(x: usize, y: usize) -> Self {
        if x < y {
            SeqPair { a: x, b: y }
        } else {
            SeqPair { a: y, b: x }
        }
    }
}

struct Interval {
    lcp: usize,
    lb: usize,
    rb: usize,
    /// Direct child ranges, left to right, each either a sub-interval or
    /// a singleton leaf.
    children: Vec<(usize, usize)>,
}

/// Enumerate candidate sequence pairs from an LCP array via the
/// bottom-up interval stack, filtered by BWT left-maximality and a
/// minimum interval depth `exact_match_len` (spec §4.6).
pub fn enumerate_pairs(
    lcp: &[usize],
    sa: &[usize],
    bwt: &BWT,
    sid_of: &[usize],
    exact_match_len: usize,
) -> Vec<SeqPair> {
    let n = sa.len();
    let mut out = HashSet::new();
    if n == 0 {
        return Vec::new();
    }

    // Virtual lcp[n] = 0 flushes the stack at the end.
    let get_lcp = |i: usize| -> usize {
        if i == n {
            0
        } else {
            lcp[i]
        }
    };

    let mut stack: Vec<Interval> = vec![Interval {
        lcp: 0,
        lb: 0,
        rb: 0,
        children: Vec::new(),
    }];
    let mut pending_child: Option<(usize, usize)> = None;

    for i in 1..=n {
        let mut lb = i - 1;
        while get_lcp(i) < stack.last().unwrap().lcp {
            let mut top = stack.pop().unwrap();
            top.rb = i - 1;
            if let Some(child) = pending_child.take() {
                top.children.push(child);
            }
            emit(&top, sa, bwt, sid_of, exact_match_len, &mut out);
            lb = top.lb;
            pending_child = Some((top.lb, top.rb));
        }
        if get_lcp(i) > stack.last().unwrap().lcp {
            let mut new_top = Interval {
                lcp: get_lcp(i),
                lb,
                rb: 0,
                children: Vec::new(),
            };
            if let Some(child) = pending_child.take() {
                new_top.children.push(child);
            }
            stack.push(new_top);
        } else if let Some(child) = pending_child.take() {
            stack.last_mut().unwrap().children.push(child);
        }
    }

    let mut v: Vec<SeqPair> = out.into_iter().collect();
    v.sort();
    v
}

fn emit(
    interval: &Interval,
    sa: &[usize],
    bwt: &BWT,
    sid_of: &[usize],
    exact_match_len: usize,
    out: &mut HashSet<SeqPair>,
) {
    if interval.lcp < exact_match_len || interval.rb <= interval.lb {
        return;
    }

    let mut children = interval.children.clone();
    children.sort_unstable();

    // Fill the gaps between recorded children with singleton leaves so
    // every index in [lb, rb] belongs to exactly one group.
    let mut groups: Vec<(usize, usize)> = Vec::new();
    let mut cursor = interval.lb;
    for &(clb, crb) in &children {
        while cursor < clb {
            groups.push((cursor, cursor));
            cursor += 1;
        }
        groups.push((clb, crb));
        cursor = crb + 1;
    }
    while cursor <= interval.rb {
        groups.push((cursor, cursor));
        cursor += 1;
    }

    for gi in 0..groups.len() {
        for gj in (gi + 1)..groups.len() {
            let (lb1, rb1) = groups[gi];
            let (lb2, rb2) = groups[gj];
            for p in lb1..=rb1 {
                for q in lb2..=rb2 {
                    if !pair_check(sa, bwt, p, q) {
                        continue;
                    }
                    let si = sid_of[sa[p]];
                    let sj = sid_of[sa[q]];
                    if si != sj {
                        out.insert(SeqPair::new(si, sj));
                    }
                }
            }
        }
    }
}

/// Left-maximality filter: a pair whose suffixes are both preceded by
/// the same character would also be discovered one interval up (where
/// that shared character becomes part of the match), so it is dropped
/// here to avoid redundant work — *unless* one side has no real left
/// extension at all (it sits at the very start of the packed buffer, or
/// its predecessor is a record separator or sentinel rather than a
/// dataset character). That side can never be "discovered one level up"
/// since there is no shared character to extend into, so the pair must
/// be emitted here regardless of what `BWT` holds on the other side
/// (spec §4.6: `BWT[i] ≠ BWT[j] OR BWT[i] == sentinel`).
fn pair_check(sa: &[usize], bwt: &BWT, p: usize, q: usize) -> bool {
    bwt[p] != bwt[q] || is_boundary(sa[p], bwt[p]) || is_boundary(sa[q], bwt[q])
}

/// True when position `pos` has no real left extension: start of the
/// packed buffer, or its preceding byte is a record separator/sentinel
/// rather than a dataset character.
fn is_boundary(pos: usize, preceding: u8) -> bool {
    pos == 0 || preceding == RECORD_SEP || preceding == SENTINEL
}

/// Alternative enumerator (C6', spec §4.6'): partitions each bucket's
/// suffixes by the character immediately to their left (`BEGIN` for a
/// suffix at the very start of its sequence), then emits cross-class
/// pairs — the complementary construction to the LCP-interval walk,
/// useful when buckets are already small enough that a full suffix
/// array is unnecessary overhead.
pub fn enumerate_pairs_via_lset(table: &BucketTable, text: &[u8], sid_of: &[usize]) -> Vec<SeqPair> {
    let mut out = HashSet::new();

    for bucket in &table.buckets {
        // lset: left-neighbor character -> suffixes sharing it.
        let mut lset: Vec<(u8, Vec<usize>)> = Vec::new();
        let mut head = bucket.head;
        while head != NPOS {
            let suf = table.arena[head];
            let left_char = if suf.pos == 0 { BEGIN } else { text[suf.pos - 1] };
            match lset.iter_mut().find(|(c, _)| *c == left_char) {
                Some((_, v)) => v.push(head),
                None => lset.push((left_char, vec![head])),
            }
            head = suf.next;
        }

        for i in 0..lset.len() {
            for j in (i + 1)..lset.len() {
                for &pi in &lset[i].1 {
                    for &pj in &lset[j].1 {
                        let si = table.arena[pi].sid;
                        let sj = table.arena[pj].sid;
                        if si != sj {
                            out.insert(SeqPair::new(si, sj));
                        }
                    }
                }
            }
        }

        // The BEGIN class has no left extension at all, so two of its
        // suffixes can never be told apart by a left character the way
        // two ordinary classes are — they must be paired directly here
        // rather than relying on the cross-class loop above.
        if let Some((_, begin_suffixes)) = lset.iter().find(|(c, _)| *c == BEGIN) {
            for i in 0..begin_suffixes.len() {
                for j in (i + 1)..begin_suffixes.len() {
                    let si = table.arena[begin_suffixes[i]].sid;
                    let sj = table.arena[begin_suffixes[j]].sid;
                    if si != sj {
                        out.insert(SeqPair::new(si, sj));
                    }
                }
            }
        }
    }

    let mut v: Vec<SeqPair> = out.into_iter().collect();
    v.sort();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::{protein24, RankTransform};
    use crate::buckets::BucketTable;
    use crate::sequence_store::{Delimiter, SequenceStore};
    use crate::suffix_array::{bwt, end_array, lcp_array, sid_array, suffix_array};
    use tempfile::tempdir;

    fn build(fasta: &str) -> (SequenceStore, Vec<usize>, Vec<usize>, Vec<usize>, BWT) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        std::fs::write(&path, fasta).unwrap();
        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        let text = store.packed();
        let sa = suffix_array(text);
        let sid = sid_array(&store, text.len());
        let end = end_array(&store);
        let lcp = lcp_array(text, &sa, &sid, &end);
        let b = bwt(text, &sa);
        (store, sa, lcp, sid, b)
    }

    #[test]
    fn shared_kmer_across_two_sequences_is_paired() {
        let (_store, sa, lcp, sid, b) = build(">a\nMARKER\n>b\nMARKERX\n");
        let pairs = enumerate_pairs(&lcp, &sa, &b, &sid, 4);
        assert!(pairs.contains(&SeqPair::new(0, 1)));
    }

    #[test]
    fn unrelated_sequences_are_not_paired() {
        let (_store, sa, lcp, sid, b) = build(">a\nAAAAAA\n>b\nCCCCCC\n");
        let pairs = enumerate_pairs(&lcp, &sa, &b, &sid, 4);
        assert!(pairs.is_empty());
    }

    #[test]
    fn lset_enumerator_agrees_on_a_shared_kmer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        std::fs::write(&path, ">a\nMARKERAA\n>b\nMARKERBB\n").unwrap();
        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        let rank = RankTransform::new(&protein24());
        let table = BucketTable::build(&store, &rank, 4, &[]);
        let text = store.packed();
        let sid = sid_array(&store, text.len());

        let pairs = enumerate_pairs_via_lset(&table, text, &sid);
        assert!(pairs.contains(&SeqPair::new(0, 1)));
    }
}
