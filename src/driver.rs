// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Run driver (C8, spec §4.8): wires every module together into the
//! phase sequence a single run goes through, logging a `tracing` span
//! per phase the way `prospector-btc`'s orchestrator instruments its
//! own pipeline stages.

use std::sync::{Arc, Mutex};

use tracing::{info, info_span};

use crate::alignment::aligner::{LayoutKind, PairwiseAligner};
use crate::alignment::Mode;
use crate::alphabet::{protein24, Alphabet, RankTransform};
use crate::buckets::BucketTable;
use crate::edge::{classify, Edge};
use crate::error::Result;
use crate::executor::{CounterSource, TaskDescriptor, WorkStealingPool};
use crate::lcp_interval::enumerate_pairs;
use crate::params::Parameters;
use crate::sequence_store::{Delimiter, SequenceStore};
use crate::substitution::blosum62;
use crate::suffix_array::{bwt, end_array, lcp_array, sid_array, suffix_array};

/// How candidate pairs are produced: the suffix-array/LCP-interval path
/// (default), or the atomic-counter all-pairs fallback used when the
/// input is small enough, or skip patterns dense enough, that pruning
/// does not pay for the extra bookkeeping (spec §4.7's mode decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSource {
    SuffixArray,
    Counter,
}

pub struct RunConfig {
    pub input: std::path::PathBuf,
    pub params: Parameters,
    pub num_workers: usize,
    pub layout: LayoutKind,
    pub pair_source: PairSource,
    /// Caps the number of alignments performed in `PairSource::Counter`
    /// mode to `round(selectivity * C(N, 2))` (spec §6, §8 scenario 5).
    /// Ignored by `PairSource::SuffixArray`, since pruning already
    /// decides which pairs are examined. `1.0` performs every pair.
    pub selectivity: f64,
}

pub struct RunReport {
    pub accepted_edges: Vec<Edge>,
    pub candidates_examined: usize,
    pub sequence_count: usize,
}

/// Run the full pipeline end to end: pack, index, enumerate candidates,
/// align, classify, and collect accepted edges.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let pack_span = info_span!("pack_and_index");
    let store = {
        let _enter = pack_span.enter();
        info!(path = %config.input.display(), "packing input");
        SequenceStore::pack_in_memory(&config.input, Delimiter::Dollar)?
    };
    info!(sequences = store.size(), "packed");

    let alphabet = custom_alphabet(&config.params.alphabet);
    let rank = RankTransform::new(&alphabet);

    let candidates = {
        let _span = info_span!("enumerate_candidates").entered();
        match config.pair_source {
            PairSource::SuffixArray => enumerate_via_suffix_array(&store, &rank, &config.params),
            PairSource::Counter => enumerate_via_counter(&store, config.selectivity),
        }
    };
    info!(candidates = candidates.len(), "candidate pairs enumerated");

    let matrix = blosum62::matrix();
    let aligner = Arc::new(PairwiseAligner::new(
        &matrix,
        config.params.open,
        config.params.gap,
        config.layout,
    ));

    let accepted = Arc::new(Mutex::new(Vec::new()));
    let tasks: Vec<TaskDescriptor> = candidates.iter().map(|p| TaskDescriptor { a: p.0, b: p.1 }).collect();
    let candidates_examined = candidates.len();
    let sequence_count = store.size();

    {
        let _span = info_span!("align_and_classify", workers = config.num_workers).entered();
        let store = Arc::new(store);
        let params = Arc::new(config.params.clone());
        let (pool, workers) = WorkStealingPool::new(tasks, config.num_workers.max(1));
        let store_for_run = Arc::clone(&store);
        let aligner_for_run = Arc::clone(&aligner);
        let params_for_run = Arc::clone(&params);
        let accepted_for_run = Arc::clone(&accepted);
        pool.run(workers, move |t| {
            let sa = store_for_run.get(t.a);
            let sb = store_for_run.get(t.b);
            let self_a = aligner_for_run.self_score(t.a, sa.bytes());
            let self_b = aligner_for_run.self_score(t.b, sb.bytes());
            let stats = aligner_for_run.align(sa.bytes(), sb.bytes(), Mode::Semiglobal);
            let edge = classify(t.a, t.b, &stats, self_a, self_b, &params_for_run);
            if edge.accepted {
                accepted_for_run.lock().unwrap().push(edge);
            }
        });
        info!("pool drained");
    }

    Ok(RunReport {
        accepted_edges: Arc::try_unwrap(accepted).unwrap().into_inner().unwrap(),
        candidates_examined,
        sequence_count,
    })
}

fn custom_alphabet(symbols: &[u8]) -> Alphabet {
    if symbols.is_empty() {
        protein24()
    } else {
        Alphabet::new(symbols.to_vec())
    }
}

fn enumerate_via_suffix_array(store: &SequenceStore, rank: &RankTransform, params: &Parameters) -> Vec<(usize, usize)> {
    let skip = params.compiled_skip_prefixes().unwrap_or_default();
    let _table = BucketTable::build(store, rank, params.window_size, &skip);

    let text = store.packed();
    let sa = suffix_array(text);
    let sid = sid_array(store, text.len());
    let end = end_array(store);
    let lcp = lcp_array(text, &sa, &sid, &end);
    let b = bwt(text, &sa);

    enumerate_pairs(&lcp, &sa, &b, &sid, params.exact_match_len)
        .into_iter()
        .map(|p| (p.a, p.b))
        .collect()
}

fn enumerate_via_counter(store: &SequenceStore, selectivity: f64) -> Vec<(usize, usize)> {
    let source = CounterSource::with_selectivity(store.size(), selectivity);
    let mut out = Vec::with_capacity(source.total());
    while let Some(t) = source.next_task() {
        out.push((t.a, t.b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn counter_mode_finds_embedded_match_end_to_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        std::fs::write(&path, ">a\nMARKERAAAA\n>b\nMARKERBBBB\n>c\nNNNNNNNNNN\n").unwrap();

        let config = RunConfig {
            input: path,
            params: Parameters::default(),
            num_workers: 2,
            layout: LayoutKind::Scalar,
            pair_source: PairSource::Counter,
            selectivity: 1.0,
        };
        let report = run(&config).unwrap();
        assert_eq!(report.sequence_count, 3);
        assert_eq!(report.candidates_examined, 3);
    }
}
