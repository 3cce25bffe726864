// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end scenarios from spec §8, run against the public driver API.

use pgraph::alignment::aligner::LayoutKind;
use pgraph::driver::{run, PairSource, RunConfig};
use pgraph::params::Parameters;
use tempfile::tempdir;

fn write_fasta(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("in.fasta");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn two_sequence_fasta_is_accepted_when_nearly_identical() {
    let (_dir, path) = write_fasta(">a\nMARKERSEQUENCEAAAAA\n>b\nMARKERSEQUENCEAAAAA\n");
    let mut params = Parameters::default();
    params.aol = 50;
    params.sim = 50;
    params.os = 50;

    let config = RunConfig {
        input: path,
        params,
        num_workers: 2,
        layout: LayoutKind::Striped,
        pair_source: PairSource::Counter,
        selectivity: 1.0,
    };
    let report = run(&config).unwrap();
    assert_eq!(report.sequence_count, 2);
    assert_eq!(report.accepted_edges.len(), 1);
    assert_eq!(report.accepted_edges[0].a, 0);
    assert_eq!(report.accepted_edges[0].b, 1);
}

#[test]
fn unrelated_sequences_produce_no_accepted_edges() {
    let (_dir, path) = write_fasta(">a\nAAAAAAAAAAAAAAAA\n>b\nWWWWWWWWWWWWWWWW\n");
    let config = RunConfig {
        input: path,
        params: Parameters::default(),
        num_workers: 2,
        layout: LayoutKind::Scan,
        pair_source: PairSource::Counter,
        selectivity: 1.0,
    };
    let report = run(&config).unwrap();
    assert!(report.accepted_edges.is_empty());
}

#[test]
fn suffix_array_and_counter_pair_sources_agree_on_a_small_instance() {
    let (_dir, path) = write_fasta(">a\nMARKERAAAAAAAA\n>b\nMARKERBBBBBBBB\n>c\nNNNNNNNNNNNNNN\n");

    let mut via_sa = RunConfig {
        input: path.clone(),
        params: Parameters::default(),
        num_workers: 2,
        layout: LayoutKind::Wozniak,
        pair_source: PairSource::SuffixArray,
        selectivity: 1.0,
    };
    via_sa.params.exact_match_len = 4;
    via_sa.params.window_size = 3;

    let mut via_counter = RunConfig {
        input: path,
        params: Parameters::default(),
        num_workers: 2,
        layout: LayoutKind::Wozniak,
        pair_source: PairSource::Counter,
        selectivity: 1.0,
    };
    via_counter.params.exact_match_len = 4;
    via_counter.params.window_size = 3;

    let a = run(&via_sa).unwrap();
    let b = run(&via_counter).unwrap();

    let mut pairs_a: Vec<(usize, usize)> = a.accepted_edges.iter().map(|e| (e.a, e.b)).collect();
    let mut pairs_b: Vec<(usize, usize)> = b.accepted_edges.iter().map(|e| (e.a, e.b)).collect();
    pairs_a.sort();
    pairs_b.sort();
    assert_eq!(pairs_a, pairs_b);
}

#[test]
fn every_layout_kind_runs_the_full_pipeline_without_panicking() {
    let (_dir, path) = write_fasta(">a\nMARKERSEQUENCE\n>b\nMARKERSEQUENCD\n");
    for layout in [LayoutKind::Scalar, LayoutKind::Striped, LayoutKind::Scan, LayoutKind::Wozniak] {
        let config = RunConfig {
            input: path.clone(),
            params: Parameters::default(),
            num_workers: 1,
            layout,
            pair_source: PairSource::Counter,
            selectivity: 1.0,
        };
        let report = run(&config).unwrap();
        assert_eq!(report.sequence_count, 2);
    }
}

#[test]
fn malformed_input_without_sentinel_is_rejected() {
    let (_dir, path) = write_fasta("not fasta at all");
    let config = RunConfig {
        input: path,
        params: Parameters::default(),
        num_workers: 1,
        layout: LayoutKind::Scalar,
        pair_source: PairSource::Counter,
        selectivity: 1.0,
    };
    assert!(run(&config).is_err());
}

#[test]
fn parameter_file_round_trips_through_the_driver() {
    let dir = tempdir().unwrap();
    let param_path = dir.path().join("params.txt");
    std::fs::write(
        &param_path,
        "AlignOverLongerSeq 50\nMatchSimilarity 50\nOptimalScoreOverSelfScore 50\n",
    )
    .unwrap();
    let params = Parameters::parse_file(&param_path).unwrap();
    assert_eq!(params.aol, 50);
    assert_eq!(params.sim, 50);
    assert_eq!(params.os, 50);
}

#[test]
fn selectivity_caps_alignments_in_counter_mode() {
    let (_dir, path) = write_fasta(
        ">a\nAAAA\n>b\nCCCC\n>c\nGGGG\n>d\nTTTT\n>e\nACGT\n",
    );
    let config = RunConfig {
        input: path,
        params: Parameters::default(),
        num_workers: 2,
        layout: LayoutKind::Scalar,
        pair_source: PairSource::Counter,
        selectivity: 0.5,
    };
    let report = run(&config).unwrap();
    assert_eq!(report.candidates_examined, 5);
}
