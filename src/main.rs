// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI entry point (spec §4.8, §6): `pgraph <input.fasta> [params.txt]`.

use std::path::PathBuf;
use std::process::ExitCode;

use pgraph::alignment::aligner::LayoutKind;
use pgraph::driver::{run, PairSource, RunConfig};
use pgraph::params::Parameters;

const USAGE: &str = "usage: pgraph <input.fasta> [params.txt] [selectivity]";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(p) => PathBuf::from(p),
        None => {
            eprintln!("{}", USAGE);
            return ExitCode::from(1);
        }
    };

    let params = match args.next() {
        Some(p) => match Parameters::parse_file(&PathBuf::from(p)) {
            Ok(params) => params,
            Err(e) => {
                eprintln!("invalid parameter file: {}", e);
                return ExitCode::from(1);
            }
        },
        None => Parameters::default(),
    };

    let selectivity = match args.next() {
        Some(s) => match s.parse::<f64>() {
            Ok(v) => v,
            Err(e) => {
                eprintln!("invalid selectivity: {}", e);
                return ExitCode::from(1);
            }
        },
        None => 1.0,
    };

    let config = RunConfig {
        input,
        params,
        num_workers: num_cpus::get(),
        layout: LayoutKind::Striped,
        pair_source: PairSource::SuffixArray,
        selectivity,
    };

    match run(&config) {
        Ok(report) => {
            tracing::info!(
                sequences = report.sequence_count,
                candidates = report.candidates_examined,
                accepted = report.accepted_edges.len(),
                "run complete"
            );
            for edge in &report.accepted_edges {
                println!(
                    "{}\t{}\t{:.2}\t{:.2}\t{:.2}",
                    edge.a, edge.b, edge.metrics.aol, edge.metrics.sim, edge.metrics.os
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("pgraph: {}", e);
            ExitCode::from(2)
        }
    }
}
