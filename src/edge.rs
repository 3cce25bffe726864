// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Edge classification (C4, spec §4.4): turns one pairwise alignment
//! plus both sequences' self-scores into the AOL/SIM/OS percent trio and
//! a yes/no verdict against the run's thresholds.

use crate::alignment::AlignmentStats;
use crate::params::Parameters;

/// The three percent ratios spec §4.4 computes per candidate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeMetrics {
    /// `100 * aligned_len / max(xlen, ylen)`.
    pub aol: f64,
    /// `100 * matches / aligned_len`.
    pub sim: f64,
    /// `100 * score / max(self_score_x, self_score_y)`.
    pub os: f64,
}

/// A classified candidate edge: the metrics plus whether it cleared the
/// configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub metrics: EdgeMetrics,
    pub accepted: bool,
}

/// Compute AOL/SIM/OS and the accept/reject verdict for one pair.
pub fn classify(
    a: usize,
    b: usize,
    stats: &AlignmentStats,
    self_score_a: i32,
    self_score_b: i32,
    params: &Parameters,
) -> Edge {
    let longer = stats.xlen.max(stats.ylen).max(1) as f64;
    let aol = 100.0 * stats.aligned_len as f64 / longer;

    let sim = if stats.aligned_len == 0 {
        0.0
    } else {
        100.0 * stats.matches as f64 / stats.aligned_len as f64
    };

    let denom = self_score_a.max(self_score_b).max(1) as f64;
    let os = 100.0 * stats.score as f64 / denom;

    let accepted = aol >= params.aol as f64 && sim >= params.sim as f64 && os >= params.os as f64;

    Edge {
        a,
        b,
        metrics: EdgeMetrics { aol, sim, os },
        accepted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(score: i32, matches: u32, aligned_len: u32, xlen: usize, ylen: usize) -> AlignmentStats {
        AlignmentStats {
            score,
            matches,
            aligned_len,
            xlen,
            ylen,
        }
    }

    #[test]
    fn identical_sequences_pass_every_threshold() {
        let mut params = Parameters::default();
        params.aol = 80;
        params.sim = 90;
        params.os = 90;
        let s = stats(16, 8, 8, 8, 8);
        let edge = classify(0, 1, &s, 16, 16, &params);
        assert!(edge.accepted);
        assert_eq!(edge.metrics.aol, 100.0);
        assert_eq!(edge.metrics.sim, 100.0);
        assert_eq!(edge.metrics.os, 100.0);
    }

    #[test]
    fn low_similarity_is_rejected() {
        let mut params = Parameters::default();
        params.sim = 90;
        let s = stats(4, 2, 8, 8, 8);
        let edge = classify(0, 1, &s, 16, 16, &params);
        assert!(!edge.accepted);
        assert_eq!(edge.metrics.sim, 25.0);
    }

    #[test]
    fn zero_length_alignment_does_not_divide_by_zero() {
        let params = Parameters::default();
        let s = stats(0, 0, 0, 4, 4);
        let edge = classify(0, 1, &s, 4, 4, &params);
        assert_eq!(edge.metrics.sim, 0.0);
        assert!(!edge.accepted);
    }
}
