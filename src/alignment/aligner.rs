// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! `PairwiseAligner` (C3, spec §4.3): picks one DP layout, memoizes each
//! sequence's self-score (needed by the OS ratio in spec §4.4), and
//! exposes the single entry point the edge classifier calls per pair.

use std::cell::RefCell;
use std::collections::HashMap;

use super::scalar::ScalarLayout;
use super::scan::ScanLayout;
use super::striped::StripedLayout;
use super::wozniak::WozniakLayout;
use super::{AlignmentStats, Layout, Mode, Scoring};
use crate::substitution::SubstitutionMatrix;

/// Which DP layout `PairwiseAligner` drives. `Scalar` is always
/// available; the others additionally benefit from SSE2 when present
/// (see `alignment::simd::has_narrow_simd`) and fall back to an
/// equivalent scalar computation otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    Scalar,
    Striped,
    Scan,
    Wozniak,
}

/// Orchestrates one run's alignments: fixed scoring, one DP layout, and
/// a self-score cache keyed by sequence id so the OS ratio in spec
/// §4.4 does not re-align a sequence against itself for every pair it
/// appears in.
pub struct PairwiseAligner<'a> {
    scoring: Scoring<'a>,
    layout: LayoutKind,
    self_score_cache: RefCell<HashMap<usize, i32>>,
}

impl<'a> PairwiseAligner<'a> {
    pub fn new(matrix: &'a SubstitutionMatrix, gap_open: i32, gap_extend: i32, layout: LayoutKind) -> Self {
        PairwiseAligner {
            scoring: Scoring::new(gap_open, gap_extend, matrix),
            layout,
            self_score_cache: RefCell::new(HashMap::new()),
        }
    }

    fn dispatch(&self, x: &[u8], y: &[u8], mode: Mode) -> AlignmentStats {
        match self.layout {
            LayoutKind::Scalar => ScalarLayout.align(x, y, mode, &self.scoring),
            LayoutKind::Striped => StripedLayout.align(x, y, mode, &self.scoring),
            LayoutKind::Scan => ScanLayout.align(x, y, mode, &self.scoring),
            LayoutKind::Wozniak => WozniakLayout.align(x, y, mode, &self.scoring),
        }
    }

    /// Align `x` against `y`. `xlen >= ylen` is not required by the
    /// caller; the result's `xlen`/`ylen` fields always reflect which
    /// argument was which.
    pub fn align(&self, x: &[u8], y: &[u8], mode: Mode) -> AlignmentStats {
        self.dispatch(x, y, mode)
    }

    /// The self-alignment score of sequence `id`'s bytes, computed once
    /// and cached for the lifetime of this aligner (spec §4.4's
    /// `OptimalScoreOverSelfScore` denominator).
    pub fn self_score(&self, id: usize, bytes: &[u8]) -> i32 {
        if let Some(&s) = self.self_score_cache.borrow().get(&id) {
            return s;
        }
        let stats = self.dispatch(bytes, bytes, Mode::Global);
        self.self_score_cache.borrow_mut().insert(id, stats.score);
        stats.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::simple_dna_matrix;

    #[test]
    fn self_score_is_cached() {
        let matrix = simple_dna_matrix(2, -1);
        let aligner = PairwiseAligner::new(&matrix, 5, 1, LayoutKind::Scalar);
        let s1 = aligner.self_score(0, b"ACGTACGT");
        let s2 = aligner.self_score(0, b"ACGTACGT");
        assert_eq!(s1, s2);
        assert_eq!(aligner.self_score_cache.borrow().len(), 1);
    }

    #[test]
    fn every_layout_agrees_on_a_representative_pair() {
        let matrix = simple_dna_matrix(2, -1);
        let x = b"ACGTTGCA";
        let y = b"ACGTCGCA";
        let scalar = PairwiseAligner::new(&matrix, 5, 1, LayoutKind::Scalar).align(x, y, Mode::Global);
        for kind in [LayoutKind::Striped, LayoutKind::Scan, LayoutKind::Wozniak] {
            let aligner = PairwiseAligner::new(&matrix, 5, 1, kind);
            let stats = aligner.align(x, y, Mode::Global);
            assert_eq!(stats.score, scalar.score, "{:?} disagreed with scalar", kind);
        }
    }
}
