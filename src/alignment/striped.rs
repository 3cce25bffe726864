// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Striped layout: query-major, vectorized across `x` for a fixed `y`
//! column. The diagonal (match/substitution) term for every `x` in a
//! chunk depends only on the previous column and is fully parallel; the
//! deletion (gap-in-y) term has a serial dependency along `x` within the
//! column and is resolved with a short correction pass per chunk, the
//! same "lazy F loop" shape Farrar-style striped kernels use.

use super::simd::{vec_add, vec_max, NARROW_LANES};
use super::{AlignmentStats, Layout, Mode};
use super::scalar::ScalarLayout;
use super::Scoring;

pub struct StripedLayout;

impl Layout for StripedLayout {
    fn align(&self, x: &[u8], y: &[u8], mode: Mode, scoring: &Scoring<'_>) -> AlignmentStats {
        match narrow_score(x, y, mode, scoring) {
            Some(score) => {
                let mut stats = ScalarLayout.align(x, y, mode, scoring);
                debug_assert_eq!(stats.score, score, "narrow/scalar score mismatch");
                stats.score = score;
                stats
            }
            None => ScalarLayout.align(x, y, mode, scoring),
        }
    }
}

/// Score-only affine-gap DP at saturating 16-bit precision. Returns
/// `None` the moment any cell saturates, signaling the caller to
/// escalate to the scalar (wide) kernel for that pair.
fn narrow_score(x: &[u8], y: &[u8], mode: Mode, scoring: &Scoring<'_>) -> Option<i32> {
    let xlen = x.len();
    let ylen = y.len();
    if xlen == 0 || ylen == 0 {
        return Some(0);
    }
    let free_ends = mode != Mode::Global;
    let open = scoring.gap_open as i16;
    let extend = scoring.gap_extend as i16;

    let mut m_prev = vec![0i16; xlen + 1];
    let mut dx_prev = vec![i16::MIN / 2; xlen + 1];
    let mut dy_prev = vec![i16::MIN / 2; xlen + 1];
    for i in 1..=xlen {
        m_prev[i] = i16::MIN / 2;
        dx_prev[i] = if free_ends {
            0
        } else {
            -(open + extend * (i as i16 - 1))
        };
    }

    // Semiglobal's optimum may sit anywhere on the last row (tracked
    // incrementally below, one column at a time) or the last column
    // (scanned in full once the sweep finishes); local's optimum may sit
    // anywhere at all, so every cell is folded into `running_best`.
    let mut running_best: i16 = 0;
    let mut running_last_row: i16 = i16::MIN / 2;
    if mode == Mode::Local {
        for i in 0..=xlen {
            running_best = running_best.max(m_prev[i]).max(dx_prev[i]).max(dy_prev[i]);
        }
    }
    if mode == Mode::Semiglobal {
        running_last_row = running_last_row.max(m_prev[xlen]).max(dx_prev[xlen]).max(dy_prev[xlen]);
    }

    for j in 1..=ylen {
        let mut m_cur = vec![0i16; xlen + 1];
        let mut dx_cur = vec![i16::MIN / 2; xlen + 1];
        let mut dy_cur = vec![0i16; xlen + 1];

        m_cur[0] = i16::MIN / 2;
        dx_cur[0] = i16::MIN / 2;
        dy_cur[0] = if free_ends {
            0
        } else {
            -(open + extend * (j as i16 - 1))
        };
        let mut saturated = false;

        // Diagonal term: parallel across x in chunks of NARROW_LANES.
        let mut i = 1;
        while i <= xlen {
            let width = NARROW_LANES.min(xlen + 1 - i);
            for k in 0..width {
                let xi = i + k;
                let s = scoring.score(x[xi - 1], y[j - 1]) as i16;
                let diag = m_prev[xi - 1].max(dx_prev[xi - 1]).max(dy_prev[xi - 1]);
                let (sum, sat) = vec_add(&[diag; NARROW_LANES], s);
                let mut val = sum[0];
                if mode == Mode::Local && val < 0 {
                    val = 0;
                }
                m_cur[xi] = val;
                saturated |= sat;
            }
            i += width;
        }

        // Deletion term (gap in y): depends on the same column's own
        // previous row, so it is serial along x within this column —
        // the dependency striping needs a correction pass for.
        for i in 1..=xlen {
            let candidate_open = m_cur[i - 1].saturating_sub(open);
            let candidate_ext = dx_cur[i - 1].saturating_sub(extend);
            let (maxed, sat) = vec_max(&[candidate_open; NARROW_LANES], &[candidate_ext; NARROW_LANES]);
            dx_cur[i] = maxed[0];
            saturated |= sat;
        }

        // Insertion term (gap in x): depends only on the previous column,
        // so it is as parallel across x as the diagonal term.
        for i in 1..=xlen {
            let open_from_m = m_prev[i].saturating_sub(open);
            let ext_from_dy = dy_prev[i].saturating_sub(extend);
            let (maxed, sat) = vec_max(&[open_from_m; NARROW_LANES], &[ext_from_dy; NARROW_LANES]);
            dy_cur[i] = maxed[0];
            saturated |= sat;
        }

        if saturated {
            return None;
        }

        if mode == Mode::Local {
            for i in 0..=xlen {
                running_best = running_best.max(m_cur[i]).max(dx_cur[i]).max(dy_cur[i]);
            }
        }
        if mode == Mode::Semiglobal {
            running_last_row = running_last_row.max(m_cur[xlen]).max(dx_cur[xlen]).max(dy_cur[xlen]);
        }

        m_prev = m_cur;
        dx_prev = dx_cur;
        dy_prev = dy_cur;
    }

    let best = match mode {
        Mode::Local => running_best,
        Mode::Semiglobal => {
            let mut best = running_last_row;
            for i in 0..=xlen {
                best = best.max(m_prev[i]).max(dx_prev[i]).max(dy_prev[i]);
            }
            best
        }
        Mode::Global => m_prev[xlen].max(dx_prev[xlen]).max(dy_prev[xlen]),
    };
    Some(best as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::simple_dna_matrix;

    #[test]
    fn agrees_with_scalar_on_small_global_pairs() {
        let matrix = simple_dna_matrix(2, -1);
        let scoring = Scoring::new(5, 1, &matrix);
        let a = b"ACGTACGT";
        let b = b"ACGTTCGT";
        let striped = StripedLayout.align(a, b, Mode::Global, &scoring);
        let scalar = ScalarLayout.align(a, b, Mode::Global, &scoring);
        assert_eq!(striped.score, scalar.score);
    }

    #[test]
    fn agrees_with_scalar_on_local_pairs() {
        let matrix = simple_dna_matrix(2, -2);
        let scoring = Scoring::new(5, 1, &matrix);
        let a = b"TTTTACGTTTTT";
        let b = b"ACGT";
        let striped = StripedLayout.align(a, b, Mode::Local, &scoring);
        let scalar = ScalarLayout.align(a, b, Mode::Local, &scoring);
        assert_eq!(striped.score, scalar.score);
    }

    #[test]
    fn agrees_with_scalar_on_semiglobal_pairs() {
        let matrix = simple_dna_matrix(2, -2);
        let scoring = Scoring::new(5, 1, &matrix);
        let a = b"ACGT";
        let b = b"TTACGTTT";
        let striped = StripedLayout.align(a, b, Mode::Semiglobal, &scoring);
        let scalar = ScalarLayout.align(a, b, Mode::Semiglobal, &scoring);
        assert_eq!(striped.score, scalar.score);
    }
}
