// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scan layout: reference-major, vectorized across `y` for a fixed `x`
//! row — the dual of the striped layout. The insertion (gap-in-x) term
//! has a serial dependency along `y` within a row and is resolved with a
//! short correction pass; the diagonal and deletion terms depend only on
//! the previous row and are fully parallel across `y`.

use super::scalar::ScalarLayout;
use super::simd::{vec_add, vec_max, NARROW_LANES};
use super::Scoring;
use super::{AlignmentStats, Layout, Mode};

pub struct ScanLayout;

impl Layout for ScanLayout {
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

fn narrow_score(x: &[u8], y: &[u8], mode: Mode, scoring: &Scoring<'_>) -> Option<i32> {
    let xlen = x.len();
    let ylen = y.len();
    if xlen == 0 || ylen == 0 {
        return Some(0);
    }
    let free_ends = mode != Mode::Global;
    let open = scoring.gap_open as i16;
    let extend = scoring.gap_extend as i16;

    let mut m_prev = vec![0i16; ylen + 1];
    let mut dy_prev = vec![i16::MIN / 2; ylen + 1];
    let mut dx_prev = vec![i16::MIN / 2; ylen + 1];
    for j in 1..=ylen {
        m_prev[j] = i16::MIN / 2;
        dy_prev[j] = if free_ends {
            0
        } else {
            -(open + extend * (j as i16 - 1))
        };
    }

    // Semiglobal's optimum may sit anywhere on the last column (tracked
    // incrementally below, one row at a time) or the last row (scanned
    // in full once the sweep finishes); local's optimum may sit anywhere
    // at all, so every cell is folded into `running_best` as it's made.
    let mut running_best: i16 = 0;
    let mut running_last_col: i16 = i16::MIN / 2;
    if mode == Mode::Local {
        for j in 0..=ylen {
            running_best = running_best.max(m_prev[j]).max(dx_prev[j]).max(dy_prev[j]);
        }
    }
    if mode == Mode::Semiglobal {
        running_last_col = running_last_col.max(m_prev[ylen]).max(dx_prev[ylen]).max(dy_prev[ylen]);
    }

    for i in 1..=xlen {
        let mut m_cur = vec![0i16; ylen + 1];
        let mut dy_cur = vec![i16::MIN / 2; ylen + 1];
        let mut dx_cur = vec![0i16; ylen + 1];
        m_cur[0] = i16::MIN / 2;
        dy_cur[0] = i16::MIN / 2;
        dx_cur[0] = if free_ends {
            0
        } else {
            -(open + extend * (i as i16 - 1))
        };
        let mut saturated = false;

        // Diagonal term: parallel across y in chunks.
        let mut j = 1;
        while j <= ylen {
            let width = NARROW_LANES.min(ylen + 1 - j);
            for k in 0..width {
                let yj = j + k;
                let s = scoring.score(x[i - 1], y[yj - 1]) as i16;
                let diag = m_prev[yj - 1].max(dy_prev[yj - 1]).max(dx_prev[yj - 1]);
                let (sum, sat) = vec_add(&[diag; NARROW_LANES], s);
                let mut val = sum[0];
                if mode == Mode::Local && val < 0 {
                    val = 0;
                }
                m_cur[yj] = val;
                saturated |= sat;
            }
            j += width;
        }

        // Deletion term (gap in y): depends only on the previous row, so
        // it is as parallel across y as the diagonal term.
        for jj in 1..=ylen {
            let open_from_m = m_prev[jj].saturating_sub(open);
            let ext_from_dx = dx_prev[jj].saturating_sub(extend);
            let (maxed, sat) = vec_max(&[open_from_m; NARROW_LANES], &[ext_from_dx; NARROW_LANES]);
            dx_cur[jj] = maxed[0];
            saturated |= sat;
        }

        // Insertion term (gap in x): same row's own previous column,
        // serial along y within this row.
        for jj in 1..=ylen {
            let open_from_m = m_cur[jj - 1].saturating_sub(open);
            let ext_from_dy = dy_cur[jj - 1].saturating_sub(extend);
            let (maxed, sat) = vec_max(&[open_from_m; NARROW_LANES], &[ext_from_dy; NARROW_LANES]);
            dy_cur[jj] = maxed[0];
            saturated |= sat;
        }

        if saturated {
            return None;
        }

        if mode == Mode::Local {
            for j in 0..=ylen {
                running_best = running_best.max(m_cur[j]).max(dx_cur[j]).max(dy_cur[j]);
            }
        }
        if mode == Mode::Semiglobal {
            running_last_col = running_last_col.max(m_cur[ylen]).max(dx_cur[ylen]).max(dy_cur[ylen]);
        }

        m_prev = m_cur;
        dx_prev = dx_cur;
        dy_prev = dy_cur;
    }

    let best = match mode {
        Mode::Local => running_best,
        Mode::Semiglobal => {
            let mut best = running_last_col;
            for j in 0..=ylen {
                best = best.max(m_prev[j]).max(dx_prev[j]).max(dy_prev[j]);
            }
            best
        }
        Mode::Global => m_prev[ylen].max(dx_prev[ylen]).max(dy_prev[ylen]),
    };
    Some(best as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::scalar::ScalarLayout;
    use crate::substitution::simple_dna_matrix;

    #[test]
    fn agrees_with_scalar_on_small_global_pairs() {
        let matrix = simple_dna_matrix(2, -1);
        let scoring = Scoring::new(5, 1, &matrix);
        let a = b"ACGTACGT";
        let b = b"ACGTTCGT";
        let scan = ScanLayout.align(a, b, Mode::Global, &scoring);
        let scalar = ScalarLayout.align(a, b, Mode::Global, &scoring);
        assert_eq!(scan.score, scalar.score);
    }

    #[test]
    fn agrees_with_scalar_on_semiglobal_pairs() {
        let matrix = simple_dna_matrix(2, -2);
        let scoring = Scoring::new(5, 1, &matrix);
        let a = b"ACGT";
        let b = b"TTACGTTT";
        let scan = ScanLayout.align(a, b, Mode::Semiglobal, &scoring);
        let scalar = ScalarLayout.align(a, b, Mode::Semiglobal, &scoring);
        assert_eq!(scan.score, scalar.score);
    }
}
