// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Anti-diagonal (wavefront) layout. Every cell on diagonal `d = i + j`
//! depends only on diagonals `d-1` and `d-2`, so an entire diagonal is
//! computed in parallel with no correction pass at all — unlike the
//! striped and scan layouts, which each need one axis resolved serially.

use super::scalar::ScalarLayout;
use super::simd::{vec_max, NARROW_LANES};
use super::Scoring;
use super::{AlignmentStats, Layout, Mode};

pub struct WozniakLayout;

impl Layout for WozniakLayout {
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

const NEG: i16 = i16::MIN / 2;

/// `i`-indexed snapshot of one diagonal: `cell(i)` lives at `(i, d - i)`.
#[derive(Clone)]
struct Diagonal {
    m: Vec<i16>,
    dx: Vec<i16>,
    dy: Vec<i16>,
}

impl Diagonal {
    fn filled(xlen: usize) -> Self {
        Diagonal {
            m: vec![NEG; xlen + 1],
            dx: vec![NEG; xlen + 1],
            dy: vec![NEG; xlen + 1],
        }
    }
}

/// Folds every cell of diagonal `d` (cells `(i, d-i)` for `i` in
/// `i_min..=i_max`) into the running-best accumulators: `running_best`
/// tracks every cell seen so far (local's optimum may sit anywhere),
/// `running_edge` tracks only cells on the last row (`i == xlen`) or
/// last column (`j == ylen`) (semiglobal's optimum may sit on either).
fn track_diagonal(
    diag: &Diagonal,
    d: usize,
    i_min: usize,
    i_max: usize,
    xlen: usize,
    ylen: usize,
    mode: Mode,
    running_best: &mut i16,
    running_edge: &mut i16,
) {
    for i in i_min..=i_max {
        let j = d - i;
        let v = diag.m[i].max(diag.dx[i]).max(diag.dy[i]);
        if mode == Mode::Local {
            *running_best = (*running_best).max(v);
        }
        if mode == Mode::Semiglobal && (i == xlen || j == ylen) {
            *running_edge = (*running_edge).max(v);
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

    let prefix_cost = |n: usize| -> i16 {
        if free_ends {
            0
        } else {
            -(open + extend * (n as i16 - 1))
        }
    };

    // d = 0: only (0, 0).
    let mut d_minus_2 = Diagonal::filled(xlen);
    d_minus_2.m[0] = 0;

    // d = 1: either (1, 0) or (0, 1), both matrix-edge cells.
    let mut d_minus_1 = Diagonal::filled(xlen);
    if xlen >= 1 {
        d_minus_1.dx[1] = prefix_cost(1);
    }
    if ylen >= 1 {
        d_minus_1.dy[0] = prefix_cost(1);
    }

    let total = xlen + ylen;
    let mut saturated = false;

    // Local's optimum may sit on any diagonal's cell; semiglobal's may
    // sit on any cell of the last row (i == xlen) or last column
    // (j == ylen). Both are folded in as each diagonal is produced,
    // since no single diagonal snapshot stays around long enough to
    // scan after the fact.
    let mut running_best: i16 = 0;
    let mut running_edge: i16 = i16::MIN / 2;
    track_diagonal(&d_minus_2, 0, 0, 0, xlen, ylen, mode, &mut running_best, &mut running_edge);
    track_diagonal(&d_minus_1, 1, 0, 1, xlen, ylen, mode, &mut running_best, &mut running_edge);

    for d in 2..=total {
        let i_min = d.saturating_sub(ylen);
        let i_max = d.min(xlen);
        let mut cur = Diagonal::filled(xlen);

        for i in i_min..=i_max {
            let j = d - i;
            if i == 0 {
                cur.dy[0] = prefix_cost(j);
                continue;
            }
            if j == 0 {
                cur.dx[i] = prefix_cost(i);
                continue;
            }

            let s = scoring.score(x[i - 1], y[j - 1]) as i16;
            let diag_pred = d_minus_2.m[i - 1].max(d_minus_2.dx[i - 1]).max(d_minus_2.dy[i - 1]);
            let mut m_val = diag_pred.saturating_add(s);
            if mode == Mode::Local && m_val < 0 {
                m_val = 0;
            }
            cur.m[i] = m_val;
            saturated |= m_val == i16::MAX || m_val == i16::MIN;

            let open_dx = d_minus_1.m[i - 1].saturating_sub(open);
            let ext_dx = d_minus_1.dx[i - 1].saturating_sub(extend);
            let (dx_pair, sat_dx) = vec_max(&[open_dx; NARROW_LANES], &[ext_dx; NARROW_LANES]);
            cur.dx[i] = dx_pair[0];

            let open_dy = d_minus_1.m[i].saturating_sub(open);
            let ext_dy = d_minus_1.dy[i].saturating_sub(extend);
            let (dy_pair, sat_dy) = vec_max(&[open_dy; NARROW_LANES], &[ext_dy; NARROW_LANES]);
            cur.dy[i] = dy_pair[0];

            saturated |= sat_dx || sat_dy;
        }

        track_diagonal(&cur, d, i_min, i_max, xlen, ylen, mode, &mut running_best, &mut running_edge);

        d_minus_2 = d_minus_1;
        d_minus_1 = cur;
        if saturated {
            return None;
        }
    }

    let last = &d_minus_1;
    let best = match mode {
        Mode::Local => running_best,
        Mode::Semiglobal => running_edge,
        Mode::Global => last.m[xlen].max(last.dx[xlen]).max(last.dy[xlen]),
    };
    Some(best as i32)
}
