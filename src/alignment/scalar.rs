// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Scalar affine-gap DP (Gotoh's algorithm), the correctness oracle the
//! SIMD layouts are checked against (spec §8's "aligner parity"
//! property). Never the hot path in production; kept simple and obvious
//! on purpose.

use super::{AlignmentStats, Cell, Layout, Mode, Scoring};

const NEG: i32 = -1_000_000_000;

/// Picks the best of up to three predecessor cells, breaking ties
/// diagonal > deletion > insertion (spec §4.3's tie-break rule).
#[inline]
fn best_of(diag: Cell, del: Cell, ins: Cell) -> Cell {
    let mut best = diag;
    if del.score > best.score {
        best = del;
    }
    if ins.score > best.score {
        best = ins;
    }
    best
}

pub struct ScalarLayout;

impl Layout for ScalarLayout {
    fn align(&self, x: &[u8], y: &[u8], mode: Mode, scoring: &Scoring<'_>) -> AlignmentStats {
        scalar_align(x, y, mode, scoring)
    }
}

fn scalar_align(x: &[u8], y: &[u8], mode: Mode, scoring: &Scoring<'_>) -> AlignmentStats {
    let xlen = x.len();
    let ylen = y.len();
    let clip = mode.clip_penalties();

    // m[i][j]: best ending in a match/substitution at (x[i-1], y[j-1]).
    // dx[i][j]: best ending in a gap in y (x[i-1] consumed alone).
    // dy[i][j]: best ending in a gap in x (y[j-1] consumed alone).
    let cols = ylen + 1;
    let mut m = vec![Cell::default(); (xlen + 1) * cols];
    let mut dx = vec![Cell::default(); (xlen + 1) * cols];
    let mut dy = vec![Cell::default(); (xlen + 1) * cols];
    let idx = |i: usize, j: usize| i * cols + j;

    let neg_cell = Cell {
        score: NEG,
        matches: 0,
        length: 0,
    };

    m[idx(0, 0)] = Cell::default();
    dx[idx(0, 0)] = neg_cell;
    dy[idx(0, 0)] = neg_cell;

    for i in 1..=xlen {
        m[idx(i, 0)] = neg_cell;
        dy[idx(i, 0)] = neg_cell;
        dx[idx(i, 0)] = prefix_clip_cell(i, clip.x_prefix_free, scoring);
    }
    for j in 1..=ylen {
        m[idx(0, j)] = neg_cell;
        dx[idx(0, j)] = neg_cell;
        dy[idx(0, j)] = prefix_clip_cell(j, clip.y_prefix_free, scoring);
    }

    for i in 1..=xlen {
        for j in 1..=ylen {
            let s = scoring.score(x[i - 1], y[j - 1]);
            let diag_best = best_of(m[idx(i - 1, j - 1)], dx[idx(i - 1, j - 1)], dy[idx(i - 1, j - 1)]);
            let mut cell = Cell {
                score: diag_best.score + s,
                matches: diag_best.matches + (x[i - 1] == y[j - 1]) as u32,
                length: diag_best.length + 1,
            };
            if mode == Mode::Local && cell.score < 0 {
                cell = Cell::default();
            }
            m[idx(i, j)] = cell;

            let open = Cell {
                score: m[idx(i - 1, j)].score - scoring.gap_open,
                matches: m[idx(i - 1, j)].matches,
                length: m[idx(i - 1, j)].length + 1,
            };
            let extend = Cell {
                score: dx[idx(i - 1, j)].score - scoring.gap_extend,
                matches: dx[idx(i - 1, j)].matches,
                length: dx[idx(i - 1, j)].length + 1,
            };
            dx[idx(i, j)] = if extend.score > open.score { extend } else { open };

            let open = Cell {
                score: m[idx(i, j - 1)].score - scoring.gap_open,
                matches: m[idx(i, j - 1)].matches,
                length: m[idx(i, j - 1)].length + 1,
            };
            let extend = Cell {
                score: dy[idx(i, j - 1)].score - scoring.gap_extend,
                matches: dy[idx(i, j - 1)].matches,
                length: dy[idx(i, j - 1)].length + 1,
            };
            dy[idx(i, j)] = if extend.score > open.score { extend } else { open };
        }
    }

    let best = if mode == Mode::Local {
        let mut best = Cell::default();
        for i in 0..=xlen {
            for j in 0..=ylen {
                let c = best_of(m[idx(i, j)], dx[idx(i, j)], dy[idx(i, j)]);
                if c.score > best.score {
                    best = c;
                }
            }
        }
        best
    } else if clip.x_suffix_free || clip.y_suffix_free {
        // Semiglobal: free trailing clip means the optimum may sit
        // anywhere on the last row or column, not only the corner.
        let mut best = best_of(m[idx(xlen, ylen)], dx[idx(xlen, ylen)], dy[idx(xlen, ylen)]);
        if clip.y_suffix_free {
            for i in 0..=xlen {
                let c = best_of(m[idx(i, ylen)], dx[idx(i, ylen)], dy[idx(i, ylen)]);
                if c.score > best.score {
                    best = c;
                }
            }
        }
        if clip.x_suffix_free {
            for j in 0..=ylen {
                let c = best_of(m[idx(xlen, j)], dx[idx(xlen, j)], dy[idx(xlen, j)]);
                if c.score > best.score {
                    best = c;
                }
            }
        }
        best
    } else {
        best_of(m[idx(xlen, ylen)], dx[idx(xlen, ylen)], dy[idx(xlen, ylen)])
    };

    AlignmentStats {
        score: best.score,
        matches: best.matches,
        aligned_len: best.length,
        xlen,
        ylen,
    }
}

/// Leading-gap cost for position `i`: free under semiglobal/local, a
/// real affine-gap cost under global.
fn prefix_clip_cell(i: usize, free: bool, scoring: &Scoring<'_>) -> Cell {
    if free {
        Cell::default()
    } else {
        Cell {
            score: -(scoring.gap_open + scoring.gap_extend * (i as i32 - 1)),
            matches: 0,
            length: i as u32,
        }
    }
}
