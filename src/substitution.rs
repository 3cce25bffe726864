// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Substitution scorer (C2, spec §4.2). The matrix contents themselves
//! are an external constant (spec §1 non-goals); this module only owns
//! the byte→row mapping and the `score(a, b)` lookup.

use vec_map::VecMap;

/// Canonical row order used by every bundled substitution matrix.
pub const CANONICAL_ORDER: &[u8] = b"ARNDCQEGHILKMFPSTWYVBZX*";

/// A square, signed integer substitution matrix over `CANONICAL_ORDER`
/// (spec §3: "a 24×24 signed integer table plus a mapping from byte →
/// 0..23").
#[derive(Clone)]
pub struct SubstitutionMatrix {
    rows: Vec<Vec<i32>>,
    index: VecMap<u8>,
}

impl SubstitutionMatrix {
    /// Build a scorer from a square matrix given in `CANONICAL_ORDER`.
    ///
    /// # Panics
    /// Panics if `matrix` is not square or its size does not match
    /// `CANONICAL_ORDER`'s length.
    pub fn new(matrix: Vec<Vec<i32>>) -> Self {
        assert_eq!(matrix.len(), CANONICAL_ORDER.len());
        for row in &matrix {
            assert_eq!(row.len(), CANONICAL_ORDER.len());
        }
        let mut index = VecMap::new();
        for (r, &c) in CANONICAL_ORDER.iter().enumerate() {
            index.insert(c as usize, r as u8);
            index.insert((c as char).to_ascii_lowercase() as usize, r as u8);
        }
        SubstitutionMatrix { rows: matrix, index }
    }

    /// Thread-safe, read-only score lookup. Unknown bytes score as the
    /// worst-case mismatch against `*` (the wildcard row), matching how
    /// real substitution tables treat unexpected residues.
    #[inline]
    pub fn score(&self, a: u8, b: u8) -> i32 {
        let ra = self.row_of(a);
        let rb = self.row_of(b);
        self.rows[ra as usize][rb as usize]
    }

    #[inline]
    fn row_of(&self, a: u8) -> u8 {
        self.index
            .get(a as usize)
            .copied()
            .unwrap_or_else(|| (CANONICAL_ORDER.len() - 1) as u8)
    }
}

/// BLOSUM62, included as plain data per spec.md's framing: "BLOSUM
/// substitution-table data itself [is] treated as an external constant".
/// Row/column order is `CANONICAL_ORDER`.
pub mod blosum62 {
    use super::{SubstitutionMatrix, CANONICAL_ORDER};

    #[rustfmt::skip]
    const MATRIX: [[i32; 24]; 24] = [
        /*        A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V   B   Z   X   * */
        /* A */ [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1,  0, -4],
        /* R */ [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1,  0, -1, -4],
        /* N */ [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  3,  0, -1, -4],
        /* D */ [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4,  1, -1, -4],
        /* C */ [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2, -4],
        /* Q */ [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0,  3, -1, -4],
        /* E */ [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4],
        /* G */ [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -2, -1, -4],
        /* H */ [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0,  0, -1, -4],
        /* I */ [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3, -3, -1, -4],
        /* L */ [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4, -3, -1, -4],
        /* K */ [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0,  1, -1, -4],
        /* M */ [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3, -1, -1, -4],
        /* F */ [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3, -3, -1, -4],
        /* P */ [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -1, -2, -4],
        /* S */ [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0,  0,  0, -4],
        /* T */ [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1,  0, -4],
        /* W */ [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -3, -2, -4],
        /* Y */ [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -2, -1, -4],
        /* V */ [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3, -2, -1, -4],
        /* B */ [-2, -1,  3,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4,  1, -1, -4],
        /* Z */ [-1,  0,  0,  1, -3,  3,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1, -4],
        /* X */ [ 0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2,  0,  0, -2, -1, -1, -1, -1, -1, -4],
        /* * */ [-4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4, -4,  1],
    ];

    pub fn matrix() -> SubstitutionMatrix {
        debug_assert_eq!(MATRIX.len(), CANONICAL_ORDER.len());
        SubstitutionMatrix::new(MATRIX.iter().map(|r| r.to_vec()).collect())
    }
}

/// A trivial DNA-like `match`/`mismatch` scorer, used by the simple
/// two-sequence scenarios in spec.md §8 where a full amino acid matrix
/// would be overkill.
pub fn simple_dna_matrix(match_score: i32, mismatch_score: i32) -> SubstitutionMatrix {
    let n = CANONICAL_ORDER.len();
    let mut rows = vec![vec![mismatch_score; n]; n];
    for i in 0..n {
        rows[i][i] = match_score;
    }
    SubstitutionMatrix::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blosum62_is_symmetric_and_self_positive() {
        let m = blosum62::matrix();
        for &a in CANONICAL_ORDER {
            for &b in CANONICAL_ORDER {
                assert_eq!(m.score(a, b), m.score(b, a));
            }
            assert!(m.score(a, a) > 0 || a == b'*');
        }
    }

    #[test]
    fn lowercase_maps_to_same_row() {
        let m = blosum62::matrix();
        assert_eq!(m.score(b'A', b'R'), m.score(b'a', b'r'));
    }

    #[test]
    fn simple_dna_scores_match_mismatch() {
        let m = simple_dna_matrix(4, -1);
        assert_eq!(m.score(b'A', b'A'), 4);
        assert_eq!(m.score(b'A', b'C'), -1);
    }
}
