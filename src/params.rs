// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Process-wide, immutable-after-parse run parameters (spec §3, §6).
//!
//! The parameter file format is line-oriented: `#` starts a comment,
//! blank lines are ignored, and every other line is `Key value...`. This
//! is deliberately not a YAML/TOML config layer — parsing a general
//! config format is an explicit non-goal, and the real format here is
//! simpler than that.

use std::borrow::Cow;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

/// Edge-classification and pair-generation parameters, plus alignment
/// penalties and the working alphabet. Constructed once per run and
/// shared read-only across all workers.
#[derive(Debug, Clone)]
pub struct Parameters {
    /// AlignOverLongerSeq threshold, percent in 1..=100.
    pub aol: u32,
    /// MatchSimilarity threshold, percent in 1..=100.
    pub sim: u32,
    /// OptimalScoreOverSelfScore threshold, percent in 1..=100.
    pub os: u32,
    /// k-mer window length used to bucket suffixes.
    pub window_size: usize,
    /// LCP cutoff for pair generation.
    pub exact_match_len: usize,
    /// Affine gap open penalty, expressed as a non-negative integer
    /// (subtracted from the score, not added).
    pub open: i32,
    /// Affine gap extend penalty, non-negative integer.
    pub gap: i32,
    /// Ordered alphabet Σ, excluding the sentinel.
    pub alphabet: Vec<u8>,
    /// Regex patterns; buckets whose k-mer matches any of these are
    /// dropped before suffix insertion.
    pub skip_prefixes: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            aol: 80,
            sim: 40,
            os: 30,
            window_size: 3,
            exact_match_len: 4,
            open: 10,
            gap: 1,
            alphabet: b"ARNDCQEGHILKMFPSTWYVBZX*".to_vec(),
            skip_prefixes: Vec::new(),
        }
    }
}

impl Parameters {
    /// Parse a parameter file in the format documented in spec.md §6.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::Input {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse_str(&text)
    }

    /// Parse the parameter-file format from an in-memory string.
    pub fn parse_str(text: &str) -> Result<Self> {
        let mut params = Parameters::default();

        for raw_line in text.lines() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.splitn(2, char::is_whitespace);
            let key = fields.next().unwrap_or("").trim();
            let value = fields.next().unwrap_or("").trim();
            if key.is_empty() {
                continue;
            }
            match key {
                "SlideWindowSize" => params.window_size = parse_usize(key, value)?,
                "ExactMatchLen" => params.exact_match_len = parse_usize(key, value)?,
                "AlignOverLongerSeq" => params.aol = parse_pct(key, value)?,
                "MatchSimilarity" => params.sim = parse_pct(key, value)?,
                "OptimalScoreOverSelfScore" => params.os = parse_pct(key, value)?,
                "Open" => params.open = parse_penalty(key, value)?,
                "Gap" => params.gap = parse_penalty(key, value)?,
                "Alphabet" => params.alphabet = value.bytes().collect(),
                "SkipPrefixes" => {
                    params.skip_prefixes = value.split_whitespace().map(String::from).collect();
                }
                other => {
                    return Err(Error::Parameter {
                        key: other.to_string(),
                        reason: "unrecognized parameter key".to_string(),
                    })
                }
            }
        }

        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> Result<()> {
        for (name, v) in [("AOL", self.aol), ("SIM", self.sim), ("OS", self.os)] {
            if !(1..=100).contains(&v) {
                return Err(Error::Parameter {
                    key: name.to_string(),
                    reason: format!("must be in 1..=100, got {}", v),
                });
            }
        }
        if self.window_size == 0 {
            return Err(Error::Parameter {
                key: "SlideWindowSize".to_string(),
                reason: "must be > 0".to_string(),
            });
        }
        if self.alphabet.is_empty() {
            return Err(Error::Parameter {
                key: "Alphabet".to_string(),
                reason: "must be non-empty".to_string(),
            });
        }
        // compiled once here purely to fail fast on a bad pattern at parse time.
        for pat in &self.skip_prefixes {
            Regex::new(pat).map_err(|e| Error::Parameter {
                key: "SkipPrefixes".to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Compiled skip-prefix matchers, built once and reused by the bucket
    /// builder (spec §4.6's `filter_out`).
    pub fn compiled_skip_prefixes(&self) -> Result<Vec<Regex>> {
        self.skip_prefixes
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| Error::Parameter {
                    key: "SkipPrefixes".to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

fn strip_comment(line: &str) -> Cow<'_, str> {
    match line.find('#') {
        Some(idx) => Cow::Borrowed(&line[..idx]),
        None => Cow::Borrowed(line),
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value.parse::<usize>().map_err(|e| Error::Parameter {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn parse_pct(key: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|e| Error::Parameter {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn parse_penalty(key: &str, value: &str) -> Result<i32> {
    let v: i32 = value.parse().map_err(|e: std::num::ParseIntError| Error::Parameter {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(v.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let text = "\
# a comment
SlideWindowSize 3
ExactMatchLen 4
AlignOverLongerSeq 80   # trailing comment
MatchSimilarity 40
OptimalScoreOverSelfScore 30
Open 10
Gap 1
Alphabet ARNDCQEGHILKMFPSTWYVBZX*
SkipPrefixes NN. XX.
";
        let p = Parameters::parse_str(text).unwrap();
        assert_eq!(p.window_size, 3);
        assert_eq!(p.exact_match_len, 4);
        assert_eq!(p.aol, 80);
        assert_eq!(p.sim, 40);
        assert_eq!(p.os, 30);
        assert_eq!(p.open, 10);
        assert_eq!(p.gap, 1);
        assert_eq!(p.skip_prefixes, vec!["NN.".to_string(), "XX.".to_string()]);
    }

    #[test]
    fn rejects_out_of_range_percent() {
        let text = "AlignOverLongerSeq 0\n";
        assert!(Parameters::parse_str(text).is_err());
    }

    #[test]
    fn rejects_unknown_key() {
        let text = "BogusKey 1\n";
        assert!(Parameters::parse_str(text).is_err());
    }

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        let text = "\n# just a comment\n   \nOpen 5\n";
        let p = Parameters::parse_str(text).unwrap();
        assert_eq!(p.open, 5);
    }
}
