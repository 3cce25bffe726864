// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The error taxonomy used throughout the crate (spec §7).
//!
//! Four of the five kinds map to a fallible `Result`; the fifth (logic
//! errors / internal invariant violations) is intentionally represented
//! as `assert!`/`debug_assert!` at the call site rather than as a variant
//! here, since spec.md classifies those as bugs rather than recoverable
//! conditions.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Malformed FASTA: no leading `>`, or a record with no sentinel.
    #[error("malformed input at {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    /// mmap/ftruncate/shm_open/allocation failure. All participants must
    /// treat this as fatal to avoid operating on half-initialized shared
    /// state.
    #[error("resource allocation failed: {0}")]
    Resource(String),

    /// Both the 8-bit and the escalated 16-bit kernel saturated; the pair
    /// carries a score that must not be used for edge classification.
    #[error("alignment score saturated at both precisions for a {xlen}x{ylen} pair")]
    Saturated { xlen: usize, ylen: usize },

    /// A collective/barrier operation failed; the whole job aborts.
    #[error("distributed coordination failure: {0}")]
    Distributed(String),

    /// A parameter file line or CLI argument was not parseable.
    #[error("invalid parameter {key}: {reason}")]
    Parameter { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
