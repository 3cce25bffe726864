// Copyright 2024 pgraph contributors
// Licensed under the MIT license (http://opensource.org/licenses/MIT)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Shared-memory sequence store (C1, spec §4.1).
//!
//! Packing rewrites a FASTA file into `>id#SEQUENCE$>id#SEQUENCE$...`
//! with one delimiter byte (`$` or `\0`) terminating each record, then
//! indexes the packed buffer. The packed buffer is exposed to every
//! worker on a node through the same memory mapping rather than copied,
//! per spec's "shared by memory mapping rather than copied".

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

use memmap2::{Mmap, MmapMut};

use crate::alphabet::SENTINEL;
use crate::error::{Error, Result};

/// Delimiter used to terminate a packed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Dollar,
    Nul,
}

impl Delimiter {
    #[inline]
    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Dollar => SENTINEL,
            Delimiter::Nul => 0u8,
        }
    }
}

/// An immutable view over one packed record: `[data, data+len)` for the
/// sequence body, with an optional id range. Does not own the bytes;
/// ownership lives in the enclosing `SequenceStore`.
#[derive(Debug, Clone, Copy)]
pub struct Sequence<'a> {
    data: &'a [u8],
    id_begin: usize,
    id_end: usize,
    seq_begin: usize,
    seq_end: usize,
}

impl<'a> Sequence<'a> {
    #[inline]
    pub fn id(&self) -> &'a [u8] {
        &self.data[self.id_begin..self.id_end]
    }

    /// The sequence body, excluding the trailing sentinel (spec §3: "`len`
    /// excludes the trailing sentinel").
    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        &self.data[self.seq_begin..self.seq_end]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.seq_end - self.seq_begin
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Record {
    id_begin: usize,
    id_end: usize,
    begin: usize,
    end: usize,
}

enum Backing {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v,
            Backing::Mapped(m) => m,
        }
    }
}

/// Owns one contiguous packed buffer `T[0..N)` plus a `{begin, end}`
/// index per sequence (spec §3's `SequenceStore`).
pub struct SequenceStore {
    backing: Backing,
    records: Vec<Record>,
    max_len: usize,
}

impl SequenceStore {
    /// Pack a FASTA file in memory (no sharing with other processes).
    pub fn pack_in_memory(path: &Path, delim: Delimiter) -> Result<Self> {
        let raw = std::fs::read(path).map_err(|e| Error::Input {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let packed = pack(&raw, delim).map_err(|reason| Error::Input {
            path: path.to_path_buf(),
            reason,
        })?;
        let records = index(&packed, delim)?;
        let max_len = records.iter().map(|r| r.end - r.begin).max().unwrap_or(0);
        Ok(SequenceStore {
            backing: Backing::Owned(packed),
            records,
            max_len,
        })
    }

    /// Pack a FASTA file into a freshly created, truncated mmap'd file at
    /// `shm_path` and index it. This is the "primary" role in spec §4.1's
    /// multi-process packing dance: exactly one process calls this; every
    /// other process on the node calls `open_shared_wait`.
    pub fn pack_shared(input: &Path, shm_path: &Path, delim: Delimiter) -> Result<Self> {
        let raw = std::fs::read(input).map_err(|e| Error::Input {
            path: input.to_path_buf(),
            reason: e.to_string(),
        })?;
        let packed = pack(&raw, delim).map_err(|reason| Error::Input {
            path: input.to_path_buf(),
            reason,
        })?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(shm_path)
            .map_err(|e| Error::Resource(e.to_string()))?;
        file.set_len(packed.len() as u64)
            .map_err(|e| Error::Resource(e.to_string()))?;
        {
            // SAFETY: `file` was just created by us and truncated to the
            // exact packed length; no other writer can observe it until
            // we finish writing and drop this mapping.
            let mut mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|e| Error::Resource(e.to_string()))?;
            mmap.copy_from_slice(&packed);
            mmap.flush().map_err(|e| Error::Resource(e.to_string()))?;
        }

        let records = index(&packed, delim)?;
        let max_len = records.iter().map(|r| r.end - r.begin).max().unwrap_or(0);
        // Re-open read-only so every local worker (including this one)
        // shares identical physical pages (MAP_SHARED semantics).
        let ro = File::open(shm_path).map_err(|e| Error::Resource(e.to_string()))?;
        let mmap = unsafe { Mmap::map(&ro) }.map_err(|e| Error::Resource(e.to_string()))?;
        Ok(SequenceStore {
            backing: Backing::Mapped(mmap),
            records,
            max_len,
        })
    }

    /// Open a shared-memory object written by another process's
    /// `pack_shared`, busy-waiting until the leading `>` byte is visible
    /// (spec §4.1: "partial packing is never visible to readers; they
    /// busy-wait for the leading `>` byte before indexing").
    pub fn open_shared_wait(shm_path: &Path, delim: Delimiter, poll: Duration) -> Result<Self> {
        loop {
            if let Ok(file) = File::open(shm_path) {
                if let Ok(mmap) = unsafe { Mmap::map(&file) } {
                    if !mmap.is_empty() && mmap[0] == b'>' {
                        let records = index(&mmap, delim)?;
                        let max_len = records.iter().map(|r| r.end - r.begin).max().unwrap_or(0);
                        return Ok(SequenceStore {
                            backing: Backing::Mapped(mmap),
                            records,
                            max_len,
                        });
                    }
                }
            }
            thread::sleep(poll);
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.records.len()
    }

    /// Same as `size()` on a single node; distributed deployments may
    /// track a separate global count across nodes (spec §4.1).
    #[inline]
    pub fn global_count(&self) -> usize {
        self.size()
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[inline]
    pub fn get(&self, i: usize) -> Sequence<'_> {
        let r = self.records[i];
        let data = self.backing.as_slice();
        Sequence {
            data,
            id_begin: r.id_begin,
            id_end: r.id_end,
            seq_begin: r.begin,
            seq_end: r.end,
        }
    }

    /// Position in the concatenated packed buffer where sequence `i`'s
    /// body begins; used to build the `SID` array alongside the suffix
    /// array (spec §3, §4.5).
    #[inline]
    pub fn begin(&self, i: usize) -> usize {
        self.records[i].begin
    }

    #[inline]
    pub fn end(&self, i: usize) -> usize {
        self.records[i].end
    }

    /// The whole packed buffer `T[0..N)`, for feeding the suffix-array
    /// builder (spec §4.5).
    pub fn packed(&self) -> &[u8] {
        self.backing.as_slice()
    }
}

/// Rewrite raw FASTA bytes into `>id#SEQUENCE<delim>` repeated.
fn pack(raw: &[u8], delim: Delimiter) -> std::result::Result<Vec<u8>, String> {
    if raw.first() != Some(&b'>') {
        return Err("input does not start with '>'".to_string());
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0usize;
    let n = raw.len();
    let mut saw_any_record = false;

    while i < n {
        if raw[i] != b'>' {
            return Err(format!("expected '>' at offset {}", i));
        }
        saw_any_record = true;
        out.push(b'>');
        i += 1;

        // header: up to end of line. Any CR/LF encountered while still
        // reading header lines collapses to a single '#' separator.
        while i < n && raw[i] != b'\n' {
            if raw[i] != b'\r' {
                out.push(raw[i]);
            }
            i += 1;
        }
        if i < n {
            i += 1; // consume '\n'
        }
        out.push(b'#');

        // sequence body: everything up to the next '>' at column 0 or EOF.
        let mut wrote_any = false;
        while i < n && raw[i] != b'>' {
            let b = raw[i];
            if b != b'\n' && b != b'\r' && !b.is_ascii_whitespace() {
                out.push(b);
                wrote_any = true;
            }
            i += 1;
        }
        if !wrote_any {
            return Err("record has an empty sequence".to_string());
        }
        out.push(delim.byte());
    }

    if !saw_any_record {
        return Err("no sentinel found".to_string());
    }
    Ok(out)
}

fn index(packed: &[u8], delim: Delimiter) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut i = 0usize;
    let n = packed.len();
    let delim_byte = delim.byte();

    while i < n {
        if packed[i] != b'>' {
            return Err(Error::Input {
                path: "<packed>".into(),
                reason: format!("expected '>' at offset {}", i),
            });
        }
        let id_begin = i + 1;
        let mut j = id_begin;
        while j < n && packed[j] != b'#' {
            j += 1;
        }
        if j >= n {
            return Err(Error::Input {
                path: "<packed>".into(),
                reason: "missing '#' id separator".to_string(),
            });
        }
        let id_end = j;
        let begin = j + 1;
        let mut k = begin;
        while k < n && packed[k] != delim_byte {
            k += 1;
        }
        if k >= n {
            return Err(Error::Input {
                path: "<packed>".into(),
                reason: "missing sentinel".to_string(),
            });
        }
        if k == begin {
            return Err(Error::Input {
                path: "<packed>".into(),
                reason: "empty sequence".to_string(),
            });
        }
        records.push(Record {
            id_begin,
            id_end,
            begin,
            end: k,
        });
        i = k + 1;
    }

    if records.is_empty() {
        return Err(Error::Input {
            path: "<packed>".into(),
            reason: "no sentinel found".to_string(),
        });
    }
    Ok(records)
}

/// Read a byte buffer and write it to `path`, a small helper used by
/// tests that need a real file on disk for `pack_in_memory`/`pack_shared`.
#[cfg(test)]
pub(crate) fn write_fasta(path: &Path, contents: &str) {
    let mut f = File::create(path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn packs_and_indexes_two_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write_fasta(&path, ">a\nACGT\n>b\nACGT\n");

        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        assert_eq!(store.size(), 2);
        assert_eq!(store.get(0).bytes(), b"ACGT");
        assert_eq!(store.get(1).bytes(), b"ACGT");
        assert_eq!(store.get(0).id(), b"a");
        assert_eq!(store.max_len(), 4);
        assert_eq!(store.packed()[store.end(0)], b'$');
    }

    #[test]
    fn strips_internal_whitespace_and_wrapped_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write_fasta(&path, ">x desc\nAC GT\nAC\tGT\n");

        let store = SequenceStore::pack_in_memory(&path, Delimiter::Dollar).unwrap();
        assert_eq!(store.get(0).bytes(), b"ACGTACGT");
        assert_eq!(store.get(0).id(), b"x desc");
    }

    #[test]
    fn rejects_input_without_leading_gt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write_fasta(&path, "ACGT\n");
        assert!(SequenceStore::pack_in_memory(&path, Delimiter::Dollar).is_err());
    }

    #[test]
    fn rejects_record_with_empty_sequence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.fasta");
        write_fasta(&path, ">a\n>b\nACGT\n");
        assert!(SequenceStore::pack_in_memory(&path, Delimiter::Dollar).is_err());
    }

    #[test]
    fn pack_shared_then_open_shared_see_same_bytes() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.fasta");
        let shm = dir.path().join("shm");
        write_fasta(&input, ">a\nACGT\n>b\nACGTT\n");

        let primary = SequenceStore::pack_shared(&input, &shm, Delimiter::Dollar).unwrap();
        let secondary = SequenceStore::open_shared_wait(&shm, Delimiter::Dollar, Duration::from_millis(1)).unwrap();

        assert_eq!(primary.size(), secondary.size());
        for i in 0..primary.size() {
            assert_eq!(primary.get(i).bytes(), secondary.get(i).bytes());
        }
    }
}
