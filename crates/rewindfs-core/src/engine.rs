// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Overlay read / append write engine
//!
//! Reads reconstruct "the bytes right now" by walking a file's chunk chain
//! newest-first and resolving it against a set of still-open buffer
//! intervals; whatever the chain never covered falls through to the native
//! backing, or to zeros for growth gaps that were never written. Writes
//! never touch existing state: each one allocates a fresh payload and
//! prepends one chunk record, so moving a head pointer back is a complete
//! undo.

use crate::chain::ChunkArena;
use crate::error::{FsError, FsResult};
use crate::native::NativeFs;
use crate::storage::PayloadStore;
use crate::types::{CanonicalPath, ChunkId};

/// Result of an append write.
#[derive(Clone, Copy, Debug)]
pub struct WriteOutcome {
    pub head: Option<ChunkId>,
    pub length: u64,
    pub written: usize,
}

/// Append `data` as a new chunk at absolute offset `start`.
///
/// A zero-length write allocates nothing and leaves the chain untouched.
/// Writing past the current length grows the logical length without
/// materializing the gap; the gap reads as zero (or native bytes) later.
pub fn write_at(
    arena: &mut ChunkArena,
    payloads: &dyn PayloadStore,
    head: Option<ChunkId>,
    length: u64,
    start: u64,
    data: &[u8],
) -> FsResult<WriteOutcome> {
    if data.is_empty() {
        return Ok(WriteOutcome {
            head,
            length,
            written: 0,
        });
    }

    let payload = payloads.allocate(data)?;
    let new_head = arena.append(head, start, data.len() as u64, payload);
    let end = start + data.len() as u64;

    Ok(WriteOutcome {
        head: Some(new_head),
        length: std::cmp::max(length, end),
        written: data.len(),
    })
}

/// Read into `buf` starting at absolute offset `start`.
///
/// Returns the number of readable bytes, clamped to the logical length;
/// zero once `start` is at or past end of data.
pub fn read_at(
    arena: &ChunkArena,
    payloads: &dyn PayloadStore,
    head: Option<ChunkId>,
    native: Option<(&dyn NativeFs, &CanonicalPath)>,
    length: u64,
    start: u64,
    buf: &mut [u8],
) -> FsResult<usize> {
    if start >= length {
        return Ok(0);
    }
    let readable = std::cmp::min(buf.len() as u64, length - start) as usize;
    let window_start = start;
    let window_end = start + readable as u64;

    // Buffer-relative intervals not yet resolved by any chunk.
    let mut open: Vec<(usize, usize)> = vec![(0, readable)];

    for chunk in arena.iter_from(head) {
        if open.is_empty() {
            break;
        }

        // Clip the chunk against the read window, in absolute coordinates.
        let abs_lo = std::cmp::max(chunk.start, window_start);
        let abs_hi = std::cmp::min(chunk.end(), window_end);
        if abs_lo >= abs_hi {
            continue;
        }
        let c_lo = (abs_lo - window_start) as usize;
        let c_hi = (abs_hi - window_start) as usize;

        // Resolve against each open interval. Four cases fall out of the
        // interval arithmetic: full cover, strict middle, left part, right
        // part. The walk is newest-first, so a byte filled here is final;
        // it leaves the open set and older chunks can never overwrite it.
        let mut remaining = Vec::with_capacity(open.len() + 1);
        for (o_lo, o_hi) in open {
            let f_lo = std::cmp::max(o_lo, c_lo);
            let f_hi = std::cmp::min(o_hi, c_hi);
            if f_lo >= f_hi {
                remaining.push((o_lo, o_hi));
                continue;
            }

            let payload_off = window_start + f_lo as u64 - chunk.start;
            let n = payloads.read(chunk.payload, payload_off, &mut buf[f_lo..f_hi])?;
            if n != f_hi - f_lo {
                // A payload is always exactly as long as its chunk record;
                // a short read means the write cache is corrupt.
                return Err(FsError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "chunk payload shorter than its record",
                )));
            }

            if o_lo < f_lo {
                remaining.push((o_lo, f_lo));
            }
            if f_hi < o_hi {
                remaining.push((f_hi, o_hi));
            }
        }
        open = remaining;
    }

    // Whatever the chain never covered: native bytes where backing exists,
    // zeros elsewhere (including past-native-EOF growth gaps).
    for (o_lo, o_hi) in open {
        buf[o_lo..o_hi].fill(0);
        if let Some((native_fs, path)) = native {
            let abs_off = window_start + o_lo as u64;
            native_fs.read_range(path, abs_off, &mut buf[o_lo..o_hi])?;
        }
    }

    Ok(readable)
}
