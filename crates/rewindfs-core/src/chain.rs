// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Append-only write-chunk arena
//!
//! Every write during a run becomes one `WriteChunk` record in a single
//! arena, linked newest-first into a per-file chain. Records are addressed
//! by index, so a chain head is a small copyable integer: snapshotting a
//! file's content state means saving that integer, nothing more. Nothing in
//! the arena is ever mutated or removed; chunks left unreachable after a
//! restore stay allocated because an earlier host snapshot may still lead
//! back to them.

use crate::types::{ChunkId, PayloadId};

/// Immutable record of one write.
#[derive(Clone, Copy, Debug)]
pub struct WriteChunk {
    /// Absolute byte offset of the write in the file.
    pub start: u64,
    /// Number of bytes written.
    pub len: u64,
    /// Handle to the written bytes in the payload store.
    pub payload: PayloadId,
    /// Chunk written immediately before this one, if any.
    pub prev: Option<ChunkId>,
}

impl WriteChunk {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }
}

/// Arena of write chunks for the whole model.
#[derive(Debug, Default)]
pub struct ChunkArena {
    chunks: Vec<WriteChunk>,
    total_bytes: u64,
}

impl ChunkArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk whose `prev` is the given chain head; returns the id
    /// that becomes the new head.
    pub fn append(
        &mut self,
        prev: Option<ChunkId>,
        start: u64,
        len: u64,
        payload: PayloadId,
    ) -> ChunkId {
        let id = ChunkId::new(self.chunks.len() as u64);
        self.chunks.push(WriteChunk {
            start,
            len,
            payload,
            prev,
        });
        self.total_bytes += len;
        id
    }

    pub fn get(&self, id: ChunkId) -> &WriteChunk {
        &self.chunks[id.index()]
    }

    /// Walk a chain from its head toward the oldest chunk.
    pub fn iter_from(&self, head: Option<ChunkId>) -> ChainIter<'_> {
        ChainIter { arena: self, next: head }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }
}

pub struct ChainIter<'a> {
    arena: &'a ChunkArena,
    next: Option<ChunkId>,
}

impl<'a> Iterator for ChainIter<'a> {
    type Item = &'a WriteChunk;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let chunk = self.arena.get(id);
        self.next = chunk.prev;
        Some(chunk)
    }
}
