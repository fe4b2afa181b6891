// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! rewindfs core: a backtrackable file-system model
//!
//! Gives a program under analysis the illusion of a real file system while
//! keeping every side effect revertible. Writes append immutable chunks to
//! per-file chains; deletes flip tombstones; pre-existing content is
//! discovered lazily from a native source and never copied. A state-space
//! exploration host snapshots the model by saving head pointers and flags,
//! and rewinds by putting them back.

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod native;
pub mod storage;
pub mod tree;
pub mod types;
pub mod vfs;

pub use chain::{ChunkArena, WriteChunk};
pub use config::{CoverageMode, DeleteOpenPolicy, FsConfig, PathRule};
pub use error::{FsError, FsResult};
pub use native::{HostNativeFs, NativeFs};
pub use storage::{create_payload_store, InMemoryPayloads, PayloadStore, WriteCachePayloads};
pub use tree::{ContentState, MetadataNode, PathRegistry};
pub use types::{
    CanonicalPath, ChunkId, FsStats, HandleId, NodeId, OpenMode, PayloadId, Rights, RightsClass,
    RightsSet,
};
pub use vfs::{FsModel, FsSnapshot, NodeState};
