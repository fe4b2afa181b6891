// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The filesystem model facade
//!
//! `FsModel` ties the pieces together: the path registry, the chunk arena,
//! the payload store, the optional native fallback, and a handle table with
//! per-handle position cursors. This is the surface the host's stream
//! wrappers call into, and the surface its snapshot machinery saves and
//! restores through.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::chain::ChunkArena;
use crate::config::{CoverageMode, DeleteOpenPolicy, FsConfig};
use crate::engine;
use crate::error::{FsError, FsResult};
use crate::native::NativeFs;
use crate::storage::{create_payload_store, PayloadStore};
use crate::tree::PathRegistry;
use crate::types::{CanonicalPath, ChunkId, FsStats, HandleId, OpenMode, Rights, RightsClass, RightsSet};

/// Open handle: one position cursor over one node's content state.
///
/// The cursor is owned per handle except for explicitly aliased handles
/// (`dup_shared`), which share the same cell; the host's race detector
/// depends on that sharing being exact.
#[derive(Debug)]
struct Handle {
    node: crate::types::NodeId,
    path: CanonicalPath,
    mode: OpenMode,
    coverage: CoverageMode,
    pos: Arc<Mutex<u64>>,
}

/// Saved per-node state: exactly the model's mutable root, small copies only.
#[derive(Clone, Debug)]
pub struct NodeState {
    pub exists: bool,
    pub is_directory: bool,
    pub chain_head: Option<ChunkId>,
    pub length: u64,
    pub last_modified: i64,
    pub open_count: u32,
    pub rights: RightsSet,
    pub native_backing: Option<CanonicalPath>,
    pub native_mirror: Option<CanonicalPath>,
}

/// Cheap whole-model snapshot: head pointers and flags, never content.
#[derive(Clone, Debug)]
pub struct FsSnapshot {
    nodes: Vec<NodeState>,
}

impl FsSnapshot {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The backtrackable filesystem model.
pub struct FsModel {
    config: FsConfig,
    payloads: Arc<dyn PayloadStore>,
    native: Option<Box<dyn NativeFs>>,
    registry: Mutex<PathRegistry>,
    arena: Mutex<ChunkArena>,
    handles: Mutex<HashMap<HandleId, Handle>>,
    next_handle_id: Mutex<u64>,
}

impl FsModel {
    /// Model with no native backing: every path starts from nothing.
    pub fn new(config: FsConfig) -> FsResult<Self> {
        let payloads: Arc<dyn PayloadStore> = Arc::from(create_payload_store(&config)?);
        Ok(Self {
            config,
            payloads,
            native: None,
            registry: Mutex::new(PathRegistry::new(false)),
            arena: Mutex::new(ChunkArena::new()),
            handles: Mutex::new(HashMap::new()),
            next_handle_id: Mutex::new(1),
        })
    }

    /// Model layered over a native source used for lazy discovery and as
    /// the base layer beneath modeled writes.
    pub fn with_native(config: FsConfig, native: Box<dyn NativeFs>) -> FsResult<Self> {
        let payloads: Arc<dyn PayloadStore> = Arc::from(create_payload_store(&config)?);
        Ok(Self {
            config,
            payloads,
            native: Some(native),
            registry: Mutex::new(PathRegistry::new(true)),
            arena: Mutex::new(ChunkArena::new()),
            handles: Mutex::new(HashMap::new()),
            next_handle_id: Mutex::new(1),
        })
    }

    fn native_ref(&self) -> Option<&dyn NativeFs> {
        self.native.as_deref()
    }

    fn allocate_handle_id(&self) -> HandleId {
        let mut next_id = self.next_handle_id.lock().unwrap();
        let id = HandleId::new(*next_id);
        *next_id += 1;
        id
    }

    fn current_timestamp() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis() as i64
    }

    // ---- metadata operations ----

    pub fn exists(&self, path: &str) -> bool {
        let path = CanonicalPath::new(path);
        self.registry.lock().unwrap().is_live(&path, self.native_ref())
    }

    /// Install a live node at `path`; fails on a live occupant or a missing
    /// parent.
    pub fn create(&self, path: &str, is_directory: bool) -> FsResult<()> {
        let path = CanonicalPath::new(path);
        self.registry.lock().unwrap().create(&path, is_directory, self.native_ref())?;
        Ok(())
    }

    pub fn create_file(&self, path: &str) -> FsResult<()> {
        self.create(path, false)
    }

    pub fn mkdir(&self, path: &str) -> FsResult<()> {
        self.create(path, true)
    }

    /// Recursive directory creation; fails when the leaf is already live.
    pub fn mkdirs(&self, path: &str) -> FsResult<()> {
        let path = CanonicalPath::new(path);
        self.registry.lock().unwrap().mkdirs(&path, self.native_ref())?;
        Ok(())
    }

    /// Tombstone `path` and everything below it.
    pub fn delete(&self, path: &str) -> FsResult<()> {
        let path = CanonicalPath::new(path);
        let mut registry = self.registry.lock().unwrap();

        let open_below = registry
            .subtree(&path)
            .into_iter()
            .any(|id| registry.node(id).exists && registry.node(id).content.open_count > 0);
        if open_below {
            match self.config.delete_open {
                DeleteOpenPolicy::Ignore => {}
                DeleteOpenPolicy::Warn => {
                    tracing::warn!(path = %path, "deleting a path that is still open");
                }
                DeleteOpenPolicy::Error => return Err(FsError::DeletedWhileOpen),
            }
        }

        registry.delete(&path, self.native_ref())
    }

    pub fn list(&self, path: &str) -> FsResult<Vec<String>> {
        let path = CanonicalPath::new(path);
        self.registry.lock().unwrap().list(&path, self.native_ref())
    }

    pub fn length(&self, path: &str) -> FsResult<u64> {
        let path = CanonicalPath::new(path);
        let mut registry = self.registry.lock().unwrap();
        let id = registry.lookup(&path, self.native_ref()).ok_or(FsError::NotFound)?;
        let node = registry.node(id);
        if !node.exists {
            return Err(FsError::NotFound);
        }
        if node.is_directory {
            return Err(FsError::IsADirectory);
        }
        Ok(node.content.length)
    }

    pub fn last_modified(&self, path: &str) -> FsResult<i64> {
        let path = CanonicalPath::new(path);
        let mut registry = self.registry.lock().unwrap();
        let id = registry.lookup(&path, self.native_ref()).ok_or(FsError::NotFound)?;
        let node = registry.node(id);
        if !node.exists {
            return Err(FsError::NotFound);
        }
        Ok(node.content.last_modified)
    }

    pub fn rights(&self, path: &str, class: RightsClass) -> FsResult<Rights> {
        let path = CanonicalPath::new(path);
        let mut registry = self.registry.lock().unwrap();
        let id = registry.lookup(&path, self.native_ref()).ok_or(FsError::NotFound)?;
        Ok(registry.node(id).content.rights.get(class))
    }

    pub fn set_rights(&self, path: &str, class: RightsClass, rights: Rights) -> FsResult<()> {
        let path = CanonicalPath::new(path);
        let mut registry = self.registry.lock().unwrap();
        let id = registry.lookup(&path, self.native_ref()).ok_or(FsError::NotFound)?;
        *registry.node_mut(id).content.rights.get_mut(class) = rights;
        Ok(())
    }

    // ---- handle operations ----

    /// Open a live file, incrementing its open count.
    pub fn open(&self, path: &str, mode: &str) -> FsResult<HandleId> {
        let mode = OpenMode::parse(mode)?;
        let path = CanonicalPath::new(path);

        let mut registry = self.registry.lock().unwrap();
        let id = registry.lookup(&path, self.native_ref()).ok_or(FsError::NotFound)?;
        let node = registry.node(id);
        if !node.exists {
            return Err(FsError::NotFound);
        }
        if node.is_directory {
            return Err(FsError::IsADirectory);
        }
        registry.node_mut(id).content.open_count += 1;
        drop(registry);

        let handle_id = self.allocate_handle_id();
        let coverage = self.config.coverage_for(path.as_str());
        self.handles.lock().unwrap().insert(
            handle_id,
            Handle {
                node: id,
                path,
                mode,
                coverage,
                pos: Arc::new(Mutex::new(0)),
            },
        );
        Ok(handle_id)
    }

    /// Second handle aliasing the same descriptor: the position cursor is
    /// shared, not copied.
    pub fn dup_shared(&self, handle_id: HandleId) -> FsResult<HandleId> {
        let mut handles = self.handles.lock().unwrap();
        let handle = handles.get(&handle_id).ok_or(FsError::NotOpen)?;
        let dup = Handle {
            node: handle.node,
            path: handle.path.clone(),
            mode: handle.mode,
            coverage: handle.coverage,
            pos: Arc::clone(&handle.pos),
        };
        let node = handle.node;
        let new_id = self.allocate_handle_id();
        handles.insert(new_id, dup);
        drop(handles);

        self.registry.lock().unwrap().node_mut(node).content.open_count += 1;
        Ok(new_id)
    }

    /// Close a handle, decrementing the node's open count.
    pub fn close(&self, handle_id: HandleId) -> FsResult<()> {
        let handle = self.handles.lock().unwrap().remove(&handle_id).ok_or(FsError::NotOpen)?;
        let mut registry = self.registry.lock().unwrap();
        let content = &mut registry.node_mut(handle.node).content;
        // The counter must never go negative, even after a host restore
        // rewound it past this handle's open.
        content.open_count = content.open_count.saturating_sub(1);
        Ok(())
    }

    fn handle_view(&self, handle_id: HandleId) -> FsResult<(crate::types::NodeId, CanonicalPath, OpenMode, CoverageMode, Arc<Mutex<u64>>)> {
        let handles = self.handles.lock().unwrap();
        let handle = handles.get(&handle_id).ok_or(FsError::NotOpen)?;
        Ok((
            handle.node,
            handle.path.clone(),
            handle.mode,
            handle.coverage,
            Arc::clone(&handle.pos),
        ))
    }

    pub fn seek(&self, handle_id: HandleId, pos: u64) -> FsResult<()> {
        let (_, _, _, _, cursor) = self.handle_view(handle_id)?;
        *cursor.lock().unwrap() = pos;
        Ok(())
    }

    pub fn position(&self, handle_id: HandleId) -> FsResult<u64> {
        let (_, _, _, _, cursor) = self.handle_view(handle_id)?;
        let pos = *cursor.lock().unwrap();
        Ok(pos)
    }

    /// No-op: modeled content lives in memory for the whole run.
    pub fn sync(&self, handle_id: HandleId) -> FsResult<()> {
        self.handle_view(handle_id).map(|_| ())
    }

    /// Read at the current position, advancing it by the count read.
    pub fn read(&self, handle_id: HandleId, buf: &mut [u8]) -> FsResult<usize> {
        let (node_id, path, _mode, coverage, cursor) = self.handle_view(handle_id)?;
        let mut pos = cursor.lock().unwrap();
        let n = self.read_node_at(node_id, &path, coverage, *pos, buf)?;
        *pos += n as u64;
        Ok(n)
    }

    /// Read into `buf[offset..offset+len]`; a slice outside the buffer is a
    /// bounds error before anything else happens.
    pub fn read_slice(
        &self,
        handle_id: HandleId,
        buf: &mut [u8],
        offset: usize,
        len: usize,
    ) -> FsResult<usize> {
        let end = offset.checked_add(len).ok_or(FsError::OutOfBounds)?;
        if end > buf.len() {
            return Err(FsError::OutOfBounds);
        }
        self.read(handle_id, &mut buf[offset..end])
    }

    /// Write at the current position, advancing it by the count written.
    pub fn write(&self, handle_id: HandleId, data: &[u8]) -> FsResult<usize> {
        let (node_id, path, mode, coverage, cursor) = self.handle_view(handle_id)?;
        let mut pos = cursor.lock().unwrap();
        let n = self.write_node_at(node_id, &path, mode, coverage, *pos, data)?;
        *pos += n as u64;
        Ok(n)
    }

    /// Write `data[offset..offset+len]`, bounds-checked like `read_slice`.
    pub fn write_slice(
        &self,
        handle_id: HandleId,
        data: &[u8],
        offset: usize,
        len: usize,
    ) -> FsResult<usize> {
        let end = offset.checked_add(len).ok_or(FsError::OutOfBounds)?;
        if end > data.len() {
            return Err(FsError::OutOfBounds);
        }
        self.write(handle_id, &data[offset..end])
    }

    fn read_node_at(
        &self,
        node_id: crate::types::NodeId,
        path: &CanonicalPath,
        coverage: CoverageMode,
        pos: u64,
        buf: &mut [u8],
    ) -> FsResult<usize> {
        let registry = self.registry.lock().unwrap();
        let content = &registry.node(node_id).content;
        if content.open_count == 0 {
            return Err(FsError::NotOpen);
        }
        if !content.rights.subject.allows(Rights::READ) {
            return Err(FsError::AccessDenied);
        }

        match coverage {
            CoverageMode::Excluded => {
                let native = self.native_ref().ok_or(FsError::Unsupported)?;
                native.read_range(path, pos, buf)
            }
            CoverageMode::Modeled | CoverageMode::WriteIgnored => {
                let arena = self.arena.lock().unwrap();
                let native = match (&content.native_backing, self.native_ref()) {
                    (Some(backing), Some(native_fs)) => Some((native_fs, backing)),
                    _ => None,
                };
                engine::read_at(
                    &arena,
                    self.payloads.as_ref(),
                    content.chain_head,
                    native,
                    content.length,
                    pos,
                    buf,
                )
            }
        }
    }

    fn write_node_at(
        &self,
        node_id: crate::types::NodeId,
        path: &CanonicalPath,
        mode: OpenMode,
        coverage: CoverageMode,
        pos: u64,
        data: &[u8],
    ) -> FsResult<usize> {
        let mut registry = self.registry.lock().unwrap();
        let content = &registry.node(node_id).content;
        if content.open_count == 0 {
            return Err(FsError::NotOpen);
        }
        if !mode.write {
            return Err(FsError::AccessDenied);
        }
        if !content.rights.subject.allows(Rights::WRITE) {
            return Err(FsError::AccessDenied);
        }

        match coverage {
            CoverageMode::WriteIgnored => {
                tracing::debug!(path = %path, len = data.len(), "write dropped by policy");
                Ok(data.len())
            }
            CoverageMode::Excluded => {
                let native = self.native_ref().ok_or(FsError::Unsupported)?;
                native.write_range(path, pos, data)
            }
            CoverageMode::Modeled => {
                let mut arena = self.arena.lock().unwrap();
                let out = engine::write_at(
                    &mut arena,
                    self.payloads.as_ref(),
                    content.chain_head,
                    content.length,
                    pos,
                    data,
                )?;
                drop(arena);
                let content = &mut registry.node_mut(node_id).content;
                content.chain_head = out.head;
                content.length = out.length;
                if out.written > 0 {
                    content.last_modified = Self::current_timestamp();
                }
                Ok(out.written)
            }
        }
    }

    // ---- snapshot hooks ----

    /// Capture the model's mutable root: per-node flags, chain heads and
    /// counters. No content is copied; chunk payloads are immutable.
    pub fn snapshot(&self) -> FsSnapshot {
        let registry = self.registry.lock().unwrap();
        let nodes = registry
            .iter()
            .map(|(_, node)| NodeState {
                exists: node.exists,
                is_directory: node.is_directory,
                chain_head: node.content.chain_head,
                length: node.content.length,
                last_modified: node.content.last_modified,
                open_count: node.content.open_count,
                rights: node.content.rights,
                native_backing: node.content.native_backing.clone(),
                native_mirror: node.native_mirror.clone(),
            })
            .collect();
        FsSnapshot { nodes }
    }

    /// Reinstate a snapshot. Nodes registered after it was taken are
    /// tombstoned, never removed: if the exploration revisits their paths
    /// the same nodes come back to life.
    pub fn restore(&self, snapshot: &FsSnapshot) {
        let mut registry = self.registry.lock().unwrap();
        let total = registry.len();
        for index in 0..total {
            let id = crate::types::NodeId::new(index as u64);
            let node = registry.node_mut(id);
            match snapshot.nodes.get(index) {
                Some(saved) => {
                    node.exists = saved.exists;
                    node.is_directory = saved.is_directory;
                    node.content.chain_head = saved.chain_head;
                    node.content.length = saved.length;
                    node.content.last_modified = saved.last_modified;
                    node.content.open_count = saved.open_count;
                    node.content.rights = saved.rights;
                    node.content.native_backing = saved.native_backing.clone();
                    node.native_mirror = saved.native_mirror.clone();
                }
                None => {
                    node.exists = false;
                    node.content.chain_head = None;
                    node.content.length = 0;
                    node.content.open_count = 0;
                }
            }
        }
    }

    pub fn stats(&self) -> FsStats {
        let registry = self.registry.lock().unwrap();
        let arena = self.arena.lock().unwrap();
        let handles = self.handles.lock().unwrap();
        FsStats {
            nodes: registry.len() as u64,
            live_nodes: registry.iter().filter(|(_, n)| n.exists).count() as u64,
            chunks: arena.len() as u64,
            chunk_bytes: arena.total_bytes(),
            open_handles: handles.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathRule;

    fn model() -> FsModel {
        FsModel::new(FsConfig::default()).unwrap()
    }

    #[test]
    fn open_counter_lifecycle() {
        let fs = model();
        fs.create_file("/f").unwrap();

        let h = fs.open("/f", "rw").unwrap();
        fs.write(h, &[1, 2, 3]).unwrap();
        fs.close(h).unwrap();

        // Count back at zero: the stale handle id fails as not-open
        let mut buf = [0u8; 3];
        assert!(matches!(fs.read(h, &mut buf), Err(FsError::NotOpen)));
        assert_eq!(fs.length("/f").unwrap(), 3);
    }

    #[test]
    fn read_write_through_cursor() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "rw").unwrap();

        assert_eq!(fs.write(h, b"hello").unwrap(), 5);
        assert_eq!(fs.position(h).unwrap(), 5);
        fs.seek(h, 0).unwrap();

        let mut buf = [0u8; 5];
        assert_eq!(fs.read(h, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(fs.position(h).unwrap(), 5);
        fs.close(h).unwrap();
    }

    #[test]
    fn bad_mode_is_rejected() {
        let fs = model();
        fs.create_file("/f").unwrap();
        assert!(matches!(fs.open("/f", "wx"), Err(FsError::BadMode(_))));
    }

    #[test]
    fn open_missing_or_directory_fails() {
        let fs = model();
        assert!(matches!(fs.open("/nope", "r"), Err(FsError::NotFound)));
        fs.mkdir("/d").unwrap();
        assert!(matches!(fs.open("/d", "r"), Err(FsError::IsADirectory)));
    }

    #[test]
    fn write_on_read_only_handle_fails() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "r").unwrap();
        assert!(matches!(fs.write(h, b"x"), Err(FsError::AccessDenied)));
        fs.close(h).unwrap();
    }

    #[test]
    fn subject_rights_checked_before_content_ops() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "rw").unwrap();
        fs.write(h, b"data").unwrap();

        let mut rights = fs.rights("/f", RightsClass::Subject).unwrap();
        rights.revoke(Rights::READ);
        fs.set_rights("/f", RightsClass::Subject, rights).unwrap();

        fs.seek(h, 0).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(fs.read(h, &mut buf), Err(FsError::AccessDenied)));

        rights.revoke(Rights::WRITE);
        fs.set_rights("/f", RightsClass::Subject, rights).unwrap();
        // Rejected before any chunk is appended
        let chunks_before = fs.stats().chunks;
        assert!(matches!(fs.write(h, b"x"), Err(FsError::AccessDenied)));
        assert_eq!(fs.stats().chunks, chunks_before);
        fs.close(h).unwrap();
    }

    #[test]
    fn slice_bounds_are_checked() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "rw").unwrap();

        let data = [1u8, 2, 3, 4];
        assert!(matches!(
            fs.write_slice(h, &data, 2, 3),
            Err(FsError::OutOfBounds)
        ));
        assert_eq!(fs.write_slice(h, &data, 1, 3).unwrap(), 3);

        let mut buf = [0u8; 4];
        assert!(matches!(
            fs.read_slice(h, &mut buf, 3, 2),
            Err(FsError::OutOfBounds)
        ));
        fs.close(h).unwrap();
    }

    #[test]
    fn shared_handles_share_position_exactly() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h1 = fs.open("/f", "rw").unwrap();
        let h2 = fs.dup_shared(h1).unwrap();

        fs.write(h1, b"abc").unwrap();
        assert_eq!(fs.position(h2).unwrap(), 3);
        fs.write(h2, b"de").unwrap();
        assert_eq!(fs.position(h1).unwrap(), 5);

        // Independent handles keep their own cursor
        let h3 = fs.open("/f", "r").unwrap();
        assert_eq!(fs.position(h3).unwrap(), 0);

        fs.close(h1).unwrap();
        // The alias still counts as open
        let mut buf = [0u8; 5];
        fs.seek(h2, 0).unwrap();
        assert_eq!(fs.read(h2, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"abcde");
        fs.close(h2).unwrap();
        fs.close(h3).unwrap();
    }

    #[test]
    fn delete_while_open_policies() {
        let strict = FsModel::new(FsConfig {
            delete_open: DeleteOpenPolicy::Error,
            ..Default::default()
        })
        .unwrap();
        strict.create_file("/f").unwrap();
        let h = strict.open("/f", "rw").unwrap();
        assert!(matches!(
            strict.delete("/f"),
            Err(FsError::DeletedWhileOpen)
        ));
        strict.close(h).unwrap();
        strict.delete("/f").unwrap();

        let lax = FsModel::new(FsConfig {
            delete_open: DeleteOpenPolicy::Ignore,
            ..Default::default()
        })
        .unwrap();
        lax.create_file("/f").unwrap();
        let h = lax.open("/f", "rw").unwrap();
        lax.delete("/f").unwrap();
        // Identity survives tombstoning: the open handle still reads
        lax.write(h, b"post-delete").unwrap();
        lax.close(h).unwrap();
    }

    #[test]
    fn write_ignored_paths_drop_writes() {
        let fs = FsModel::new(FsConfig {
            coverage: vec![PathRule {
                pattern: "/scratch/*".to_string(),
                mode: CoverageMode::WriteIgnored,
            }],
            ..Default::default()
        })
        .unwrap();
        fs.mkdirs("/scratch").unwrap();
        fs.create_file("/scratch/f").unwrap();

        let h = fs.open("/scratch/f", "rw").unwrap();
        assert_eq!(fs.write(h, b"dropped").unwrap(), 7);
        assert_eq!(fs.stats().chunks, 0);
        assert_eq!(fs.length("/scratch/f").unwrap(), 0);
        fs.close(h).unwrap();
    }

    #[test]
    fn delete_hides_whole_subtree() {
        let fs = model();
        fs.mkdir("/a").unwrap();
        fs.create_file("/a/b").unwrap();
        fs.delete("/a").unwrap();

        assert!(!fs.exists("/a/b"));
        assert!(matches!(fs.list("/a"), Err(FsError::NotFound)));
    }

    #[test]
    fn snapshot_restore_round_trip() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "rw").unwrap();
        fs.write(h, &[1, 2, 3, 4, 5]).unwrap();

        let snap = fs.snapshot();

        fs.seek(h, 3).unwrap();
        fs.write(h, &[42, 42]).unwrap();
        fs.create_file("/later").unwrap();
        fs.delete("/f").unwrap();

        fs.restore(&snap);

        assert!(fs.exists("/f"));
        assert!(!fs.exists("/later"));
        assert_eq!(fs.length("/f").unwrap(), 5);
        fs.seek(h, 0).unwrap();
        let mut buf = [0u8; 5];
        assert_eq!(fs.read(h, &mut buf).unwrap(), 5);
        assert_eq!(&buf, &[1, 2, 3, 4, 5]);
        fs.close(h).unwrap();
    }

    #[test]
    fn stats_reflect_model_state() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "rw").unwrap();
        fs.write(h, b"abcd").unwrap();

        let stats = fs.stats();
        assert_eq!(stats.nodes, 2); // root + /f
        assert_eq!(stats.live_nodes, 2);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.chunk_bytes, 4);
        assert_eq!(stats.open_handles, 1);
        fs.close(h).unwrap();
    }

    #[test]
    fn sync_is_a_validity_checked_no_op() {
        let fs = model();
        fs.create_file("/f").unwrap();
        let h = fs.open("/f", "rw").unwrap();
        fs.sync(h).unwrap();
        fs.close(h).unwrap();
        assert!(matches!(fs.sync(h), Err(FsError::NotOpen)));
    }
}
