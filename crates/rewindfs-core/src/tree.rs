// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Canonical-path metadata tree
//!
//! Every path referenced during a run gets exactly one `MetadataNode`, found
//! either by lazy discovery against the native source or by an explicit
//! create. Nodes are never removed: delete flips the `exists` tombstone
//! recursively, which keeps node identity stable across a host rewind and
//! lets a later `mkdirs` revive the very same node. Parent/child links are
//! reconciled at insertion time in both directions because lazy discovery
//! can register a child before its parent.

use std::collections::HashMap;

use crate::error::{FsError, FsResult};
use crate::native::NativeFs;
use crate::types::{CanonicalPath, ChunkId, NodeId, RightsSet};

/// Per-file content state.
#[derive(Clone, Debug)]
pub struct ContentState {
    /// Authoritative logical length; may exceed the native backing length.
    pub length: u64,
    /// Number of descriptors currently referencing this state.
    pub open_count: u32,
    /// Head of the append-only write-chunk chain.
    pub chain_head: Option<ChunkId>,
    /// Original-content source for bytes never overwritten.
    pub native_backing: Option<CanonicalPath>,
    pub rights: RightsSet,
    /// Millisecond timestamp of the last content mutation.
    pub last_modified: i64,
}

impl ContentState {
    pub fn empty() -> Self {
        Self {
            length: 0,
            open_count: 0,
            chain_head: None,
            native_backing: None,
            rights: RightsSet::default(),
            last_modified: 0,
        }
    }

    pub fn native(path: CanonicalPath, length: u64) -> Self {
        Self {
            length,
            native_backing: Some(path),
            ..Self::empty()
        }
    }
}

/// One node per canonical path, for the whole run.
#[derive(Clone, Debug)]
pub struct MetadataNode {
    pub path: CanonicalPath,
    pub is_directory: bool,
    /// Tombstone flag: false means logically deleted, never purged.
    pub exists: bool,
    /// Meaningful only for files.
    pub content: ContentState,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Native path whose children/content seed this node lazily.
    pub native_mirror: Option<CanonicalPath>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Visibility {
    Visible,
    BornDead,
    Shadowed,
}

/// Path-keyed registry over all nodes created so far.
#[derive(Debug)]
pub struct PathRegistry {
    nodes: Vec<MetadataNode>,
    by_path: HashMap<CanonicalPath, NodeId>,
}

impl PathRegistry {
    /// Registry with a live root directory. The root mirrors the native
    /// root when a native source will be consulted.
    pub fn new(native_root: bool) -> Self {
        let root = MetadataNode {
            path: CanonicalPath::root(),
            is_directory: true,
            exists: true,
            content: ContentState::empty(),
            parent: None,
            children: Vec::new(),
            native_mirror: native_root.then(CanonicalPath::root),
        };
        let mut by_path = HashMap::new();
        by_path.insert(CanonicalPath::root(), NodeId::new(0));
        Self {
            nodes: vec![root],
            by_path,
        }
    }

    pub fn node(&self, id: NodeId) -> &MetadataNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut MetadataNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MetadataNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId::new(i as u64), n))
    }

    /// Already-registered node, no discovery.
    pub fn get(&self, path: &CanonicalPath) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Registered node, or one materialized by probing the native source.
    ///
    /// A node discovered under a tombstoned ancestor is itself born dead:
    /// deletion is sticky downward even for paths first seen afterwards.
    pub fn lookup(
        &mut self,
        path: &CanonicalPath,
        native: Option<&dyn NativeFs>,
    ) -> Option<NodeId> {
        if let Some(id) = self.get(path) {
            return Some(id);
        }
        let native_fs = native?;
        // Register the ancestor chain before the leaf: tombstoning and the
        // open-count scan walk parent/child links only, so discovery must
        // never leave a gap between a node and the registered tree above it.
        if let Some(parent_path) = path.parent() {
            let _ = self.lookup(&parent_path, native);
        }
        let visibility = self.native_visibility(path);
        if visibility == Visibility::Shadowed {
            // A recreated ancestor no longer mirrors the native tree; its
            // former native descendants are unreachable.
            return None;
        }
        if !native_fs.exists(path) {
            return None;
        }

        let is_directory = native_fs.is_directory(path);
        let content = if is_directory {
            ContentState::empty()
        } else {
            let length = native_fs.length(path).ok()?;
            ContentState::native(path.clone(), length)
        };
        let exists = visibility == Visibility::Visible;
        if !exists {
            tracing::debug!(path = %path, "native path discovered under deleted ancestor");
        }

        let id = self.insert(MetadataNode {
            path: path.clone(),
            is_directory,
            exists,
            content,
            parent: None,
            children: Vec::new(),
            native_mirror: Some(path.clone()),
        });
        Some(id)
    }

    /// Is there a live node at `path` (registered or discoverable)?
    pub fn is_live(&mut self, path: &CanonicalPath, native: Option<&dyn NativeFs>) -> bool {
        self.lookup(path, native).map(|id| self.node(id).exists).unwrap_or(false)
    }

    /// Install or reactivate a live leaf at `path`.
    pub fn create(
        &mut self,
        path: &CanonicalPath,
        is_directory: bool,
        native: Option<&dyn NativeFs>,
    ) -> FsResult<NodeId> {
        if path.is_root() {
            return Err(FsError::AlreadyExists);
        }
        if let Some(id) = self.lookup(path, native) {
            if self.node(id).exists {
                return Err(FsError::AlreadyExists);
            }
        }

        let parent_path = path.parent().ok_or(FsError::InvalidArgument)?;
        let parent_id = self.lookup(&parent_path, native).ok_or(FsError::NotFound)?;
        let parent = self.node(parent_id);
        if !parent.exists {
            return Err(FsError::NotFound);
        }
        if !parent.is_directory {
            return Err(FsError::NotADirectory);
        }

        match self.get(path) {
            Some(id) => {
                // Reactivate the tombstoned node under the same identity.
                // A recreated file starts empty: no chain, no native backing,
                // and no native mirror to resurrect former children from.
                let node = self.node_mut(id);
                node.exists = true;
                node.is_directory = is_directory;
                node.content = ContentState::empty();
                node.native_mirror = None;
                Ok(id)
            }
            None => Ok(self.insert(MetadataNode {
                path: path.clone(),
                is_directory,
                exists: true,
                content: ContentState::empty(),
                parent: None,
                children: Vec::new(),
                native_mirror: None,
            })),
        }
    }

    /// Tombstone `path` and all its registered descendants.
    pub fn delete(&mut self, path: &CanonicalPath, native: Option<&dyn NativeFs>) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::InvalidArgument);
        }
        let id = self.lookup(path, native).ok_or(FsError::NotFound)?;
        if !self.node(id).exists {
            return Err(FsError::NotFound);
        }
        self.tombstone_recursive(id);
        Ok(())
    }

    fn tombstone_recursive(&mut self, id: NodeId) {
        self.node_mut(id).exists = false;
        let children = self.node(id).children.clone();
        for child in children {
            if self.node(child).exists {
                self.tombstone_recursive(child);
            }
        }
    }

    /// Recursive directory creation.
    ///
    /// Fails when the leaf is already a live directory; ancestor steps are
    /// created or reactivated as needed and succeed idempotently.
    pub fn mkdirs(&mut self, path: &CanonicalPath, native: Option<&dyn NativeFs>) -> FsResult<NodeId> {
        if let Some(id) = self.lookup(path, native) {
            let node = self.node(id);
            if node.exists {
                return Err(if node.is_directory {
                    FsError::AlreadyExists
                } else {
                    FsError::NotADirectory
                });
            }
        }
        self.ensure_dir(path, native)
    }

    fn ensure_dir(
        &mut self,
        path: &CanonicalPath,
        native: Option<&dyn NativeFs>,
    ) -> FsResult<NodeId> {
        if let Some(id) = self.lookup(path, native) {
            if self.node(id).exists {
                if !self.node(id).is_directory {
                    return Err(FsError::NotADirectory);
                }
                return Ok(id);
            }
        }
        if let Some(parent_path) = path.parent() {
            self.ensure_dir(&parent_path, native)?;
        }
        match self.get(path) {
            Some(id) => {
                let node = self.node_mut(id);
                node.exists = true;
                node.is_directory = true;
                node.content = ContentState::empty();
                node.native_mirror = None;
                Ok(id)
            }
            None => Ok(self.insert(MetadataNode {
                path: path.clone(),
                is_directory: true,
                exists: true,
                content: ContentState::empty(),
                parent: None,
                children: Vec::new(),
                native_mirror: None,
            })),
        }
    }

    /// Child names of a live directory: native names first, then
    /// registry-only additions, deduplicated. Native names whose registered
    /// node is tombstoned are dropped.
    pub fn list(
        &mut self,
        path: &CanonicalPath,
        native: Option<&dyn NativeFs>,
    ) -> FsResult<Vec<String>> {
        let id = self.lookup(path, native).ok_or(FsError::NotFound)?;
        let node = self.node(id);
        if !node.exists {
            return Err(FsError::NotFound);
        }
        if !node.is_directory {
            return Err(FsError::NotADirectory);
        }

        let mut names: Vec<String> = Vec::new();
        if let (Some(mirror), Some(native_fs)) = (node.native_mirror.clone(), native) {
            for name in native_fs.list_names(&mirror)? {
                let child_path = path.join(&name);
                let dead = self.get(&child_path).map(|cid| !self.node(cid).exists).unwrap_or(false);
                if !dead {
                    names.push(name);
                }
            }
        }

        let node = self.node(id);
        let mut registry_names: Vec<String> = Vec::new();
        for &child in &node.children {
            let child_node = self.node(child);
            if child_node.exists {
                let name = child_node.path.leaf().to_string();
                if !names.contains(&name) && !registry_names.contains(&name) {
                    registry_names.push(name);
                }
            }
        }
        names.extend(registry_names);
        Ok(names)
    }

    /// All registered node ids at or below `path`.
    pub fn subtree(&self, path: &CanonicalPath) -> Vec<NodeId> {
        match self.get(path) {
            Some(root) => {
                let mut out = Vec::new();
                let mut stack = vec![root];
                while let Some(id) = stack.pop() {
                    out.push(id);
                    stack.extend(self.node(id).children.iter().copied());
                }
                out
            }
            None => Vec::new(),
        }
    }

    /// How a not-yet-registered native path relates to the registered tree,
    /// judged by its nearest registered ancestor. Descendants of a dead
    /// ancestor are born dead; descendants of a reactivated (mirror-less)
    /// ancestor are not reachable at all.
    fn native_visibility(&self, path: &CanonicalPath) -> Visibility {
        let mut current = path.parent();
        while let Some(ancestor) = current {
            if let Some(id) = self.get(&ancestor) {
                let node = self.node(id);
                if !node.exists {
                    return Visibility::BornDead;
                }
                if node.native_mirror.is_none() {
                    return Visibility::Shadowed;
                }
                return Visibility::Visible;
            }
            current = ancestor.parent();
        }
        Visibility::Visible
    }

    /// Insert a node and reconcile parent/child links in both directions.
    /// Lookups register ancestors before leaves, but a native source probed
    /// mid-change can still hand us a child whose parent is unknown.
    fn insert(&mut self, node: MetadataNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        let path = node.path.clone();
        self.nodes.push(node);
        self.by_path.insert(path.clone(), id);

        if let Some(parent_path) = path.parent() {
            if let Some(parent_id) = self.get(&parent_path) {
                self.node_mut(id).parent = Some(parent_id);
                if !self.nodes[parent_id.index()].children.contains(&id) {
                    self.node_mut(parent_id).children.push(id);
                }
            }
        }

        // Orphans registered before this node may be its children.
        let orphans: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, n)| {
                NodeId::new(*i as u64) != id
                    && n.parent.is_none()
                    && n.path.parent().as_ref() == Some(&path)
            })
            .map(|(i, _)| NodeId::new(i as u64))
            .collect();
        for orphan in orphans {
            self.node_mut(orphan).parent = Some(id);
            if !self.nodes[id.index()].children.contains(&orphan) {
                self.node_mut(id).children.push(orphan);
            }
        }

        id
    }
}
