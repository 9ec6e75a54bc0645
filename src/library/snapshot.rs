//! In-memory snapshots of a source's directory tree.
//!
//! A node is identified by the slash-joined names of the directories between
//! the source root and the node, never by its absolute path. The root itself
//! has the empty identity, so renaming or moving the root does not change the
//! identity of anything below it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::fs::{DirEntry, EntryKind, FileSystem};
use super::whitelist::ExtensionWhitelist;
use crate::constants::limits::MAX_WALK_DEPTH;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Directory is not accessible: {}: {source}", .path.display())]
    InaccessibleDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotNode {
    pub name: String,
    pub dirs: BTreeMap<String, SnapshotNode>,
    pub files: BTreeSet<String>,
}

impl SnapshotNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A node without files anywhere below it contributes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.values().all(Self::is_empty)
    }

    fn file_count(&self) -> usize {
        self.files.len() + self.dirs.values().map(Self::file_count).sum::<usize>()
    }

    fn flatten_into(&self, identity: &str, map: &mut DirectoryMap) {
        map.insert(identity.to_string(), self.files.clone());
        for (name, child) in &self.dirs {
            child.flatten_into(&join_identity(identity, name), map);
        }
    }
}

/// Directory identity mapped to the file names directly inside it.
pub type DirectoryMap = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    root: SnapshotNode,
}

impl Snapshot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn root(&self) -> &SnapshotNode {
        &self.root
    }

    /// Walks `root_path` and records every whitelisted, non-hidden file.
    ///
    /// Only a failure on the root itself is an error. Subdirectories that
    /// cannot be listed, or vanish during the walk, are treated as absent.
    pub fn build(
        fs: &dyn FileSystem,
        root_path: &Path,
        whitelist: &ExtensionWhitelist,
    ) -> Result<Self, SnapshotError> {
        let entries = probe_root(fs, root_path)?;

        let name = root_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut root = SnapshotNode::new(name);
        fill_node(fs, root_path, entries, &mut root, whitelist, 0);

        Ok(Self { root })
    }

    /// Builds the snapshot the catalog believes in from absolute media paths.
    ///
    /// Paths outside `root_path` are ignored.
    pub fn from_catalog<'a, I>(root_path: &Path, paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut snapshot = Self::empty();
        for path in paths {
            let Ok(relative) = Path::new(path).strip_prefix(root_path) else {
                debug!(path, root = %root_path.display(), "Catalog path outside source root");
                continue;
            };

            let parts: Option<Vec<&str>> = relative
                .components()
                .map(|component| match component {
                    Component::Normal(part) => part.to_str(),
                    _ => None,
                })
                .collect();
            let Some(parts) = parts else {
                debug!(path, "Skipping catalog path with unusual components");
                continue;
            };
            if let Some((file, dirs)) = parts.split_last() {
                snapshot.insert(dirs, file);
            }
        }
        snapshot
    }

    /// Records `file` inside the directory reached by `dirs` from the root.
    pub fn insert(&mut self, dirs: &[&str], file: &str) {
        let mut node = &mut self.root;
        for dir in dirs {
            node = node
                .dirs
                .entry((*dir).to_string())
                .or_insert_with(|| SnapshotNode::new(*dir));
        }
        node.files.insert(file.to_string());
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.root.file_count()
    }

    #[must_use]
    pub fn directory_map(&self) -> DirectoryMap {
        let mut map = DirectoryMap::new();
        self.root.flatten_into("", &mut map);
        map
    }
}

fn fill_node(
    fs: &dyn FileSystem,
    dir: &Path,
    entries: Vec<DirEntry>,
    node: &mut SnapshotNode,
    whitelist: &ExtensionWhitelist,
    depth: usize,
) {
    for entry in entries {
        let Some(name) = entry.name.to_str() else {
            warn!(dir = %dir.display(), name = ?entry.name, "Skipping entry with non UTF-8 name");
            continue;
        };

        if name.starts_with('.') {
            continue;
        }

        match entry.kind {
            EntryKind::Directory => {
                if depth >= MAX_WALK_DEPTH {
                    warn!(dir = %dir.display(), depth, "Maximum walk depth reached, not descending");
                    continue;
                }

                let path = dir.join(name);
                let children = match fs.list_dir(&path) {
                    Ok(children) => children,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable directory");
                        continue;
                    }
                };

                let mut child = SnapshotNode::new(name);
                fill_node(fs, &path, children, &mut child, whitelist, depth + 1);
                if !child.is_empty() {
                    node.dirs.insert(name.to_string(), child);
                }
            }
            EntryKind::File => {
                if !whitelist.matches(name) {
                    continue;
                }
                // Same presence test as the liveness prune.
                let path = dir.join(name);
                if fs.is_readable(&path) {
                    node.files.insert(name.to_string());
                } else {
                    debug!(path = %path.display(), "Skipping unreadable file");
                }
            }
            EntryKind::Other => {}
        }
    }
}

/// Checks that `root_path` is a listable directory and returns its entries.
pub fn probe_root(fs: &dyn FileSystem, root_path: &Path) -> Result<Vec<DirEntry>, SnapshotError> {
    let inaccessible = |source| SnapshotError::InaccessibleDirectory {
        path: root_path.to_path_buf(),
        source,
    };

    match fs.stat(root_path).map_err(inaccessible)? {
        EntryKind::Directory => {}
        _ => return Err(SnapshotError::NotADirectory(root_path.to_path_buf())),
    }

    fs.list_dir(root_path).map_err(inaccessible)
}

#[must_use]
pub fn join_identity(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

/// Rebuilds the absolute path of `name` inside the directory `identity`.
#[must_use]
pub fn resolve(root: &Path, identity: &str, name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in identity.split('/').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path.push(name);
    path
}
