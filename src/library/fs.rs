//! Filesystem access layer used by the snapshot builder and the liveness prune.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Sockets, devices, and symlinks that are not followed.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    pub kind: EntryKind,
}

/// Blocking filesystem operations. Callers on the async runtime must run
/// these on the blocking pool.
pub trait FileSystem: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<EntryKind>;

    /// Lists the direct children of `path`, sorted by name.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    fn is_readable(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem {
    follow_links: bool,
}

impl LocalFileSystem {
    #[must_use]
    pub const fn new(follow_links: bool) -> Self {
        Self { follow_links }
    }
}

fn kind_of(file_type: std::fs::FileType) -> EntryKind {
    if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

impl FileSystem for LocalFileSystem {
    fn stat(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = if self.follow_links {
            std::fs::metadata(path)?
        } else {
            std::fs::symlink_metadata(path)?
        };
        Ok(kind_of(metadata.file_type()))
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let walker = WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        let mut entries = Vec::new();
        for result in walker {
            match result {
                Ok(entry) => entries.push(DirEntry {
                    name: entry.file_name().to_os_string(),
                    kind: kind_of(entry.file_type()),
                }),
                Err(err) if err.depth() == 0 => {
                    return Err(err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("directory could not be listed")));
                }
                // A child that vanished or became unreadable after listing
                Err(_) => {}
            }
        }
        Ok(entries)
    }

    fn is_readable(&self, path: &Path) -> bool {
        std::fs::File::open(path).is_ok()
    }
}
