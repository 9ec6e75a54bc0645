//! Presence-only comparison of two snapshots.
//!
//! Renames are not detected: a renamed directory shows up as every file of
//! the old identity removed plus every file of the new identity added.
//! Content changes under an unchanged name produce nothing.

use serde::Serialize;
use std::collections::BTreeSet;

use super::snapshot::{DirectoryMap, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChangeKind {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChangeRecord {
    /// Identity of the directory holding the file.
    pub path: String,
    pub name: String,
    pub kind: ChangeKind,
}

/// Computes the files added and removed going from `old` to `new`.
///
/// Removals come first, then additions; each pass is ordered by directory
/// identity and file name.
#[must_use]
pub fn diff(old: &Snapshot, new: &Snapshot) -> Vec<ChangeRecord> {
    let old_map = old.directory_map();
    let new_map = new.directory_map();

    let mut changes = Vec::new();
    one_sided(&old_map, &new_map, ChangeKind::Removed, &mut changes);
    one_sided(&new_map, &old_map, ChangeKind::Added, &mut changes);
    changes
}

/// Reports every file of `from` that `against` lacks.
fn one_sided(
    from: &DirectoryMap,
    against: &DirectoryMap,
    kind: ChangeKind,
    out: &mut Vec<ChangeRecord>,
) {
    let empty = BTreeSet::new();
    for (identity, files) in from {
        let other = against.get(identity).unwrap_or(&empty);
        out.extend(files.difference(other).map(|name| ChangeRecord {
            path: identity.clone(),
            name: name.clone(),
            kind,
        }));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
}

impl ChangeSummary {
    #[must_use]
    pub fn of(changes: &[ChangeRecord]) -> Self {
        changes.iter().fold(Self::default(), |mut acc, c| {
            match c.kind {
                ChangeKind::Added => acc.added += 1,
                ChangeKind::Removed => acc.removed += 1,
            }
            acc
        })
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(files: &[&str]) -> Snapshot {
        let mut snapshot = Snapshot::empty();
        for file in files {
            let parts: Vec<&str> = file.split('/').collect();
            let (name, dirs) = parts.split_last().unwrap();
            snapshot.insert(dirs, name);
        }
        snapshot
    }

    fn pairs(changes: &[ChangeRecord], kind: ChangeKind) -> BTreeSet<(String, String)> {
        changes
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| (c.path.clone(), c.name.clone()))
            .collect()
    }

    #[test]
    fn diff_against_itself_is_empty() {
        let a = snapshot(&["x.mp3", "a/y.mp3", "a/b/z.mp3"]);
        assert!(diff(&a, &a).is_empty());
        assert!(diff(&Snapshot::empty(), &Snapshot::empty()).is_empty());
    }

    #[test]
    fn first_scan_reports_everything_added() {
        let new = snapshot(&["one.mp3", "a/two.mp3", "a/b/three.mp3"]);
        let changes = diff(&Snapshot::empty(), &new);

        assert_eq!(ChangeSummary::of(&changes), ChangeSummary { added: 3, removed: 0 });
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Added));
    }

    #[test]
    fn removed_file_in_surviving_directory() {
        let old = snapshot(&["a/one.mp3", "a/two.mp3"]);
        let new = snapshot(&["a/one.mp3"]);

        assert_eq!(
            diff(&old, &new),
            vec![ChangeRecord {
                path: "a".to_string(),
                name: "two.mp3".to_string(),
                kind: ChangeKind::Removed,
            }]
        );
    }

    #[test]
    fn renamed_directory_is_full_remove_plus_add() {
        let old = snapshot(&["old/one.mp3", "old/two.mp3"]);
        let new = snapshot(&["new/one.mp3", "new/two.mp3"]);
        let changes = diff(&old, &new);

        assert_eq!(ChangeSummary::of(&changes), ChangeSummary { added: 2, removed: 2 });
        assert!(
            pairs(&changes, ChangeKind::Removed)
                .iter()
                .all(|(path, _)| path == "old")
        );
        assert!(
            pairs(&changes, ChangeKind::Added)
                .iter()
                .all(|(path, _)| path == "new")
        );
        // Removals are listed before additions
        assert_eq!(changes[0].kind, ChangeKind::Removed);
    }

    #[test]
    fn reconstructs_symmetric_difference() {
        let a = snapshot(&["keep.mp3", "a/gone.mp3", "a/stay.mp3", "c/d/old.mp3"]);
        let b = snapshot(&["keep.mp3", "a/stay.mp3", "a/new.mp3", "e/fresh.mp3"]);

        let flat = |s: &Snapshot| -> BTreeSet<(String, String)> {
            s.directory_map()
                .into_iter()
                .flat_map(|(dir, files)| files.into_iter().map(move |f| (dir.clone(), f)))
                .collect()
        };
        let expected: BTreeSet<_> = flat(&a).symmetric_difference(&flat(&b)).cloned().collect();

        let changes = diff(&a, &b);
        let mut reported = pairs(&changes, ChangeKind::Added);
        reported.extend(pairs(&changes, ChangeKind::Removed));

        assert_eq!(reported, expected);
        assert_eq!(changes.len(), expected.len());
    }

    #[test]
    fn same_name_in_different_directories_is_distinct() {
        let old = snapshot(&["a/song.mp3"]);
        let new = snapshot(&["b/song.mp3"]);
        let summary = ChangeSummary::of(&diff(&old, &new));
        assert_eq!(summary, ChangeSummary { added: 1, removed: 1 });
        assert!(!summary.is_empty());
    }
}
