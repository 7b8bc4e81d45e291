//! Source directory collection
//!
//! Walks the source tree bottom-up, so every subdirectory is complete before
//! its parent is checked, and turns it into a path to size mapping. Every
//! problem is reported to the [`ErrorLedger`], which decides whether the
//! offending file or directory is skipped or the build stops.

use crate::config::{BuildConfig, NameEncoding};
use crate::core::ledger::{ErrorLedger, Flow};
use crate::error::{InvalidReason, Result, XrofsError};
use crate::report::human_size;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A validated file ready to be packed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Slash-separated path relative to the source root
    pub relative_path: String,
    /// Content length, never zero
    pub size: u64,
}

/// Result of a collection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    files: BTreeMap<String, u64>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn size_of(&self, relative_path: &str) -> Option<u64> {
        self.files.get(relative_path).copied()
    }

    /// Sum of all file sizes
    pub fn total_size(&self) -> u64 {
        self.files.values().sum()
    }

    /// Records in ascending path order
    pub fn records(&self) -> impl Iterator<Item = FileRecord> + '_ {
        self.files.iter().map(|(path, &size)| FileRecord {
            relative_path: path.clone(),
            size,
        })
    }

    fn insert(&mut self, record: FileRecord) {
        self.files.insert(record.relative_path, record.size);
    }
}

impl FromIterator<FileRecord> for Collection {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut collection = Collection::default();
        for record in iter {
            collection.insert(record);
        }
        collection
    }
}

/// Direct children of one directory, handed to the visitor once the whole
/// subtree below it has been walked
#[derive(Debug, Default)]
pub struct DirNode {
    pub path: PathBuf,
    /// Non-directory children (regular files, symlinks, special files)
    pub files: Vec<PathBuf>,
    /// Number of child directories, including symlinks to directories
    pub subdirs: usize,
}

/// Walk `root` children-first
///
/// A directory that cannot be listed is reported through `on_access_error`;
/// on [`Flow::Continue`] its subtree is skipped, on [`Flow::Abort`] the walk
/// stops with that error. `visit` is called for every directory that was
/// listed successfully, after all of its descendants.
pub fn walk_bottom_up<E, V>(root: &Path, mut on_access_error: E, mut visit: V) -> Result<()>
where
    E: FnMut(&XrofsError) -> Flow,
    V: FnMut(DirNode) -> Result<()>,
{
    let mut pending: HashMap<PathBuf, DirNode> = HashMap::new();
    let mut unreadable: HashSet<PathBuf> = HashSet::new();

    for entry in WalkDir::new(root).follow_links(false).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                let err = XrofsError::FileAccess {
                    path: path.clone(),
                    source: err.into(),
                };
                match on_access_error(&err) {
                    Flow::Continue => {
                        unreadable.insert(path);
                        continue;
                    }
                    Flow::Abort => return Err(err),
                }
            }
        };

        let path = entry.path().to_path_buf();
        let is_dir = entry.file_type().is_dir();

        if entry.depth() > 0 {
            let parent = path.parent().unwrap_or(root).to_path_buf();
            let node = pending.entry(parent.clone()).or_insert_with(|| DirNode {
                path: parent,
                ..Default::default()
            });
            // A symlink to a directory counts as a subdirectory but is not followed
            if is_dir || (entry.path_is_symlink() && path.is_dir()) {
                node.subdirs += 1;
            } else {
                node.files.push(path.clone());
            }
        }

        if is_dir {
            let node = pending.remove(&path).unwrap_or_else(|| DirNode {
                path: path.clone(),
                ..Default::default()
            });
            if unreadable.contains(&path) {
                continue;
            }
            visit(node)?;
        }
    }

    Ok(())
}

/// Collects and validates the files of a source directory
pub struct DirectoryCollector<'a> {
    config: &'a BuildConfig,
}

impl<'a> DirectoryCollector<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        DirectoryCollector { config }
    }

    pub fn collect(&self, ledger: &mut ErrorLedger) -> Result<Collection> {
        let root = self.config.source.as_path();
        info!("* Collecting files in \"{}\"", root.display());

        if !root.is_dir() {
            return Err(ledger.fatal(XrofsError::NotADirectory(root.to_path_buf())));
        }

        let mut collection = Collection::default();
        {
            // Both closures need the ledger; the walk calls them one at a time
            let ledger = std::cell::RefCell::new(&mut *ledger);
            walk_bottom_up(
                root,
                |err| ledger.borrow_mut().decide(err),
                |node| {
                    let mut ledger = ledger.borrow_mut();
                    self.visit_dir(root, node, &mut **ledger, &mut collection)
                },
            )?;
        }

        info!(
            "* Collected {} files totalling {}",
            collection.len(),
            human_size(collection.total_size(), false)
        );
        Ok(collection)
    }

    fn visit_dir(
        &self,
        root: &Path,
        node: DirNode,
        ledger: &mut ErrorLedger,
        collection: &mut Collection,
    ) -> Result<()> {
        if node.files.is_empty() && node.subdirs == 0 {
            return ledger.absorb(XrofsError::EmptyDirectory(node.path));
        }

        for file in node.files {
            match self.check_file(root, &file) {
                Ok(record) => {
                    if self.config.verbose {
                        info!(
                            "  > {:<64} {:>10}",
                            record.relative_path,
                            human_size(record.size, true)
                        );
                    } else {
                        debug!(path = %record.relative_path, size = record.size, "collected");
                    }
                    collection.insert(record);
                }
                Err(err) => ledger.absorb(err)?,
            }
        }

        Ok(())
    }

    /// Validate one non-directory child
    fn check_file(&self, root: &Path, file: &Path) -> Result<FileRecord> {
        let invalid = |reason| XrofsError::InvalidEntry {
            path: file.to_path_buf(),
            reason,
        };

        // Follows symlinks: a link to a regular file is packed as that file
        let size = match fs::metadata(file) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(invalid(InvalidReason::NotAFile)),
        };
        if size == 0 {
            return Err(invalid(InvalidReason::EmptyFile));
        }

        let relative_path = relative_posix(root, file, self.config.encoding)
            .ok_or_else(|| invalid(InvalidReason::UnencodableName))?;

        Ok(FileRecord {
            relative_path,
            size,
        })
    }
}

/// `file` relative to `root`, slash-separated, if representable in `encoding`
fn relative_posix(root: &Path, file: &Path, encoding: NameEncoding) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    let joined = parts.join("/");
    encoding.encode(&joined)?;
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn collect(root: &Path, force: bool) -> (Result<Collection>, u64) {
        let config = BuildConfig::builder(root, root.join("unused.img"))
            .force(force)
            .build();
        let mut ledger = ErrorLedger::new(force);
        let result = DirectoryCollector::new(&config).collect(&mut ledger);
        (result, ledger.count())
    }

    #[test]
    fn test_collects_nested_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sub/deeper")).unwrap();
        fs::write(temp.path().join("a.txt"), b"AAAAA").unwrap();
        fs::write(temp.path().join("sub/b.txt"), b"BBB").unwrap();
        fs::write(temp.path().join("sub/deeper/c.bin"), [0u8; 10]).unwrap();

        let (result, errors) = collect(temp.path(), false);
        let collection = result.unwrap();

        assert_eq!(errors, 0);
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.size_of("a.txt"), Some(5));
        assert_eq!(collection.size_of("sub/b.txt"), Some(3));
        assert_eq!(collection.size_of("sub/deeper/c.bin"), Some(10));
        assert_eq!(collection.total_size(), 18);
    }

    #[test]
    fn test_records_are_sorted() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("b")).unwrap();
        fs::write(temp.path().join("c"), b"c").unwrap();
        fs::write(temp.path().join("b/z"), b"z").unwrap();
        fs::write(temp.path().join("B"), b"B").unwrap();
        fs::write(temp.path().join("a"), b"a").unwrap();

        let (result, _) = collect(temp.path(), false);
        let paths: Vec<String> = result
            .unwrap()
            .records()
            .map(|r| r.relative_path)
            .collect();
        assert_eq!(paths, vec!["B", "a", "b/z", "c"]);
    }

    #[test]
    fn test_not_a_directory_is_fatal_even_with_force() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();

        let (result, errors) = collect(&file, true);
        assert!(matches!(result, Err(XrofsError::NotADirectory(_))));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_empty_file_strict() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("good.txt"), b"ok").unwrap();
        fs::write(temp.path().join("empty.txt"), b"").unwrap();

        let (result, errors) = collect(temp.path(), false);
        assert!(matches!(
            result,
            Err(XrofsError::InvalidEntry {
                reason: InvalidReason::EmptyFile,
                ..
            })
        ));
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_empty_file_force() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("good.txt"), b"ok").unwrap();
        fs::write(temp.path().join("empty.txt"), b"").unwrap();

        let (result, errors) = collect(temp.path(), true);
        let collection = result.unwrap();
        assert_eq!(errors, 1);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.size_of("good.txt"), Some(2));
    }

    #[test]
    fn test_empty_directory_keeps_parent_alive() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("outer/inner")).unwrap();
        fs::write(temp.path().join("top.txt"), b"top").unwrap();

        // inner is empty; outer only holds inner, so it is not empty itself
        let (result, errors) = collect(temp.path(), true);
        let collection = result.unwrap();
        assert_eq!(errors, 1);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_empty_root() {
        let temp = TempDir::new().unwrap();
        let (result, errors) = collect(temp.path(), false);
        assert!(matches!(result, Err(XrofsError::EmptyDirectory(_))));
        assert_eq!(errors, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory() {
        use std::os::unix::fs::PermissionsExt;

        // Permission bits do not stop root
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("ok.txt"), b"ok").unwrap();
        let locked = temp.path().join("holder/locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), b"hidden").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let (strict, strict_errors) = collect(temp.path(), false);
        let (forced, forced_errors) = collect(temp.path(), true);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        match strict {
            Err(XrofsError::FileAccess { path, .. }) => assert!(path.ends_with("holder/locked")),
            other => panic!("expected FileAccess, got {:?}", other),
        }
        assert_eq!(strict_errors, 1);

        // holder still counts locked as a subdirectory, so it is not empty
        let collection = forced.unwrap();
        assert_eq!(forced_errors, 1);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.size_of("ok.txt"), Some(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("real.txt"), b"real").unwrap();
        std::os::unix::fs::symlink(temp.path().join("missing"), temp.path().join("dangling"))
            .unwrap();

        let (result, _) = collect(temp.path(), false);
        assert!(matches!(
            result,
            Err(XrofsError::InvalidEntry {
                reason: InvalidReason::NotAFile,
                ..
            })
        ));

        let (result, errors) = collect(temp.path(), true);
        assert_eq!(errors, 1);
        assert_eq!(result.unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_to_file_is_packed() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("real.txt"), b"real").unwrap();
        std::os::unix::fs::symlink(temp.path().join("real.txt"), temp.path().join("link.txt"))
            .unwrap();

        let (result, errors) = collect(temp.path(), false);
        let collection = result.unwrap();
        assert_eq!(errors, 0);
        assert_eq!(collection.size_of("link.txt"), Some(4));
    }

    #[test]
    fn test_ascii_encoding_rejects_name() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("plain.txt"), b"plain").unwrap();
        fs::write(temp.path().join("caf\u{e9}.txt"), b"coffee").unwrap();

        let (result, errors) = collect(temp.path(), true);
        assert_eq!(errors, 1);
        assert_eq!(result.unwrap().len(), 1);

        let config = BuildConfig::builder(temp.path(), temp.path().join("x.img"))
            .encoding(NameEncoding::Utf8)
            .build();
        let mut ledger = ErrorLedger::new(false);
        let collection = DirectoryCollector::new(&config)
            .collect(&mut ledger)
            .unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_walk_reports_every_directory_once() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        fs::write(temp.path().join("a/b/f"), b"f").unwrap();

        let mut visited = Vec::new();
        walk_bottom_up(
            temp.path(),
            |_| Flow::Abort,
            |node| {
                visited.push((node.path, node.files.len(), node.subdirs));
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(
            visited,
            vec![
                (temp.path().join("a/b"), 1, 0),
                (temp.path().join("a"), 0, 1),
                (temp.path().to_path_buf(), 0, 1),
            ]
        );
    }
}
