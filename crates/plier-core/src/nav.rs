//! Navigation model — the current directory and what to list for it.
//!
//! Path changes (`enter_directory`, `go_up`) never touch the filesystem.
//! Reading happens only in `list_directories` / `refresh_listing`, and the
//! recursive walk is a lazy iterator that is rebuilt on every call.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::filter::FileTypeFilter;

/// Upper bound on directories one walk may visit, the root included.
pub const MAX_WALK_DIRS: usize = 50;

/// Name shown at the top of the directory pane to go one level up.
pub const PARENT_ENTRY: &str = "..";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    /// Immediate children of the current directory only.
    Flat,
    /// Depth-first walk below the current directory.
    RecursiveMediaWalk,
}

impl BrowseMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Flat => "ls",
            Self::RecursiveMediaWalk => "walk",
        }
    }
}

#[derive(Debug, Error)]
pub enum NavError {
    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One row of the file pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Text shown to the user.
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NavState {
    current: PathBuf,
    mode: BrowseMode,
}

pub struct Navigator {
    state: NavState,
    filter: FileTypeFilter,
    only_media: bool,
}

impl Navigator {
    pub fn new(start: PathBuf, config: &Config) -> Self {
        Self {
            state: NavState {
                current: start,
                mode: config.browse_mode(),
            },
            filter: config.file_type_filter(),
            only_media: config.browse.only_media,
        }
    }

    pub fn current_path(&self) -> &Path {
        &self.state.current
    }

    pub fn mode(&self) -> BrowseMode {
        self.state.mode
    }

    /// Point at another directory without touching the filesystem.  Used to
    /// roll back after a failed refresh.
    pub fn set_current(&mut self, path: PathBuf) {
        self.state.current = path;
    }

    /// Descend into `name` below the current directory.  `..` goes up.
    pub fn enter_directory(&mut self, name: &str) {
        if name == PARENT_ENTRY {
            self.go_up();
            return;
        }
        self.state.current = self.state.current.join(name);
    }

    /// Move to the parent directory.  Stays put at the filesystem root.
    pub fn go_up(&mut self) {
        if let Some(parent) = self.state.current.parent() {
            self.state.current = parent.to_path_buf();
        }
    }

    /// Entries for the directory pane: `..` then visible sub-directories.
    pub fn list_directories(&self) -> Result<Vec<String>, NavError> {
        let mut dirs: Vec<String> = read_sorted(&self.state.current)?
            .into_iter()
            .filter(|e| e.is_dir && !is_hidden(&e.name))
            .map(|e| e.name)
            .collect();
        dirs.insert(0, PARENT_ENTRY.to_string());
        Ok(dirs)
    }

    /// Entries for the file pane in the current mode.
    pub fn refresh_listing(&self) -> Result<Vec<ListingEntry>, NavError> {
        match self.state.mode {
            BrowseMode::Flat => Ok(read_sorted(&self.state.current)?
                .into_iter()
                .filter(|e| !e.is_dir && !is_hidden(&e.name))
                .map(|e| ListingEntry {
                    label: e.name,
                    path: e.path,
                })
                .collect()),
            BrowseMode::RecursiveMediaWalk => {
                let root = &self.state.current;
                let walk = MediaWalk::new(root, self.walk_filter())?;
                Ok(walk
                    .map(|path| ListingEntry {
                        label: path
                            .strip_prefix(root)
                            .unwrap_or(&path)
                            .to_string_lossy()
                            .into_owned(),
                        path,
                    })
                    .collect())
            }
        }
    }

    fn walk_filter(&self) -> Option<FileTypeFilter> {
        self.only_media.then(|| self.filter.clone())
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

struct DirItem {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Read a directory, sorted by name.  Entries that vanish mid-read are
/// skipped.  Symlinks are not followed.
fn read_sorted(dir: &Path) -> Result<Vec<DirItem>, NavError> {
    let rd = std::fs::read_dir(dir).map_err(|source| NavError::Unreadable {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut items: Vec<DirItem> = rd
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let file_type = entry.file_type().ok()?;
            Some(DirItem {
                name: entry.file_name().to_string_lossy().into_owned(),
                path: entry.path(),
                is_dir: file_type.is_dir(),
            })
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

// ── MediaWalk ─────────────────────────────────────────────────────────────────

/// Depth-first, name-ordered walk yielding file paths.
///
/// At most [`MAX_WALK_DIRS`] directories are visited (the root counts as the
/// first); further directories are pruned without error.  Hidden directories
/// are never entered and hidden files never yielded.  With a filter, only
/// files whose name ends with one of its suffixes are yielded.
pub struct MediaWalk {
    stack: Vec<std::vec::IntoIter<DirItem>>,
    filter: Option<FileTypeFilter>,
    dirs_visited: usize,
    dirs_pruned: usize,
}

impl MediaWalk {
    /// Start a walk at `root`.  Only the root being unreadable is an error;
    /// unreadable sub-directories are skipped.
    pub fn new(root: &Path, filter: Option<FileTypeFilter>) -> Result<Self, NavError> {
        let items = read_sorted(root)?;
        Ok(Self {
            stack: vec![items.into_iter()],
            filter,
            dirs_visited: 1,
            dirs_pruned: 0,
        })
    }

    pub fn dirs_visited(&self) -> usize {
        self.dirs_visited
    }

    pub fn dirs_pruned(&self) -> usize {
        self.dirs_pruned
    }
}

impl Iterator for MediaWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let item = match self.stack.last_mut()?.next() {
                Some(item) => item,
                None => {
                    self.stack.pop();
                    continue;
                }
            };
            if is_hidden(&item.name) {
                continue;
            }
            if item.is_dir {
                if self.dirs_visited >= MAX_WALK_DIRS {
                    self.dirs_pruned += 1;
                    if self.dirs_pruned == 1 {
                        debug!("walk: directory cap reached at {:?}", item.path);
                    }
                    continue;
                }
                self.dirs_visited += 1;
                match read_sorted(&item.path) {
                    Ok(children) => self.stack.push(children.into_iter()),
                    Err(e) => warn!("walk: {}", e),
                }
                continue;
            }
            let keep = self
                .filter
                .as_ref()
                .map_or(true, |f| f.matches(&item.name));
            if keep {
                return Some(item.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(walk: bool, only_media: bool) -> Config {
        let mut config = Config::default();
        config.browse.walk = walk;
        config.browse.only_media = only_media;
        config.browse.media_suffixes = ".mkv,.mp4".to_string();
        config
    }

    #[test]
    fn test_enter_and_go_up_are_pure() {
        let mut nav = Navigator::new(PathBuf::from("/no/such/root"), &config(false, true));
        nav.enter_directory("films");
        assert_eq!(nav.current_path(), Path::new("/no/such/root/films"));
        nav.enter_directory(PARENT_ENTRY);
        assert_eq!(nav.current_path(), Path::new("/no/such/root"));
        nav.go_up();
        nav.go_up();
        nav.go_up();
        assert_eq!(nav.current_path(), Path::new("/"));
        nav.go_up();
        assert_eq!(nav.current_path(), Path::new("/"));
    }

    #[test]
    fn test_flat_listing_skips_hidden_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("a.txt"), b"").unwrap();
        std::fs::write(dir.path().join(".hidden.mkv"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();

        let nav = Navigator::new(dir.path().to_path_buf(), &config(false, true));
        let labels: Vec<String> = nav
            .refresh_listing()
            .unwrap()
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["a.txt", "b.mkv"]);

        let dirs = nav.list_directories().unwrap();
        assert_eq!(dirs, vec!["..", "sub"]);
    }

    #[test]
    fn test_unreadable_directory_is_an_error() {
        let nav = Navigator::new(PathBuf::from("/no/such/root"), &config(false, true));
        assert!(matches!(
            nav.refresh_listing(),
            Err(NavError::Unreadable { .. })
        ));
        assert!(nav.list_directories().is_err());
    }

    #[test]
    fn test_walk_filters_media_and_labels_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("films/new")).unwrap();
        std::fs::write(dir.path().join("films/new/movie.mkv"), b"").unwrap();
        std::fs::write(dir.path().join("films/cover.jpg"), b"").unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"").unwrap();

        let nav = Navigator::new(dir.path().to_path_buf(), &config(true, true));
        let entries = nav.refresh_listing().unwrap();
        let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "clip.mp4",
                Path::new("films").join("new").join("movie.mkv").to_str().unwrap()
            ]
        );
        assert_eq!(entries[0].path, dir.path().join("clip.mp4"));

        let all = Navigator::new(dir.path().to_path_buf(), &config(true, false));
        assert_eq!(all.refresh_listing().unwrap().len(), 3);
    }
}
