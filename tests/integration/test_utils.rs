//! Shared test utilities for integration tests
//!
//! Tree fixtures, snapshots for congruence checks, and isolated XDG/env
//! setup for configuration tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// What a snapshot records for one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File {
        content: Vec<u8>,
        mode: u32,
        modified: SystemTime,
    },
    Dir,
    Symlink,
}

/// Every path below `root`, keyed by relative path
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Node> {
    let mut out = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.unwrap();
        let relative = entry.path().strip_prefix(root).unwrap().to_path_buf();
        let file_type = entry.file_type();
        let node = if file_type.is_symlink() {
            Node::Symlink
        } else if file_type.is_dir() {
            Node::Dir
        } else {
            let metadata = entry.metadata().unwrap();
            Node::File {
                content: fs::read(entry.path()).unwrap(),
                mode: mode_of(&metadata),
                modified: metadata.modified().unwrap(),
            }
        };
        out.insert(relative, node);
    }
    out
}

#[cfg(unix)]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(metadata: &fs::Metadata) -> u32 {
    metadata.permissions().readonly() as u32
}

/// Assert both trees hold the same paths with the same kinds and file contents
///
/// Metadata is not compared: files left unchanged by a cycle keep their own
/// mtime. Use [`assert_same_metadata`] for files the cycle copied.
pub fn assert_congruent(source: &Path, target: &Path) {
    let source_snapshot = snapshot(source);
    let target_snapshot = snapshot(target);
    assert_eq!(
        source_snapshot.keys().collect::<Vec<_>>(),
        target_snapshot.keys().collect::<Vec<_>>(),
        "path sets differ"
    );
    for (path, node) in &source_snapshot {
        let other = &target_snapshot[path];
        match (node, other) {
            (Node::File { content: a, .. }, Node::File { content: b, .. }) => {
                assert_eq!(a, b, "content mismatch at {}", path.display())
            }
            (Node::Dir, Node::Dir) | (Node::Symlink, Node::Symlink) => {}
            _ => panic!("kind mismatch at {}", path.display()),
        }
    }
}

/// Assert permission bits and modification time match between two files
pub fn assert_same_metadata(a: &Path, b: &Path) {
    let meta_a = fs::metadata(a).unwrap();
    let meta_b = fs::metadata(b).unwrap();
    assert_eq!(mode_of(&meta_a), mode_of(&meta_b), "mode differs for {}", b.display());
    assert_eq!(
        meta_a.modified().unwrap(),
        meta_b.modified().unwrap(),
        "mtime differs for {}",
        b.display()
    );
}

/// Temp dir with `source/` created and `target/` path reserved
pub struct Fixture {
    _temp: TempDir,
    pub root: PathBuf,
    pub source: PathBuf,
    pub target: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        let source = root.join("source");
        let target = root.join("target");
        fs::create_dir(&source).unwrap();
        Self {
            _temp: temp,
            root,
            source,
            target,
        }
    }

    pub fn write_source(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.source, relative, content)
    }

    pub fn write_target(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.target, relative, content)
    }
}

pub fn write_file(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir`, restoring afterwards
pub fn with_xdg_env<F, R>(test_dir: &Path, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let home = std::env::var("HOME").ok();
    let xdg_config_home = std::env::var("XDG_CONFIG_HOME").ok();

    let test_home = test_dir.join("home");
    let test_config_home = test_dir.join("config");
    fs::create_dir_all(&test_home).unwrap();
    fs::create_dir_all(&test_config_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);

    let result = f();

    match home {
        Some(orig) => std::env::set_var("HOME", orig),
        None => std::env::remove_var("HOME"),
    }
    match xdg_config_home {
        Some(orig) => std::env::set_var("XDG_CONFIG_HOME", orig),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    result
}
