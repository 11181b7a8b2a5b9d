use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Capability to read a template's raw text given a resolved path.
///
/// The expansion engine performs no filesystem access of its own; every
/// read goes through this trait, so callers can substitute in-memory
/// sources for embedding or tests.
pub trait FileReader {
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reader over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Reader over an in-memory path -> text map.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. Paths are normalized so that lookups through
    /// relative includes (`./a.html`, `../shared/b.html`) resolve.
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(normalize_path(&path.into()), text.into());
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files.get(&normalize_path(path)).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory file '{}'", path.display()),
            )
        })
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// the preceding component where one exists.
///
/// Include targets are resolved against the including file's directory
/// with this, never with `canonicalize`, so identity is stable for
/// cycle detection and works for readers with no filesystem behind
/// them.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !matches!(out.components().next_back(), Some(Component::RootDir)) {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_and_dotdot() {
        assert_eq!(
            normalize_path(Path::new("pages/./a.html")),
            PathBuf::from("pages/a.html")
        );
        assert_eq!(
            normalize_path(Path::new("pages/sub/../a.html")),
            PathBuf::from("pages/a.html")
        );
        assert_eq!(
            normalize_path(Path::new("./a.html")),
            PathBuf::from("a.html")
        );
    }

    #[test]
    fn keeps_leading_parent_components() {
        assert_eq!(
            normalize_path(Path::new("../shared/x.html")),
            PathBuf::from("../shared/x.html")
        );
        assert_eq!(
            normalize_path(Path::new("a/../../x.html")),
            PathBuf::from("../x.html")
        );
    }

    #[test]
    fn root_absorbs_parent() {
        assert_eq!(normalize_path(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_path(Path::new("/a/../x")), PathBuf::from("/x"));
    }

    #[test]
    fn memory_reader_resolves_unnormalized_paths() {
        let mut reader = MemoryReader::new();
        reader.insert("pages/a.html", "hello");
        let text = reader.read(Path::new("pages/./a.html"));
        assert_eq!(text.ok().as_deref(), Some("hello"));
        assert!(reader.read(Path::new("pages/missing.html")).is_err());
    }
}
