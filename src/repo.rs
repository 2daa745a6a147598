//! Sandboxed, read-only view of a source repository.
//!
//! Every path that reaches this module comes from model tool arguments, so it
//! is untrusted. Nothing here returns an error for an expected failure mode:
//! escapes, missing files and permission problems all come back as empty
//! results the caller can hand straight back to the model.

use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Default cap on the number of paths returned by [`RepoSandbox::list_paths`].
pub const DEFAULT_MAX_RESULTS: usize = 200;
/// Default depth limit, counted from the repository root.
pub const DEFAULT_MAX_DEPTH: usize = 6;
/// Default cap on bytes returned by [`RepoSandbox::read_file`].
pub const DEFAULT_MAX_BYTES: usize = 65_536;
/// Extra bytes read past the cap so a char straddling it can still decode.
const READ_HEADROOM: u64 = 4;

/// Directory names that are never descended into.
const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    ".venv",
    "venv",
    "node_modules",
    "dist",
    "build",
    "target",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
];

/// Why a repository root failed its pre-flight check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUnreadable {
    pub reason: String,
}

impl RepoUnreadable {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RepoUnreadable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for RepoUnreadable {}

/// Output of a `read_file` tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileContents {
    pub content: String,
    pub truncated: bool,
}

/// Output of a `list_paths` tool call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathListing {
    pub paths: Vec<String>,
}

/// Size limits applied to tool results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxLimits {
    pub max_results: usize,
    pub max_depth: usize,
    pub max_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_depth: DEFAULT_MAX_DEPTH,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Confirm `root` exists, is a directory, and can be listed at least once.
pub fn validate_repo_root(root: &Path) -> Result<(), RepoUnreadable> {
    let meta = match fs::metadata(root) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(RepoUnreadable::new(
                "Path does not exist or is not a directory",
            ));
        }
        Err(err) => return Err(RepoUnreadable::new(err.to_string())),
    };
    if !meta.is_dir() {
        return Err(RepoUnreadable::new(
            "Path does not exist or is not a directory",
        ));
    }

    // Listing once surfaces permission errors before any model call is made.
    let mut entries = fs::read_dir(root).map_err(|e| RepoUnreadable::new(e.to_string()))?;
    if let Some(Err(err)) = entries.next() {
        return Err(RepoUnreadable::new(err.to_string()));
    }
    Ok(())
}

/// Resolve `relative` under `root`, refusing anything that lands outside it.
///
/// Absolute inputs and any `..` segment are rejected outright. The joined
/// path is then canonicalized, which follows symlinks, and must still sit
/// under the canonical root. Paths that do not exist cannot be canonicalized
/// and also resolve to `None`. Empty input and `"."` resolve to the root.
pub fn safe_join(root: &Path, relative: &str) -> Option<PathBuf> {
    let candidate = Path::new(relative);
    if candidate.is_absolute() || relative.starts_with('/') || relative.starts_with('\\') {
        return None;
    }
    let escapes = candidate.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return None;
    }

    let root = root.canonicalize().ok()?;
    let resolved = root.join(candidate).canonicalize().ok()?;
    resolved.starts_with(&root).then_some(resolved)
}

/// A repository root that passed pre-flight, plus the limits for tool output.
#[derive(Debug, Clone)]
pub struct RepoSandbox {
    root: PathBuf,
    limits: SandboxLimits,
}

impl RepoSandbox {
    /// Validate `root` and pin its canonical form for the rest of the run.
    pub fn open(root: &Path) -> Result<Self, RepoUnreadable> {
        validate_repo_root(root)?;
        let root = root
            .canonicalize()
            .map_err(|e| RepoUnreadable::new(e.to_string()))?;
        Ok(Self {
            root,
            limits: SandboxLimits::default(),
        })
    }

    pub fn with_limits(mut self, limits: SandboxLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn limits(&self) -> SandboxLimits {
        self.limits
    }

    pub fn safe_join(&self, relative: &str) -> Option<PathBuf> {
        safe_join(&self.root, relative)
    }

    /// List regular files under `directory` (root when empty or `"."`).
    ///
    /// Hidden entries and [`IGNORED_DIRS`] are skipped. Files whose parent
    /// directory sits deeper than `max_depth` below the root are left out,
    /// and the walk stops once `max_results` paths have been collected.
    pub fn list_paths(&self, directory: &str) -> PathListing {
        let directory = directory.trim();
        let base = if directory.is_empty() || directory == "." {
            Some(self.root.clone())
        } else {
            self.safe_join(directory)
        };
        let Some(base) = base.filter(|p| p.is_dir()) else {
            return PathListing::default();
        };

        let base_depth = base
            .strip_prefix(&self.root)
            .map(|p| p.components().count())
            .unwrap_or(0);
        if base_depth > self.limits.max_depth {
            return PathListing::default();
        }
        // A file at walk depth d has its parent at root depth base_depth + d - 1.
        let walk_depth = self.limits.max_depth - base_depth + 1;

        let mut paths = Vec::new();
        if self.limits.max_results == 0 {
            return PathListing { paths };
        }

        let walker = WalkDir::new(&base)
            .max_depth(walk_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = relative_display(&self.root, entry.path()) {
                paths.push(rel);
                if paths.len() >= self.limits.max_results {
                    break;
                }
            }
        }

        PathListing { paths }
    }

    /// Read a repository file, capped at `max_bytes` of UTF-8.
    ///
    /// At most `max_bytes` plus a few bytes of headroom are read from disk.
    /// Invalid UTF-8 sequences are dropped rather than replaced. When the
    /// decoded text is longer than the cap it is cut back to the last char
    /// boundary that fits. `truncated` is set whenever content was left out.
    pub fn read_file(&self, path: &str) -> FileContents {
        let Some(target) = self.safe_join(path.trim()) else {
            return FileContents::default();
        };
        if !target.is_file() {
            return FileContents::default();
        }
        let max = self.limits.max_bytes;
        let Ok((bytes, more_on_disk)) = read_capped(&target, max as u64 + READ_HEADROOM) else {
            return FileContents::default();
        };

        let mut content = decode_dropping_invalid(&bytes);
        if content.len() <= max {
            return FileContents {
                content,
                truncated: more_on_disk,
            };
        }

        let mut cut = max;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        content.truncate(cut);
        FileContents {
            content,
            truncated: true,
        }
    }
}

/// Read at most `limit` bytes of `path`, reporting whether the file is longer.
fn read_capped(path: &Path, limit: u64) -> io::Result<(Vec<u8>, bool)> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut bytes = Vec::with_capacity(limit.min(file_len) as usize);
    file.take(limit).read_to_end(&mut bytes)?;
    let more_on_disk = file_len > bytes.len() as u64;
    Ok((bytes, more_on_disk))
}

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && IGNORED_DIRS.contains(&name.as_ref())
}

/// Root-relative path with `/` separators regardless of platform.
fn relative_display(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
