use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::ConfigError;

/// Default bytecode file patterns
pub const DEFAULT_FILE_PATTERNS: &[&str] = &["*.pyc", "*.pyo"];
/// Default bytecode cache directory patterns
pub const DEFAULT_DIR_PATTERNS: &[&str] = &["__pycache__"];

/// Category of a generated artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Compiled bytecode file, removed with `remove_file`
    BytecodeFile,
    /// Bytecode cache directory, removed with its contents
    CacheDir,
}

/// Compiled name patterns deciding what counts as an artifact
#[derive(Debug, Clone)]
pub struct ArtifactPatterns {
    files: Vec<Pattern>,
    dirs: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl ArtifactPatterns {
    pub fn new<S: AsRef<str>>(files: &[S], dirs: &[S], exclude: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            files: compile(files)?,
            dirs: compile(dirs)?,
            exclude: compile(exclude)?,
        })
    }

    /// Classify an entry by its file name
    ///
    /// File patterns never match directories and directory patterns never
    /// match files, so a directory called `foo.pyc` is left alone.
    pub fn classify(&self, name: &str, is_dir: bool) -> Option<ArtifactKind> {
        if is_dir {
            self.dirs
                .iter()
                .any(|p| p.matches(name))
                .then_some(ArtifactKind::CacheDir)
        } else {
            self.files
                .iter()
                .any(|p| p.matches(name))
                .then_some(ArtifactKind::BytecodeFile)
        }
    }

    /// Whether a path (relative to the sweep root) is excluded
    ///
    /// A pattern matches either the whole relative path or its last component.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        if self.exclude.is_empty() {
            return false;
        }

        let path = relative.to_string_lossy();
        let name = relative.file_name().map(|n| n.to_string_lossy());
        self.exclude
            .iter()
            .any(|p| p.matches(&path) || name.as_deref().is_some_and(|name| p.matches(name)))
    }
}

impl Default for ArtifactPatterns {
    fn default() -> Self {
        Self {
            files: DEFAULT_FILE_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
            dirs: DEFAULT_DIR_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
            exclude: Vec::new(),
        }
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            let p = p.as_ref();
            Pattern::new(p).map_err(|source| ConfigError::InvalidPattern {
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}
