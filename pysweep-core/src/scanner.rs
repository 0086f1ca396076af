use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::SweepFailure;
use crate::patterns::{ArtifactKind, ArtifactPatterns};

/// 扫描器配置
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub follow_links: bool,
    pub max_depth: Option<usize>,
    pub patterns: ArtifactPatterns,
}

/// A generated artifact found under the root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    /// File length, or the summed length of the files inside a cache directory
    pub size: u64,
}

/// Everything a scan found, plus the paths it could not read
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub artifacts: Vec<Artifact>,
    pub errors: Vec<SweepFailure>,
}

impl ScanOutcome {
    pub fn total_size(&self) -> u64 {
        self.artifacts.iter().map(|a| a.size).sum()
    }
}

/// Finds bytecode files and cache directories
pub struct ArtifactScanner {
    config: ScanConfig,
}

impl ArtifactScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Walk `root` and collect every artifact
    ///
    /// Matched cache directories are not descended into. Entries that cannot
    /// be read are recorded in [`ScanOutcome::errors`] and the walk goes on.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ScanOutcome> {
        let root = root.as_ref();
        info!("开始扫描路径: {:?}", root);

        if !root.exists() {
            anyhow::bail!("路径不存在: {:?}", root);
        }

        if !root.is_dir() {
            anyhow::bail!("路径不是目录: {:?}", root);
        }

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_links);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut outcome = ScanOutcome::default();
        let mut entries = walker.into_iter();

        while let Some(entry) = entries.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    warn!("扫描错误 {:?}: {}", path, e);
                    outcome.errors.push(SweepFailure::new(path, e));
                    continue;
                }
            };

            // The root itself is never a deletion target
            if entry.depth() == 0 {
                continue;
            }

            let is_dir = entry.file_type().is_dir();
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());

            if self.config.patterns.is_excluded(relative) {
                debug!("排除路径: {:?}", relative);
                if is_dir {
                    entries.skip_current_dir();
                }
                continue;
            }

            // Non UTF-8 bytes become U+FFFD, suffix globs still match
            let name = entry.file_name().to_string_lossy();

            match self.config.patterns.classify(&name, is_dir) {
                Some(ArtifactKind::CacheDir) => {
                    debug!("发现缓存目录: {:?}", entry.path());
                    outcome.artifacts.push(Artifact {
                        path: entry.path().to_path_buf(),
                        kind: ArtifactKind::CacheDir,
                        size: directory_size(entry.path()),
                    });
                    entries.skip_current_dir();
                }
                Some(ArtifactKind::BytecodeFile) => {
                    debug!("发现字节码文件: {:?}", entry.path());
                    let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    outcome.artifacts.push(Artifact {
                        path: entry.path().to_path_buf(),
                        kind: ArtifactKind::BytecodeFile,
                        size,
                    });
                }
                None => {}
            }
        }

        info!(
            "找到 {} 个产物，{} 个扫描错误",
            outcome.artifacts.len(),
            outcome.errors.len()
        );

        Ok(outcome)
    }
}

impl Default for ArtifactScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Calculate directory size
fn directory_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
