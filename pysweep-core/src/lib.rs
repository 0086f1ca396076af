use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod config;
pub mod patterns;
pub mod scanner;
pub mod sweeper;
pub mod tool;

pub use config::{ConfigError, SweepSettings};
pub use patterns::{ArtifactKind, ArtifactPatterns};
pub use scanner::{Artifact, ArtifactScanner, ScanOutcome};
pub use sweeper::{ArtifactSweeper, SweepPhase, SweepProgress};
pub use tool::{CleanScope, PackagingTool, ToolCommand, ToolError, ToolStatus};

/// A path that could not be read during the walk, or could not be removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl SweepFailure {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// 清理结果统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub files_removed: usize,
    pub dirs_removed: usize,
    pub bytes_freed: u64,
    /// Matched paths that could not be removed
    pub failures: Vec<SweepFailure>,
    /// Paths the walk could not read; these never fail the sweep
    pub scan_errors: Vec<SweepFailure>,
    pub duration_ms: u64,
    pub dry_run: bool,
}

impl SweepReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_removed(&mut self, kind: ArtifactKind, size: u64) {
        match kind {
            ArtifactKind::BytecodeFile => self.files_removed += 1,
            ArtifactKind::CacheDir => self.dirs_removed += 1,
        }
        self.bytes_freed += size;
    }

    pub fn add_failure(&mut self, failure: SweepFailure) {
        self.failures.push(failure);
    }

    pub fn add_scan_error(&mut self, error: SweepFailure) {
        self.scan_errors.push(error);
    }

    /// Total number of entries removed (files plus cache directories)
    pub fn removed(&self) -> usize {
        self.files_removed + self.dirs_removed
    }

    /// True when every matched path was removed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.bytes_freed)
    }
}

/// 格式化字节大小为人类可读格式
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
