use anyhow::Result;
use rayon::prelude::*;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

use crate::patterns::ArtifactKind;
use crate::scanner::{Artifact, ArtifactScanner, ScanConfig};
use crate::{SweepFailure, SweepReport};

/// 清理进度信息
#[derive(Debug, Clone)]
pub struct SweepProgress {
    pub phase: SweepPhase,
    pub current: Option<PathBuf>,
    pub processed: usize,
    pub total: Option<usize>,
}

/// 清理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    Scanning,
    Removing,
    Complete,
}

/// 清理器配置
#[derive(Debug, Clone, Default)]
pub struct SweepConfig {
    pub scan: ScanConfig,
    pub dry_run: bool,
    pub parallel: bool,
}

/// Removes bytecode artifacts found by [`ArtifactScanner`]
pub struct ArtifactSweeper {
    config: SweepConfig,
}

impl ArtifactSweeper {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    /// Scan `root` and remove every artifact found
    pub fn sweep<P: AsRef<Path>>(&self, root: P) -> Result<SweepReport> {
        self.sweep_with_progress(root, |_| {})
    }

    /// Scan and remove, reporting progress through `progress_callback`
    ///
    /// Only scan preconditions (missing or non-directory root) return `Err`.
    /// Paths that could not be removed land in [`SweepReport::failures`],
    /// paths the walk could not read in [`SweepReport::scan_errors`].
    pub fn sweep_with_progress<P, F>(&self, root: P, progress_callback: F) -> Result<SweepReport>
    where
        P: AsRef<Path>,
        F: Fn(SweepProgress) + Sync,
    {
        let start_time = Instant::now();
        let root = root.as_ref();

        progress_callback(SweepProgress {
            phase: SweepPhase::Scanning,
            current: Some(root.to_path_buf()),
            processed: 0,
            total: None,
        });

        let scanner = ArtifactScanner::new(self.config.scan.clone());
        let outcome = scanner.scan(root)?;

        let mut report = SweepReport {
            dry_run: self.config.dry_run,
            ..SweepReport::new()
        };
        for error in outcome.errors {
            report.add_scan_error(error);
        }

        let total = outcome.artifacts.len();
        progress_callback(SweepProgress {
            phase: SweepPhase::Removing,
            current: None,
            processed: 0,
            total: Some(total),
        });

        if self.config.dry_run {
            for artifact in &outcome.artifacts {
                info!("DRY RUN: 将删除 {:?}", artifact.path);
                report.add_removed(artifact.kind, artifact.size);
            }
        } else {
            self.remove_artifacts(&outcome.artifacts, &mut report, &progress_callback);
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;

        progress_callback(SweepProgress {
            phase: SweepPhase::Complete,
            current: None,
            processed: total,
            total: Some(total),
        });

        info!(
            "清理完成: 删除 {} 个文件、{} 个目录，失败 {} 个，无法读取 {} 个，释放空间 {}，耗时 {}ms",
            report.files_removed,
            report.dirs_removed,
            report.failures.len(),
            report.scan_errors.len(),
            report.format_size(),
            report.duration_ms
        );

        Ok(report)
    }

    /// Remove each artifact, recording successes and failures in `report`
    ///
    /// A failure never stops the remaining removals.
    fn remove_artifacts<F>(
        &self,
        artifacts: &[Artifact],
        report: &mut SweepReport,
        progress_callback: &F,
    ) where
        F: Fn(SweepProgress) + Sync,
    {
        let total = artifacts.len();
        let results: Vec<(&Artifact, std::io::Result<()>)> = if self.config.parallel {
            artifacts
                .par_iter()
                .map(|artifact| (artifact, remove_artifact(artifact)))
                .collect()
        } else {
            artifacts
                .iter()
                .enumerate()
                .map(|(i, artifact)| {
                    progress_callback(SweepProgress {
                        phase: SweepPhase::Removing,
                        current: Some(artifact.path.clone()),
                        processed: i,
                        total: Some(total),
                    });
                    (artifact, remove_artifact(artifact))
                })
                .collect()
        };

        for (artifact, result) in results {
            match result {
                Ok(()) => report.add_removed(artifact.kind, artifact.size),
                Err(e) => {
                    error!("删除失败 {:?}: {}", artifact.path, e);
                    report.add_failure(SweepFailure::new(&artifact.path, e));
                }
            }
        }
    }

    /// 预览清理操作（dry run）
    pub fn preview<P: AsRef<Path>>(&self, root: P) -> Result<SweepReport> {
        let mut config = self.config.clone();
        config.dry_run = true;

        ArtifactSweeper::new(config).sweep(root)
    }
}

impl Default for ArtifactSweeper {
    fn default() -> Self {
        Self::new(SweepConfig::default())
    }
}

/// Remove one artifact; a path that is already gone counts as removed
fn remove_artifact(artifact: &Artifact) -> std::io::Result<()> {
    let result = match artifact.kind {
        ArtifactKind::BytecodeFile => std::fs::remove_file(&artifact.path),
        ArtifactKind::CacheDir => std::fs::remove_dir_all(&artifact.path),
    };

    match result {
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("已不存在: {:?}", artifact.path);
            Ok(())
        }
        other => other,
    }
}
