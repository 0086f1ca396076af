//! Delegation to the external packaging tool's clean routine.
//!
//! The tool's stdio is inherited so its diagnostics reach the user verbatim,
//! and its exit status is handed back untouched.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Exit code used when a tool process ended without one (killed by a signal
/// on platforms where the signal number is unavailable)
pub const FALLBACK_EXIT_CODE: i32 = 1;

/// 清理范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CleanScope {
    /// The tool's default clean
    #[default]
    Default,
    /// The tool's broadest clean (`clean --all`)
    All,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("packaging tool command is empty")]
    EmptyCommand,
    #[error("failed to start packaging tool `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Command line of the packaging tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Extra argument appended for [`CleanScope::All`]
    pub all_flag: String,
}

impl Default for ToolCommand {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["setup.py".to_string(), "clean".to_string()],
            all_flag: "--all".to_string(),
        }
    }
}

impl ToolCommand {
    /// Arguments passed to the program for a given scope
    pub fn args_for(&self, scope: CleanScope) -> Vec<&str> {
        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        if scope == CleanScope::All && !self.all_flag.is_empty() {
            args.push(&self.all_flag);
        }
        args
    }

    /// Human readable command line, for logs
    pub fn display(&self, scope: CleanScope) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args_for(scope))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of a finished tool process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    status: ExitStatus,
}

impl ToolStatus {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// The tool's exit code; a signal-terminated process maps to 128 + signal
    pub fn exit_code(&self) -> i32 {
        if let Some(code) = self.status.code() {
            return code;
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = self.status.signal() {
                return 128 + signal;
            }
        }

        FALLBACK_EXIT_CODE
    }
}

/// Runs the packaging tool's clean operation
pub struct PackagingTool {
    command: ToolCommand,
}

impl PackagingTool {
    pub fn new(command: ToolCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }

    /// Run the clean routine in `cwd` and wait for it
    pub fn run(&self, scope: CleanScope, cwd: &Path) -> Result<ToolStatus, ToolError> {
        if self.command.program.trim().is_empty() {
            return Err(ToolError::EmptyCommand);
        }

        info!(
            "运行打包工具: {} (目录 {:?})",
            self.command.display(scope),
            cwd
        );

        let status = Command::new(&self.command.program)
            .args(self.command.args_for(scope))
            .current_dir(cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ToolError::Spawn {
                program: self.command.program.clone(),
                source,
            })?;

        let status = ToolStatus { status };
        if status.success() {
            debug!("打包工具成功退出");
        } else {
            warn!("打包工具退出码: {}", status.exit_code());
        }

        Ok(status)
    }

    /// 检查打包工具是否可用
    pub fn is_available(&self) -> bool {
        Command::new(&self.command.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

impl Default for PackagingTool {
    fn default() -> Self {
        Self::new(ToolCommand::default())
    }
}
