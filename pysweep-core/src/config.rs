use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::patterns::{ArtifactPatterns, DEFAULT_DIR_PATTERNS, DEFAULT_FILE_PATTERNS};
use crate::scanner::ScanConfig;
use crate::sweeper::SweepConfig;
use crate::tool::ToolCommand;

/// File looked up in the project root when no explicit config is given
pub const CONFIG_FILE_NAME: &str = "pysweep.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid pattern `{pattern}`")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Settings loaded from `pysweep.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSettings {
    pub tool: ToolSettings,
    pub cleanpy: CleanpySettings,
}

/// `[tool]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct ToolSettings {
    pub program: String,
    pub args: Vec<String>,
    pub all_flag: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        let command = ToolCommand::default();
        Self {
            program: command.program,
            args: command.args,
            all_flag: command.all_flag,
        }
    }
}

/// `[cleanpy]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct CleanpySettings {
    pub file_patterns: Vec<String>,
    pub dir_patterns: Vec<String>,
    pub exclude: Vec<String>,
    pub follow_links: bool,
    pub max_depth: Option<usize>,
    pub parallel: bool,
}

impl Default for CleanpySettings {
    fn default() -> Self {
        Self {
            file_patterns: DEFAULT_FILE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            dir_patterns: DEFAULT_DIR_PATTERNS.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            follow_links: false,
            max_depth: None,
            parallel: false,
        }
    }
}

impl SweepSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings from an explicit file, which must exist
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content, path)?;
        info!("已加载配置文件: {:?}", path);
        Ok(settings)
    }

    /// Load `pysweep.toml` from the project root, falling back to defaults
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load_file(&path)
        } else {
            debug!("未找到 {:?}，使用默认配置", path);
            Ok(Self::default())
        }
    }

    /// Resolve settings for a run: an explicit path wins over discovery
    pub fn resolve(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_file(path),
            None => Self::discover(root),
        }
    }

    pub fn tool_command(&self) -> ToolCommand {
        ToolCommand {
            program: self.tool.program.clone(),
            args: self.tool.args.clone(),
            all_flag: self.tool.all_flag.clone(),
        }
    }

    pub fn scan_config(&self) -> Result<ScanConfig, ConfigError> {
        let patterns = ArtifactPatterns::new(
            &self.cleanpy.file_patterns,
            &self.cleanpy.dir_patterns,
            &self.cleanpy.exclude,
        )?;

        Ok(ScanConfig {
            follow_links: self.cleanpy.follow_links,
            max_depth: self.cleanpy.max_depth,
            patterns,
        })
    }

    pub fn sweep_config(&self) -> Result<SweepConfig, ConfigError> {
        Ok(SweepConfig {
            scan: self.scan_config()?,
            dry_run: false,
            parallel: self.cleanpy.parallel,
        })
    }
}
