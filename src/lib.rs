//! # pysweep
//!
//! Maintenance tasks for Python source trees.
//!
//! ## Features
//!
//! - Run the packaging tool's clean routine (`python setup.py clean`)
//! - Run it with its broadest scope (`clean --all`)
//! - Remove compiled bytecode files and `__pycache__` directories
//!
//! ## Usage
//!
//! ### Command Line
//!
//! ```bash
//! # Packaging tool clean
//! pysweep clean
//! pysweep clean-all
//!
//! # Remove *.pyc / *.pyo files and __pycache__ directories
//! pysweep cleanpy
//!
//! # Dry run to see what would be removed
//! pysweep cleanpy --dry-run
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use pysweep_core::{ArtifactSweeper, sweeper::SweepConfig};
//!
//! // Preview only, nothing is deleted
//! let config = SweepConfig {
//!     dry_run: true,
//!     ..Default::default()
//! };
//! let report = ArtifactSweeper::new(config).sweep(".")?;
//! println!("would remove {} entries", report.removed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export core functionality
pub use pysweep_core::*;

// Re-export commonly used types
pub use pysweep_core::{
    ArtifactScanner, ArtifactSweeper, CleanScope, PackagingTool, SweepReport, SweepSettings,
    scanner::ScanConfig, sweeper::SweepConfig,
};
