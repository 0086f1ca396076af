use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pysweep_core::{
    ArtifactSweeper, CleanScope, ConfigError, PackagingTool, SweepReport, SweepSettings, ToolError,
};

/// Exit code for a `cleanpy` run with at least one unremovable match, or an
/// unexpected error
///
/// Also used for packaging tool statuses outside 0..=255 (Windows NTSTATUS
/// codes such as `0xC0000005`), which a process cannot pass on unchanged.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for configuration errors, matching clap's usage errors
pub const EXIT_USAGE: i32 = 2;
/// Exit code when the packaging tool cannot be started
pub const EXIT_TOOL_NOT_FOUND: i32 = 127;

#[derive(Parser)]
#[command(name = "pysweep")]
#[command(about = "Maintenance tasks for Python source trees")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Project root to operate in
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Config file (defaults to `pysweep.toml` in the project root, if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the packaging tool's clean (`python setup.py clean`)
    Clean,
    /// Run the packaging tool's clean for every configuration (`clean --all`)
    CleanAll,
    /// Remove compiled bytecode files and `__pycache__` directories
    Cleanpy {
        /// Show what would be removed without removing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Remove matches in parallel
        #[arg(long)]
        parallel: bool,
    },
}

pub fn run_cli() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let code = match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            if e.downcast_ref::<ConfigError>().is_some() {
                EXIT_USAGE
            } else {
                EXIT_FAILURE
            }
        }
    };

    ExitCode::from(clamp_exit_code(code))
}

fn init_logging(cli: &Cli) {
    // 设置日志级别
    let filter = if cli.debug {
        EnvFilter::new("pysweep=debug")
    } else if cli.verbose {
        EnvFilter::new("pysweep=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pysweep=warn"))
    };

    // stdout belongs to the packaging tool and the report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the selected task and return the process exit code
pub fn execute(cli: &Cli) -> Result<i32> {
    let settings = SweepSettings::resolve(&cli.root, cli.config.as_deref())?;
    debug!("项目根目录: {:?}, 配置: {:?}", cli.root, settings);

    match &cli.command {
        Commands::Clean => handle_tool_command(&settings, CleanScope::Default, &cli.root),
        Commands::CleanAll => handle_tool_command(&settings, CleanScope::All, &cli.root),
        Commands::Cleanpy {
            dry_run,
            json,
            parallel,
        } => handle_cleanpy_command(
            &settings,
            &cli.root,
            CleanpyArgs {
                dry_run: *dry_run,
                json: *json,
                parallel: *parallel,
            },
        ),
    }
}

fn handle_tool_command(settings: &SweepSettings, scope: CleanScope, root: &Path) -> Result<i32> {
    let tool = PackagingTool::new(settings.tool_command());

    match tool.run(scope, root) {
        Ok(status) => Ok(status.exit_code()),
        Err(e @ ToolError::Spawn { .. }) => {
            eprintln!("error: {:#}", anyhow::Error::from(e));
            Ok(EXIT_TOOL_NOT_FOUND)
        }
        Err(e) => Err(e.into()),
    }
}

/// cleanpy 命令的参数
#[derive(Debug, Clone, Copy, Default)]
struct CleanpyArgs {
    dry_run: bool,
    json: bool,
    parallel: bool,
}

fn handle_cleanpy_command(settings: &SweepSettings, root: &Path, args: CleanpyArgs) -> Result<i32> {
    let mut config = settings.sweep_config()?;
    config.dry_run = args.dry_run;
    config.parallel |= args.parallel;

    let sweeper = ArtifactSweeper::new(config);
    let report = sweeper.sweep(root)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_sweep_result(&report);
    }

    report_problems(&report);

    Ok(if report.is_success() {
        0
    } else {
        EXIT_FAILURE
    })
}

fn display_sweep_result(report: &SweepReport) {
    let verb = if report.dry_run {
        "Would remove"
    } else {
        "Removed"
    };

    println!(
        "{verb} {} bytecode files and {} cache directories ({}).",
        report.files_removed,
        report.dirs_removed,
        report.format_size()
    );

    if !report.failures.is_empty() {
        println!("Failed to remove {} paths.", report.failures.len());
    }
    if !report.scan_errors.is_empty() {
        println!("Could not read {} paths.", report.scan_errors.len());
    }
}

/// Unreadable paths are only warnings; unremovable matches fail the run
fn report_problems(report: &SweepReport) {
    for error in &report.scan_errors {
        eprintln!("warning: cannot read {}: {}", error.path.display(), error.reason);
    }
    for failure in &report.failures {
        eprintln!(
            "failed to remove {}: {}",
            failure.path.display(),
            failure.reason
        );
    }
}

/// Clamp a process status into the range a process can exit with
fn clamp_exit_code(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(EXIT_FAILURE as u8)
}
