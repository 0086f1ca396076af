use std::process::ExitCode;

fn main() -> ExitCode {
    pysweep_cli::run_cli()
}
