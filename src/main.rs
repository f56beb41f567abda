use std::process::ExitCode;

fn main() -> ExitCode {
    rezolve_rs::run_cli()
}
