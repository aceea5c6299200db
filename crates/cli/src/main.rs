use std::process::ExitCode;

fn main() -> ExitCode {
    pulseops_cli::run()
}
