use std::process::ExitCode;

fn main() -> ExitCode {
    pickwise_cli::run()
}
