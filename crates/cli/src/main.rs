use std::process::ExitCode;

fn main() -> ExitCode {
    querymcp_cli::run()
}
