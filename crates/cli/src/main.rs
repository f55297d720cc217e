use std::process::ExitCode;

fn main() -> ExitCode {
    bibliobot_cli::run()
}
