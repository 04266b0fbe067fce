use std::process::ExitCode;

fn main() -> ExitCode {
    clinicdesk_cli::run()
}
