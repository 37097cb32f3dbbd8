//! bom - Bill-of-materials cost resolution

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = bom_cost::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
