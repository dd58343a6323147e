pub mod cli;
pub mod fixture;
pub mod models;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let command_line_interface = cli::CommandLineInterface::load();
    let all_passed = command_line_interface.run()?;
    Ok(if all_passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
