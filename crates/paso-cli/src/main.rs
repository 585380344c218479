//! Paso CLI: run declarative browser UI scenarios
//!
//! ## Usage
//!
//! ```bash
//! paso list                        # Show the scenario catalog
//! paso run                         # Run every scenario
//! paso run --filter checkbox       # Run matching scenarios
//! paso check flows.yaml            # Validate scenario files
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match paso_cli::run() {
        Ok(all_passed) => {
            if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
