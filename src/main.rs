//! magsearch - Incremental full-text search over a PDF magazine collection
//!
//! Entry point for the magsearch CLI application.

use clap::Parser;
use magsearch::{
    cli::Cli,
    error::{exit_code_for, StructuredError},
};

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match magsearch::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = exit_code_for(&err);

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{}", json);
                } else {
                    eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
                }
            } else {
                eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
