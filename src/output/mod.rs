//! Output formatters for search results, sync reports and statistics.
//!
//! - [`text`]: colored terminal output
//! - [`json`]: JSON for automation and scripting
//! - [`csv`]: CSV for spreadsheet import
//!
//! # Example
//!
//! ```no_run
//! use magsearch::config::Config;
//! use magsearch::error::ExitCode;
//! use magsearch::output::json::JsonOutput;
//! use magsearch::session::Session;
//!
//! let session = Session::open(Config::default()).unwrap();
//! let records = session.search("BMW", true);
//! let output = JsonOutput::new("BMW", &records, ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod csv;
pub mod json;
pub mod text;

pub use csv::{CsvOutput, CsvOutputError};
pub use json::{write_json, JsonOutput, JsonOutputError};
pub use text::TextOutput;
