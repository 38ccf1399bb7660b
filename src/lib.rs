//! Offset header converter.
//!
//! Runs an external dumper, reads the `constexpr std::ptrdiff_t` offsets out
//! of the headers it writes, and turns them into a JSON table, a C++ struct
//! stub and a C++ assignment stub. The JSON table is then pushed to GitHub.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod table;

pub use config::Config;
pub use error::{Error, Result};
pub use table::OffsetTable;
