//! # jspp
//!
//! JavaScript preprocessor. Expands `//#include "file"` and keeps or drops
//! `//#ifdef SYMBOL` / `//#ifndef SYMBOL` ... `//#endif` blocks.
//!
//! ## Usage
//!
//! - Filter stdin to stdout: `jspp -d DEBUG < main.js > out.js`
//! - Named files: `jspp -s -i src/main.js -o dist/app.js`
//!
//! See README.md for more details and examples.

/// Entry point for the CLI tool.
fn main() {
    std::process::exit(jspp::cli::run_cli());
}
