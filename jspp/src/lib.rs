//! # jspp
//!
//! A line-oriented preprocessor for JavaScript. Directives are written as line
//! comments, so unprocessed sources stay valid JavaScript:
//!
//! ```text
//! //#include "lib/util.js"
//! //#ifdef DEBUG
//! console.log("debug build");
//! //#endif
//! ```

pub mod cli;
pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod resolver;

pub use engine::{MAX_INCLUDE_DEPTH, Options, Preprocessor, preprocess_str};
pub use error::PreprocessError;
