//! CLI module containing the main entry point logic.
//!
//! Parses flags, loads configuration, wires stdin/stdout or the named files to
//! the [`Preprocessor`] and maps failures to exit statuses.

use crate::config::{self, ConfigError};
use crate::engine::{Options, Preprocessor};
use crate::error::{EX_CONFIG, EX_OK, EX_USAGE, PreprocessError};
use crate::resolver;
use clap::Parser as ClapParser;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const STDIN_NAME: &str = "<stdin>";
const STDOUT_NAME: &str = "<stdout>";

/// CLI arguments for jspp.
#[derive(ClapParser, Debug)]
#[command(name = "jspp")]
#[command(version = PKG_VERSION)]
#[command(
    about = "JavaScript preprocessor: expands //#include and //#ifdef, //#ifndef, //#endif",
    long_about = None
)]
pub struct Cli {
    /// Write `;` on its own line after each included file
    #[arg(short, long)]
    semicolon: bool,

    /// Define a symbol for #ifdef/#ifndef (repeatable)
    #[arg(short, long = "define", value_name = "SYMBOL")]
    defines: Vec<String>,

    /// Input file (default: stdin). Includes resolve relative to its directory
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Configuration file or directory containing .jspp.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Options given on the command line, before configuration is merged in
    #[must_use]
    pub fn options(&self) -> Options {
        Options {
            semicolon: self.semicolon,
            defines: self.defines.iter().cloned().collect(),
        }
    }
}

/// Anything that ends a CLI run unsuccessfully.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EX_CONFIG,
            Self::Preprocess(e) => e.exit_code(),
        }
    }
}

/// Main CLI logic. Returns the process exit status.
#[must_use]
pub fn run_cli() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here
            let code = if e.use_stderr() { EX_USAGE } else { EX_OK };
            let _ = e.print();
            return code;
        }
    };

    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(()) => EX_OK,
        Err(e) => {
            eprintln!("jspp: {e}");
            e.exit_code()
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Resolve options and run the preprocessor over the selected input/output.
///
/// # Errors
///
/// Returns `CliError` for unusable configuration or any preprocessing failure.
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    let mut options = cli.options();
    if let Some(file_config) = config::load_config(cli.config.as_deref())? {
        options = file_config.merge_into(options);
    }
    debug!(
        "semicolon={} defines={:?}",
        options.semicolon, options.defines
    );

    // Input is opened first so a missing input never truncates the output
    let (reader, input_name, base_dir) = open_input(cli.input.as_deref())?;
    let (writer, output_name) = open_output(cli.output.as_deref())?;

    let mut out = BufWriter::new(writer);
    let mut preprocessor = Preprocessor::new(options).with_output_name(&output_name);
    let result = preprocessor.process(reader, &input_name, &base_dir, &mut out);
    let flushed = out
        .flush()
        .map_err(|e| PreprocessError::io(&output_name, e));

    result?;
    flushed?;
    Ok(())
}

type Input = (Box<dyn BufRead>, PathBuf, PathBuf);

fn open_input(path: Option<&Path>) -> Result<Input, PreprocessError> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|e| PreprocessError::io(path, e))?;
            Ok((
                Box::new(BufReader::new(file)),
                path.to_path_buf(),
                resolver::base_dir_of(path),
            ))
        }
        None => Ok((
            Box::new(io::stdin().lock()),
            PathBuf::from(STDIN_NAME),
            PathBuf::new(),
        )),
    }
}

fn open_output(path: Option<&Path>) -> Result<(Box<dyn Write>, PathBuf), PreprocessError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| PreprocessError::io(path, e))?;
            Ok((Box::new(file), path.to_path_buf()))
        }
        None => Ok((Box::new(io::stdout().lock()), PathBuf::from(STDOUT_NAME))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{EX_IF_NOMATCH, EX_IOERR};

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "jspp", "-s", "-d", "DEBUG", "-d", "NODE", "-i", "in.js", "-o", "out.js",
        ])
        .unwrap();
        let options = cli.options();
        assert!(options.semicolon);
        assert!(options.is_defined("DEBUG"));
        assert!(options.is_defined("NODE"));
        assert_eq!(cli.input, Some(PathBuf::from("in.js")));
        assert_eq!(cli.output, Some(PathBuf::from("out.js")));
    }

    #[test]
    fn test_long_flags() {
        let cli = Cli::try_parse_from([
            "jspp",
            "--semicolon",
            "--define",
            "DEBUG",
            "--input",
            "in.js",
            "--output",
            "out.js",
            "--config",
            "conf.json",
        ])
        .unwrap();
        assert!(cli.semicolon);
        assert_eq!(cli.defines, vec!["DEBUG".to_string()]);
        assert_eq!(cli.config, Some(PathBuf::from("conf.json")));
    }

    #[test]
    fn test_defaults_to_stdio() {
        let cli = Cli::try_parse_from(["jspp"]).unwrap();
        assert_eq!(cli.input, None);
        assert_eq!(cli.output, None);
        assert_eq!(cli.options(), Options::default());
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["jspp", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_define_requires_value() {
        let err = Cli::try_parse_from(["jspp", "-d"]).unwrap_err();
        assert!(err.use_stderr());
    }

    #[test]
    fn test_exit_code_mapping() {
        let config = CliError::from(ConfigError {
            path: PathBuf::from(".jspp.json"),
            message: "bad".to_string(),
        });
        assert_eq!(config.exit_code(), EX_CONFIG);

        let io_err = CliError::from(PreprocessError::io("x", io::Error::other("boom")));
        assert_eq!(io_err.exit_code(), EX_IOERR);

        let unmatched = CliError::from(PreprocessError::UnmatchedConditional { open: 1 });
        assert_eq!(unmatched.exit_code(), EX_IF_NOMATCH);
    }
}
