//! Directive processing engine
//!
//! Streams input lines to the output, expanding `#include` directives in place
//! and dropping the bodies of `#ifdef`/`#ifndef` blocks whose guard is false.
//!
//! Open `#ifdef`/`#ifndef` blocks are kept on a stack of suppression frames
//! owned by the [`Preprocessor`], so nesting depth is limited only by memory
//! and a block opened in one file stays in force after that file ends. Only
//! includes recurse, bounded by [`MAX_INCLUDE_DEPTH`]. A block nested inside
//! a suppressed block stays suppressed whatever its own guard says. While
//! suppressed, directives are still recognised and counted so that `#endif`s
//! pair up, but no file is opened and no guard is evaluated.

use crate::directive::{self, Directive};
use crate::error::PreprocessError;
use crate::resolver;
use log::{debug, trace};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Maximum number of nested `#include`s below the top-level input.
pub const MAX_INCLUDE_DEPTH: usize = 100;

/// Display name used for in-memory input.
const STRING_INPUT_NAME: &str = "<string>";
/// Display name used for output errors unless configured otherwise.
const DEFAULT_OUTPUT_NAME: &str = "<stdout>";
/// Display name used for the output of [`preprocess_str`].
const STRING_OUTPUT_NAME: &str = "<string output>";

/// Run configuration, fixed for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Write `;` on its own line after each expanded include
    pub semicolon: bool,
    /// Symbols considered defined by `#ifdef`/`#ifndef`
    pub defines: BTreeSet<String>,
}

impl Options {
    #[must_use]
    pub fn with_semicolon(mut self, semicolon: bool) -> Self {
        self.semicolon = semicolon;
        self
    }

    #[must_use]
    pub fn define(mut self, symbol: impl Into<String>) -> Self {
        self.defines.insert(symbol.into());
        self
    }

    #[must_use]
    pub fn is_defined(&self, symbol: &str) -> bool {
        self.defines.contains(symbol)
    }
}

/// One input stream being consumed line by line.
struct Source<'a, R> {
    reader: R,
    name: &'a Path,
    base_dir: &'a Path,
    line: usize,
}

impl<'a, R: BufRead> Source<'a, R> {
    fn new(reader: R, name: &'a Path, base_dir: &'a Path) -> Self {
        Self {
            reader,
            name,
            base_dir,
            line: 0,
        }
    }

    /// Next line with its terminator, or `None` at end of input.
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, PreprocessError> {
        let mut buf = Vec::new();
        let read = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| PreprocessError::io(self.name, e))?;
        if read == 0 {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(buf))
    }
}

/// Preprocessing context: configuration plus the nesting state that is
/// shared across include boundaries.
#[derive(Debug)]
pub struct Preprocessor {
    options: Options,
    output_name: PathBuf,
    include_depth: usize,
    /// One entry per open `#ifdef`/`#ifndef`: whether its body is suppressed
    conditionals: Vec<bool>,
}

impl Preprocessor {
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            output_name: PathBuf::from(DEFAULT_OUTPUT_NAME),
            include_depth: 0,
            conditionals: Vec::new(),
        }
    }

    /// Name reported when writing to the output fails
    #[must_use]
    pub fn with_output_name(mut self, name: impl Into<PathBuf>) -> Self {
        self.output_name = name.into();
        self
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Preprocess a top-level input stream into `out`.
    ///
    /// `name` is used in diagnostics; relative includes resolve against
    /// `base_dir` (empty for the current directory). Whatever was written
    /// before a failure stays written.
    ///
    /// # Errors
    ///
    /// Fails on the first I/O error, on an `#include` nested deeper than
    /// [`MAX_INCLUDE_DEPTH`], on an `#endif` without an open block, and when
    /// the input ends with blocks still open.
    pub fn process<R: BufRead, W: Write>(
        &mut self,
        input: R,
        name: &Path,
        base_dir: &Path,
        out: &mut W,
    ) -> Result<(), PreprocessError> {
        self.include_depth = 0;
        self.conditionals.clear();

        self.stream(input, name, base_dir, out)?;

        if !self.conditionals.is_empty() {
            return Err(PreprocessError::UnmatchedConditional {
                open: self.conditionals.len(),
            });
        }
        Ok(())
    }

    /// Preprocess the file at `path`; its directory is the include base.
    ///
    /// # Errors
    ///
    /// See [`Preprocessor::process`]. Failing to open `path` is an I/O error.
    pub fn process_file<W: Write>(
        &mut self,
        path: &Path,
        out: &mut W,
    ) -> Result<(), PreprocessError> {
        let file = File::open(path).map_err(|e| PreprocessError::io(path, e))?;
        let base_dir = resolver::base_dir_of(path);
        self.process(BufReader::new(file), path, &base_dir, out)
    }

    /// Number of `#ifdef`/`#ifndef` blocks currently open
    #[must_use]
    pub fn conditional_depth(&self) -> usize {
        self.conditionals.len()
    }

    fn suppressed(&self) -> bool {
        self.conditionals.last().copied().unwrap_or(false)
    }

    /// Consume a whole stream. Blocks opened here may be closed by the
    /// including file and vice versa; the frames live in `self`.
    fn stream<R: BufRead, W: Write>(
        &mut self,
        input: R,
        name: &Path,
        base_dir: &Path,
        out: &mut W,
    ) -> Result<(), PreprocessError> {
        let mut source = Source::new(input, name, base_dir);

        while let Some(line) = source.next_line()? {
            let suppressed = self.suppressed();
            match directive::classify(&line) {
                Directive::Plain => {
                    if !suppressed {
                        self.write(out, &line)?;
                    }
                }
                Directive::Include(raw) => {
                    if suppressed {
                        trace!(
                            "{}:{}: skipping suppressed #include",
                            source.name.display(),
                            source.line
                        );
                    } else {
                        self.include(&source, raw, out)?;
                    }
                }
                guard @ (Directive::IfDef(_) | Directive::IfNdef(_)) => {
                    let inner_suppressed = suppressed || !self.evaluate(&source, guard);
                    self.conditionals.push(inner_suppressed);
                }
                Directive::EndIf => {
                    if self.conditionals.pop().is_none() {
                        return Err(PreprocessError::UnmatchedEndif {
                            path: source.name.to_path_buf(),
                            line: source.line,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Guard value of an `#ifdef`/`#ifndef` line.
    fn evaluate<R>(&self, source: &Source<'_, R>, guard: Directive<'_>) -> bool {
        let (symbol, value) = match guard {
            Directive::IfDef(symbol) => (symbol, self.options.is_defined(symbol)),
            Directive::IfNdef(symbol) => (symbol, !self.options.is_defined(symbol)),
            _ => return true,
        };
        debug!(
            "{}:{}: {} {symbol} is {value}",
            source.name.display(),
            source.line,
            guard.keyword().unwrap_or_default()
        );
        value
    }

    fn include<R: BufRead, W: Write>(
        &mut self,
        source: &Source<'_, R>,
        raw: &[u8],
        out: &mut W,
    ) -> Result<(), PreprocessError> {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            return Err(PreprocessError::MaxIncludeDepth {
                path: source.name.to_path_buf(),
                line: source.line,
                max: MAX_INCLUDE_DEPTH,
            });
        }

        let raw = resolver::include_path(raw).map_err(|e| PreprocessError::io(source.name, e))?;
        let target = resolver::resolve_include(source.base_dir, raw);
        let file = File::open(&target.path).map_err(|e| PreprocessError::io(&target.path, e))?;

        self.include_depth += 1;
        debug!(
            "{}:{}: including {} (depth {})",
            source.name.display(),
            source.line,
            target.path.display(),
            self.include_depth
        );
        let result = self.stream(BufReader::new(file), &target.path, &target.base_dir, out);
        self.include_depth -= 1;
        result?;

        if self.options.semicolon {
            self.write(out, b";\n")?;
        }
        Ok(())
    }

    fn write<W: Write>(&self, out: &mut W, bytes: &[u8]) -> Result<(), PreprocessError> {
        out.write_all(bytes)
            .map_err(|e| PreprocessError::io(&self.output_name, e))
    }
}

/// Preprocess an in-memory string. Relative includes resolve against
/// `base_dir`.
///
/// # Errors
///
/// See [`Preprocessor::process`]. Output that is not valid UTF-8 (from an
/// included file) is reported as an I/O error.
pub fn preprocess_str(
    input: &str,
    base_dir: &Path,
    options: Options,
) -> Result<String, PreprocessError> {
    let mut out = Vec::new();
    Preprocessor::new(options)
        .with_output_name(STRING_OUTPUT_NAME)
        .process(input.as_bytes(), Path::new(STRING_INPUT_NAME), base_dir, &mut out)?;
    String::from_utf8(out).map_err(|e| {
        PreprocessError::io(
            STRING_OUTPUT_NAME,
            io::Error::new(io::ErrorKind::InvalidData, e),
        )
    })
}
