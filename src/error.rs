// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error taxonomy.
//!
//! Parse-time errors ([`ParseError`]) carry the file path and 1-based line
//! number and abort parsing of that file; execution-time errors
//! ([`ExecError`]) are aggregated per scenario and surfaced once the full
//! step list has been walked.

use std::{fmt, io, path::PathBuf};

use derive_more::{Display, From};

/// Top-level error of any crate operation.
#[derive(Debug, Display, derive_more::Error, From)]
pub enum Error {
    /// Malformed feature-file syntax.
    #[display("{_0}")]
    Parse(ParseError),

    /// Step-execution failure.
    #[display("{_0}")]
    Exec(ExecError),

    /// Malformed step-registration pattern.
    #[display("{_0}")]
    Pattern(PatternError),

    /// I/O failure while reading feature files.
    #[display("I/O operation failed: {_0}")]
    Io(io::Error),
}

/// Result type alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed feature-file syntax, located at a 1-based line of a file.
///
/// Not recoverable mid-file: parsing of the offending file aborts.
#[derive(Clone, Debug, derive_more::Error)]
pub struct ParseError {
    /// Path of the feature file.
    pub path: PathBuf,

    /// 1-based line number of the offending statement.
    pub line: usize,

    /// What went wrong.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Creates a new [`ParseError`] at the given file and line.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        line: usize,
        kind: ParseErrorKind,
    ) -> Self {
        Self { path: path.into(), line, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bdd parsing error: {} in {}@{}",
            self.kind,
            self.path.display(),
            self.line
        )
    }
}

/// Kind of a [`ParseError`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum ParseErrorKind {
    /// A data-table row's column count differs from its header row's.
    #[display("column count mismatch in data table (expected {expected}, found {found})")]
    ColumnCountMismatch {
        /// Column count fixed by the header row.
        expected: usize,
        /// Column count of the offending row.
        found: usize,
    },

    /// A second `Feature:` header in the same file.
    #[display("feature file can have at most one Feature")]
    DuplicateFeature,

    /// An `Examples:` block without selector tags while one is already
    /// selected, or an `Examples:` block before any scenario.
    #[display("unexpected Examples")]
    UnexpectedExamples,

    /// An `Examples:` block under a background or step definition.
    #[display("Examples not allowed with background or step definition")]
    ExamplesNotAllowed,

    /// A statement the active collector can't accept.
    #[display("not supported statement in {context}")]
    UnsupportedStatement {
        /// Syntactic context the statement appeared in.
        context: String,
    },

    /// A structural header with no `:`-separated name part.
    #[display("missing name after `{keyword}` keyword")]
    MissingHeaderName {
        /// The header keyword as written.
        keyword: String,
    },

    /// A step line outside any scenario, background or step definition.
    #[display("step outside of a scenario")]
    StepOutsideScenario,

    /// A data row with no step or `Examples:` block to attach to.
    #[display("data row outside of a data table")]
    DataRowOutsideTable,

    /// A `STEP-DEF:` whose name doesn't compile into a step pattern.
    #[display("invalid step definition pattern: {message}")]
    InvalidStepPattern {
        /// The underlying pattern-compilation failure.
        message: String,
    },
}

/// Step-execution failure.
///
/// Recorded on the scenario's exception slot; the first one encountered in a
/// run is surfaced after every remaining step has been walked.
#[derive(Clone, Debug, Display, derive_more::Error)]
pub enum ExecError {
    /// No registry entry matches the resolved step text.
    ///
    /// Fatal for the scenario unless running in dry-run mode.
    #[display("step implementation not found for `{step}`")]
    StepNotFound {
        /// The resolved step text that failed to match.
        step: String,
    },

    /// The step's implementation returned a failure.
    #[display("step `{step}` failed: {source}")]
    StepFailed {
        /// The resolved step text.
        step: String,
        /// The implementation's failure.
        source: StepFailure,
    },
}

/// Opaque failure raised by a step's underlying implementation.
#[derive(Clone, Debug, Display, derive_more::Error)]
#[display("{message}")]
pub struct StepFailure {
    /// Human-readable failure description.
    pub message: String,
}

impl StepFailure {
    /// Creates a new [`StepFailure`] with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<String> for StepFailure {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for StepFailure {
    fn from(message: &str) -> Self {
        Self { message: message.to_owned() }
    }
}

/// Malformed step-registration pattern.
#[derive(Clone, Debug, Display, derive_more::Error)]
pub enum PatternError {
    /// A `{` placeholder with no closing `}`.
    #[display("unclosed placeholder in step pattern `{pattern}`")]
    UnclosedPlaceholder {
        /// The offending pattern text.
        pattern: String,
    },

    /// A placeholder whose name isn't a valid capture-group identifier.
    #[display("invalid placeholder name `{name}` in step pattern `{pattern}`")]
    InvalidPlaceholder {
        /// The offending pattern text.
        pattern: String,
        /// The offending placeholder name.
        name: String,
    },

    /// The compiled matcher was rejected by the regex engine.
    #[display("invalid step pattern `{pattern}`: {source}")]
    Regex {
        /// The offending pattern text.
        pattern: String,
        /// The regex engine's rejection.
        source: regex::Error,
    },
}
