// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Location tracking for step definitions.
//!
//! A [`Location`] identifies where a step implementation was declared: a
//! Rust source file (via the [`location!`] macro) or a feature file for
//! `STEP-DEF:` blocks. Registration dedup keys on (pattern, location).
//!
//! [`location!`]: crate::location!

use derive_more::Display;

/// Location of a step definition's declaration.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path of the file the step is declared in.
    pub path: String,

    /// Line of the declaration.
    pub line: u32,

    /// Column of the declaration (0 when unknown).
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`].
    #[must_use]
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self { path: path.into(), line, column }
    }

    /// Returns the last path component.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }

    /// Short representation: `filename:line:column`.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}:{}:{}", self.filename(), self.line, self.column)
    }
}

/// Expands to the [`Location`] of the macro invocation itself.
///
/// [`Location`]: crate::step::Location
#[macro_export]
macro_rules! location {
    () => {
        $crate::step::Location::new(file!(), line!(), column!())
    };
}
