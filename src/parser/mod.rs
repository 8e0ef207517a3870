// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tools for parsing feature files.
//!
//! Parsing is a single forward pass: each line is trimmed, blank and
//! comment lines are dropped, the rest are classified and fed to the
//! collector state machine. `STEP-DEF:` bodies found along the way are
//! registered into the step [`Registry`] as composite steps once their
//! file finishes parsing.

pub(crate) mod collector;

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::{ParseError, ParseErrorKind},
    feature::{Feature, Scenario, TestData},
    keyword::{self, COMMENT_CHARS},
    resolve::Bundle,
    runner::executor,
    step::{Location, Registry, Value},
    tracker::StepListener,
};

use self::collector::FileCollector;

/// Result of parsing one feature file.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parser of the feature-file dialect.
///
/// Holds the step [`Registry`] that `STEP-DEF:` blocks register into and
/// the property [`Bundle`] serving as the active environment context for
/// `Examples:` selection.
pub struct Parser {
    registry: Arc<Registry>,
    bundle: Arc<Bundle>,
}

impl Parser {
    /// Creates a [`Parser`] wired to the given registry and environment.
    #[must_use]
    pub fn new(registry: Arc<Registry>, bundle: Arc<Bundle>) -> Self {
        Self { registry, bundle }
    }

    /// Parses feature-file source text.
    ///
    /// `path` is recorded on the resulting [`Feature`] and on any error.
    ///
    /// # Errors
    ///
    /// [`ParseError`] on the first malformed statement; parsing of the file
    /// aborts there.
    pub fn parse_str(
        &self,
        source: &str,
        path: impl Into<PathBuf>,
    ) -> Result<Feature> {
        let path = path.into();
        let mut collector = FileCollector::new(&path, &self.bundle);
        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let stmt = raw.trim();
            if stmt.is_empty() || stmt.starts_with(COMMENT_CHARS) {
                continue;
            }
            let kind = keyword::classify(stmt);
            tracing::trace!(line, ?kind, "collecting statement");
            collector.collect(stmt, line, kind)?;
        }

        let (feature, step_defs) = collector.finish();
        for def in step_defs {
            register_step_def(&self.registry, &self.bundle, &path, def)?;
        }
        Ok(feature)
    }

    /// Reads and parses one feature file.
    ///
    /// # Errors
    ///
    /// [`crate::Error`] on I/O failure or malformed syntax.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> crate::Result<Feature> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Ok(self.parse_str(&source, path)?)
    }

    /// Parses a feature file, or every `*.feature` file under a directory
    /// (case-insensitive), in path order.
    ///
    /// # Errors
    ///
    /// [`crate::Error`] on I/O failure or the first malformed file.
    pub fn parse_path(
        &self,
        path: impl AsRef<Path>,
    ) -> crate::Result<Vec<Feature>> {
        let path = path.as_ref();
        if path.is_file() {
            return Ok(vec![self.parse_file(path)?]);
        }

        let walker = globwalk::GlobWalkerBuilder::new(path, "*.feature")
            .case_insensitive(true)
            .build()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let mut paths: Vec<PathBuf> = walker
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path().to_path_buf())
            .collect();
        paths.sort();

        paths.iter().map(|p| self.parse_file(p)).collect()
    }
}

/// Registers a parsed `STEP-DEF:` body as a composite step: its name is the
/// pattern, captured arguments become the body's test data, and the body's
/// steps re-enter the execution engine one by one.
fn register_step_def(
    registry: &Arc<Registry>,
    bundle: &Arc<Bundle>,
    path: &Path,
    def: Scenario,
) -> Result<()> {
    let location =
        Location::new(path.display().to_string(), def.line as u32, 0);
    let pattern = def.name.clone();
    let line = def.line;
    let steps = Arc::new(def.steps);
    let weak = Arc::downgrade(registry);
    let bundle = Arc::clone(bundle);

    let added = registry
        .step(pattern)
        .location(location)
        .handler(move |tracker| {
            let Some(registry) = weak.upgrade() else {
                return Err("step registry no longer available".into());
            };
            let mut data = TestData::new();
            for (name, value) in tracker.kwargs.iter() {
                if let Value::Str(s) = value {
                    let _ = data.insert(name.clone(), s.clone());
                }
            }

            let mut no_listeners: [Box<dyn StepListener>; 0] = [];
            let mut first: Option<crate::error::StepFailure> = None;
            for step in steps.iter() {
                let mut env = executor::Env {
                    registry: &registry,
                    resolver: bundle.as_ref(),
                    fixtures: None,
                    listeners: &mut no_listeners,
                    dry_run: tracker.dry_run,
                };
                let outcome = executor::execute(
                    &mut env,
                    &step.text,
                    step.table.as_ref(),
                    &data,
                    first.is_some(),
                );
                if let Err(e) = outcome {
                    if first.is_none() {
                        first = Some(crate::error::StepFailure::new(
                            e.to_string(),
                        ));
                    }
                }
            }
            first.map_or(Ok(()), Err)
        })
        .map_err(|e| {
            ParseError::new(
                path,
                line,
                ParseErrorKind::InvalidStepPattern { message: e.to_string() },
            )
        })?;
    if !added {
        // Same file re-parsed; the earlier registration stands.
        tracing::debug!(step_def = %def.name, "step definition already registered");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        Parser::new(Arc::new(Registry::new()), Arc::new(Bundle::new()))
    }

    #[test]
    fn blank_and_comment_lines_are_dropped_everywhere() {
        let feature = parser()
            .parse_str(
                "\n# comment\nFeature: F\n\n! bang comment\nScenario: S\n\nGiven a step\n",
                "c.feature",
            )
            .unwrap();
        assert_eq!(feature.scenarios[0].steps.len(), 1);
    }

    #[test]
    fn one_line_triple_quote_comment_is_consumed_in_place() {
        let feature = parser()
            .parse_str(
                "Feature: F\n\
                 Scenario: S\n\
                 Given a step\n\
                 \"\"\"noted\"\"\"\n\
                 Given another step\n",
                "c.feature",
            )
            .unwrap();
        assert_eq!(feature.scenarios[0].steps.len(), 2);
    }

    #[test]
    fn multiline_comment_swallows_table_rows_too() {
        let feature = parser()
            .parse_str(
                "Feature: F\n\
                 Scenario: S\n\
                 Given a step\n\
                 |a|\n\
                 |1|\n\
                 \"\"\"\n\
                 |not|a|row|\n\
                 closing\"\"\"\n\
                 |2|\n",
                "c.feature",
            )
            .unwrap();
        let table = feature.scenarios[0].steps[0].table.as_ref().unwrap();
        // The mismatched row inside the comment never reached the table.
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn bad_step_def_pattern_is_a_parse_error() {
        let err = parser()
            .parse_str(
                "Feature: F\nSTEP-DEF: broken '{unclosed\nGiven a part\n",
                "bad.feature",
            )
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::InvalidStepPattern { .. }
        ));
        assert_eq!(err.line, 2);
    }
}
