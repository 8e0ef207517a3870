// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The statement-collector state machine, i.e. the parser proper.
//!
//! One collector state is current per syntactic context (feature header
//! scope, a scenario/background/step-definition body, a data table, a
//! multiline comment), kept on an explicit stack. A state that can't accept
//! a statement pops itself and re-dispatches to the state below; the bottom
//! of the stack is always the feature scope, which accepts everything legal
//! and errors on the rest.

use std::{path::Path, sync::Arc};

use crate::{
    data_table::DataTable,
    error::{ParseError, ParseErrorKind},
    feature::{Examples, Feature, Scenario, ScenarioKind, Step},
    keyword::{self, StatementKind},
    metadata::Metadata,
    resolve::Bundle,
};

/// Which block a body or data-table state belongs to.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Target {
    Scenario(usize),
    Background(usize),
    StepDef(usize),
}

impl Target {
    fn context(self) -> &'static str {
        match self {
            Self::Scenario(_) => "scenario",
            Self::Background(_) => "background",
            Self::StepDef(_) => "step definition",
        }
    }
}

/// Where collected data-table rows land.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Sink {
    /// The most recent step of the target block.
    Step(Target),
    /// A scenario's examples block; `attached` is `false` for a block that
    /// lost environment selection and is only syntax-checked.
    Examples { scenario: usize, attached: bool },
}

/// One collector state.
#[derive(Clone, Copy, Debug)]
pub(crate) enum State {
    Feature,
    Body(Target),
    Table(Sink),
    Comment,
}

/// Whether a state consumed a statement or defers to the state below it.
enum Flow {
    Handled,
    Delegate,
}

/// Collects classified statements of one feature file into a [`Feature`],
/// accumulating `STEP-DEF:` bodies for registration once parsing completes.
pub(crate) struct FileCollector<'p> {
    path: &'p Path,
    bundle: &'p Arc<Bundle>,
    feature: Feature,
    step_defs: Vec<Scenario>,
    pending: Metadata,
    stack: Vec<State>,
    scratch: DataTable,
}

impl<'p> FileCollector<'p> {
    pub(crate) fn new(path: &'p Path, bundle: &'p Arc<Bundle>) -> Self {
        Self {
            path,
            bundle,
            feature: Feature::new(path),
            step_defs: Vec::new(),
            pending: Metadata::new(),
            stack: vec![State::Feature],
            scratch: DataTable::new(),
        }
    }

    /// Completes the pass, yielding the collected feature and any
    /// `STEP-DEF:` bodies awaiting registration.
    pub(crate) fn finish(self) -> (Feature, Vec<Scenario>) {
        (self.feature, self.step_defs)
    }

    /// Dispatches one classified statement to the current state.
    pub(crate) fn collect(
        &mut self,
        stmt: &str,
        line: usize,
        kind: StatementKind,
    ) -> Result<(), ParseError> {
        loop {
            let state = *self.stack.last().unwrap_or(&State::Feature);
            let flow = match state {
                State::Feature => self.collect_feature(stmt, line, kind)?,
                State::Body(target) => {
                    self.collect_body(target, stmt, line, kind)?
                }
                State::Table(sink) => {
                    self.collect_table(sink, stmt, line, kind)?
                }
                State::Comment => {
                    // Free text is consumed; the delimiter pops back out.
                    if matches!(
                        kind,
                        StatementKind::CommentOpen | StatementKind::CommentEnd
                    ) {
                        let _ = self.stack.pop();
                    }
                    Flow::Handled
                }
            };
            match flow {
                Flow::Handled => return Ok(()),
                Flow::Delegate => {
                    let _ = self.stack.pop();
                }
            }
        }
    }

    fn collect_feature(
        &mut self,
        stmt: &str,
        line: usize,
        kind: StatementKind,
    ) -> Result<Flow, ParseError> {
        match kind {
            StatementKind::Tag => {
                self.pending.collect_tag_line(stmt);
                Ok(Flow::Handled)
            }
            StatementKind::Feature => {
                if !self.feature.name.is_empty() {
                    return Err(self.err(line, ParseErrorKind::DuplicateFeature));
                }
                self.feature.name = self.header_name(stmt, line)?.to_owned();
                self.feature.line = line;
                self.feature.metadata = self.pending.take();
                Ok(Flow::Handled)
            }
            StatementKind::Scenario | StatementKind::ScenarioOutline => {
                if self.pending.has_group(keyword::STEP_GROUP) {
                    self.start_step_def(stmt, line)
                } else {
                    self.start_scenario(stmt, line)
                }
            }
            StatementKind::StepDef => self.start_step_def(stmt, line),
            StatementKind::Background => self.start_background(stmt, line),
            StatementKind::Examples => self.select_examples(line),
            StatementKind::CommentOpen => {
                self.stack.push(State::Comment);
                Ok(Flow::Handled)
            }
            // A line both opening and closing a block is a one-line comment.
            StatementKind::CommentEnd => Ok(Flow::Handled),
            StatementKind::Step => {
                Err(self.err(line, ParseErrorKind::StepOutsideScenario))
            }
            StatementKind::DataRow => {
                Err(self.err(line, ParseErrorKind::DataRowOutsideTable))
            }
            StatementKind::Unknown => Err(self.err(
                line,
                ParseErrorKind::UnsupportedStatement {
                    context: "feature".to_owned(),
                },
            )),
        }
    }

    fn collect_body(
        &mut self,
        target: Target,
        stmt: &str,
        line: usize,
        kind: StatementKind,
    ) -> Result<Flow, ParseError> {
        match kind {
            StatementKind::Step => {
                self.steps_mut(target).push(Step::parse(stmt, line));
                Ok(Flow::Handled)
            }
            StatementKind::DataRow => {
                if self.steps_mut(target).is_empty() {
                    return Err(
                        self.err(line, ParseErrorKind::DataRowOutsideTable)
                    );
                }
                let sink = Sink::Step(target);
                self.stack.push(State::Table(sink));
                self.push_row(sink, stmt, line)?;
                Ok(Flow::Handled)
            }
            StatementKind::Examples => match target {
                Target::Background(_) | Target::StepDef(_) => {
                    Err(self.err(line, ParseErrorKind::ExamplesNotAllowed))
                }
                Target::Scenario(idx) => {
                    // First block attaches unconditionally; collecting its
                    // rows returns control to the feature scope, where any
                    // further blocks go through environment selection.
                    let _ = self.stack.pop();
                    self.feature.scenarios[idx].examples =
                        Some(Examples::new(line, Metadata::new()));
                    self.stack.push(State::Table(Sink::Examples {
                        scenario: idx,
                        attached: true,
                    }));
                    Ok(Flow::Handled)
                }
            },
            StatementKind::CommentOpen => {
                self.stack.push(State::Comment);
                Ok(Flow::Handled)
            }
            StatementKind::CommentEnd => Ok(Flow::Handled),
            StatementKind::Tag
            | StatementKind::Feature
            | StatementKind::Scenario
            | StatementKind::ScenarioOutline
            | StatementKind::StepDef
            | StatementKind::Background => Ok(Flow::Delegate),
            StatementKind::Unknown => Err(self.err(
                line,
                ParseErrorKind::UnsupportedStatement {
                    context: target.context().to_owned(),
                },
            )),
        }
    }

    fn collect_table(
        &mut self,
        sink: Sink,
        stmt: &str,
        line: usize,
        kind: StatementKind,
    ) -> Result<Flow, ParseError> {
        match kind {
            StatementKind::DataRow => {
                self.push_row(sink, stmt, line)?;
                Ok(Flow::Handled)
            }
            StatementKind::CommentOpen => {
                self.stack.push(State::Comment);
                Ok(Flow::Handled)
            }
            StatementKind::CommentEnd => Ok(Flow::Handled),
            _ => Ok(Flow::Delegate),
        }
    }

    fn start_scenario(
        &mut self,
        stmt: &str,
        line: usize,
    ) -> Result<Flow, ParseError> {
        let name = self.header_name(stmt, line)?.to_owned();
        let metadata = self.feature.metadata.merged_with(&self.pending.take());
        let mut scenario =
            Scenario::new(ScenarioKind::Scenario, name, line, metadata);
        scenario.background = self.feature.backgrounds.len().checked_sub(1);
        self.feature.scenarios.push(scenario);
        self.stack
            .push(State::Body(Target::Scenario(self.feature.scenarios.len() - 1)));
        Ok(Flow::Handled)
    }

    fn start_background(
        &mut self,
        stmt: &str,
        line: usize,
    ) -> Result<Flow, ParseError> {
        let name = self.header_name(stmt, line)?.to_owned();
        let pending = self.pending.take();
        let global = pending
            .get(keyword::SCOPE_KEY)
            .map_or(false, |scope| scope.eq_ignore_ascii_case("global"));
        let metadata = if global {
            self.feature.metadata.merged_with(&pending)
        } else {
            pending
        };
        self.feature.backgrounds.push(Scenario::new(
            ScenarioKind::Background,
            name,
            line,
            metadata,
        ));
        self.stack.push(State::Body(Target::Background(
            self.feature.backgrounds.len() - 1,
        )));
        Ok(Flow::Handled)
    }

    fn start_step_def(
        &mut self,
        stmt: &str,
        line: usize,
    ) -> Result<Flow, ParseError> {
        let name = self.header_name(stmt, line)?.to_owned();
        let metadata = self.feature.metadata.merged_with(&self.pending.take());
        self.step_defs.push(Scenario::new(
            ScenarioKind::StepDefinition,
            name,
            line,
            metadata,
        ));
        self.stack
            .push(State::Body(Target::StepDef(self.step_defs.len() - 1)));
        Ok(Flow::Handled)
    }

    /// Environment selection for second and later `Examples:` blocks of a
    /// scenario: the first block with selector tags matching the active
    /// environment wins; losers are still syntax-checked, row by row.
    fn select_examples(&mut self, line: usize) -> Result<Flow, ParseError> {
        let selector = self.pending.take();
        let Some(idx) = self.feature.scenarios.len().checked_sub(1) else {
            return Err(self.err(line, ParseErrorKind::UnexpectedExamples));
        };
        let scenario = &mut self.feature.scenarios[idx];
        if selector.is_empty() && scenario.examples.is_some() {
            return Err(self.err(line, ParseErrorKind::UnexpectedExamples));
        }

        let matched = !selector.is_empty() && selector.matches_env(self.bundle);
        let unconditional = selector.is_empty();
        let current_is_default = scenario
            .examples
            .as_ref()
            .map_or(true, |e| e.metadata.is_empty());
        let attached = if (matched || unconditional) && current_is_default {
            scenario.examples = Some(Examples::new(line, selector));
            true
        } else {
            self.scratch = DataTable::new();
            false
        };
        self.stack
            .push(State::Table(Sink::Examples { scenario: idx, attached }));
        Ok(Flow::Handled)
    }

    fn push_row(
        &mut self,
        sink: Sink,
        stmt: &str,
        line: usize,
    ) -> Result<(), ParseError> {
        let path = self.path;
        let cells = DataTable::parse_row(stmt);
        let table = match sink {
            Sink::Step(target) => {
                let Some(step) = self.steps_mut(target).last_mut() else {
                    return Err(ParseError::new(
                        path,
                        line,
                        ParseErrorKind::DataRowOutsideTable,
                    ));
                };
                step.table.get_or_insert_with(DataTable::new)
            }
            Sink::Examples { scenario, attached: true } => {
                match self.feature.scenarios[scenario].examples.as_mut() {
                    Some(examples) => &mut examples.table,
                    None => &mut self.scratch,
                }
            }
            Sink::Examples { attached: false, .. } => &mut self.scratch,
        };
        table.push(cells).map_err(|mismatch| {
            ParseError::new(
                path,
                line,
                ParseErrorKind::ColumnCountMismatch {
                    expected: mismatch.expected,
                    found: mismatch.found,
                },
            )
        })
    }

    fn steps_mut(&mut self, target: Target) -> &mut Vec<Step> {
        match target {
            Target::Scenario(i) => &mut self.feature.scenarios[i].steps,
            Target::Background(i) => &mut self.feature.backgrounds[i].steps,
            Target::StepDef(i) => &mut self.step_defs[i].steps,
        }
    }

    fn header_name<'s>(
        &self,
        stmt: &'s str,
        line: usize,
    ) -> Result<&'s str, ParseError> {
        keyword::header_name(stmt).ok_or_else(|| {
            self.err(
                line,
                ParseErrorKind::MissingHeaderName { keyword: stmt.to_owned() },
            )
        })
    }

    fn err(&self, line: usize, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.path, line, kind)
    }
}
