// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The parsed document model.
//!
//! One feature file parses into one [`Feature`]: its [`Scenario`]s (with
//! [`Background`] and [`StepDefinition`] as variants of the same shape),
//! their [`Step`]s and optional [`Examples`]. The tree is created during
//! parsing and only read afterwards, except for the per-run exception slot.
//!
//! [`Background`]: ScenarioKind::Background
//! [`StepDefinition`]: ScenarioKind::StepDefinition

use std::path::PathBuf;

use linked_hash_map::LinkedHashMap;

use crate::{
    data_table::DataTable, error::ExecError, keyword, metadata::Metadata,
};

/// Key/value test data a scenario run resolves its steps against.
pub type TestData = LinkedHashMap<String, String>;

/// Top-level container parsed from one feature file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    /// Name from the `Feature:` header.
    pub name: String,

    /// Path of the source file.
    pub path: PathBuf,

    /// 1-based line of the `Feature:` header.
    pub line: usize,

    /// Tags and `@key:value` annotations preceding the header.
    pub metadata: Metadata,

    /// Backgrounds, in source order.
    pub backgrounds: Vec<Scenario>,

    /// Scenarios, in source order. Step definitions are registered into the
    /// step registry instead of being collected here.
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    /// Creates an empty [`Feature`] for the given source path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    /// Returns the background a scenario runs first, if it references one.
    #[must_use]
    pub fn background_of(&self, scenario: &Scenario) -> Option<&Scenario> {
        scenario.background.and_then(|idx| self.backgrounds.get(idx))
    }
}

/// Variant of a [`Scenario`]-shaped block.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ScenarioKind {
    /// An executable scenario (`Scenario:` / `Scenario Outline:`).
    #[default]
    Scenario,

    /// Steps run before every subsequent scenario (`Background:`).
    Background,

    /// A reusable composite step (`STEP-DEF:` or an `@step`-tagged
    /// scenario), registered into the step registry at parse time.
    StepDefinition,
}

/// An ordered sequence of steps with metadata and optional examples.
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    /// Which block shape this is.
    pub kind: ScenarioKind,

    /// Name from the header line.
    pub name: String,

    /// 1-based line of the header.
    pub line: usize,

    /// Feature metadata merged with the tags collected for this block.
    pub metadata: Metadata,

    /// Steps, in source order.
    pub steps: Vec<Step>,

    /// The selected `Examples:` block, if any.
    pub examples: Option<Examples>,

    /// Index into the owning [`Feature`]'s backgrounds of the background to
    /// run first.
    pub background: Option<usize>,

    /// Per-run exception slot: set during execution, cleared between runs.
    pub exception: Option<ExecError>,
}

impl Scenario {
    /// Creates a [`Scenario`] of the given kind.
    #[must_use]
    pub fn new(
        kind: ScenarioKind,
        name: impl Into<String>,
        line: usize,
        metadata: Metadata,
    ) -> Self {
        Self { kind, name: name.into(), line, metadata, ..Self::default() }
    }

    /// Test-data rows this scenario runs with: one map per examples row, or
    /// a single empty map when no examples block is selected.
    #[must_use]
    pub fn run_rows(&self) -> Vec<TestData> {
        match &self.examples {
            Some(examples) if !examples.table.hashes().is_empty() => {
                examples.table.hashes()
            }
            _ => vec![TestData::new()],
        }
    }
}

// The exception slot is runtime state; parse determinism is structural
// equality over everything else.
impl PartialEq for Scenario {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.line == other.line
            && self.metadata == other.metadata
            && self.steps == other.steps
            && self.examples == other.examples
            && self.background == other.background
    }
}

/// One executable instruction line of a scenario.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Step {
    /// Leading keyword as written (`Given`, `given`, `And`, ...).
    pub keyword: String,

    /// Step text with the keyword stripped.
    pub text: String,

    /// 1-based source line.
    pub line: usize,

    /// Data table attached to this step, if any.
    pub table: Option<DataTable>,
}

impl Step {
    /// Parses a raw step line, splitting off the leading keyword.
    ///
    /// A line without a recognized keyword keeps its full text and an empty
    /// keyword.
    #[must_use]
    pub fn parse(stmt: &str, line: usize) -> Self {
        let (keyword, text) = keyword::split_step(stmt)
            .map_or(("", stmt.trim()), |(kw, text)| (kw, text));
        Self {
            keyword: keyword.to_owned(),
            text: text.to_owned(),
            line,
            table: None,
        }
    }

    /// The step as written: keyword plus text.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.keyword.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.keyword, self.text)
        }
    }
}

/// A data table bound to a scenario, enabling data-driven repetition.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Examples {
    /// 1-based line of the `Examples:` header.
    pub line: usize,

    /// Selector tags that chose this block; empty for an unconditional one.
    pub metadata: Metadata,

    /// The collected rows; first row is the header.
    pub table: DataTable,
}

impl Examples {
    /// Creates an empty [`Examples`] block.
    #[must_use]
    pub fn new(line: usize, metadata: Metadata) -> Self {
        Self { line, metadata, table: DataTable::new() }
    }
}
