// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The execution engine driving parsed scenarios against the step registry.
//!
//! Steps within a scenario execute strictly in source order, a referenced
//! background's steps first. Once any step fails, every subsequent step is
//! still walked (producing skip records) but never invoked, and the first
//! failure is the one surfaced for the scenario.

pub(crate) mod executor;

use std::sync::Arc;

use crate::{
    error::ExecError,
    feature::{Feature, Scenario, Step, TestData},
    resolve::Bundle,
    step::{FixtureResolver, Registry},
    tracker::StepListener,
};

/// Outcome of running one scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// The scenario's name.
    pub name: String,

    /// `Ok` or the first failure encountered across the scenario's runs.
    pub result: Result<(), ExecError>,
}

impl ScenarioOutcome {
    /// Indicates whether the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Drives features, scenarios and bare step calls against a [`Registry`].
///
/// Configured builder-style; the dry-run flag is static and threaded through
/// the whole call chain.
pub struct Runner {
    registry: Arc<Registry>,
    bundle: Arc<Bundle>,
    fixtures: Option<Box<dyn FixtureResolver>>,
    listeners: Vec<Box<dyn StepListener>>,
    dry_run: bool,
}

impl Runner {
    /// Creates a [`Runner`] over the given registry and property bundle.
    #[must_use]
    pub fn new(registry: Arc<Registry>, bundle: Arc<Bundle>) -> Self {
        Self {
            registry,
            bundle,
            fixtures: None,
            listeners: Vec::new(),
            dry_run: false,
        }
    }

    /// Enables or disables dry-run mode: steps are resolved and looked up
    /// but implementations are never entered, and missing implementations
    /// are log events instead of failures.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Attaches the host runner's fixture collaborator.
    #[must_use]
    pub fn with_fixtures(
        mut self,
        fixtures: impl FixtureResolver + 'static,
    ) -> Self {
        self.fixtures = Some(Box::new(fixtures));
        self
    }

    /// Attaches an outcome listener. Listeners are notified in attachment
    /// order.
    #[must_use]
    pub fn with_listener(
        mut self,
        listener: impl StepListener + 'static,
    ) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Runs every scenario of a feature, in source order, and returns their
    /// outcomes.
    pub fn run_feature(
        &mut self,
        feature: &mut Feature,
        data: &TestData,
    ) -> Vec<ScenarioOutcome> {
        tracing::info!(feature = %feature.name, "running feature");
        let Feature { backgrounds, scenarios, .. } = feature;
        scenarios
            .iter_mut()
            .map(|scenario| {
                let background = scenario
                    .background
                    .and_then(|idx| backgrounds.get(idx));
                let result =
                    run_scenario_inner(self, background, scenario, data);
                ScenarioOutcome { name: scenario.name.clone(), result }
            })
            .collect()
    }

    /// Runs one scenario, its background's steps first, once per
    /// examples row.
    ///
    /// # Errors
    ///
    /// The first [`ExecError`] encountered, after all steps of every row
    /// have been walked.
    pub fn run_scenario(
        &mut self,
        background: Option<&Scenario>,
        scenario: &mut Scenario,
        data: &TestData,
    ) -> Result<(), ExecError> {
        run_scenario_inner(self, background, scenario, data)
    }

    /// Executes a single parsed [`Step`].
    ///
    /// # Errors
    ///
    /// [`ExecError`] if the step has no implementation (outside dry-run) or
    /// its implementation fails.
    pub fn execute_step(
        &mut self,
        step: &Step,
        data: &TestData,
    ) -> Result<Option<String>, ExecError> {
        let mut env = self.env();
        executor::execute(&mut env, &step.text, step.table.as_ref(), data, false)
    }

    /// Executes a bare step call given as text.
    ///
    /// # Errors
    ///
    /// Same contract as [`Runner::execute_step()`].
    pub fn execute_text(
        &mut self,
        call: &str,
        data: &TestData,
    ) -> Result<Option<String>, ExecError> {
        let mut env = self.env();
        executor::execute(&mut env, call, None, data, false)
    }

    /// Executes a bare step call with explicit per-call flags, overriding
    /// the runner's own dry-run setting.
    ///
    /// With `should_skip` set the step is resolved and looked up but never
    /// invoked, mirroring how the remaining steps of a failed scenario are
    /// walked.
    ///
    /// # Errors
    ///
    /// Same contract as [`Runner::execute_step()`].
    pub fn execute(
        &mut self,
        call: &str,
        data: &TestData,
        dry_run: bool,
        should_skip: bool,
    ) -> Result<Option<String>, ExecError> {
        let mut env = self.env();
        env.dry_run = dry_run;
        executor::execute(&mut env, call, None, data, should_skip)
    }

    fn env(&mut self) -> executor::Env<'_> {
        executor::Env {
            registry: &self.registry,
            resolver: self.bundle.as_ref(),
            fixtures: self.fixtures.as_deref(),
            listeners: &mut self.listeners,
            dry_run: self.dry_run,
        }
    }
}

/// Free-standing so `run_feature` can hold disjoint borrows of a feature's
/// backgrounds and scenarios while the runner is borrowed mutably.
fn run_scenario_inner(
    runner: &mut Runner,
    background: Option<&Scenario>,
    scenario: &mut Scenario,
    data: &TestData,
) -> Result<(), ExecError> {
    scenario.exception = None;
    tracing::info!(scenario = %scenario.name, "running scenario");

    for row in scenario.run_rows() {
        let mut row_data = data.clone();
        for (key, value) in row {
            let _ = row_data.insert(key, value);
        }

        // Walk every step even after a failure so skip records are produced;
        // only the first failure of the scenario is kept.
        let mut row_exception: Option<ExecError> = None;
        let steps = background
            .map(|b| b.steps.as_slice())
            .unwrap_or(&[])
            .iter()
            .chain(scenario.steps.iter());
        for step in steps {
            let mut env = runner.env();
            let outcome = executor::execute(
                &mut env,
                &step.text,
                step.table.as_ref(),
                &row_data,
                row_exception.is_some(),
            );
            if let Err(e) = outcome {
                if row_exception.is_none() {
                    row_exception = Some(e);
                }
            }
        }
        if scenario.exception.is_none() {
            scenario.exception = row_exception;
        }
    }

    match &scenario.exception {
        Some(e) => Err(e.clone()),
        None => Ok(()),
    }
}
