// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Per-invocation step tracking and outcome callbacks.
//!
//! A [`StepTracker`] is created fresh for every step call and mutated only
//! by the execution engine and by the implementation itself (to request a
//! retry or record a result). [`StepListener`] is the narrow callback
//! surface a host runner observes outcomes through.

use std::time::Duration;

use derive_more::Display;
use linked_hash_map::LinkedHashMap;

use crate::{error::StepFailure, step::Value};

/// Status of one step invocation.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum StepStatus {
    /// Not yet invoked.
    #[default]
    #[display("pending")]
    Pending,

    /// Currently inside the implementation.
    #[display("executing")]
    Executing,

    /// Finished without failure.
    #[display("passed")]
    Passed,

    /// The implementation failed.
    #[display("failed")]
    Failed,
}

/// Per-invocation record of a step call.
#[derive(Clone, Debug)]
pub struct StepTracker {
    /// Pattern of the matched registry entry.
    pub name: String,

    /// The step as reported: display keyword plus resolved text.
    pub display_name: String,

    /// Resolved positional arguments (a step's attached data table arrives
    /// here as a trailing [`Value::Table`]).
    pub args: Vec<Value>,

    /// Resolved keyword arguments, in parameter-declaration order.
    pub kwargs: LinkedHashMap<String, Value>,

    /// Whether this invocation runs in dry-run mode (resolution only, the
    /// implementation is never entered).
    pub dry_run: bool,

    /// Result value recorded by the implementation, if any.
    pub result: Option<String>,

    /// Failure of the most recent attempt, if any.
    pub exception: Option<StepFailure>,

    /// Status of the most recent attempt.
    pub status: StepStatus,

    /// Set by the implementation before returning to request another
    /// attempt. Reset by the engine before each attempt. There is no
    /// engine-imposed ceiling: an implementation that always sets it loops
    /// forever.
    pub retry: bool,

    /// Number of attempts made so far.
    pub invocation_count: u32,

    /// Wall-clock time spent across all attempts so far.
    pub elapsed: Duration,
}

impl StepTracker {
    /// Creates a fresh [`StepTracker`] for one step call.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            args: Vec::new(),
            kwargs: LinkedHashMap::new(),
            dry_run,
            result: None,
            exception: None,
            status: StepStatus::default(),
            retry: false,
            invocation_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns the bound value of a keyword argument.
    #[must_use]
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }

    /// Returns a keyword argument's textual value, if it is one.
    #[must_use]
    pub fn str_kwarg(&self, name: &str) -> Option<&str> {
        self.kwargs.get(name).and_then(Value::as_str)
    }

    /// Requests another attempt after the current one returns.
    pub fn request_retry(&mut self) {
        self.retry = true;
    }

    /// Records the step's result value.
    pub fn set_result(&mut self, result: impl Into<String>) {
        self.result = Some(result.into());
    }
}

/// Callback surface for observing step outcomes.
///
/// All hooks default to no-ops; a host runner implements the ones it cares
/// about and attaches the listener to a [`Runner`].
///
/// [`Runner`]: crate::runner::Runner
pub trait StepListener {
    /// Called before every attempt of a step invocation.
    fn before_step(&mut self, _tracker: &StepTracker) {}

    /// Called after every attempt, with the status and exception fields
    /// reflecting that attempt's outcome.
    fn after_step(&mut self, _tracker: &StepTracker) {}

    /// Called for a step that is walked but not executed because an earlier
    /// step of the same scenario already failed.
    fn step_skipped(&mut self, _step: &str) {}

    /// Called when no registry entry matches the resolved step text.
    fn step_not_found(&mut self, _step: &str) {}
}
