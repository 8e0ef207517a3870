// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Single-step execution: resolution, lookup, binding and the retry loop.

use std::time::Instant;

use lazy_regex::regex_replace_all;

use crate::{
    data_table::DataTable,
    error::{ExecError, StepFailure},
    feature::TestData,
    resolve::Resolver,
    step::{FixtureResolver, ParamSource, Registry, Value},
    tracker::{StepListener, StepStatus, StepTracker},
};

/// Collaborators one step call executes against.
pub(crate) struct Env<'e> {
    pub registry: &'e Registry,
    pub resolver: &'e dyn Resolver,
    pub fixtures: Option<&'e dyn FixtureResolver>,
    pub listeners: &'e mut [Box<dyn StepListener>],
    pub dry_run: bool,
}

/// Executes one step call.
///
/// `call` is the keyword-stripped step text; `table` its attached data
/// table, if any. With `should_skip` set the step is walked (resolved and
/// looked up) but never invoked.
///
/// Returns the implementation's recorded result value on success.
pub(crate) fn execute(
    env: &mut Env<'_>,
    call: &str,
    table: Option<&DataTable>,
    data: &TestData,
    should_skip: bool,
) -> Result<Option<String>, ExecError> {
    let call = convert_params(call);
    let resolved = env.resolver.resolve(&call, data);

    let Some((entry, captured)) = env.registry.lookup(&resolved) else {
        tracing::error!(step = %resolved, "Step Not Found");
        for listener in env.listeners.iter_mut() {
            listener.step_not_found(&resolved);
        }
        if env.dry_run {
            return Ok(None);
        }
        return Err(ExecError::StepNotFound { step: resolved });
    };

    if should_skip {
        tracing::info!(step = %resolved, "step skipped");
        for listener in env.listeners.iter_mut() {
            listener.step_skipped(&resolved);
        }
        return Ok(None);
    }

    let mut tracker = StepTracker::new(
        entry.pattern.clone(),
        format!("{} {resolved}", entry.keyword),
        env.dry_run,
    );
    for (name, value) in &captured {
        let _ = tracker.kwargs.insert(name.clone(), Value::Str(value.clone()));
    }
    for param in &entry.params {
        if tracker.kwargs.contains_key(&param.name) {
            continue;
        }
        let value = match param.source {
            ParamSource::CaptureGroup => Value::None,
            ParamSource::Context => Value::Context,
            ParamSource::SelfInstance | ParamSource::Fixture => env
                .fixtures
                .and_then(|f| f.fixture(&param.name))
                .unwrap_or(Value::None),
        };
        let _ = tracker.kwargs.insert(param.name.clone(), value);
    }
    if let Some(table) = table {
        tracker.args.push(Value::Table(table.hashes()));
    }

    // Binding happens exactly once; only the call itself is retried.
    let started = Instant::now();
    while tracker.invocation_count == 0 || tracker.retry {
        tracker.invocation_count += 1;
        for listener in env.listeners.iter_mut() {
            listener.before_step(&tracker);
        }
        tracker.status = StepStatus::Executing;
        tracker.retry = false;

        let outcome = if tracker.dry_run {
            Ok(())
        } else {
            entry.invoke(&mut tracker)
        };
        match outcome {
            Ok(()) => {
                tracker.status = StepStatus::Passed;
                tracker.elapsed = started.elapsed();
                for listener in env.listeners.iter_mut() {
                    listener.after_step(&tracker);
                }
                tracing::debug!(
                    step = %tracker.display_name,
                    status = %tracker.status,
                    attempts = tracker.invocation_count,
                    elapsed = %humantime::format_duration(tracker.elapsed),
                    "step finished"
                );
                return Ok(tracker.result);
            }
            Err(failure) => {
                tracker.exception = Some(failure);
                tracker.status = StepStatus::Failed;
                tracker.elapsed = started.elapsed();
                for listener in env.listeners.iter_mut() {
                    listener.after_step(&tracker);
                }
            }
        }
    }

    tracing::debug!(
        step = %tracker.display_name,
        status = %tracker.status,
        attempts = tracker.invocation_count,
        elapsed = %humantime::format_duration(tracker.elapsed),
        "step finished"
    );
    let failure = tracker
        .exception
        .take()
        .unwrap_or_else(|| StepFailure::new("step failed"));
    Err(ExecError::StepFailed { step: resolved, source: failure })
}

/// Rewrites `<name>` examples placeholders into `${name}` references so the
/// resolver substitutes them like any other property.
pub(crate) fn convert_params(call: &str) -> String {
    regex_replace_all!(r"<([a-z0-9_-]+)>", call, |_, name: &str| {
        format!("${{{name}}}")
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_placeholders_become_property_references() {
        assert_eq!(
            convert_params("login as <user> with <pass-word>"),
            "login as ${user} with ${pass-word}"
        );
    }

    #[test]
    fn uppercase_and_unrelated_angles_are_left_alone() {
        assert_eq!(convert_params("compare 1 < 2 > 0"), "compare 1 < 2 > 0");
        assert_eq!(convert_params("see <HTML>"), "see <HTML>");
    }
}
