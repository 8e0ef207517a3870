// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Built-in utility steps.
//!
//! A small set of generally useful steps feature authors can rely on
//! without writing any implementation code: logging a comment, storing a
//! value into the property bundle and verifying equality.

use std::sync::Arc;

use crate::{
    error::PatternError, location, resolve::Bundle, step::Registry,
};

/// Registers the built-in utility steps into `registry`.
///
/// Stored values land in (and verification reads resolve through) the given
/// `bundle`.
///
/// # Errors
///
/// [`PatternError`], not expected for the built-in patterns; surfaced for
/// uniformity with every other registration.
pub fn register_common_steps(
    registry: &Registry,
    bundle: &Arc<Bundle>,
) -> Result<(), PatternError> {
    let _ = registry
        .step("COMMENT: '{value}'")
        .location(location!())
        .handler(|tracker| {
            let value = tracker.str_kwarg("value").unwrap_or_default();
            tracing::info!(comment = %value, "comment step");
            Ok(())
        })?;

    let store_bundle = Arc::clone(bundle);
    let _ = registry
        .step("store '{val}' into '{var}'")
        .location(location!())
        .handler(move |tracker| {
            let val =
                tracker.str_kwarg("val").unwrap_or_default().to_owned();
            let var = tracker
                .str_kwarg("var")
                .filter(|v| !v.is_empty())
                .ok_or("missing variable name")?
                .to_owned();
            store_bundle.set(var, val);
            Ok(())
        })?;

    let _ = registry
        .then("verify '{actual}' equals '{expected}'")
        .location(location!())
        .handler(|tracker| {
            let actual = tracker.str_kwarg("actual").unwrap_or_default();
            let expected = tracker.str_kwarg("expected").unwrap_or_default();
            if actual == expected {
                tracker.set_result("passed");
                Ok(())
            } else {
                Err(format!("expected `{expected}`, got `{actual}`").into())
            }
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{feature::TestData, runner::Runner};

    fn runner() -> (Runner, Arc<Bundle>) {
        let registry = Arc::new(Registry::new());
        let bundle = Arc::new(Bundle::new());
        register_common_steps(&registry, &bundle).unwrap();
        (Runner::new(Arc::clone(&registry), Arc::clone(&bundle)), bundle)
    }

    #[test]
    fn store_puts_the_value_into_the_bundle() {
        let (mut runner, bundle) = runner();
        runner
            .execute_text("store 'hello' into 'greeting'", &TestData::new())
            .unwrap();
        assert_eq!(bundle.get("greeting").as_deref(), Some("hello"));
    }

    #[test]
    fn stored_values_resolve_in_later_steps() {
        let (mut runner, _bundle) = runner();
        runner
            .execute_text("store 'world' into 'name'", &TestData::new())
            .unwrap();
        runner
            .execute_text("verify '${name}' equals 'world'", &TestData::new())
            .unwrap();
    }

    #[test]
    fn verify_fails_on_mismatch() {
        let (mut runner, _bundle) = runner();
        let err = runner
            .execute_text("verify 'a' equals 'b'", &TestData::new())
            .unwrap_err();
        assert!(err.to_string().contains("expected `b`, got `a`"));
    }

    #[test]
    fn comment_step_is_registered() {
        let (mut runner, _bundle) = runner();
        runner
            .execute_text("COMMENT: 'just saying'", &TestData::new())
            .unwrap();
    }

    #[test]
    fn registration_is_idempotent_across_reimports() {
        let registry = Registry::new();
        let bundle = Arc::new(Bundle::new());
        register_common_steps(&registry, &bundle).unwrap();
        let registered = registry.len();
        register_common_steps(&registry, &bundle).unwrap();
        assert_eq!(registry.len(), registered);
    }
}
