// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Placeholder resolution against a key/value context.
//!
//! The execution engine treats `${...}` interpolation as an external
//! collaborator behind the [`Resolver`] trait; [`Bundle`] is the built-in
//! implementation and doubles as the active environment context consulted
//! for `Examples:` selection.

use std::sync::{PoisonError, RwLock};

use lazy_regex::regex_replace_all;
use linked_hash_map::LinkedHashMap;

use crate::feature::TestData;

/// Recursion cap for properties referencing other properties.
const MAX_DEPTH: usize = 10;

/// Resolves `${...}` placeholders in step text against a key/value context.
pub trait Resolver {
    /// Returns `text` with every `${key}` reference substituted. Unresolved
    /// references are left verbatim.
    fn resolve(&self, text: &str, data: &TestData) -> String;
}

/// Thread-safe property store with `${...}` interpolation.
///
/// Lookup order is the per-call test data first, then the bundle's own
/// properties; property values are themselves resolved recursively, capped
/// at a fixed depth.
#[derive(Debug, Default)]
pub struct Bundle {
    props: RwLock<LinkedHashMap<String, String>>,
}

impl Bundle {
    /// Creates an empty [`Bundle`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a [`Bundle`] pre-populated from key/value pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let bundle = Self::new();
        for (key, value) in pairs {
            bundle.set(key, value);
        }
        bundle
    }

    /// Sets a property, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self
            .props
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Returns the raw (unresolved) value of a property, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.props
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Indicates whether a property is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.props
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    fn resolve_depth(&self, text: &str, data: &TestData, depth: usize) -> String {
        if depth >= MAX_DEPTH {
            return text.to_owned();
        }
        regex_replace_all!(r"\$\{([^}]+)\}", text, |whole: &str, key: &str| {
            if let Some(value) = data.get(key) {
                value.clone()
            } else if let Some(value) = self.get(key) {
                self.resolve_depth(&value, data, depth + 1)
            } else {
                whole.to_owned()
            }
        })
        .into_owned()
    }
}

impl Resolver for Bundle {
    fn resolve(&self, text: &str, data: &TestData) -> String {
        self.resolve_depth(text, data, 0)
    }
}
