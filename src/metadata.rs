// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag and metadata collection.
//!
//! Annotation lines (`@smoke @env:prod`) accumulate into a [`Metadata`]
//! value: an ordered tag set plus an ordered `key:value` map. The parser
//! keeps one *pending* [`Metadata`] which absorbs consecutive tag lines and
//! is consumed by the next structural header.

use std::{fmt, mem};

use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

use crate::resolve::Bundle;

/// Ordered tag set plus `key:value` annotations of a feature, scenario,
/// background or examples block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Metadata {
    /// Bare tags (`@smoke`), in source order, without duplicates.
    pub groups: Vec<String>,

    /// `@key:value` pairs, in source order; a repeated key keeps the last
    /// value.
    pub values: LinkedHashMap<String, String>,
}

impl Metadata {
    /// Creates an empty [`Metadata`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one `@`-prefixed annotation line into this [`Metadata`].
    ///
    /// Tokens are the `@`-separated chunks of the line: a token containing a
    /// `:` becomes a `key:value` pair (first `:` splits), anything else a
    /// bare tag. Repeated bare tags are ignored.
    pub fn collect_tag_line(&mut self, line: &str) {
        for token in line.split('@') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            if let Some((key, value)) = token.split_once(':') {
                let _ = self.values.insert(key.to_owned(), value.to_owned());
            } else if !self.groups.iter().any(|g| g == token) {
                self.groups.push(token.to_owned());
            }
        }
    }

    /// Returns a copy of `self` with `pending` applied on top: pending
    /// key/value pairs win per key, and a pending block carrying any tags
    /// replaces the inherited tag set outright.
    #[must_use]
    pub fn merged_with(&self, pending: &Self) -> Self {
        let mut merged = self.clone();
        merged.apply(pending);
        merged
    }

    /// Applies `other` on top of `self` (see [`Metadata::merged_with()`]).
    pub fn apply(&mut self, other: &Self) {
        if !other.groups.is_empty() {
            self.groups = other.groups.clone();
        }
        for (key, value) in &other.values {
            let _ = self.values.insert(key.clone(), value.clone());
        }
    }

    /// Takes the accumulated value out, leaving `self` empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Indicates whether no tags and no key/value pairs were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.values.is_empty()
    }

    /// Indicates whether the given bare tag was collected.
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Returns the value collected for the given key, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Checks this [`Metadata`] as an environment selector against the
    /// active environment: every `key:value` pair must be present in the
    /// [`Bundle`] with an equal value. An empty selector always matches;
    /// bare tags don't participate.
    #[must_use]
    pub fn matches_env(&self, bundle: &Bundle) -> bool {
        self.values
            .iter()
            .all(|(key, value)| bundle.get(key).as_deref() == Some(value))
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .groups
            .iter()
            .map(|g| format!("@{g}"))
            .chain(self.values.iter().map(|(k, v)| format!("@{k}:{v}")))
            .join(" ");
        write!(f, "{rendered}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_tags_and_key_value_pairs() {
        let mut meta = Metadata::new();
        meta.collect_tag_line("@smoke @env:prod @scope:feature");
        assert_eq!(meta.groups, vec!["smoke"]);
        assert_eq!(meta.get("env"), Some("prod"));
        assert_eq!(meta.get("scope"), Some("feature"));
    }

    #[test]
    fn tag_collection_is_associative_across_lines() {
        let mut split_one = Metadata::new();
        split_one.collect_tag_line("@a @b");
        split_one.collect_tag_line("@c");

        let mut split_two = Metadata::new();
        split_two.collect_tag_line("@a");
        split_two.collect_tag_line("@b @c");

        assert_eq!(split_one, split_two);
    }

    #[test]
    fn repeated_tags_are_kept_once() {
        let mut meta = Metadata::new();
        meta.collect_tag_line("@smoke @smoke @regression @smoke");
        assert_eq!(meta.groups, vec!["smoke", "regression"]);
    }

    #[test]
    fn value_with_colon_splits_on_first() {
        let mut meta = Metadata::new();
        meta.collect_tag_line("@url:http://example.test");
        assert_eq!(meta.get("url"), Some("http://example.test"));
    }

    #[test]
    fn pending_values_override_and_tags_replace() {
        let mut inherited = Metadata::new();
        inherited.collect_tag_line("@smoke @env:dev @author:core");

        let mut pending = Metadata::new();
        pending.collect_tag_line("@regression @env:prod");

        let merged = inherited.merged_with(&pending);
        assert_eq!(merged.groups, vec!["regression"]);
        assert_eq!(merged.get("env"), Some("prod"));
        assert_eq!(merged.get("author"), Some("core"));
    }

    #[test]
    fn merge_without_pending_tags_keeps_inherited_ones() {
        let mut inherited = Metadata::new();
        inherited.collect_tag_line("@smoke");

        let mut pending = Metadata::new();
        pending.collect_tag_line("@env:prod");

        let merged = inherited.merged_with(&pending);
        assert_eq!(merged.groups, vec!["smoke"]);
    }

    #[test]
    fn env_matching_compares_key_value_pairs_only() {
        let bundle = Bundle::new();
        bundle.set("env", "prod");

        let mut selector = Metadata::new();
        selector.collect_tag_line("@ignored-tag @env:prod");
        assert!(selector.matches_env(&bundle));

        let mut mismatch = Metadata::new();
        mismatch.collect_tag_line("@env:dev");
        assert!(!mismatch.matches_env(&bundle));

        assert!(Metadata::new().matches_env(&bundle));
    }

    #[test]
    fn take_leaves_the_pending_block_empty() {
        let mut meta = Metadata::new();
        meta.collect_tag_line("@smoke");
        let taken = meta.take();
        assert!(taken.has_group("smoke"));
        assert!(meta.is_empty());
    }

    #[test]
    fn display_renders_annotation_syntax() {
        let mut meta = Metadata::new();
        meta.collect_tag_line("@smoke @env:prod");
        assert_eq!(meta.to_string(), "@smoke @env:prod");
    }
}
