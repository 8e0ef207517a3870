// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The step registry: an append-only, process-wide collection of registered
//! step implementations.
//!
//! Lookup scans entries in registration order and the first full match wins.
//! No ambiguity detection is performed: two patterns matching the same text
//! is an accepted property of the dialect, and which one runs is determined
//! solely by registration order.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use linked_hash_map::LinkedHashMap;

use crate::{
    error::{PatternError, StepFailure},
    tracker::StepTracker,
};

use super::{
    context::{ParamSource, ParamSpec},
    location::Location,
    pattern,
};

/// A registered step implementation.
pub type StepFn =
    Arc<dyn Fn(&mut StepTracker) -> Result<(), StepFailure> + Send + Sync>;

/// One registered step: a compiled matcher, its parameter table and the
/// implementation.
pub struct Entry {
    /// Display keyword (`Given`, `When`, ..., `Step`).
    pub keyword: String,

    /// The pattern text as declared.
    pub pattern: String,

    /// Where the step was declared; [`None`] for anonymous registrations,
    /// which are never deduplicated.
    pub location: Option<Location>,

    /// Declared parameters: capture groups first (in pattern order), then
    /// injected ones.
    pub params: Vec<ParamSpec>,

    regex: regex::Regex,
    func: StepFn,
}

impl Entry {
    /// Matches the full step text, returning captured named-group values in
    /// declaration order with surrounding quotes stripped.
    #[must_use]
    pub fn matches(&self, text: &str) -> Option<LinkedHashMap<String, String>> {
        let caps = self.regex.captures(text)?;
        let captured = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                caps.name(name).map(|m| {
                    (
                        name.to_owned(),
                        pattern::strip_quotes(m.as_str()).to_owned(),
                    )
                })
            })
            .collect();
        Some(captured)
    }

    /// Invokes the underlying implementation.
    ///
    /// # Errors
    ///
    /// Whatever the implementation fails with.
    pub fn invoke(
        &self,
        tracker: &mut StepTracker,
    ) -> Result<(), StepFailure> {
        (self.func)(tracker)
    }

    /// The entry as reported: keyword plus pattern.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.keyword, self.pattern)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("keyword", &self.keyword)
            .field("pattern", &self.pattern)
            .field("location", &self.location)
            .field("params", &self.params)
            .field("func", &format_args!("{:p}", Arc::as_ptr(&self.func)))
            .finish()
    }
}

/// Process-wide, append-only collection of registered steps.
///
/// `register` calls are serialized behind a write lock (registrations are
/// rare and short); lookups are read-only and safe for concurrent readers.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<Vec<Arc<Entry>>>,
}

impl Registry {
    /// Creates an empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts registering a step with the default `Step` keyword.
    #[must_use]
    pub fn step(&self, pattern: impl Into<String>) -> EntryBuilder<'_> {
        EntryBuilder {
            registry: self,
            keyword: "Step".to_owned(),
            pattern: pattern.into(),
            location: None,
            injects: Vec::new(),
        }
    }

    /// Starts registering a step displayed with the `Given` keyword.
    #[must_use]
    pub fn given(&self, pattern: impl Into<String>) -> EntryBuilder<'_> {
        self.step(pattern).keyword("Given")
    }

    /// Starts registering a step displayed with the `When` keyword.
    #[must_use]
    pub fn when(&self, pattern: impl Into<String>) -> EntryBuilder<'_> {
        self.step(pattern).keyword("When")
    }

    /// Starts registering a step displayed with the `Then` keyword.
    #[must_use]
    pub fn then(&self, pattern: impl Into<String>) -> EntryBuilder<'_> {
        self.step(pattern).keyword("Then")
    }

    /// Returns the first entry (in registration order) matching the full
    /// step text, along with its captured arguments.
    #[must_use]
    pub fn lookup(
        &self,
        text: &str,
    ) -> Option<(Arc<Entry>, LinkedHashMap<String, String>)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find_map(|entry| {
                entry.matches(text).map(|args| (Arc::clone(entry), args))
            })
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Indicates whether nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an entry unless an identical (pattern, location) pair is
    /// already present. Returns whether the entry was added.
    fn insert(&self, entry: Entry) -> bool {
        let mut entries =
            self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entry.location.is_some()
            && entries.iter().any(|existing| {
                existing.pattern == entry.pattern
                    && existing.location == entry.location
            })
        {
            // Same step module imported twice.
            return false;
        }
        tracing::debug!(
            pattern = %entry.pattern,
            location = ?entry.location,
            "registered step"
        );
        entries.push(Arc::new(entry));
        true
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries =
            self.entries.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Registry")
            .field(
                "entries",
                &entries.iter().map(|e| &e.pattern).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder finalizing one step registration.
#[derive(Debug)]
pub struct EntryBuilder<'r> {
    registry: &'r Registry,
    keyword: String,
    pattern: String,
    location: Option<Location>,
    injects: Vec<ParamSpec>,
}

impl EntryBuilder<'_> {
    /// Sets the display keyword.
    #[must_use]
    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Sets the declaration location, enabling (pattern, location) dedup.
    #[must_use]
    pub fn location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Declares a non-captured parameter and where its value comes from.
    #[must_use]
    pub fn inject(
        mut self,
        name: impl Into<String>,
        source: ParamSource,
    ) -> Self {
        self.injects.push(ParamSpec::new(name, source));
        self
    }

    /// Compiles the pattern and registers the implementation.
    ///
    /// Returns whether a new entry was added; re-registering the identical
    /// (pattern, location) pair is a silent no-op yielding `Ok(false)`.
    ///
    /// # Errors
    ///
    /// [`PatternError`] if the pattern doesn't compile.
    pub fn handler<F>(self, func: F) -> Result<bool, PatternError>
    where
        F: Fn(&mut StepTracker) -> Result<(), StepFailure>
            + Send
            + Sync
            + 'static,
    {
        let (regex, names) = pattern::compile(&self.pattern)?;
        let mut params: Vec<ParamSpec> = names
            .into_iter()
            .map(|name| ParamSpec::new(name, ParamSource::CaptureGroup))
            .collect();
        params.extend(self.injects);
        Ok(self.registry.insert(Entry {
            keyword: self.keyword,
            pattern: self.pattern,
            location: self.location,
            params,
            regex,
            func: Arc::new(func),
        }))
    }
}
