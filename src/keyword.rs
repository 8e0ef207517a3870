// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Keyword tables and the line classifier.
//!
//! [`classify()`] maps a single trimmed, non-empty, non-comment source line
//! to a [`StatementKind`]; everything downstream of it (the collector state
//! machine, the document model) dispatches on that kind and never re-inspects
//! raw text.

use lazy_regex::regex;

/// Characters opening a single-line comment when first on a trimmed line.
pub const COMMENT_CHARS: &[char] = &['#', '!'];

/// Token opening *and* closing a multiline comment block.
pub const TRIPLE_QUOTE: &str = "\"\"\"";

/// Step keywords, matched case-insensitively at the start of a line.
pub const STEP_KEYWORDS: &[&str] =
    &["given", "when", "then", "and", "but", "step"];

/// Tag group marking a `Scenario:` block as a reusable step definition.
pub const STEP_GROUP: &str = "step";

/// Metadata key carrying a background's scope (`global` inherits feature
/// metadata).
pub const SCOPE_KEY: &str = "scope";

/// Kind of a single feature-file statement.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    /// `@tag` / `@key:value` annotation line.
    Tag,
    /// `Feature:` header.
    Feature,
    /// `Background:` header.
    Background,
    /// `Scenario:` header.
    Scenario,
    /// `Scenario Outline:` header.
    ScenarioOutline,
    /// `STEP-DEF:` header declaring a reusable composite step.
    StepDef,
    /// `Examples:` header.
    Examples,
    /// A line opening a `"""` block (nothing but the delimiter, or the
    /// delimiter followed by text).
    CommentOpen,
    /// A line *ending* in `"""` that carries other content, closing a block.
    CommentEnd,
    /// `|`-delimited data-table row.
    DataRow,
    /// Executable step line (`Given`/`When`/`Then`/`And`/`But`/`Step`).
    Step,
    /// Anything else. A hard parse error unless the active collector accepts
    /// raw content (multiline comments).
    Unknown,
}

/// Structural header keywords in match order: longer prefixes first, so
/// `Scenario Outline` wins over `Scenario`.
const HEADERS: &[(&str, StatementKind)] = &[
    ("scenario outline", StatementKind::ScenarioOutline),
    ("scenario", StatementKind::Scenario),
    ("step-def", StatementKind::StepDef),
    ("examples", StatementKind::Examples),
    ("feature", StatementKind::Feature),
    ("background", StatementKind::Background),
];

/// Classifies a trimmed, non-empty, non-comment line.
///
/// The close-delimiter test runs first: a line ending in `"""` that contains
/// any non-`"` character closes a multiline comment, while a line consisting
/// solely of the delimiter *opens* one.
#[must_use]
pub fn classify(stmt: &str) -> StatementKind {
    if stmt.ends_with(TRIPLE_QUOTE) && stmt.chars().any(|c| c != '"') {
        return StatementKind::CommentEnd;
    }
    if stmt.starts_with('@') {
        return StatementKind::Tag;
    }
    for (prefix, kind) in HEADERS {
        if has_prefix_ci(stmt, prefix) {
            return *kind;
        }
    }
    if stmt.starts_with(TRIPLE_QUOTE) {
        return StatementKind::CommentOpen;
    }
    if stmt.len() >= 2 && stmt.starts_with('|') && stmt.ends_with('|') {
        return StatementKind::DataRow;
    }
    if split_step(stmt).is_some() {
        return StatementKind::Step;
    }
    StatementKind::Unknown
}

/// Splits a step line into its keyword (original casing preserved) and the
/// remaining text, trimmed.
///
/// Returns [`None`] if the line doesn't begin with a step keyword.
#[must_use]
pub fn split_step(stmt: &str) -> Option<(&str, &str)> {
    let m = regex!(r"(?i)^(given|when|then|and|but|step)\b").find(stmt)?;
    Some((&stmt[..m.end()], stmt[m.end()..].trim()))
}

/// Extracts a structural header's name: the remainder of the line after the
/// first `:`, trimmed. Empty names are allowed.
#[must_use]
pub fn header_name(stmt: &str) -> Option<&str> {
    stmt.split_once(':').map(|(_, name)| name.trim())
}

fn has_prefix_ci(stmt: &str, prefix: &str) -> bool {
    stmt.get(..prefix.len())
        .map_or(false, |head| head.eq_ignore_ascii_case(prefix))
}
