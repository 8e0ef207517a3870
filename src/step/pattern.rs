// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step-pattern compilation.
//!
//! Step authors declare patterns in either of two forms, and both must be
//! supported:
//! - `{name}` placeholders in otherwise-literal text
//!   (`"store '{val}' into '{var}'"`): literal spans are regex-escaped and
//!   each placeholder becomes one non-greedy named capture group;
//! - inline regex with explicit named groups
//!   (`"^store '(?P<val>.+)' into '(?P<var>.+)'$"`), detected by a leading
//!   `^` anchor or a `(?P<` group.
//!
//! Either way the compiled matcher is anchored to the full step text.

use regex::Regex;

use crate::error::PatternError;

/// Compiles a step pattern into an anchored matcher plus its placeholder
/// names, in declaration order.
///
/// # Errors
///
/// [`PatternError`] on an unclosed placeholder, an invalid placeholder name,
/// or an inline regex the engine rejects.
pub fn compile(pattern: &str) -> Result<(Regex, Vec<String>), PatternError> {
    if is_inline_regex(pattern) {
        return compile_inline(pattern);
    }

    let mut source = String::from("^");
    let mut names = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                let _ = chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                let _ = chars.next();
                literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(PatternError::UnclosedPlaceholder {
                                pattern: pattern.to_owned(),
                            });
                        }
                    }
                }
                if !is_valid_name(&name) {
                    return Err(PatternError::InvalidPlaceholder {
                        pattern: pattern.to_owned(),
                        name,
                    });
                }
                source.push_str(&regex::escape(&literal));
                literal.clear();
                source.push_str(&format!("(?P<{name}>.*?)"));
                names.push(name);
            }
            other => literal.push(other),
        }
    }
    source.push_str(&regex::escape(&literal));
    source.push('$');

    let regex = Regex::new(&source).map_err(|source_err| {
        PatternError::Regex { pattern: pattern.to_owned(), source: source_err }
    })?;
    Ok((regex, names))
}

/// Strips the single quotes a pattern may have wrapped a captured value in.
///
/// Applied unconditionally to every captured value.
#[must_use]
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches('\'')
}

fn is_inline_regex(pattern: &str) -> bool {
    pattern.starts_with('^') || pattern.contains("(?P<")
}

fn compile_inline(pattern: &str) -> Result<(Regex, Vec<String>), PatternError> {
    let mut source = String::new();
    if !pattern.starts_with('^') {
        source.push('^');
    }
    source.push_str(pattern);
    if !pattern.ends_with('$') {
        source.push('$');
    }
    let regex = Regex::new(&source).map_err(|source_err| {
        PatternError::Regex { pattern: pattern.to_owned(), source: source_err }
    })?;
    let names =
        regex.capture_names().flatten().map(str::to_owned).collect();
    Ok((regex, names))
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_pattern_captures_named_groups() {
        let (regex, names) = compile("store '{val}' into '{var}'").unwrap();
        assert_eq!(names, vec!["val", "var"]);

        let caps = regex.captures("store 'x' into 'y'").unwrap();
        assert_eq!(&caps["val"], "x");
        assert_eq!(&caps["var"], "y");
    }

    #[test]
    fn placeholder_matching_is_anchored_to_the_full_text() {
        let (regex, _) = compile("open '{page}'").unwrap();
        assert!(regex.is_match("open 'home'"));
        assert!(!regex.is_match("open 'home' twice"));
        assert!(!regex.is_match("please open 'home'"));
    }

    #[test]
    fn literal_spans_are_escaped() {
        let (regex, _) = compile("wait 2.5 seconds (roughly)").unwrap();
        assert!(regex.is_match("wait 2.5 seconds (roughly)"));
        assert!(!regex.is_match("wait 2X5 seconds (roughly)"));
    }

    #[test]
    fn doubled_braces_are_literals() {
        let (regex, names) = compile("a {{literal}} brace").unwrap();
        assert!(names.is_empty());
        assert!(regex.is_match("a {literal} brace"));
    }

    #[test]
    fn inline_regex_keeps_its_groups_and_gets_anchored() {
        let (regex, names) =
            compile(r"sendKeys '(?P<text>.+)' into '(?P<loc>.+)'").unwrap();
        assert_eq!(names, vec!["text", "loc"]);
        let caps = regex.captures("sendKeys 'hi' into 'field'").unwrap();
        assert_eq!(&caps["text"], "hi");
        assert!(!regex.is_match("x sendKeys 'hi' into 'field'"));
    }

    #[test]
    fn explicitly_anchored_regex_is_left_alone() {
        let (regex, _) = compile(r"^exactly this$").unwrap();
        assert!(regex.is_match("exactly this"));
        assert!(!regex.is_match("exactly this and more"));
    }

    #[test]
    fn unclosed_placeholder_is_rejected() {
        let err = compile("store '{val' somewhere").unwrap_err();
        assert!(matches!(err, PatternError::UnclosedPlaceholder { .. }));
    }

    #[test]
    fn invalid_placeholder_name_is_rejected() {
        let err = compile("store '{va l}'").unwrap_err();
        assert!(matches!(err, PatternError::InvalidPlaceholder { .. }));
        let err = compile("store '{}'").unwrap_err();
        assert!(matches!(err, PatternError::InvalidPlaceholder { .. }));
    }

    #[test]
    fn quotes_are_stripped_from_captured_values() {
        assert_eq!(strip_quotes("'x'"), "x");
        assert_eq!(strip_quotes("x"), "x");
        assert_eq!(strip_quotes("it's"), "it's");
    }
}
