// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Argument values and parameter metadata for step invocations.
//!
//! Every entry carries a parameter table built once at registration time:
//! each declared parameter names its source, so binding at call time is a
//! plain table walk instead of per-call introspection.

use std::{any::Any, fmt, sync::Arc};

use linked_hash_map::LinkedHashMap;

/// Where a declared step parameter's value comes from, in binding priority
/// order for parameters not covered by captured groups.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParamSource {
    /// A named capture group of the step's matcher.
    CaptureGroup,

    /// The per-invocation context object (the tracker itself).
    Context,

    /// An instance for class-scoped steps, resolved through the configured
    /// fixture collaborator.
    SelfInstance,

    /// A host-runner-injected fixture value.
    Fixture,
}

/// One declared parameter of a step implementation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,

    /// Where its value comes from.
    pub source: ParamSource,
}

impl ParamSpec {
    /// Creates a new [`ParamSpec`].
    #[must_use]
    pub fn new(name: impl Into<String>, source: ParamSource) -> Self {
        Self { name: name.into(), source }
    }
}

/// A resolved argument value bound to a step invocation.
#[derive(Clone)]
pub enum Value {
    /// A captured (or otherwise textual) value.
    Str(String),

    /// A data table rendered as header-keyed maps, appended positionally
    /// when a step carries one.
    Table(Vec<LinkedHashMap<String, String>>),

    /// An opaque host-injected fixture value.
    Fixture(Arc<dyn Any + Send + Sync>),

    /// Marker for the injected per-invocation context (the tracker).
    Context,

    /// No value could be resolved.
    None,
}

impl Value {
    /// Returns the textual value, if this is a [`Value::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the table rows, if this is a [`Value::Table`].
    #[must_use]
    pub fn as_table(&self) -> Option<&[LinkedHashMap<String, String>]> {
        match self {
            Self::Table(rows) => Some(rows),
            _ => None,
        }
    }

    /// Downcasts a [`Value::Fixture`] to a concrete type.
    #[must_use]
    pub fn downcast_fixture<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Fixture(any) => Arc::clone(any).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Table(rows) => f.debug_tuple("Table").field(rows).finish(),
            Self::Fixture(any) => {
                write!(f, "Fixture({:p})", Arc::as_ptr(any))
            }
            Self::Context => write!(f, "Context"),
            Self::None => write!(f, "None"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => a == b,
            (Self::Fixture(a), Self::Fixture(b)) => Arc::ptr_eq(a, b),
            (Self::Context, Self::Context) | (Self::None, Self::None) => true,
            _ => false,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

/// Host-runner collaborator resolving fixture and instance injections.
pub trait FixtureResolver {
    /// Returns the value to inject for the given parameter name, if one is
    /// available.
    fn fixture(&self, name: &str) -> Option<Value>;
}
