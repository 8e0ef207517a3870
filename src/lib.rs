// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! BDD feature-file parser and step-execution engine.
//!
//! This crate parses a line-oriented, Gherkin-like dialect of feature files
//! into a [`Feature`] model and drives the resulting [`Scenario`]s against a
//! process-wide [`Registry`] of step implementations. The dialect supports
//! tags and `@key:value` metadata, [`Background`]s, data tables attached to
//! steps, environment-selected `Examples:` blocks, multiline `"""` comments
//! and reusable composite steps declared with `STEP-DEF:` right inside a
//! feature file.
//!
//! Test-runner integration, report writers and WebDriver/HTTP step
//! implementations are deliberately out of scope: the model plus the
//! [`Runner`]'s `execute` contract is the whole surface a host runner needs.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cornichon::{Bundle, Parser, Registry, Runner, TestData, location};
//!
//! let registry = Arc::new(Registry::new());
//! registry
//!     .given("a basket with '{count}' items")
//!     .location(location!())
//!     .handler(|tracker| {
//!         assert_eq!(tracker.str_kwarg("count"), Some("3"));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let bundle = Arc::new(Bundle::new());
//! let feature = Parser::new(Arc::clone(&registry), Arc::clone(&bundle))
//!     .parse_str(
//!         "Feature: Baskets\n\
//!          Scenario: Filling\n\
//!          Given a basket with '3' items\n",
//!         "baskets.feature",
//!     )
//!     .unwrap();
//!
//! let mut feature = feature;
//! let outcomes =
//!     Runner::new(registry, bundle).run_feature(&mut feature, &TestData::new());
//! assert!(outcomes.iter().all(|o| o.result.is_ok()));
//! ```
//!
//! [`Background`]: crate::ScenarioKind::Background

pub mod common_steps;
pub mod data_table;
pub mod error;
pub mod feature;
pub mod keyword;
pub mod metadata;
pub mod parser;
pub mod resolve;
pub mod runner;
pub mod step;
pub mod tracker;

pub use self::{
    data_table::DataTable,
    error::{
        Error, ExecError, ParseError, ParseErrorKind, PatternError, Result,
        StepFailure,
    },
    feature::{Examples, Feature, Scenario, ScenarioKind, Step, TestData},
    metadata::Metadata,
    parser::Parser,
    resolve::{Bundle, Resolver},
    runner::{Runner, ScenarioOutcome},
    step::{
        Entry, EntryBuilder, FixtureResolver, Location, ParamSource,
        ParamSpec, Registry, Value,
    },
    tracker::{StepListener, StepStatus, StepTracker},
};
