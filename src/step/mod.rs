// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step registry: pattern-to-implementation bindings.
//!
//! Step-definition modules register their implementations into a
//! [`Registry`] at load time; the execution engine resolves parsed step text
//! back to an [`Entry`] through [`Registry::lookup()`].

pub mod context;
pub mod location;
pub mod pattern;
pub mod registry;

#[doc(inline)]
pub use self::{
    context::{FixtureResolver, ParamSource, ParamSpec, Value},
    location::Location,
    registry::{Entry, EntryBuilder, Registry, StepFn},
};
