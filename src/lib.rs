// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

pub mod ast;
pub mod catalog;
pub mod checks;
pub mod constancy;
pub mod diagnostics;
mod engine;
pub mod registry;
pub mod semantic;
pub mod unit;
pub mod visit;

#[cfg(feature = "arc")]
pub(crate) use std::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub(crate) use std::rc::Rc;

pub use diagnostics::{CheckFailure, Diagnostic, Severity};
pub use engine::{AnalysisOptions, AnalysisResult, Engine};
pub use unit::ResolvedUnit;

#[cfg(test)]
mod tests;
