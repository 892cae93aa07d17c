// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Constancy classification of expressions.
//!
//! The propagator decides whether the value of an expression is fixed at
//! compile time or assembled at run time and, in the latter case, whether
//! anything contributing to it may come from outside the method. Values are
//! followed backward through local definitions, concatenation, string
//! building calls and constant fields.
//!
//! * `model.rs` has the classification lattice and witnesses.
//! * `definitions.rs` finds the definitions of a local that reach a use.
//! * `propagator.rs` is the classifier itself.

pub mod definitions;
pub mod model;
pub mod propagator;

pub use model::{Classification, Constancy, SinkContext, Witness, WitnessOrigin};
pub use propagator::ConstancyPropagator;
