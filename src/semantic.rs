// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Symbol and type model of one resolved unit, and the queries detectors ask
//! of it.
//!
//! The model is produced upstream by the resolver and is read-only while a
//! unit is analysed. Every query is conservative: an unresolved type or
//! symbol answers `false` or empty, never an error, so that missing
//! information turns into fewer diagnostics rather than wrong ones.
//!
//! * `model.rs` holds the arenas and the builder used by the loader.
//! * `queries.rs` implements subtype, interface and member lookups.
//! * `loader.rs` turns a serde [`ModelDocument`] into a [`SemanticModel`].
//! * `error.rs` lists the ways a model document can be malformed.

pub mod error;
pub mod loader;
pub mod model;
pub mod queries;

pub use error::ModelError;
pub use loader::{MemberDocument, MemberKind, ModelDocument, TypeDocument, VariableDocument};
pub use model::{
    PrimitiveKind, SemanticModel, SymbolData, SymbolId, SymbolKind, TypeData, TypeId, TypeTag,
};
