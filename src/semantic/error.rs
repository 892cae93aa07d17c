// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("type `{name}` is declared more than once")]
    DuplicateType { name: String },

    #[error("symbol key `{key}` is declared more than once")]
    DuplicateSymbol { key: String },

    #[error("type `{name}` names `{owner}` as its enclosing type, which is not declared")]
    UnknownOwner { name: String, owner: String },

    #[error("`{name}` is not a valid type name")]
    InvalidTypeName { name: String },
}
