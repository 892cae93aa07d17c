// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::Serialize;

use crate::ast::{MethodDecl, Ref, Span};

/// Ordered from most to least trustworthy; joining takes the maximum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constancy {
    StaticConstant,
    DynamicSafe,
    DynamicUnsafe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessOrigin {
    Parameter,
    Field,
    Call,
    Local,
    Unresolved,
    Expression,
}

/// Leaf expression held responsible for an unsafe classification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Witness {
    pub name: String,
    pub span: Span,
    pub origin: WitnessOrigin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub constancy: Constancy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
}

impl Classification {
    pub const fn constant() -> Self {
        Self {
            constancy: Constancy::StaticConstant,
            witness: None,
        }
    }

    pub const fn safe() -> Self {
        Self {
            constancy: Constancy::DynamicSafe,
            witness: None,
        }
    }

    pub fn unsafe_because(name: impl Into<String>, span: Span, origin: WitnessOrigin) -> Self {
        Self {
            constancy: Constancy::DynamicUnsafe,
            witness: Some(Witness {
                name: name.into(),
                span,
                origin,
            }),
        }
    }

    pub fn is_unsafe(&self) -> bool {
        self.constancy == Constancy::DynamicUnsafe
    }

    /// Worst of the two. On a tie the left operand wins, so the witness of
    /// a concatenation is its leftmost unsafe leaf.
    pub fn join(self, other: Self) -> Self {
        if other.constancy > self.constancy {
            other
        } else {
            self
        }
    }
}

/// Where the classified expression sits: the method whose body is searched
/// for definitions of locals.
#[derive(Clone, Copy, Debug, Default)]
pub struct SinkContext<'a> {
    pub method: Option<&'a Ref<MethodDecl>>,
}

impl<'a> SinkContext<'a> {
    pub fn in_method(method: &'a Ref<MethodDecl>) -> Self {
        Self {
            method: Some(method),
        }
    }

    pub fn detached() -> Self {
        Self { method: None }
    }
}
