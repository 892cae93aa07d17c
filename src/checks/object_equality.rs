// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;

use crate::ast::{Expr, MethodDecl, Node, NodeKind};
use crate::diagnostics::Severity;
use crate::registry::{Check, CheckContext, CheckMetadata};
use crate::semantic::model::{CLASS, OBJECT};
use crate::semantic::{SemanticModel, TypeId};
use crate::unit::ResolvedUnit;

/// `==` and `!=` applied to objects.
pub struct ObjectEqualityCheck {
    metadata: CheckMetadata,
}

impl ObjectEqualityCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata {
                key: "S1698",
                name: "Objects should be compared with \"equals()\"",
                severity: Severity::Major,
                tags: &["cert", "cwe"],
            },
        }
    }
}

impl Default for ObjectEqualityCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// `boolean equals(Object)`. A parameter of unresolved type is given the
/// benefit of the doubt.
fn is_equals_method(unit: &ResolvedUnit, method: &MethodDecl) -> bool {
    let [param] = method.params.as_slice() else {
        return false;
    };
    method.name == "equals"
        && match param.ty.as_deref() {
            None => true,
            Some(ty) => {
                ty == OBJECT
                    || unit
                        .model()
                        .resolve_type(ty)
                        .map_or(true, |ty| unit.model().is_unknown(ty))
            }
        }
}

fn is_excluded(model: &SemanticModel, ty: TypeId) -> bool {
    model.is_null_type(ty)
        || model.is_numeric(ty)
        || model.is_type_named(model.erasure(ty), CLASS)
        || model.is_enum(ty)
}

fn is_object(model: &SemanticModel, ty: TypeId) -> bool {
    model.is_class_like(ty) && !model.is_enum(ty)
}

impl Check for ObjectEqualityCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn nodes_to_visit(&self) -> &'static [NodeKind] {
        &[NodeKind::EqualTo, NodeKind::NotEqualTo]
    }

    fn visit_node<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) -> Result<()> {
        let Node::Expr(expr) = node else {
            return Ok(());
        };
        let Expr::Binary { lhs, rhs, .. } = expr.as_ref() else {
            return Ok(());
        };
        let unit = ctx.unit();
        if ctx.enclosing_methods().any(|method| is_equals_method(unit, method)) {
            return Ok(());
        }
        if lhs.is_null_literal() || rhs.is_null_literal() {
            return Ok(());
        }

        // Unknown operand types never produce a finding.
        let (Some(left), Some(right)) = (unit.type_of(lhs), unit.type_of(rhs)) else {
            return Ok(());
        };
        let model = ctx.model();
        if is_excluded(model, left) || is_excluded(model, right) {
            return Ok(());
        }
        if is_object(model, left) || is_object(model, right) {
            ctx.report(node, "Change this comparison to use the equals method.");
        }
        Ok(())
    }
}
