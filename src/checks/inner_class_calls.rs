// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;

use crate::ast::{Expr, Node, NodeKind};
use crate::diagnostics::Severity;
use crate::registry::{Check, CheckContext, CheckMetadata};
use crate::semantic::{SymbolId, TypeId};
use crate::visit::SubtreeVisitor;

/// Unqualified calls, inside an inner class, to a method the inner class
/// inherits while the outer class declares a member of the same name.
pub struct InnerClassCallsCheck {
    metadata: CheckMetadata,
}

impl InnerClassCallsCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata {
                key: "S2388",
                name: "Inner class calls to super class methods should be unambiguous",
                severity: Severity::Major,
                tags: &["pitfall"],
            },
        }
    }
}

impl Default for InnerClassCallsCheck {
    fn default() -> Self {
        Self::new()
    }
}

struct InnerClass {
    ty: TypeId,
    outer: SymbolId,
    outer_ty: TypeId,
}

impl Check for InnerClassCallsCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn nodes_to_visit(&self) -> &'static [NodeKind] {
        &[NodeKind::Class, NodeKind::Interface]
    }

    fn visit_node<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) -> Result<()> {
        let Node::Class(class) = node else {
            return Ok(());
        };
        let unit = ctx.unit();
        let model = ctx.model();

        let Some(symbol) = unit.class_symbol(class) else {
            return Ok(());
        };
        let Some(outer) = model.owner(symbol).filter(|o| model.is_type_symbol(*o)) else {
            return Ok(());
        };
        let (Some(ty), Some(outer_ty)) = (model.declared_type(symbol), model.declared_type(outer))
        else {
            return Ok(());
        };
        let extends_outer = model
            .superclass(ty)
            .is_some_and(|superclass| model.erasure(superclass) == outer_ty);
        if extends_outer {
            return Ok(());
        }
        let inner = InnerClass {
            ty,
            outer,
            outer_ty,
        };

        // Nested classes of this one are visited on their own.
        let mut flagged = vec![];
        SubtreeVisitor::skipping_nested_types().for_each_expr(node, &mut |expr| {
            if let Expr::Call { callee, .. } = expr.as_ref() {
                if let Expr::Ident { name, .. } = callee.as_ref() {
                    if ambiguous(ctx, &inner, unit.symbol_of(expr)) {
                        flagged.push((expr, name.clone()));
                    }
                }
            }
            Ok(())
        })?;

        for (call, name) in flagged {
            ctx.report(
                Node::Expr(call),
                format!("Prefix this call to \"{name}\" with \"super.\"."),
            );
        }
        Ok(())
    }
}

fn ambiguous(ctx: &CheckContext<'_>, inner: &InnerClass, method: Option<SymbolId>) -> bool {
    let model = ctx.model();
    let Some(method) = method.filter(|m| model.is_method_symbol(*m)) else {
        return false;
    };
    let Some(declaring) = model
        .enclosing_type(method)
        .and_then(|owner| model.declared_type(owner))
    else {
        return false;
    };

    // Identity of declarations, not structural equality of types.
    let inherited = !model.symbol(method).is_static
        && model.is_subtype(inner.ty, declaring)
        && declaring != inner.outer_ty
        && declaring != inner.ty;

    inherited && !model.member_named(inner.outer, &model.symbol(method).name).is_empty()
}
