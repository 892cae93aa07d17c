// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;

use crate::ast::{AssignOp, Expr, ExprRef, Node, NodeKind};
use crate::diagnostics::Severity;
use crate::registry::{Check, CheckContext, CheckMetadata};
use crate::unit::ResolvedUnit;
use crate::visit::SubtreeVisitor;

/// Fields set to `null` inside `finalize()`.
pub struct FinalizerNullingCheck {
    metadata: CheckMetadata,
}

impl FinalizerNullingCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata {
                key: "S2165",
                name: "\"finalize\" should not set fields to \"null\"",
                severity: Severity::Major,
                tags: &["clumsy", "performance"],
            },
        }
    }
}

impl Default for FinalizerNullingCheck {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of the field assigned by `target`, written either as `name` or as
/// `this.name`.
fn assigned_field<'e>(unit: &ResolvedUnit, target: &'e ExprRef) -> Option<&'e str> {
    let name = match target.as_ref() {
        Expr::Ident { name, .. } => name,
        Expr::Select {
            target: qualifier,
            name,
            ..
        } if qualifier.is_this() => name,
        _ => return None,
    };
    let model = unit.model();
    let symbol = unit.symbol_of(target)?;
    let owner = model.owner(symbol)?;
    model.is_type_symbol(owner).then_some(name.as_str())
}

impl Check for FinalizerNullingCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn nodes_to_visit(&self) -> &'static [NodeKind] {
        &[NodeKind::Method]
    }

    fn visit_node<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) -> Result<()> {
        let Node::Method(method) = node else {
            return Ok(());
        };
        if method.name != "finalize" || !method.params.is_empty() {
            return Ok(());
        }
        let unit = ctx.unit();

        let mut nullified = vec![];
        SubtreeVisitor::skipping_nested_types().for_each_expr(node, &mut |expr| {
            if let Expr::Assign {
                op: AssignOp::Assign,
                target,
                value,
                ..
            } = expr.as_ref()
            {
                if value.is_null_literal() {
                    if let Some(field) = assigned_field(unit, target) {
                        nullified.push((expr, field));
                    }
                }
            }
            Ok(())
        })?;

        for (assignment, field) in nullified {
            ctx.report(
                Node::Expr(assignment),
                format!("Remove this nullification of \"{field}\"."),
            );
        }
        Ok(())
    }
}
