// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;

use crate::ast::{Expr, Node, NodeKind};
use crate::diagnostics::Severity;
use crate::registry::{Check, CheckContext, CheckMetadata};

/// Query strings built from values the method does not control, passed to
/// a SQL or ORM query API.
pub struct SqlInjectionCheck {
    metadata: CheckMetadata,
}

impl SqlInjectionCheck {
    pub fn new() -> Self {
        Self {
            metadata: CheckMetadata {
                key: "S2077",
                name: "Values passed to SQL commands should be sanitized",
                severity: Severity::Critical,
                tags: &[
                    "cwe",
                    "hibernate",
                    "injection",
                    "owasp-top10",
                    "sans-top25",
                    "security",
                    "sql",
                ],
            },
        }
    }
}

impl Default for SqlInjectionCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Check for SqlInjectionCheck {
    fn metadata(&self) -> &CheckMetadata {
        &self.metadata
    }

    fn nodes_to_visit(&self) -> &'static [NodeKind] {
        &[NodeKind::MethodInvocation]
    }

    fn visit_node<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) -> Result<()> {
        let Node::Expr(call) = node else {
            return Ok(());
        };
        let Expr::Call { callee, args, .. } = call.as_ref() else {
            return Ok(());
        };
        let (Expr::Select { target, name, .. }, Some(query)) = (callee.as_ref(), args.first())
        else {
            return Ok(());
        };
        let Some(receiver) = ctx.unit().type_of(target) else {
            return Ok(());
        };
        let Some(sink) = ctx.catalog().match_sink(ctx.model(), receiver, name) else {
            return Ok(());
        };

        let classification = ctx.propagator().classify(query, &ctx.sink_context());
        if !classification.is_unsafe() {
            return Ok(());
        }
        let message = match (&sink.remediation, &classification.witness) {
            (Some(remediation), _) => remediation.clone(),
            (None, Some(witness)) => format!(
                "\"{}\" is provided externally to the method and not sanitized before use.",
                witness.name
            ),
            (None, None) => "The query is built from values that are not sanitized.".to_string(),
        };
        ctx.report(node, message);
        Ok(())
    }
}
