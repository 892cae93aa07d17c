// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Routing of tree nodes to checks.
//!
//! Each check declares up front the node kinds it wants to see. The registry
//! turns those declarations into a kind -> checks table once, then walks every
//! unit a single time, handing each node to the checks subscribed to its
//! kind. Checks never walk the whole tree themselves.

use std::collections::BTreeMap;

use anyhow::Result;
use thiserror::Error;

use crate::ast::{ClassDecl, MethodDecl, Node, NodeKind, Ref, Span};
use crate::catalog::ApiCatalog;
use crate::constancy::{ConstancyPropagator, SinkContext};
use crate::diagnostics::{CheckFailure, Diagnostic, Severity};
use crate::semantic::SemanticModel;
use crate::unit::ResolvedUnit;
use crate::visit::for_each_child;

/// Errors that can occur when building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{registry} registration failed: An item with the name '{name}' is already registered.")]
    AlreadyExists { name: String, registry: String },

    #[error("{registry} registration failed: The name '{name}' is invalid (empty or whitespace-only names are not allowed).")]
    InvalidName { name: String, registry: String },

    #[error("{registry} registration failed: '{name}' does not subscribe to any node kind.")]
    NoSubscriptions { name: String, registry: String },
}

/// Validates that a name is not empty or whitespace-only.
pub fn validate_name(name: &str, registry_name: &str) -> Result<(), RegistryError> {
    if name.trim().is_empty() {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
            registry: registry_name.to_string(),
        })
    } else {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckMetadata {
    /// Stable rule key, e.g. `S2077`.
    pub key: &'static str,
    pub name: &'static str,
    pub severity: Severity,
    pub tags: &'static [&'static str],
}

/// A detector. Checks hold no state between nodes.
pub trait Check: Send + Sync {
    fn metadata(&self) -> &CheckMetadata;

    /// Node kinds this check is invoked on. Fixed for the lifetime of the
    /// check.
    fn nodes_to_visit(&self) -> &'static [NodeKind];

    fn visit_node<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) -> Result<()>;
}

#[derive(Clone, Copy, Debug)]
enum Scope<'a> {
    Class(&'a Ref<ClassDecl>),
    Method(&'a Ref<MethodDecl>),
}

#[derive(Clone, Copy)]
struct Reporter {
    rule: &'static str,
    severity: Severity,
}

/// What a check sees of the pass while it visits a node.
pub struct CheckContext<'a> {
    unit: &'a ResolvedUnit,
    catalog: &'a ApiCatalog,
    max_trace_depth: usize,
    scopes: Vec<Scope<'a>>,
    reporter: Option<Reporter>,
    diagnostics: Vec<Diagnostic>,
    failures: Vec<CheckFailure>,
}

impl<'a> CheckContext<'a> {
    fn new(unit: &'a ResolvedUnit, catalog: &'a ApiCatalog, max_trace_depth: usize) -> Self {
        Self {
            unit,
            catalog,
            max_trace_depth,
            scopes: vec![],
            reporter: None,
            diagnostics: vec![],
            failures: vec![],
        }
    }

    pub fn unit(&self) -> &'a ResolvedUnit {
        self.unit
    }

    pub fn model(&self) -> &'a SemanticModel {
        self.unit.model()
    }

    pub fn catalog(&self) -> &'a ApiCatalog {
        self.catalog
    }

    pub fn propagator(&self) -> ConstancyPropagator<'a> {
        ConstancyPropagator::new(self.unit, self.catalog, self.max_trace_depth)
    }

    /// Classification context of the node being visited.
    pub fn sink_context(&self) -> SinkContext<'a> {
        SinkContext {
            method: self.enclosing_method(),
        }
    }

    /// Method whose body directly contains the node being visited. `None`
    /// in field initializers and when a class declaration is closer.
    pub fn enclosing_method(&self) -> Option<&'a Ref<MethodDecl>> {
        match self.scopes.last() {
            Some(Scope::Method(method)) => Some(method),
            _ => None,
        }
    }

    /// All methods around the node being visited, innermost first, across
    /// class boundaries.
    pub fn enclosing_methods(&self) -> impl Iterator<Item = &'a Ref<MethodDecl>> + '_ {
        self.scopes.iter().rev().filter_map(|scope| match scope {
            Scope::Method(method) => Some(*method),
            Scope::Class(_) => None,
        })
    }

    pub fn enclosing_class(&self) -> Option<&'a Ref<ClassDecl>> {
        self.scopes.iter().rev().find_map(|scope| match scope {
            Scope::Class(class) => Some(*class),
            Scope::Method(_) => None,
        })
    }

    /// Record a diagnostic for `node` under the rule of the running check.
    pub fn report(&mut self, node: Node<'_>, message: impl Into<String>) {
        self.report_at(node.span(), node.kind(), message);
    }

    pub fn report_at(&mut self, span: Span, node_kind: NodeKind, message: impl Into<String>) {
        let Some(reporter) = self.reporter else {
            log::warn!("diagnostic reported outside of a check invocation was dropped");
            return;
        };
        self.diagnostics.push(Diagnostic {
            rule: reporter.rule,
            severity: reporter.severity,
            file: self.unit.file().to_string(),
            span,
            node_kind,
            message: message.into(),
        });
    }
}

/// Result of one registry pass over a unit, in emission order.
#[derive(Debug, Default)]
pub struct PassOutput {
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<CheckFailure>,
}

pub struct CheckRegistry {
    checks: Vec<Box<dyn Check>>,
    dispatch: BTreeMap<NodeKind, Vec<usize>>,
}

impl CheckRegistry {
    const NAME: &'static str = "check";

    pub fn new(checks: Vec<Box<dyn Check>>) -> Result<Self, RegistryError> {
        let mut dispatch: BTreeMap<NodeKind, Vec<usize>> = BTreeMap::new();
        let mut keys = BTreeMap::new();
        for (index, check) in checks.iter().enumerate() {
            let key = check.metadata().key;
            validate_name(key, Self::NAME)?;
            if keys.insert(key, index).is_some() {
                return Err(RegistryError::AlreadyExists {
                    name: key.to_string(),
                    registry: Self::NAME.to_string(),
                });
            }
            if check.nodes_to_visit().is_empty() {
                return Err(RegistryError::NoSubscriptions {
                    name: key.to_string(),
                    registry: Self::NAME.to_string(),
                });
            }
            for kind in check.nodes_to_visit() {
                let subscribers = dispatch.entry(*kind).or_default();
                if !subscribers.contains(&index) {
                    subscribers.push(index);
                }
            }
        }
        log::debug!(
            "check registry built: {} checks over {} node kinds",
            checks.len(),
            dispatch.len()
        );
        Ok(Self { checks, dispatch })
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|check| check.metadata().key)
    }

    /// Keys of the checks subscribed to `kind`.
    pub fn subscribers(&self, kind: NodeKind) -> Vec<&'static str> {
        self.dispatch
            .get(&kind)
            .map(|indices| {
                indices
                    .iter()
                    .map(|index| self.checks[*index].metadata().key)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Walk `unit` once, pre-order, dispatching every node.
    pub fn run(
        &self,
        unit: &ResolvedUnit,
        catalog: &ApiCatalog,
        max_trace_depth: usize,
    ) -> PassOutput {
        let mut ctx = CheckContext::new(unit, catalog, max_trace_depth);
        self.walk(Node::Unit(unit.tree()), &mut ctx);
        PassOutput {
            diagnostics: ctx.diagnostics,
            failures: ctx.failures,
        }
    }

    fn walk<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) {
        self.dispatch(node, ctx);

        let scope = match node {
            Node::Class(class) => Some(Scope::Class(class)),
            Node::Method(method) => Some(Scope::Method(method)),
            _ => None,
        };
        if let Some(scope) = scope {
            ctx.scopes.push(scope);
        }
        let walked = for_each_child(node, &mut |child| {
            self.walk(child, ctx);
            Ok(())
        });
        if let Err(err) = walked {
            log::warn!("traversal of {:?} at {} stopped: {err}", node.kind(), node.span());
        }
        if scope.is_some() {
            ctx.scopes.pop();
        }
    }

    fn dispatch<'a>(&self, node: Node<'a>, ctx: &mut CheckContext<'a>) {
        let Some(indices) = self.dispatch.get(&node.kind()) else {
            return;
        };
        for index in indices {
            let check = &self.checks[*index];
            let metadata = check.metadata();
            ctx.reporter = Some(Reporter {
                rule: metadata.key,
                severity: metadata.severity,
            });
            if let Err(err) = check.visit_node(node, ctx) {
                log::warn!(
                    "{}: check {} failed at {}: {err:#}",
                    ctx.unit.file(),
                    metadata.key,
                    node.span()
                );
                ctx.failures.push(CheckFailure {
                    rule: metadata.key,
                    span: node.span(),
                    error: format!("{err:#}"),
                });
            }
        }
        ctx.reporter = None;
    }
}
