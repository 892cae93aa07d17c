// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;

use crate::ast::{AssignOp, Expr, ExprRef, MethodDecl, Node, Ref};
use crate::catalog::{ApiCatalog, CallEffect};
use crate::semantic::TypeId;
use crate::unit::ResolvedUnit;
use crate::visit::for_each_child;

/// Definitions of one local variable that reach a given use.
#[derive(Debug, Default)]
pub struct ReachingDefinitions<'a> {
    /// Right-hand side of the last plain definition (initializer or `=`).
    pub latest: Option<&'a ExprRef>,
    /// Values appended after `latest`: right-hand sides of compound
    /// assignments and arguments of builder mutations, in source order.
    pub updates: Vec<&'a ExprRef>,
}

fn strip_parens(expr: &ExprRef) -> &ExprRef {
    match expr.as_ref() {
        Expr::Paren { inner, .. } => strip_parens(inner),
        _ => expr,
    }
}

/// Types through which a call is looked up in the catalog: the static type
/// of the receiver, then the type declaring the invoked method.
pub fn call_candidates(unit: &ResolvedUnit, call: &Expr) -> Vec<TypeId> {
    let mut candidates = vec![];
    if let Expr::Call { callee, .. } = call {
        if let Expr::Select { target, .. } = callee.as_ref() {
            candidates.extend(unit.type_of(target));
        }
    }
    let model = unit.model();
    if let Some(declaring) = unit
        .symbol_of(call)
        .and_then(|method| model.enclosing_type(method))
        .and_then(|owner| model.declared_type(owner))
    {
        if !candidates.contains(&declaring) {
            candidates.push(declaring);
        }
    }
    candidates
}

struct DefinitionScan<'a, 'u> {
    unit: &'u ResolvedUnit,
    catalog: &'u ApiCatalog,
    key: &'u str,
    use_site: &'u ExprRef,
    // Whether the use may sit in a class declared inside the method.
    captured: bool,
    class_depth: usize,
    reached: bool,
    found: ReachingDefinitions<'a>,
}

impl<'a, 'u> DefinitionScan<'a, 'u> {
    fn names_variable(&self, expr: &ExprRef) -> bool {
        matches!(strip_parens(expr).as_ref(), Expr::Ident { symbol: Some(symbol), .. } if symbol == self.key)
    }

    /// Variable at the root of a chain of builder mutations such as
    /// `sb.append(a).append(b)`.
    fn mutation_root<'e>(&self, call: &'e ExprRef) -> Option<&'e ExprRef> {
        let Expr::Call { callee, .. } = strip_parens(call).as_ref() else {
            return Some(call).filter(|e| self.names_variable(e));
        };
        let Expr::Select { target, name, .. } = callee.as_ref() else {
            return None;
        };
        let effect = self.catalog.call_effect(
            self.unit.model(),
            &call_candidates(self.unit, strip_parens(call)),
            name,
        );
        match effect {
            Some(CallEffect::Mutate) => self.mutation_root(target),
            _ => None,
        }
    }

    fn visit(&mut self, node: Node<'a>) -> Result<()> {
        if self.reached {
            return Ok(());
        }
        match node {
            Node::Expr(expr) if expr == self.use_site => {
                self.reached = true;
                return Ok(());
            }
            // Definitions inside nested and anonymous classes run elsewhere.
            Node::Class(_) if !self.captured => return Ok(()),
            Node::Class(_) => {
                self.class_depth += 1;
                let walked = for_each_child(node, &mut |child| self.visit(child));
                self.class_depth -= 1;
                return walked;
            }
            _ => (),
        }

        for_each_child(node, &mut |child| self.visit(child))?;

        // A definition enclosing the use is not reaching it: in `s = s + x`
        // the right-hand `s` refers to the previous value.
        if !self.reached {
            self.record(node);
        }
        Ok(())
    }

    fn record(&mut self, node: Node<'a>) {
        if self.class_depth > 0 {
            return;
        }
        match node {
            Node::Variable(var) if var.symbol.as_deref() == Some(self.key) => {
                if let Some(init) = &var.init {
                    self.found.latest = Some(init);
                    self.found.updates.clear();
                }
            }
            Node::Expr(expr) => match expr.as_ref() {
                Expr::Assign {
                    op, target, value, ..
                } if self.names_variable(target) => {
                    if *op == AssignOp::Assign {
                        self.found.latest = Some(value);
                        self.found.updates.clear();
                    } else {
                        self.found.updates.push(value);
                    }
                }
                Expr::Call { args, .. } if self.mutation_root(expr).is_some() => {
                    self.found.updates.extend(args.iter());
                }
                _ => (),
            },
            _ => (),
        }
    }
}

/// Walk `method` in source order up to `use_site` and collect the
/// definitions of the local `key` that reach it. `None` when the use is not
/// inside the method body.
pub fn reaching_definitions<'a>(
    unit: &ResolvedUnit,
    catalog: &ApiCatalog,
    method: &'a Ref<MethodDecl>,
    key: &str,
    use_site: &ExprRef,
) -> Option<ReachingDefinitions<'a>> {
    scan_method(unit, catalog, method, key, use_site, false)
}

/// Definitions of a local of `method` read from a class declared inside it.
/// The scan enters local and anonymous classes to find the use but only
/// records definitions made by `method` itself.
pub fn captured_definitions<'a>(
    unit: &ResolvedUnit,
    catalog: &ApiCatalog,
    method: &'a Ref<MethodDecl>,
    key: &str,
    use_site: &ExprRef,
) -> Option<ReachingDefinitions<'a>> {
    scan_method(unit, catalog, method, key, use_site, true)
}

fn scan_method<'a>(
    unit: &ResolvedUnit,
    catalog: &ApiCatalog,
    method: &'a Ref<MethodDecl>,
    key: &str,
    use_site: &ExprRef,
    captured: bool,
) -> Option<ReachingDefinitions<'a>> {
    let body = method.body.as_ref()?;
    let mut scan = DefinitionScan {
        unit,
        catalog,
        key,
        use_site,
        captured,
        class_depth: 0,
        reached: false,
        found: ReachingDefinitions::default(),
    };
    if let Err(err) = scan.visit(Node::Block(body)) {
        log::trace!("definition scan of `{key}` failed: {err}");
        return None;
    }
    scan.reached.then_some(scan.found)
}
