// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

use crate::ast::{Expr, ExprRef, MethodDecl, Ref};
use crate::catalog::{ApiCatalog, CallEffect};
use crate::semantic::{model::simple_name, SymbolId};
use crate::unit::ResolvedUnit;

use super::definitions::{call_candidates, captured_definitions, reaching_definitions};
use super::model::{Classification, Constancy, SinkContext, WitnessOrigin};

/// Bookkeeping of one `classify` query.
#[derive(Default)]
struct TraceState {
    depth: usize,
    // Local uses and fields currently being traced.
    active_uses: BTreeSet<ExprRef>,
    active_fields: BTreeSet<SymbolId>,
}

pub struct ConstancyPropagator<'u> {
    unit: &'u ResolvedUnit,
    catalog: &'u ApiCatalog,
    max_depth: usize,
}

/// Name used for an expression in messages.
fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Ident { name, .. } | Expr::Select { name, .. } => name.clone(),
        Expr::Call { callee, .. } => describe(callee),
        Expr::New { ty: Some(ty), .. } => simple_name(ty).to_string(),
        Expr::Index { target, .. } => describe(target),
        Expr::Paren { inner, .. } => describe(inner),
        Expr::Cast { operand, .. } => describe(operand),
        _ => "expression".to_string(),
    }
}

impl<'u> ConstancyPropagator<'u> {
    pub fn new(unit: &'u ResolvedUnit, catalog: &'u ApiCatalog, max_depth: usize) -> Self {
        Self {
            unit,
            catalog,
            max_depth,
        }
    }

    /// Classify the value of `expr`. Never fails: whatever cannot be
    /// understood is DYNAMIC_UNSAFE.
    pub fn classify(&self, expr: &ExprRef, ctx: &SinkContext<'_>) -> Classification {
        let mut state = TraceState::default();
        let result = self.classify_expr(expr, ctx, &mut state);
        log::trace!(
            "{}:{} classified {:?}",
            self.unit.file(),
            expr.span(),
            result.constancy
        );
        result
    }

    fn classify_expr(
        &self,
        expr: &ExprRef,
        ctx: &SinkContext<'_>,
        state: &mut TraceState,
    ) -> Classification {
        match expr.as_ref() {
            Expr::Literal { .. } => Classification::constant(),

            Expr::Paren { inner: operand, .. }
            | Expr::Cast { operand, .. }
            | Expr::Unary { operand, .. } => self.classify_expr(operand, ctx, state),

            Expr::Binary { lhs, rhs, .. } => {
                let lhs = self.classify_expr(lhs, ctx, state);
                lhs.join(self.classify_expr(rhs, ctx, state))
            }

            Expr::Conditional {
                then, otherwise, ..
            } => {
                let then = self.classify_expr(then, ctx, state);
                then.join(self.classify_expr(otherwise, ctx, state))
            }

            Expr::Assign { value, .. } => self.classify_expr(value, ctx, state),

            Expr::Ident { name, .. } => match self.unit.symbol_of(expr) {
                Some(symbol) => self.classify_symbol(expr, symbol, ctx, state),
                None => Classification::unsafe_because(
                    name.clone(),
                    *expr.span(),
                    WitnessOrigin::Unresolved,
                ),
            },

            Expr::Select { name, .. } => match self.unit.symbol_of(expr) {
                Some(symbol) => self.classify_symbol(expr, symbol, ctx, state),
                None => Classification::unsafe_because(
                    name.clone(),
                    *expr.span(),
                    WitnessOrigin::Unresolved,
                ),
            },

            Expr::Call { callee, args, .. } => {
                let effect = callee.name().and_then(|name| {
                    self.catalog.call_effect(
                        self.unit.model(),
                        &call_candidates(self.unit, expr),
                        name,
                    )
                });
                match effect {
                    Some(CallEffect::Safe) => Classification::safe(),
                    Some(CallEffect::Propagate | CallEffect::Mutate) => {
                        let mut result = match callee.as_ref() {
                            Expr::Select { target, .. } => self.classify_expr(target, ctx, state),
                            _ => Classification::constant(),
                        };
                        for arg in args {
                            result = result.join(self.classify_expr(arg, ctx, state));
                        }
                        result
                    }
                    None => Classification::unsafe_because(
                        describe(expr),
                        *expr.span(),
                        WitnessOrigin::Call,
                    ),
                }
            }

            Expr::New { args, body, .. } => {
                let propagates = body.is_none()
                    && self
                        .unit
                        .type_of(expr)
                        .is_some_and(|ty| self.catalog.propagates_construction(self.unit.model(), ty));
                if propagates {
                    args.iter().fold(Classification::constant(), |acc, arg| {
                        acc.join(self.classify_expr(arg, ctx, state))
                    })
                } else {
                    Classification::unsafe_because(describe(expr), *expr.span(), WitnessOrigin::Call)
                }
            }

            Expr::Index { .. } => Classification::unsafe_because(
                describe(expr),
                *expr.span(),
                WitnessOrigin::Expression,
            ),
        }
    }

    fn classify_symbol(
        &self,
        expr: &ExprRef,
        symbol: SymbolId,
        ctx: &SinkContext<'_>,
        state: &mut TraceState,
    ) -> Classification {
        let model = self.unit.model();
        let name = &model.symbol(symbol).name;
        if model.is_type_symbol(symbol) {
            // Qualifier of a static member.
            Classification::constant()
        } else if model.is_parameter(symbol) {
            Classification::unsafe_because(name.clone(), *expr.span(), WitnessOrigin::Parameter)
        } else if model.is_local_variable(symbol) {
            self.trace_local(expr, symbol, ctx, state)
        } else if model.is_field(symbol) {
            self.classify_field(expr, symbol, state)
        } else {
            Classification::unsafe_because(name.clone(), *expr.span(), WitnessOrigin::Unresolved)
        }
    }

    fn trace_local(
        &self,
        expr: &ExprRef,
        symbol: SymbolId,
        ctx: &SinkContext<'_>,
        state: &mut TraceState,
    ) -> Classification {
        let model = self.unit.model();
        let data = model.symbol(symbol);
        let undefined =
            || Classification::unsafe_because(data.name.clone(), *expr.span(), WitnessOrigin::Local);

        if state.depth >= self.max_depth {
            log::trace!("giving up on `{}`: trace depth exceeded", data.name);
            return undefined();
        }
        if !state.active_uses.insert(expr.clone()) {
            return Classification::constant();
        }

        let mut definitions = ctx.method.and_then(|method| {
            reaching_definitions(self.unit, self.catalog, method, &data.key, expr)
        });
        let mut def_ctx = *ctx;
        if definitions.as_ref().and_then(|defs| defs.latest).is_none() {
            // Locals captured by a local or anonymous class are effectively
            // final; their definition is in the method declaring them.
            if let Some(owner) = self.declaring_method(symbol, ctx) {
                definitions =
                    captured_definitions(self.unit, self.catalog, owner, &data.key, expr);
                def_ctx = SinkContext::in_method(owner);
            }
        }
        let result = match definitions {
            Some(defs) => match defs.latest {
                Some(latest) => {
                    state.depth += 1;
                    let mut result = self.classify_expr(latest, &def_ctx, state);
                    for update in defs.updates {
                        result = result.join(self.classify_expr(update, &def_ctx, state));
                    }
                    state.depth -= 1;
                    result
                }
                None => undefined(),
            },
            None => undefined(),
        };

        state.active_uses.remove(expr);
        result
    }

    /// Method declaring the local `symbol` when it is not the method of
    /// `ctx`. Detached contexts have no enclosing method to search.
    fn declaring_method(
        &self,
        symbol: SymbolId,
        ctx: &SinkContext<'_>,
    ) -> Option<&'u Ref<MethodDecl>> {
        let current = ctx.method?;
        let model = self.unit.model();
        let owner = model.owner(symbol).filter(|o| model.is_method_symbol(*o))?;
        let key = &model.symbol(owner).key;
        if current.symbol.as_deref() == Some(key.as_str()) {
            return None;
        }
        self.unit.index().method(key)
    }

    fn classify_field(
        &self,
        expr: &ExprRef,
        symbol: SymbolId,
        state: &mut TraceState,
    ) -> Classification {
        let model = self.unit.model();
        let data = model.symbol(symbol);
        if model.constant_value(symbol).is_some() {
            return Classification::constant();
        }
        let unsafe_field =
            || Classification::unsafe_because(data.name.clone(), *expr.span(), WitnessOrigin::Field);

        if !data.is_final || state.depth >= self.max_depth {
            return unsafe_field();
        }
        let Some(init) = self
            .unit
            .index()
            .field(&data.key)
            .and_then(|decl| decl.init.as_ref())
        else {
            return unsafe_field();
        };
        if !state.active_fields.insert(symbol) {
            // Cyclic constant initializers are rejected upstream; stay neutral.
            return Classification::constant();
        }

        state.depth += 1;
        let init = self.classify_expr(init, &SinkContext::detached(), state);
        state.depth -= 1;
        state.active_fields.remove(&symbol);

        if init.constancy == Constancy::StaticConstant {
            init
        } else {
            unsafe_field()
        }
    }
}
