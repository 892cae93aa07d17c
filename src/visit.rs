// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::{Expr, ExprRef, Member, Node, Stmt};

use anyhow::Result;

/// Invoke `f` on each direct child of `node`, in source order.
pub fn for_each_child<'a>(node: Node<'a>, f: &mut dyn FnMut(Node<'a>) -> Result<()>) -> Result<()> {
    match node {
        Node::Unit(unit) => {
            for class in &unit.types {
                f(Node::Class(class))?;
            }
        }

        Node::Class(class) => {
            for member in &class.members {
                match member {
                    Member::Field(field) => f(Node::Variable(field))?,
                    Member::Method(method) => f(Node::Method(method))?,
                    Member::Class(nested) => f(Node::Class(nested))?,
                    Member::Initializer(block) => f(Node::Block(block))?,
                }
            }
        }

        Node::Method(method) => {
            for param in &method.params {
                f(Node::Variable(param))?;
            }
            if let Some(body) = &method.body {
                f(Node::Block(body))?;
            }
        }

        Node::Variable(var) => {
            if let Some(init) = &var.init {
                f(Node::Expr(init))?;
            }
        }

        Node::Block(block) => {
            for stmt in &block.stmts {
                f(Node::from_stmt(stmt))?;
            }
        }

        Node::Stmt(stmt) => match stmt.as_ref() {
            Stmt::Expr { expr, .. } => f(Node::Expr(expr))?,
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    f(Node::Expr(value))?;
                }
            }
            Stmt::If {
                cond,
                then,
                otherwise,
                ..
            } => {
                f(Node::Expr(cond))?;
                f(Node::from_stmt(then))?;
                if let Some(otherwise) = otherwise {
                    f(Node::from_stmt(otherwise))?;
                }
            }
            Stmt::While { cond, body, .. } => {
                f(Node::Expr(cond))?;
                f(Node::from_stmt(body))?;
            }
            Stmt::Throw { value, .. } => f(Node::Expr(value))?,
            // Normalized by Node::from_stmt; reached only when a caller wraps these directly.
            Stmt::Local(var) => f(Node::Variable(var))?,
            Stmt::Block(block) => f(Node::Block(block))?,
            Stmt::Class(class) => f(Node::Class(class))?,
        },

        Node::Expr(expr) => match expr.as_ref() {
            Expr::Literal { .. } | Expr::Ident { .. } => (),

            Expr::Select { target, .. } => f(Node::Expr(target))?,

            Expr::Call { callee, args, .. } => {
                f(Node::Expr(callee))?;
                for arg in args {
                    f(Node::Expr(arg))?;
                }
            }

            Expr::New { args, body, .. } => {
                for arg in args {
                    f(Node::Expr(arg))?;
                }
                if let Some(body) = body {
                    f(Node::Class(body))?;
                }
            }

            Expr::Assign { target, value, .. } => {
                f(Node::Expr(target))?;
                f(Node::Expr(value))?;
            }

            Expr::Binary { lhs, rhs, .. } => {
                f(Node::Expr(lhs))?;
                f(Node::Expr(rhs))?;
            }

            Expr::Unary { operand, .. } | Expr::Cast { operand, .. } => f(Node::Expr(operand))?,

            Expr::Paren { inner, .. } => f(Node::Expr(inner))?,

            Expr::Conditional {
                cond,
                then,
                otherwise,
                ..
            } => {
                f(Node::Expr(cond))?;
                f(Node::Expr(then))?;
                f(Node::Expr(otherwise))?;
            }

            Expr::Index { target, index, .. } => {
                f(Node::Expr(target))?;
                f(Node::Expr(index))?;
            }
        },
    }
    Ok(())
}

/// Pre-order walk. `f` returns `Ok(false)` to skip the children of a node.
pub fn traverse<'a>(node: Node<'a>, f: &mut dyn FnMut(Node<'a>) -> Result<bool>) -> Result<()> {
    if !f(node)? {
        return Ok(());
    }
    for_each_child(node, &mut |child| traverse(child, f))
}

/// Bounded walk over the sub-tree of one matched node.
///
/// The predicate decides, for every node below the root, whether the walk
/// enters it. The root itself is always visited.
pub struct SubtreeVisitor<'p> {
    descend: &'p dyn Fn(Node<'_>) -> bool,
}

fn outside_nested_types(node: Node<'_>) -> bool {
    !matches!(node, Node::Class(_))
}

impl SubtreeVisitor<'static> {
    /// Visitor that never enters nested or local class declarations, nor the
    /// bodies of anonymous classes.
    pub fn skipping_nested_types() -> Self {
        Self {
            descend: &outside_nested_types,
        }
    }
}

impl<'p> SubtreeVisitor<'p> {
    pub fn new(descend: &'p dyn Fn(Node<'_>) -> bool) -> Self {
        Self { descend }
    }

    pub fn walk<'a>(&self, root: Node<'a>, f: &mut dyn FnMut(Node<'a>) -> Result<()>) -> Result<()> {
        f(root)?;
        self.walk_children(root, f)
    }

    fn walk_children<'a>(
        &self,
        node: Node<'a>,
        f: &mut dyn FnMut(Node<'a>) -> Result<()>,
    ) -> Result<()> {
        for_each_child(node, &mut |child| {
            if !(self.descend)(child) {
                return Ok(());
            }
            f(child)?;
            self.walk_children(child, f)
        })
    }

    /// Visit every expression of the sub-tree, in source order.
    pub fn for_each_expr<'a>(
        &self,
        root: Node<'a>,
        f: &mut dyn FnMut(&'a ExprRef) -> Result<()>,
    ) -> Result<()> {
        self.walk(root, &mut |node| match node {
            Node::Expr(expr) => f(expr),
            _ => Ok(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn ident(name: &str) -> ExprRef {
        Ref::new(Expr::Ident {
            span: Span::default(),
            name: name.to_string(),
            symbol: None,
            ty: None,
        })
    }

    fn method_with_local_class() -> Ref<MethodDecl> {
        let local = Ref::new(ClassDecl {
            span: Span::new(3, 5),
            kind: ClassKind::Class,
            name: Some("Local".to_string()),
            symbol: None,
            members: vec![Member::Initializer(Ref::new(Block {
                span: Span::new(4, 7),
                stmts: vec![Ref::new(Stmt::Expr {
                    span: Span::new(4, 9),
                    expr: ident("hidden"),
                })],
            }))],
        });
        Ref::new(MethodDecl {
            span: Span::new(1, 1),
            name: "run".to_string(),
            symbol: None,
            params: vec![],
            body: Some(Ref::new(Block {
                span: Span::new(1, 10),
                stmts: vec![
                    Ref::new(Stmt::Expr {
                        span: Span::new(2, 5),
                        expr: ident("visible"),
                    }),
                    Ref::new(Stmt::Class(local)),
                ],
            })),
        })
    }

    fn names(exprs: &[&ExprRef]) -> Vec<String> {
        exprs
            .iter()
            .filter_map(|e| e.name().map(str::to_string))
            .collect()
    }

    #[test]
    fn traverse_reaches_local_classes() -> Result<()> {
        let method = method_with_local_class();
        let mut seen = vec![];
        traverse(Node::Method(&method), &mut |node| {
            if let Node::Expr(e) = node {
                seen.push(e);
            }
            Ok(true)
        })?;
        assert_eq!(names(&seen), vec!["visible", "hidden"]);
        Ok(())
    }

    #[test]
    fn traverse_can_prune() -> Result<()> {
        let method = method_with_local_class();
        let mut kinds = vec![];
        traverse(Node::Method(&method), &mut |node| {
            kinds.push(node.kind());
            Ok(!matches!(node, Node::Class(_)))
        })?;
        assert_eq!(
            kinds,
            vec![
                NodeKind::Method,
                NodeKind::Block,
                NodeKind::ExpressionStatement,
                NodeKind::Identifier,
                NodeKind::Class,
            ]
        );
        Ok(())
    }

    #[test]
    fn subtree_visitor_skips_nested_types() -> Result<()> {
        let method = method_with_local_class();
        let mut seen = vec![];
        SubtreeVisitor::skipping_nested_types().for_each_expr(Node::Method(&method), &mut |e| {
            seen.push(e);
            Ok(())
        })?;
        assert_eq!(names(&seen), vec!["visible"]);
        Ok(())
    }

    #[test]
    fn subtree_visitor_always_visits_root() -> Result<()> {
        let method = method_with_local_class();
        let block = method.body.as_ref().expect("method has a body");
        let class = match block.stmts[1].as_ref() {
            Stmt::Class(c) => c.clone(),
            _ => panic!("second statement is a local class"),
        };
        let mut count = 0;
        SubtreeVisitor::skipping_nested_types().walk(Node::Class(&class), &mut |_| {
            count += 1;
            Ok(())
        })?;
        // class, initializer block, statement, identifier
        assert_eq!(count, 4);
        Ok(())
    }
}
