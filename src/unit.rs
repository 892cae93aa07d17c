// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::ast::{ClassDecl, CompilationUnit, Expr, Member, MethodDecl, Node, Ref, VarDecl};
use crate::semantic::{ModelDocument, SemanticModel, SymbolId, TypeId};
use crate::visit::{for_each_child, traverse};

/// Deepest node nesting a unit may have. Analysis recurses once per level,
/// so deeper trees are rejected when the unit is built.
pub const MAX_NESTING_DEPTH: usize = 256;

fn check_nesting(node: Node<'_>, remaining: usize) -> Result<()> {
    if remaining == 0 {
        bail!(
            "nodes are nested deeper than {MAX_NESTING_DEPTH} levels at {}",
            node.span()
        );
    }
    for_each_child(node, &mut |child| check_nesting(child, remaining - 1))
}

/// Declarations of the unit, keyed by the symbol they introduce.
#[derive(Debug, Default, Clone)]
pub struct UnitIndex {
    fields: BTreeMap<String, Ref<VarDecl>>,
    methods: BTreeMap<String, Ref<MethodDecl>>,
    classes: BTreeMap<String, Ref<ClassDecl>>,
}

impl UnitIndex {
    fn build(tree: &CompilationUnit) -> Result<Self> {
        let mut index = Self::default();
        traverse(Node::Unit(tree), &mut |node| {
            if let Node::Class(class) = node {
                if let Some(key) = &class.symbol {
                    index.classes.insert(key.clone(), class.clone());
                }
                for member in &class.members {
                    match member {
                        Member::Field(field) => {
                            if let Some(key) = &field.symbol {
                                index.fields.insert(key.clone(), field.clone());
                            }
                        }
                        Member::Method(method) => {
                            if let Some(key) = &method.symbol {
                                index.methods.insert(key.clone(), method.clone());
                            }
                        }
                        _ => (),
                    }
                }
            }
            Ok(true)
        })?;
        Ok(index)
    }

    pub fn field(&self, key: &str) -> Option<&Ref<VarDecl>> {
        self.fields.get(key)
    }

    pub fn method(&self, key: &str) -> Option<&Ref<MethodDecl>> {
        self.methods.get(key)
    }

    pub fn class(&self, key: &str) -> Option<&Ref<ClassDecl>> {
        self.classes.get(key)
    }
}

/// Serialized form of a resolved unit: the tree and the model it refers to.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UnitDocument {
    #[serde(default)]
    pub model: ModelDocument,
    pub tree: CompilationUnit,
}

/// One compilation unit ready for analysis. Owned exclusively by whoever
/// analyses it; nothing in it changes during a pass.
#[derive(Debug)]
pub struct ResolvedUnit {
    tree: CompilationUnit,
    model: SemanticModel,
    index: UnitIndex,
}

impl ResolvedUnit {
    pub fn new(tree: CompilationUnit, mut model: SemanticModel) -> Result<Self> {
        check_nesting(Node::Unit(&tree), MAX_NESTING_DEPTH)
            .with_context(|| format!("checking `{}`", tree.file))?;
        // Types only mentioned by the tree (parameterized or array types of
        // expressions) are interned now so that lookups need no mutation.
        traverse(Node::Unit(&tree), &mut |node| {
            let ty = match node {
                Node::Expr(expr) => expr.ty(),
                Node::Variable(var) => var.ty.as_deref(),
                _ => None,
            };
            if let Some(ty) = ty {
                model.intern_type(ty);
            }
            Ok(true)
        })?;
        let index = UnitIndex::build(&tree)?;
        Ok(Self { tree, model, index })
    }

    pub fn from_document(document: UnitDocument) -> Result<Self> {
        let model = document
            .model
            .load()
            .with_context(|| format!("loading model of `{}`", document.tree.file))?;
        Self::new(document.tree, model)
    }

    /// Load a unit document from json. Expression nesting is bounded by
    /// [`MAX_NESTING_DEPTH`] rather than by the json parser.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        deserializer.disable_recursion_limit();
        let document =
            UnitDocument::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
                .context("parsing resolved unit json")?;
        deserializer.end().context("parsing resolved unit json")?;
        Self::from_document(document)
    }

    /// Load a unit document from yaml. The yaml parser keeps its own
    /// nesting limit; generated units with deep expressions should use json.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: UnitDocument =
            serde_yaml::from_str(yaml).context("parsing resolved unit yaml")?;
        Self::from_document(document)
    }

    pub fn tree(&self) -> &CompilationUnit {
        &self.tree
    }

    pub fn model(&self) -> &SemanticModel {
        &self.model
    }

    pub fn index(&self) -> &UnitIndex {
        &self.index
    }

    pub fn file(&self) -> &str {
        &self.tree.file
    }

    /// Resolved type of an expression.
    pub fn type_of(&self, expr: &Expr) -> Option<TypeId> {
        expr.ty().and_then(|name| self.model.resolve_type(name))
    }

    /// Symbol bound to an expression.
    pub fn symbol_of(&self, expr: &Expr) -> Option<SymbolId> {
        expr.symbol().and_then(|key| self.model.resolve_symbol(key))
    }

    /// Symbol declared by a class declaration.
    pub fn class_symbol(&self, class: &ClassDecl) -> Option<SymbolId> {
        class
            .symbol
            .as_deref()
            .and_then(|key| self.model.resolve_symbol(key))
    }

    pub fn method_symbol(&self, method: &MethodDecl) -> Option<SymbolId> {
        method
            .symbol
            .as_deref()
            .and_then(|key| self.model.resolve_symbol(key))
    }

    pub fn variable_symbol(&self, var: &VarDecl) -> Option<SymbolId> {
        var.symbol
            .as_deref()
            .and_then(|key| self.model.resolve_symbol(key))
    }
}
