// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::model::{SemanticModel, SymbolKind, TypeId, TypeTag, ENUM, OBJECT};
use crate::ast::ClassKind;

/// Serialized form of the symbol/type model handed over by the resolver.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub types: Vec<TypeDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDocument {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Enclosing type of a nested type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberDocument>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    #[default]
    Field,
    Method,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDocument {
    pub name: String,
    /// Defaults to `Type#name`. Overloads must be given distinct keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub kind: MemberKind,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// Field type or method return type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,
    #[serde(default)]
    pub params: Vec<VariableDocument>,
    #[serde(default)]
    pub locals: Vec<VariableDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDocument {
    pub name: String,
    /// Defaults to `Type#method.name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

impl From<ClassKind> for TypeTag {
    fn from(kind: ClassKind) -> Self {
        match kind {
            ClassKind::Class => TypeTag::Class,
            ClassKind::Interface => TypeTag::Interface,
            ClassKind::Enum => TypeTag::Enum,
            ClassKind::Annotation => TypeTag::Annotation,
        }
    }
}

fn check_type_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() || name.contains(char::is_whitespace) {
        return Err(ModelError::InvalidTypeName {
            name: name.to_string(),
        });
    }
    Ok(())
}

impl ModelDocument {
    pub fn load(&self) -> Result<SemanticModel, ModelError> {
        let mut model = SemanticModel::new();
        let mut declared = BTreeSet::new();

        // Declare every type first so that forward references resolve.
        for doc in &self.types {
            check_type_name(&doc.name)?;
            if !declared.insert(doc.name.as_str()) {
                return Err(ModelError::DuplicateType {
                    name: doc.name.clone(),
                });
            }
            model.define_type(&doc.name, doc.kind.into());
        }

        for doc in &self.types {
            let ty = model.intern_type(&doc.name);
            let superclass = match (&doc.superclass, doc.kind) {
                (Some(name), _) => Some(name.as_str()),
                (None, ClassKind::Enum) => Some(ENUM),
                (None, ClassKind::Class) if doc.name != OBJECT => Some(OBJECT),
                (None, _) => None,
            };
            let superclass = superclass.map(|name| reference_type(&mut model, name));
            model.set_superclass(ty, superclass);
            for interface in &doc.interfaces {
                let interface = reference_type(&mut model, interface);
                model.add_interface(ty, interface);
            }

            if let Some(owner) = &doc.owner {
                let outer = model
                    .resolve_type(owner)
                    .filter(|_| declared.contains(owner.as_str()))
                    .and_then(|outer| model.type_data(outer).symbol);
                let Some(outer) = outer else {
                    return Err(ModelError::UnknownOwner {
                        name: doc.name.clone(),
                        owner: owner.clone(),
                    });
                };
                if let Some(nested) = model.type_data(ty).symbol {
                    model.nest_type(nested, outer);
                }
            }
        }

        for doc in &self.types {
            let ty = model.intern_type(&doc.name);
            let Some(owner) = model.type_data(ty).symbol else {
                continue;
            };
            for member in &doc.members {
                let key = member
                    .key
                    .clone()
                    .unwrap_or_else(|| format!("{}#{}", doc.name, member.name));
                let kind = match member.kind {
                    MemberKind::Field => SymbolKind::Variable,
                    MemberKind::Method => SymbolKind::Method,
                };
                let symbol = model.declare_symbol(&key, &member.name, kind, Some(owner))?;
                let member_ty = member.ty.as_deref().map(|name| model.intern_type(name));
                let data = model.symbol_mut(symbol);
                data.is_static = member.is_static;
                data.is_final = member.is_final;
                data.constant = member.constant.clone();
                data.ty = member_ty;

                let variables = member
                    .params
                    .iter()
                    .map(|param| (param, true))
                    .chain(member.locals.iter().map(|local| (local, false)));
                for (var, is_param) in variables {
                    let var_key = var
                        .key
                        .clone()
                        .unwrap_or_else(|| format!("{}#{}.{}", doc.name, member.name, var.name));
                    let var_symbol =
                        model.declare_symbol(&var_key, &var.name, SymbolKind::Variable, Some(symbol))?;
                    let var_ty = var.ty.as_deref().map(|name| model.intern_type(name));
                    model.symbol_mut(var_symbol).ty = var_ty;
                    if is_param {
                        model.add_param(symbol, var_symbol);
                    }
                }
            }
        }

        log::debug!(
            "loaded semantic model: {} types, {} symbols",
            model.type_count(),
            model.symbol_count()
        );
        Ok(model)
    }
}

fn reference_type(model: &mut SemanticModel, name: &str) -> TypeId {
    if model.resolve_type(name).is_none() {
        log::warn!("supertype `{name}` is not declared; hierarchy queries through it answer false");
    }
    model.intern_type(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(yaml: &str) -> ModelDocument {
        serde_yaml::from_str(yaml).expect("valid model document")
    }

    #[test]
    fn loads_members_and_defaults() -> anyhow::Result<()> {
        let model = document(
            r#"
types:
  - name: p.Dao
    members:
      - name: TABLE
        static: true
        final: true
        type: java.lang.String
        constant: '"users"'
      - name: find
        kind: method
        type: void
        params:
          - { name: userInput, type: java.lang.String }
        locals:
          - { name: sql, type: java.lang.String }
"#,
        )
        .load()?;

        let dao = model.resolve_type("p.Dao").expect("declared");
        let object = model.resolve_type(OBJECT).expect("prelude");
        assert_eq!(model.superclass(dao), Some(object));

        let table = model.resolve_symbol("p.Dao#TABLE").expect("field");
        assert!(model.is_field(table));
        assert_eq!(model.constant_value(table), Some("\"users\""));

        let input = model.resolve_symbol("p.Dao#find.userInput").expect("param");
        let sql = model.resolve_symbol("p.Dao#find.sql").expect("local");
        assert!(model.is_parameter(input));
        assert!(model.is_local_variable(sql));
        Ok(())
    }

    #[test]
    fn nested_types_and_forward_references() -> anyhow::Result<()> {
        let model = document(
            r#"
types:
  - name: p.Outer$Inner
    superclass: p.Base
    owner: p.Outer
  - name: p.Outer
  - name: p.Base
"#,
        )
        .load()?;

        let inner = model.resolve_type("p.Outer$Inner").expect("declared");
        let base = model.resolve_type("p.Base").expect("declared");
        let outer = model.resolve_type("p.Outer").expect("declared");
        assert!(model.is_subtype(inner, base));
        let inner_sym = model.type_data(inner).symbol.expect("symbol");
        let outer_sym = model.type_data(outer).symbol.expect("symbol");
        assert_eq!(model.owner(inner_sym), Some(outer_sym));
        assert_eq!(model.symbol(inner_sym).name, "Inner");
        Ok(())
    }

    #[test]
    fn undeclared_supertypes_become_unknown() -> anyhow::Result<()> {
        let model = document(
            r#"
types:
  - name: p.Impl
    interfaces: [vendor.Missing]
"#,
        )
        .load()?;
        let missing = model.resolve_type("vendor.Missing").expect("interned");
        assert!(model.is_unknown(missing));
        Ok(())
    }

    #[test]
    fn rejects_malformed_documents() {
        let duplicate = document("types: [{ name: p.A }, { name: p.A }]").load();
        assert!(matches!(duplicate, Err(ModelError::DuplicateType { .. })));

        let orphan = document("types: [{ name: p.A$B, owner: p.A }]").load();
        assert!(matches!(orphan, Err(ModelError::UnknownOwner { .. })));

        let invalid = document("types: [{ name: 'p. A' }]").load();
        assert!(matches!(invalid, Err(ModelError::InvalidTypeName { .. })));

        let overload = document(
            r#"
types:
  - name: p.A
    members:
      - { name: f, kind: method }
      - { name: f, kind: method }
"#,
        )
        .load();
        assert!(matches!(overload, Err(ModelError::DuplicateSymbol { .. })));
    }
}
