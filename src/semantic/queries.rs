// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

use super::model::{
    PrimitiveKind, SemanticModel, SymbolId, SymbolKind, TypeId, TypeTag, NULL, OBJECT,
};

impl SemanticModel {
    fn tag(&self, ty: TypeId) -> TypeTag {
        self.type_data(ty).tag
    }

    pub fn is_unknown(&self, ty: TypeId) -> bool {
        self.tag(ty) == TypeTag::Unknown
    }

    /// Raw type of `ty`; the type itself when it is not parameterized.
    pub fn erasure(&self, ty: TypeId) -> TypeId {
        self.type_data(ty).erasure.unwrap_or(ty)
    }

    pub fn superclass(&self, ty: TypeId) -> Option<TypeId> {
        self.type_data(ty).superclass
    }

    /// Whether a value of type `a` may be assigned to `b` without conversion.
    ///
    /// Parameterized types are compared through their erasures. Walks that
    /// revisit a type (cyclic hierarchies from erroneous input) give up on
    /// that branch. Reflexivity holds for resolved types only: unknown types
    /// are never subtypes of anything, not even of themselves.
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        let (a, b) = (self.erasure(a), self.erasure(b));
        let (tag_a, tag_b) = (self.tag(a), self.tag(b));
        if tag_a == TypeTag::Unknown || tag_b == TypeTag::Unknown {
            return false;
        }
        if a == b {
            return true;
        }

        match (tag_a, tag_b) {
            (TypeTag::Null, tag) => tag.is_reference(),
            (TypeTag::Primitive(_), _) | (_, TypeTag::Primitive(_)) => false,
            (TypeTag::Void, _) | (_, TypeTag::Void) | (_, TypeTag::Null) => false,
            (TypeTag::Array, TypeTag::Array) => {
                match (self.type_data(a).element, self.type_data(b).element) {
                    (Some(ea), Some(eb)) if self.tag(ea).is_reference() => {
                        self.is_subtype(ea, eb)
                    }
                    _ => false,
                }
            }
            (_, _) if self.type_data(b).name == OBJECT => tag_a.is_reference(),
            (TypeTag::Array, _) => false,
            _ => {
                let mut visited = BTreeSet::new();
                self.reaches(a, b, &mut visited)
            }
        }
    }

    fn reaches(&self, from: TypeId, target: TypeId, visited: &mut BTreeSet<TypeId>) -> bool {
        let from = self.erasure(from);
        if from == target {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        let data = self.type_data(from);
        data.superclass
            .iter()
            .chain(data.interfaces.iter())
            .any(|parent| self.reaches(*parent, target, visited))
    }

    /// Whether `ty` implements the interface named `fqn`, directly or through
    /// super-interfaces. Superclasses are not searched.
    pub fn implements_interface(&self, ty: TypeId, fqn: &str) -> bool {
        let mut visited = BTreeSet::new();
        self.search_interfaces(self.erasure(ty), fqn, &mut visited)
    }

    fn search_interfaces(&self, ty: TypeId, fqn: &str, visited: &mut BTreeSet<TypeId>) -> bool {
        if !visited.insert(ty) {
            return false;
        }
        self.type_data(ty).interfaces.iter().any(|interface| {
            let interface = self.erasure(*interface);
            self.type_data(interface).name == fqn
                || self.search_interfaces(interface, fqn, visited)
        })
    }

    /// Members declared directly on `owner` with the given simple name.
    pub fn member_named(&self, owner: SymbolId, name: &str) -> Vec<SymbolId> {
        self.symbol(owner)
            .members
            .iter()
            .copied()
            .filter(|member| self.symbol(*member).name == name)
            .collect()
    }

    pub fn is_numeric(&self, ty: TypeId) -> bool {
        matches!(self.tag(ty), TypeTag::Primitive(kind) if kind.is_numeric())
    }

    /// Identity or widening primitive conversion from `from` to `to`.
    pub fn numeric_widens(&self, from: TypeId, to: TypeId) -> bool {
        use PrimitiveKind::*;
        let (TypeTag::Primitive(from), TypeTag::Primitive(to)) = (self.tag(from), self.tag(to))
        else {
            return false;
        };
        if !from.is_numeric() || !to.is_numeric() {
            return false;
        }
        from == to
            || match from {
                Byte => matches!(to, Short | Int | Long | Float | Double),
                Short | Char => matches!(to, Int | Long | Float | Double),
                Int => matches!(to, Long | Float | Double),
                Long => matches!(to, Float | Double),
                Float => matches!(to, Double),
                Boolean | Double => false,
            }
    }

    pub fn is_enum(&self, ty: TypeId) -> bool {
        self.tag(self.erasure(ty)) == TypeTag::Enum
    }

    /// Declared reference type: class, interface, enum or annotation.
    pub fn is_class_like(&self, ty: TypeId) -> bool {
        self.tag(self.erasure(ty)).is_declared()
    }

    pub fn is_null_type(&self, ty: TypeId) -> bool {
        self.tag(ty) == TypeTag::Null || self.type_data(ty).name == NULL
    }

    pub fn is_type_named(&self, ty: TypeId, fqn: &str) -> bool {
        self.type_data(ty).name == fqn
    }

    pub fn owner(&self, symbol: SymbolId) -> Option<SymbolId> {
        self.symbol(symbol).owner
    }

    pub fn is_type_symbol(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).kind == SymbolKind::Type
    }

    pub fn is_method_symbol(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).kind == SymbolKind::Method
    }

    pub fn is_parameter(&self, symbol: SymbolId) -> bool {
        match self.owner(symbol) {
            Some(owner) => {
                self.is_method_symbol(owner) && self.symbol(owner).params.contains(&symbol)
            }
            None => false,
        }
    }

    pub fn is_local_variable(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).kind == SymbolKind::Variable
            && matches!(self.owner(symbol), Some(owner) if self.is_method_symbol(owner))
            && !self.is_parameter(symbol)
    }

    pub fn is_field(&self, symbol: SymbolId) -> bool {
        self.symbol(symbol).kind == SymbolKind::Variable
            && matches!(self.owner(symbol), Some(owner) if self.is_type_symbol(owner))
    }

    /// Closest type symbol strictly enclosing `symbol`.
    pub fn enclosing_type(&self, symbol: SymbolId) -> Option<SymbolId> {
        let mut current = self.owner(symbol);
        let mut steps = 0;
        while let Some(owner) = current {
            if self.is_type_symbol(owner) {
                return Some(owner);
            }
            steps += 1;
            if steps > self.symbol_count() {
                return None;
            }
            current = self.owner(owner);
        }
        None
    }

    /// Type declared by a type symbol.
    pub fn declared_type(&self, symbol: SymbolId) -> Option<TypeId> {
        if self.is_type_symbol(symbol) {
            self.symbol(symbol).ty
        } else {
            None
        }
    }

    pub fn constant_value(&self, symbol: SymbolId) -> Option<&str> {
        self.symbol(symbol).constant.as_deref()
    }
}
