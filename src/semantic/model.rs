// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use super::error::ModelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl TypeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl SymbolId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub const fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    Class,
    Interface,
    Enum,
    Annotation,
    Array,
    Primitive(PrimitiveKind),
    /// Type of the `null` literal; bottom of the reference hierarchy.
    Null,
    Void,
    /// Unresolved or erroneous type.
    Unknown,
}

impl TypeTag {
    pub const fn is_declared(self) -> bool {
        matches!(
            self,
            TypeTag::Class | TypeTag::Interface | TypeTag::Enum | TypeTag::Annotation
        )
    }

    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            TypeTag::Class
                | TypeTag::Interface
                | TypeTag::Enum
                | TypeTag::Annotation
                | TypeTag::Array
                | TypeTag::Null
        )
    }
}

#[derive(Clone, Debug)]
pub struct TypeData {
    pub name: String,
    pub tag: TypeTag,
    pub superclass: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    /// Declaring symbol of class-like types.
    pub symbol: Option<SymbolId>,
    /// Raw type of a parameterized type.
    pub erasure: Option<TypeId>,
    /// Component type of an array type.
    pub element: Option<TypeId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Type,
    Method,
    Variable,
}

#[derive(Clone, Debug)]
pub struct SymbolData {
    pub key: String,
    pub name: String,
    pub kind: SymbolKind,
    pub owner: Option<SymbolId>,
    /// Declared type of a variable, return type of a method, the type itself
    /// for a type symbol.
    pub ty: Option<TypeId>,
    pub is_static: bool,
    pub is_final: bool,
    pub members: Vec<SymbolId>,
    pub params: Vec<SymbolId>,
    /// Source text of a compile-time constant initializer.
    pub constant: Option<String>,
}

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const CLASS: &str = "java.lang.Class";
pub const ENUM: &str = "java.lang.Enum";
pub const CHAR_SEQUENCE: &str = "java.lang.CharSequence";
pub const STRING_BUILDER: &str = "java.lang.StringBuilder";
pub const STRING_BUFFER: &str = "java.lang.StringBuffer";
pub const NULL: &str = "null";
pub const VOID: &str = "void";

#[derive(Clone, Debug)]
pub struct SemanticModel {
    types: Vec<TypeData>,
    symbols: Vec<SymbolData>,
    type_index: BTreeMap<String, TypeId>,
    symbol_index: BTreeMap<String, SymbolId>,
}

impl Default for SemanticModel {
    fn default() -> Self {
        Self::new()
    }
}

impl SemanticModel {
    /// Model holding only the prelude: primitives, `null`, `void` and the
    /// handful of `java.lang` types the checks reason about.
    pub fn new() -> Self {
        let mut model = Self {
            types: vec![],
            symbols: vec![],
            type_index: BTreeMap::new(),
            symbol_index: BTreeMap::new(),
        };

        for kind in PrimitiveKind::ALL {
            model.push_type(kind.name(), TypeTag::Primitive(kind));
        }
        model.push_type(NULL, TypeTag::Null);
        model.push_type(VOID, TypeTag::Void);

        let object = model.define_type(OBJECT, TypeTag::Class);
        let char_sequence = model.define_type(CHAR_SEQUENCE, TypeTag::Interface);
        for name in [STRING, STRING_BUILDER, STRING_BUFFER] {
            let ty = model.define_type(name, TypeTag::Class);
            model.set_superclass(ty, Some(object));
            model.add_interface(ty, char_sequence);
        }
        for name in [CLASS, ENUM] {
            let ty = model.define_type(name, TypeTag::Class);
            model.set_superclass(ty, Some(object));
        }
        model
    }

    fn push_type(&mut self, name: &str, tag: TypeTag) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeData {
            name: name.to_string(),
            tag,
            superclass: None,
            interfaces: vec![],
            symbol: None,
            erasure: None,
            element: None,
        });
        self.type_index.insert(name.to_string(), id);
        id
    }

    /// Look up a type by name, creating it if it has not been seen.
    ///
    /// `T[]` becomes an array of `T`, `Raw<Args>` a parameterized type whose
    /// erasure is `Raw`. Any other unseen name is an unknown type.
    pub fn intern_type(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.type_index.get(name) {
            return *id;
        }

        if let Some(element) = name.strip_suffix("[]") {
            let element = self.intern_type(element.trim_end());
            let id = self.push_type(name, TypeTag::Array);
            self.types[id.index()].element = Some(element);
            return id;
        }

        if let Some(open) = name.find('<') {
            let raw = self.intern_type(name[..open].trim_end());
            let tag = self.types[raw.index()].tag;
            let id = self.push_type(name, tag);
            self.types[id.index()].erasure = Some(raw);
            return id;
        }

        log::warn!("type `{name}` is not declared by the model; treating it as unknown");
        self.push_type(name, TypeTag::Unknown)
    }

    /// Declare a class-like type. Re-declaring refines the tag of an already
    /// interned type. The type gets a type symbol keyed by its name.
    pub fn define_type(&mut self, name: &str, tag: TypeTag) -> TypeId {
        let id = match self.type_index.get(name) {
            Some(id) => *id,
            None => self.push_type(name, tag),
        };
        self.types[id.index()].tag = tag;
        if self.types[id.index()].symbol.is_none() {
            let symbol = SymbolId(self.symbols.len() as u32);
            self.symbols.push(SymbolData {
                key: name.to_string(),
                name: simple_name(name).to_string(),
                kind: SymbolKind::Type,
                owner: None,
                ty: Some(id),
                is_static: false,
                is_final: false,
                members: vec![],
                params: vec![],
                constant: None,
            });
            self.symbol_index.insert(name.to_string(), symbol);
            self.types[id.index()].symbol = Some(symbol);
        }
        id
    }

    pub fn set_superclass(&mut self, ty: TypeId, superclass: Option<TypeId>) {
        self.types[ty.index()].superclass = superclass;
    }

    pub fn add_interface(&mut self, ty: TypeId, interface: TypeId) {
        let data = &mut self.types[ty.index()];
        if !data.interfaces.contains(&interface) {
            data.interfaces.push(interface);
        }
    }

    /// Record `nested` as a member type of `outer`.
    pub fn nest_type(&mut self, nested: SymbolId, outer: SymbolId) {
        self.symbols[nested.index()].owner = Some(outer);
        let members = &mut self.symbols[outer.index()].members;
        if !members.contains(&nested) {
            members.push(nested);
        }
    }

    /// Declare a method or variable symbol. Symbols owned by a type are
    /// added to its members; parameters are linked with [`Self::add_param`].
    pub fn declare_symbol(
        &mut self,
        key: &str,
        name: &str,
        kind: SymbolKind,
        owner: Option<SymbolId>,
    ) -> Result<SymbolId, ModelError> {
        if self.symbol_index.contains_key(key) {
            return Err(ModelError::DuplicateSymbol {
                key: key.to_string(),
            });
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(SymbolData {
            key: key.to_string(),
            name: name.to_string(),
            kind,
            owner,
            ty: None,
            is_static: false,
            is_final: false,
            members: vec![],
            params: vec![],
            constant: None,
        });
        self.symbol_index.insert(key.to_string(), id);
        if let Some(owner) = owner {
            if self.symbols[owner.index()].kind == SymbolKind::Type {
                self.symbols[owner.index()].members.push(id);
            }
        }
        Ok(id)
    }

    pub fn add_param(&mut self, method: SymbolId, param: SymbolId) {
        self.symbols[method.index()].params.push(param);
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut SymbolData {
        &mut self.symbols[id.index()]
    }

    pub fn type_data(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.index()]
    }

    pub fn resolve_type(&self, name: &str) -> Option<TypeId> {
        self.type_index.get(name).copied()
    }

    pub fn resolve_symbol(&self, key: &str) -> Option<SymbolId> {
        self.symbol_index.get(key).copied()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

/// Last segment of a dotted or `$`-separated type name.
pub fn simple_name(name: &str) -> &str {
    let raw = name.split('<').next().unwrap_or(name);
    raw.rsplit(['.', '$']).next().unwrap_or(raw)
}
