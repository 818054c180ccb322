//! Normalized interface modules (`.idsl`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::dsl::tree::{IdslTree, RawContent, RawField, RawInterface, RawMethod};

/// One parsed interface description file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    /// Name declared by `module <name>`
    pub name: String,
    /// File the module was read from, if any
    pub file_path: Option<PathBuf>,
    /// Imported files as written, reduced to their base names
    pub imports: Vec<String>,
    /// Transitive closure of `imports`, filled in by the module pool
    pub recursive_imports: Vec<String>,
    pub interfaces: Vec<Interface>,
    pub types: Vec<TypeDef>,
}

/// A named group of remotely callable methods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub name: String,
    /// Methods keyed (and therefore ordered) by name
    pub methods: BTreeMap<String, Method>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub return_type: String,
    pub params: Vec<Param>,
    pub decorator: MethodDecorator,
    pub throws: Throws,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub decorator: ParamDecorator,
}

/// Decorator in front of a method declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MethodDecorator {
    #[default]
    None,
    Idempotent,
    Out,
}

impl MethodDecorator {
    /// Spelling used by code templates: `""`, `"idempotent"` or `"out"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Idempotent => "idempotent",
            Self::Out => "out",
        }
    }

    fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("idempotent") => Self::Idempotent,
            Some("out") => Self::Out,
            _ => Self::None,
        }
    }
}

/// Decorator in front of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamDecorator {
    #[default]
    None,
    /// Passed by mutable reference in generated code
    Out,
}

impl ParamDecorator {
    /// `"none"` or `"out"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Out => "out",
        }
    }

    pub fn is_out(&self) -> bool {
        matches!(self, Self::Out)
    }
}

/// Exceptions a method may raise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Throws {
    #[default]
    Nothing,
    Types(Vec<String>),
}

impl Throws {
    pub fn types(&self) -> &[String] {
        match self {
            Self::Nothing => &[],
            Self::Types(types) => types,
        }
    }
}

macro_rules! serialize_as_str {
    ($($ty:ty),*) => {$(
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    )*};
}

serialize_as_str!(MethodDecorator, ParamDecorator, TypeKind);

impl Serialize for Throws {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Nothing => serializer.serialize_str("nothing"),
            Self::Types(types) => types.serialize(serializer),
        }
    }
}

/// A user-defined type declared in a module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDef {
    /// Local name inside the module
    pub name: String,
    /// Name of the owning module
    pub module: String,
    pub body: TypeBody,
}

/// Kind-specific payload of a [`TypeDef`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeBody {
    Struct { fields: Vec<Field> },
    Exception { fields: Vec<Field> },
    /// Enumerator list as written
    Enum { content: String },
    Sequence { element: String },
    Dictionary { key: String, value: String },
}

/// Type kind tag, used for reference-passing decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Struct,
    Enum,
    Exception,
    Sequence,
    Dictionary,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::Enum => "enum",
            Self::Exception => "exception",
            Self::Sequence => "sequence",
            Self::Dictionary => "dictionary",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    pub default: Option<String>,
}

impl TypeDef {
    pub fn kind(&self) -> TypeKind {
        match self.body {
            TypeBody::Struct { .. } => TypeKind::Struct,
            TypeBody::Exception { .. } => TypeKind::Exception,
            TypeBody::Enum { .. } => TypeKind::Enum,
            TypeBody::Sequence { .. } => TypeKind::Sequence,
            TypeBody::Dictionary { .. } => TypeKind::Dictionary,
        }
    }

    /// `<module>/<name>`
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.module, self.name)
    }

    /// Enumerator names, without explicit values. Empty for non-enums.
    pub fn enumerators(&self) -> Vec<&str> {
        match &self.body {
            TypeBody::Enum { content } => content
                .split(',')
                .map(|item| item.split('=').next().unwrap_or_default().trim())
                .filter(|item| !item.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Base name of an import path: `dir/Foo.idsl` -> `Foo.idsl`.
pub fn import_basename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Module key of an import: `dir/Foo.idsl` -> `Foo`.
pub fn import_stem(path: &str) -> String {
    let base = import_basename(path);
    match base.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => base,
    }
}

impl Module {
    /// Build a module from its raw parse tree.
    pub fn from_tree(tree: IdslTree, file_path: Option<PathBuf>) -> Self {
        let module_name = tree.module.name;
        debug!(module = %module_name, "building interface module");

        let imports = tree
            .imports
            .iter()
            .map(|import| import_basename(&import.path))
            .collect();

        let mut interfaces = Vec::new();
        let mut types = Vec::new();
        for content in tree.module.contents {
            let (name, body) = match content {
                RawContent::Interface(raw) => {
                    interfaces.push(Interface::from_raw(raw));
                    continue;
                }
                RawContent::Struct { name, fields } => (
                    name,
                    TypeBody::Struct {
                        fields: fields.into_iter().map(Field::from).collect(),
                    },
                ),
                RawContent::Exception { name, fields } => (
                    name,
                    TypeBody::Exception {
                        fields: fields.into_iter().map(Field::from).collect(),
                    },
                ),
                RawContent::Enum { name, content } => (name, TypeBody::Enum { content }),
                RawContent::Sequence { name, element } => (name, TypeBody::Sequence { element }),
                RawContent::Dictionary { name, key, value } => {
                    (name, TypeBody::Dictionary { key, value })
                }
            };
            types.push(TypeDef {
                name,
                module: module_name.clone(),
                body,
            });
        }

        Self {
            name: module_name,
            file_path,
            imports,
            recursive_imports: Vec::new(),
            interfaces,
            types,
        }
    }

    /// Key under which the pool stores this module: the file stem, or the
    /// declared name for modules parsed from a string.
    pub fn pool_key(&self) -> String {
        self.file_path
            .as_deref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.name.clone())
    }

    /// Imports as module keys, without duplicates, in declaration order.
    pub fn import_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for import in &self.imports {
            let key = import_stem(import);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|i| i.name.as_str())
    }

    /// Look up a type by its local name.
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn structs(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter().filter(|t| t.kind() == TypeKind::Struct)
    }

    pub fn sequences(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.iter().filter(|t| t.kind() == TypeKind::Sequence)
    }
}

impl Interface {
    fn from_raw(raw: RawInterface) -> Self {
        let mut methods = BTreeMap::new();
        for raw_method in raw.methods {
            let method = Method::from(raw_method);
            if let Some(previous) = methods.insert(method.name.clone(), method) {
                warn!(
                    interface = %raw.name,
                    method = %previous.name,
                    "method declared twice, keeping the last declaration"
                );
            }
        }
        Self {
            name: raw.name,
            methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }
}

impl From<RawMethod> for Method {
    fn from(raw: RawMethod) -> Self {
        Self {
            decorator: MethodDecorator::from_raw(raw.decorator.as_deref()),
            return_type: raw.return_type,
            params: raw
                .params
                .into_iter()
                .map(|p| Param {
                    name: p.name,
                    type_name: p.type_name,
                    decorator: if p.out {
                        ParamDecorator::Out
                    } else {
                        ParamDecorator::None
                    },
                })
                .collect(),
            throws: raw.throws.map(Throws::Types).unwrap_or_default(),
            name: raw.name,
        }
    }
}

impl From<RawField> for Field {
    fn from(raw: RawField) -> Self {
        Self {
            type_name: raw.type_name,
            name: raw.name,
            default: raw.default,
        }
    }
}
