//! Type classification against the module pool.
//!
//! Generated signatures need to know whether a parameter type is a
//! struct, an enum, a sequence and so on, which in turn decides whether
//! it is passed by value, by reference or by const reference.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::ast::{Module, ParamDecorator, TypeKind};
use crate::error::{DslError, Result};
use crate::pool::ModulePool;

/// Prefix some namespaces carry but module file names do not
/// (`RoboCompCamera` lives in `Camera.idsl`).
pub const NAMESPACE_PREFIX: &str = "RoboComp";

const NUMERIC_TYPES: [&str; 5] = ["float", "int", "short", "long", "double"];

fn kind_in(module: &Module, local: &str) -> Option<TypeKind> {
    module.type_def(local).map(|t| t.kind())
}

/// Kind of a possibly qualified type (`Namespace::Type` or `Type`).
///
/// A qualified name is looked up in the module keyed by the namespace,
/// then in the one keyed by the namespace without its `RoboComp` prefix,
/// then in any module declaring that namespace. An unqualified name is
/// searched in every cached module, in load order. Nothing is loaded.
pub fn kind_of(type_name: &str, pool: &ModulePool) -> Option<TypeKind> {
    let kind = match type_name.rsplit_once("::") {
        Some((namespace, local)) => {
            let by_key = pool.get(namespace).and_then(|m| kind_in(&m, local));
            by_key
                .or_else(|| {
                    namespace
                        .strip_prefix(NAMESPACE_PREFIX)
                        .and_then(|stripped| pool.get(stripped))
                        .and_then(|m| kind_in(&m, local))
                })
                .or_else(|| {
                    pool.modules()
                        .iter()
                        .filter(|m| m.name == namespace)
                        .find_map(|m| kind_in(m, local))
                })
        }
        None => pool.modules().iter().find_map(|m| kind_in(m, type_name)),
    };
    debug!(type_name, kind = ?kind, "classified type");
    kind
}

/// How user-defined non-enum types are passed when read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassingStyle {
    /// `const T &`
    #[default]
    Legacy,
    /// Plain `T`, as the cpp11 templates emit
    Modern,
}

/// Outcome of [`reference_convention`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Passing {
    pub is_const: bool,
    pub by_ref: bool,
}

impl Passing {
    const VALUE: Self = Self { is_const: false, by_ref: false };
    const CONST_VALUE: Self = Self { is_const: true, by_ref: false };
    const REF: Self = Self { is_const: false, by_ref: true };
    const CONST_REF: Self = Self { is_const: true, by_ref: true };

    /// `"const "` or `""`.
    pub fn const_prefix(&self) -> &'static str {
        if self.is_const {
            "const "
        } else {
            ""
        }
    }

    /// `"&"` or `""`.
    pub fn ampersand(&self) -> &'static str {
        if self.by_ref {
            "&"
        } else {
            ""
        }
    }
}

/// Decide how a parameter is passed in generated signatures.
///
/// | type | `out` | read-only, legacy | read-only, modern |
/// |------|-------|-------------------|-------------------|
/// | numeric | `T &` | `const T` | `const T` |
/// | `bool` | `T &` | `T` | `T` |
/// | `string` | `T &` | `const T &` | `const T &` |
/// | enum | `T &` | `T` | `T` |
/// | other user type | `T &` | `const T &` | `T` |
///
/// User types are classified with [`kind_of`]; one that cannot be found
/// is an error.
pub fn reference_convention(
    decorator: ParamDecorator,
    type_name: &str,
    pool: &ModulePool,
    style: PassingStyle,
) -> Result<Passing> {
    let read_only = match type_name {
        t if NUMERIC_TYPES.contains(&t) => Passing::CONST_VALUE,
        "bool" => Passing::VALUE,
        "string" => Passing::CONST_REF,
        _ => match kind_of(type_name, pool) {
            None => {
                return Err(DslError::UnknownType {
                    name: type_name.to_string(),
                })
            }
            Some(TypeKind::Enum) => Passing::VALUE,
            Some(_) => match style {
                PassingStyle::Legacy => Passing::CONST_REF,
                PassingStyle::Modern => Passing::VALUE,
            },
        },
    };
    Ok(if decorator.is_out() { Passing::REF } else { read_only })
}

/// Disambiguate repeated names: sorted, the first occurrence of each name
/// gets suffix `""`, later ones `"1"`, `"2"` and so on.
pub fn name_numbers<S: AsRef<str>>(names: &[S]) -> Vec<(String, String)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names {
        *counts.entry(name.as_ref()).or_default() += 1;
    }
    counts
        .into_iter()
        .flat_map(|(name, count)| {
            (0..count).map(move |i| {
                let suffix = if i == 0 { String::new() } else { i.to_string() };
                (name.to_string(), suffix)
            })
        })
        .collect()
}
