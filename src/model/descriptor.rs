// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Resolved and declared type identities.
//!
//! [`TypeDescriptor`] is a fully-resolved type: raw identity plus ordered
//! resolved type arguments. It is the codec registry's cache key.
//! [`TypeExpr`] is a *declared* type as written in a schema: it may
//! reference type variables and is resolved against bindings.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::types::raw;

/// Resolved type parameter bindings: variable name to concrete descriptor.
pub type Bindings = HashMap<String, TypeDescriptor>;

/// A fully-resolved type: raw identity plus resolved generic arguments.
///
/// Two descriptors are equal iff the raw identity and all arguments are
/// equal. Immutable once constructed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    raw: Arc<str>,
    args: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<Arc<str>>) -> TypeDescriptor {
        TypeDescriptor {
            raw: name.into(),
            args: Vec::new(),
        }
    }

    pub fn parameterized(
        name: impl Into<Arc<str>>,
        args: impl IntoIterator<Item = TypeDescriptor>,
    ) -> TypeDescriptor {
        TypeDescriptor {
            raw: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// The wildcard top type.
    pub fn object() -> TypeDescriptor {
        TypeDescriptor::new(raw::OBJECT)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn args(&self) -> &[TypeDescriptor] {
        &self.args
    }

    pub fn arg(&self, i: usize) -> Option<&TypeDescriptor> {
        self.args.get(i)
    }

    pub fn is_parameterized(&self) -> bool {
        !self.args.is_empty()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, a) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{a}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> TypeDescriptor {
        TypeDescriptor::new(name.to_owned())
    }
}

impl From<String> for TypeDescriptor {
    fn from(name: String) -> TypeDescriptor {
        TypeDescriptor::new(name)
    }
}

/// A declared type expression: either a type variable or a raw type
/// applied to argument expressions.
#[derive(Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Var(String),
    Apply { raw: String, args: Vec<TypeExpr> },
}

impl TypeExpr {
    pub fn named(raw_name: &str) -> TypeExpr {
        TypeExpr::Apply {
            raw: raw_name.to_owned(),
            args: Vec::new(),
        }
    }

    pub fn var(name: &str) -> TypeExpr {
        TypeExpr::Var(name.to_owned())
    }

    pub fn generic(raw_name: &str, args: impl IntoIterator<Item = TypeExpr>) -> TypeExpr {
        TypeExpr::Apply {
            raw: raw_name.to_owned(),
            args: args.into_iter().collect(),
        }
    }

    pub fn object() -> TypeExpr {
        TypeExpr::named(raw::OBJECT)
    }

    /// Resolves this expression to a descriptor. An unbound variable is a
    /// configuration error: callers pre-populate bindings for every
    /// in-scope parameter (defaulting unresolved ones to their bound).
    pub fn resolve(&self, bindings: &Bindings) -> Result<TypeDescriptor, Error> {
        match self {
            TypeExpr::Var(name) => bindings.get(name).cloned().ok_or_else(|| {
                Error::configuration(format!("unresolved type variable '{name}'"))
            }),
            TypeExpr::Apply { raw, args } => {
                let resolved = args
                    .iter()
                    .map(|a| a.resolve(bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeDescriptor::parameterized(raw.clone(), resolved))
            }
        }
    }

    /// Substitutes variables with other expressions; variables absent from
    /// the map become the wildcard top type.
    pub fn substitute(&self, map: &HashMap<String, TypeExpr>) -> TypeExpr {
        match self {
            TypeExpr::Var(name) => map.get(name).cloned().unwrap_or_else(TypeExpr::object),
            TypeExpr::Apply { raw, args } => TypeExpr::Apply {
                raw: raw.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
        }
    }

    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TypeExpr::Var(_) => None,
            TypeExpr::Apply { raw, .. } => Some(raw),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Var(name) => write!(f, "{name}"),
            TypeExpr::Apply { raw, args } => {
                f.write_str(raw)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// A declared type parameter with an optional upper bound.
#[derive(Clone, Debug)]
pub struct TypeParam {
    pub name: String,
    pub bound: Option<TypeExpr>,
}

impl TypeParam {
    pub fn new(name: &str) -> TypeParam {
        TypeParam {
            name: name.to_owned(),
            bound: None,
        }
    }

    pub fn bounded(name: &str, bound: TypeExpr) -> TypeParam {
        TypeParam {
            name: name.to_owned(),
            bound: Some(bound),
        }
    }
}
