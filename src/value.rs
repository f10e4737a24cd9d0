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

//! Dynamic runtime representation of mapped values.
//!
//! The type model is declared data (see [`crate::model`]), so instances of
//! model types are dynamic records rather than native Rust structs: an
//! [`Instance`] carries its concrete [`TypeDescriptor`] plus a field map.
//! Codecs translate between this representation and the wire cursor.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::model::TypeDescriptor;
use crate::types::raw;

/// A dynamic value: scalar, container, or model-typed entity.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
    /// Ordered element sequence; also the runtime shape of sets and arrays.
    Array(Vec<Value>),
    /// Dynamic keyed region with no declared schema.
    Document(Vec<(String, Value)>),
    /// Key/value pairs; keys need not be strings.
    Map(Vec<(Value, Value)>),
    Entity(Instance),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Binary(_) => "binary",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
            Value::Map(_) => "map",
            Value::Entity(_) => "entity",
        }
    }

    /// True if this value can be assigned to a slot of the given declared
    /// type without coercion. Containers are checked shallowly; element
    /// conformance is enforced by their codecs during encode.
    pub fn conforms_to(&self, ty: &TypeDescriptor) -> bool {
        if ty.raw() == raw::OBJECT {
            return true;
        }
        match self {
            Value::Null => true,
            Value::Bool(_) => ty.raw() == raw::BOOL,
            Value::Int32(_) => ty.raw() == raw::INT32,
            Value::Int64(_) => ty.raw() == raw::INT64,
            Value::Float64(_) => ty.raw() == raw::FLOAT64,
            Value::String(_) => ty.raw() == raw::STRING,
            Value::DateTime(_) => ty.raw() == raw::DATETIME,
            Value::Binary(_) => ty.raw() == raw::BINARY,
            Value::Array(_) => {
                matches!(
                    ty.raw(),
                    raw::LIST | raw::SET | raw::SORTED_SET | raw::ARRAY
                )
            }
            Value::Document(_) => ty.raw() == raw::DOCUMENT,
            Value::Map(_) => ty.raw() == raw::MAP,
            Value::Entity(inst) => inst.ty().raw() == ty.raw(),
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int32(_) => 2,
            Value::Int64(_) => 3,
            Value::Float64(_) => 4,
            Value::String(_) => 5,
            Value::DateTime(_) => 6,
            Value::Binary(_) => 7,
            Value::Array(_) => 8,
            Value::Document(_) => 9,
            Value::Map(_) => 10,
            Value::Entity(_) => 11,
        }
    }

    /// Total order over values: nulls first, then by kind, then by payload.
    /// Used by the sorted-set codec and for set deduplication.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => cmp_seq(a, b),
            (Value::Document(a), Value::Document(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Map(a), Value::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.total_cmp(kb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Entity(a), Value::Entity(b)) => a
                .ty()
                .raw()
                .cmp(b.ty().raw())
                .then_with(|| cmp_fields(a, b)),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

fn cmp_seq(a: &[Value], b: &[Value]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x.total_cmp(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_fields(a: &Instance, b: &Instance) -> Ordering {
    for ((ka, va), (kb, vb)) in a.fields().zip(b.fields()) {
        let ord = ka.cmp(kb).then_with(|| va.total_cmp(vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.field_count().cmp(&b.field_count())
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::String(v)
    }
}

impl From<Instance> for Value {
    fn from(v: Instance) -> Value {
        Value::Entity(v)
    }
}

/// A dynamic instance of a concrete model type.
///
/// Fields are keyed by *field name* (not wire name); absent fields read as
/// [`Value::Null`]. The field map is sorted for deterministic iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    ty: TypeDescriptor,
    fields: BTreeMap<String, Value>,
}

impl Instance {
    pub fn new(ty: TypeDescriptor) -> Instance {
        Instance {
            ty,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment for test and call-site ergonomics.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Instance {
        self.set(field, value.into());
        self
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Returns the field value, or `Null` if the field was never set.
    pub fn get(&self, field: &str) -> &Value {
        self.fields.get(field).unwrap_or(&Value::Null)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        if value.is_null() {
            self.fields.remove(field);
        } else {
            self.fields.insert(field.to_owned(), value);
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}
