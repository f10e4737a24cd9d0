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

//! Core wire and model constants: the value-kind discriminants of the
//! shipped document format, the built-in raw type names, and the reserved
//! wire keys.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Wire-level kind tag of a single value in the shipped document format.
///
/// `End` is the sentinel closing a document or array region; it is never a
/// standalone value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum ValueKind {
    End = 0,
    Null = 1,
    Bool = 2,
    Int32 = 3,
    Int64 = 4,
    Float64 = 5,
    String = 6,
    DateTime = 7,
    Binary = 8,
    Document = 9,
    Array = 10,
}

/// Reserved wire field name for identifier fields.
pub const ID_KEY: &str = "_id";

/// Default wire field name for the polymorphic discriminator.
pub const DEFAULT_DISCRIMINATOR_KEY: &str = "_t";

/// Built-in raw type names. User `TypeDef` names share the same namespace;
/// registering a type under one of these is a configuration error.
pub mod raw {
    pub const BOOL: &str = "bool";
    pub const INT32: &str = "int32";
    pub const INT64: &str = "int64";
    pub const FLOAT64: &str = "float64";
    pub const STRING: &str = "string";
    pub const DATETIME: &str = "datetime";
    pub const BINARY: &str = "binary";

    /// Wildcard top type: every type is assignable to `object`.
    pub const OBJECT: &str = "object";
    /// Dynamic keyed region with no declared schema.
    pub const DOCUMENT: &str = "document";

    pub const LIST: &str = "list";
    pub const SET: &str = "set";
    pub const SORTED_SET: &str = "sorted_set";
    pub const MAP: &str = "map";
    pub const ARRAY: &str = "array";

    /// Scalar raws whose arrays pack into a bulk binary element.
    pub const PRIMITIVES: &[&str] = &[BOOL, INT32, INT64, FLOAT64];

    /// All built-in raw names, used to reject colliding registrations.
    pub const ALL: &[&str] = &[
        BOOL, INT32, INT64, FLOAT64, STRING, DATETIME, BINARY, OBJECT, DOCUMENT, LIST, SET,
        SORTED_SET, MAP, ARRAY,
    ];

    pub fn is_builtin(name: &str) -> bool {
        ALL.contains(&name)
    }

    pub fn is_primitive(name: &str) -> bool {
        PRIMITIVES.contains(&name)
    }
}
