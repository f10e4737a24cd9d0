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

//! The declared type model and its derived views.
//!
//! [`descriptor`] holds type identities, [`schema`] the registration-time
//! definitions, [`graph`] the type hierarchy with candidate resolution,
//! and [`fields`] the flattened per-entity field layouts.

pub mod descriptor;
pub mod fields;
pub mod graph;
pub mod schema;

pub use descriptor::{Bindings, TypeDescriptor, TypeExpr, TypeParam};
pub use fields::{EntityModel, FieldDescriptor, FieldModel};
pub use graph::TypeGraph;
pub use schema::{
    DiscriminatorDef, EntityErrorPolicy, FieldDef, FieldErrorPolicy, FieldMetadata,
    IdentifierPolicy, NullPolicy, ObjectModel, PolicyDefaults, PostLoadHook, TypeDef, TypeKind,
    TypeSource, UndefinedPolicy,
};
