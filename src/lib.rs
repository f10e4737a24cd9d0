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

//! # docmap
//!
//! A polymorphic object-graph mapping engine for structured document
//! formats. Callers declare a type model (class-like hierarchies, generic
//! containers, nested generics) through a builder API; the engine resolves
//! the correct encoder/decoder for any requested type at runtime, caches
//! the result, and dispatches polymorphic decodes through an embedded
//! discriminator tag while tolerating legacy data that lacks one.
//!
//! ## Architecture
//!
//! - **`model`**: the declared type universe — descriptors, schema
//!   definitions, the type hierarchy graph, and field enumeration with
//!   generic substitution
//! - **`codec`**: the codec registry (resolution, memoization, cycle
//!   breaking) and the monomorphic/polymorphic/container codecs
//! - **`wire`**: the `StructuredWriter`/`StructuredReader` cursor
//!   capability plus an in-memory binary document implementation
//! - **`value`**: the dynamic runtime representation of mapped instances
//! - **`mapper`**: the configuration builder and public facade
//! - **`buffer`**: little-endian byte buffer underlying the shipped wire
//!   format
//! - **`error`**: error taxonomy and result types
//!
//! ## Usage
//!
//! ```rust
//! use docmap::mapper::MapperBuilder;
//! use docmap::model::{FieldDef, TypeDef, TypeExpr};
//! use docmap::types::raw;
//!
//! let mapper = MapperBuilder::new()
//!     .register_type(TypeDef::interface("Shape"))
//!     .register_type(
//!         TypeDef::concrete("Circle")
//!             .implements(TypeExpr::named("Shape"))
//!             .field(FieldDef::new("radius", TypeExpr::named(raw::INT32))),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let codec = mapper.codec_for(&"Shape".into()).unwrap();
//! assert!(codec.is_some());
//! ```

pub mod buffer;
pub mod codec;
pub mod error;
pub mod mapper;
pub mod model;
pub mod types;
pub mod value;
pub mod wire;
