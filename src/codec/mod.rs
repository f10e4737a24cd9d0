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

//! Codec traits, resolution, and the shipped codec implementations.
//!
//! [`registry`] owns resolution, memoization and cycle breaking;
//! [`entity`] and [`polymorphic`] map model types; [`container`] and
//! [`scalar`] cover the built-in raws; [`deferred`] is the two-phase cell
//! that breaks reference cycles between mutually recursive types.

pub mod container;
pub mod deferred;
pub mod entity;
pub mod polymorphic;
pub mod registry;
pub mod scalar;

pub use registry::{CodecRegistry, Resolution};

use std::sync::Arc;

use crate::error::Error;
use crate::model::TypeDescriptor;
use crate::value::Value;
use crate::wire::{StructuredReader, StructuredWriter};

/// A bidirectional translator between one resolved type and the wire.
///
/// Codecs are immutable and shared; every method takes `&self` and
/// implementations must be `Send + Sync`.
pub trait Codec: Send + Sync {
    /// The resolved type this codec handles; the registry's cache key.
    fn target(&self) -> &TypeDescriptor;

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error>;

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error>;

    /// Value substituted by the force-default null policy and the
    /// default-undefined policy.
    fn default_value(&self) -> Value {
        Value::Null
    }

    /// Whether a runtime value is acceptable input for [`encode`] (and
    /// valid output of [`decode`]). Null is always acceptable; the null
    /// policies decide its fate. Codecs whose accepted shapes are wider
    /// than the target descriptor (enums, hierarchies) override this.
    ///
    /// [`encode`]: Self::encode
    /// [`decode`]: Self::decode
    fn accepts(&self, value: &Value) -> bool {
        value.is_null() || value.conforms_to(self.target())
    }

    /// Downcast seam for identifier-aware entity codecs.
    fn as_collectible(&self) -> Option<&dyn CollectibleCodec> {
        None
    }
}

/// A codec for an entity type with a declared identifier field.
pub trait CollectibleCodec: Codec {
    /// Whether the value already carries a non-null identifier.
    fn has_identifier(&self, value: &Value) -> bool;

    /// Populates a missing identifier via the type's generator and returns
    /// the (existing or generated) identifier value.
    fn ensure_identifier(&self, value: &mut Value) -> Result<Value, Error>;
}

/// User extension point consulted before the built-in resolution steps.
///
/// `Ok(None)` passes the request to the next resolver; the provided
/// [`Resolution`] context recursively resolves dependency codecs with full
/// memoization and cycle breaking.
pub trait CodecResolver: Send + Sync {
    fn resolve(
        &self,
        ty: &TypeDescriptor,
        cx: &mut Resolution<'_>,
    ) -> Result<Option<Arc<dyn Codec>>, Error>;
}
