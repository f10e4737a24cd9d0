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

//! Two-phase placeholder codec that breaks construction cycles.
//!
//! When resolving a type re-enters itself (mutually recursive entity
//! fields), the registry hands the inner request a [`DeferredCodec`] and
//! fills its cell once the real codec finishes construction. Encode and
//! decode through an unfilled cell fail rather than recurse.

use std::sync::{Arc, OnceLock};

use crate::codec::Codec;
use crate::error::Error;
use crate::model::TypeDescriptor;
use crate::value::Value;
use crate::wire::{StructuredReader, StructuredWriter};

pub struct DeferredCodec {
    target: TypeDescriptor,
    cell: OnceLock<Arc<dyn Codec>>,
}

impl DeferredCodec {
    pub fn new(target: TypeDescriptor) -> DeferredCodec {
        DeferredCodec {
            target,
            cell: OnceLock::new(),
        }
    }

    /// Fills the cell; returns false if it was already filled.
    pub fn fill(&self, codec: Arc<dyn Codec>) -> bool {
        self.cell.set(codec).is_ok()
    }

    fn inner(&self) -> Result<&Arc<dyn Codec>, Error> {
        self.cell.get().ok_or_else(|| {
            Error::configuration(format!(
                "codec for '{}' used before its construction completed",
                self.target
            ))
        })
    }
}

impl Codec for DeferredCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        self.inner()?.encode(value, writer)
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        self.inner()?.decode(reader)
    }

    fn default_value(&self) -> Value {
        match self.cell.get() {
            Some(codec) => codec.default_value(),
            None => Value::Null,
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.cell.get() {
            Some(codec) => codec.accepts(value),
            None => true,
        }
    }
}
