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

//! Public facade: configuration builder and the mapper itself.
//!
//! A [`MapperBuilder`] collects type definitions, codec registrations and
//! policy defaults, then validates everything once in
//! [`build`](MapperBuilder::build). The resulting [`DocumentMapper`] is
//! immutable and shareable across threads.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{Codec, CodecRegistry, CodecResolver};
use crate::error::Error;
use crate::model::schema::{
    EntityErrorPolicy, FieldErrorPolicy, NullPolicy, PolicyDefaults, UndefinedPolicy,
};
use crate::model::{FieldModel, ObjectModel, TypeDef, TypeDescriptor, TypeGraph, TypeSource};
use crate::value::Value;
use crate::wire::{DocumentReader, DocumentWriter};

#[derive(Default)]
pub struct MapperBuilder {
    defs: Vec<(TypeDef, bool)>,
    named: HashMap<String, Arc<dyn Codec>>,
    field_overrides: HashMap<(String, String), Arc<dyn Codec>>,
    explicit: Vec<Arc<dyn Codec>>,
    resolvers: Vec<Arc<dyn CodecResolver>>,
    defaults: PolicyDefaults,
}

impl MapperBuilder {
    pub fn new() -> MapperBuilder {
        MapperBuilder::default()
    }

    /// Registers a type as a resolution candidate and hierarchy member.
    pub fn register_type(mut self, def: TypeDef) -> MapperBuilder {
        self.defs.push((def, true));
        self
    }

    /// Declares a type the model must know about (ancestor walks, generic
    /// bounds) without making it a resolution candidate.
    pub fn declare_type(mut self, def: TypeDef) -> MapperBuilder {
        self.defs.push((def, false));
        self
    }

    /// Registers every type yielded by a source.
    pub fn with_source(mut self, source: &dyn TypeSource) -> MapperBuilder {
        for def in source.types() {
            self.defs.push((def, true));
        }
        self
    }

    /// Pins a codec to its target type, ahead of every resolution step.
    pub fn register_codec(mut self, codec: Arc<dyn Codec>) -> MapperBuilder {
        self.explicit.push(codec);
        self
    }

    /// Registers a codec under a name for field-level `with_codec` refs.
    pub fn register_named_codec(mut self, name: &str, codec: Arc<dyn Codec>) -> MapperBuilder {
        self.named.insert(name.to_owned(), codec);
        self
    }

    /// Pins a codec to one declared field of one type, overriding both
    /// named and type-based resolution for that field.
    pub fn register_field_codec(
        mut self,
        type_name: &str,
        field: &str,
        codec: Arc<dyn Codec>,
    ) -> MapperBuilder {
        self.field_overrides
            .insert((type_name.to_owned(), field.to_owned()), codec);
        self
    }

    /// Appends a resolver consulted (in registration order) before the
    /// built-in resolution steps.
    pub fn register_resolver(mut self, resolver: Arc<dyn CodecResolver>) -> MapperBuilder {
        self.resolvers.push(resolver);
        self
    }

    pub fn null_policy(mut self, policy: NullPolicy) -> MapperBuilder {
        self.defaults.on_null = policy;
        self
    }

    pub fn undefined_policy(mut self, policy: UndefinedPolicy) -> MapperBuilder {
        self.defaults.on_undefined = policy;
        self
    }

    pub fn field_error_policy(mut self, policy: FieldErrorPolicy) -> MapperBuilder {
        self.defaults.on_error = policy;
        self
    }

    pub fn entity_error_policy(mut self, policy: EntityErrorPolicy) -> MapperBuilder {
        self.defaults.on_entity_error = policy;
        self
    }

    /// Validates the model and produces an immutable mapper.
    pub fn build(self) -> Result<DocumentMapper, Error> {
        let model = Arc::new(ObjectModel::build(self.defs)?);
        let graph = TypeGraph::build(model.clone())?;
        let fields = FieldModel::new(model.clone(), self.defaults);
        let entity_error = self.defaults.on_entity_error;
        let (named, field_overrides, resolvers, explicit) = (
            self.named,
            self.field_overrides,
            self.resolvers,
            self.explicit,
        );
        let registry = Arc::new_cyclic(|weak| {
            CodecRegistry::new(
                model.clone(),
                graph,
                fields,
                named,
                field_overrides,
                resolvers,
                entity_error,
                explicit,
                weak.clone(),
            )
        });
        Ok(DocumentMapper { registry, model })
    }
}

/// Thread-safe mapping facade over a validated model.
pub struct DocumentMapper {
    registry: Arc<CodecRegistry>,
    model: Arc<ObjectModel>,
}

impl DocumentMapper {
    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    pub fn model(&self) -> &Arc<ObjectModel> {
        &self.model
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    /// Resolves (building and caching if needed) the codec for a type.
    /// `Ok(None)` means the type is outside the declared model.
    pub fn codec_for(&self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        self.registry.get(ty)
    }

    fn require(&self, ty: &TypeDescriptor) -> Result<Arc<dyn Codec>, Error> {
        self.codec_for(ty)?
            .ok_or_else(|| Error::configuration(format!("no codec for type '{ty}'")))
    }

    /// Encodes a value as the given type into the shipped binary document
    /// format.
    pub fn encode_value(&self, ty: &TypeDescriptor, value: &Value) -> Result<Vec<u8>, Error> {
        let codec = self.require(ty)?;
        let mut writer = DocumentWriter::new();
        codec.encode(value, &mut writer)?;
        writer.finish()
    }

    /// Decodes a value of the given type from the shipped binary document
    /// format.
    pub fn decode_value(&self, ty: &TypeDescriptor, bytes: &[u8]) -> Result<Value, Error> {
        let codec = self.require(ty)?;
        let mut reader = DocumentReader::new(bytes);
        codec.decode(&mut reader)
    }
}
