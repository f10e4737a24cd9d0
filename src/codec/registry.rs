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

//! Codec resolution, memoization and cycle breaking.
//!
//! Resolution for a type runs at most once: finished codecs live in a
//! read-optimized map keyed by [`TypeDescriptor`], and construction is
//! single-flight behind a mutex. A type that re-enters its own
//! construction (mutually recursive entity fields) receives a
//! [`DeferredCodec`] placeholder whose cell is filled when the outer
//! construction completes.
//!
//! Resolution order: finished codecs and explicit registrations, user
//! resolvers, built-in raws (packed arrays, enums, containers), then the
//! declared model (one candidate and no hierarchy pressure yields a
//! monomorphic [`EntityCodec`]; anything else a [`PolymorphicCodec`]).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::codec::container::{
    DocumentCodec, ListCodec, MapCodec, PrimitiveArrayCodec, SetCodec, WildcardCodec,
};
use crate::codec::deferred::DeferredCodec;
use crate::codec::entity::EntityCodec;
use crate::codec::polymorphic::PolymorphicCodec;
use crate::codec::scalar::{
    BinaryCodec, BoolCodec, DateTimeCodec, EnumCodec, Float64Codec, Int32Codec, Int64Codec,
    StringCodec,
};
use crate::codec::{Codec, CodecResolver};
use crate::error::Error;
use crate::model::schema::EntityErrorPolicy;
use crate::model::{FieldModel, ObjectModel, TypeDescriptor, TypeGraph, TypeKind};
use crate::types::raw;

pub struct CodecRegistry {
    model: Arc<ObjectModel>,
    graph: TypeGraph,
    fields: FieldModel,
    named: HashMap<String, Arc<dyn Codec>>,
    field_overrides: HashMap<(String, String), Arc<dyn Codec>>,
    resolvers: Vec<Arc<dyn CodecResolver>>,
    entity_error: EntityErrorPolicy,
    ready: RwLock<HashMap<TypeDescriptor, Arc<dyn Codec>>>,
    building: Mutex<HashMap<TypeDescriptor, Arc<DeferredCodec>>>,
}

fn lock_poisoned() -> Error {
    Error::configuration("codec registry lock poisoned")
}

impl CodecRegistry {
    /// Builds the registry with the built-in scalar, wildcard and document
    /// codecs pre-seeded. Call inside `Arc::new_cyclic` so the wildcard
    /// codec can route entity values back through the registry.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        model: Arc<ObjectModel>,
        graph: TypeGraph,
        fields: FieldModel,
        named: HashMap<String, Arc<dyn Codec>>,
        field_overrides: HashMap<(String, String), Arc<dyn Codec>>,
        resolvers: Vec<Arc<dyn CodecResolver>>,
        entity_error: EntityErrorPolicy,
        explicit: Vec<Arc<dyn Codec>>,
        self_ref: Weak<CodecRegistry>,
    ) -> CodecRegistry {
        let mut ready: HashMap<TypeDescriptor, Arc<dyn Codec>> = HashMap::new();
        let seeds: Vec<Arc<dyn Codec>> = vec![
            Arc::new(BoolCodec::new()),
            Arc::new(Int32Codec::new()),
            Arc::new(Int64Codec::new()),
            Arc::new(Float64Codec::new()),
            Arc::new(StringCodec::new()),
            Arc::new(DateTimeCodec::new()),
            Arc::new(BinaryCodec::new()),
        ];
        for codec in seeds {
            ready.insert(codec.target().clone(), codec);
        }
        let wildcard: Arc<dyn Codec> = Arc::new(WildcardCodec::new(self_ref));
        ready.insert(TypeDescriptor::object(), wildcard.clone());
        let document: Arc<dyn Codec> = Arc::new(DocumentCodec::new(wildcard));
        ready.insert(document.target().clone(), document);
        // Explicit registrations take precedence over everything,
        // built-ins included.
        for codec in explicit {
            ready.insert(codec.target().clone(), codec);
        }

        CodecRegistry {
            model,
            graph,
            fields,
            named,
            field_overrides,
            resolvers,
            entity_error,
            ready: RwLock::new(ready),
            building: Mutex::new(HashMap::new()),
        }
    }

    pub fn model(&self) -> &Arc<ObjectModel> {
        &self.model
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Resolves the codec for a type, building and memoizing it on first
    /// request. `Ok(None)` means no resolution step handles the type.
    pub fn get(&self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        if let Some(codec) = self.ready_get(ty)? {
            return Ok(Some(codec));
        }
        let mut building = self.building.lock().map_err(|_| lock_poisoned())?;
        let mut cx = Resolution {
            registry: self,
            building: &mut building,
        };
        cx.get(ty)
    }

    fn ready_get(&self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        Ok(self
            .ready
            .read()
            .map_err(|_| lock_poisoned())?
            .get(ty)
            .cloned())
    }

    fn ready_insert(&self, ty: TypeDescriptor, codec: Arc<dyn Codec>) -> Result<(), Error> {
        self.ready
            .write()
            .map_err(|_| lock_poisoned())?
            .insert(ty, codec);
        Ok(())
    }
}

/// Re-entrant view of one in-flight resolution.
///
/// Holds the construction lock for its whole lifetime, so nested
/// [`get`](Self::get) calls recurse without re-locking and see the
/// placeholders of every type currently under construction.
pub struct Resolution<'a> {
    registry: &'a CodecRegistry,
    building: &'a mut HashMap<TypeDescriptor, Arc<DeferredCodec>>,
}

impl Resolution<'_> {
    pub fn model(&self) -> &Arc<ObjectModel> {
        &self.registry.model
    }

    pub fn graph(&self) -> &TypeGraph {
        &self.registry.graph
    }

    pub fn fields(&self) -> &FieldModel {
        &self.registry.fields
    }

    pub fn entity_error_policy(&self) -> EntityErrorPolicy {
        self.registry.entity_error
    }

    /// A codec registered under a name, for field-level overrides.
    pub fn named(&self, name: &str) -> Option<Arc<dyn Codec>> {
        self.registry.named.get(name).cloned()
    }

    /// A codec pinned to one declared field of one type.
    pub fn field_override(&self, declared_by: &str, field: &str) -> Option<Arc<dyn Codec>> {
        self.registry
            .field_overrides
            .get(&(declared_by.to_owned(), field.to_owned()))
            .cloned()
    }

    /// Resolves a dependency codec with full memoization. A request for a
    /// type already under construction returns its placeholder.
    pub fn get(&mut self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        if let Some(codec) = self.registry.ready_get(ty)? {
            return Ok(Some(codec));
        }
        if let Some(deferred) = self.building.get(ty) {
            return Ok(Some(deferred.clone()));
        }

        let deferred = Arc::new(DeferredCodec::new(ty.clone()));
        self.building.insert(ty.clone(), deferred.clone());
        let outcome = self.build(ty);
        self.building.remove(ty);
        match outcome {
            Ok(Some(codec)) => {
                deferred.fill(codec.clone());
                self.registry.ready_insert(ty.clone(), codec.clone())?;
                Ok(Some(codec))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn build(&mut self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        for i in 0..self.registry.resolvers.len() {
            let resolver = self.registry.resolvers[i].clone();
            if let Some(codec) = resolver.resolve(ty, self)? {
                return Ok(Some(codec));
            }
        }
        if let Some(codec) = self.build_builtin(ty)? {
            return Ok(Some(codec));
        }
        self.build_from_model(ty)
    }

    fn require(&mut self, ty: &TypeDescriptor) -> Result<Arc<dyn Codec>, Error> {
        self.get(ty)?
            .ok_or_else(|| Error::configuration(format!("no codec for type '{ty}'")))
    }

    fn build_builtin(&mut self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        let arg = |i: usize| ty.arg(i).cloned().unwrap_or_else(TypeDescriptor::object);
        match ty.raw() {
            raw::LIST => {
                let elem = self.require(&arg(0))?;
                Ok(Some(Arc::new(ListCodec::new(ty.clone(), elem))))
            }
            raw::SET => {
                let elem = self.require(&arg(0))?;
                Ok(Some(Arc::new(SetCodec::new(ty.clone(), elem, false))))
            }
            raw::SORTED_SET => {
                let elem = self.require(&arg(0))?;
                Ok(Some(Arc::new(SetCodec::new(ty.clone(), elem, true))))
            }
            raw::MAP => {
                let key = self.require(&arg(0))?;
                let value = self.require(&arg(1))?;
                Ok(Some(Arc::new(MapCodec::new(ty.clone(), key, value))))
            }
            raw::ARRAY => {
                let elem_ty = arg(0);
                match packable(elem_ty.raw()) {
                    Some(elem_raw) => Ok(Some(Arc::new(PrimitiveArrayCodec::new(
                        ty.clone(),
                        elem_raw,
                    )))),
                    None => {
                        let elem = self.require(&elem_ty)?;
                        Ok(Some(Arc::new(ListCodec::new(ty.clone(), elem))))
                    }
                }
            }
            name => match self.registry.model.get(name) {
                Some(def) if def.kind == TypeKind::Enum => Ok(Some(Arc::new(EnumCodec::new(
                    ty.clone(),
                    def.variants.clone(),
                )))),
                _ => Ok(None),
            },
        }
    }

    fn build_from_model(&mut self, ty: &TypeDescriptor) -> Result<Option<Arc<dyn Codec>>, Error> {
        let candidates = self.registry.graph.candidate_types(ty)?;
        if candidates.is_empty() {
            return Ok(None);
        }
        if candidates.len() == 1 && !self.registry.graph.is_polymorphic(&candidates) {
            let codec = EntityCodec::new(&candidates[0], self)?;
            return Ok(Some(Arc::new(codec)));
        }
        let codec = PolymorphicCodec::new(ty, &candidates, self)?;
        Ok(Some(Arc::new(codec)))
    }
}

/// The interned raw name for a packable primitive element type.
fn packable(name: &str) -> Option<&'static str> {
    raw::PRIMITIVES.iter().find(|&&p| p == name).copied()
}
