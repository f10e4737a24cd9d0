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

//! Flattened per-entity field layouts.
//!
//! [`FieldModel::entity_model`] turns one resolved concrete type into the
//! ordered field list its codec encodes: the inheritance chain is walked
//! root-first with generic arguments substituted at every hop, transient
//! fields drop out, a subclass redeclaration replaces the inherited slot
//! in place, and per-field policies are resolved against the mapper-wide
//! defaults.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::model::descriptor::{Bindings, TypeDescriptor};
use crate::model::schema::{
    FieldErrorPolicy, IdentifierPolicy, NullPolicy, ObjectModel, PolicyDefaults, PostLoadHook,
    TypeDef, TypeKind, UndefinedPolicy,
};
use crate::types::ID_KEY;

/// One mappable field of a resolved entity type, policies resolved.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// Document field name; the identifier field always maps to `_id`.
    pub wire_name: String,
    /// Declared field name, the instance-side key.
    pub field_name: String,
    /// Field type with the owning type's arguments substituted in.
    pub ty: TypeDescriptor,
    /// Name of the type in the chain that (last) declared the field.
    pub declared_by: String,
    pub identifier: bool,
    pub version: bool,
    pub codec_override: Option<String>,
    pub on_null: NullPolicy,
    pub on_undefined: UndefinedPolicy,
    pub on_error: FieldErrorPolicy,
}

/// The complete mapping layout of one resolved concrete type.
pub struct EntityModel {
    pub ty: TypeDescriptor,
    /// Root-first declaration order; this is the encode order.
    pub fields: Vec<FieldDescriptor>,
    by_wire: HashMap<String, usize>,
    pub id_index: Option<usize>,
    /// Post-load hooks of the whole chain, root-first.
    pub hooks: Vec<PostLoadHook>,
    pub id_policy: Option<IdentifierPolicy>,
}

impl EntityModel {
    pub fn field_by_wire_name(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.by_wire.get(wire_name).map(|&i| &self.fields[i])
    }

    pub fn index_by_wire_name(&self, wire_name: &str) -> Option<usize> {
        self.by_wire.get(wire_name).copied()
    }

    pub fn identifier_field(&self) -> Option<&FieldDescriptor> {
        self.id_index.map(|i| &self.fields[i])
    }
}

/// Derives [`EntityModel`]s from the declared model.
pub struct FieldModel {
    model: Arc<ObjectModel>,
    defaults: PolicyDefaults,
}

impl FieldModel {
    pub fn new(model: Arc<ObjectModel>, defaults: PolicyDefaults) -> FieldModel {
        FieldModel { model, defaults }
    }

    pub fn defaults(&self) -> &PolicyDefaults {
        &self.defaults
    }

    /// Builds the field layout for a resolved type. Only concrete types are
    /// instantiable; the error names the precise reason otherwise.
    pub fn entity_model(&self, ty: &TypeDescriptor) -> Result<EntityModel, Error> {
        let def = self
            .model
            .get(ty.raw())
            .cloned()
            .ok_or_else(|| Error::configuration(format!("unknown type '{}'", ty.raw())))?;
        match def.kind {
            TypeKind::Concrete => {}
            TypeKind::Interface => {
                return Err(Error::configuration(format!(
                    "cannot instantiate interface '{}'",
                    def.name
                )));
            }
            TypeKind::Abstract => {
                return Err(Error::configuration(format!(
                    "cannot instantiate abstract type '{}'",
                    def.name
                )));
            }
            TypeKind::Enum => {
                return Err(Error::configuration(format!(
                    "enum '{}' has no field layout",
                    def.name
                )));
            }
        }

        // Collect the supertype chain leaf-to-root, re-deriving each
        // ancestor's bindings from its child's extends clause.
        let mut chain: Vec<(Arc<TypeDef>, Bindings)> = Vec::new();
        let mut bindings = self.model.bindings_for(&def, ty.args())?;
        let mut current = def;
        loop {
            chain.push((current.clone(), bindings.clone()));
            let Some(sup) = &current.supertype else { break };
            let sup_desc = sup.resolve(&bindings)?;
            let sup_def = self
                .model
                .get(sup_desc.raw())
                .cloned()
                .ok_or_else(|| {
                    Error::configuration(format!("unknown supertype '{}'", sup_desc.raw()))
                })?;
            bindings = self.model.bindings_for(&sup_def, sup_desc.args())?;
            current = sup_def;
        }
        chain.reverse();

        let mut fields: Vec<FieldDescriptor> = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut hooks: Vec<PostLoadHook> = Vec::new();
        let mut id_policy: Option<IdentifierPolicy> = None;

        for (def, bindings) in &chain {
            hooks.extend(def.post_load.iter().cloned());
            if let Some(policy) = &def.id_policy {
                id_policy = Some(policy.clone());
            }
            for field in &def.fields {
                if field.meta.transient {
                    continue;
                }
                let field_ty = field.ty.resolve(bindings)?;
                let wire_name = if field.meta.identifier {
                    ID_KEY.to_owned()
                } else {
                    field.name.clone()
                };
                let descriptor = FieldDescriptor {
                    wire_name,
                    field_name: field.name.clone(),
                    ty: field_ty,
                    declared_by: def.name.clone(),
                    identifier: field.meta.identifier,
                    version: field.meta.version,
                    codec_override: field.meta.codec.clone(),
                    on_null: field.meta.on_null.unwrap_or(self.defaults.on_null),
                    on_undefined: field.meta.on_undefined.unwrap_or(self.defaults.on_undefined),
                    on_error: field.meta.on_error.unwrap_or(self.defaults.on_error),
                };
                match by_name.get(&field.name) {
                    // A redeclaration shadows the inherited slot in place,
                    // keeping the root-first encode order stable.
                    Some(&i) => fields[i] = descriptor,
                    None => {
                        by_name.insert(field.name.clone(), fields.len());
                        fields.push(descriptor);
                    }
                }
            }
        }

        let mut by_wire: HashMap<String, usize> = HashMap::new();
        let mut id_index = None;
        for (i, field) in fields.iter().enumerate() {
            if by_wire.insert(field.wire_name.clone(), i).is_some() {
                return Err(Error::configuration(format!(
                    "type '{}' maps two fields to document name '{}'",
                    ty.raw(),
                    field.wire_name
                )));
            }
            if field.identifier {
                if id_index.is_some() {
                    return Err(Error::configuration(format!(
                        "type '{}' declares more than one identifier field",
                        ty.raw()
                    )));
                }
                id_index = Some(i);
            }
        }

        Ok(EntityModel {
            ty: ty.clone(),
            fields,
            by_wire,
            id_index,
            hooks,
            id_policy,
        })
    }
}
