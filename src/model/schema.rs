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

//! Declarative type schema: the registration-time description of the
//! object model the engine maps.
//!
//! A [`TypeDef`] describes one class-like type — its kind, type
//! parameters, supertype/interface relations, fields with per-field
//! [`FieldMetadata`], discriminator configuration, post-load hooks, and
//! identifier generation. Definitions are supplied through a
//! [`TypeSource`] and validated into an immutable [`ObjectModel`] once at
//! mapper build time.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::model::descriptor::{Bindings, TypeDescriptor, TypeExpr, TypeParam};
use crate::types::raw;
use crate::value::{Instance, Value};

/// What kind of type a definition describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Interface,
    Abstract,
    Concrete,
    Enum,
}

/// Encode-side policy for a null field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Write the field only when its value is non-null.
    #[default]
    Omit,
    /// Substitute the field type's default (e.g. an empty container).
    ForceDefault,
    /// Write an explicit null marker.
    KeepNull,
}

/// Decode-side policy for a field absent from the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UndefinedPolicy {
    /// Leave the field at its post-construction default (null).
    #[default]
    LeaveUnset,
    /// Assign the field type's default.
    Default,
}

/// Decode-side policy for a field-level decode error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FieldErrorPolicy {
    /// Propagate the error and abort the whole instance decode.
    #[default]
    Rethrow,
    /// Null the field and continue.
    Null,
    /// Silently omit the field and continue.
    Skip,
}

/// Policy for a whole-instance decode failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EntityErrorPolicy {
    #[default]
    Rethrow,
    /// Return null for the one bad instance, consuming its input fully.
    Null,
}

/// Mapper-wide policy defaults, overridable per field.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyDefaults {
    pub on_null: NullPolicy,
    pub on_undefined: UndefinedPolicy,
    pub on_error: FieldErrorPolicy,
    pub on_entity_error: EntityErrorPolicy,
}

/// Precomputed per-field mapping flags. `None` policies fall back to the
/// mapper-wide [`PolicyDefaults`].
#[derive(Clone, Debug, Default)]
pub struct FieldMetadata {
    pub identifier: bool,
    pub version: bool,
    pub transient: bool,
    /// Name of a registered custom codec overriding type-based resolution.
    pub codec: Option<String>,
    pub on_null: Option<NullPolicy>,
    pub on_undefined: Option<UndefinedPolicy>,
    pub on_error: Option<FieldErrorPolicy>,
}

/// One declared persistable field.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    pub meta: FieldMetadata,
}

impl FieldDef {
    pub fn new(name: &str, ty: TypeExpr) -> FieldDef {
        FieldDef {
            name: name.to_owned(),
            ty,
            meta: FieldMetadata::default(),
        }
    }

    pub fn identifier(mut self) -> FieldDef {
        self.meta.identifier = true;
        self
    }

    pub fn version(mut self) -> FieldDef {
        self.meta.version = true;
        self
    }

    pub fn transient(mut self) -> FieldDef {
        self.meta.transient = true;
        self
    }

    pub fn with_codec(mut self, name: &str) -> FieldDef {
        self.meta.codec = Some(name.to_owned());
        self
    }

    pub fn on_null(mut self, policy: NullPolicy) -> FieldDef {
        self.meta.on_null = Some(policy);
        self
    }

    pub fn on_undefined(mut self, policy: UndefinedPolicy) -> FieldDef {
        self.meta.on_undefined = Some(policy);
        self
    }

    pub fn on_error(mut self, policy: FieldErrorPolicy) -> FieldDef {
        self.meta.on_error = Some(policy);
        self
    }
}

/// Discriminator configuration for one type.
#[derive(Clone, Debug, Default)]
pub struct DiscriminatorDef {
    /// True when the type explicitly declares a discriminator; makes a
    /// single-candidate hierarchy polymorphic ahead of a second
    /// implementation.
    pub enabled: bool,
    /// Wire field name; defaults to [`crate::types::DEFAULT_DISCRIMINATOR_KEY`].
    pub key: Option<String>,
    /// Discriminator string written on encode; defaults to the type name.
    pub value: Option<String>,
    /// Additional strings that decode to this type; never encoded.
    pub aliases: Vec<String>,
    /// Decode destination for legacy data lacking a discriminator.
    pub fallback: bool,
}

/// Hook invoked after all fields of a decoded instance are populated.
pub type PostLoadHook = Arc<dyn Fn(&mut Instance) -> Result<(), Error> + Send + Sync>;

/// Generator invoked by `ensure_identifier` for a collectible type whose
/// identifier is absent. Receives the instance for derived identifiers.
pub type IdGenerator = Arc<dyn Fn(&Instance) -> Result<Value, Error> + Send + Sync>;

/// Identifier generation policy of one concrete type.
#[derive(Clone)]
pub struct IdentifierPolicy {
    /// Whether an absent identifier is auto-generated on write.
    pub collectible: bool,
    pub generator: IdGenerator,
}

impl fmt::Debug for IdentifierPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierPolicy")
            .field("collectible", &self.collectible)
            .finish_non_exhaustive()
    }
}

/// Declarative definition of one model type.
#[derive(Clone)]
pub struct TypeDef {
    pub name: String,
    pub kind: TypeKind,
    pub params: Vec<TypeParam>,
    pub supertype: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    pub fields: Vec<FieldDef>,
    pub discriminator: DiscriminatorDef,
    /// Explicit forward-compatible polymorphism marker.
    pub polymorphic: bool,
    /// Variant names; only for [`TypeKind::Enum`].
    pub variants: Vec<String>,
    pub post_load: Vec<PostLoadHook>,
    pub id_policy: Option<IdentifierPolicy>,
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields.len())
            .finish_non_exhaustive()
    }
}

impl TypeDef {
    fn with_kind(name: &str, kind: TypeKind) -> TypeDef {
        TypeDef {
            name: name.to_owned(),
            kind,
            params: Vec::new(),
            supertype: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            discriminator: DiscriminatorDef::default(),
            polymorphic: false,
            variants: Vec::new(),
            post_load: Vec::new(),
            id_policy: None,
        }
    }

    pub fn concrete(name: &str) -> TypeDef {
        TypeDef::with_kind(name, TypeKind::Concrete)
    }

    pub fn abstract_type(name: &str) -> TypeDef {
        TypeDef::with_kind(name, TypeKind::Abstract)
    }

    pub fn interface(name: &str) -> TypeDef {
        TypeDef::with_kind(name, TypeKind::Interface)
    }

    pub fn enumeration(name: &str, variants: impl IntoIterator<Item = &'static str>) -> TypeDef {
        let mut def = TypeDef::with_kind(name, TypeKind::Enum);
        def.variants = variants.into_iter().map(str::to_owned).collect();
        def
    }

    pub fn type_param(mut self, param: TypeParam) -> TypeDef {
        self.params.push(param);
        self
    }

    pub fn extends(mut self, supertype: TypeExpr) -> TypeDef {
        self.supertype = Some(supertype);
        self
    }

    pub fn implements(mut self, interface: TypeExpr) -> TypeDef {
        self.interfaces.push(interface);
        self
    }

    pub fn field(mut self, field: FieldDef) -> TypeDef {
        self.fields.push(field);
        self
    }

    /// Explicitly declares a discriminator on this type.
    pub fn with_discriminator(mut self) -> TypeDef {
        self.discriminator.enabled = true;
        self
    }

    pub fn discriminator_key(mut self, key: &str) -> TypeDef {
        self.discriminator.enabled = true;
        self.discriminator.key = Some(key.to_owned());
        self
    }

    pub fn discriminator_value(mut self, value: &str) -> TypeDef {
        self.discriminator.enabled = true;
        self.discriminator.value = Some(value.to_owned());
        self
    }

    pub fn discriminator_alias(mut self, alias: &str) -> TypeDef {
        self.discriminator.aliases.push(alias.to_owned());
        self
    }

    /// Marks this type as the hierarchy's legacy decode fallback.
    pub fn fallback(mut self) -> TypeDef {
        self.discriminator.fallback = true;
        self
    }

    /// Flags the type polymorphic even while it is the sole implementation.
    pub fn polymorphic(mut self) -> TypeDef {
        self.polymorphic = true;
        self
    }

    pub fn post_load(
        mut self,
        hook: impl Fn(&mut Instance) -> Result<(), Error> + Send + Sync + 'static,
    ) -> TypeDef {
        self.post_load.push(Arc::new(hook));
        self
    }

    pub fn id_generator(
        mut self,
        collectible: bool,
        generator: impl Fn(&Instance) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> TypeDef {
        self.id_policy = Some(IdentifierPolicy {
            collectible,
            generator: Arc::new(generator),
        });
        self
    }

    /// Direct parent expressions: supertype first, then interfaces.
    pub fn parents(&self) -> impl Iterator<Item = &TypeExpr> {
        self.supertype.iter().chain(self.interfaces.iter())
    }
}

/// Yields the set of type definitions forming the model.
pub trait TypeSource {
    fn types(&self) -> Vec<TypeDef>;
}

impl TypeSource for Vec<TypeDef> {
    fn types(&self) -> Vec<TypeDef> {
        self.clone()
    }
}

impl<F> TypeSource for F
where
    F: Fn() -> Vec<TypeDef>,
{
    fn types(&self) -> Vec<TypeDef> {
        self()
    }
}

struct ModelEntry {
    def: Arc<TypeDef>,
    registered: bool,
}

/// The validated, immutable universe of declared types.
///
/// Built once at mapper construction and never mutated afterward.
/// Distinguishes *registered* types (hierarchy-graph members, candidate
/// targets) from *declare-only* types (known for ancestor walks but never
/// resolved to directly).
pub struct ObjectModel {
    entries: HashMap<String, ModelEntry>,
    registered_order: Vec<String>,
}

impl ObjectModel {
    pub fn build(defs: Vec<(TypeDef, bool)>) -> Result<ObjectModel, Error> {
        let mut entries: HashMap<String, ModelEntry> = HashMap::new();
        let mut registered_order = Vec::new();
        for (def, registered) in defs {
            if raw::is_builtin(&def.name) {
                return Err(Error::configuration(format!(
                    "type name '{}' collides with a built-in raw type",
                    def.name
                )));
            }
            if entries.contains_key(&def.name) {
                return Err(Error::configuration(format!(
                    "type '{}' registered twice",
                    def.name
                )));
            }
            if registered {
                registered_order.push(def.name.clone());
            }
            entries.insert(
                def.name.clone(),
                ModelEntry {
                    def: Arc::new(def),
                    registered,
                },
            );
        }

        let model = ObjectModel {
            entries,
            registered_order,
        };
        model.validate_relations()?;
        Ok(model)
    }

    fn validate_relations(&self) -> Result<(), Error> {
        for entry in self.entries.values() {
            let def = &entry.def;
            if let Some(sup) = &def.supertype {
                let sup_def = self.parent_def(def, sup, "supertype")?;
                if !matches!(sup_def.kind, TypeKind::Abstract | TypeKind::Concrete) {
                    return Err(Error::configuration(format!(
                        "type '{}' extends '{}', which is not a class type",
                        def.name, sup_def.name
                    )));
                }
            }
            for iface in &def.interfaces {
                let iface_def = self.parent_def(def, iface, "interface")?;
                if iface_def.kind != TypeKind::Interface {
                    return Err(Error::configuration(format!(
                        "type '{}' implements '{}', which is not an interface",
                        def.name, iface_def.name
                    )));
                }
            }
            if def.kind == TypeKind::Enum && (def.supertype.is_some() || !def.interfaces.is_empty())
            {
                return Err(Error::configuration(format!(
                    "enum '{}' cannot extend or implement other types",
                    def.name
                )));
            }
        }
        Ok(())
    }

    fn parent_def(
        &self,
        def: &TypeDef,
        parent: &TypeExpr,
        role: &str,
    ) -> Result<Arc<TypeDef>, Error> {
        let name = parent.raw_name().ok_or_else(|| {
            Error::configuration(format!(
                "{} of '{}' must be a named type, not a type variable",
                role, def.name
            ))
        })?;
        self.get(name).cloned().ok_or_else(|| {
            Error::configuration(format!(
                "{} '{}' of type '{}' is not a known type",
                role, name, def.name
            ))
        })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeDef>> {
        self.entries.get(name).map(|e| &e.def)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|e| e.registered)
    }

    /// Registered type names in registration order.
    pub fn registered(&self) -> impl Iterator<Item = &str> {
        self.registered_order.iter().map(String::as_str)
    }

    /// Every known type name, registered or declare-only.
    pub fn all_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Default binding for an unresolved type parameter: the declared
    /// upper bound, or the wildcard top type.
    pub fn default_binding(&self, param: &TypeParam) -> TypeDescriptor {
        match &param.bound {
            Some(bound) => bound
                .resolve(&Bindings::new())
                .unwrap_or_else(|_| TypeDescriptor::object()),
            None => TypeDescriptor::object(),
        }
    }

    /// Binds a definition's type parameters against the arguments of a
    /// resolved descriptor. No arguments means every parameter defaults to
    /// its bound; a partial argument list is a configuration error.
    pub fn bindings_for(&self, def: &TypeDef, args: &[TypeDescriptor]) -> Result<Bindings, Error> {
        let mut bindings = Bindings::new();
        if args.is_empty() {
            for param in &def.params {
                bindings.insert(param.name.clone(), self.default_binding(param));
            }
        } else if args.len() == def.params.len() {
            for (param, arg) in def.params.iter().zip(args.iter()) {
                bindings.insert(param.name.clone(), arg.clone());
            }
        } else {
            return Err(Error::configuration(format!(
                "type '{}' expects {} type arguments, got {}",
                def.name,
                def.params.len(),
                args.len()
            )));
        }
        Ok(bindings)
    }
}
