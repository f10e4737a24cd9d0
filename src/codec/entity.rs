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

//! Monomorphic entity codec.
//!
//! One [`EntityCodec`] maps exactly one resolved concrete type: fields are
//! written in root-first declaration order under the per-field null
//! policy, and decoded by wire name with per-field error and undefined
//! policies applied. Unknown document fields are skipped. Decoded values
//! that do not conform to the declared field type propagate a type
//! mismatch regardless of policy; the engine never coerces.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::codec::{Codec, CollectibleCodec, Resolution};
use crate::error::Error;
use crate::model::schema::{EntityErrorPolicy, FieldErrorPolicy, NullPolicy, UndefinedPolicy};
use crate::model::{EntityModel, TypeDescriptor};
use crate::types::ValueKind;
use crate::value::{Instance, Value};
use crate::wire::{StructuredReader, StructuredWriter};

pub struct EntityCodec {
    model: Arc<EntityModel>,
    /// Parallel to `model.fields`.
    codecs: Vec<Arc<dyn Codec>>,
    entity_error: EntityErrorPolicy,
}

impl EntityCodec {
    /// Builds the codec for one resolved concrete type, resolving every
    /// field codec through the registry (field override, then named codec,
    /// then type-based resolution).
    pub fn new(ty: &TypeDescriptor, cx: &mut Resolution<'_>) -> Result<EntityCodec, Error> {
        let model = Arc::new(cx.fields().entity_model(ty)?);
        let mut codecs: Vec<Arc<dyn Codec>> = Vec::with_capacity(model.fields.len());
        for field in &model.fields {
            let codec = if let Some(codec) = cx.field_override(&field.declared_by, &field.field_name)
            {
                codec
            } else if let Some(name) = &field.codec_override {
                cx.named(name).ok_or_else(|| {
                    Error::configuration(format!(
                        "field '{}.{}' references unregistered codec '{}'",
                        field.declared_by, field.field_name, name
                    ))
                })?
            } else {
                cx.get(&field.ty)?.ok_or_else(|| {
                    Error::configuration(format!(
                        "no codec for type '{}' of field '{}.{}'",
                        field.ty, field.declared_by, field.field_name
                    ))
                })?
            };
            codecs.push(codec);
        }
        Ok(EntityCodec {
            model,
            codecs,
            entity_error: cx.entity_error_policy(),
        })
    }

    pub fn model(&self) -> &Arc<EntityModel> {
        &self.model
    }

    /// Writes the field payload without the surrounding document region;
    /// the polymorphic codec interleaves the discriminator through this.
    pub(crate) fn encode_fields(
        &self,
        inst: &Instance,
        writer: &mut dyn StructuredWriter,
    ) -> Result<(), Error> {
        for (field, codec) in self.model.fields.iter().zip(&self.codecs) {
            let value = inst.get(&field.field_name);
            if value.is_null() {
                match field.on_null {
                    NullPolicy::Omit => continue,
                    NullPolicy::ForceDefault => {
                        writer.write_name(&field.wire_name)?;
                        codec.encode(&codec.default_value(), writer)?;
                    }
                    NullPolicy::KeepNull => {
                        writer.write_name(&field.wire_name)?;
                        writer.write_null()?;
                    }
                }
                continue;
            }
            if !codec.accepts(value) {
                return Err(Error::type_mismatch(
                    field.ty.to_string(),
                    format!("{} in field '{}'", value.kind_name(), field.field_name),
                ));
            }
            writer.write_name(&field.wire_name)?;
            codec.encode(value, writer)?;
        }
        Ok(())
    }

    fn decode_inner(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                return Ok(Value::Null);
            }
            ValueKind::Document => {}
            other => {
                return Err(Error::type_mismatch(
                    self.model.ty.to_string(),
                    format!("{other:?}"),
                ));
            }
        }
        reader.read_start_document()?;

        let mut inst = Instance::new(self.model.ty.clone());
        let mut seen = vec![false; self.model.fields.len()];
        loop {
            let kind = reader.peek_kind()?;
            if kind == ValueKind::End {
                break;
            }
            let name = reader.read_name()?;
            let Some(index) = self.model.index_by_wire_name(&name) else {
                debug!(entity = %self.model.ty, field = %name, "skipping unknown document field");
                reader.skip_value()?;
                continue;
            };
            let field = &self.model.fields[index];

            // An explicit wire null leaves the field unset but counts as
            // present: the undefined policy must not overwrite it.
            if kind == ValueKind::Null {
                reader.read_null()?;
                seen[index] = true;
                continue;
            }

            let mark = reader.mark();
            match self.codecs[index].decode(reader) {
                Ok(value) => {
                    reader.unmark(mark);
                    if !self.codecs[index].accepts(&value) {
                        return Err(Error::type_mismatch(
                            field.ty.to_string(),
                            format!("{} in field '{}'", value.kind_name(), name),
                        ));
                    }
                    let field_name = field.field_name.clone();
                    inst.set(&field_name, value);
                    seen[index] = true;
                }
                Err(err) if err.is_data_error() => match field.on_error {
                    FieldErrorPolicy::Rethrow => {
                        reader.unmark(mark);
                        return Err(Error::decode_field(&name, err.to_string()));
                    }
                    FieldErrorPolicy::Null => {
                        reader.reset(mark)?;
                        reader.skip_value()?;
                        warn!(entity = %self.model.ty, field = %name, error = %err,
                              "nulling field after decode error");
                        seen[index] = true;
                    }
                    FieldErrorPolicy::Skip => {
                        reader.reset(mark)?;
                        reader.skip_value()?;
                        warn!(entity = %self.model.ty, field = %name, error = %err,
                              "skipping field after decode error");
                        seen[index] = true;
                    }
                },
                Err(err) => {
                    reader.unmark(mark);
                    return Err(err);
                }
            }
        }
        reader.read_end_document()?;

        for (index, field) in self.model.fields.iter().enumerate() {
            if !seen[index] && field.on_undefined == UndefinedPolicy::Default {
                inst.set(&field.field_name, self.codecs[index].default_value());
            }
        }
        for hook in &self.model.hooks {
            hook(&mut inst)?;
        }
        Ok(Value::Entity(inst))
    }
}

impl Codec for EntityCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.model.ty
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::Entity(inst) if inst.ty().raw() == self.model.ty.raw() => {
                writer.write_start_document()?;
                self.encode_fields(inst, writer)?;
                writer.write_end_document()
            }
            Value::Entity(inst) => Err(Error::type_mismatch(
                self.model.ty.to_string(),
                inst.ty().to_string(),
            )),
            other => Err(Error::type_mismatch(
                self.model.ty.to_string(),
                other.kind_name(),
            )),
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match self.entity_error {
            EntityErrorPolicy::Rethrow => self.decode_inner(reader),
            EntityErrorPolicy::Null => {
                let mark = reader.mark();
                match self.decode_inner(reader) {
                    Ok(value) => {
                        reader.unmark(mark);
                        Ok(value)
                    }
                    Err(err) if err.is_data_error() => {
                        reader.reset(mark)?;
                        reader.skip_value()?;
                        warn!(entity = %self.model.ty, error = %err,
                              "nulling entity after decode error");
                        Ok(Value::Null)
                    }
                    Err(err) => {
                        reader.unmark(mark);
                        Err(err)
                    }
                }
            }
        }
    }

    fn as_collectible(&self) -> Option<&dyn CollectibleCodec> {
        if self.model.id_index.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl CollectibleCodec for EntityCodec {
    fn has_identifier(&self, value: &Value) -> bool {
        match (value, self.model.identifier_field()) {
            (Value::Entity(inst), Some(field)) => !inst.get(&field.field_name).is_null(),
            _ => false,
        }
    }

    fn ensure_identifier(&self, value: &mut Value) -> Result<Value, Error> {
        let Value::Entity(inst) = value else {
            return Err(Error::type_mismatch(
                self.model.ty.to_string(),
                value.kind_name(),
            ));
        };
        let Some(field) = self.model.identifier_field() else {
            return Ok(Value::Null);
        };
        let current = inst.get(&field.field_name);
        if !current.is_null() {
            return Ok(current.clone());
        }
        let Some(policy) = &self.model.id_policy else {
            return Ok(Value::Null);
        };
        if !policy.collectible {
            return Ok(Value::Null);
        }
        let generated = (policy.generator)(inst)?;
        let id_codec = match self.model.id_index {
            Some(i) => &self.codecs[i],
            None => return Ok(Value::Null),
        };
        if !id_codec.accepts(&generated) {
            return Err(Error::type_mismatch(
                field.ty.to_string(),
                format!("generated identifier of kind {}", generated.kind_name()),
            ));
        }
        let field_name = field.field_name.clone();
        inst.set(&field_name, generated.clone());
        Ok(generated)
    }
}
