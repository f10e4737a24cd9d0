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

//! Hierarchy-aware codec with discriminator dispatch.
//!
//! Encoding writes the concrete type's discriminator string as the first
//! document field, then delegates the payload to that type's monomorphic
//! codec. Decoding scans the document for a discriminator field without
//! consuming it (mark, scan, reset), then dispatches the full document to
//! the matched candidate. Data carrying no usable discriminator falls back
//! to the declared fallback type, then to a sole candidate, and is
//! otherwise skipped with a warning rather than failing the decode.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;

use crate::codec::entity::EntityCodec;
use crate::codec::{Codec, Resolution};
use crate::error::Error;
use crate::model::TypeDescriptor;
use crate::types::{ValueKind, DEFAULT_DISCRIMINATOR_KEY};
use crate::value::{Instance, Value};
use crate::wire::{StructuredReader, StructuredWriter};

struct PolyEntry {
    desc: TypeDescriptor,
    /// Wire field name of this candidate's discriminator.
    key: String,
    /// Discriminator string written on encode.
    value: String,
    codec: Arc<EntityCodec>,
}

pub struct PolymorphicCodec {
    target: TypeDescriptor,
    model: Arc<crate::model::ObjectModel>,
    entries: Vec<PolyEntry>,
    /// Discriminator string (value or alias) to entry index.
    by_discriminator: HashMap<String, usize>,
    fallback: Option<usize>,
    /// Every discriminator key used by any candidate in the group.
    keys: HashSet<String>,
}

impl PolymorphicCodec {
    pub fn new(
        target: &TypeDescriptor,
        candidates: &[TypeDescriptor],
        cx: &mut Resolution<'_>,
    ) -> Result<PolymorphicCodec, Error> {
        let mut entries: Vec<PolyEntry> = Vec::with_capacity(candidates.len());
        let mut by_discriminator: HashMap<String, usize> = HashMap::new();
        let mut fallback: Option<usize> = None;
        let mut keys: HashSet<String> = HashSet::new();

        for desc in candidates {
            let def = cx
                .model()
                .get(desc.raw())
                .cloned()
                .ok_or_else(|| {
                    Error::configuration(format!("unknown candidate type '{}'", desc.raw()))
                })?;
            let key = def
                .discriminator
                .key
                .clone()
                .unwrap_or_else(|| DEFAULT_DISCRIMINATOR_KEY.to_owned());
            let value = def
                .discriminator
                .value
                .clone()
                .unwrap_or_else(|| def.name.clone());
            let codec = Arc::new(EntityCodec::new(desc, cx)?);

            let index = entries.len();
            for tag in std::iter::once(&value).chain(def.discriminator.aliases.iter()) {
                if by_discriminator.insert(tag.clone(), index).is_some() {
                    return Err(Error::configuration(format!(
                        "discriminator '{}' is claimed by two types under '{}'",
                        tag,
                        target.raw()
                    )));
                }
            }
            if def.discriminator.fallback {
                if fallback.is_some() {
                    return Err(Error::configuration(format!(
                        "hierarchy '{}' declares more than one fallback type",
                        target.raw()
                    )));
                }
                fallback = Some(index);
            }
            keys.insert(key.clone());
            entries.push(PolyEntry {
                desc: desc.clone(),
                key,
                value,
                codec,
            });
        }

        // A payload field named like a discriminator key would make the
        // scan ambiguous.
        for entry in &entries {
            for field in &entry.codec.model().fields {
                if keys.contains(&field.wire_name) {
                    return Err(Error::configuration(format!(
                        "field '{}.{}' collides with discriminator key '{}'",
                        entry.desc.raw(),
                        field.field_name,
                        field.wire_name
                    )));
                }
            }
        }

        Ok(PolymorphicCodec {
            target: target.clone(),
            model: cx.model().clone(),
            entries,
            by_discriminator,
            fallback,
            keys,
        })
    }

    /// The candidate a discriminator string dispatches to, if any.
    pub fn resolve_discriminator(&self, tag: &str) -> Option<&TypeDescriptor> {
        self.by_discriminator
            .get(tag)
            .map(|&i| &self.entries[i].desc)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.entries.iter().map(|e| &e.desc)
    }

    /// Entry for a concrete instance type: exact match first, then the
    /// closest candidate ancestor along the supertype chain.
    fn entry_for(&self, inst: &Instance) -> Option<usize> {
        let mut raw = inst.ty().raw().to_owned();
        loop {
            if let Some(i) = self.entries.iter().position(|e| e.desc.raw() == raw) {
                return Some(i);
            }
            let def = self.model.get(&raw)?;
            let sup = def.supertype.as_ref()?;
            raw = sup.raw_name()?.to_owned();
        }
    }
}

impl Codec for PolymorphicCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Entity(inst) => self.entry_for(inst).is_some(),
            _ => false,
        }
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        let inst = match value {
            Value::Null => return writer.write_null(),
            Value::Entity(inst) => inst,
            other => {
                return Err(Error::type_mismatch(
                    self.target.to_string(),
                    other.kind_name(),
                ));
            }
        };
        let Some(index) = self.entry_for(inst) else {
            warn!(requested = %self.target, actual = %inst.ty(),
                  "no candidate for concrete type, writing empty document");
            writer.write_start_document()?;
            return writer.write_end_document();
        };
        let entry = &self.entries[index];
        writer.write_start_document()?;
        writer.write_name(&entry.key)?;
        writer.write_string(&entry.value)?;
        entry.codec.encode_fields(inst, writer)?;
        writer.write_end_document()
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                return Ok(Value::Null);
            }
            ValueKind::Document => {}
            other => {
                return Err(Error::type_mismatch(
                    self.target.to_string(),
                    format!("{other:?}"),
                ));
            }
        }

        // Scan for the discriminator without consuming the document, then
        // rewind and hand the whole region to the matched candidate.
        let mark = reader.mark();
        reader.read_start_document()?;
        let mut resolved: Option<usize> = None;
        loop {
            let kind = reader.peek_kind()?;
            if kind == ValueKind::End {
                break;
            }
            let name = reader.read_name()?;
            if self.keys.contains(&name) && kind == ValueKind::String {
                let tag = reader.read_string()?;
                match self.by_discriminator.get(&tag) {
                    Some(&i) if self.entries[i].key == name => {
                        resolved = Some(i);
                        break;
                    }
                    Some(_) => {
                        warn!(requested = %self.target, key = %name, discriminator = %tag,
                              "discriminator found under an unexpected key");
                    }
                    None => {
                        warn!(requested = %self.target, discriminator = %tag,
                              "unknown discriminator value");
                    }
                }
            } else {
                reader.skip_value()?;
            }
        }
        reader.reset(mark)?;

        match resolved {
            Some(i) => self.entries[i].codec.decode(reader),
            None => {
                if let Some(i) = self.fallback {
                    self.entries[i].codec.decode(reader)
                } else if self.entries.len() == 1 {
                    self.entries[0].codec.decode(reader)
                } else {
                    warn!(requested = %self.target,
                          "undispatchable document, skipping and yielding null");
                    reader.skip_value()?;
                    Ok(Value::Null)
                }
            }
        }
    }
}
