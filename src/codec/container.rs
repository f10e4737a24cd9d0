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

//! Container and dynamic-value codecs.
//!
//! Lists, sets, arrays and maps delegate their elements to the codec of
//! the element type; null elements pass through transparently. Sets
//! deduplicate on both sides (insertion order preserved; the sorted
//! variant totally orders its elements). Maps with string keys use a
//! document region; other key types use an array of `{k, v}` pair
//! documents. Arrays of primitive scalars pack into a single binary
//! element instead of a per-element region.

use std::cmp::Ordering;
use std::sync::{Arc, Weak};

use crate::buffer;
use crate::codec::registry::CodecRegistry;
use crate::codec::Codec;
use crate::ensure;
use crate::error::Error;
use crate::model::TypeDescriptor;
use crate::types::{raw, ValueKind};
use crate::value::Value;
use crate::wire::{StructuredReader, StructuredWriter};

fn encode_element(
    codec: &Arc<dyn Codec>,
    value: &Value,
    writer: &mut dyn StructuredWriter,
) -> Result<(), Error> {
    if value.is_null() {
        writer.write_null()
    } else {
        codec.encode(value, writer)
    }
}

fn decode_element(
    codec: &Arc<dyn Codec>,
    reader: &mut dyn StructuredReader,
) -> Result<Value, Error> {
    if reader.peek_kind()? == ValueKind::Null {
        reader.read_null()?;
        Ok(Value::Null)
    } else {
        codec.decode(reader)
    }
}

/// Codec for `list<E>` and object-element `array<E>`.
pub struct ListCodec {
    target: TypeDescriptor,
    elem: Arc<dyn Codec>,
}

impl ListCodec {
    pub fn new(target: TypeDescriptor, elem: Arc<dyn Codec>) -> ListCodec {
        ListCodec { target, elem }
    }
}

impl Codec for ListCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    encode_element(&self.elem, item, writer)?;
                }
                writer.write_end_array()
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                other.kind_name(),
            )),
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                Ok(Value::Null)
            }
            ValueKind::Array => {
                reader.read_start_array()?;
                let mut items = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    items.push(decode_element(&self.elem, reader)?);
                }
                reader.read_end_array()?;
                Ok(Value::Array(items))
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                format!("{other:?}"),
            )),
        }
    }

    fn default_value(&self) -> Value {
        Value::Array(Vec::new())
    }
}

/// Codec for `set<E>` and `sorted_set<E>`.
pub struct SetCodec {
    target: TypeDescriptor,
    elem: Arc<dyn Codec>,
    sorted: bool,
}

impl SetCodec {
    pub fn new(target: TypeDescriptor, elem: Arc<dyn Codec>, sorted: bool) -> SetCodec {
        SetCodec {
            target,
            elem,
            sorted,
        }
    }

    fn normalize(&self, items: Vec<Value>) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            if !out.iter().any(|v| v.total_cmp(&item) == Ordering::Equal) {
                out.push(item);
            }
        }
        if self.sorted {
            out.sort_by(|a, b| a.total_cmp(b));
        }
        out
    }
}

impl Codec for SetCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::Array(items) => {
                writer.write_start_array()?;
                for item in &self.normalize(items.clone()) {
                    encode_element(&self.elem, item, writer)?;
                }
                writer.write_end_array()
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                other.kind_name(),
            )),
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                Ok(Value::Null)
            }
            ValueKind::Array => {
                reader.read_start_array()?;
                let mut items = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    items.push(decode_element(&self.elem, reader)?);
                }
                reader.read_end_array()?;
                Ok(Value::Array(self.normalize(items)))
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                format!("{other:?}"),
            )),
        }
    }

    fn default_value(&self) -> Value {
        Value::Array(Vec::new())
    }
}

const MAP_PAIR_KEY: &str = "k";
const MAP_PAIR_VALUE: &str = "v";

/// Codec for `map<K, V>`.
pub struct MapCodec {
    target: TypeDescriptor,
    key: Arc<dyn Codec>,
    value: Arc<dyn Codec>,
    /// String-keyed maps use a document region; others an array of pairs.
    string_keys: bool,
}

impl MapCodec {
    pub fn new(target: TypeDescriptor, key: Arc<dyn Codec>, value: Arc<dyn Codec>) -> MapCodec {
        let string_keys = key.target().raw() == raw::STRING;
        MapCodec {
            target,
            key,
            value,
            string_keys,
        }
    }
}

impl Codec for MapCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        let pairs = match value {
            Value::Null => return writer.write_null(),
            Value::Map(pairs) => pairs,
            other => {
                return Err(Error::type_mismatch(
                    self.target.to_string(),
                    other.kind_name(),
                ));
            }
        };
        if self.string_keys {
            writer.write_start_document()?;
            for (k, v) in pairs {
                let Value::String(name) = k else {
                    return Err(Error::type_mismatch(raw::STRING, k.kind_name()));
                };
                writer.write_name(name)?;
                encode_element(&self.value, v, writer)?;
            }
            writer.write_end_document()
        } else {
            writer.write_start_array()?;
            for (k, v) in pairs {
                writer.write_start_document()?;
                writer.write_name(MAP_PAIR_KEY)?;
                encode_element(&self.key, k, writer)?;
                writer.write_name(MAP_PAIR_VALUE)?;
                encode_element(&self.value, v, writer)?;
                writer.write_end_document()?;
            }
            writer.write_end_array()
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                Ok(Value::Null)
            }
            ValueKind::Document if self.string_keys => {
                reader.read_start_document()?;
                let mut pairs = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    let name = reader.read_name()?;
                    let v = decode_element(&self.value, reader)?;
                    pairs.push((Value::String(name), v));
                }
                reader.read_end_document()?;
                Ok(Value::Map(pairs))
            }
            ValueKind::Array if !self.string_keys => {
                reader.read_start_array()?;
                let mut pairs = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    reader.read_start_document()?;
                    let mut k = Value::Null;
                    let mut v = Value::Null;
                    while reader.peek_kind()? != ValueKind::End {
                        match reader.read_name()?.as_str() {
                            MAP_PAIR_KEY => k = decode_element(&self.key, reader)?,
                            MAP_PAIR_VALUE => v = decode_element(&self.value, reader)?,
                            _ => reader.skip_value()?,
                        }
                    }
                    reader.read_end_document()?;
                    pairs.push((k, v));
                }
                reader.read_end_array()?;
                Ok(Value::Map(pairs))
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                format!("{other:?}"),
            )),
        }
    }

    fn default_value(&self) -> Value {
        Value::Map(Vec::new())
    }
}

/// Codec for `array<E>` where `E` is a primitive scalar: the whole array
/// packs into one binary element (element count, then fixed-width values).
pub struct PrimitiveArrayCodec {
    target: TypeDescriptor,
    elem_raw: &'static str,
}

impl PrimitiveArrayCodec {
    pub fn new(target: TypeDescriptor, elem_raw: &'static str) -> PrimitiveArrayCodec {
        PrimitiveArrayCodec { target, elem_raw }
    }

    fn pack(&self, items: &[Value]) -> Result<Vec<u8>, Error> {
        let mut w = buffer::Writer::new();
        w.write_varuint32(items.len() as u32);
        for item in items {
            match (self.elem_raw, item) {
                (raw::BOOL, Value::Bool(v)) => w.write_u8(*v as u8),
                (raw::INT32, Value::Int32(v)) => w.write_i32(*v),
                (raw::INT64, Value::Int64(v)) => w.write_i64(*v),
                (raw::FLOAT64, Value::Float64(v)) => w.write_f64(*v),
                (expected, other) => {
                    return Err(Error::type_mismatch(
                        expected.to_owned(),
                        other.kind_name(),
                    ));
                }
            }
        }
        Ok(w.dump())
    }

    fn unpack(&self, bytes: &[u8]) -> Result<Vec<Value>, Error> {
        let mut r = buffer::Reader::new(bytes);
        let count = r.read_varuint32()? as usize;
        let mut items = Vec::with_capacity(count.min(1 << 16));
        for _ in 0..count {
            let item = match self.elem_raw {
                raw::BOOL => Value::Bool(r.read_u8()? != 0),
                raw::INT32 => Value::Int32(r.read_i32()?),
                raw::INT64 => Value::Int64(r.read_i64()?),
                raw::FLOAT64 => Value::Float64(r.read_f64()?),
                other => {
                    return Err(Error::configuration(format!(
                        "'{other}' is not a packable element type"
                    )));
                }
            };
            items.push(item);
        }
        ensure!(r.remaining() == 0, "trailing bytes in packed array");
        Ok(items)
    }
}

impl Codec for PrimitiveArrayCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::Array(items) => writer.write_binary(&self.pack(items)?),
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                other.kind_name(),
            )),
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                Ok(Value::Null)
            }
            ValueKind::Binary => {
                let bytes = reader.read_binary()?;
                Ok(Value::Array(self.unpack(&bytes)?))
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                format!("{other:?}"),
            )),
        }
    }

    fn default_value(&self) -> Value {
        Value::Array(Vec::new())
    }
}

/// Codec for the schemaless `document` raw. Values decode through the
/// wildcard codec; entity values encode through their own codec.
pub struct DocumentCodec {
    target: TypeDescriptor,
    wildcard: Arc<dyn Codec>,
}

impl DocumentCodec {
    pub fn new(wildcard: Arc<dyn Codec>) -> DocumentCodec {
        DocumentCodec {
            target: TypeDescriptor::new(raw::DOCUMENT),
            wildcard,
        }
    }
}

impl Codec for DocumentCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::Document(fields) => {
                writer.write_start_document()?;
                for (name, v) in fields {
                    writer.write_name(name)?;
                    encode_element(&self.wildcard, v, writer)?;
                }
                writer.write_end_document()
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                other.kind_name(),
            )),
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                Ok(Value::Null)
            }
            ValueKind::Document => {
                reader.read_start_document()?;
                let mut fields = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    let name = reader.read_name()?;
                    let v = decode_element(&self.wildcard, reader)?;
                    fields.push((name, v));
                }
                reader.read_end_document()?;
                Ok(Value::Document(fields))
            }
            other => Err(Error::type_mismatch(
                self.target.to_string(),
                format!("{other:?}"),
            )),
        }
    }

    fn default_value(&self) -> Value {
        Value::Document(Vec::new())
    }
}

/// Codec for the wildcard top type `object`.
///
/// Encoding dispatches on the runtime value; entity values resolve their
/// concrete codec through the registry. Decoding reconstructs by wire
/// kind: documents come back as schemaless [`Value::Document`]s since the
/// wildcard has no declared target to dispatch to.
pub struct WildcardCodec {
    target: TypeDescriptor,
    registry: Weak<CodecRegistry>,
}

impl WildcardCodec {
    pub fn new(registry: Weak<CodecRegistry>) -> WildcardCodec {
        WildcardCodec {
            target: TypeDescriptor::object(),
            registry,
        }
    }

    fn registry(&self) -> Result<Arc<CodecRegistry>, Error> {
        self.registry
            .upgrade()
            .ok_or_else(|| Error::configuration("codec registry dropped"))
    }
}

impl Codec for WildcardCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::Bool(v) => writer.write_bool(*v),
            Value::Int32(v) => writer.write_i32(*v),
            Value::Int64(v) => writer.write_i64(*v),
            Value::Float64(v) => writer.write_f64(*v),
            Value::String(v) => writer.write_string(v),
            Value::DateTime(v) => writer.write_datetime(*v),
            Value::Binary(v) => writer.write_binary(v),
            Value::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    self.encode(item, writer)?;
                }
                writer.write_end_array()
            }
            Value::Document(fields) => {
                writer.write_start_document()?;
                for (name, v) in fields {
                    writer.write_name(name)?;
                    self.encode(v, writer)?;
                }
                writer.write_end_document()
            }
            Value::Map(pairs) => {
                writer.write_start_array()?;
                for (k, v) in pairs {
                    writer.write_start_document()?;
                    writer.write_name(MAP_PAIR_KEY)?;
                    self.encode(k, writer)?;
                    writer.write_name(MAP_PAIR_VALUE)?;
                    self.encode(v, writer)?;
                    writer.write_end_document()?;
                }
                writer.write_end_array()
            }
            Value::Entity(inst) => {
                let codec = self
                    .registry()?
                    .get(inst.ty())?
                    .ok_or_else(|| {
                        Error::configuration(format!("no codec for entity type '{}'", inst.ty()))
                    })?;
                codec.encode(value, writer)
            }
        }
    }

    fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
        match reader.peek_kind()? {
            ValueKind::Null => {
                reader.read_null()?;
                Ok(Value::Null)
            }
            ValueKind::Bool => Ok(Value::Bool(reader.read_bool()?)),
            ValueKind::Int32 => Ok(Value::Int32(reader.read_i32()?)),
            ValueKind::Int64 => Ok(Value::Int64(reader.read_i64()?)),
            ValueKind::Float64 => Ok(Value::Float64(reader.read_f64()?)),
            ValueKind::String => Ok(Value::String(reader.read_string()?)),
            ValueKind::DateTime => Ok(Value::DateTime(reader.read_datetime()?)),
            ValueKind::Binary => Ok(Value::Binary(reader.read_binary()?)),
            ValueKind::Array => {
                reader.read_start_array()?;
                let mut items = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    items.push(self.decode(reader)?);
                }
                reader.read_end_array()?;
                Ok(Value::Array(items))
            }
            ValueKind::Document => {
                reader.read_start_document()?;
                let mut fields = Vec::new();
                while reader.peek_kind()? != ValueKind::End {
                    let name = reader.read_name()?;
                    let v = self.decode(reader)?;
                    fields.push((name, v));
                }
                reader.read_end_document()?;
                Ok(Value::Document(fields))
            }
            ValueKind::End => Err(Error::wire_protocol("no value pending at region end")),
        }
    }
}
