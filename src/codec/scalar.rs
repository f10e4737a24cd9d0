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

//! Codecs for the scalar raws and declared enums.
//!
//! Scalars never coerce: a wire kind other than the expected one (or an
//! explicit null) is a type mismatch. Enum values travel as their variant
//! name string.

use crate::bail;
use crate::codec::Codec;
use crate::error::Error;
use crate::model::TypeDescriptor;
use crate::types::{raw, ValueKind};
use crate::value::Value;
use crate::wire::{StructuredReader, StructuredWriter};

macro_rules! scalar_codec {
    ($codec:ident, $raw:path, $kind:path, $variant:ident, $v:ident,
     $write:ident($($conv:tt)*), $read:ident, $default:expr) => {
        pub struct $codec {
            target: TypeDescriptor,
        }

        impl $codec {
            pub fn new() -> $codec {
                $codec {
                    target: TypeDescriptor::new($raw),
                }
            }
        }

        impl Default for $codec {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Codec for $codec {
            fn target(&self) -> &TypeDescriptor {
                &self.target
            }

            fn encode(
                &self,
                value: &Value,
                writer: &mut dyn StructuredWriter,
            ) -> Result<(), Error> {
                match value {
                    Value::Null => writer.write_null(),
                    Value::$variant($v) => writer.$write($($conv)*),
                    other => Err(Error::type_mismatch($raw, other.kind_name())),
                }
            }

            fn decode(&self, reader: &mut dyn StructuredReader) -> Result<Value, Error> {
                match reader.peek_kind()? {
                    ValueKind::Null => {
                        reader.read_null()?;
                        Ok(Value::Null)
                    }
                    $kind => Ok(Value::$variant(reader.$read()?)),
                    other => Err(Error::type_mismatch($raw, format!("{other:?}"))),
                }
            }

            fn default_value(&self) -> Value {
                $default
            }
        }
    };
}

scalar_codec!(
    BoolCodec,
    raw::BOOL,
    ValueKind::Bool,
    Bool,
    v,
    write_bool(*v),
    read_bool,
    Value::Bool(false)
);
scalar_codec!(
    Int32Codec,
    raw::INT32,
    ValueKind::Int32,
    Int32,
    v,
    write_i32(*v),
    read_i32,
    Value::Int32(0)
);
scalar_codec!(
    Int64Codec,
    raw::INT64,
    ValueKind::Int64,
    Int64,
    v,
    write_i64(*v),
    read_i64,
    Value::Int64(0)
);
scalar_codec!(
    Float64Codec,
    raw::FLOAT64,
    ValueKind::Float64,
    Float64,
    v,
    write_f64(*v),
    read_f64,
    Value::Float64(0.0)
);
scalar_codec!(
    StringCodec,
    raw::STRING,
    ValueKind::String,
    String,
    v,
    write_string(v),
    read_string,
    Value::String(String::new())
);
scalar_codec!(
    DateTimeCodec,
    raw::DATETIME,
    ValueKind::DateTime,
    DateTime,
    v,
    write_datetime(*v),
    read_datetime,
    Value::DateTime(chrono::DateTime::UNIX_EPOCH.naive_utc())
);
scalar_codec!(
    BinaryCodec,
    raw::BINARY,
    ValueKind::Binary,
    Binary,
    v,
    write_binary(v),
    read_binary,
    Value::Binary(Vec::new())
);

/// Codec for a declared enum type; values are variant name strings.
pub struct EnumCodec {
    target: TypeDescriptor,
    variants: Vec<String>,
}

impl EnumCodec {
    pub fn new(target: TypeDescriptor, variants: Vec<String>) -> EnumCodec {
        EnumCodec { target, variants }
    }

    fn check(&self, name: &str) -> Result<(), Error> {
        if !self.variants.iter().any(|v| v == name) {
            bail!(
                "'{}' is not a variant of enum '{}'",
                name,
                self.target.raw()
            );
        }
        Ok(())
    }
}

impl Codec for EnumCodec {
    fn target(&self) -> &TypeDescriptor {
        &self.target
    }

    fn encode(&self, value: &Value, writer: &mut dyn StructuredWriter) -> Result<(), Error> {
        match value {
            Value::Null => writer.write_null(),
            Value::String(name) => {
                self.check(name)?;
                writer.write_string(name)
            }
            other => Err(Error::type_mismatch(
                self.target.raw().to_owned(),
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
            ValueKind::String => {
                let name = reader.read_string()?;
                self.check(&name)?;
                Ok(Value::String(name))
            }
            other => Err(Error::type_mismatch(
                self.target.raw().to_owned(),
                format!("{other:?}"),
            )),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Null | Value::String(_))
    }
}
