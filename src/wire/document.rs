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

//! In-memory binary document format.
//!
//! Element layout: one [`ValueKind`] byte, then (inside a document region)
//! the length-prefixed UTF-8 field name, then the payload. Documents and
//! arrays are closed by a bare [`ValueKind::End`] byte. Fixed-width scalars
//! are little-endian; strings and binary are var-uint length prefixed;
//! datetimes are microseconds since the Unix epoch.

use chrono::{DateTime, NaiveDateTime};

use super::{Mark, StructuredReader, StructuredWriter};
use crate::buffer::{Reader, Writer};
use crate::error::Error;
use crate::types::ValueKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Top,
    Document,
    Array,
}

/// [`StructuredWriter`] over a growable byte buffer.
pub struct DocumentWriter {
    out: Writer,
    regions: Vec<Region>,
    pending_name: Option<String>,
}

impl Default for DocumentWriter {
    fn default() -> Self {
        DocumentWriter::new()
    }
}

impl DocumentWriter {
    pub fn new() -> DocumentWriter {
        DocumentWriter {
            out: Writer::new(),
            regions: vec![Region::Top],
            pending_name: None,
        }
    }

    /// Finishes writing and returns the encoded bytes. Errors if any
    /// region is still open or a name has no value.
    pub fn finish(self) -> Result<Vec<u8>, Error> {
        if self.regions.len() != 1 {
            return Err(Error::wire_protocol("unclosed document or array region"));
        }
        if self.pending_name.is_some() {
            return Err(Error::wire_protocol("field name written without a value"));
        }
        Ok(self.out.dump())
    }

    fn region(&self) -> Region {
        *self.regions.last().unwrap_or(&Region::Top)
    }

    fn begin_element(&mut self, kind: ValueKind) -> Result<(), Error> {
        self.out.write_u8(kind.into());
        if self.region() == Region::Document {
            let name = self
                .pending_name
                .take()
                .ok_or_else(|| Error::wire_protocol("value written without a field name"))?;
            self.out.write_utf8_string(&name);
        } else if self.pending_name.is_some() {
            return Err(Error::wire_protocol(
                "field name is only valid inside a document region",
            ));
        }
        Ok(())
    }

    fn end_region(&mut self, expected: Region) -> Result<(), Error> {
        if self.pending_name.is_some() {
            return Err(Error::wire_protocol("field name written without a value"));
        }
        if self.region() != expected {
            return Err(Error::wire_protocol("mismatched region end"));
        }
        self.out.write_u8(ValueKind::End.into());
        self.regions.pop();
        Ok(())
    }
}

impl StructuredWriter for DocumentWriter {
    fn write_start_document(&mut self) -> Result<(), Error> {
        self.begin_element(ValueKind::Document)?;
        self.regions.push(Region::Document);
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<(), Error> {
        self.end_region(Region::Document)
    }

    fn write_start_array(&mut self) -> Result<(), Error> {
        self.begin_element(ValueKind::Array)?;
        self.regions.push(Region::Array);
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<(), Error> {
        self.end_region(Region::Array)
    }

    fn write_name(&mut self, name: &str) -> Result<(), Error> {
        if self.region() != Region::Document {
            return Err(Error::wire_protocol(
                "field name is only valid inside a document region",
            ));
        }
        if self.pending_name.is_some() {
            return Err(Error::wire_protocol("field name written twice"));
        }
        self.pending_name = Some(name.to_owned());
        Ok(())
    }

    fn write_null(&mut self) -> Result<(), Error> {
        self.begin_element(ValueKind::Null)
    }

    fn write_bool(&mut self, v: bool) -> Result<(), Error> {
        self.begin_element(ValueKind::Bool)?;
        self.out.write_u8(v as u8);
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<(), Error> {
        self.begin_element(ValueKind::Int32)?;
        self.out.write_i32(v);
        Ok(())
    }

    fn write_i64(&mut self, v: i64) -> Result<(), Error> {
        self.begin_element(ValueKind::Int64)?;
        self.out.write_i64(v);
        Ok(())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), Error> {
        self.begin_element(ValueKind::Float64)?;
        self.out.write_f64(v);
        Ok(())
    }

    fn write_string(&mut self, v: &str) -> Result<(), Error> {
        self.begin_element(ValueKind::String)?;
        self.out.write_utf8_string(v);
        Ok(())
    }

    fn write_datetime(&mut self, v: NaiveDateTime) -> Result<(), Error> {
        self.begin_element(ValueKind::DateTime)?;
        self.out.write_i64(v.and_utc().timestamp_micros());
        Ok(())
    }

    fn write_binary(&mut self, v: &[u8]) -> Result<(), Error> {
        self.begin_element(ValueKind::Binary)?;
        self.out.write_varuint32(v.len() as u32);
        self.out.write_bytes(v);
        Ok(())
    }
}

#[derive(Clone)]
struct ReaderState {
    cursor: usize,
    regions: Vec<Region>,
    pending: Option<ValueKind>,
    awaiting_name: bool,
}

/// [`StructuredReader`] over a byte slice.
pub struct DocumentReader<'a> {
    input: Reader<'a>,
    regions: Vec<Region>,
    pending: Option<ValueKind>,
    awaiting_name: bool,
    saved: Vec<ReaderState>,
}

impl<'a> DocumentReader<'a> {
    pub fn new(bytes: &'a [u8]) -> DocumentReader<'a> {
        DocumentReader {
            input: Reader::new(bytes),
            regions: vec![Region::Top],
            pending: None,
            awaiting_name: false,
            saved: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.remaining()
    }

    fn region(&self) -> Region {
        *self.regions.last().unwrap_or(&Region::Top)
    }

    /// Consumes the pending kind after validating it.
    fn take_kind(&mut self, expected: ValueKind) -> Result<(), Error> {
        let kind = self.peek_kind()?;
        if self.awaiting_name {
            return Err(Error::wire_protocol("value read before its field name"));
        }
        if kind != expected {
            return Err(Error::wire_protocol(format!(
                "expected {:?} element, found {:?}",
                expected, kind
            )));
        }
        self.pending = None;
        Ok(())
    }

    fn skip_pending_name(&mut self) -> Result<(), Error> {
        if self.awaiting_name {
            self.input.skip_utf8_string()?;
            self.awaiting_name = false;
        }
        Ok(())
    }
}

impl StructuredReader for DocumentReader<'_> {
    fn peek_kind(&mut self) -> Result<ValueKind, Error> {
        if let Some(kind) = self.pending {
            return Ok(kind);
        }
        let byte = self.input.read_u8()?;
        let kind = ValueKind::try_from(byte)
            .map_err(|_| Error::invalid_data(format!("unknown value kind byte {byte:#04x}")))?;
        self.pending = Some(kind);
        self.awaiting_name = kind != ValueKind::End && self.region() == Region::Document;
        Ok(kind)
    }

    fn read_name(&mut self) -> Result<String, Error> {
        self.peek_kind()?;
        if !self.awaiting_name {
            return Err(Error::wire_protocol("no field name pending"));
        }
        let name = self.input.read_utf8_string()?;
        self.awaiting_name = false;
        Ok(name)
    }

    fn read_start_document(&mut self) -> Result<(), Error> {
        self.take_kind(ValueKind::Document)?;
        self.regions.push(Region::Document);
        Ok(())
    }

    fn read_end_document(&mut self) -> Result<(), Error> {
        self.take_kind(ValueKind::End)?;
        if self.regions.pop() != Some(Region::Document) {
            return Err(Error::wire_protocol("mismatched document end"));
        }
        Ok(())
    }

    fn read_start_array(&mut self) -> Result<(), Error> {
        self.take_kind(ValueKind::Array)?;
        self.regions.push(Region::Array);
        Ok(())
    }

    fn read_end_array(&mut self) -> Result<(), Error> {
        self.take_kind(ValueKind::End)?;
        if self.regions.pop() != Some(Region::Array) {
            return Err(Error::wire_protocol("mismatched array end"));
        }
        Ok(())
    }

    fn read_null(&mut self) -> Result<(), Error> {
        self.take_kind(ValueKind::Null)
    }

    fn read_bool(&mut self) -> Result<bool, Error> {
        self.take_kind(ValueKind::Bool)?;
        Ok(self.input.read_u8()? != 0)
    }

    fn read_i32(&mut self) -> Result<i32, Error> {
        self.take_kind(ValueKind::Int32)?;
        self.input.read_i32()
    }

    fn read_i64(&mut self) -> Result<i64, Error> {
        self.take_kind(ValueKind::Int64)?;
        self.input.read_i64()
    }

    fn read_f64(&mut self) -> Result<f64, Error> {
        self.take_kind(ValueKind::Float64)?;
        self.input.read_f64()
    }

    fn read_string(&mut self) -> Result<String, Error> {
        self.take_kind(ValueKind::String)?;
        self.input.read_utf8_string()
    }

    fn read_datetime(&mut self) -> Result<NaiveDateTime, Error> {
        self.take_kind(ValueKind::DateTime)?;
        let micros = self.input.read_i64()?;
        DateTime::from_timestamp_micros(micros)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::invalid_data("datetime out of range"))
    }

    fn read_binary(&mut self) -> Result<Vec<u8>, Error> {
        self.take_kind(ValueKind::Binary)?;
        let len = self.input.read_varuint32()? as usize;
        Ok(self.input.read_bytes(len)?.to_vec())
    }

    fn skip_value(&mut self) -> Result<(), Error> {
        let kind = self.peek_kind()?;
        if kind == ValueKind::End {
            return Err(Error::wire_protocol("no value to skip at region end"));
        }
        self.skip_pending_name()?;
        self.pending = None;
        match kind {
            ValueKind::Null => {}
            ValueKind::Bool => self.input.skip(1)?,
            ValueKind::Int32 => self.input.skip(4)?,
            ValueKind::Int64 | ValueKind::Float64 | ValueKind::DateTime => self.input.skip(8)?,
            ValueKind::String => self.input.skip_utf8_string()?,
            ValueKind::Binary => {
                let len = self.input.read_varuint32()? as usize;
                self.input.skip(len)?;
            }
            ValueKind::Document => {
                self.regions.push(Region::Document);
                loop {
                    if self.peek_kind()? == ValueKind::End {
                        self.pending = None;
                        self.regions.pop();
                        break;
                    }
                    self.skip_value()?;
                }
            }
            ValueKind::Array => {
                self.regions.push(Region::Array);
                loop {
                    if self.peek_kind()? == ValueKind::End {
                        self.pending = None;
                        self.regions.pop();
                        break;
                    }
                    self.skip_value()?;
                }
            }
            ValueKind::End => unreachable!(),
        }
        Ok(())
    }

    fn mark(&mut self) -> Mark {
        self.saved.push(ReaderState {
            cursor: self.input.cursor(),
            regions: self.regions.clone(),
            pending: self.pending,
            awaiting_name: self.awaiting_name,
        });
        Mark(self.saved.len() - 1)
    }

    fn reset(&mut self, mark: Mark) -> Result<(), Error> {
        if mark.0 >= self.saved.len() {
            return Err(Error::wire_protocol("reset to a released mark"));
        }
        let state = self.saved[mark.0].clone();
        self.saved.truncate(mark.0);
        self.input.set_cursor(state.cursor);
        self.regions = state.regions;
        self.pending = state.pending;
        self.awaiting_name = state.awaiting_name;
        Ok(())
    }

    fn unmark(&mut self, mark: Mark) {
        self.saved.truncate(mark.0);
    }
}
