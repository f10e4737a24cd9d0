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

//! Structured cursor capability consumed by all codecs.
//!
//! The engine never touches bytes directly; it drives a
//! [`StructuredWriter`]/[`StructuredReader`] pair exposing typed primitive
//! operations, a document/array nesting protocol, a "peek next value kind"
//! operation, and LIFO mark/reset for speculative reads (the polymorphic
//! discriminator scan). [`document`] ships the in-memory binary
//! implementation used by the facade and the test suite; any external
//! cursor satisfying these traits plugs in unchanged.

pub mod document;

pub use document::{DocumentReader, DocumentWriter};

use chrono::NaiveDateTime;

use crate::error::Error;
use crate::types::ValueKind;

/// Opaque token returned by [`StructuredReader::mark`].
///
/// Marks are strictly LIFO: every mark must be released by exactly one
/// `reset` (rewind) or `unmark` (discard), innermost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark(pub(crate) usize);

/// Streaming cursor over an output document.
///
/// Inside a document region every value write must be preceded by
/// [`write_name`](Self::write_name); inside an array region (and at the
/// top level) names are not written.
pub trait StructuredWriter {
    fn write_start_document(&mut self) -> Result<(), Error>;
    fn write_end_document(&mut self) -> Result<(), Error>;
    fn write_start_array(&mut self) -> Result<(), Error>;
    fn write_end_array(&mut self) -> Result<(), Error>;

    /// Sets the field name for the next value written in a document region.
    fn write_name(&mut self, name: &str) -> Result<(), Error>;

    fn write_null(&mut self) -> Result<(), Error>;
    fn write_bool(&mut self, v: bool) -> Result<(), Error>;
    fn write_i32(&mut self, v: i32) -> Result<(), Error>;
    fn write_i64(&mut self, v: i64) -> Result<(), Error>;
    fn write_f64(&mut self, v: f64) -> Result<(), Error>;
    fn write_string(&mut self, v: &str) -> Result<(), Error>;
    fn write_datetime(&mut self, v: NaiveDateTime) -> Result<(), Error>;
    fn write_binary(&mut self, v: &[u8]) -> Result<(), Error>;
}

/// Streaming cursor over an input document.
///
/// Reading an element is always: [`peek_kind`](Self::peek_kind), then (in a
/// document region) [`read_name`](Self::read_name), then exactly one value
/// read or [`skip_value`](Self::skip_value). `peek_kind` is idempotent
/// until the pending value is consumed.
pub trait StructuredReader {
    /// Kind of the next value (or [`ValueKind::End`] at region end).
    fn peek_kind(&mut self) -> Result<ValueKind, Error>;

    /// Field name of the pending value; only valid in a document region.
    fn read_name(&mut self) -> Result<String, Error>;

    fn read_start_document(&mut self) -> Result<(), Error>;
    fn read_end_document(&mut self) -> Result<(), Error>;
    fn read_start_array(&mut self) -> Result<(), Error>;
    fn read_end_array(&mut self) -> Result<(), Error>;

    fn read_null(&mut self) -> Result<(), Error>;
    fn read_bool(&mut self) -> Result<bool, Error>;
    fn read_i32(&mut self) -> Result<i32, Error>;
    fn read_i64(&mut self) -> Result<i64, Error>;
    fn read_f64(&mut self) -> Result<f64, Error>;
    fn read_string(&mut self) -> Result<String, Error>;
    fn read_datetime(&mut self) -> Result<NaiveDateTime, Error>;
    fn read_binary(&mut self) -> Result<Vec<u8>, Error>;

    /// Skips the pending value entirely, including nested regions. In a
    /// document region the name is skipped too if not yet read.
    fn skip_value(&mut self) -> Result<(), Error>;

    /// Saves the full cursor state for a later [`reset`](Self::reset).
    fn mark(&mut self) -> Mark;

    /// Rewinds to the state saved at `mark` and discards it.
    fn reset(&mut self, mark: Mark) -> Result<(), Error>;

    /// Discards the saved state without repositioning.
    fn unmark(&mut self, mark: Mark);
}
