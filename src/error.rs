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

//! Error taxonomy for the mapping engine.
//!
//! Construct variants through the static constructor functions rather than
//! the enum syntax; the constructors accept anything convertible to
//! `Cow<'static, str>` so call sites can pass literals without allocating.
//!
//! Configuration errors are fatal and surface at model/codec construction
//! time. Every other variant is a data error: either absorbed by the
//! configured per-field/per-instance policy or propagated to the caller of
//! decode. A `TypeMismatch` raised when assigning an already-decoded value
//! to an incompatible destination always propagates — the engine never
//! coerces; one raised inside a field's own decode (wrong wire kind) is a
//! data error like any other and follows the field's policy.

use std::borrow::Cow;

use thiserror::Error;

/// Error type for model construction, codec resolution and encode/decode
/// operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Fatal configuration problem detected while building the type model
    /// or constructing a codec: duplicate identifier field, duplicate
    /// discriminator, field named like a discriminator key, uninstantiable
    /// type, unresolvable generic binding.
    #[error("configuration error: {0}")]
    Configuration(Cow<'static, str>),

    /// A single field failed to decode. Subject to the field's configured
    /// error policy (rethrow / null / skip).
    #[error("field '{field}' failed to decode: {message}")]
    DecodeField {
        field: String,
        message: Cow<'static, str>,
    },

    /// A whole instance failed to decode. Subject to the mapper-wide
    /// entity error policy (rethrow / null).
    #[error("entity decode failed: {0}")]
    DecodeEntity(Cow<'static, str>),

    /// A value's type is incompatible with its destination. The engine
    /// never coerces.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: Cow<'static, str>,
        actual: Cow<'static, str>,
    },

    /// Invalid or corrupted wire data.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// Reader/writer misuse or truncated input in the wire layer.
    #[error("{0}")]
    WireProtocol(Cow<'static, str>),

    /// Buffer boundary violation: offset + length > capacity.
    #[error("buffer out of bound: {0} + {1} > {2}")]
    Truncated(usize, usize, usize),

    /// Unsupported operation or value shape.
    #[error("{0}")]
    Unsupported(Cow<'static, str>),
}

impl Error {
    /// Creates a new [`Error::Configuration`].
    #[cold]
    #[track_caller]
    pub fn configuration<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::Configuration(s.into())
    }

    /// Creates a new [`Error::DecodeField`] for the given wire field name.
    #[cold]
    #[track_caller]
    pub fn decode_field<S: Into<Cow<'static, str>>>(field: &str, s: S) -> Self {
        Error::DecodeField {
            field: field.to_owned(),
            message: s.into(),
        }
    }

    /// Creates a new [`Error::DecodeEntity`].
    #[cold]
    #[track_caller]
    pub fn decode_entity<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::DecodeEntity(s.into())
    }

    /// Creates a new [`Error::TypeMismatch`].
    #[cold]
    #[track_caller]
    pub fn type_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<Cow<'static, str>>,
        A: Into<Cow<'static, str>>,
    {
        Error::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new [`Error::InvalidData`].
    #[cold]
    #[track_caller]
    pub fn invalid_data<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::InvalidData(s.into())
    }

    /// Creates a new [`Error::WireProtocol`].
    #[cold]
    #[track_caller]
    pub fn wire_protocol<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::WireProtocol(s.into())
    }

    /// Creates a new [`Error::Truncated`] with the given bounds.
    #[cold]
    #[track_caller]
    pub fn truncated(offset: usize, length: usize, capacity: usize) -> Self {
        Error::Truncated(offset, length, capacity)
    }

    /// Creates a new [`Error::Unsupported`].
    #[cold]
    #[track_caller]
    pub fn unsupported<S: Into<Cow<'static, str>>>(s: S) -> Self {
        Error::Unsupported(s.into())
    }

    /// True for errors that are absorbable under a field-level policy.
    /// Configuration errors never are.
    pub fn is_data_error(&self) -> bool {
        !matches!(self, Error::Configuration(_))
    }
}

/// Ensures a condition holds; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use docmap::ensure;
/// use docmap::error::Error;
///
/// fn check(n: i32) -> Result<(), Error> {
///     ensure!(n > 0, "value must be positive");
///     ensure!(n < 10, Error::invalid_data(format!("value {} too large", n)));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}
