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

use docmap::mapper::{DocumentMapper, MapperBuilder};
use docmap::model::{FieldDef, TypeDef, TypeDescriptor, TypeExpr};
use docmap::types::{raw, ValueKind};
use docmap::value::{Instance, Value};
use docmap::wire::{DocumentReader, StructuredReader};

fn empty_mapper() -> DocumentMapper {
    MapperBuilder::new().build().unwrap()
}

fn list_of(raw_name: &str) -> TypeDescriptor {
    TypeDescriptor::parameterized("list", [raw_name.into()])
}

#[test]
fn list_round_trips_with_null_elements() {
    let mapper = empty_mapper();
    let ty = list_of(raw::STRING);
    let value = Value::Array(vec![
        Value::String("a".into()),
        Value::Null,
        Value::String("b".into()),
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);
}

#[test]
fn set_deduplicates_preserving_insertion_order() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized("set", ["int32".into()]);
    let value = Value::Array(vec![
        Value::Int32(3),
        Value::Int32(1),
        Value::Int32(3),
        Value::Int32(2),
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(
        mapper.decode_value(&ty, &bytes).unwrap(),
        Value::Array(vec![Value::Int32(3), Value::Int32(1), Value::Int32(2)])
    );
}

#[test]
fn sorted_set_totally_orders_elements() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized("sorted_set", ["string".into()]);
    let value = Value::Array(vec![
        Value::String("b".into()),
        Value::String("a".into()),
        Value::String("b".into()),
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(
        mapper.decode_value(&ty, &bytes).unwrap(),
        Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
    );
}

#[test]
fn string_keyed_map_uses_a_document_region() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized("map", ["string".into(), "int32".into()]);
    let value = Value::Map(vec![
        (Value::String("x".into()), Value::Int32(1)),
        (Value::String("y".into()), Value::Int32(2)),
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);

    let mut r = DocumentReader::new(&bytes);
    assert_eq!(r.peek_kind().unwrap(), ValueKind::Document);
}

#[test]
fn non_string_keyed_map_uses_pair_documents() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized("map", ["int64".into(), "string".into()]);
    let value = Value::Map(vec![
        (Value::Int64(10), Value::String("ten".into())),
        (Value::Int64(20), Value::String("twenty".into())),
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);

    let mut r = DocumentReader::new(&bytes);
    assert_eq!(r.peek_kind().unwrap(), ValueKind::Array);
}

#[test]
fn primitive_array_packs_into_binary() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized("array", ["int32".into()]);
    let value = Value::Array(vec![Value::Int32(-1), Value::Int32(0), Value::Int32(7)]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);

    let mut r = DocumentReader::new(&bytes);
    assert_eq!(r.peek_kind().unwrap(), ValueKind::Binary);
}

#[test]
fn object_element_array_stays_elementwise() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized("array", ["string".into()]);
    let value = Value::Array(vec![Value::String("a".into())]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);

    let mut r = DocumentReader::new(&bytes);
    assert_eq!(r.peek_kind().unwrap(), ValueKind::Array);
}

#[test]
fn schemaless_document_round_trips() {
    let mapper = empty_mapper();
    let ty: TypeDescriptor = raw::DOCUMENT.into();
    let value = Value::Document(vec![
        ("n".to_owned(), Value::Int32(1)),
        (
            "inner".to_owned(),
            Value::Document(vec![("deep".to_owned(), Value::Bool(true))]),
        ),
        (
            "arr".to_owned(),
            Value::Array(vec![Value::Float64(0.5), Value::Null]),
        ),
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);
}

#[test]
fn wildcard_field_carries_arbitrary_values() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Envelope")
                .field(FieldDef::new("tag", TypeExpr::named(raw::STRING)))
                .field(FieldDef::new("payload", TypeExpr::object())),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Envelope".into();
    for payload in [
        Value::Int64(9),
        Value::String("s".into()),
        Value::Document(vec![("k".to_owned(), Value::Bool(false))]),
        Value::Array(vec![Value::Int32(1)]),
    ] {
        let envelope = Instance::new(ty.clone())
            .with("tag", "t")
            .with("payload", payload.clone());
        let bytes = mapper
            .encode_value(&ty, &Value::Entity(envelope.clone()))
            .unwrap();
        assert_eq!(
            mapper.decode_value(&ty, &bytes).unwrap(),
            Value::Entity(envelope)
        );
    }
}

#[test]
fn entity_behind_wildcard_decodes_as_document() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Note").field(FieldDef::new("text", TypeExpr::named(raw::STRING))),
        )
        .register_type(
            TypeDef::concrete("Envelope").field(FieldDef::new("payload", TypeExpr::object())),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Envelope".into();
    let envelope = Instance::new(ty.clone()).with(
        "payload",
        Instance::new("Note".into()).with("text", "hi"),
    );
    let bytes = mapper.encode_value(&ty, &Value::Entity(envelope)).unwrap();

    // the wildcard has no target type to dispatch to on decode
    let Value::Entity(decoded) = mapper.decode_value(&ty, &bytes).unwrap() else {
        panic!("expected entity")
    };
    assert_eq!(
        decoded.get("payload"),
        &Value::Document(vec![("text".to_owned(), Value::String("hi".into()))])
    );
}

#[test]
fn polymorphic_list_elements_dispatch_individually() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::abstract_type("Shape"))
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .register_type(
            TypeDef::concrete("Square")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("side", TypeExpr::named(raw::FLOAT64))),
        )
        .build()
        .unwrap();

    let ty = TypeDescriptor::parameterized("list", ["Shape".into()]);
    let value = Value::Array(vec![
        Value::Entity(Instance::new("Circle".into()).with("radius", 1.0)),
        Value::Entity(Instance::new("Square".into()).with("side", 2.0)),
        Value::Null,
    ]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);
}

#[test]
fn nested_containers_round_trip() {
    let mapper = empty_mapper();
    let ty = TypeDescriptor::parameterized(
        "map",
        [
            "string".into(),
            TypeDescriptor::parameterized("list", ["int32".into()]),
        ],
    );
    let value = Value::Map(vec![(
        Value::String("xs".into()),
        Value::Array(vec![Value::Int32(1), Value::Int32(2)]),
    )]);
    let bytes = mapper.encode_value(&ty, &value).unwrap();
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), value);
}
