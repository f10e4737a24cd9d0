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

use docmap::error::Error;
use docmap::mapper::MapperBuilder;
use docmap::model::schema::{
    EntityErrorPolicy, FieldErrorPolicy, NullPolicy, UndefinedPolicy,
};
use docmap::model::{FieldDef, TypeDef, TypeDescriptor, TypeExpr};
use docmap::types::raw;
use docmap::value::{Instance, Value};
use docmap::wire::{DocumentWriter, StructuredWriter};

#[test]
fn keep_null_writes_an_explicit_null() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Doc")
                .field(FieldDef::new("a", TypeExpr::named(raw::INT32)).on_null(NullPolicy::KeepNull))
                .field(FieldDef::new("b", TypeExpr::named(raw::INT32))),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Doc".into();
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(Instance::new(ty.clone())))
        .unwrap();
    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    // `a` is present as null, `b` (default omit policy) is absent
    assert_eq!(fields, vec![("a".to_owned(), Value::Null)]);
}

#[test]
fn force_default_substitutes_the_type_default() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Doc")
                .field(
                    FieldDef::new("n", TypeExpr::named(raw::INT32))
                        .on_null(NullPolicy::ForceDefault),
                )
                .field(
                    FieldDef::new("items", TypeExpr::generic("list", [TypeExpr::named(raw::STRING)]))
                        .on_null(NullPolicy::ForceDefault),
                ),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Doc".into();
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(Instance::new(ty.clone())))
        .unwrap();
    let Value::Entity(decoded) = mapper.decode_value(&ty, &bytes).unwrap() else {
        panic!("expected entity")
    };
    assert_eq!(decoded.get("n"), &Value::Int32(0));
    assert_eq!(decoded.get("items"), &Value::Array(vec![]));
}

#[test]
fn undefined_default_fills_missing_fields() {
    let narrow = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Doc").field(FieldDef::new("kept", TypeExpr::named(raw::STRING))),
        )
        .build()
        .unwrap();
    let wide = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Doc")
                .field(FieldDef::new("kept", TypeExpr::named(raw::STRING)))
                .field(
                    FieldDef::new("added", TypeExpr::named(raw::INT32))
                        .on_undefined(UndefinedPolicy::Default),
                ),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Doc".into();
    let bytes = narrow
        .encode_value(
            &ty,
            &Value::Entity(Instance::new(ty.clone()).with("kept", "v")),
        )
        .unwrap();
    let Value::Entity(decoded) = wide.decode_value(&ty, &bytes).unwrap() else {
        panic!("expected entity")
    };
    assert_eq!(decoded.get("added"), &Value::Int32(0));
}

#[test]
fn explicit_wire_null_suppresses_the_undefined_default() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Doc").field(
                FieldDef::new("n", TypeExpr::named(raw::INT32))
                    .on_null(NullPolicy::KeepNull)
                    .on_undefined(UndefinedPolicy::Default),
            ),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Doc".into();
    // encodes an explicit null for `n`
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(Instance::new(ty.clone())))
        .unwrap();
    let Value::Entity(decoded) = mapper.decode_value(&ty, &bytes).unwrap() else {
        panic!("expected entity")
    };
    // present-as-null is not undefined: no default kicks in
    assert!(decoded.get("n").is_null());
}

fn bad_age_bytes() -> Vec<u8> {
    let mut w = DocumentWriter::new();
    w.write_start_document().unwrap();
    w.write_name("name").unwrap();
    w.write_string("ada").unwrap();
    w.write_name("age").unwrap();
    w.write_string("old").unwrap();
    w.write_end_document().unwrap();
    w.finish().unwrap()
}

fn person_with_age_policy(policy: FieldErrorPolicy) -> docmap::mapper::DocumentMapper {
    MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Person")
                .field(FieldDef::new("name", TypeExpr::named(raw::STRING)))
                .field(FieldDef::new("age", TypeExpr::named(raw::INT32)).on_error(policy)),
        )
        .build()
        .unwrap()
}

#[test]
fn field_error_rethrow_names_the_field() {
    let mapper = person_with_age_policy(FieldErrorPolicy::Rethrow);
    let err = mapper
        .decode_value(&"Person".into(), &bad_age_bytes())
        .unwrap_err();
    match err {
        Error::DecodeField { field, .. } => assert_eq!(field, "age"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn field_error_null_recovers_the_rest() {
    let mapper = person_with_age_policy(FieldErrorPolicy::Null);
    let Value::Entity(decoded) = mapper
        .decode_value(&"Person".into(), &bad_age_bytes())
        .unwrap()
    else {
        panic!("expected entity")
    };
    assert_eq!(decoded.get("name"), &Value::String("ada".into()));
    assert!(decoded.get("age").is_null());
}

#[test]
fn field_error_skip_recovers_the_rest() {
    let mapper = person_with_age_policy(FieldErrorPolicy::Skip);
    let Value::Entity(decoded) = mapper
        .decode_value(&"Person".into(), &bad_age_bytes())
        .unwrap()
    else {
        panic!("expected entity")
    };
    assert_eq!(decoded.get("name"), &Value::String("ada".into()));
    assert!(decoded.get("age").is_null());
}

#[test]
fn entity_error_null_absorbs_one_bad_element() {
    let mapper = MapperBuilder::new()
        .entity_error_policy(EntityErrorPolicy::Null)
        .register_type(
            TypeDef::concrete("Person")
                .field(FieldDef::new("age", TypeExpr::named(raw::INT32))),
        )
        .build()
        .unwrap();

    // [ {age: 1}, {age: "bad"}, {age: 3} ]
    let mut w = DocumentWriter::new();
    w.write_start_array().unwrap();
    for age in [Some(1), None, Some(3)] {
        w.write_start_document().unwrap();
        w.write_name("age").unwrap();
        match age {
            Some(n) => w.write_i32(n).unwrap(),
            None => w.write_string("bad").unwrap(),
        }
        w.write_end_document().unwrap();
    }
    w.write_end_array().unwrap();
    let bytes = w.finish().unwrap();

    let ty = TypeDescriptor::parameterized("list", ["Person".into()]);
    let decoded = mapper.decode_value(&ty, &bytes).unwrap();
    let Value::Array(items) = decoded else {
        panic!("expected array")
    };
    assert_eq!(items.len(), 3);
    assert_eq!(
        items[0],
        Value::Entity(Instance::new("Person".into()).with("age", 1))
    );
    assert_eq!(items[1], Value::Null);
    assert_eq!(
        items[2],
        Value::Entity(Instance::new("Person".into()).with("age", 3))
    );
}

#[test]
fn post_load_hooks_run_root_first() {
    let mapper = MapperBuilder::new()
        .declare_type(
            TypeDef::abstract_type("Base")
                .field(FieldDef::new("trace", TypeExpr::named(raw::STRING)))
                .post_load(|inst| {
                    inst.set("trace", Value::String("base".into()));
                    Ok(())
                }),
        )
        .register_type(
            TypeDef::concrete("Child")
                .extends(TypeExpr::named("Base"))
                .post_load(|inst| {
                    let prev = match inst.get("trace") {
                        Value::String(s) => s.clone(),
                        _ => return Err(Error::decode_entity("trace not set")),
                    };
                    inst.set("trace", Value::String(format!("{prev},child")));
                    Ok(())
                }),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Child".into();
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(Instance::new(ty.clone())))
        .unwrap();
    let Value::Entity(decoded) = mapper.decode_value(&ty, &bytes).unwrap() else {
        panic!("expected entity")
    };
    assert_eq!(decoded.get("trace"), &Value::String("base,child".into()));
}

#[test]
fn identifier_maps_to_the_reserved_key() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("User")
                .field(FieldDef::new("id", TypeExpr::named(raw::STRING)).identifier())
                .field(FieldDef::new("name", TypeExpr::named(raw::STRING))),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "User".into();
    let user = Instance::new(ty.clone()).with("id", "u1").with("name", "ada");
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(user.clone()))
        .unwrap();

    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert_eq!(fields[0], ("_id".to_owned(), Value::String("u1".into())));
    assert_eq!(mapper.decode_value(&ty, &bytes).unwrap(), Value::Entity(user));
}

#[test]
fn ensure_identifier_generates_when_absent() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("User")
                .field(FieldDef::new("id", TypeExpr::named(raw::STRING)).identifier())
                .field(FieldDef::new("name", TypeExpr::named(raw::STRING)))
                .id_generator(true, |_| Ok(Value::String("gen-1".into()))),
        )
        .build()
        .unwrap();

    let codec = mapper.codec_for(&"User".into()).unwrap().unwrap();
    let collectible = codec.as_collectible().unwrap();

    let mut user = Value::Entity(Instance::new("User".into()).with("name", "ada"));
    assert!(!collectible.has_identifier(&user));
    let id = collectible.ensure_identifier(&mut user).unwrap();
    assert_eq!(id, Value::String("gen-1".into()));
    assert!(collectible.has_identifier(&user));

    // an existing identifier is returned untouched
    let again = collectible.ensure_identifier(&mut user).unwrap();
    assert_eq!(again, Value::String("gen-1".into()));
}

#[test]
fn non_collectible_types_expose_no_identifier_surface() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Point").field(FieldDef::new("x", TypeExpr::named(raw::INT32))),
        )
        .build()
        .unwrap();

    let codec = mapper.codec_for(&"Point".into()).unwrap().unwrap();
    assert!(codec.as_collectible().is_none());
}

#[test]
fn two_identifier_fields_are_rejected() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("User")
                .field(FieldDef::new("a", TypeExpr::named(raw::STRING)).identifier())
                .field(FieldDef::new("b", TypeExpr::named(raw::STRING)).identifier()),
        )
        .build()
        .unwrap();

    let err = mapper.codec_for(&"User".into()).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn mapper_wide_defaults_apply_when_fields_are_silent() {
    let mapper = MapperBuilder::new()
        .null_policy(NullPolicy::KeepNull)
        .register_type(
            TypeDef::concrete("Doc").field(FieldDef::new("a", TypeExpr::named(raw::INT32))),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Doc".into();
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(Instance::new(ty.clone())))
        .unwrap();
    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert_eq!(fields, vec![("a".to_owned(), Value::Null)]);
}
